use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "127.0.0.1".into()
}
const fn default_port() -> u16 {
    19997
}
const fn default_connect_attempts() -> u32 {
    60
}
const fn default_connect_backoff_ms() -> u64 {
    250
}
const fn default_stop_poll_ms() -> u64 {
    10
}
const fn default_stop_timeout_ms() -> u64 {
    5000
}
const fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// ConnectConfig
// ---------------------------------------------------------------------------

/// Session endpoint and polling behavior.
///
/// The connect loop retries `connect_attempts` times with a fixed
/// `connect_backoff_ms` pause between attempts. Stop confirmation polls the
/// simulator status every `stop_poll_ms` up to `stop_timeout_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Simulator remote-API port (default: 19997).
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    #[serde(default = "default_connect_backoff_ms")]
    pub connect_backoff_ms: u64,

    #[serde(default = "default_stop_poll_ms")]
    pub stop_poll_ms: u64,

    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_attempts: default_connect_attempts(),
            connect_backoff_ms: default_connect_backoff_ms(),
            stop_poll_ms: default_stop_poll_ms(),
            stop_timeout_ms: default_stop_timeout_ms(),
        }
    }
}

impl ConnectConfig {
    /// `host:port` dial string.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub const fn connect_backoff(&self) -> Duration {
        Duration::from_millis(self.connect_backoff_ms)
    }

    #[must_use]
    pub const fn stop_poll_interval(&self) -> Duration {
        Duration::from_millis(self.stop_poll_ms)
    }

    #[must_use]
    pub const fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "connect_attempts".into(),
                message: "must be > 0".into(),
            });
        }
        if self.stop_poll_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "stop_poll_ms".into(),
                message: "must be > 0".into(),
            });
        }
        if self.stop_timeout_ms < self.stop_poll_ms {
            return Err(ConfigError::InvalidValue {
                field: "stop_timeout_ms".into(),
                message: "must be >= stop_poll_ms".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LaunchConfig
// ---------------------------------------------------------------------------

/// How (and whether) to boot the simulator process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Scene file handed to the simulator on launch.
    #[serde(default)]
    pub scene: PathBuf,

    /// Whether the simulator should render to screen. When false the
    /// simulator is launched headless.
    #[serde(default)]
    pub render: bool,

    /// Whether to launch the simulator, or attach to an already-running one.
    #[serde(default = "default_true")]
    pub boot: bool,

    /// Simulator installation directory. When absent, the platform default
    /// is resolved at launch time.
    #[serde(default)]
    pub install_dir: Option<PathBuf>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            scene: PathBuf::new(),
            render: false,
            boot: true,
            install_dir: None,
        }
    }
}

impl LaunchConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.boot && self.scene.as_os_str().is_empty() {
            return Err(ConfigError::MissingScene);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TelesimConfig
// ---------------------------------------------------------------------------

/// Complete adapter configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelesimConfig {
    #[serde(default)]
    pub connect: ConnectConfig,
    #[serde(default)]
    pub launch: LaunchConfig,
}

impl TelesimConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.connect.validate()?;
        self.launch.validate()?;
        Ok(())
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
