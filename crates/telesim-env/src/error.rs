use std::path::PathBuf;

use thiserror::Error;

use telesim_client::protocol::ClientError;
use telesim_core::error::{ConfigError, SpaceError};

/// Top-level error type for the environment adapter.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Launch error: {0}")]
    Launch(#[from] LaunchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Space error: {0}")]
    Space(#[from] SpaceError),

    #[error("Simulation did not stop within {timeout_ms} ms")]
    StopTimeout { timeout_ms: u64 },

    #[error("Recording error: {0}")]
    Recording(#[source] std::io::Error),
}

/// Simulator process launch and teardown errors.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Unsupported platform: {os}")]
    UnsupportedPlatform { os: &'static str },

    #[error("HOME is not set; cannot resolve the simulator install directory")]
    HomeNotSet,

    #[error("Simulator executable not found at {0}")]
    ExecutableNotFound(PathBuf),

    #[error("Failed to spawn simulator: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Failed to terminate simulator: {0}")]
    Terminate(#[source] std::io::Error),
}
