// telesim-core: Types, config, signal contract, and errors for the telesim adapter.

pub mod config;
pub mod error;
pub mod signals;
pub mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use config::{ConnectConfig, LaunchConfig, TelesimConfig};
pub use error::{ConfigError, SpaceError, TelesimError};
pub use signals::SignalKind;
pub use types::{Action, BoxSpace, Observation, StepInfo, StepResult};

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::config::{ConnectConfig, LaunchConfig, TelesimConfig};
    pub use crate::error::{ConfigError, SpaceError, TelesimError};
    pub use crate::signals::SignalKind;
    pub use crate::types::{Action, BoxSpace, Observation, StepInfo, StepResult};
}
