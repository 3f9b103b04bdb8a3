//! Environment adapter exposing a remote simulator as a gym-style
//! reinforcement-learning environment.
//!
//! - [`env`](mod@env) — [`SimEnv`] with the `reset`/`step`/`close`/`monitor`
//!   surface and the lock-step tick contract
//! - [`launcher`] — simulator process boot, platform resolution, and
//!   process-group teardown
//! - [`recording`] — relocation of simulator-produced capture files
//! - [`error`] — [`EnvError`] / [`LaunchError`]
//!
//! The adapter owns its session exclusively and is fully synchronous; the
//! only concurrency in the system is the simulator process itself.

pub mod env;
pub mod error;
pub mod launcher;
pub mod recording;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use env::SimEnv;
pub use error::{EnvError, LaunchError};
pub use launcher::SimProcess;
pub use recording::{RECORDING_PREFIX, RecordingConfig};

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::env::SimEnv;
    pub use crate::error::{EnvError, LaunchError};
    pub use crate::launcher::SimProcess;
    pub use crate::recording::RecordingConfig;
    pub use telesim_client::prelude::*;
    pub use telesim_core::prelude::*;
}
