//! The named-signal contract between the adapter and the loaded scene.
//!
//! The scene script is expected to publish four calibration vectors and a
//! scalar time step at startup, stream three runtime outputs every tick,
//! and consume one inbound vector. The schema is implicit: signals are
//! looked up by name, nothing on the wire is self-describing.
//!
//! | Signal       | Kind    | Direction | When                    |
//! |--------------|---------|-----------|-------------------------|
//! | `max_state`  | vector  | sim → us  | once, after scene load  |
//! | `min_state`  | vector  | sim → us  | once, after scene load  |
//! | `max_action` | vector  | sim → us  | once, after scene load  |
//! | `min_action` | vector  | sim → us  | once, after scene load  |
//! | `dt`         | scalar  | sim → us  | once, after scene load  |
//! | `states`     | vector  | sim → us  | every tick              |
//! | `reward`     | scalar  | sim → us  | every tick              |
//! | `done`       | integer | sim → us  | every tick (0 or 1)     |
//! | `actions`    | vector  | us → sim  | every tick              |

use serde::{Deserialize, Serialize};

/// Upper state bounds, published once by the scene.
pub const MAX_STATE: &str = "max_state";
/// Lower state bounds, published once by the scene.
pub const MIN_STATE: &str = "min_state";
/// Upper action bounds, published once by the scene.
pub const MAX_ACTION: &str = "max_action";
/// Lower action bounds, published once by the scene.
pub const MIN_ACTION: &str = "min_action";
/// Simulation time step in seconds.
pub const DT: &str = "dt";
/// Per-tick state vector.
pub const STATES: &str = "states";
/// Per-tick reward scalar.
pub const REWARD: &str = "reward";
/// Per-tick terminal flag (integer 0/1).
pub const DONE: &str = "done";
/// Inbound action vector consumed by the scene.
pub const ACTIONS: &str = "actions";

// ---------------------------------------------------------------------------
// SignalKind
// ---------------------------------------------------------------------------

/// Value shape of a named signal channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Single f32.
    Scalar,
    /// Single i64 (the scene's boolean flags travel as 0/1 integers).
    Integer,
    /// Packed f32 vector.
    Vector,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_kind_serde_tags() {
        assert_eq!(serde_json::to_string(&SignalKind::Scalar).unwrap(), "\"scalar\"");
        assert_eq!(serde_json::to_string(&SignalKind::Integer).unwrap(), "\"integer\"");
        assert_eq!(serde_json::to_string(&SignalKind::Vector).unwrap(), "\"vector\"");
    }

    #[test]
    fn signal_kind_roundtrip() {
        for kind in [SignalKind::Scalar, SignalKind::Integer, SignalKind::Vector] {
            let json = serde_json::to_string(&kind).unwrap();
            let kind2: SignalKind = serde_json::from_str(&json).unwrap();
            assert_eq!(kind, kind2);
        }
    }
}
