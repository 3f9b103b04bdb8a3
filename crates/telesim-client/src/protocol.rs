//! Request/reply message types for the simulator remote-control protocol.
//!
//! The protocol follows a command-reply pattern: the adapter sends a
//! [`Request`], the simulator answers with a [`Reply`] — except for the
//! fire-and-forget writes ([`Request::SetVector`], [`Request::SetOption`]),
//! which elicit no reply, and the pushed [`Reply::UpdateScalar`] /
//! [`Reply::UpdateInteger`] / [`Reply::UpdateVector`] messages the simulator
//! emits for subscribed signals.
//!
//! Messages are length-prefixed JSON. Vector-carrying messages announce a
//! raw binary frame of packed little-endian `f32`s that immediately follows
//! the JSON frame.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use telesim_core::signals::SignalKind;

/// Hard cap on a single JSON frame (16 MiB).
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A message from the adapter to the simulator.
///
/// # Example
///
/// ```
/// use telesim_client::protocol::Request;
///
/// let json = r#"{"type":"set_synchronous","enabled":true}"#;
/// let req: Request = serde_json::from_str(json).unwrap();
/// assert!(matches!(req, Request::SetSynchronous { enabled: true }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Open a session.
    Hello {
        client_name: String,
        client_version: String,
    },
    /// Enable or disable synchronous (lock-step) mode.
    SetSynchronous { enabled: bool },
    /// Start the simulation.
    Start,
    /// Stop the simulation.
    Stop,
    /// Advance exactly one simulation tick. Only legal in synchronous mode.
    Trigger,
    /// Query whether a simulation is still running or winding down.
    Status,
    /// Blocking read of a scalar signal.
    GetScalar { name: String },
    /// Blocking read of a vector signal. The reply announces a binary frame.
    GetVector { name: String },
    /// Subscribe to a signal; the simulator pushes updates from then on.
    Subscribe { name: String, kind: SignalKind },
    /// Fire-and-forget vector write. A binary frame with `len` packed
    /// floats follows this message. No reply.
    SetVector { name: String, len: u32 },
    /// Fire-and-forget boolean option write. No reply.
    SetOption { option: BoolOption, value: bool },
    /// Force delivery of buffered subscription updates.
    Ping,
    /// Close the session.
    Bye,
}

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// A message from the simulator to the adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    /// Handshake result carrying the session identifier.
    Welcome { session: u32, sim_version: String },
    /// Generic acknowledgement.
    Ack,
    /// Simulation status. `pending` counts commands still in flight.
    Status { running: bool, pending: u32 },
    /// Scalar signal value (blocking read result).
    Scalar { name: String, value: f32 },
    /// Vector signal header; a binary frame with `len` packed floats follows.
    Vector { name: String, len: u32 },
    /// Pushed update for a subscribed scalar signal.
    UpdateScalar { name: String, value: f32 },
    /// Pushed update for a subscribed integer signal.
    UpdateInteger { name: String, value: i64 },
    /// Pushed update for a subscribed vector signal; a binary frame follows.
    UpdateVector { name: String, len: u32 },
    /// Ping acknowledgement; all buffered updates precede it.
    Pong,
    /// Session close acknowledgement.
    Bye,
    /// Command failure reported by the simulator.
    Error { message: String },
}

impl Reply {
    /// The message type name (matches the serde tag).
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::Ack => "ack",
            Self::Status { .. } => "status",
            Self::Scalar { .. } => "scalar",
            Self::Vector { .. } => "vector",
            Self::UpdateScalar { .. } => "update_scalar",
            Self::UpdateInteger { .. } => "update_integer",
            Self::UpdateVector { .. } => "update_vector",
            Self::Pong => "pong",
            Self::Bye => "bye",
            Self::Error { .. } => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// BoolOption
// ---------------------------------------------------------------------------

/// Boolean simulator options settable over the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOption {
    /// The simulator's own on-screen display.
    DisplayEnabled,
    /// Arms video recording for the next simulation start.
    RecordingTriggered,
}

// ---------------------------------------------------------------------------
// ClientError
// ---------------------------------------------------------------------------

/// Errors raised by the wire layer and the RPC client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Payload of {size} bytes exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Packed float payload of {len} bytes is not a multiple of 4")]
    MalformedPayload { len: usize },

    #[error("Expected {expected} reply, got {got}")]
    UnexpectedReply {
        expected: &'static str,
        got: String,
    },

    #[error("Connection failed after {attempts} attempts")]
    ConnectTimeout { attempts: u32 },

    #[error("Signal {name:?} is not subscribed")]
    NotSubscribed { name: String },

    #[error("Signal {name:?} is {got:?}, expected {expected:?}")]
    KindMismatch {
        name: String,
        expected: SignalKind,
        got: SignalKind,
    },

    #[error("Session is closed")]
    Closed,

    #[error("Simulator error: {message}")]
    Remote { message: String },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
