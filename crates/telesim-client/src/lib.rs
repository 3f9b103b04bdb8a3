//! RPC client for the telesim simulator remote-control endpoint.
//!
//! This crate is the communication layer between the environment adapter
//! and the simulator process:
//!
//! - [`protocol`] — JSON-serialisable request/reply types, error type,
//!   boolean simulator options
//! - [`framing`] — Length-prefixed JSON wire format (4-byte LE `u32` +
//!   payload), plus raw binary frames for packed-float vectors
//! - [`codec`] — Packed little-endian `f32` vector codec
//! - [`subscription`] — Per-signal subscription states and the local cache
//!   refreshed by pushed updates
//! - [`client`] — The [`SignalClient`] trait and the concrete
//!   [`TcpSignalClient`]
//!
//! Connections begin with a handshake (`Hello`/`Welcome`) that yields the
//! session identifier, then follow a command/reply pattern. Subscribed
//! signals are pushed by the simulator as `update` messages and applied to
//! the local cache whenever the client reads the socket; a `ping` forces
//! delivery of anything buffered.

pub mod client;
pub mod codec;
pub mod framing;
pub mod protocol;
pub mod subscription;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use client::{SessionId, SignalClient, SimStatus, TcpSignalClient};
pub use protocol::{BoolOption, ClientError, MAX_MESSAGE_SIZE, Reply, Request};
pub use subscription::{SignalCache, SignalValue, SubscriptionState};

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::client::{SessionId, SignalClient, SimStatus, TcpSignalClient};
    pub use crate::protocol::{BoolOption, ClientError, Reply, Request};
    pub use crate::subscription::{SignalCache, SignalValue, SubscriptionState};
}
