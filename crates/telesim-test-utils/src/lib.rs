//! Test doubles for the telesim adapter.
//!
//! - [`mocks`] — [`MockSignalClient`], an in-memory [`SignalClient`]
//!   (telesim_client::SignalClient) with scripted calibration values,
//!   queued tick frames, and a recorded operation log
//! - [`sim_server`] — [`ScriptedSim`], a loopback TCP peer speaking the
//!   real wire protocol for end-to-end client tests

pub mod mocks;
pub mod sim_server;

pub use mocks::{MockHandle, MockSignalClient, Op};
pub use sim_server::{Recorded, ScriptedSim, SimScript, TickFrame};
