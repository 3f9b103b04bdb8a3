//! In-memory [`SignalClient`] double with scripted values and a call log.
//!
//! The mock answers blocking reads from a calibration table, delivers one
//! queued tick frame per `ping`, and records every operation. State lives
//! behind a [`MockHandle`] so tests keep access after the client is boxed
//! and handed to the adapter — the same reason the scripted TCP simulator
//! hands out its [`Recorded`](crate::sim_server::Recorded) behind an `Arc`.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use telesim_client::client::{SessionId, SignalClient, SimStatus};
use telesim_client::protocol::{BoolOption, ClientError};
use telesim_client::subscription::{SignalCache, SignalValue, SubscriptionState};
use telesim_core::signals::{self, SignalKind};

// ---------------------------------------------------------------------------
// Op
// ---------------------------------------------------------------------------

/// One recorded client operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    SetSynchronous(bool),
    Start,
    Stop,
    Trigger,
    Status,
    ReadScalar(String),
    ReadVector(String),
    Subscribe(String),
    Ping,
    WriteVector(String, Vec<f32>),
    SetOption(BoolOption, bool),
    Close,
}

#[derive(Default)]
struct Shared {
    ops: Vec<Op>,
    frames: VecDeque<(Vec<f32>, f32, bool)>,
}

// ---------------------------------------------------------------------------
// MockHandle
// ---------------------------------------------------------------------------

/// Test-side handle to a [`MockSignalClient`]'s state.
#[derive(Clone)]
pub struct MockHandle(Arc<Mutex<Shared>>);

impl MockHandle {
    /// Snapshot of all recorded operations, in call order.
    #[must_use]
    pub fn ops(&self) -> Vec<Op> {
        self.0.lock().unwrap().ops.clone()
    }

    /// Drop the recorded operations (to scope assertions to what follows).
    pub fn clear_ops(&self) {
        self.0.lock().unwrap().ops.clear();
    }

    /// Queue a tick frame delivered on the next `ping`.
    pub fn push_frame(&self, states: Vec<f32>, reward: f32, done: bool) {
        self.0
            .lock()
            .unwrap()
            .frames
            .push_back((states, reward, done));
    }
}

// ---------------------------------------------------------------------------
// MockSignalClient
// ---------------------------------------------------------------------------

/// Scripted, fully in-memory [`SignalClient`].
pub struct MockSignalClient {
    scalars: HashMap<String, f32>,
    vectors: HashMap<String, Vec<f32>>,
    shared: Arc<Mutex<Shared>>,
    cache: SignalCache,
    running: bool,
    /// Status polls still reporting `running` after each start.
    stop_lag: u32,
    lag_left: u32,
}

impl MockSignalClient {
    /// A mock with 2-dimensional default bounds and `dt = 0.05`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_bounds(
            vec![1.0, 1.0],
            vec![-1.0, -1.0],
            vec![0.5, 0.5],
            vec![-0.5, -0.5],
        )
    }

    /// A mock publishing the given calibration vectors.
    #[must_use]
    pub fn with_bounds(
        max_state: Vec<f32>,
        min_state: Vec<f32>,
        max_action: Vec<f32>,
        min_action: Vec<f32>,
    ) -> Self {
        let mut scalars = HashMap::new();
        scalars.insert(signals::DT.to_string(), 0.05);
        let mut vectors = HashMap::new();
        vectors.insert(signals::MAX_STATE.to_string(), max_state);
        vectors.insert(signals::MIN_STATE.to_string(), min_state);
        vectors.insert(signals::MAX_ACTION.to_string(), max_action);
        vectors.insert(signals::MIN_ACTION.to_string(), min_action);
        Self {
            scalars,
            vectors,
            shared: Arc::new(Mutex::new(Shared::default())),
            cache: SignalCache::new(),
            running: false,
            stop_lag: 0,
            lag_left: 0,
        }
    }

    /// Override the published time step.
    #[must_use]
    pub fn with_dt(mut self, dt: f32) -> Self {
        self.scalars.insert(signals::DT.to_string(), dt);
        self
    }

    /// Report `running` for `polls` extra status calls after each stop.
    #[must_use]
    pub const fn with_stop_lag(mut self, polls: u32) -> Self {
        self.stop_lag = polls;
        self
    }

    /// Handle for assertions and frame queuing after the client is boxed.
    #[must_use]
    pub fn handle(&self) -> MockHandle {
        MockHandle(Arc::clone(&self.shared))
    }

    /// Queue a tick frame delivered on the next `ping`.
    pub fn push_frame(&self, states: Vec<f32>, reward: f32, done: bool) {
        self.handle().push_frame(states, reward, done);
    }

    fn record(&self, op: Op) {
        self.shared.lock().unwrap().ops.push(op);
    }
}

impl Default for MockSignalClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalClient for MockSignalClient {
    fn set_synchronous(&mut self, enabled: bool) -> Result<(), ClientError> {
        self.record(Op::SetSynchronous(enabled));
        Ok(())
    }

    fn start(&mut self) -> Result<(), ClientError> {
        self.record(Op::Start);
        self.running = true;
        self.lag_left = self.stop_lag;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ClientError> {
        self.record(Op::Stop);
        Ok(())
    }

    fn trigger(&mut self) -> Result<(), ClientError> {
        self.record(Op::Trigger);
        Ok(())
    }

    fn status(&mut self) -> Result<SimStatus, ClientError> {
        self.record(Op::Status);
        if self.running {
            if self.lag_left > 0 {
                self.lag_left -= 1;
            } else {
                self.running = false;
            }
        }
        Ok(SimStatus {
            running: self.running,
            pending: 0,
        })
    }

    fn read_scalar(&mut self, name: &str) -> Result<f32, ClientError> {
        self.record(Op::ReadScalar(name.to_string()));
        self.scalars
            .get(name)
            .copied()
            .ok_or_else(|| ClientError::Remote {
                message: format!("no scalar signal {name:?}"),
            })
    }

    fn read_vector(&mut self, name: &str) -> Result<Vec<f32>, ClientError> {
        self.record(Op::ReadVector(name.to_string()));
        self.vectors
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::Remote {
                message: format!("no vector signal {name:?}"),
            })
    }

    fn subscribe(&mut self, name: &str, kind: SignalKind) -> Result<(), ClientError> {
        self.record(Op::Subscribe(name.to_string()));
        self.cache.subscribe(name, kind);
        Ok(())
    }

    fn ping(&mut self) -> Result<(), ClientError> {
        self.record(Op::Ping);
        let frame = self.shared.lock().unwrap().frames.pop_front();
        if let Some((states, reward, done)) = frame {
            self.cache
                .apply(signals::STATES, SignalValue::Vector(states))?;
            self.cache
                .apply(signals::REWARD, SignalValue::Scalar(reward))?;
            self.cache
                .apply(signals::DONE, SignalValue::Integer(i64::from(done)))?;
        }
        Ok(())
    }

    fn write_vector(&mut self, name: &str, data: &[f32]) -> Result<(), ClientError> {
        self.record(Op::WriteVector(name.to_string(), data.to_vec()));
        Ok(())
    }

    fn set_option(&mut self, option: BoolOption, value: bool) -> Result<(), ClientError> {
        self.record(Op::SetOption(option, value));
        Ok(())
    }

    fn buffered_scalar(&self, name: &str) -> Result<Option<f32>, ClientError> {
        self.cache.scalar(name)
    }

    fn buffered_integer(&self, name: &str) -> Result<Option<i64>, ClientError> {
        self.cache.integer(name)
    }

    fn buffered_vector(&self, name: &str) -> Result<Option<Vec<f32>>, ClientError> {
        self.cache.vector(name)
    }

    fn subscription_state(&self, name: &str) -> SubscriptionState {
        self.cache.state(name)
    }

    fn session(&self) -> SessionId {
        SessionId(1)
    }

    fn close(&mut self) -> Result<(), ClientError> {
        self.record(Op::Close);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_operations_in_order() {
        let mut mock = MockSignalClient::new();
        let handle = mock.handle();
        mock.start().unwrap();
        mock.trigger().unwrap();
        mock.stop().unwrap();
        assert_eq!(handle.ops(), vec![Op::Start, Op::Trigger, Op::Stop]);
    }

    #[test]
    fn handle_outlives_boxing() {
        let mock = MockSignalClient::new();
        let handle = mock.handle();
        let mut boxed: Box<dyn SignalClient> = Box::new(mock);
        boxed.ping().unwrap();
        assert_eq!(handle.ops(), vec![Op::Ping]);
    }

    #[test]
    fn serves_calibration_values() {
        let mut mock = MockSignalClient::new().with_dt(0.01);
        assert!((mock.read_scalar(signals::DT).unwrap() - 0.01).abs() < f32::EPSILON);
        assert_eq!(
            mock.read_vector(signals::MAX_ACTION).unwrap(),
            vec![0.5, 0.5]
        );
    }

    #[test]
    fn unknown_signal_is_remote_error() {
        let mut mock = MockSignalClient::new();
        assert!(matches!(
            mock.read_vector("bogus").unwrap_err(),
            ClientError::Remote { .. }
        ));
    }

    #[test]
    fn ping_delivers_one_frame() {
        let mut mock = MockSignalClient::new();
        mock.subscribe(signals::STATES, SignalKind::Vector).unwrap();
        mock.subscribe(signals::REWARD, SignalKind::Scalar).unwrap();
        mock.subscribe(signals::DONE, SignalKind::Integer).unwrap();
        mock.push_frame(vec![0.1, 0.2], 0.5, true);

        assert_eq!(mock.buffered_vector(signals::STATES).unwrap(), None);
        assert_eq!(
            mock.subscription_state(signals::STATES),
            SubscriptionState::Pending
        );

        mock.ping().unwrap();
        assert_eq!(
            mock.buffered_vector(signals::STATES).unwrap(),
            Some(vec![0.1, 0.2])
        );
        assert_eq!(mock.buffered_scalar(signals::REWARD).unwrap(), Some(0.5));
        assert_eq!(mock.buffered_integer(signals::DONE).unwrap(), Some(1));

        // Queue drained: another ping keeps the last values.
        mock.ping().unwrap();
        assert_eq!(mock.buffered_scalar(signals::REWARD).unwrap(), Some(0.5));
    }

    #[test]
    fn stop_lag_delays_settling() {
        let mut mock = MockSignalClient::new().with_stop_lag(2);
        mock.start().unwrap();
        mock.stop().unwrap();
        assert!(mock.status().unwrap().running);
        assert!(mock.status().unwrap().running);
        assert!(!mock.status().unwrap().running);
    }

    #[test]
    fn stop_lag_rearms_on_restart() {
        let mut mock = MockSignalClient::new().with_stop_lag(1);
        mock.start().unwrap();
        mock.stop().unwrap();
        assert!(mock.status().unwrap().running);
        assert!(!mock.status().unwrap().running);

        mock.start().unwrap();
        mock.stop().unwrap();
        assert!(mock.status().unwrap().running);
        assert!(!mock.status().unwrap().running);
    }
}
