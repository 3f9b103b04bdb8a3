//! The environment adapter: a gym-style reset/step surface over a
//! simulator session.
//!
//! # Lifecycle
//!
//! Construction places the simulator in synchronous mode, runs one tick so
//! the scene can initialize, reads the calibration signals (time step and
//! the four bound vectors), subscribes to the runtime outputs, and stops
//! the simulation so the first `reset` starts clean. From then on the
//! contract is strict lock-step: every `reset`/`step` advances exactly one
//! tick and pulls the results before returning.
//!
//! State, reward, and done are zero-initialized placeholders until the
//! first tick delivers values; a pending subscription read leaves them
//! untouched.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use tracing::{debug, info};

use telesim_client::client::{SignalClient, TcpSignalClient};
use telesim_client::protocol::BoolOption;
use telesim_core::config::{ConnectConfig, TelesimConfig};
use telesim_core::signals::{self, SignalKind};
use telesim_core::types::{Action, BoxSpace, Observation, StepInfo, StepResult};

use crate::error::EnvError;
use crate::launcher::{self, SimProcess};
use crate::recording::{self, RecordingConfig};

// ---------------------------------------------------------------------------
// SimEnv
// ---------------------------------------------------------------------------

/// Reinforcement-learning environment backed by a remote simulator session.
pub struct SimEnv {
    client: Box<dyn SignalClient>,
    process: Option<SimProcess>,
    connect: ConnectConfig,
    observation_space: BoxSpace,
    action_space: BoxSpace,
    dt: f32,
    state: Observation,
    reward: f32,
    done: bool,
    action: Action,
    recording: Option<RecordingConfig>,
    /// The simulator's working directory; recordings are collected here.
    sim_dir: PathBuf,
    closed: bool,
}

impl std::fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEnv")
            .field("process", &self.process)
            .field("connect", &self.connect)
            .field("observation_space", &self.observation_space)
            .field("action_space", &self.action_space)
            .field("dt", &self.dt)
            .field("state", &self.state)
            .field("reward", &self.reward)
            .field("done", &self.done)
            .field("action", &self.action)
            .field("recording", &self.recording)
            .field("sim_dir", &self.sim_dir)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl SimEnv {
    /// Boot or attach per `config`, dial with bounded retry, and calibrate.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvError`] for invalid configuration, launch failures,
    /// connect-retry exhaustion, or a scene that fails calibration. A
    /// process booted here is terminated again before the error is
    /// returned.
    pub fn open(config: &TelesimConfig) -> Result<Self, EnvError> {
        config.validate()?;
        let sim_dir = launcher::resolve_install_dir(&config.launch)?;

        let process = if config.launch.boot {
            Some(SimProcess::launch(&config.launch)?)
        } else {
            None
        };

        let client = match TcpSignalClient::connect_with_retry(&config.connect) {
            Ok(client) => client,
            Err(e) => {
                if let Some(process) = process {
                    let _ = process.terminate();
                }
                return Err(e.into());
            }
        };

        Self::with_parts(Box::new(client), config, sim_dir, process)
    }

    /// Build around an already-open session.
    ///
    /// This is the injection seam: anything implementing [`SignalClient`]
    /// can stand in for the wire.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvError`] for invalid configuration or a scene that
    /// fails calibration.
    pub fn with_client(
        client: Box<dyn SignalClient>,
        config: &TelesimConfig,
    ) -> Result<Self, EnvError> {
        config.validate()?;
        let sim_dir = launcher::resolve_install_dir(&config.launch)?;
        Self::with_parts(client, config, sim_dir, None)
    }

    fn with_parts(
        mut client: Box<dyn SignalClient>,
        config: &TelesimConfig,
        sim_dir: PathBuf,
        process: Option<SimProcess>,
    ) -> Result<Self, EnvError> {
        let calibration = Self::calibrate(client.as_mut(), config.launch.render);
        let (dt, observation_space, action_space) = match calibration {
            Ok(parts) => parts,
            Err(e) => {
                let _ = client.close();
                if let Some(process) = process {
                    let _ = process.terminate();
                }
                return Err(e);
            }
        };

        let state = Observation::zeros(observation_space.len());
        let action = Action::zeros(action_space.len());
        let mut env = Self {
            client,
            process,
            connect: config.connect.clone(),
            observation_space,
            action_space,
            dt,
            state,
            reward: 0.0,
            done: false,
            action,
            recording: None,
            sim_dir,
            closed: false,
        };

        // Leave the scene stopped so the first reset starts clean.
        if let Err(e) = env.stop_sim() {
            env.abort();
            return Err(e);
        }
        Ok(env)
    }

    /// The startup conversation: one tick to let the scene initialize,
    /// then the calibration reads and runtime subscriptions.
    fn calibrate(
        client: &mut dyn SignalClient,
        render: bool,
    ) -> Result<(f32, BoxSpace, BoxSpace), EnvError> {
        client.set_synchronous(true)?;
        client.start()?;
        client.trigger()?;
        if render {
            // The simulator's own display stays off even when rendering;
            // only the remote side observes the scene.
            client.set_option(BoolOption::DisplayEnabled, false)?;
        }

        let dt = client.read_scalar(signals::DT)?;
        let max_state = client.read_vector(signals::MAX_STATE)?;
        let max_action = client.read_vector(signals::MAX_ACTION)?;
        let min_state = client.read_vector(signals::MIN_STATE)?;
        let min_action = client.read_vector(signals::MIN_ACTION)?;
        let observation_space = BoxSpace::new(min_state, max_state)?;
        let action_space = BoxSpace::new(min_action, max_action)?;

        client.subscribe(signals::STATES, SignalKind::Vector)?;
        client.subscribe(signals::REWARD, SignalKind::Scalar)?;
        client.subscribe(signals::DONE, SignalKind::Integer)?;

        info!(
            dt,
            obs_dim = observation_space.len(),
            act_dim = action_space.len(),
            "scene calibrated"
        );
        Ok((dt, observation_space, action_space))
    }

    // -- public surface ----------------------------------------------------

    /// Bounds of the state vectors the scene produces.
    #[must_use]
    pub const fn observation_space(&self) -> &BoxSpace {
        &self.observation_space
    }

    /// Bounds actions are clipped to before transmission.
    #[must_use]
    pub const fn action_space(&self) -> &BoxSpace {
        &self.action_space
    }

    /// Scene time step in seconds; one `step` advances exactly this much.
    #[must_use]
    pub const fn dt(&self) -> f32 {
        self.dt
    }

    /// Most recently pulled state vector.
    #[must_use]
    pub const fn state(&self) -> &Observation {
        &self.state
    }

    /// Most recently pulled reward.
    #[must_use]
    pub const fn reward(&self) -> f32 {
        self.reward
    }

    /// Most recently pulled terminal flag.
    #[must_use]
    pub const fn done(&self) -> bool {
        self.done
    }

    /// Last action transmitted, post-clipping.
    #[must_use]
    pub const fn last_action(&self) -> &Action {
        &self.action
    }

    /// The simulator's working directory.
    #[must_use]
    pub fn sim_dir(&self) -> &Path {
        &self.sim_dir
    }

    /// Restart the simulation and return the first tick's state.
    ///
    /// Stops anything still running, zeroes the cached
    /// state/action/reward/done, relocates prior captures and re-arms the
    /// recording trigger when monitoring is enabled, then restarts in
    /// synchronous mode, transmits the zeroed action, and advances one tick.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvError`] when any session command fails or the stop
    /// confirmation times out.
    pub fn reset(&mut self) -> Result<Observation, EnvError> {
        self.ensure_open()?;
        self.stop_sim()?;

        self.state = Observation::zeros(self.observation_space.len());
        self.reward = 0.0;
        self.done = false;
        self.action = Action::zeros(self.action_space.len());

        if let Some(recording) = self.recording.clone() {
            self.collect_recordings(&recording)?;
            self.client
                .set_option(BoolOption::RecordingTriggered, true)?;
        }

        self.client.set_synchronous(true)?;
        self.client.start()?;
        let zeroed = self.action.clone();
        self.transmit(&zeroed)?;
        self.client.trigger()?;
        self.pull()?;
        Ok(self.state.clone())
    }

    /// Advance exactly one tick with `action` and pull the results.
    ///
    /// The action is clipped element-wise to the action space before
    /// transmission.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvError`] when any session command fails.
    pub fn step(&mut self, action: &Action) -> Result<StepResult, EnvError> {
        self.ensure_open()?;
        self.transmit(action)?;
        self.client.trigger()?;
        self.pull()?;
        Ok(StepResult {
            observation: self.state.clone(),
            reward: self.reward,
            done: self.done,
            info: StepInfo::default(),
        })
    }

    /// Arm recording: captures are relocated into `save_dir` on every
    /// subsequent `reset` and on `close`. Recording itself starts with the
    /// next `reset`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::Recording`] when the directory cannot be
    /// created.
    pub fn monitor(&mut self, save_dir: impl Into<PathBuf>, force: bool) -> Result<(), EnvError> {
        let config = RecordingConfig::new(save_dir, force);
        std::fs::create_dir_all(&config.save_dir).map_err(EnvError::Recording)?;
        debug!(save_dir = %config.save_dir.display(), force, "recording armed");
        self.recording = Some(config);
        Ok(())
    }

    /// Stop the simulation, close the session, collect recordings, and —
    /// when this adapter booted the simulator — terminate its process
    /// group and wait for exit. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvError`] when teardown fails; the environment is
    /// considered closed regardless.
    pub fn close(&mut self) -> Result<(), EnvError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        self.stop_sim_inner()?;
        self.client.close()?;
        if let Some(recording) = self.recording.clone() {
            self.collect_recordings(&recording)?;
        }
        if let Some(process) = self.process.take() {
            process.terminate()?;
            info!("simulator terminated");
        }
        Ok(())
    }

    // -- internals ---------------------------------------------------------

    fn ensure_open(&self) -> Result<(), EnvError> {
        if self.closed {
            return Err(EnvError::Client(
                telesim_client::protocol::ClientError::Closed,
            ));
        }
        Ok(())
    }

    /// Disable lock-step, issue a stop, and poll until the simulator
    /// reports idle — bounded by the configured timeout.
    fn stop_sim(&mut self) -> Result<(), EnvError> {
        self.ensure_open()?;
        self.stop_sim_inner()
    }

    fn stop_sim_inner(&mut self) -> Result<(), EnvError> {
        self.client.set_synchronous(false)?;
        self.client.stop()?;

        let deadline = Instant::now() + self.connect.stop_timeout();
        loop {
            if !self.client.status()?.running {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(EnvError::StopTimeout {
                    timeout_ms: self.connect.stop_timeout_ms,
                });
            }
            thread::sleep(self.connect.stop_poll_interval());
        }
    }

    /// Clip and transmit an action, remembering what was actually sent.
    fn transmit(&mut self, action: &Action) -> Result<(), EnvError> {
        let clipped = self.action_space.clipped(action);
        self.client
            .write_vector(signals::ACTIONS, clipped.as_slice())?;
        self.action = clipped;
        Ok(())
    }

    /// Force delivery of buffered updates and take whatever is fresh.
    /// Pending subscriptions leave the cached placeholders untouched.
    fn pull(&mut self) -> Result<(), EnvError> {
        self.client.ping()?;
        if let Some(states) = self.client.buffered_vector(signals::STATES)? {
            self.state = Observation::new(states);
        }
        if let Some(reward) = self.client.buffered_scalar(signals::REWARD)? {
            self.reward = reward;
        }
        if let Some(done) = self.client.buffered_integer(signals::DONE)? {
            self.done = done != 0;
        }
        Ok(())
    }

    fn collect_recordings(&mut self, config: &RecordingConfig) -> Result<(), EnvError> {
        let moved = recording::relocate(&self.sim_dir, config).map_err(EnvError::Recording)?;
        if !moved.is_empty() {
            info!(count = moved.len(), save_dir = %config.save_dir.display(), "collected recordings");
        }
        Ok(())
    }

    /// Best-effort teardown for construction failures.
    fn abort(&mut self) {
        self.closed = true;
        let _ = self.client.close();
        if let Some(process) = self.process.take() {
            let _ = process.terminate();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
