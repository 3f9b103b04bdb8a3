//! A scripted loopback simulator speaking the real wire protocol.
//!
//! [`ScriptedSim`] binds a local TCP port, accepts one connection, and
//! answers protocol requests from a [`SimScript`]: fixed calibration
//! vectors, a fixed `dt`, and a queue of tick frames consumed one per
//! `trigger`. Everything the client writes (actions, options, trigger
//! count) is captured in [`Recorded`] for assertions.

use std::collections::{HashMap, VecDeque};
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};

use telesim_client::codec::{pack_floats, unpack_floats};
use telesim_client::framing::{
    read_binary_frame, read_message, write_binary_frame, write_message,
};
use telesim_client::protocol::{BoolOption, ClientError, Reply, Request};
use telesim_core::signals::{self, SignalKind};

// ---------------------------------------------------------------------------
// SimScript
// ---------------------------------------------------------------------------

/// One simulated tick's worth of scene outputs.
#[derive(Debug, Clone)]
pub struct TickFrame {
    pub states: Vec<f32>,
    pub reward: f32,
    pub done: bool,
}

/// What the scripted simulator publishes.
#[derive(Debug, Clone)]
pub struct SimScript {
    pub dt: f32,
    pub max_state: Vec<f32>,
    pub min_state: Vec<f32>,
    pub max_action: Vec<f32>,
    pub min_action: Vec<f32>,
    pub frames: VecDeque<TickFrame>,
}

impl Default for SimScript {
    /// Two-dimensional scene with symmetric unit state bounds and
    /// half-unit action bounds.
    fn default() -> Self {
        Self {
            dt: 0.05,
            max_state: vec![1.0, 1.0],
            min_state: vec![-1.0, -1.0],
            max_action: vec![0.5, 0.5],
            min_action: vec![-0.5, -0.5],
            frames: VecDeque::new(),
        }
    }
}

impl SimScript {
    /// Queue a frame published on the tick after the previous ones.
    pub fn push_frame(&mut self, states: Vec<f32>, reward: f32, done: bool) {
        self.frames.push_back(TickFrame {
            states,
            reward,
            done,
        });
    }
}

// ---------------------------------------------------------------------------
// Recorded
// ---------------------------------------------------------------------------

/// Traffic captured from the client side of the conversation.
#[derive(Debug, Default)]
pub struct Recorded {
    /// Every `actions` vector received, in order.
    pub actions: Vec<Vec<f32>>,
    /// Every boolean option write, in order.
    pub options: Vec<(BoolOption, bool)>,
    /// Number of tick triggers received.
    pub triggers: u32,
    /// Number of simulation starts received.
    pub starts: u32,
}

// ---------------------------------------------------------------------------
// ScriptedSim
// ---------------------------------------------------------------------------

/// One-connection scripted simulator endpoint.
pub struct ScriptedSim {
    listener: TcpListener,
    script: SimScript,
    recorded: Arc<Mutex<Recorded>>,
}

impl ScriptedSim {
    /// Bind an ephemeral local port.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the port cannot be bound.
    pub fn bind(script: SimScript) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        Ok(Self {
            listener,
            script,
            recorded: Arc::new(Mutex::new(Recorded::default())),
        })
    }

    /// The bound address.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the address cannot be read back.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle to the captured traffic, usable while the server runs.
    #[must_use]
    pub fn recorded(&self) -> Arc<Mutex<Recorded>> {
        Arc::clone(&self.recorded)
    }

    /// Accept one client and run the conversation to `bye` or disconnect.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when framing or the protocol breaks.
    #[allow(clippy::too_many_lines)]
    pub fn serve_one(mut self) -> Result<(), ClientError> {
        let (mut stream, _addr) = self.listener.accept()?;

        let mut subscribed: HashMap<String, SignalKind> = HashMap::new();
        let mut latest: Option<TickFrame> = None;
        let mut running = false;

        // Handshake first.
        match read_message::<Request>(&mut stream)? {
            Some(Request::Hello { .. }) => {
                write_message(
                    &mut stream,
                    &Reply::Welcome {
                        session: 42,
                        sim_version: "scripted".into(),
                    },
                )?;
            }
            other => {
                write_message(
                    &mut stream,
                    &Reply::Error {
                        message: format!("expected hello, got {other:?}"),
                    },
                )?;
                return Ok(());
            }
        }

        loop {
            let Some(request) = read_message::<Request>(&mut stream)? else {
                break; // client disconnected
            };
            match request {
                Request::Hello { .. } => {
                    write_message(
                        &mut stream,
                        &Reply::Error {
                            message: "session already open".into(),
                        },
                    )?;
                }
                Request::SetSynchronous { .. } => write_message(&mut stream, &Reply::Ack)?,
                Request::Start => {
                    running = true;
                    self.recorded.lock().unwrap().starts += 1;
                    write_message(&mut stream, &Reply::Ack)?;
                }
                Request::Stop => {
                    running = false;
                    write_message(&mut stream, &Reply::Ack)?;
                }
                Request::Trigger => {
                    if let Some(frame) = self.script.frames.pop_front() {
                        latest = Some(frame);
                    }
                    self.recorded.lock().unwrap().triggers += 1;
                    write_message(&mut stream, &Reply::Ack)?;
                }
                Request::Status => write_message(
                    &mut stream,
                    &Reply::Status {
                        running,
                        pending: 0,
                    },
                )?,
                Request::GetScalar { name } => {
                    if name == signals::DT {
                        write_message(
                            &mut stream,
                            &Reply::Scalar {
                                name,
                                value: self.script.dt,
                            },
                        )?;
                    } else {
                        write_message(
                            &mut stream,
                            &Reply::Error {
                                message: format!("no scalar signal {name:?}"),
                            },
                        )?;
                    }
                }
                Request::GetVector { name } => {
                    let values = match name.as_str() {
                        signals::MAX_STATE => Some(&self.script.max_state),
                        signals::MIN_STATE => Some(&self.script.min_state),
                        signals::MAX_ACTION => Some(&self.script.max_action),
                        signals::MIN_ACTION => Some(&self.script.min_action),
                        _ => None,
                    };
                    match values {
                        Some(values) => {
                            write_message(
                                &mut stream,
                                &Reply::Vector {
                                    name,
                                    len: u32::try_from(values.len()).unwrap(),
                                },
                            )?;
                            write_binary_frame(&mut stream, &pack_floats(values))?;
                        }
                        None => write_message(
                            &mut stream,
                            &Reply::Error {
                                message: format!("no vector signal {name:?}"),
                            },
                        )?,
                    }
                }
                Request::Subscribe { name, kind } => {
                    subscribed.insert(name, kind);
                    write_message(&mut stream, &Reply::Ack)?;
                }
                Request::SetVector { name, len } => {
                    let payload = read_binary_frame(&mut stream)?;
                    let values = unpack_floats(&payload)?;
                    debug_assert_eq!(values.len(), len as usize);
                    if name == signals::ACTIONS {
                        self.recorded.lock().unwrap().actions.push(values);
                    }
                    // fire-and-forget: no reply
                }
                Request::SetOption { option, value } => {
                    self.recorded.lock().unwrap().options.push((option, value));
                    // fire-and-forget: no reply
                }
                Request::Ping => {
                    if let Some(frame) = &latest {
                        if subscribed.contains_key(signals::STATES) {
                            write_message(
                                &mut stream,
                                &Reply::UpdateVector {
                                    name: signals::STATES.into(),
                                    len: u32::try_from(frame.states.len()).unwrap(),
                                },
                            )?;
                            write_binary_frame(&mut stream, &pack_floats(&frame.states))?;
                        }
                        if subscribed.contains_key(signals::REWARD) {
                            write_message(
                                &mut stream,
                                &Reply::UpdateScalar {
                                    name: signals::REWARD.into(),
                                    value: frame.reward,
                                },
                            )?;
                        }
                        if subscribed.contains_key(signals::DONE) {
                            write_message(
                                &mut stream,
                                &Reply::UpdateInteger {
                                    name: signals::DONE.into(),
                                    value: i64::from(frame.done),
                                },
                            )?;
                        }
                    }
                    write_message(&mut stream, &Reply::Pong)?;
                }
                Request::Bye => {
                    write_message(&mut stream, &Reply::Bye)?;
                    break;
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
