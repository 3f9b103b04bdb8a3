//! The [`SignalClient`] trait and its TCP implementation.
//!
//! [`TcpSignalClient`] owns the session socket exclusively: one adapter,
//! one connection, blocking calls throughout. Pushed subscription updates
//! are applied to the local [`SignalCache`] whenever the client reads the
//! socket while waiting for a reply.
//!
//! The trait is the seam for tests: the environment adapter takes a boxed
//! `SignalClient` at construction, so a mock can stand in for the wire.

use std::fmt;
use std::net::{Shutdown, TcpStream};
use std::thread;

use tracing::{debug, info};

use telesim_core::config::ConnectConfig;
use telesim_core::signals::SignalKind;

use crate::codec::{pack_floats, unpack_floats};
use crate::framing::{read_binary_frame, read_message, write_binary_frame, write_message};
use crate::protocol::{BoolOption, ClientError, Reply, Request};
use crate::subscription::{SignalCache, SignalValue, SubscriptionState};

const CLIENT_NAME: &str = "telesim";

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Opaque session identifier negotiated during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SimStatus
// ---------------------------------------------------------------------------

/// Simulation status as reported by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimStatus {
    /// Whether a simulation is running (or still winding down after a stop).
    pub running: bool,
    /// Commands accepted but not yet executed.
    pub pending: u32,
}

// ---------------------------------------------------------------------------
// SignalClient
// ---------------------------------------------------------------------------

/// Synchronous session with a simulator remote-control endpoint.
///
/// All methods block until the simulator replies, except the
/// fire-and-forget writes ([`write_vector`](Self::write_vector),
/// [`set_option`](Self::set_option)) and the buffered reads, which are
/// served from the local subscription cache.
pub trait SignalClient {
    /// Enable or disable synchronous (lock-step) mode.
    fn set_synchronous(&mut self, enabled: bool) -> Result<(), ClientError>;

    /// Start the simulation.
    fn start(&mut self) -> Result<(), ClientError>;

    /// Stop the simulation. The stop completes asynchronously; poll
    /// [`status`](Self::status) to confirm.
    fn stop(&mut self) -> Result<(), ClientError>;

    /// Advance exactly one simulation tick.
    fn trigger(&mut self) -> Result<(), ClientError>;

    /// Query the simulation status.
    fn status(&mut self) -> Result<SimStatus, ClientError>;

    /// Blocking read of a scalar signal.
    fn read_scalar(&mut self, name: &str) -> Result<f32, ClientError>;

    /// Blocking read of a vector signal.
    fn read_vector(&mut self, name: &str) -> Result<Vec<f32>, ClientError>;

    /// Subscribe to a signal for pushed updates.
    fn subscribe(&mut self, name: &str, kind: SignalKind) -> Result<(), ClientError>;

    /// Force delivery of buffered subscription updates.
    fn ping(&mut self) -> Result<(), ClientError>;

    /// Fire-and-forget vector write.
    fn write_vector(&mut self, name: &str, data: &[f32]) -> Result<(), ClientError>;

    /// Fire-and-forget boolean option write.
    fn set_option(&mut self, option: BoolOption, value: bool) -> Result<(), ClientError>;

    /// Buffered scalar read. `Ok(None)` while the subscription is pending.
    fn buffered_scalar(&self, name: &str) -> Result<Option<f32>, ClientError>;

    /// Buffered integer read. `Ok(None)` while the subscription is pending.
    fn buffered_integer(&self, name: &str) -> Result<Option<i64>, ClientError>;

    /// Buffered vector read. `Ok(None)` while the subscription is pending.
    fn buffered_vector(&self, name: &str) -> Result<Option<Vec<f32>>, ClientError>;

    /// Subscription state of a signal.
    fn subscription_state(&self, name: &str) -> SubscriptionState;

    /// The negotiated session identifier.
    fn session(&self) -> SessionId;

    /// Close the session. Idempotent.
    fn close(&mut self) -> Result<(), ClientError>;
}

// ---------------------------------------------------------------------------
// TcpSignalClient
// ---------------------------------------------------------------------------

/// [`SignalClient`] over a blocking TCP stream.
#[derive(Debug)]
pub struct TcpSignalClient {
    stream: TcpStream,
    session: SessionId,
    cache: SignalCache,
    closed: bool,
}

impl TcpSignalClient {
    /// Dial the endpoint once and perform the handshake.
    ///
    /// # Errors
    ///
    /// Returns the connect IO error, or a protocol error if the simulator
    /// answers the handshake with anything but `welcome`.
    pub fn connect(addr: &str) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)?;
        // Lock-step ticks are latency-bound, not throughput-bound.
        stream.set_nodelay(true)?;

        let mut client = Self {
            stream,
            session: SessionId(0),
            cache: SignalCache::new(),
            closed: false,
        };
        write_message(
            &mut client.stream,
            &Request::Hello {
                client_name: CLIENT_NAME.into(),
                client_version: env!("CARGO_PKG_VERSION").into(),
            },
        )?;
        match client.recv_reply()? {
            Reply::Welcome {
                session,
                sim_version,
            } => {
                client.session = SessionId(session);
                debug!(session, %sim_version, "session established");
            }
            other => {
                return Err(ClientError::UnexpectedReply {
                    expected: "welcome",
                    got: other.type_name().to_string(),
                });
            }
        }
        Ok(client)
    }

    /// Dial with bounded retry and fixed backoff.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConnectTimeout`] once the attempt budget is
    /// exhausted.
    pub fn connect_with_retry(config: &ConnectConfig) -> Result<Self, ClientError> {
        let endpoint = config.endpoint();
        for attempt in 1..=config.connect_attempts {
            match Self::connect(&endpoint) {
                Ok(client) => {
                    info!(session = %client.session, %endpoint, attempt, "connected to simulator");
                    return Ok(client);
                }
                Err(e) => {
                    debug!(%endpoint, attempt, error = %e, "connect attempt failed");
                }
            }
            if attempt < config.connect_attempts {
                thread::sleep(config.connect_backoff());
            }
        }
        Err(ClientError::ConnectTimeout {
            attempts: config.connect_attempts,
        })
    }

    fn ensure_open(&self) -> Result<(), ClientError> {
        if self.closed {
            return Err(ClientError::Closed);
        }
        Ok(())
    }

    /// Send a request and wait for its reply, applying any pushed updates
    /// that arrive in between.
    fn request(&mut self, request: &Request) -> Result<Reply, ClientError> {
        self.ensure_open()?;
        write_message(&mut self.stream, request)?;
        self.recv_reply()
    }

    /// Read replies until a non-update message arrives. Updates are applied
    /// to the cache on the way; an `error` reply is lifted into
    /// [`ClientError::Remote`].
    fn recv_reply(&mut self) -> Result<Reply, ClientError> {
        loop {
            let Some(reply) = read_message::<Reply>(&mut self.stream)? else {
                self.closed = true;
                return Err(ClientError::Closed);
            };
            match reply {
                Reply::UpdateScalar { name, value } => {
                    self.cache.apply(&name, SignalValue::Scalar(value))?;
                }
                Reply::UpdateInteger { name, value } => {
                    self.cache.apply(&name, SignalValue::Integer(value))?;
                }
                Reply::UpdateVector { name, len } => {
                    let values = self.read_packed_frame(len)?;
                    self.cache.apply(&name, SignalValue::Vector(values))?;
                }
                Reply::Error { message } => return Err(ClientError::Remote { message }),
                other => return Ok(other),
            }
        }
    }

    /// Read a binary frame and unpack it, checking the announced length.
    fn read_packed_frame(&mut self, len: u32) -> Result<Vec<f32>, ClientError> {
        let bytes = read_binary_frame(&mut self.stream)?;
        let values = unpack_floats(&bytes)?;
        if values.len() != len as usize {
            return Err(ClientError::MalformedPayload { len: bytes.len() });
        }
        Ok(values)
    }

    fn expect_ack(reply: Reply) -> Result<(), ClientError> {
        match reply {
            Reply::Ack => Ok(()),
            other => Err(ClientError::UnexpectedReply {
                expected: "ack",
                got: other.type_name().to_string(),
            }),
        }
    }
}

impl SignalClient for TcpSignalClient {
    fn set_synchronous(&mut self, enabled: bool) -> Result<(), ClientError> {
        let reply = self.request(&Request::SetSynchronous { enabled })?;
        Self::expect_ack(reply)
    }

    fn start(&mut self) -> Result<(), ClientError> {
        let reply = self.request(&Request::Start)?;
        Self::expect_ack(reply)
    }

    fn stop(&mut self) -> Result<(), ClientError> {
        let reply = self.request(&Request::Stop)?;
        Self::expect_ack(reply)
    }

    fn trigger(&mut self) -> Result<(), ClientError> {
        let reply = self.request(&Request::Trigger)?;
        Self::expect_ack(reply)
    }

    fn status(&mut self) -> Result<SimStatus, ClientError> {
        match self.request(&Request::Status)? {
            Reply::Status { running, pending } => Ok(SimStatus { running, pending }),
            other => Err(ClientError::UnexpectedReply {
                expected: "status",
                got: other.type_name().to_string(),
            }),
        }
    }

    fn read_scalar(&mut self, name: &str) -> Result<f32, ClientError> {
        match self.request(&Request::GetScalar { name: name.into() })? {
            Reply::Scalar { value, .. } => Ok(value),
            other => Err(ClientError::UnexpectedReply {
                expected: "scalar",
                got: other.type_name().to_string(),
            }),
        }
    }

    fn read_vector(&mut self, name: &str) -> Result<Vec<f32>, ClientError> {
        match self.request(&Request::GetVector { name: name.into() })? {
            Reply::Vector { len, .. } => self.read_packed_frame(len),
            other => Err(ClientError::UnexpectedReply {
                expected: "vector",
                got: other.type_name().to_string(),
            }),
        }
    }

    fn subscribe(&mut self, name: &str, kind: SignalKind) -> Result<(), ClientError> {
        let reply = self.request(&Request::Subscribe {
            name: name.into(),
            kind,
        })?;
        Self::expect_ack(reply)?;
        self.cache.subscribe(name, kind);
        Ok(())
    }

    fn ping(&mut self) -> Result<(), ClientError> {
        match self.request(&Request::Ping)? {
            Reply::Pong => Ok(()),
            other => Err(ClientError::UnexpectedReply {
                expected: "pong",
                got: other.type_name().to_string(),
            }),
        }
    }

    fn write_vector(&mut self, name: &str, data: &[f32]) -> Result<(), ClientError> {
        self.ensure_open()?;
        write_message(
            &mut self.stream,
            &Request::SetVector {
                name: name.into(),
                len: u32::try_from(data.len()).map_err(|_| ClientError::PayloadTooLarge {
                    size: data.len(),
                    max: crate::protocol::MAX_MESSAGE_SIZE,
                })?,
            },
        )?;
        write_binary_frame(&mut self.stream, &pack_floats(data))
    }

    fn set_option(&mut self, option: BoolOption, value: bool) -> Result<(), ClientError> {
        self.ensure_open()?;
        write_message(&mut self.stream, &Request::SetOption { option, value })
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
        self.session
    }

    fn close(&mut self) -> Result<(), ClientError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        write_message(&mut self.stream, &Request::Bye)?;
        // Drain until the simulator acknowledges; stale pushes may race
        // with the close.
        loop {
            match read_message::<Reply>(&mut self.stream)? {
                None | Some(Reply::Bye) => break,
                Some(Reply::UpdateVector { len, .. }) => {
                    let _ = self.read_packed_frame(len)?;
                }
                Some(_) => {}
            }
        }
        let _ = self.stream.shutdown(Shutdown::Both);
        debug!(session = %self.session, "session closed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
