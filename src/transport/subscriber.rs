//! Receiving side of a topic
//!
//! A subscriber either dials a binding publisher or listens for a
//! connecting one. Lost connections are re-established on the next
//! receive; frames sent while disconnected are simply never seen.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::config::{POLL_INTERVAL_MS, RECONNECT_INTERVAL_MS};
use crate::error::{Result, SensorWireError};
use crate::messages::{AnyMessage, WireMessage};
use crate::sync::CancellationToken;
use crate::topic::Endpoint;

use super::frame::{is_timeout, FramedStream};

#[derive(Debug)]
enum Source {
    Dial(SocketAddr),
    Listen(TcpListener),
}

/// Blocking frame receiver for one topic
#[derive(Debug)]
pub struct Subscriber {
    endpoint: Endpoint,
    source: Source,
    stream: Option<FramedStream>,
    buf: Vec<u8>,
    token: Option<CancellationToken>,
    received: u64,
}

impl Subscriber {
    /// Dial the publisher at `endpoint`
    ///
    /// A binding endpoint dials the local host. The first dial happens on
    /// the first receive.
    pub fn connect(endpoint: Endpoint) -> Result<Self> {
        let addr = endpoint.resolve()?;
        Ok(Self::with_source(endpoint, Source::Dial(addr)))
    }

    /// Listen on `port` for a connecting publisher
    pub fn bind(port: u16) -> Result<Self> {
        let endpoint = Endpoint::bind(port);
        let listener = TcpListener::bind(endpoint.bind_addr())
            .map_err(|e| SensorWireError::from_io(e, &format!("Failed to bind {}", endpoint)))?;
        listener.set_nonblocking(true)?;
        info!("Subscribing on {}", endpoint);
        Ok(Self::with_source(endpoint, Source::Listen(listener)))
    }

    fn with_source(endpoint: Endpoint, source: Source) -> Self {
        Self {
            endpoint,
            source,
            stream: None,
            buf: Vec::new(),
            token: None,
            received: 0,
        }
    }

    /// Make blocking receives return [`SensorWireError::Closed`] once
    /// `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Address actually bound, for listening subscribers
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.source {
            Source::Listen(listener) => listener.local_addr().ok(),
            Source::Dial(_) => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Frames received so far
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Wait for the next frame
    pub fn recv_bytes(&mut self) -> Result<&[u8]> {
        self.wait_for_frame(None)?;
        Ok(&self.buf)
    }

    /// Wait at most `timeout` for the next frame
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<&[u8]> {
        self.wait_for_frame(Some(Instant::now() + timeout))
            .and_then(|received| {
                if received {
                    Ok(())
                } else {
                    Err(SensorWireError::timeout(timeout))
                }
            })?;
        Ok(&self.buf)
    }

    /// Receive and decode a `M`, falling back to the empty message on
    /// malformed input
    pub fn recv_message<M: WireMessage>(&mut self) -> Result<M> {
        let bytes = self.recv_bytes()?;
        Ok(M::decode_lossy(bytes))
    }

    /// Receive a frame of whatever family its envelope names
    pub fn recv_any(&mut self) -> Result<AnyMessage> {
        let bytes = self.recv_bytes()?;
        Ok(AnyMessage::decode(bytes)?)
    }

    /// Returns `Ok(false)` only when `deadline` passed
    fn wait_for_frame(&mut self, deadline: Option<Instant>) -> Result<bool> {
        let poll = Duration::from_millis(POLL_INTERVAL_MS);

        loop {
            if self.token.as_ref().is_some_and(|t| t.is_cancelled()) {
                return Err(SensorWireError::closed(format!("subscriber {}", self.endpoint)));
            }

            let slice = match deadline {
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        return Ok(false);
                    }
                    left.min(poll)
                }
                None => poll,
            };

            let Some(stream) = self.stream.as_mut() else {
                self.establish(slice);
                continue;
            };

            match stream.recv(&mut self.buf, Some(slice)) {
                Ok(true) => {
                    self.received += 1;
                    return Ok(true);
                }
                Ok(false) => {}
                Err(e) => {
                    if e.is_disconnect() {
                        info!("Publisher {} disconnected", stream.peer());
                    } else {
                        warn!("Dropping connection to {}: {}", stream.peer(), e);
                    }
                    self.stream = None;
                }
            }
        }
    }

    /// Try once to dial or accept, waiting at most `slice`
    fn establish(&mut self, slice: Duration) {
        let raw = match &self.source {
            Source::Dial(addr) => match TcpStream::connect_timeout(addr, slice) {
                Ok(stream) => Some(stream),
                Err(e) => {
                    debug!("Dial of {} failed: {}", addr, e);
                    thread::sleep(slice.min(Duration::from_millis(RECONNECT_INTERVAL_MS)));
                    None
                }
            },
            Source::Listen(listener) => match listener.accept() {
                Ok((stream, _)) => Some(stream),
                Err(ref e) if is_timeout(e) || e.kind() == io::ErrorKind::Interrupted => {
                    thread::sleep(slice.min(Duration::from_millis(RECONNECT_INTERVAL_MS)));
                    None
                }
                Err(e) => {
                    warn!("Error accepting publisher on {}: {}", self.endpoint, e);
                    thread::sleep(slice);
                    None
                }
            },
        };

        let Some(raw) = raw else {
            return;
        };
        match FramedStream::new(raw) {
            Ok(framed) => {
                info!("Subscribed to {} via {}", self.endpoint, framed.peer());
                self.stream = Some(framed);
            }
            Err(e) => warn!("Failed to set up connection on {}: {}", self.endpoint, e),
        }
    }
}
