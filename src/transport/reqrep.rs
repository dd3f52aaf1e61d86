//! Request/reply over the same framing as the publish topics
//!
//! The client sends one request frame and blocks for exactly one reply.
//! Replies are decoded strictly: a malformed reply is an error, not an
//! empty message.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::config::POLL_INTERVAL_MS;
use crate::error::{Result, SensorWireError};
use crate::messages::WireMessage;
use crate::sync::CancellationToken;
use crate::topic::Endpoint;

use super::frame::{is_timeout, FramedStream};

/// Per-client receive slice while serving
const SERVE_SLICE: Duration = Duration::from_millis(10);

/// Requesting side of a control topic
#[derive(Debug)]
pub struct RequestClient {
    endpoint: Endpoint,
    addr: SocketAddr,
    timeout: Duration,
    stream: Option<FramedStream>,
    buf: Vec<u8>,
}

impl RequestClient {
    /// Prepare a client for `endpoint`; replies slower than `timeout` fail
    pub fn connect(endpoint: Endpoint, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(SensorWireError::invalid_parameter(
                "timeout",
                "Request timeout must be greater than 0",
            ));
        }
        let addr = endpoint.resolve()?;
        Ok(Self {
            endpoint,
            addr,
            timeout,
            stream: None,
            buf: Vec::new(),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send `request` and wait for the reply
    ///
    /// Any failure drops the connection so the next request starts clean.
    pub fn request<Req, Resp>(&mut self, request: &Req) -> Result<Resp>
    where
        Req: WireMessage,
        Resp: WireMessage,
    {
        let bytes = request.to_bytes()?;
        let result = self.exchange(&bytes).and_then(|()| {
            Resp::decode(&self.buf).map_err(SensorWireError::from)
        });
        if let Err(e) = &result {
            debug!("{} request to {} failed: {}", Req::name(), self.endpoint, e);
            self.stream = None;
        }
        result
    }

    fn exchange(&mut self, bytes: &[u8]) -> Result<()> {
        if self.stream.is_none() {
            let raw = TcpStream::connect_timeout(&self.addr, self.timeout).map_err(|e| {
                SensorWireError::from_io(e, &format!("Failed to dial {}", self.endpoint))
            })?;
            let framed = FramedStream::new(raw)?;
            framed.set_write_timeout(Some(self.timeout))?;
            self.stream = Some(framed);
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(SensorWireError::closed(format!("client {}", self.endpoint)));
        };

        stream.send(bytes)?;
        if stream.recv(&mut self.buf, Some(self.timeout))? {
            Ok(())
        } else {
            Err(SensorWireError::timeout(self.timeout))
        }
    }
}

/// Replying side of a control topic
#[derive(Debug)]
pub struct RequestServer {
    endpoint: Endpoint,
    listener: TcpListener,
    clients: Vec<FramedStream>,
    buf: Vec<u8>,
}

impl RequestServer {
    /// Listen on `port` (`0` picks a free port)
    pub fn bind(port: u16) -> Result<Self> {
        let endpoint = Endpoint::bind(port);
        let listener = TcpListener::bind(endpoint.bind_addr())
            .map_err(|e| SensorWireError::from_io(e, &format!("Failed to bind {}", endpoint)))?;
        listener.set_nonblocking(true)?;
        info!("Serving requests on {}", endpoint);
        Ok(Self {
            endpoint,
            listener,
            clients: Vec::new(),
            buf: Vec::new(),
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Answer requests with `handler` until `token` is cancelled
    ///
    /// Returns the number of requests answered. A client that sends a
    /// malformed request is disconnected.
    pub fn serve<Req, Resp, F>(&mut self, token: &CancellationToken, mut handler: F) -> Result<u64>
    where
        Req: WireMessage,
        Resp: WireMessage,
        F: FnMut(Req) -> Resp,
    {
        let mut answered = 0;
        while !token.is_cancelled() {
            answered += self.poll_once(&mut handler)?;
        }
        info!("Request server on {} stopped after {} replies", self.endpoint, answered);
        Ok(answered)
    }

    /// Accept new clients and give each a short slice to send a request
    pub fn poll_once<Req, Resp, F>(&mut self, handler: &mut F) -> Result<u64>
    where
        Req: WireMessage,
        Resp: WireMessage,
        F: FnMut(Req) -> Resp,
    {
        self.accept_pending();
        if self.clients.is_empty() {
            thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
            return Ok(0);
        }

        let mut answered = 0;
        let buf = &mut self.buf;
        self.clients.retain_mut(|client| {
            match client.recv(buf, Some(SERVE_SLICE)) {
                Ok(false) => return true,
                Ok(true) => {}
                Err(e) => {
                    debug!("Request client {} gone: {}", client.peer(), e);
                    return false;
                }
            }

            let request = match Req::decode(buf.as_slice()) {
                Ok(request) => request,
                Err(e) => {
                    warn!("Malformed {} from {}: {}", Req::name(), client.peer(), e);
                    return false;
                }
            };

            let reply = match handler(request).to_bytes() {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("Failed to encode {}: {}", Resp::name(), e);
                    return false;
                }
            };
            match client.send(&reply) {
                Ok(()) => {
                    answered += 1;
                    true
                }
                Err(e) => {
                    debug!("Failed to reply to {}: {}", client.peer(), e);
                    false
                }
            }
        });
        Ok(answered)
    }

    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => match FramedStream::new(stream) {
                    Ok(framed) => {
                        debug!("Request client connected: {}", addr);
                        self.clients.push(framed);
                    }
                    Err(e) => warn!("Failed to set up request client {}: {}", addr, e),
                },
                Err(ref e) if is_timeout(e) => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Error accepting request client on {}: {}", self.endpoint, e);
                    break;
                }
            }
        }
    }
}
