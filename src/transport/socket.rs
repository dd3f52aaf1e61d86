//! Publish socket over TCP
//!
//! Binding sockets accept any number of subscribers and write each frame
//! to all of them; connecting sockets dial one binding subscriber and
//! re-dial after a failure.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use log::{debug, info, warn};
use nix::sys::socket::{setsockopt, sockopt};

use crate::config::DEFAULT_WRITE_TIMEOUT_MS;
use crate::error::{Result, SensorWireError};
use crate::topic::Endpoint;

use super::frame::{is_timeout, FramedStream};
use super::Transport;

const DIAL_TIMEOUT: Duration = Duration::from_millis(500);

/// Per-connection socket options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketOptions {
    /// Kernel send buffer (`SO_SNDBUF`); `None` keeps the system default
    pub send_buffer_size: Option<usize>,
    /// Give up on a subscriber that stops reading for this long; `None`
    /// lets one stalled subscriber block the sender indefinitely
    pub write_timeout: Option<Duration>,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            send_buffer_size: None,
            write_timeout: Some(Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS)),
        }
    }
}

impl SocketOptions {
    fn apply(&self, stream: &FramedStream) -> Result<()> {
        if let Some(size) = self.send_buffer_size {
            setsockopt(stream.stream(), sockopt::SndBuf, &size)?;
        }
        stream.set_write_timeout(self.write_timeout)
    }

    fn adopt(&self, stream: TcpStream) -> Result<FramedStream> {
        let framed = FramedStream::new(stream)?;
        self.apply(&framed)?;
        Ok(framed)
    }
}

#[derive(Debug)]
enum Role {
    Bind {
        listener: TcpListener,
        subscribers: Vec<FramedStream>,
    },
    Connect {
        addr: SocketAddr,
        stream: Option<FramedStream>,
    },
}

/// Sending half of a topic
#[derive(Debug)]
pub struct TcpPubSocket {
    endpoint: Endpoint,
    options: SocketOptions,
    role: Role,
}

impl TcpPubSocket {
    /// Listen on all interfaces at `port` (`0` picks a free port)
    pub fn bind(port: u16, options: SocketOptions) -> Result<Self> {
        let endpoint = Endpoint::bind(port);
        let listener = TcpListener::bind(endpoint.bind_addr())
            .map_err(|e| SensorWireError::from_io(e, &format!("Failed to bind {}", endpoint)))?;
        listener.set_nonblocking(true)?;

        info!("Publishing on {}", endpoint);
        Ok(Self {
            endpoint,
            options,
            role: Role::Bind {
                listener,
                subscribers: Vec::new(),
            },
        })
    }

    /// Dial a binding subscriber
    ///
    /// The first dial happens here; failures are retried before every
    /// transmit.
    pub fn connect(endpoint: Endpoint, options: SocketOptions) -> Result<Self> {
        let addr = endpoint.resolve()?;
        let mut socket = Self {
            endpoint,
            options,
            role: Role::Connect { addr, stream: None },
        };
        if let Err(e) = socket.ensure_connected() {
            warn!("Initial dial of {} failed: {}", socket.endpoint, e);
        }
        Ok(socket)
    }

    /// Open a socket for `endpoint` in the role it names
    pub fn open(endpoint: Endpoint, options: SocketOptions) -> Result<Self> {
        match endpoint {
            Endpoint::Bind { port } => Self::bind(port, options),
            connect => Self::connect(connect, options),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Address actually bound, for binding sockets
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.role {
            Role::Bind { listener, .. } => listener.local_addr().ok(),
            Role::Connect { .. } => None,
        }
    }

    /// Connected peers
    pub fn peer_count(&self) -> usize {
        match &self.role {
            Role::Bind { subscribers, .. } => subscribers.len(),
            Role::Connect { stream, .. } => stream.is_some() as usize,
        }
    }

    /// Accept every subscriber waiting on the listener
    pub fn accept_pending(&mut self) -> usize {
        let Role::Bind {
            listener,
            subscribers,
        } = &mut self.role
        else {
            return 0;
        };

        let mut accepted = 0;
        loop {
            match listener.accept() {
                Ok((stream, addr)) => match self.options.adopt(stream) {
                    Ok(framed) => {
                        info!("Subscriber connected to {}: {}", self.endpoint, addr);
                        subscribers.push(framed);
                        accepted += 1;
                    }
                    Err(e) => warn!("Failed to set up subscriber {}: {}", addr, e),
                },
                Err(ref e) if is_timeout(e) => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Error accepting subscriber on {}: {}", self.endpoint, e);
                    break;
                }
            }
        }
        accepted
    }

    fn ensure_connected(&mut self) -> Result<()> {
        let Role::Connect { addr, stream } = &mut self.role else {
            return Ok(());
        };
        if stream.is_some() {
            return Ok(());
        }

        let raw = TcpStream::connect_timeout(addr, DIAL_TIMEOUT)
            .map_err(|e| SensorWireError::from_io(e, &format!("Failed to dial {}", addr)))?;
        let framed = self.options.adopt(raw)?;
        info!("Connected to {}", self.endpoint);
        *stream = Some(framed);
        Ok(())
    }
}

impl Transport for TcpPubSocket {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        match self.role {
            Role::Bind { .. } => {
                self.accept_pending();
                let Role::Bind { subscribers, .. } = &mut self.role else {
                    return Ok(());
                };
                // No subscribers means the frame is simply not delivered
                subscribers.retain_mut(|subscriber| match subscriber.send(frame) {
                    Ok(()) => true,
                    Err(e) => {
                        info!("Subscriber {} dropped: {}", subscriber.peer(), e);
                        false
                    }
                });
                Ok(())
            }
            Role::Connect { .. } => {
                self.ensure_connected()?;
                let Role::Connect { stream, .. } = &mut self.role else {
                    return Ok(());
                };
                let Some(connected) = stream.as_mut() else {
                    return Ok(());
                };
                if let Err(e) = connected.send(frame) {
                    debug!("Dropping connection to {}: {}", connected.peer(), e);
                    *stream = None;
                    return Err(e);
                }
                Ok(())
            }
        }
    }

    fn describe(&self) -> String {
        self.endpoint.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_without_subscribers_drops_frames() {
        let mut socket = TcpPubSocket::bind(0, SocketOptions::default()).unwrap();
        assert!(socket.local_addr().unwrap().port() != 0);
        socket.transmit(b"nobody listens").unwrap();
        assert_eq!(socket.peer_count(), 0);
    }

    #[test]
    fn test_connect_to_absent_peer_fails_transmit() {
        // Bind then drop to get a port nobody listens on
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let mut socket =
            TcpPubSocket::connect(Endpoint::connect("127.0.0.1", port), SocketOptions::default())
                .unwrap();
        assert!(socket.transmit(b"lost").is_err());
        assert_eq!(socket.peer_count(), 0);
    }

    #[test]
    fn test_send_buffer_option_applied() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let stream = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let options = SocketOptions {
            send_buffer_size: Some(64 * 1024),
            write_timeout: Some(Duration::from_millis(250)),
        };
        let framed = options.adopt(stream).unwrap();
        let size = nix::sys::socket::getsockopt(framed.stream(), sockopt::SndBuf).unwrap();
        // Linux doubles the requested value for bookkeeping
        assert!(size >= 64 * 1024);
        // The kernel rounds the timeout up to its clock tick
        let timeout = framed.stream().write_timeout().unwrap().unwrap();
        assert!(timeout >= Duration::from_millis(250));
        assert!(timeout <= Duration::from_millis(270));
    }

    #[test]
    fn test_stalled_subscriber_is_dropped() {
        let options = SocketOptions {
            send_buffer_size: Some(16 * 1024),
            write_timeout: Some(Duration::from_millis(100)),
        };
        let mut socket = TcpPubSocket::bind(0, options).unwrap();
        let port = socket.local_addr().unwrap().port();
        // Connected but never reads
        let _stalled = TcpStream::connect(("127.0.0.1", port)).unwrap();

        let frame = vec![0u8; 1 << 20];
        let started = std::time::Instant::now();
        for _ in 0..64 {
            socket.transmit(&frame).unwrap();
            if socket.peer_count() == 0 {
                break;
            }
        }
        assert_eq!(socket.peer_count(), 0);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_default_options_bound_writes() {
        let options = SocketOptions::default();
        assert_eq!(
            options.write_timeout,
            Some(Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS))
        );
    }
}
