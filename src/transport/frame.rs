//! Length-prefixed framing over a TCP stream
//!
//! ```text
//! ┌──────────────────┬──────────────────────┐
//! │ Length (4 bytes) │ Message bytes        │
//! │ Big-endian u32   │ (envelope first)     │
//! └──────────────────┴──────────────────────┘
//! ```

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use log::debug;

use crate::config::{FRAME_STALL_TIMEOUT_MS, MAX_FRAME_BYTES};
use crate::error::{Result, SensorWireError};

const PREFIX_LEN: usize = 4;

/// A connected stream exchanging whole frames
#[derive(Debug)]
pub(crate) struct FramedStream {
    stream: TcpStream,
    peer: SocketAddr,
}

impl FramedStream {
    pub(crate) fn new(stream: TcpStream) -> Result<Self> {
        stream
            .set_nonblocking(false)
            .map_err(|e| SensorWireError::from_io(e, "Failed to set blocking mode"))?;
        stream
            .set_nodelay(true)
            .map_err(|e| SensorWireError::from_io(e, "Failed to disable Nagle"))?;
        let peer = stream
            .peer_addr()
            .map_err(|e| SensorWireError::from_io(e, "Peer address unavailable"))?;
        Ok(Self { stream, peer })
    }

    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub(crate) fn stream(&self) -> &TcpStream {
        &self.stream
    }

    pub(crate) fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.stream
            .set_write_timeout(timeout)
            .map_err(|e| SensorWireError::from_io(e, "Failed to set write timeout"))
    }

    /// Write one frame; blocks until the kernel has taken every byte
    pub(crate) fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > MAX_FRAME_BYTES {
            return Err(SensorWireError::invalid_parameter(
                "frame",
                format!("{} bytes exceeds the {} byte frame limit", bytes.len(), MAX_FRAME_BYTES),
            ));
        }
        let prefix = (bytes.len() as u32).to_be_bytes();
        self.stream.write_all(&prefix)?;
        self.stream.write_all(bytes)?;
        Ok(())
    }

    /// Read one frame into `buf`
    ///
    /// Returns `Ok(false)` if nothing arrived within `wait`. Once the first
    /// prefix byte is in, every further read may stall for at most
    /// [`FRAME_STALL_TIMEOUT_MS`]; a peer that stops mid-frame is an error
    /// and the stream must be dropped.
    pub(crate) fn recv(&mut self, buf: &mut Vec<u8>, wait: Option<Duration>) -> Result<bool> {
        let wait = wait.map(|w| w.max(Duration::from_millis(1)));
        self.stream.set_read_timeout(wait)?;

        let mut prefix = [0u8; PREFIX_LEN];
        let mut filled = 0;
        while filled < PREFIX_LEN {
            match self.stream.read(&mut prefix[filled..]) {
                Ok(0) => {
                    return Err(SensorWireError::from_io(
                        io::ErrorKind::UnexpectedEof.into(),
                        &format!("{} closed the connection", self.peer),
                    ))
                }
                Ok(n) => {
                    if filled == 0 {
                        self.stream
                            .set_read_timeout(Some(Duration::from_millis(FRAME_STALL_TIMEOUT_MS)))?;
                    }
                    filled += n;
                }
                Err(e) if filled == 0 && is_timeout(&e) => return Ok(false),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_timeout(&e) => return Err(self.stalled(e, "frame length")),
                Err(e) => return Err(SensorWireError::from_io(e, "Failed to read frame length")),
            }
        }

        let len = u32::from_be_bytes(prefix) as usize;
        if len > MAX_FRAME_BYTES {
            return Err(SensorWireError::invalid_parameter(
                "frame_length",
                format!("{} announced a {} byte frame", self.peer, len),
            ));
        }

        buf.clear();
        buf.resize(len, 0);
        self.stream.read_exact(buf).map_err(|e| {
            if is_timeout(&e) {
                self.stalled(e, "frame body")
            } else {
                SensorWireError::from_io(e, "Failed to read frame body")
            }
        })?;
        debug!("Received {} byte frame from {}", len, self.peer);
        Ok(true)
    }

    fn stalled(&self, err: io::Error, part: &str) -> SensorWireError {
        SensorWireError::from_io(err, &format!("{} stalled inside the {}", self.peer, part))
    }
}

pub(crate) fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn pair() -> (FramedStream, FramedStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        (
            FramedStream::new(client).unwrap(),
            FramedStream::new(server).unwrap(),
        )
    }

    #[test]
    fn test_frames_keep_boundaries() {
        let (mut tx, mut rx) = pair();
        tx.send(b"first").unwrap();
        tx.send(b"").unwrap();
        tx.send(&[7u8; 70_000]).unwrap();

        let mut buf = Vec::new();
        assert!(rx.recv(&mut buf, None).unwrap());
        assert_eq!(buf, b"first");
        assert!(rx.recv(&mut buf, None).unwrap());
        assert!(buf.is_empty());
        assert!(rx.recv(&mut buf, None).unwrap());
        assert_eq!(buf.len(), 70_000);
    }

    #[test]
    fn test_recv_times_out_then_reports_eof() {
        let (tx, mut rx) = pair();
        let mut buf = Vec::new();
        assert!(!rx.recv(&mut buf, Some(Duration::from_millis(20))).unwrap());

        drop(tx);
        let err = rx.recv(&mut buf, Some(Duration::from_millis(500))).unwrap_err();
        assert!(err.is_disconnect());
    }

    #[test]
    fn test_peer_stalling_mid_frame_is_an_error() {
        let (mut tx, mut rx) = pair();
        tx.stream.write_all(&[0u8, 0]).unwrap();

        let started = std::time::Instant::now();
        let mut buf = Vec::new();
        let err = rx.recv(&mut buf, Some(Duration::from_millis(20))).unwrap_err();
        assert!(matches!(err, SensorWireError::Io { .. }));
        assert!(!err.is_disconnect());
        assert!(started.elapsed() < Duration::from_millis(FRAME_STALL_TIMEOUT_MS * 3));

        // Same for a body that never finishes, even with no initial wait
        let (mut tx, mut rx) = pair();
        tx.stream.write_all(&16u32.to_be_bytes()).unwrap();
        tx.stream.write_all(b"half").unwrap();
        assert!(rx.recv(&mut buf, None).is_err());
    }

    #[test]
    fn test_oversized_announcement_rejected() {
        let (mut tx, mut rx) = pair();
        tx.stream.write_all(&u32::MAX.to_be_bytes()).unwrap();
        let mut buf = Vec::new();
        assert!(matches!(
            rx.recv(&mut buf, None),
            Err(SensorWireError::InvalidParameter { .. })
        ));
    }
}
