//! Moving encoded messages between processes
//!
//! - [`Publisher`]: non-blocking latest-value publish with a sender thread
//! - [`TcpPubSocket`]: the TCP transport a publisher sends through
//! - [`Subscriber`]: receives frames from one topic
//! - [`RequestClient`] / [`RequestServer`]: the request/reply control topics
//!
//! Frames are length prefixed on the wire; see [`frame`].

pub mod config;
pub(crate) mod frame;
pub mod publisher;
pub mod reqrep;
pub mod socket;
pub mod stats;
pub mod subscriber;

pub use config::PublisherConfig;
pub use publisher::{Publisher, PublisherState};
pub use reqrep::{RequestClient, RequestServer};
pub use socket::{SocketOptions, TcpPubSocket};
pub use stats::{AtomicPublisherStats, PublisherStats};
pub use subscriber::Subscriber;

use crate::error::Result;

/// Anything a publisher's sender thread can hand a frame to
///
/// The transport is owned by the sender thread, so implementations need
/// no internal locking.
pub trait Transport: Send + 'static {
    /// Send one complete frame; may block on the network
    fn transmit(&mut self, frame: &[u8]) -> Result<()>;

    /// Human-readable destination for log lines
    fn describe(&self) -> String;
}
