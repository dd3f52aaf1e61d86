//! # Sensorwire - Latest-Value Telemetry Transport
//!
//! Sensorwire moves stereo-camera products (images, point clouds, obstacle
//! lists, navigation state, QA findings) from a producer to any number of
//! subscribers over fixed TCP ports. Consumers always want the freshest
//! sample, so a slow network never backs up the producer: an unsent
//! sample is replaced by the next one.
//!
//! ## Features
//!
//! - **Pooled buffers**: producers encode straight into reusable buffers
//! - **Versioned framing**: every message carries a type tag and a
//!   major/minor version; declared sizes are validated before allocation
//! - **Non-blocking publish**: a single-slot mailbox feeds a sender thread
//! - **Fail-soft decoding**: malformed input is logged and skipped
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  acquire   ┌────────────┐
//! │   Producer   │◄───────────│ BufferPool │◄──────────────┐
//! │  (encode)    │            └────────────┘               │ drop
//! └──────┬───────┘                                         │
//!        │ publish (never blocks)                          │
//!        ▼                                                 │
//! ┌──────────────┐  take   ┌───────────────┐  frames  ┌────┴───────┐
//! │   Mailbox    │────────►│ Sender thread │─────────►│ Subscribers│
//! │ (one slot)   │         │  (Transport)  │   TCP    └────────────┘
//! └──────────────┘         └───────────────┘
//! ```

pub mod buffers;
pub mod consumer;
pub mod error;
pub mod messages;
pub mod sync;
pub mod topic;
pub mod transport;

// Main API re-exports
pub use buffers::{
    BufferPool, BufferPoolConfig, BufferPoolConfigBuilder, BufferPoolStats, PooledBuffer,
};
pub use consumer::{FrameGapDetector, GapReport};
pub use error::{DecodeError, Result, SensorWireError};
pub use messages::{AnyMessage, MessageInfo, MessageType, WireMessage};
pub use sync::{CancellationToken, Mailbox, PutOutcome};
pub use topic::{Endpoint, Topic, TopicPattern};
pub use transport::{
    Publisher, PublisherConfig, PublisherState, PublisherStats, RequestClient, RequestServer,
    Subscriber, TcpPubSocket, Transport,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 4;
pub const VERSION_PATCH: u32 = 0;

/// Default configuration constants
pub mod config {
    /// Pause after a publisher binds so subscribers can connect (ms)
    pub const DEFAULT_JOIN_GRACE_MS: u64 = 200;

    /// Largest frame a receiver accepts (1 GiB)
    pub const MAX_FRAME_BYTES: usize = 1 << 30;

    /// How often blocking receives check for cancellation (ms)
    pub const POLL_INTERVAL_MS: u64 = 100;

    /// Back-off between failed dials (ms)
    pub const RECONNECT_INTERVAL_MS: u64 = 100;

    /// Request/reply timeout used by the CLI (ms)
    pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2000;

    /// A subscriber whose socket accepts no bytes for this long is dropped (ms)
    pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 1000;

    /// Longest pause tolerated between bytes of a frame once it has started (ms)
    pub const FRAME_STALL_TIMEOUT_MS: u64 = 1000;
}
