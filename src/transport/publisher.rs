//! Latest-value publisher with a dedicated sender thread
//!
//! `publish` only swaps a buffer into a single-slot mailbox and returns.
//! The sender thread takes whatever is in the slot, transmits it, and
//! drops it, which puts the storage back on the pool. A buffer replaced in
//! the slot before the sender took it is never transmitted.

use std::fmt;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};

use log::{debug, error, info, warn};

use crate::buffers::{BufferPool, BufferPoolConfig, PooledBuffer};
use crate::error::{Result, SensorWireError};
use crate::messages::WireMessage;
use crate::sync::{CancelListener, CancellationToken, Mailbox, PutOutcome};

use super::config::PublisherConfig;
use super::socket::TcpPubSocket;
use super::stats::{AtomicPublisherStats, PublisherStats};
use super::Transport;

/// Where the sender thread is in its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PublisherState {
    Idle = 0,
    WaitingForData = 1,
    Sending = 2,
    ShuttingDown = 3,
    Stopped = 4,
}

impl PublisherState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::WaitingForData,
            2 => Self::Sending,
            3 => Self::ShuttingDown,
            _ => Self::Stopped,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::ShuttingDown | Self::Stopped)
    }
}

impl fmt::Display for PublisherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug)]
struct Shared {
    name: String,
    state: AtomicU8,
    stats: AtomicPublisherStats,
}

impl Shared {
    fn state(&self) -> PublisherState {
        PublisherState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move to `next` unless shutdown already began
    fn advance(&self, next: PublisherState) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let current = PublisherState::from_u8(current);
                if current.is_terminal() && !next.is_terminal() {
                    None
                } else {
                    Some(next as u8)
                }
            });
    }
}

/// Non-blocking latest-value publisher for one topic
pub struct Publisher {
    shared: Arc<Shared>,
    pool: BufferPool,
    mailbox: Arc<Mailbox<PooledBuffer>>,
    local_addr: Option<SocketAddr>,
    sender: Option<JoinHandle<()>>,
}

impl Publisher {
    /// Open the TCP socket named by `config` and start the sender thread
    ///
    /// Binding publishers pause for `join_grace` before returning so
    /// subscribers that were already dialing do not miss the first frames.
    pub fn new(config: PublisherConfig, token: &CancellationToken) -> Result<Self> {
        config.validate()?;

        let endpoint = config.endpoint();
        let socket = TcpPubSocket::open(endpoint.clone(), config.socket_options())?;
        let local_addr = socket.local_addr();

        if endpoint.is_bind() && !config.join_grace.is_zero() {
            thread::sleep(config.join_grace);
        }

        let mut publisher = Self::with_transport(config.topic, socket, config.pool, token)?;
        publisher.local_addr = local_addr;
        Ok(publisher)
    }

    /// Start a publisher over any [`Transport`]
    ///
    /// The transport moves into the sender thread and is never touched by
    /// the caller again.
    pub fn with_transport<T: Transport>(
        name: impl Into<String>,
        transport: T,
        pool_config: BufferPoolConfig,
        token: &CancellationToken,
    ) -> Result<Self> {
        let pool = BufferPool::new(pool_config)?;
        let shared = Arc::new(Shared {
            name: name.into(),
            state: AtomicU8::new(PublisherState::Idle as u8),
            stats: AtomicPublisherStats::new(),
        });

        let mailbox = Arc::new(Mailbox::new());
        let listener: Arc<dyn CancelListener> = mailbox.clone();
        token.register(&listener);

        let sender = {
            let shared = Arc::clone(&shared);
            let mailbox = Arc::clone(&mailbox);
            thread::Builder::new()
                .name(format!("pub-{}", shared.name))
                .spawn(move || sender_loop(transport, &mailbox, &shared))
                .map_err(|e| SensorWireError::from_io(e, "Failed to spawn sender thread"))?
        };

        info!("Publisher '{}' started", shared.name);

        Ok(Self {
            shared,
            pool,
            mailbox,
            local_addr: None,
            sender: Some(sender),
        })
    }

    /// Get an empty buffer from this publisher's pool
    pub fn acquire_buffer(&self) -> PooledBuffer {
        self.pool.acquire()
    }

    /// Hand a fully encoded buffer to the sender thread
    ///
    /// Never blocks on the network. A buffer still waiting from an earlier
    /// call is replaced and returned to the pool unsent.
    pub fn publish(&self, buffer: PooledBuffer) -> Result<()> {
        match self.mailbox.put(buffer) {
            PutOutcome::Stored => {
                self.shared.stats.record_publish(false);
                Ok(())
            }
            PutOutcome::Replaced(stale) => {
                self.shared.stats.record_publish(true);
                debug!(
                    "Publisher '{}' superseded buffer {} ({} bytes) before it was sent",
                    self.shared.name,
                    stale.id(),
                    stale.len()
                );
                Ok(())
            }
            PutOutcome::Closed(_) => Err(SensorWireError::closed(format!(
                "publisher '{}'",
                self.shared.name
            ))),
        }
    }

    /// Acquire a buffer, encode `message` into it and publish it
    pub fn publish_message<M: WireMessage>(&self, message: &M) -> Result<()> {
        let mut buffer = self.acquire_buffer();
        message.encode_into(&mut buffer)?;
        self.publish(buffer)
    }

    pub fn state(&self) -> PublisherState {
        self.shared.state()
    }

    pub fn stats(&self) -> PublisherStats {
        self.shared.stats.snapshot()
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Port actually bound, for binding TCP publishers
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Check whether a published buffer is still waiting for the sender
    pub fn has_pending(&self) -> bool {
        self.mailbox.has_pending()
    }

    /// Stop the sender thread and wait for it
    ///
    /// A transmit in progress completes first; a buffer still waiting in
    /// the mailbox is returned to the pool unsent. Idempotent.
    pub fn shutdown(&mut self) {
        let Some(sender) = self.sender.take() else {
            return;
        };

        self.shared.advance(PublisherState::ShuttingDown);
        drop(self.mailbox.close());

        if sender.join().is_err() {
            error!("Publisher '{}' sender thread panicked", self.shared.name);
        }
        self.shared.advance(PublisherState::Stopped);
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

fn sender_loop<T: Transport>(
    mut transport: T,
    mailbox: &Mailbox<PooledBuffer>,
    shared: &Shared,
) {
    debug!(
        "Sender thread for '{}' running on {}",
        shared.name,
        transport.describe()
    );

    loop {
        shared.advance(PublisherState::WaitingForData);
        let Some(buffer) = mailbox.take() else {
            break;
        };

        shared.advance(PublisherState::Sending);
        match transport.transmit(&buffer) {
            Ok(()) => shared.stats.record_transmit(buffer.len()),
            Err(e) if e.is_disconnect() => {
                shared.stats.record_failure();
                debug!("Publisher '{}' lost a peer: {}", shared.name, e);
            }
            Err(e) => {
                shared.stats.record_failure();
                warn!("Publisher '{}' failed to transmit: {}", shared.name, e);
            }
        }
        drop(buffer);
        shared.advance(PublisherState::Idle);
    }

    shared.advance(PublisherState::ShuttingDown);
    let stats = shared.stats.snapshot();
    info!(
        "Publisher '{}' sender exiting ({} transmitted, {} superseded, {} failed)",
        shared.name, stats.transmitted, stats.superseded, stats.failed
    );
}
