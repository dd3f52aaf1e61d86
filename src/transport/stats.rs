//! Statistics for publishers

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the producer and the sender thread
#[derive(Debug, Default)]
pub struct AtomicPublisherStats {
    /// Buffers accepted by `publish`
    pub published: AtomicU64,
    /// Buffers replaced in the mailbox before they were sent
    pub superseded: AtomicU64,
    /// Frames handed to the transport successfully
    pub transmitted: AtomicU64,
    /// Transmits the transport reported as failed
    pub failed: AtomicU64,
    /// Bytes in successfully transmitted frames
    pub bytes_transmitted: AtomicU64,
}

impl AtomicPublisherStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a publish, and whether it displaced a pending buffer
    pub fn record_publish(&self, superseded: bool) {
        self.published.fetch_add(1, Ordering::Relaxed);
        if superseded {
            self.superseded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_transmit(&self, bytes: usize) {
        self.transmitted.fetch_add(1, Ordering::Relaxed);
        self.bytes_transmitted
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics
    pub fn snapshot(&self) -> PublisherStats {
        PublisherStats {
            published: self.published.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            transmitted: self.transmitted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            bytes_transmitted: self.bytes_transmitted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`AtomicPublisherStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublisherStats {
    pub published: u64,
    pub superseded: u64,
    pub transmitted: u64,
    pub failed: u64,
    pub bytes_transmitted: u64,
}

impl PublisherStats {
    /// Fraction of published buffers that never reached the transport
    pub fn drop_rate(&self) -> f64 {
        if self.published == 0 {
            return 0.0;
        }
        self.superseded as f64 / self.published as f64
    }

    /// Buffers still waiting in the mailbox or being sent
    pub fn in_flight(&self) -> u64 {
        self.published
            .saturating_sub(self.superseded)
            .saturating_sub(self.transmitted)
            .saturating_sub(self.failed)
    }
}
