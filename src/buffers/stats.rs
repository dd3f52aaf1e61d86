//! Buffer pool statistics tracking

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Snapshot of buffer pool counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferPoolStats {
    /// Total number of buffers ever allocated
    pub total_allocated: usize,
    /// Number of buffers currently handed out
    pub currently_in_use: usize,
    /// Peak number of buffers handed out simultaneously
    pub peak_usage: usize,
    /// Total number of acquire calls
    pub total_acquisitions: u64,
    /// Total number of buffers returned
    pub total_releases: u64,
    /// Acquisitions served from the free list
    pub reuse_hits: u64,
}

impl BufferPoolStats {
    /// Create new statistics instance
    pub fn new() -> Self {
        Default::default()
    }

    /// Fraction of acquisitions that did not allocate (0.0 to 1.0)
    pub fn reuse_rate(&self) -> f64 {
        if self.total_acquisitions == 0 {
            return 0.0;
        }
        self.reuse_hits as f64 / self.total_acquisitions as f64
    }

    /// Calculate pool utilization (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.total_allocated == 0 {
            return 0.0;
        }
        self.currently_in_use as f64 / self.total_allocated as f64
    }

    /// Get a summary string of the statistics
    pub fn summary(&self) -> String {
        format!(
            "BufferPoolStats {{ allocated: {}, in_use: {}, peak: {}, \
             acquisitions: {}, releases: {}, reuse_rate: {:.2}% }}",
            self.total_allocated,
            self.currently_in_use,
            self.peak_usage,
            self.total_acquisitions,
            self.total_releases,
            self.reuse_rate() * 100.0
        )
    }
}

/// Thread-safe counters updated by the acquiring and releasing threads
#[derive(Debug, Default)]
pub struct AtomicBufferPoolStats {
    pub total_allocated: AtomicUsize,
    pub currently_in_use: AtomicUsize,
    pub peak_usage: AtomicUsize,
    pub total_acquisitions: AtomicU64,
    pub total_releases: AtomicU64,
    pub reuse_hits: AtomicU64,
}

impl AtomicBufferPoolStats {
    /// Create new atomic statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a buffer leaving the pool
    pub fn record_acquire(&self, reused: bool) {
        self.total_acquisitions.fetch_add(1, Ordering::Relaxed);
        if reused {
            self.reuse_hits.fetch_add(1, Ordering::Relaxed);
        }
        let in_use = self.currently_in_use.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_usage.fetch_max(in_use, Ordering::Relaxed);
    }

    /// Record a buffer coming back
    pub fn record_release(&self) {
        self.total_releases.fetch_add(1, Ordering::Relaxed);
        self.currently_in_use.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record newly created buffers
    pub fn record_expansion(&self, new_buffers: usize) {
        self.total_allocated.fetch_add(new_buffers, Ordering::Relaxed);
    }

    /// Get current statistics snapshot
    pub fn snapshot(&self) -> BufferPoolStats {
        BufferPoolStats {
            total_allocated: self.total_allocated.load(Ordering::Relaxed),
            currently_in_use: self.currently_in_use.load(Ordering::Relaxed),
            peak_usage: self.peak_usage.load(Ordering::Relaxed),
            total_acquisitions: self.total_acquisitions.load(Ordering::Relaxed),
            total_releases: self.total_releases.load(Ordering::Relaxed),
            reuse_hits: self.reuse_hits.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_tracks_high_water_mark() {
        let stats = AtomicBufferPoolStats::new();
        stats.record_acquire(false);
        stats.record_acquire(false);
        stats.record_release();
        stats.record_acquire(true);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.peak_usage, 2);
        assert_eq!(snapshot.currently_in_use, 2);
        assert_eq!(snapshot.reuse_hits, 1);
        assert!((snapshot.reuse_rate() - 1.0 / 3.0).abs() < 1e-9);
    }
}
