//! Buffer pool implementation for allocation-free steady state publishing

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::SystemTime,
};

use log::debug;

use crate::error::Result;

use super::{
    buffer::{BufferId, PooledBuffer},
    config::BufferPoolConfig,
    stats::{AtomicBufferPoolStats, BufferPoolStats},
};

/// Bookkeeping for a buffer the pool created
#[derive(Debug, Clone, Copy)]
pub struct AllocationRecord {
    pub id: BufferId,
    pub created_at: SystemTime,
}

/// State shared by the pool handle and every outstanding buffer
#[derive(Debug)]
pub(crate) struct PoolShared {
    pub(crate) config: BufferPoolConfig,
    /// Free buffers, most recently returned last
    available: Mutex<Vec<(BufferId, Vec<u8>)>>,
    /// Every buffer ever created; only grows
    allocated: Mutex<Vec<AllocationRecord>>,
    stats: AtomicBufferPoolStats,
    next_id: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // The guarded collections stay consistent even if a holder panicked
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl PoolShared {
    fn register(&self) -> BufferId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.allocated).push(AllocationRecord {
            id,
            created_at: SystemTime::now(),
        });
        self.stats.record_expansion(1);
        id
    }

    pub(crate) fn put(&self, id: BufferId, mut data: Vec<u8>) {
        data.clear();
        lock(&self.available).push((id, data));
        self.stats.record_release();
    }
}

/// A growing set of reusable byte buffers
///
/// `acquire` hands out a free buffer or creates a new one; there is no
/// ceiling and no failure mode besides process-level allocation failure.
/// Memory committed by the pool is kept until the pool and all of its
/// buffers are gone. The free list and the allocation registry sit behind
/// separate locks so a producer acquiring and a sender thread releasing do
/// not contend on the same mutex.
///
/// Cloning the pool yields another handle to the same buffers.
#[derive(Debug, Clone)]
pub struct BufferPool {
    shared: Arc<PoolShared>,
}

impl BufferPool {
    /// Create a new buffer pool
    pub fn new(config: BufferPoolConfig) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(PoolShared {
            available: Mutex::new(Vec::with_capacity(config.initial_count)),
            allocated: Mutex::new(Vec::with_capacity(config.initial_count)),
            stats: AtomicBufferPoolStats::new(),
            next_id: AtomicU64::new(1),
            config,
        });

        for _ in 0..shared.config.initial_count {
            let id = shared.register();
            let data = Vec::with_capacity(shared.config.initial_capacity);
            lock(&shared.available).push((id, data));
        }

        debug!(
            "Buffer pool '{}' created with {} pre-allocated buffers",
            shared.config.name, shared.config.initial_count
        );

        Ok(Self { shared })
    }

    /// Create an empty pool with default settings
    pub fn with_name(name: impl Into<String>) -> Result<Self> {
        Self::new(BufferPoolConfig::new(name))
    }

    /// Get a free buffer, allocating a new one if none is available
    ///
    /// The returned buffer is empty; its capacity is whatever the previous
    /// user left behind.
    pub fn acquire(&self) -> PooledBuffer {
        let reused = lock(&self.shared.available).pop();

        let (id, data, was_reused) = match reused {
            Some((id, data)) => (id, data, true),
            None => (self.shared.register(), Vec::new(), false),
        };

        self.shared.stats.record_acquire(was_reused);
        PooledBuffer::new(id, data, Arc::clone(&self.shared))
    }

    /// Return a buffer to the pool
    ///
    /// Equivalent to dropping it; ownership makes a double release
    /// impossible.
    pub fn release(&self, buffer: PooledBuffer) {
        drop(buffer);
    }

    /// Get current statistics
    pub fn stats(&self) -> BufferPoolStats {
        self.shared.stats.snapshot()
    }

    /// Get pool configuration
    pub fn config(&self) -> &BufferPoolConfig {
        &self.shared.config
    }

    /// Number of buffers on the free list
    pub fn available_count(&self) -> usize {
        lock(&self.shared.available).len()
    }

    /// Number of buffers ever created by this pool
    pub fn allocated_count(&self) -> usize {
        lock(&self.shared.allocated).len()
    }

    /// Bytes held by free buffers
    pub fn idle_capacity(&self) -> usize {
        lock(&self.shared.available)
            .iter()
            .map(|(_, data)| data.capacity())
            .sum()
    }

    /// Allocation registry, oldest first
    pub fn allocations(&self) -> Vec<AllocationRecord> {
        lock(&self.shared.allocated).clone()
    }
}
