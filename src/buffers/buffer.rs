//! Pool-owned byte buffer handle

use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use super::pool::PoolShared;

/// Identifier assigned to every buffer a pool creates
pub type BufferId = u64;

/// An exclusively owned, resizable byte buffer borrowed from a [`BufferPool`]
///
/// The handle is move-only. Dropping it, wherever that happens (after a
/// transmit, when replaced in a mailbox, on an early return), puts the
/// storage back on the pool's free list, so every acquired buffer is
/// released exactly once.
///
/// [`BufferPool`]: super::BufferPool
pub struct PooledBuffer {
    id: BufferId,
    data: Vec<u8>,
    pool: Arc<PoolShared>,
}

impl PooledBuffer {
    pub(super) fn new(id: BufferId, data: Vec<u8>, pool: Arc<PoolShared>) -> Self {
        Self { id, data, pool }
    }

    /// Identifier of the underlying pool slot
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Number of bytes in use
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes available without reallocating
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Resize to `len` bytes; new bytes are zeroed
    pub fn resize(&mut self, len: usize) {
        self.data.resize(len, 0);
    }

    /// Drop the contents but keep the capacity
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Append raw bytes
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Get the buffer as a byte slice
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get the buffer as a mutable byte slice
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Name of the pool this buffer returns to
    pub fn pool_name(&self) -> &str {
        &self.pool.config.name
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let data = std::mem::take(&mut self.data);
        self.pool.put(self.id, data);
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsMut<[u8]> for PooledBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("id", &self.id)
            .field("len", &self.data.len())
            .field("capacity", &self.data.capacity())
            .field("pool", &self.pool.config.name)
            .finish()
    }
}
