//! Buffer management and memory pools
//!
//! Producers encode messages straight into pooled buffers; the publisher's
//! sender thread drops each buffer once the transport is done with it,
//! which returns the storage to the pool for the next encode.

pub mod buffer;
pub mod config;
pub mod pool;
pub mod stats;

// Re-export main types
pub use buffer::{BufferId, PooledBuffer};
pub use config::{BufferPoolConfig, BufferPoolConfigBuilder};
pub use pool::{AllocationRecord, BufferPool};
pub use stats::{AtomicBufferPoolStats, BufferPoolStats};
