//! Size-bucketed pooling of GPU buffers.
//!
//! Requests are rounded up to a fixed bucket schedule so that buffers
//! released by one mesh can be picked up by another whose vertex or bone
//! count differs slightly from frame to frame.

mod buckets;
mod buffer;
mod host;
#[allow(clippy::module_inception)]
mod pool;

pub use buckets::{
    bucket_index, bucket_size, rounded_size, try_bucket_index, MAX_BUCKET_SIZE, NUM_POOL_BUCKETS,
    POOL_BUCKET_SIZES,
};
pub use buffer::{
    check_write, BufferDesc, BufferFactory, BufferId, BufferIdAllocator, BufferUsage, GpuBuffer,
};
pub use host::{HostBuffer, HostBufferFactory};
pub use pool::{PoolKind, PoolSettings, PoolStats, ResourcePool};

use thiserror::Error;

/// Failures surfaced by buffer factories and pools.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("{label}: {size} byte buffer exceeds the device limit of {limit} bytes")]
    ExceedsDeviceLimit {
        label: &'static str,
        size: u64,
        limit: u64,
    },

    #[error("write of {len} bytes at offset {offset} overruns a {size} byte buffer")]
    WriteOutOfBounds { offset: u64, len: usize, size: u64 },

    #[error("backend failed to create '{label}': {reason}")]
    Backend { label: &'static str, reason: String },
}
