use super::PoolError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Stable identity of a GPU buffer. Trackers key resident data on it
/// instead of on addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Hands out unique [`BufferId`]s. Clones share the same sequence, so a
/// factory cloned into several pools never reuses an id.
#[derive(Clone, Debug, Default)]
pub struct BufferIdAllocator(Arc<AtomicU64>);

impl BufferIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> BufferId {
        BufferId(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// What a buffer is read as by the skinning shaders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// 3x4 bone matrices, read-only in the skinning pass.
    Bones,
    /// Simulated cloth positions blended over skinned output.
    Cloth,
    /// Skinned positions, written by compute and read as vertex data.
    SkinnedPositions,
    /// Skinned tangent frames.
    SkinnedTangents,
}

#[derive(Clone, Copy, Debug)]
pub struct BufferDesc {
    pub label: &'static str,
    pub size: u64,
    pub usage: BufferUsage,
}

/// A buffer handle plus everything needed to bind it for shader reads.
pub trait GpuBuffer {
    fn id(&self) -> BufferId;
    fn size(&self) -> u64;
}

/// Backend seam: the pool and skin cache only ever allocate and upload
/// through this trait.
pub trait BufferFactory {
    type Buffer: GpuBuffer;

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Self::Buffer, PoolError>;

    fn write_buffer(
        &mut self,
        buffer: &mut Self::Buffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), PoolError>;
}

/// Bounds check shared by backends before an upload.
pub fn check_write(size: u64, offset: u64, len: usize) -> Result<(), PoolError> {
    let end = offset.checked_add(len as u64);
    match end {
        Some(end) if end <= size => Ok(()),
        _ => Err(PoolError::WriteOutOfBounds { offset, len, size }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloned_allocators_share_a_sequence() {
        let a = BufferIdAllocator::new();
        let b = a.clone();
        let first = a.next_id();
        let second = b.next_id();
        assert_ne!(first, second);
        assert!(second > first);
    }

    #[test]
    fn write_bounds_are_checked() {
        assert!(check_write(64, 0, 64).is_ok());
        assert!(check_write(64, 16, 48).is_ok());
        assert!(matches!(
            check_write(64, 16, 49),
            Err(PoolError::WriteOutOfBounds { offset: 16, len: 49, size: 64 })
        ));
        assert!(check_write(64, u64::MAX, 1).is_err());
    }
}
