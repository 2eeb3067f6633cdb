//! System-memory backend.
//!
//! Used headless (tests, the `skin` command without `--gpu`) and as the
//! reference the wgpu backend is checked against.

use super::buffer::check_write;
use super::{
    BufferDesc, BufferFactory, BufferId, BufferIdAllocator, BufferUsage, GpuBuffer, PoolError,
};

#[derive(Debug)]
pub struct HostBuffer {
    id: BufferId,
    usage: BufferUsage,
    data: Box<[u8]>,
}

impl HostBuffer {
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn contents(&self) -> &[u8] {
        &self.data
    }
}

impl GpuBuffer for HostBuffer {
    fn id(&self) -> BufferId {
        self.id
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[derive(Clone, Debug, Default)]
pub struct HostBufferFactory {
    ids: BufferIdAllocator,
    max_buffer_size: Option<u64>,
}

impl HostBufferFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject allocations above `limit`, mirroring a device limit.
    pub fn with_max_buffer_size(limit: u64) -> Self {
        Self {
            ids: BufferIdAllocator::new(),
            max_buffer_size: Some(limit),
        }
    }
}

impl BufferFactory for HostBufferFactory {
    type Buffer = HostBuffer;

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<HostBuffer, PoolError> {
        if let Some(limit) = self.max_buffer_size {
            if desc.size > limit {
                return Err(PoolError::ExceedsDeviceLimit {
                    label: desc.label,
                    size: desc.size,
                    limit,
                });
            }
        }
        let len = usize::try_from(desc.size).map_err(|_| PoolError::Backend {
            label: desc.label,
            reason: format!("{} bytes is not addressable", desc.size),
        })?;
        Ok(HostBuffer {
            id: self.ids.next_id(),
            usage: desc.usage,
            data: vec![0u8; len].into_boxed_slice(),
        })
    }

    fn write_buffer(
        &mut self,
        buffer: &mut HostBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), PoolError> {
        check_write(buffer.size(), offset, data.len())?;
        let start = offset as usize;
        buffer.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}
