use crate::RenderContext;
use sinew_core::pool::{
    check_write, BufferDesc, BufferFactory, BufferId, BufferIdAllocator, BufferUsage, GpuBuffer,
    PoolError,
};
use std::sync::Arc;

/// Storage buffer readable by the skinning shaders.
#[derive(Debug)]
pub struct WgpuBuffer {
    id: BufferId,
    label: &'static str,
    buffer: wgpu::Buffer,
}

impl WgpuBuffer {
    pub fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Whole-buffer binding for a bind group entry.
    pub fn binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

impl GpuBuffer for WgpuBuffer {
    fn id(&self) -> BufferId {
        self.id
    }

    fn size(&self) -> u64 {
        self.buffer.size()
    }
}

/// Allocates pool buffers on a wgpu device. Clones share the device and
/// the id sequence.
#[derive(Clone)]
pub struct WgpuBufferFactory {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    ids: BufferIdAllocator,
    max_buffer_size: u64,
}

impl WgpuBufferFactory {
    pub fn new(context: &RenderContext) -> Self {
        Self {
            device: Arc::clone(&context.device),
            queue: Arc::clone(&context.queue),
            ids: BufferIdAllocator::new(),
            max_buffer_size: context.device.limits().max_buffer_size,
        }
    }

    /// Submit queued uploads.
    pub fn flush(&self) {
        self.queue.submit(std::iter::empty());
    }

    fn usages(usage: BufferUsage) -> wgpu::BufferUsages {
        let base = wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC;
        match usage {
            BufferUsage::SkinnedPositions => base | wgpu::BufferUsages::VERTEX,
            BufferUsage::Bones | BufferUsage::Cloth | BufferUsage::SkinnedTangents => base,
        }
    }
}

impl BufferFactory for WgpuBufferFactory {
    type Buffer = WgpuBuffer;

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<WgpuBuffer, PoolError> {
        if desc.size > self.max_buffer_size {
            return Err(PoolError::ExceedsDeviceLimit {
                label: desc.label,
                size: desc.size,
                limit: self.max_buffer_size,
            });
        }
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(desc.label),
            size: desc.size,
            usage: Self::usages(desc.usage),
            mapped_at_creation: false,
        });
        Ok(WgpuBuffer {
            id: self.ids.next_id(),
            label: desc.label,
            buffer,
        })
    }

    fn write_buffer(
        &mut self,
        buffer: &mut WgpuBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), PoolError> {
        check_write(buffer.size(), offset, data.len())?;
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0
            || data.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT != 0
        {
            return Err(PoolError::Backend {
                label: buffer.label,
                reason: format!(
                    "write of {} bytes at offset {offset} is not {}-byte aligned",
                    data.len(),
                    wgpu::COPY_BUFFER_ALIGNMENT
                ),
            });
        }
        self.queue.write_buffer(&buffer.buffer, offset, data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skinned_positions_are_also_vertex_buffers() {
        let usages = WgpuBufferFactory::usages(BufferUsage::SkinnedPositions);
        assert!(usages.contains(wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::STORAGE));

        let bones = WgpuBufferFactory::usages(BufferUsage::Bones);
        assert!(bones.contains(wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC));
        assert!(!bones.contains(wgpu::BufferUsages::VERTEX));
    }
}
