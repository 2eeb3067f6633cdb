//! Adapter capability probing

use crate::{BackendType, DeviceCapabilities};

/// Limits that decide whether skinning can run on this adapter.
pub fn probe_capabilities(adapter: &wgpu::Adapter) -> DeviceCapabilities {
    let info = adapter.get_info();
    let limits = adapter.limits();
    let flags = adapter.get_downlevel_capabilities().flags;

    DeviceCapabilities {
        backend: info.backend.into(),
        adapter_name: info.name,
        max_buffer_size: limits.max_buffer_size,
        max_storage_buffer_binding_size: limits.max_storage_buffer_binding_size,
        supports_compute: flags.contains(wgpu::DownlevelFlags::COMPUTE_SHADERS),
    }
}

#[cfg(test)]
mod tests {
    use crate::BackendType;

    #[test]
    fn backends_map_one_to_one() {
        assert_eq!(BackendType::from(wgpu::Backend::Vulkan), BackendType::Vulkan);
        assert_eq!(BackendType::from(wgpu::Backend::Dx12), BackendType::DirectX12);
        assert_eq!(BackendType::from(wgpu::Backend::Gl), BackendType::OpenGL);
    }
}
