//! Sinew Render Backend
//!
//! wgpu implementation of the buffer factory used by the skin cache.

pub mod backend;
mod buffer;
mod context;

pub use backend::probe_capabilities;
pub use buffer::{WgpuBuffer, WgpuBufferFactory};
pub use context::RenderContext;
pub use wgpu;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// Rendering backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Metal (macOS, iOS)
    Metal,
    /// DirectX 12 (Windows)
    DirectX12,
    /// Vulkan (cross-platform)
    Vulkan,
    /// OpenGL / GLES (fallback)
    OpenGL,
    /// WebGPU in a browser
    BrowserWebGpu,
    /// No real backend
    Empty,
}

impl From<wgpu::Backend> for BackendType {
    fn from(backend: wgpu::Backend) -> Self {
        match backend {
            wgpu::Backend::Metal => Self::Metal,
            wgpu::Backend::Dx12 => Self::DirectX12,
            wgpu::Backend::Vulkan => Self::Vulkan,
            wgpu::Backend::Gl => Self::OpenGL,
            wgpu::Backend::BrowserWebGpu => Self::BrowserWebGpu,
            _ => Self::Empty,
        }
    }
}

/// Capability probe result
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    pub backend: BackendType,
    pub adapter_name: String,
    pub max_buffer_size: u64,
    pub max_storage_buffer_binding_size: u32,
    pub supports_compute: bool,
}
