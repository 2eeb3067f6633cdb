use crate::{probe_capabilities, DeviceCapabilities, RenderError};
use std::sync::Arc;

/// Headless device and queue. Skinning only needs compute and copies,
/// so no surface is created.
pub struct RenderContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub capabilities: DeviceCapabilities,
}

impl RenderContext {
    /// Block on adapter and device creation.
    pub fn request() -> Result<Self, RenderError> {
        pollster::block_on(Self::request_async())
    }

    pub async fn request_async() -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let capabilities = probe_capabilities(&adapter);
        tracing::info!(
            adapter = %capabilities.adapter_name,
            backend = ?capabilities.backend,
            max_buffer_size = capabilities.max_buffer_size,
            "selected GPU adapter"
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Skin Cache Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            capabilities,
        })
    }
}
