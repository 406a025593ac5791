//! Headless wgpu setup for [`WgpuDevice`](crate::WgpuDevice).

use std::fmt;
use std::sync::Arc;

/// Errors raised while opening a [`GpuContext`].
#[derive(Debug, Clone)]
pub enum GraphicsError {
    /// No adapter matched the requested options.
    NoAdapter(String),
    /// The adapter refused to create a device.
    DeviceRequest(String),
    /// The adapter cannot hold an atlas texture of the requested size.
    TextureLimit { requested: u32, supported: u32 },
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::NoAdapter(msg) => write!(f, "No suitable GPU adapter: {}", msg),
            GraphicsError::DeviceRequest(msg) => write!(f, "Failed to create device: {}", msg),
            GraphicsError::TextureLimit {
                requested,
                supported,
            } => write!(
                f,
                "Adapter supports {}px textures, {}px requested",
                supported, requested
            ),
        }
    }
}

impl std::error::Error for GraphicsError {}

/// Options for opening a [`GpuContext`].
#[derive(Debug, Clone)]
pub struct GpuContextOptions {
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    /// Use a software adapter, mostly for CI.
    pub software: bool,
    /// Smallest texture edge the device must support. Glyph atlases grow up
    /// to this size.
    pub min_texture_size: u32,
}

impl Default for GpuContextOptions {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            software: false,
            min_texture_size: 2048,
        }
    }
}

impl GpuContextOptions {
    pub fn with_backends(mut self, backends: wgpu::Backends) -> Self {
        self.backends = backends;
        self
    }

    pub fn with_software_adapter(mut self, software: bool) -> Self {
        self.software = software;
        self
    }

    pub fn with_min_texture_size(mut self, size: u32) -> Self {
        self.min_texture_size = size;
        self
    }
}

/// Adapter, device and queue shared by everything drawing a frame.
///
/// ```rust,no_run
/// use orrery_render::{GpuContext, GpuContextOptions};
///
/// let ctx = GpuContext::open_blocking(GpuContextOptions::default()).expect("no GPU");
/// println!("{} ({}px textures)", ctx.adapter_name(), ctx.max_texture_size());
/// ```
pub struct GpuContext {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GpuContext {
    pub async fn open(options: GpuContextOptions) -> Result<Arc<Self>, GraphicsError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: options.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: options.power_preference,
                compatible_surface: None,
                force_fallback_adapter: options.software,
            })
            .await
            .map_err(|e| GraphicsError::NoAdapter(e.to_string()))?;

        let supported = adapter.limits().max_texture_dimension_2d;
        if supported < options.min_texture_size {
            return Err(GraphicsError::TextureLimit {
                requested: options.min_texture_size,
                supported,
            });
        }

        // Ask for the adapter's own texture limit so atlases can use all of it.
        let limits = wgpu::Limits {
            max_texture_dimension_2d: supported,
            ..wgpu::Limits::downlevel_defaults()
        };
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Orrery Device"),
                required_limits: limits,
                ..Default::default()
            })
            .await
            .map_err(|e| GraphicsError::DeviceRequest(e.to_string()))?;

        tracing::info!(
            "Opened {} ({:?}), max texture {}px",
            adapter.get_info().name,
            adapter.get_info().backend,
            supported
        );

        Ok(Arc::new(Self {
            adapter,
            device,
            queue,
        }))
    }

    /// Blocks the current thread until the context is open.
    pub fn open_blocking(options: GpuContextOptions) -> Result<Arc<Self>, GraphicsError> {
        pollster::block_on(Self::open(options))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter_name(&self) -> String {
        self.adapter.get_info().name
    }

    pub fn max_texture_size(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    pub fn min_uniform_alignment(&self) -> usize {
        self.device.limits().min_uniform_buffer_offset_alignment.max(1) as usize
    }
}
