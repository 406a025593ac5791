//! Trait abstracting the immediate-mode graphics device.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Handle to a texture owned by a [`GraphicsDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Handle to a shader program registered with a [`GraphicsDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Pixel formats the renderer uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// One byte of coverage per texel (glyph atlases).
    Alpha8,
    /// Four bytes per texel.
    Rgba8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Alpha8 => 1,
            TextureFormat::Rgba8 => 4,
        }
    }
}

/// Description of a texture to create.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub label: Option<String>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Clamp coordinates at the edge instead of repeating.
    pub clamp: bool,
}

impl TextureDesc {
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            label: None,
            width,
            height,
            format,
            clamp: true,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Sub-rectangle of a texture, in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TextureRegion {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Blend equations used by the overlay and the annotation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// `src * a + dst * (1 - a)`
    Alpha,
    /// `src * a + dst`
    Additive,
}

/// A textured 2D vertex as submitted by text and sprite batches.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl QuadVertex {
    pub const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y],
            tex_coords: [u, v],
        }
    }
}

/// Errors reported by a [`GraphicsDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// Requested texture exceeds the device limit.
    TextureTooLarge { width: u32, height: u32, max: u32 },
    /// The handle does not name a live texture.
    UnknownTexture(TextureId),
    /// Upload region falls outside the texture or the data is too short.
    InvalidRegion(TextureRegion),
    /// Backend specific failure.
    Backend(String),
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceError::TextureTooLarge { width, height, max } => write!(
                f,
                "Texture {}x{} exceeds the device limit of {}",
                width, height, max
            ),
            DeviceError::UnknownTexture(id) => write!(f, "Unknown texture handle {}", id.0),
            DeviceError::InvalidRegion(region) => write!(
                f,
                "Invalid texture region {}x{} at ({}, {})",
                region.width, region.height, region.x, region.y
            ),
            DeviceError::Backend(msg) => write!(f, "Graphics backend error: {}", msg),
        }
    }
}

impl std::error::Error for DeviceError {}

/// Immediate-mode graphics device.
///
/// Binding state (texture units, current program, blend mode) is shared by
/// every caller. A component that binds something is expected to unbind it
/// before handing control back.
///
/// # Example
///
/// ```rust,no_run
/// use orrery_test_utils::{GraphicsDevice, QuadVertex};
///
/// fn draw_quad(device: &dyn GraphicsDevice) {
///     let vertices = [
///         QuadVertex::new(0.0, 0.0, 0.0, 1.0),
///         QuadVertex::new(1.0, 0.0, 1.0, 1.0),
///         QuadVertex::new(0.0, 1.0, 0.0, 0.0),
///         QuadVertex::new(1.0, 1.0, 1.0, 0.0),
///     ];
///     device.draw_indexed(&vertices, &[0, 1, 2, 1, 3, 2]);
/// }
/// ```
pub trait GraphicsDevice: Send + Sync {
    // Textures

    /// Largest width or height a texture may have.
    fn max_texture_size(&self) -> u32;

    /// Create an uninitialized texture.
    fn create_texture(&self, desc: &TextureDesc) -> Result<TextureId, DeviceError>;

    /// Upload tightly packed texel rows into `region`.
    fn write_texture(
        &self,
        texture: TextureId,
        region: TextureRegion,
        data: &[u8],
    ) -> Result<(), DeviceError>;

    /// Release a texture. Unknown handles are ignored.
    fn destroy_texture(&self, texture: TextureId);

    /// Bind a texture to a unit, or clear the unit with `None`.
    fn bind_texture(&self, unit: u32, texture: Option<TextureId>);

    // Programs

    /// Look up a program registered under `name`.
    fn program(&self, name: &str) -> Option<ProgramId>;

    /// Make a program current, or release the current one with `None`.
    fn use_program(&self, program: Option<ProgramId>);

    /// Set a named matrix parameter of the current program.
    fn set_matrix(&self, name: &str, value: Mat4);

    /// Point a named sampler parameter of the current program at a unit.
    fn set_sampler(&self, name: &str, unit: u32);

    /// Constant vertex color applied to subsequent draws.
    fn set_vertex_color(&self, color: [f32; 4]);

    // Fixed function state

    fn set_blend(&self, mode: Option<BlendMode>);

    fn set_depth_test(&self, enabled: bool);

    /// Map normalized depth to `[near, far]` of the depth buffer.
    fn set_depth_range(&self, near: f32, far: f32);

    /// Clear the depth buffer.
    fn clear_depth(&self);

    // Drawing

    /// Draw an indexed triangle list.
    fn draw_indexed(&self, vertices: &[QuadVertex], indices: &[u16]);
}
