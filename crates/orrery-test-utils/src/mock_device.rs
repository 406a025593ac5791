//! Mock implementation of [`GraphicsDevice`] for testing.
//!
//! Records every call and keeps a CPU copy of texture contents so tests can
//! check both what was submitted and what ended up in an atlas.

use crate::device::*;
use glam::Mat4;
use parking_lot::Mutex;

/// Records a device call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateTexture {
        id: TextureId,
        width: u32,
        height: u32,
        format: TextureFormat,
    },
    WriteTexture {
        id: TextureId,
        region: TextureRegion,
    },
    DestroyTexture(TextureId),
    BindTexture {
        unit: u32,
        texture: Option<TextureId>,
    },
    UseProgram(Option<ProgramId>),
    SetMatrix {
        name: String,
        value: Mat4,
    },
    SetSampler {
        name: String,
        unit: u32,
    },
    SetVertexColor([f32; 4]),
    SetBlend(Option<BlendMode>),
    SetDepthTest(bool),
    SetDepthRange {
        near: f32,
        far: f32,
    },
    ClearDepth,
    DrawIndexed {
        vertices: Vec<QuadVertex>,
        indices: Vec<u16>,
    },
}

/// CPU side copy of a mock texture.
#[derive(Debug, Clone)]
pub struct MockTexture {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
struct BindState {
    textures: Vec<(u32, TextureId)>,
    program: Option<ProgramId>,
}

/// Mock graphics device.
///
/// Uses `parking_lot::Mutex` for interior mutability so it satisfies the
/// `Send + Sync` bound of [`GraphicsDevice`].
///
/// A program named `"text"` is registered by default; more can be added with
/// [`MockDevice::with_program`].
///
/// # Example
///
/// ```rust
/// use orrery_test_utils::{GraphicsDevice, MockDevice};
///
/// let device = MockDevice::new().with_max_texture_size(256);
/// assert_eq!(device.max_texture_size(), 256);
///
/// device.clear_depth();
/// assert_eq!(device.count_depth_clears(), 1);
/// ```
pub struct MockDevice {
    calls: Mutex<Vec<DeviceCall>>,
    textures: Mutex<Vec<Option<MockTexture>>>,
    programs: Vec<String>,
    state: Mutex<BindState>,
    max_texture_size: u32,
}

impl MockDevice {
    /// Create a new mock device with a 2048 texel texture limit.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            textures: Mutex::new(Vec::new()),
            programs: vec!["text".to_string()],
            state: Mutex::new(BindState::default()),
            max_texture_size: 2048,
        }
    }

    pub fn with_max_texture_size(mut self, size: u32) -> Self {
        self.max_texture_size = size;
        self
    }

    pub fn with_program(mut self, name: impl Into<String>) -> Self {
        self.programs.push(name.into());
        self
    }

    /// Get a copy of all recorded calls.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().clone()
    }

    /// Forget recorded calls. Texture contents and bindings are kept.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn count(&self, pred: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| pred(call)).count()
    }

    pub fn count_draws(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::DrawIndexed { .. }))
    }

    pub fn count_texture_creates(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::CreateTexture { .. }))
    }

    pub fn count_texture_writes(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::WriteTexture { .. }))
    }

    pub fn count_depth_clears(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::ClearDepth))
    }

    /// All indexed draws in submission order.
    pub fn draws(&self) -> Vec<(Vec<QuadVertex>, Vec<u16>)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                DeviceCall::DrawIndexed { vertices, indices } => {
                    Some((vertices.clone(), indices.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// The most recent value set for a named matrix.
    pub fn last_matrix(&self, name: &str) -> Option<Mat4> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            DeviceCall::SetMatrix { name: n, value } if n == name => Some(*value),
            _ => None,
        })
    }

    pub fn texture(&self, id: TextureId) -> Option<MockTexture> {
        self.textures
            .lock()
            .get(id.0 as usize)
            .and_then(|slot| slot.clone())
    }

    pub fn live_textures(&self) -> usize {
        self.textures.lock().iter().filter(|t| t.is_some()).count()
    }

    pub fn bound_texture(&self, unit: u32) -> Option<TextureId> {
        self.state
            .lock()
            .textures
            .iter()
            .find(|(u, _)| *u == unit)
            .map(|(_, id)| *id)
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.state.lock().program
    }

    fn record(&self, call: DeviceCall) {
        self.calls.lock().push(call);
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockDevice {
    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<TextureId, DeviceError> {
        if desc.width > self.max_texture_size || desc.height > self.max_texture_size {
            return Err(DeviceError::TextureTooLarge {
                width: desc.width,
                height: desc.height,
                max: self.max_texture_size,
            });
        }

        let mut textures = self.textures.lock();
        let id = TextureId(textures.len() as u32);
        let len = (desc.width * desc.height * desc.format.bytes_per_pixel()) as usize;
        textures.push(Some(MockTexture {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            data: vec![0; len],
        }));
        drop(textures);

        self.record(DeviceCall::CreateTexture {
            id,
            width: desc.width,
            height: desc.height,
            format: desc.format,
        });
        Ok(id)
    }

    fn write_texture(
        &self,
        texture: TextureId,
        region: TextureRegion,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        let mut textures = self.textures.lock();
        let tex = textures
            .get_mut(texture.0 as usize)
            .and_then(|slot| slot.as_mut())
            .ok_or(DeviceError::UnknownTexture(texture))?;

        let bpp = tex.format.bytes_per_pixel() as usize;
        let row = region.width as usize * bpp;
        if region.x + region.width > tex.width
            || region.y + region.height > tex.height
            || data.len() < row * region.height as usize
        {
            return Err(DeviceError::InvalidRegion(region));
        }

        for r in 0..region.height as usize {
            let dst = ((region.y as usize + r) * tex.width as usize + region.x as usize) * bpp;
            tex.data[dst..dst + row].copy_from_slice(&data[r * row..(r + 1) * row]);
        }
        drop(textures);

        self.record(DeviceCall::WriteTexture {
            id: texture,
            region,
        });
        Ok(())
    }

    fn destroy_texture(&self, texture: TextureId) {
        if let Some(slot) = self.textures.lock().get_mut(texture.0 as usize) {
            *slot = None;
        }
        self.state.lock().textures.retain(|(_, id)| *id != texture);
        self.record(DeviceCall::DestroyTexture(texture));
    }

    fn bind_texture(&self, unit: u32, texture: Option<TextureId>) {
        {
            let mut state = self.state.lock();
            state.textures.retain(|(u, _)| *u != unit);
            if let Some(id) = texture {
                state.textures.push((unit, id));
            }
        }
        self.record(DeviceCall::BindTexture { unit, texture });
    }

    fn program(&self, name: &str) -> Option<ProgramId> {
        self.programs
            .iter()
            .position(|p| p == name)
            .map(|i| ProgramId(i as u32))
    }

    fn use_program(&self, program: Option<ProgramId>) {
        self.state.lock().program = program;
        self.record(DeviceCall::UseProgram(program));
    }

    fn set_matrix(&self, name: &str, value: Mat4) {
        self.record(DeviceCall::SetMatrix {
            name: name.to_string(),
            value,
        });
    }

    fn set_sampler(&self, name: &str, unit: u32) {
        self.record(DeviceCall::SetSampler {
            name: name.to_string(),
            unit,
        });
    }

    fn set_vertex_color(&self, color: [f32; 4]) {
        self.record(DeviceCall::SetVertexColor(color));
    }

    fn set_blend(&self, mode: Option<BlendMode>) {
        self.record(DeviceCall::SetBlend(mode));
    }

    fn set_depth_test(&self, enabled: bool) {
        self.record(DeviceCall::SetDepthTest(enabled));
    }

    fn set_depth_range(&self, near: f32, far: f32) {
        self.record(DeviceCall::SetDepthRange { near, far });
    }

    fn clear_depth(&self) {
        self.record(DeviceCall::ClearDepth);
    }

    fn draw_indexed(&self, vertices: &[QuadVertex], indices: &[u16]) {
        self.record(DeviceCall::DrawIndexed {
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
        });
    }
}
