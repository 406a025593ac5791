//! wgpu implementation of [`GraphicsDevice`].
//!
//! Immediate-mode calls are recorded into a command list during the frame
//! and replayed by [`WgpuDevice::submit`] into one render pass per depth
//! clear.

use crate::context::GpuContext;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use orrery_core::profiling::profile_function;
use orrery_test_utils::{
    BlendMode, DeviceError, GraphicsDevice, ProgramId, QuadVertex, TextureDesc, TextureFormat,
    TextureId, TextureRegion,
};
use parking_lot::Mutex;
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Programs understood by the overlay shader.
const PROGRAMS: &[&str] = &["text", "sprite"];

/// Matrix parameter the overlay shader reads.
pub const MVP_MATRIX_PARAM: &str = "MVPMatrix";

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

const SHADER: &str = include_str!("../shaders/overlay.wgsl");

// wgpu rejects zero sized buffers.
const EMPTY_VERTICES: [QuadVertex; 1] = [QuadVertex::new(0.0, 0.0, 0.0, 0.0)];
const EMPTY_INDICES: [u16; 2] = [0, 0];

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DrawUniform {
    mvp: [[f32; 4]; 4],
    color: [f32; 4],
    mode: u32,
    _pad: [u32; 3],
}

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    format: TextureFormat,
    width: u32,
    height: u32,
}

/// Texture storage indexed by [`TextureId`]. Ids of destroyed textures are
/// handed out again.
struct Slots<T> {
    items: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> Slots<T> {
    fn insert(&mut self, item: T) -> u32 {
        match self.free.pop() {
            Some(index) => {
                self.items[index as usize] = Some(item);
                index
            }
            None => {
                self.items.push(Some(item));
                (self.items.len() - 1) as u32
            }
        }
    }

    fn remove(&mut self, index: u32) -> Option<T> {
        let item = self.items.get_mut(index as usize)?.take();
        if item.is_some() {
            self.free.push(index);
        }
        item
    }

    fn get(&self, index: u32) -> Option<&T> {
        self.items.get(index as usize)?.as_ref()
    }
}

#[derive(Debug, Clone)]
enum Command {
    ClearDepth,
    Draw {
        /// Captured when recorded; the texture may be destroyed before the
        /// frame is submitted.
        bind_group: Option<wgpu::BindGroup>,
        uniform: DrawUniform,
        blend: Option<BlendMode>,
        depth_test: bool,
        depth_range: (f32, f32),
        base_vertex: i32,
        first_index: u32,
        index_count: u32,
    },
}

struct State {
    textures: Slots<GpuTexture>,
    bound: Option<TextureId>,
    program: Option<ProgramId>,
    mvp: Mat4,
    color: [f32; 4],
    blend: Option<BlendMode>,
    depth_test: bool,
    depth_range: (f32, f32),
    vertices: Vec<QuadVertex>,
    indices: Vec<u16>,
    commands: Vec<Command>,
}

/// A [`GraphicsDevice`] backed by wgpu.
pub struct WgpuDevice {
    context: Arc<GpuContext>,
    pipelines: Vec<wgpu::RenderPipeline>,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: wgpu::BindGroup,
    state: Mutex<State>,
}

fn pipeline_index(blend: Option<BlendMode>, depth_test: bool) -> usize {
    let b = match blend {
        None => 0,
        Some(BlendMode::Alpha) => 1,
        Some(BlendMode::Additive) => 2,
    };
    b * 2 + depth_test as usize
}

fn blend_state(blend: Option<BlendMode>) -> Option<wgpu::BlendState> {
    match blend {
        None => None,
        Some(BlendMode::Alpha) => Some(wgpu::BlendState::ALPHA_BLENDING),
        Some(BlendMode::Additive) => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        }),
    }
}

fn wgpu_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Alpha8 => wgpu::TextureFormat::R8Unorm,
        TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
    }
}

impl WgpuDevice {
    /// Create a device drawing into targets of `target_format`.
    pub fn new(context: Arc<GpuContext>, target_format: wgpu::TextureFormat) -> Self {
        let device = context.device();

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Overlay Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<DrawUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Overlay Texture Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Overlay Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let mut pipelines = Vec::with_capacity(6);
        for blend in [None, Some(BlendMode::Alpha), Some(BlendMode::Additive)] {
            for depth_test in [false, true] {
                debug_assert_eq!(pipelines.len(), pipeline_index(blend, depth_test));
                pipelines.push(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("Overlay Pipeline"),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_main"),
                        buffers: &[wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<QuadVertex>() as u64,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &[
                                wgpu::VertexAttribute {
                                    format: wgpu::VertexFormat::Float32x2,
                                    offset: 0,
                                    shader_location: 0,
                                },
                                wgpu::VertexAttribute {
                                    format: wgpu::VertexFormat::Float32x2,
                                    offset: 8,
                                    shader_location: 1,
                                },
                            ],
                        }],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some("fs_main"),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: target_format,
                            blend: blend_state(blend),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        cull_mode: None,
                        ..Default::default()
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DEPTH_FORMAT,
                        depth_write_enabled: depth_test,
                        depth_compare: if depth_test {
                            wgpu::CompareFunction::Less
                        } else {
                            wgpu::CompareFunction::Always
                        },
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                }));
            }
        }

        let white_texture = device.create_texture_with_data(
            context.queue(),
            &wgpu::TextureDescriptor {
                label: Some("Overlay White Texture"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &[255, 255, 255, 255],
        );
        let white = Self::texture_bind_group(device, &texture_layout, &sampler, &white_texture);

        Self {
            context,
            pipelines,
            uniform_layout,
            texture_layout,
            sampler,
            white,
            state: Mutex::new(State {
                textures: Slots::default(),
                bound: None,
                program: None,
                mvp: Mat4::IDENTITY,
                color: [1.0; 4],
                blend: None,
                depth_test: false,
                depth_range: (0.0, 1.0),
                vertices: Vec::new(),
                indices: Vec::new(),
                commands: Vec::new(),
            }),
        }
    }

    fn texture_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        texture: &wgpu::Texture,
    ) -> wgpu::BindGroup {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Overlay Texture Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// Depth attachment matching the pipelines of this device.
    pub fn create_depth_view(&self, width: u32, height: u32) -> wgpu::TextureView {
        self.context
            .device()
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("Orrery Depth"),
                size: wgpu::Extent3d {
                    width: width.max(1),
                    height: height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Number of commands recorded since the last submit.
    pub fn pending_commands(&self) -> usize {
        self.state.lock().commands.len()
    }

    /// Replay everything recorded this frame into `target`.
    ///
    /// Each depth clear starts a new render pass. The color target is loaded,
    /// never cleared.
    pub fn submit(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        profile_function!();

        let mut state = self.state.lock();
        let commands = std::mem::take(&mut state.commands);
        let vertices = std::mem::take(&mut state.vertices);
        let indices = std::mem::take(&mut state.indices);
        drop(state);
        if commands.is_empty() {
            return;
        }

        let device = self.context.device();
        let align = self.context.min_uniform_alignment();
        let stride = std::mem::size_of::<DrawUniform>().div_ceil(align) * align;

        let draws: Vec<&DrawUniform> = commands
            .iter()
            .filter_map(|c| match c {
                Command::Draw { uniform, .. } => Some(uniform),
                Command::ClearDepth => None,
            })
            .collect();
        let mut uniform_bytes = vec![0u8; stride * draws.len().max(1)];
        for (i, uniform) in draws.iter().enumerate() {
            let bytes = bytemuck::bytes_of(*uniform);
            uniform_bytes[i * stride..i * stride + bytes.len()].copy_from_slice(bytes);
        }

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay Uniforms"),
            contents: &uniform_bytes,
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Overlay Uniform Bind Group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniform>() as u64),
                }),
            }],
        });
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay Vertices"),
            contents: bytemuck::cast_slice(if vertices.is_empty() {
                &EMPTY_VERTICES[..]
            } else {
                &vertices
            }),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay Indices"),
            contents: bytemuck::cast_slice(if indices.is_empty() {
                &EMPTY_INDICES[..]
            } else {
                &indices
            }),
            usage: wgpu::BufferUsages::INDEX,
        });

        let mut draw_index = 0usize;
        for segment in commands.split(|c| matches!(c, Command::ClearDepth)) {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Orrery Depth Partition"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);

            for command in segment {
                let &Command::Draw {
                    ref bind_group,
                    blend,
                    depth_test,
                    depth_range,
                    base_vertex,
                    first_index,
                    index_count,
                    ..
                } = command
                else {
                    continue;
                };
                let bind_group = bind_group.as_ref().unwrap_or(&self.white);

                pass.set_pipeline(&self.pipelines[pipeline_index(blend, depth_test)]);
                pass.set_viewport(
                    0.0,
                    0.0,
                    width as f32,
                    height as f32,
                    depth_range.0,
                    depth_range.1,
                );
                pass.set_bind_group(0, &uniform_bind_group, &[(draw_index * stride) as u32]);
                pass.set_bind_group(1, bind_group, &[]);
                pass.draw_indexed(first_index..first_index + index_count, base_vertex, 0..1);
                draw_index += 1;
            }
        }
    }
}

impl GraphicsDevice for WgpuDevice {
    fn max_texture_size(&self) -> u32 {
        self.context.max_texture_size()
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<TextureId, DeviceError> {
        let max = self.max_texture_size();
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(DeviceError::TextureTooLarge {
                width: desc.width,
                height: desc.height,
                max,
            });
        }

        let device = self.context.device();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: desc.label.as_deref(),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu_format(desc.format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let bind_group =
            Self::texture_bind_group(device, &self.texture_layout, &self.sampler, &texture);

        let mut state = self.state.lock();
        let id = state.textures.insert(GpuTexture {
            texture,
            bind_group,
            format: desc.format,
            width: desc.width,
            height: desc.height,
        });
        Ok(TextureId(id))
    }

    fn write_texture(
        &self,
        texture: TextureId,
        region: TextureRegion,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        let state = self.state.lock();
        let tex = state
            .textures
            .get(texture.0)
            .ok_or(DeviceError::UnknownTexture(texture))?;

        let bytes_per_row = region.width * tex.format.bytes_per_pixel();
        if region.x + region.width > tex.width
            || region.y + region.height > tex.height
            || data.len() < (bytes_per_row * region.height) as usize
        {
            return Err(DeviceError::InvalidRegion(region));
        }

        self.context.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &tex.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: region.x,
                    y: region.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(region.height),
            },
            wgpu::Extent3d {
                width: region.width,
                height: region.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn destroy_texture(&self, texture: TextureId) {
        let mut state = self.state.lock();
        state.textures.remove(texture.0);
        if state.bound == Some(texture) {
            state.bound = None;
        }
    }

    fn bind_texture(&self, unit: u32, texture: Option<TextureId>) {
        if unit == 0 {
            self.state.lock().bound = texture;
        } else {
            tracing::trace!("Ignoring bind to texture unit {}", unit);
        }
    }

    fn program(&self, name: &str) -> Option<ProgramId> {
        PROGRAMS
            .iter()
            .position(|p| *p == name)
            .map(|i| ProgramId(i as u32))
    }

    fn use_program(&self, program: Option<ProgramId>) {
        self.state.lock().program = program;
    }

    fn set_matrix(&self, name: &str, value: Mat4) {
        if name == MVP_MATRIX_PARAM {
            self.state.lock().mvp = value;
        }
    }

    fn set_sampler(&self, _name: &str, unit: u32) {
        if unit != 0 {
            tracing::trace!("Overlay shader only samples unit 0");
        }
    }

    fn set_vertex_color(&self, color: [f32; 4]) {
        self.state.lock().color = color;
    }

    fn set_blend(&self, mode: Option<BlendMode>) {
        self.state.lock().blend = mode;
    }

    fn set_depth_test(&self, enabled: bool) {
        self.state.lock().depth_test = enabled;
    }

    fn set_depth_range(&self, near: f32, far: f32) {
        self.state.lock().depth_range = (near.clamp(0.0, 1.0), far.clamp(0.0, 1.0));
    }

    fn clear_depth(&self) {
        self.state.lock().commands.push(Command::ClearDepth);
    }

    fn draw_indexed(&self, vertices: &[QuadVertex], indices: &[u16]) {
        if vertices.is_empty() || indices.is_empty() {
            return;
        }

        let mut state = self.state.lock();
        if state.program.is_none() {
            tracing::trace!("Draw without a program; skipping");
            return;
        }

        let bound = state.bound.and_then(|id| state.textures.get(id.0));
        let mode = bound.map_or(1, |t| match t.format {
            TextureFormat::Alpha8 => 0,
            TextureFormat::Rgba8 => 1,
        });
        let bind_group = bound.map(|t| t.bind_group.clone());

        let base_vertex = state.vertices.len() as i32;
        let first_index = state.indices.len() as u32;
        state.vertices.extend_from_slice(vertices);
        state.indices.extend_from_slice(indices);

        let command = Command::Draw {
            bind_group,
            uniform: DrawUniform {
                mvp: state.mvp.to_cols_array_2d(),
                color: state.color,
                mode,
                _pad: [0; 3],
            },
            blend: state.blend,
            depth_test: state.depth_test,
            depth_range: state.depth_range,
            base_vertex,
            first_index,
            index_count: indices.len() as u32,
        };
        state.commands.push(command);
    }
}
