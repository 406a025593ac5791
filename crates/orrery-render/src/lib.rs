//! Orrery Render
//!
//! Per-frame visibility for the Orrery renderer:
//!
//! - [`Frustum`]: point and sphere classification against the view volume
//! - [`RenderListBuilder`]: frame tree traversal producing render, orbit and
//!   label lists
//! - [`DepthPartitioner`]: depth buffer slicing for scenes spanning many
//!   orders of magnitude
//! - [`AnnotationSet`]: foreground, background and depth sorted overlays
//! - [`WgpuDevice`]: a wgpu backed [`GraphicsDevice`]
//!
//! # Example
//!
//! ```
//! use orrery_render::*;
//! use glam::{DQuat, DVec3};
//!
//! let mut scene = StaticScene::new();
//! let sun = scene.add_star(StarRecord::new("Sol", 696_000.0, 4.83), DVec3::ZERO);
//!
//! let observer = Observer::new(DVec3::new(0.0, 0.0, 1.0e8), DQuat::IDENTITY, 0.0);
//! let view = ViewParams::new(45f64.to_radians(), 800, 600);
//! let settings = RenderSettings::default();
//!
//! let builder = RenderListBuilder::new(&settings, &observer, &view);
//! let mut lists = builder.build(&scene);
//! remove_invisible_items(&mut lists.entries, builder.frustum());
//! let partitions = DepthPartitioner::default().partition(&lists.entries);
//!
//! assert_eq!(lists.entries[0].renderable, Renderable::Star(sun));
//! assert_eq!(partitions.partition_of(0), Some(0));
//! ```

pub mod annotation;
pub mod camera;
pub mod color;
pub mod context;
pub mod depth;
pub mod flags;
pub mod frustum;
pub mod render_list;
pub mod scene;
pub mod settings;
pub mod wgpu_device;

pub use annotation::*;
pub use camera::*;
pub use color::Color;
pub use context::*;
pub use depth::*;
pub use flags::*;
pub use frustum::*;
pub use render_list::*;
pub use scene::*;
pub use settings::*;
pub use wgpu_device::WgpuDevice;

// Re-export the device seam so downstream crates need only this crate.
pub use orrery_test_utils::{
    BlendMode, DeviceError, GraphicsDevice, ProgramId, QuadVertex, TextureDesc, TextureFormat,
    TextureId, TextureRegion,
};
#[cfg(feature = "mock")]
pub use orrery_test_utils::{DeviceCall, MockDevice};
