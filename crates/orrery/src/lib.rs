//! Orrery - rendering core of a real-time space simulation viewer
//!
//! Orrery turns a scene (stars, planets, moons, orbits) and an observer into
//! draw calls against a [`GraphicsDevice`]:
//!
//! - **Render lists**: frame tree traversal with frustum, size and brightness
//!   culling
//! - **Depth partitions**: view volume slices for scenes spanning light years
//! - **Annotations**: labels and markers, depth sorted between the slices
//! - **Text**: glyph atlas fonts and a screen overlay text stream
//!
//! # Quick Start
//!
//! ```
//! use orrery::prelude::*;
//! use orrery::render::MockDevice;
//! use std::sync::Arc;
//!
//! struct CountingPainter(usize);
//!
//! impl ItemPainter for CountingPainter {
//!     fn draw_entry(&mut self, _entry: &RenderListEntry, _partition: &DepthBufferPartition) {
//!         self.0 += 1;
//!     }
//! }
//!
//! let mut scene = StaticScene::new();
//! scene.add_star(StarRecord::new("Sol", 696_000.0, 4.83), DVec3::ZERO);
//!
//! let device = Arc::new(MockDevice::new());
//! let mut renderer = Renderer::new(device, ViewParams::new(0.8, 800, 600));
//! let observer = Observer::new(DVec3::new(0.0, 0.0, 1.0e8), DQuat::IDENTITY, 0.0);
//!
//! let mut painter = CountingPainter(0);
//! let stats = renderer.render(&scene, &observer, &mut painter, &mut NoMarkers);
//! assert_eq!(stats.entries, 1);
//! assert_eq!(painter.0, 1);
//! ```
//!
//! [`GraphicsDevice`]: orrery_render::GraphicsDevice

pub mod compositor;
pub mod renderer;

pub use orrery_core as core;
pub use orrery_core::math;
pub use orrery_render as render;
pub use orrery_text as text;

pub use compositor::{AnnotationCompositor, LABEL_PIXEL_OFFSET, MarkerPainter, NoMarkers, label_offset};
pub use renderer::{FrameStats, ItemPainter, Renderer};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::compositor::{AnnotationCompositor, MarkerPainter, NoMarkers};
    pub use crate::renderer::{FrameStats, ItemPainter, Renderer};

    pub use glam::{DQuat, DVec3, Mat4, Vec2, Vec3};

    pub use orrery_render::{
        Annotation, AnnotationLayer, AnnotationStyle, BodyClass, BodyRecord, Color,
        DepthBufferPartition, GraphicsDevice, HorizontalAlignment, LabelFlags, Marker,
        MarkerSymbol, Observer, OrbitPathListEntry, RenderFlags, RenderListEntry,
        RenderSettings, StarRecord, StaticScene, VerticalAlignment, ViewParams,
    };

    pub use orrery_text::{FontLibrary, Overlay, SharedFont, TextureFont};
}
