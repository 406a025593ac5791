//! Orrery Text
//!
//! Text rendering for labels and the screen overlay:
//!
//! - [`FontLibrary`]: process wide rasterizer state
//! - [`FontFace`] and [`FontDatabase`]: scalable font loading
//! - [`GlyphAtlas`]: glyphs packed into one texture, grown on demand
//! - [`TextureFont`]: batched glyph quads drawn through a [`GraphicsDevice`]
//! - [`TextLayoutEngine`] and [`Overlay`]: cursor tracking and a UTF-8
//!   text stream in window coordinates
//!
//! [`GraphicsDevice`]: orrery_render::GraphicsDevice
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use orrery_render::MockDevice;
//! use orrery_text::{MockRasterizer, TextureFont};
//!
//! let device = Arc::new(MockDevice::new());
//! let mut font = TextureFont::new(Box::new(MockRasterizer::new()), device.clone()).unwrap();
//!
//! font.bind();
//! let end = font.render_str("Sol", 0.0, 0.0);
//! font.unbind();
//!
//! assert_eq!(end, font.width("Sol") as f32);
//! assert_eq!(device.count_draws(), 1);
//! ```

pub mod atlas;
pub mod error;
pub mod font;
pub mod layout;
pub mod library;
pub mod mock_rasterizer;
pub mod overlay;
pub mod texture_font;
pub mod utf8;

pub use atlas::*;
pub use error::*;
pub use font::*;
pub use layout::*;
pub use library::FontLibrary;
pub use mock_rasterizer::MockRasterizer;
pub use overlay::Overlay;
pub use texture_font::*;
pub use utf8::Utf8StreamDecoder;
