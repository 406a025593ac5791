//! Screen space text overlay.
//!
//! [`Overlay`] is a text sink in window pixels with the origin at the
//! bottom-left corner. It implements [`std::fmt::Write`] for formatted text
//! and [`std::io::Write`] for raw UTF-8 bytes.
//!
//! ```
//! use std::fmt::Write;
//! use std::sync::Arc;
//! use orrery_render::{Color, MockDevice};
//! use orrery_text::{MockRasterizer, Overlay, TextureFont};
//!
//! let device = Arc::new(MockDevice::new());
//! let font = TextureFont::new(Box::new(MockRasterizer::new()), device.clone())
//!     .unwrap()
//!     .into_shared();
//!
//! let mut overlay = Overlay::new(device.clone());
//! overlay.set_window_size(800, 600);
//! overlay.begin();
//! overlay.set_font(Some(font));
//! overlay.set_color(Color::WHITE);
//! overlay.move_by(10.0, 580.0);
//! overlay.begin_text();
//! write!(overlay, "{:.1} ly\nSol", 4.2).unwrap();
//! overlay.end_text();
//! overlay.end();
//!
//! assert_eq!(device.count_draws(), 1);
//! ```

use crate::layout::TextLayoutEngine;
use crate::texture_font::SharedFont;
use crate::utf8::Utf8StreamDecoder;
use glam::{Mat4, Vec2};
use orrery_render::{BlendMode, Color, GraphicsDevice};
use std::sync::Arc;

pub struct Overlay {
    device: Arc<dyn GraphicsDevice>,
    layout: TextLayoutEngine,
    decoder: Utf8StreamDecoder,
    font: Option<SharedFont>,
    font_changed: bool,
    use_texture: bool,
    window_width: u32,
    window_height: u32,
    mvp: Mat4,
}

impl Overlay {
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            layout: TextLayoutEngine::new(),
            decoder: Utf8StreamDecoder::new(),
            font: None,
            font_changed: false,
            use_texture: false,
            window_width: 1,
            window_height: 1,
            mvp: Mat4::IDENTITY,
        }
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// Start an overlay frame: pixel projection, alpha blending, cursor at
    /// the origin.
    pub fn begin(&mut self) {
        self.mvp = Mat4::orthographic_rh(
            0.0,
            self.window_width as f32,
            0.0,
            self.window_height as f32,
            -1.0,
            1.0,
        );
        self.device.set_blend(Some(BlendMode::Alpha));
        self.layout.reset();
        self.decoder.reset();
        self.use_texture = false;
    }

    /// Finish the frame, releasing the font and the blend state.
    pub fn end(&mut self) {
        if self.use_texture {
            if let Some(font) = &self.font {
                font.lock().unbind();
            }
            self.use_texture = false;
        }
        self.device.set_blend(None);
    }

    /// Switch fonts. Quads pending on the previous font are flushed.
    pub fn set_font(&mut self, font: Option<SharedFont>) {
        let same = match (&self.font, &font) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }
        if let Some(old) = &self.font {
            old.lock().flush();
        }
        self.font = font;
        self.font_changed = true;
    }

    pub fn font(&self) -> Option<&SharedFont> {
        self.font.as_ref()
    }

    fn bind_font(&mut self) {
        if let Some(font) = &self.font {
            let mut font = font.lock();
            font.bind();
            font.set_mvp_matrix(self.mvp);
            self.use_texture = true;
            self.font_changed = false;
        }
    }

    /// Open a text block at the current position.
    pub fn begin_text(&mut self) {
        self.layout.begin_text();
        self.bind_font();
    }

    /// Close the text block, flush and release the font.
    pub fn end_text(&mut self) {
        self.layout.end_text();
        if let Some(font) = &self.font {
            font.lock().unbind();
        }
        self.use_texture = false;
    }

    pub fn print(&mut self, ch: char) {
        let Some(font) = self.font.clone() else {
            return;
        };
        if !self.use_texture || self.font_changed {
            self.bind_font();
        }
        self.layout.print(ch, &mut *font.lock());
    }

    pub fn print_str(&mut self, s: &str) {
        for ch in s.chars() {
            self.print(ch);
        }
    }

    /// Feed raw UTF-8 bytes. Partial sequences carry over to the next call.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if let Some(ch) = self.decoder.push(byte) {
                self.print(ch);
            }
        }
    }

    /// Set the text color. Queued text keeps the color it was queued with.
    pub fn set_color(&mut self, color: Color) {
        if let Some(font) = &self.font {
            font.lock().flush();
        }
        self.device.set_vertex_color(color.to_array());
    }

    pub fn move_by(&mut self, dx: f32, dy: f32) {
        self.layout.move_by(dx, dy);
    }

    pub fn save_pos(&mut self) {
        self.layout.save_pos();
    }

    pub fn restore_pos(&mut self) {
        self.layout.restore_pos();
    }

    /// Where the next glyph will be drawn.
    pub fn cursor(&self) -> Vec2 {
        self.layout.cursor()
    }

    pub fn layout(&self) -> &TextLayoutEngine {
        &self.layout
    }
}

impl std::fmt::Write for Overlay {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.print_str(s);
        Ok(())
    }
}

impl std::io::Write for Overlay {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.write_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Some(font) = &self.font {
            font.lock().flush();
        }
        Ok(())
    }
}
