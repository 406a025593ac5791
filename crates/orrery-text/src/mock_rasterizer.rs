//! Deterministic [`GlyphRasterizer`] for tests and headless runs.

use crate::font::{FontMetrics, GlyphRasterizer, RasterizedGlyph};
use orrery_core::alloc::HashSet;
use parking_lot::Mutex;
use std::sync::Arc;

/// Produces box glyphs whose size depends only on the code point.
///
/// Printable glyphs are `width x height` boxes filled with the low byte of the
/// code point, where `width` is `5 + code % 4`. The advance is `width + 1`.
/// Spaces have an advance but no bitmap. Code points marked missing fail.
///
/// ```
/// use orrery_text::{GlyphRasterizer, MockRasterizer};
///
/// let mut rasterizer = MockRasterizer::new().with_missing(['é']);
/// assert!(rasterizer.rasterize('é').is_none());
/// assert_eq!(rasterizer.rasterize('A').unwrap().advance_x, 7);
/// ```
#[derive(Clone)]
pub struct MockRasterizer {
    missing: HashSet<char>,
    height: u32,
    metrics: FontMetrics,
    calls: Arc<Mutex<Vec<char>>>,
}

impl MockRasterizer {
    pub fn new() -> Self {
        Self {
            missing: HashSet::default(),
            height: 10,
            metrics: FontMetrics {
                ascent: 9,
                descent: 3,
            },
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make these code points fail to rasterize.
    pub fn with_missing(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.missing.extend(chars);
        self
    }

    pub fn with_glyph_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn with_metrics(mut self, ascent: i32, descent: i32) -> Self {
        self.metrics = FontMetrics { ascent, descent };
        self
    }

    /// Shared log of every code point passed to `rasterize`, kept alive across
    /// clones so tests can inspect a rasterizer after handing it off.
    pub fn call_log(&self) -> Arc<Mutex<Vec<char>>> {
        self.calls.clone()
    }

    /// Width of the bitmap produced for `ch`.
    pub fn glyph_width(ch: char) -> u32 {
        5 + (ch as u32 % 4)
    }
}

impl Default for MockRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphRasterizer for MockRasterizer {
    fn rasterize(&mut self, ch: char) -> Option<RasterizedGlyph> {
        self.calls.lock().push(ch);
        if self.missing.contains(&ch) {
            return None;
        }
        if ch.is_whitespace() {
            return Some(RasterizedGlyph {
                advance_x: 4,
                ..Default::default()
            });
        }

        let width = Self::glyph_width(ch);
        Some(RasterizedGlyph {
            advance_x: width as i32 + 1,
            advance_y: 0,
            width,
            height: self.height,
            left: 0,
            top: self.height as i32 - self.metrics.descent,
            coverage: vec![(ch as u32 & 0xff) as u8; (width * self.height) as usize],
        })
    }

    fn metrics(&self) -> FontMetrics {
        self.metrics
    }
}
