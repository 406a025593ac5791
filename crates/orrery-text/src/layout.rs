//! Cursor bookkeeping for overlay text.
//!
//! The engine tracks a global pen position, an offset accumulated while
//! printing, and a stack of saved positions. Text blocks opened with
//! [`TextLayoutEngine::begin_text`] handle line breaks by returning to the
//! block origin and moving down one line.

use crate::texture_font::TextureFont;
use glam::Vec2;

/// Something that can draw a glyph at a pen position.
pub trait GlyphSink {
    /// Draw `ch` with its pen position at `(x, y)`, returning the advance.
    fn render_glyph(&mut self, ch: char, x: f32, y: f32) -> f32;

    /// Distance between baselines, not counting the one pixel gap.
    fn line_height(&self) -> f32;
}

impl GlyphSink for TextureFont {
    fn render_glyph(&mut self, ch: char, x: f32, y: f32) -> f32 {
        self.render_char(ch, x, y)
    }

    fn line_height(&self) -> f32 {
        self.height() as f32
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextLayoutEngine {
    global: Vec2,
    offset: Vec2,
    stack: Vec<Vec2>,
    /// Position at which each open text block began.
    blocks: Vec<Vec2>,
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return to the origin and forget all saved state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Open a text block at the current position.
    pub fn begin_text(&mut self) {
        self.save_pos();
        self.blocks.push(self.global);
    }

    /// Close the innermost text block and return to where it began.
    pub fn end_text(&mut self) {
        if let Some(origin) = self.blocks.pop() {
            self.restore_pos();
            self.global = origin;
        }
    }

    pub fn save_pos(&mut self) {
        self.stack.push(self.global);
    }

    /// Pop the last saved position. The print offset is cleared even when
    /// nothing was saved.
    pub fn restore_pos(&mut self) {
        if let Some(pos) = self.stack.pop() {
            self.global = pos;
        }
        self.offset = Vec2::ZERO;
    }

    pub fn move_by(&mut self, dx: f32, dy: f32) {
        self.global += Vec2::new(dx, dy);
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.global = Vec2::new(x, y);
    }

    /// Global pen position, excluding the print offset.
    pub fn position(&self) -> Vec2 {
        self.global
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Where the next glyph will be drawn.
    pub fn cursor(&self) -> Vec2 {
        self.global + self.offset
    }

    /// Depth of nested text blocks.
    pub fn block_depth(&self) -> usize {
        self.blocks.len()
    }

    pub fn print(&mut self, ch: char, sink: &mut dyn GlyphSink) {
        if ch == '\n' {
            if !self.blocks.is_empty() {
                self.restore_pos();
                self.global.y -= 1.0 + sink.line_height();
                self.save_pos();
            }
            return;
        }

        let pen = self.cursor();
        self.offset.x += sink.render_glyph(ch, pen.x, pen.y);
    }

    pub fn print_str(&mut self, s: &str, sink: &mut dyn GlyphSink) {
        for ch in s.chars() {
            self.print(ch, sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records pen positions; every glyph advances 8 pixels.
    #[derive(Default)]
    struct Recorder {
        drawn: Vec<(char, f32, f32)>,
    }

    impl GlyphSink for Recorder {
        fn render_glyph(&mut self, ch: char, x: f32, y: f32) -> f32 {
            self.drawn.push((ch, x, y));
            8.0
        }

        fn line_height(&self) -> f32 {
            12.0
        }
    }

    #[test]
    fn test_newline_in_block() {
        let mut engine = TextLayoutEngine::new();
        let mut sink = Recorder::default();
        engine.set_position(10.0, 10.0);
        engine.begin_text();
        engine.print_str("A\nB", &mut sink);
        engine.end_text();

        assert_eq!(sink.drawn, vec![('A', 10.0, 10.0), ('B', 10.0, -3.0)]);
        assert_eq!(engine.position(), Vec2::new(10.0, 10.0));
        assert_eq!(engine.offset(), Vec2::ZERO);
        assert_eq!(engine.block_depth(), 0);
    }

    #[test]
    fn test_newline_outside_block_ignored() {
        let mut engine = TextLayoutEngine::new();
        let mut sink = Recorder::default();
        engine.print_str("A\nB", &mut sink);
        assert_eq!(sink.drawn, vec![('A', 0.0, 0.0), ('B', 8.0, 0.0)]);
    }

    #[test]
    fn test_restore_clears_offset() {
        let mut engine = TextLayoutEngine::new();
        let mut sink = Recorder::default();
        engine.save_pos();
        engine.move_by(5.0, 7.0);
        engine.print('x', &mut sink);
        assert_eq!(engine.cursor(), Vec2::new(13.0, 7.0));

        engine.restore_pos();
        assert_eq!(engine.cursor(), Vec2::ZERO);

        // Restoring an empty stack still clears the offset.
        engine.print('y', &mut sink);
        engine.restore_pos();
        assert_eq!(engine.offset(), Vec2::ZERO);
    }

    #[test]
    fn test_end_text_without_block() {
        let mut engine = TextLayoutEngine::new();
        engine.move_by(3.0, 4.0);
        engine.end_text();
        assert_eq!(engine.position(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_nested_blocks() {
        let mut engine = TextLayoutEngine::new();
        let mut sink = Recorder::default();
        engine.begin_text();
        engine.move_by(0.0, 100.0);
        engine.begin_text();
        engine.print_str("a\nb", &mut sink);
        engine.end_text();
        assert_eq!(engine.position(), Vec2::new(0.0, 100.0));
        engine.end_text();
        assert_eq!(engine.position(), Vec2::ZERO);
        assert_eq!(sink.drawn[1], ('b', 0.0, 87.0));
    }
}
