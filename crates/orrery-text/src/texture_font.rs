use crate::atlas::{AtlasConfig, Glyph, GlyphAtlas};
use crate::error::TextResult;
use crate::font::{FontFace, FontLoadOptions, FontSpec, GlyphRasterizer};
use crate::library::FontLibrary;
use glam::Mat4;
use orrery_render::{GraphicsDevice, ProgramId, QuadVertex};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// Name of the device program used to draw text.
pub const TEXT_PROGRAM: &str = "text";
/// Sampler parameter bound to the atlas.
pub const ATLAS_SAMPLER: &str = "atlasTex";
/// Matrix parameter holding the model-view-projection transform.
pub const MVP_MATRIX: &str = "MVPMatrix";
/// Drawn in place of code points the face cannot produce.
pub const FALLBACK_CHAR: char = '?';

/// Largest number of vertices one indexed draw can address.
const MAX_BATCH_VERTICES: usize = u16::MAX as usize + 1;

/// A font face rendered through a glyph atlas.
///
/// Glyph quads accumulate in a batch that [`flush`](Self::flush) submits as a
/// single indexed draw.
pub struct TextureFont {
    device: Arc<dyn GraphicsDevice>,
    atlas: GlyphAtlas,
    max_ascent: i32,
    max_descent: i32,
    mvp: Mat4,
    program: Option<ProgramId>,
    shader_in_use: bool,
    vertices: Vec<QuadVertex>,
}

/// A font shared between the overlay and the annotation pass.
pub type SharedFont = Arc<Mutex<TextureFont>>;

impl TextureFont {
    /// Build a font around `rasterizer` with the default atlas blocks.
    pub fn new(
        rasterizer: Box<dyn GlyphRasterizer>,
        device: Arc<dyn GraphicsDevice>,
    ) -> TextResult<Self> {
        Self::with_config(rasterizer, device, AtlasConfig::default())
    }

    pub fn with_config(
        rasterizer: Box<dyn GlyphRasterizer>,
        device: Arc<dyn GraphicsDevice>,
        config: AtlasConfig,
    ) -> TextResult<Self> {
        let metrics = rasterizer.metrics();
        let atlas = GlyphAtlas::new(rasterizer, device.clone(), config)?;
        Ok(Self {
            device,
            atlas,
            max_ascent: metrics.ascent,
            max_descent: metrics.descent,
            mvp: Mat4::IDENTITY,
            program: None,
            shader_in_use: false,
            vertices: Vec::new(),
        })
    }

    /// Load a font file, initializing the font library if needed.
    pub fn load(
        path: impl AsRef<Path>,
        options: FontLoadOptions,
        device: Arc<dyn GraphicsDevice>,
    ) -> TextResult<Self> {
        FontLibrary::init();
        let face = FontFace::load(path, options)?;
        Self::new(Box::new(face), device)
    }

    /// Load a font from a `"path,size"` spec. A non-zero `size` overrides the
    /// size in the spec.
    pub fn load_spec(
        spec: &str,
        size: u32,
        options: FontLoadOptions,
        device: Arc<dyn GraphicsDevice>,
    ) -> TextResult<Self> {
        let parsed = FontSpec::parse(spec);
        let size = if size > 0 { size } else { parsed.size };
        Self::load(parsed.path, options.with_size(size), device)
    }

    pub fn into_shared(self) -> SharedFont {
        Arc::new(Mutex::new(self))
    }

    fn glyph(&mut self, ch: char) -> Glyph {
        if !self.atlas.contains(ch) {
            // Loading a glyph rebuilds the atlas and moves every glyph, so
            // pending quads must go out against the old texture first.
            self.flush();
            let glyph = self.atlas.glyph(ch, FALLBACK_CHAR);
            if self.shader_in_use {
                self.device.bind_texture(0, self.atlas.texture());
            }
            return glyph;
        }
        self.atlas.glyph(ch, FALLBACK_CHAR)
    }

    fn push_quad(&mut self, glyph: &Glyph, x: f32, y: f32) {
        if self.vertices.len() + 4 > MAX_BATCH_VERTICES {
            self.flush();
        }

        let (tex_w, tex_h) = self.atlas.size();
        let x1 = x + glyph.left as f32;
        let y1 = y + glyph.top as f32 - glyph.height as f32;
        let x2 = x1 + glyph.width as f32;
        let y2 = y1 + glyph.height as f32;

        let tx1 = glyph.tx;
        let ty1 = glyph.ty;
        let tx2 = tx1 + glyph.width as f32 / tex_w.max(1) as f32;
        let ty2 = ty1 + glyph.height as f32 / tex_h.max(1) as f32;

        self.vertices.extend_from_slice(&[
            QuadVertex::new(x1, y1, tx1, ty2),
            QuadVertex::new(x2, y1, tx2, ty2),
            QuadVertex::new(x1, y2, tx1, ty1),
            QuadVertex::new(x2, y2, tx2, ty1),
        ]);
    }

    /// Queue `ch` with its pen position at `(x, y)` and return its advance.
    /// Glyphs without pixels add no quad.
    pub fn render_char(&mut self, ch: char, x: f32, y: f32) -> f32 {
        let glyph = self.glyph(ch);
        if glyph.width > 0 && glyph.height > 0 {
            self.push_quad(&glyph, x, y);
        }
        glyph.advance_x as f32
    }

    /// Queue a string starting at `(x, y)` and return the final pen x.
    pub fn render_str(&mut self, s: &str, mut x: f32, mut y: f32) -> f32 {
        if self.atlas.texture().is_none() {
            return 0.0;
        }
        for ch in s.chars() {
            let glyph = self.glyph(ch);
            if glyph.width > 0 && glyph.height > 0 {
                self.push_quad(&glyph, x, y);
            }
            x += glyph.advance_x as f32;
            y += glyph.advance_y as f32;
        }
        x
    }

    /// Submit the pending quads as one indexed draw.
    pub fn flush(&mut self) {
        if self.vertices.len() < 4 {
            return;
        }

        let quads = self.vertices.len() / 4;
        let mut indices = Vec::with_capacity(quads * 6);
        for quad in 0..quads {
            let i = (quad * 4) as u16;
            indices.extend_from_slice(&[i, i + 1, i + 2, i + 1, i + 3, i + 2]);
        }

        self.device.draw_indexed(&self.vertices, &indices);
        self.vertices.clear();
    }

    fn program(&mut self) -> Option<ProgramId> {
        if self.program.is_none() {
            self.program = self.device.program(TEXT_PROGRAM);
            if self.program.is_none() {
                tracing::warn!("Program '{}' not available, text disabled", TEXT_PROGRAM);
            }
        }
        self.program
    }

    /// Activate the atlas texture and the text program and upload the
    /// current transform.
    pub fn bind(&mut self) {
        let Some(program) = self.program() else {
            return;
        };
        let Some(texture) = self.atlas.texture() else {
            return;
        };

        self.device.bind_texture(0, Some(texture));
        self.device.use_program(Some(program));
        self.device.set_sampler(ATLAS_SAMPLER, 0);
        self.shader_in_use = true;
        self.device.set_matrix(MVP_MATRIX, self.mvp);
    }

    /// Replace the transform. Quads queued under the old transform are
    /// flushed first while the program is bound.
    pub fn set_mvp_matrix(&mut self, mvp: Mat4) {
        self.mvp = mvp;
        if self.program().is_some() && self.shader_in_use {
            self.flush();
            self.device.set_matrix(MVP_MATRIX, mvp);
        }
    }

    /// Flush and release the texture and program.
    pub fn unbind(&mut self) {
        self.flush();
        self.shader_in_use = false;
        self.device.bind_texture(0, None);
        self.device.use_program(None);
    }

    pub fn is_bound(&self) -> bool {
        self.shader_in_use
    }

    /// Sum of the advances of `s`, in pixels.
    pub fn width(&mut self, s: &str) -> i32 {
        s.chars().map(|ch| self.glyph(ch).advance_x).sum()
    }

    /// Line height: max ascent plus max descent.
    pub fn height(&self) -> i32 {
        self.max_ascent + self.max_descent
    }

    pub fn max_width(&self) -> i32 {
        self.atlas.max_advance()
    }

    pub fn max_ascent(&self) -> i32 {
        self.max_ascent
    }

    pub fn set_max_ascent(&mut self, ascent: i32) {
        self.max_ascent = ascent;
    }

    pub fn max_descent(&self) -> i32 {
        self.max_descent
    }

    pub fn set_max_descent(&mut self, descent: i32) {
        self.max_descent = descent;
    }

    pub fn advance(&mut self, ch: char) -> i32 {
        self.glyph(ch).advance_x
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    /// Number of vertices waiting for the next flush.
    pub fn pending_vertices(&self) -> usize {
        self.vertices.len()
    }
}
