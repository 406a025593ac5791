//! Glyph atlas: every loaded glyph of one face packed into a single texture.
//!
//! Common Unicode blocks are rasterized up front. Any other code point is
//! rasterized on first use, after which the whole atlas is repacked and
//! uploaded again. Packing is a pure step ([`AtlasLayout::compute`]) so it can
//! be checked without a device.

use crate::error::{TextError, TextResult};
use crate::font::{FontMetrics, GlyphRasterizer, RasterizedGlyph};
use orrery_core::alloc::{HashMap, HashSet};
use orrery_core::profiling::profile_function;
use orrery_render::{GraphicsDevice, TextureDesc, TextureFormat, TextureId, TextureRegion};
use std::sync::Arc;

/// Metrics and atlas placement of one glyph.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Glyph {
    /// Code point, `'\0'` for the bad glyph.
    pub ch: char,
    pub advance_x: i32,
    pub advance_y: i32,
    /// Bitmap size in pixels.
    pub width: u32,
    pub height: u32,
    /// Bitmap origin relative to the pen position.
    pub left: i32,
    pub top: i32,
    /// Top-left corner of the bitmap in texture coordinates.
    pub tx: f32,
    pub ty: f32,
}

impl Glyph {
    /// Returned when neither a code point nor its fallback can be loaded.
    pub const BAD: Glyph = Glyph {
        ch: '\0',
        advance_x: 0,
        advance_y: 0,
        width: 0,
        height: 0,
        left: 0,
        top: 0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn is_bad(&self) -> bool {
        self.ch == '\0'
    }

    fn from_raster(ch: char, raster: &RasterizedGlyph) -> Self {
        Self {
            ch,
            advance_x: raster.advance_x,
            advance_y: raster.advance_y,
            width: raster.width,
            height: raster.height,
            left: raster.left,
            top: raster.top,
            tx: 0.0,
            ty: 0.0,
        }
    }
}

/// An inclusive range of code points loaded when the atlas is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnicodeBlock {
    pub first: char,
    pub last: char,
}

impl UnicodeBlock {
    pub const BASIC_LATIN: UnicodeBlock = UnicodeBlock {
        first: '\u{20}',
        last: '\u{7e}',
    };

    pub const LOWER_GREEK: UnicodeBlock = UnicodeBlock {
        first: '\u{3b1}',
        last: '\u{3cf}',
    };

    pub const fn new(first: char, last: char) -> Self {
        Self { first, last }
    }

    pub fn len(&self) -> usize {
        (self.last as usize + 1).saturating_sub(self.first as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, ch: char) -> bool {
        ch >= self.first && ch <= self.last
    }

    pub fn chars(&self) -> impl Iterator<Item = char> {
        self.first..=self.last
    }
}

/// Blocks every atlas preloads unless configured otherwise.
pub const COMMON_BLOCKS: [UnicodeBlock; 2] = [UnicodeBlock::BASIC_LATIN, UnicodeBlock::LOWER_GREEK];

/// Atlas configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasConfig {
    /// Blocks rasterized at creation. The atlas sorts and merges them.
    pub blocks: Vec<UnicodeBlock>,
    /// The insertion counter is reset after this many on-demand glyphs.
    pub optimize_interval: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            blocks: COMMON_BLOCKS.to_vec(),
            optimize_interval: 10,
        }
    }
}

impl AtlasConfig {
    pub fn with_blocks(mut self, blocks: impl Into<Vec<UnicodeBlock>>) -> Self {
        self.blocks = normalize_blocks(blocks.into());
        self
    }

    pub fn with_optimize_interval(mut self, interval: u32) -> Self {
        self.optimize_interval = interval.max(1);
        self
    }
}

/// Sort `blocks` by first code point, dropping empty ones and merging
/// overlapping or adjacent ranges. Glyph slots are numbered block by block,
/// so lookups rely on this order.
fn normalize_blocks(mut blocks: Vec<UnicodeBlock>) -> Vec<UnicodeBlock> {
    blocks.retain(|b| !b.is_empty());
    blocks.sort_by_key(|b| b.first);

    let mut merged: Vec<UnicodeBlock> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match merged.last_mut() {
            Some(last) if block.first as u32 <= last.last as u32 + 1 => {
                last.last = last.last.max(block.last);
            }
            _ => merged.push(block),
        }
    }
    merged
}

/// Texture size and glyph offsets for one atlas build.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AtlasLayout {
    pub width: u32,
    pub height: u32,
    /// Top-left texel of each glyph, `None` for bad glyphs.
    pub offsets: Vec<Option<(u32, u32)>>,
}

impl AtlasLayout {
    /// Shelf-pack `glyphs` for a device whose textures may be at most
    /// `max_size` texels wide.
    ///
    /// Glyphs go left to right with one texel of padding; a new row starts
    /// when the running row width would reach `max_size`. The texture is as
    /// wide as the widest row and as tall as the rows stacked.
    pub fn compute(glyphs: &[Glyph], max_size: u32) -> TextResult<Self> {
        let mut row_width = 0u32;
        let mut row_height = 0u32;
        let mut width = 0u32;
        let mut height = 0u32;

        for glyph in glyphs.iter().filter(|g| !g.is_bad()) {
            if glyph.width + 1 >= max_size {
                return Err(TextError::AtlasFull {
                    requested_width: glyph.width,
                    requested_height: glyph.height,
                    atlas_width: max_size,
                    atlas_height: max_size,
                });
            }
            if row_width + glyph.width + 1 >= max_size {
                width = width.max(row_width);
                height += row_height;
                row_width = 0;
                row_height = 0;
            }
            row_width += glyph.width + 1;
            row_height = row_height.max(glyph.height);
        }
        width = width.max(row_width);
        height += row_height;

        // Paste pass: wrap when the glyph would cross the right edge.
        let mut offsets = Vec::with_capacity(glyphs.len());
        let (mut ox, mut oy, mut row_height) = (0u32, 0u32, 0u32);
        for glyph in glyphs {
            if glyph.is_bad() {
                offsets.push(None);
                continue;
            }
            if ox + glyph.width > width {
                oy += row_height;
                row_height = 0;
                ox = 0;
            }
            offsets.push(Some((ox, oy)));
            row_height = row_height.max(glyph.height);
            ox += glyph.width + 1;
        }
        let height = height.max(oy + row_height);

        if height > max_size {
            return Err(TextError::AtlasFull {
                requested_width: width,
                requested_height: height,
                atlas_width: max_size,
                atlas_height: max_size,
            });
        }

        Ok(Self {
            width,
            height,
            offsets,
        })
    }

    /// Texture coordinates of the glyph at `index`.
    pub fn tex_coords(&self, index: usize) -> Option<(f32, f32)> {
        let (x, y) = self.offsets.get(index).copied().flatten()?;
        Some((
            x as f32 / self.width.max(1) as f32,
            y as f32 / self.height.max(1) as f32,
        ))
    }
}

/// All glyphs of one face packed into a texture.
pub struct GlyphAtlas {
    device: Arc<dyn GraphicsDevice>,
    rasterizer: Box<dyn GlyphRasterizer>,
    config: AtlasConfig,
    glyphs: Vec<Glyph>,
    coverage: Vec<Vec<u8>>,
    /// Number of glyphs covered by the preloaded blocks.
    common_count: usize,
    /// On-demand glyphs by code point.
    extra: HashMap<char, usize>,
    failed: HashSet<char>,
    inserted: u32,
    texture: Option<TextureId>,
    width: u32,
    height: u32,
    rebuilds: u64,
}

impl GlyphAtlas {
    /// Rasterize the configured blocks and build the first texture.
    ///
    /// Code points in the blocks that fail to rasterize keep a bad-glyph
    /// slot. Fails if the packed glyphs exceed the device texture limit.
    pub fn new(
        rasterizer: Box<dyn GlyphRasterizer>,
        device: Arc<dyn GraphicsDevice>,
        config: AtlasConfig,
    ) -> TextResult<Self> {
        let config = AtlasConfig {
            blocks: normalize_blocks(config.blocks),
            ..config
        };
        let mut atlas = Self {
            device,
            rasterizer,
            config,
            glyphs: Vec::new(),
            coverage: Vec::new(),
            common_count: 0,
            extra: HashMap::new(),
            failed: HashSet::new(),
            inserted: 0,
            texture: None,
            width: 0,
            height: 0,
            rebuilds: 0,
        };
        atlas.load_common_glyphs();
        atlas.rebuild()?;
        Ok(atlas)
    }

    fn load_common_glyphs(&mut self) {
        let blocks = self.config.blocks.clone();
        let total: usize = blocks.iter().map(UnicodeBlock::len).sum();
        self.glyphs.reserve(total);
        self.coverage.reserve(total);

        for ch in blocks.iter().flat_map(UnicodeBlock::chars) {
            match self.rasterizer.rasterize(ch) {
                Some(raster) => {
                    self.glyphs.push(Glyph::from_raster(ch, &raster));
                    self.coverage.push(raster.coverage);
                }
                None => {
                    tracing::warn!("Loading character {:#x} failed", ch as u32);
                    self.glyphs.push(Glyph::BAD);
                    self.coverage.push(Vec::new());
                }
            }
        }
        self.common_count = self.glyphs.len();
    }

    /// Repack every glyph and upload a fresh texture.
    pub fn rebuild(&mut self) -> TextResult<()> {
        profile_function!();

        let layout = AtlasLayout::compute(&self.glyphs, self.device.max_texture_size())?;
        let width = layout.width.max(1);
        let height = layout.height.max(1);

        let mut pixels = vec![0u8; (width * height) as usize];
        for (i, glyph) in self.glyphs.iter().enumerate() {
            let Some((ox, oy)) = layout.offsets[i] else {
                continue;
            };
            let bitmap = &self.coverage[i];
            let w = glyph.width as usize;
            if bitmap.len() < w * glyph.height as usize {
                tracing::warn!("Short bitmap for glyph {:?}, leaving it blank", glyph.ch);
                continue;
            }
            for row in 0..glyph.height as usize {
                let src = &bitmap[row * w..(row + 1) * w];
                let dst = (oy as usize + row) * width as usize + ox as usize;
                pixels[dst..dst + w].copy_from_slice(src);
            }
        }

        let texture = self.device.create_texture(
            &TextureDesc::new(width, height, TextureFormat::Alpha8).with_label("Glyph Atlas"),
        )?;
        if let Err(err) = self
            .device
            .write_texture(texture, TextureRegion::full(width, height), &pixels)
        {
            self.device.destroy_texture(texture);
            return Err(err.into());
        }
        if let Some(old) = self.texture.replace(texture) {
            self.device.destroy_texture(old);
        }

        for (i, glyph) in self.glyphs.iter_mut().enumerate() {
            if let Some((tx, ty)) = layout.tex_coords(i) {
                glyph.tx = tx;
                glyph.ty = ty;
            }
        }
        self.width = width;
        self.height = height;
        self.rebuilds += 1;

        tracing::debug!(
            "Generated a {}x{} glyph atlas with {} glyphs",
            width,
            height,
            self.glyphs.len()
        );
        Ok(())
    }

    /// Index of an already loaded glyph.
    fn position(&self, ch: char) -> Option<usize> {
        let mut pos = 0;
        for block in &self.config.blocks {
            if ch < block.first {
                break;
            }
            if ch <= block.last {
                return Some(pos + (ch as usize - block.first as usize));
            }
            pos += block.len();
        }
        self.extra.get(&ch).copied()
    }

    /// Whether `ch` is loaded or known to be unavailable, i.e. looking it up
    /// will not touch the device.
    pub fn contains(&self, ch: char) -> bool {
        self.position(ch).is_some() || self.failed.contains(&ch)
    }

    /// Look up `ch`, loading it on a miss. Bad glyphs are returned as is.
    fn lookup(&mut self, ch: char) -> Glyph {
        if let Some(pos) = self.position(ch) {
            return self.glyphs[pos];
        }
        if self.failed.contains(&ch) {
            return Glyph::BAD;
        }

        let Some(raster) = self.rasterizer.rasterize(ch) else {
            tracing::warn!("No glyph for {:?} ({:#x})", ch, ch as u32);
            self.failed.insert(ch);
            return Glyph::BAD;
        };

        self.glyphs.push(Glyph::from_raster(ch, &raster));
        self.coverage.push(raster.coverage);
        self.inserted += 1;
        if self.inserted >= self.config.optimize_interval {
            self.optimize();
        }

        if let Err(err) = self.rebuild() {
            tracing::warn!("Dropping glyph {:?}: {}", ch, err);
            self.glyphs.pop();
            self.coverage.pop();
            self.failed.insert(ch);
            return Glyph::BAD;
        }

        let index = self.glyphs.len() - 1;
        self.extra.insert(ch, index);
        self.glyphs[index]
    }

    /// Glyph for `ch`, else for `fallback`, else [`Glyph::BAD`].
    pub fn glyph(&mut self, ch: char, fallback: char) -> Glyph {
        let glyph = self.lookup(ch);
        if !glyph.is_bad() {
            return glyph;
        }
        self.lookup(fallback)
    }

    fn optimize(&mut self) {
        self.inserted = 0;
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Texture size in texels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Glyph in slot `index`, in load order.
    pub fn glyph_at(&self, index: usize) -> Option<Glyph> {
        self.glyphs.get(index).copied()
    }

    /// Number of glyph slots, including bad ones.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Number of slots reserved for the preloaded blocks.
    pub fn common_count(&self) -> usize {
        self.common_count
    }

    /// On-demand insertions since the counter was last reset.
    pub fn inserted_since_optimize(&self) -> u32 {
        self.inserted
    }

    /// Number of times the texture has been built.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    pub fn metrics(&self) -> FontMetrics {
        self.rasterizer.metrics()
    }

    /// Largest advance among the loaded glyphs.
    pub fn max_advance(&self) -> i32 {
        self.glyphs.iter().map(|g| g.advance_x).max().unwrap_or(0)
    }
}

impl Drop for GlyphAtlas {
    fn drop(&mut self) {
        if let Some(texture) = self.texture.take() {
            self.device.destroy_texture(texture);
        }
    }
}
