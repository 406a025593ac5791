use crate::error::{TextError, TextResult};
use crate::library::FontLibrary;
use cosmic_text::fontdb;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use swash::FontRef;
use swash::scale::{Render, Source};
use swash::zeno::Format;

/// Point size used when a font spec carries none.
pub const DEFAULT_POINT_SIZE: u32 = 12;

/// Screen resolution assumed when none is configured.
pub const DEFAULT_DPI: u32 = 96;

/// sfnt versions of TrueType, OpenType and collection files.
const FONT_MAGIC: [[u8; 4]; 4] = [[0, 1, 0, 0], *b"OTTO", *b"true", *b"ttcf"];

/// Convert a point size to pixels at `dpi`. A `dpi` of zero means the size is
/// already in pixels.
pub fn pt_to_px(pt: f32, dpi: u32) -> f32 {
    if dpi == 0 { pt } else { pt / 72.0 * dpi as f32 }
}

/// A font file name with an optional `,size` suffix, e.g. `"sans.ttf,14"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSpec {
    pub path: PathBuf,
    pub size: u32,
}

impl FontSpec {
    pub fn parse(spec: &str) -> Self {
        let Some((path, size)) = spec.rsplit_once(',') else {
            return Self {
                path: PathBuf::from(spec),
                size: DEFAULT_POINT_SIZE,
            };
        };

        let size = match size.trim().parse::<f32>() {
            Ok(size) if size.is_finite() && size > 0.0 => size as u32,
            _ => {
                tracing::warn!("Invalid size in font spec '{}', using {}", spec, DEFAULT_POINT_SIZE);
                DEFAULT_POINT_SIZE
            }
        };
        Self {
            path: PathBuf::from(path),
            size,
        }
    }
}

/// How to load a face from a font file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontLoadOptions {
    /// Face index inside a font collection.
    pub index: usize,
    /// Size in points.
    pub size: u32,
    pub dpi: u32,
}

impl Default for FontLoadOptions {
    fn default() -> Self {
        Self {
            index: 0,
            size: DEFAULT_POINT_SIZE,
            dpi: DEFAULT_DPI,
        }
    }
}

impl FontLoadOptions {
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn pixel_size(&self) -> f32 {
        pt_to_px(self.size as f32, self.dpi)
    }
}

/// Vertical metrics of a face at its loaded size, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontMetrics {
    /// Distance from the baseline to the top of the tallest glyph.
    pub ascent: i32,
    /// Distance from the baseline to the bottom of the lowest glyph, positive.
    pub descent: i32,
}

/// One code point rendered to an 8-bit coverage bitmap.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RasterizedGlyph {
    pub advance_x: i32,
    pub advance_y: i32,
    pub width: u32,
    pub height: u32,
    /// Offset from the pen position to the left edge of the bitmap.
    pub left: i32,
    /// Offset from the baseline up to the top edge of the bitmap.
    pub top: i32,
    /// `width * height` coverage values, top row first.
    pub coverage: Vec<u8>,
}

/// Source of glyph bitmaps for a [`GlyphAtlas`](crate::GlyphAtlas).
pub trait GlyphRasterizer: Send {
    /// Rasterize `ch`, or `None` if the face cannot produce it.
    fn rasterize(&mut self, ch: char) -> Option<RasterizedGlyph>;

    fn metrics(&self) -> FontMetrics;
}

/// A scalable font face loaded at a fixed pixel size.
pub struct FontFace {
    data: Arc<Vec<u8>>,
    index: usize,
    pixel_size: f32,
    metrics: FontMetrics,
    name: String,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("pixel_size", &self.pixel_size)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl FontFace {
    /// Load a face from a font file.
    ///
    /// Fails if the file is missing or unreadable, is not a font, has no
    /// scalable outlines, or the size cannot be applied.
    pub fn load(path: impl AsRef<Path>, options: FontLoadOptions) -> TextResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::error!("Could not open font {}", path.display());
            return Err(TextError::FontFileNotFound(path.to_path_buf()));
        }

        let data = std::fs::read(path).map_err(|e| {
            tracing::error!("Could not read font {}: {}", path.display(), e);
            TextError::FontLoadError(format!("{}: {}", path.display(), e))
        })?;

        Self::from_data_named(Arc::new(data), options, path.display().to_string(), Some(path))
    }

    /// Load a face from font bytes already in memory.
    pub fn from_data(data: Vec<u8>, options: FontLoadOptions) -> TextResult<Self> {
        Self::from_data_named(Arc::new(data), options, "<memory>".to_string(), None)
    }

    fn from_data_named(
        data: Arc<Vec<u8>>,
        options: FontLoadOptions,
        name: String,
        path: Option<&Path>,
    ) -> TextResult<Self> {
        let magic_ok = data
            .get(..4)
            .is_some_and(|magic| FONT_MAGIC.iter().any(|m| m.as_slice() == magic));
        if !magic_ok {
            tracing::error!("Could not open font {}: unknown file format", name);
            return Err(TextError::FontLoadError(format!("{} is not a font file", name)));
        }

        let font = FontRef::from_index(&data, options.index).ok_or_else(|| {
            tracing::error!("Could not open font {}", name);
            TextError::FontLoadError(format!("{} is not a valid font (face {})", name, options.index))
        })?;

        let scalable = [b"glyf", b"CFF ", b"CFF2"]
            .iter()
            .any(|tag| font.table(swash::tag_from_bytes(tag)).is_some());
        if !scalable {
            tracing::error!("Font is not scalable: {}", name);
            return Err(TextError::NotScalable(
                path.map_or_else(|| PathBuf::from(&name), Path::to_path_buf),
            ));
        }

        let pixel_size = options.pixel_size();
        if !pixel_size.is_finite() || pixel_size <= 0.0 {
            tracing::error!("Could not set font size {}", options.size);
            return Err(TextError::InvalidFontSize(pixel_size));
        }

        let scaled = font.metrics(&[]).scale(pixel_size);
        let metrics = FontMetrics {
            ascent: scaled.ascent.round() as i32,
            descent: scaled.descent.abs().round() as i32,
        };

        tracing::debug!(
            "Loaded font {} at {}px (ascent {}, descent {})",
            name,
            pixel_size,
            metrics.ascent,
            metrics.descent
        );

        Ok(Self {
            data,
            index: options.index,
            pixel_size,
            metrics,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }

    fn font_ref(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(&self.data, self.index)
    }
}

impl GlyphRasterizer for FontFace {
    fn rasterize(&mut self, ch: char) -> Option<RasterizedGlyph> {
        let font = self.font_ref()?;
        let id = font.charmap().map(ch);
        if id == 0 {
            return None;
        }

        let advance = font
            .glyph_metrics(&[])
            .scale(self.pixel_size)
            .advance_width(id)
            .round() as i32;

        let size = self.pixel_size;
        let image = FontLibrary::with_context(|context| {
            let mut scaler = context.builder(font).size(size).hint(true).build();
            Render::new(&[Source::Outline])
                .format(Format::Alpha)
                .render(&mut scaler, id)
        })?;

        // Blank glyphs such as the space produce no image but still advance.
        let Some(image) = image else {
            return Some(RasterizedGlyph {
                advance_x: advance,
                ..Default::default()
            });
        };

        let p = image.placement;
        Some(RasterizedGlyph {
            advance_x: advance,
            advance_y: 0,
            width: p.width,
            height: p.height,
            left: p.left,
            top: p.top,
            coverage: image.data,
        })
    }

    fn metrics(&self) -> FontMetrics {
        self.metrics
    }
}

/// A font database that manages available fonts.
pub struct FontDatabase {
    inner: fontdb::Database,
}

impl FontDatabase {
    /// Create a new font database with system fonts loaded.
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Self { inner: db }
    }

    /// Create an empty font database.
    pub fn empty() -> Self {
        Self {
            inner: fontdb::Database::new(),
        }
    }

    /// Load a font from bytes.
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.inner
            .load_font_source(fontdb::Source::Binary(Arc::new(data)));
    }

    /// Load a font from a .ttf or .otf file.
    pub fn load_font_file(&mut self, path: impl AsRef<Path>) -> std::io::Result<()> {
        self.inner.load_font_file(path)?;
        Ok(())
    }

    /// Load fonts from a directory.
    pub fn load_fonts_dir(&mut self, path: impl AsRef<Path>) {
        self.inner.load_fonts_dir(path);
    }

    /// Returns true if the font family is available.
    pub fn has_family(&self, family: &str) -> bool {
        self.inner
            .faces()
            .any(|face| face.families.iter().any(|(f, _)| f == family))
    }

    /// List all available font families.
    pub fn list_families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .inner
            .faces()
            .flat_map(|face| face.families.iter().map(|(family, _)| family.clone()))
            .collect();
        families.sort();
        families.dedup();
        families
    }

    /// Load the regular face of `family` at the size and DPI in `options`.
    /// The face index of `options` is replaced by the database's.
    pub fn load_family(&self, family: &str, options: FontLoadOptions) -> TextResult<FontFace> {
        let query = fontdb::Query {
            families: &[fontdb::Family::Name(family)],
            ..Default::default()
        };
        let id = self
            .inner
            .query(&query)
            .ok_or_else(|| TextError::FamilyNotFound(family.to_string()))?;

        self.inner
            .with_face_data(id, |data, index| {
                FontFace::from_data_named(
                    Arc::new(data.to_vec()),
                    options.with_index(index as usize),
                    family.to_string(),
                    None,
                )
            })
            .ok_or_else(|| TextError::FamilyNotFound(family.to_string()))?
    }

    /// Get the number of fonts loaded.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FontDatabase {
    fn default() -> Self {
        Self::new()
    }
}
