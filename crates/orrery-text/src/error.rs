use orrery_render::DeviceError;

/// Errors that can occur in the text rendering system.
#[derive(Debug, Clone)]
pub enum TextError {
    /// Font file not found.
    FontFileNotFound(std::path::PathBuf),

    /// Font file exists but could not be opened or parsed.
    FontLoadError(String),

    /// The face has no scalable outlines.
    NotScalable(std::path::PathBuf),

    /// The requested size cannot be applied to the face.
    InvalidFontSize(f32),

    /// No face in the font database matches the family.
    FamilyNotFound(String),

    /// Texture atlas does not fit the device texture limit.
    AtlasFull {
        requested_width: u32,
        requested_height: u32,
        atlas_width: u32,
        atlas_height: u32,
    },

    /// GPU resource creation or upload failed.
    GpuResourceError(String),

    /// Generic IO error.
    IoError(String),
}

impl std::fmt::Display for TextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextError::FontFileNotFound(path) => {
                write!(f, "Font file not found: {}", path.display())
            }
            TextError::FontLoadError(msg) => write!(f, "Failed to load font: {}", msg),
            TextError::NotScalable(path) => {
                write!(f, "Font is not scalable: {}", path.display())
            }
            TextError::InvalidFontSize(size) => write!(f, "Could not set font size {}", size),
            TextError::FamilyNotFound(family) => write!(f, "No font found for family '{}'", family),
            TextError::AtlasFull {
                requested_width,
                requested_height,
                atlas_width,
                atlas_height,
            } => write!(
                f,
                "Texture atlas is full: requested {}x{} but atlas is {}x{}",
                requested_width, requested_height, atlas_width, atlas_height
            ),
            TextError::GpuResourceError(msg) => write!(f, "GPU resource error: {}", msg),
            TextError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for TextError {}

impl From<std::io::Error> for TextError {
    fn from(err: std::io::Error) -> Self {
        TextError::IoError(err.to_string())
    }
}

impl From<DeviceError> for TextError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::TextureTooLarge { width, height, max } => TextError::AtlasFull {
                requested_width: width,
                requested_height: height,
                atlas_width: max,
                atlas_height: max,
            },
            other => TextError::GpuResourceError(other.to_string()),
        }
    }
}

/// Result type for text operations.
pub type TextResult<T> = Result<T, TextError>;
