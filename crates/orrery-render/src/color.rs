/// Label, marker and orbit color, RGBA in `0.0..=1.0`.
///
/// ```
/// use orrery_render::Color;
///
/// let label = Color::rgb(0.6, 0.6, 0.9);
/// let faded = label.with_alpha(0.25);
/// assert_eq!(faded.a, 0.25);
/// assert_eq!(Color::from_hex(0xFF8800).to_array()[3], 1.0);
/// ```
///
/// `#[repr(C)]` and `bytemuck::Pod`, so it can be handed to the device as a
/// vertex color directly.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color from a 24-bit RGB value (e.g. `0xFF8800`).
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xFF) as f32 / 255.0;
        Self::rgb(channel(16), channel(8), channel(0))
    }

    /// Same color with the alpha replaced.
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Same color with the alpha multiplied by `factor`.
    pub fn fade(self, factor: f32) -> Self {
        self.with_alpha(self.a * factor.clamp(0.0, 1.0))
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Default label and orbit colors per object class.
pub mod palette {
    use super::Color;

    pub const STAR_LABEL: Color = Color::rgba(0.471, 0.356, 0.682, 1.0);
    pub const PLANET_LABEL: Color = Color::rgba(0.407, 0.333, 0.964, 1.0);
    pub const DWARF_PLANET_LABEL: Color = Color::rgba(0.557, 0.235, 0.875, 1.0);
    pub const MOON_LABEL: Color = Color::rgba(0.231, 0.733, 0.792, 1.0);
    pub const MINOR_MOON_LABEL: Color = Color::rgba(0.231, 0.733, 0.792, 1.0);
    pub const ASTEROID_LABEL: Color = Color::rgba(0.596, 0.305, 0.164, 1.0);
    pub const COMET_LABEL: Color = Color::rgba(0.768, 0.607, 0.227, 1.0);
    pub const SPACECRAFT_LABEL: Color = Color::rgba(0.93, 0.93, 0.93, 1.0);
    pub const LOCATION_LABEL: Color = Color::rgba(0.24, 0.89, 0.43, 1.0);
    pub const GALAXY_LABEL: Color = Color::rgba(0.0, 0.45, 0.5, 1.0);
    pub const NEBULA_LABEL: Color = Color::rgba(0.541, 0.764, 0.278, 1.0);
    pub const OPEN_CLUSTER_LABEL: Color = Color::rgba(0.239, 0.572, 0.396, 1.0);
    pub const GLOBULAR_LABEL: Color = Color::rgba(0.8, 0.8, 0.8, 1.0);

    pub const STAR_ORBIT: Color = Color::rgba(0.5, 0.5, 0.8, 1.0);
    pub const PLANET_ORBIT: Color = Color::rgba(0.3, 0.323, 0.833, 1.0);
    pub const DWARF_PLANET_ORBIT: Color = Color::rgba(0.557, 0.235, 0.875, 1.0);
    pub const MOON_ORBIT: Color = Color::rgba(0.08, 0.407, 0.392, 1.0);
    pub const MINOR_MOON_ORBIT: Color = Color::rgba(0.08, 0.407, 0.392, 1.0);
    pub const ASTEROID_ORBIT: Color = Color::rgba(0.58, 0.152, 0.08, 1.0);
    pub const COMET_ORBIT: Color = Color::rgba(0.639, 0.487, 0.168, 1.0);
    pub const SPACECRAFT_ORBIT: Color = Color::rgba(0.4, 0.4, 0.4, 1.0);
    pub const SELECTION_ORBIT: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);
}
