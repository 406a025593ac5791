//! Render, label and body-class flag sets.

use crate::color::{Color, palette};

bitflags::bitflags! {
    /// What the renderer draws.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u64 {
        const SHOW_NOTHING = 0;
        const SHOW_STARS = 0x1;
        const SHOW_PLANETS = 0x2;
        const SHOW_GALAXIES = 0x4;
        const SHOW_DIAGRAMS = 0x8;
        const SHOW_CLOUD_MAPS = 0x10;
        const SHOW_ORBITS = 0x20;
        const SHOW_CELESTIAL_SPHERE = 0x40;
        const SHOW_NIGHT_MAPS = 0x80;
        const SHOW_ATMOSPHERES = 0x100;
        const SHOW_SMOOTH_LINES = 0x200;
        const SHOW_ECLIPSE_SHADOWS = 0x400;
        const SHOW_PLANET_RINGS = 0x800;
        const SHOW_RING_SHADOWS = 0x1000;
        const SHOW_BOUNDARIES = 0x2000;
        const SHOW_AUTO_MAG = 0x4000;
        const SHOW_COMET_TAILS = 0x8000;
        const SHOW_MARKERS = 0x10000;
        const SHOW_PARTIAL_TRAJECTORIES = 0x20000;
        const SHOW_NEBULAE = 0x40000;
        const SHOW_OPEN_CLUSTERS = 0x80000;
        const SHOW_GLOBULARS = 0x100000;
        const SHOW_CLOUD_SHADOWS = 0x200000;
        const SHOW_GALACTIC_GRID = 0x400000;
        const SHOW_ECLIPTIC_GRID = 0x800000;
        const SHOW_HORIZON_GRID = 0x1000000;
        const SHOW_ECLIPTIC = 0x2000000;
        const SHOW_TINTED_ILLUMINATION = 0x4000000;
        const SHOW_DWARF_PLANETS = 0x8000000;
        const SHOW_MOONS = 0x10000000;
        const SHOW_MINOR_MOONS = 0x20000000;
        const SHOW_ASTEROIDS = 0x40000000;
        const SHOW_COMETS = 0x80000000;
        const SHOW_SPACECRAFTS = 0x100000000;
        const SHOW_FADING_ORBITS = 0x200000000;

        const SHOW_SOLAR_SYSTEM_OBJECTS = Self::SHOW_PLANETS.bits()
            | Self::SHOW_DWARF_PLANETS.bits()
            | Self::SHOW_MOONS.bits()
            | Self::SHOW_MINOR_MOONS.bits()
            | Self::SHOW_ASTEROIDS.bits()
            | Self::SHOW_COMETS.bits()
            | Self::SHOW_SPACECRAFTS.bits();

        const SHOW_DEEP_SPACE_OBJECTS = Self::SHOW_GALAXIES.bits()
            | Self::SHOW_GLOBULARS.bits()
            | Self::SHOW_NEBULAE.bits()
            | Self::SHOW_OPEN_CLUSTERS.bits();
    }
}

impl RenderFlags {
    /// Flags a fresh renderer starts with.
    pub const DEFAULT: RenderFlags = RenderFlags::SHOW_STARS
        .union(RenderFlags::SHOW_SOLAR_SYSTEM_OBJECTS)
        .union(RenderFlags::SHOW_GALAXIES)
        .union(RenderFlags::SHOW_GLOBULARS)
        .union(RenderFlags::SHOW_NEBULAE)
        .union(RenderFlags::SHOW_OPEN_CLUSTERS)
        .union(RenderFlags::SHOW_CLOUD_MAPS)
        .union(RenderFlags::SHOW_ATMOSPHERES)
        .union(RenderFlags::SHOW_ECLIPSE_SHADOWS)
        .union(RenderFlags::SHOW_RING_SHADOWS)
        .union(RenderFlags::SHOW_PLANET_RINGS)
        .union(RenderFlags::SHOW_COMET_TAILS)
        .union(RenderFlags::SHOW_NIGHT_MAPS)
        .union(RenderFlags::SHOW_MARKERS)
        .union(RenderFlags::SHOW_SMOOTH_LINES)
        .union(RenderFlags::SHOW_AUTO_MAG)
        .union(RenderFlags::SHOW_FADING_ORBITS);

    /// Body classes whose members may enter the render list.
    ///
    /// Classes without a dedicated flag (barycenters, surface features,
    /// components) are always allowed through; their own visibility settings
    /// decide.
    pub fn visible_body_classes(self) -> BodyClass {
        let mut mask = BodyClass::STELLAR
            | BodyClass::BARYCENTER
            | BodyClass::SMALL_BODY
            | BodyClass::SURFACE_FEATURE
            | BodyClass::COMPONENT
            | BodyClass::DIFFUSE
            | BodyClass::UNKNOWN;
        for (flag, class) in CLASS_FLAGS {
            if self.contains(*flag) {
                mask |= *class;
            }
        }
        mask
    }
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

const CLASS_FLAGS: &[(RenderFlags, BodyClass)] = &[
    (RenderFlags::SHOW_PLANETS, BodyClass::PLANET),
    (RenderFlags::SHOW_DWARF_PLANETS, BodyClass::DWARF_PLANET),
    (RenderFlags::SHOW_MOONS, BodyClass::MOON),
    (RenderFlags::SHOW_MINOR_MOONS, BodyClass::MINOR_MOON),
    (RenderFlags::SHOW_ASTEROIDS, BodyClass::ASTEROID),
    (RenderFlags::SHOW_COMETS, BodyClass::COMET),
    (RenderFlags::SHOW_SPACECRAFTS, BodyClass::SPACECRAFT),
];

bitflags::bitflags! {
    /// Which object classes get a text label.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LabelFlags: u32 {
        const STAR = 0x001;
        const PLANET = 0x002;
        const MOON = 0x004;
        const CONSTELLATION = 0x008;
        const GALAXY = 0x010;
        const ASTEROID = 0x020;
        const SPACECRAFT = 0x040;
        const LOCATION = 0x080;
        const COMET = 0x100;
        const NEBULA = 0x200;
        const OPEN_CLUSTER = 0x400;
        const I18N_CONSTELLATION = 0x800;
        const DWARF_PLANET = 0x1000;
        const MINOR_MOON = 0x2000;
        const GLOBULAR = 0x4000;

        const BODY_LABEL_MASK = Self::PLANET.bits()
            | Self::DWARF_PLANET.bits()
            | Self::MOON.bits()
            | Self::MINOR_MOON.bits()
            | Self::ASTEROID.bits()
            | Self::SPACECRAFT.bits()
            | Self::COMET.bits();
    }
}

const LABEL_CLASSES: &[(LabelFlags, BodyClass)] = &[
    (LabelFlags::PLANET, BodyClass::PLANET),
    (LabelFlags::DWARF_PLANET, BodyClass::DWARF_PLANET),
    (LabelFlags::MOON, BodyClass::MOON),
    (LabelFlags::MINOR_MOON, BodyClass::MINOR_MOON),
    (LabelFlags::ASTEROID, BodyClass::ASTEROID),
    (LabelFlags::COMET, BodyClass::COMET),
    (LabelFlags::SPACECRAFT, BodyClass::SPACECRAFT),
];

impl LabelFlags {
    /// Body classes whose members are label candidates.
    pub fn body_classes(self) -> BodyClass {
        LABEL_CLASSES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .fold(BodyClass::empty(), |mask, (_, class)| mask | *class)
    }
}

bitflags::bitflags! {
    /// Classification of a solar system body. Also used as a mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BodyClass: u32 {
        const PLANET = 0x01;
        const MOON = 0x02;
        const ASTEROID = 0x04;
        const COMET = 0x08;
        const SPACECRAFT = 0x10;
        const INVISIBLE = 0x20;
        const BARYCENTER = 0x40;
        const SMALL_BODY = 0x80;
        const DWARF_PLANET = 0x100;
        const STELLAR = 0x200;
        const SURFACE_FEATURE = 0x400;
        const COMPONENT = 0x800;
        const MINOR_MOON = 0x1000;
        const DIFFUSE = 0x2000;
        const UNKNOWN = 0x10000;
    }
}

impl BodyClass {
    /// Default orbit mask: planets, moons, asteroids, comets, spacecraft.
    pub const DEFAULT_ORBIT_MASK: BodyClass = BodyClass::PLANET
        .union(BodyClass::MOON)
        .union(BodyClass::ASTEROID)
        .union(BodyClass::COMET)
        .union(BodyClass::SPACECRAFT)
        .union(BodyClass::DWARF_PLANET)
        .union(BodyClass::STELLAR);

    pub fn label_color(self) -> Color {
        if self.contains(BodyClass::PLANET) {
            palette::PLANET_LABEL
        } else if self.contains(BodyClass::DWARF_PLANET) {
            palette::DWARF_PLANET_LABEL
        } else if self.contains(BodyClass::MOON) {
            palette::MOON_LABEL
        } else if self.contains(BodyClass::MINOR_MOON) {
            palette::MINOR_MOON_LABEL
        } else if self.contains(BodyClass::ASTEROID) {
            palette::ASTEROID_LABEL
        } else if self.contains(BodyClass::COMET) {
            palette::COMET_LABEL
        } else if self.contains(BodyClass::SPACECRAFT) {
            palette::SPACECRAFT_LABEL
        } else if self.contains(BodyClass::STELLAR) {
            palette::STAR_LABEL
        } else {
            Color::WHITE
        }
    }

    pub fn orbit_color(self) -> Color {
        if self.contains(BodyClass::PLANET) {
            palette::PLANET_ORBIT
        } else if self.contains(BodyClass::DWARF_PLANET) {
            palette::DWARF_PLANET_ORBIT
        } else if self.contains(BodyClass::MOON) {
            palette::MOON_ORBIT
        } else if self.contains(BodyClass::MINOR_MOON) {
            palette::MINOR_MOON_ORBIT
        } else if self.contains(BodyClass::ASTEROID) {
            palette::ASTEROID_ORBIT
        } else if self.contains(BodyClass::COMET) {
            palette::COMET_ORBIT
        } else if self.contains(BodyClass::SPACECRAFT) {
            palette::SPACECRAFT_ORBIT
        } else {
            palette::STAR_ORBIT
        }
    }
}

/// How stars are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StarStyle {
    #[default]
    FuzzyPoint,
    Point,
    ScaledDisc,
}
