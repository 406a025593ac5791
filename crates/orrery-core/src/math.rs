//! Math types and astronomical unit helpers.
//!
//! Scene positions are kept in double precision kilometres; anything handed
//! to the graphics device is single precision. Both families come from
//! [`glam`] and are re-exported here.
//!
//! ```
//! use orrery_core::math::{DVec3, astro};
//!
//! let earth = DVec3::new(astro::KM_PER_AU, 0.0, 0.0);
//! assert!((astro::km_to_au(earth.length()) - 1.0).abs() < 1e-12);
//! ```
//!
//! [`glam`]: https://docs.rs/glam

pub use glam::*;

/// Distance units and photometric helpers.
pub mod astro {
    /// Kilometres in one astronomical unit.
    pub const KM_PER_AU: f64 = 149_597_870.7;
    /// Kilometres in one light year.
    pub const KM_PER_LY: f64 = 9_460_730_472_580.8;
    /// Light years in one parsec.
    pub const LY_PER_PARSEC: f64 = 3.261_563_777_2;
    /// Kilometres in one parsec.
    pub const KM_PER_PARSEC: f64 = KM_PER_LY * LY_PER_PARSEC;

    pub fn km_to_au(km: f64) -> f64 {
        km / KM_PER_AU
    }

    pub fn km_to_ly(km: f64) -> f64 {
        km / KM_PER_LY
    }

    /// Apparent magnitude of an object with absolute magnitude `abs_mag`
    /// seen from `distance`, where the absolute magnitude is defined at
    /// `reference_distance` (same units).
    ///
    /// Distances are clamped to a tiny positive value so an observer sitting
    /// on the object gets a very bright, finite magnitude.
    pub fn apparent_magnitude(abs_mag: f32, distance: f64, reference_distance: f64) -> f32 {
        let ratio = (distance / reference_distance).max(1e-12);
        abs_mag + (5.0 * ratio.log10()) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::astro::*;

    #[test]
    fn test_parsec_in_ly() {
        assert!((km_to_ly(KM_PER_PARSEC) - LY_PER_PARSEC).abs() < 1e-9);
    }

    #[test]
    fn test_apparent_magnitude_at_reference() {
        assert!((apparent_magnitude(4.8, 10.0, 10.0) - 4.8).abs() < 1e-6);
        // Ten times farther is five magnitudes fainter.
        assert!((apparent_magnitude(4.8, 100.0, 10.0) - 9.8).abs() < 1e-5);
    }
}
