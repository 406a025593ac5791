//! View frustum culling.
//!
//! The frustum lives in camera space: the eye sits at the origin looking
//! down `-Z`, `+Y` is up. Every plane normal points into the volume, so a
//! point is inside when its signed distance to every plane is non-negative.

use glam::{DMat3, DMat4, DVec3, DVec4, Vec3};

/// Result of classifying a point or sphere against a [`Frustum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Containment {
    Outside,
    Inside,
    Intersect,
}

/// Index of each plane in [`Frustum::planes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum PlaneIndex {
    Bottom = 0,
    Top = 1,
    Left = 2,
    Right = 3,
    Near = 4,
    Far = 5,
}

/// A plane `normal · p + d = 0`, `normal` of unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub d: f64,
}

impl Plane {
    pub fn new(normal: DVec3, d: f64) -> Self {
        Self { normal, d }
    }

    /// Signed distance from `p`; positive on the side the normal points to.
    #[inline]
    pub fn distance(&self, p: DVec3) -> f64 {
        self.normal.dot(p) + self.d
    }

    fn coefficients(&self) -> DVec4 {
        self.normal.extend(self.d)
    }

    fn from_coefficients(c: DVec4) -> Self {
        let normal = c.truncate();
        let len = normal.length();
        if len > 0.0 {
            Self::new(normal / len, c.w / len)
        } else {
            Self::new(normal, c.w)
        }
    }
}

/// A convex view volume bounded by four side planes, a near plane and an
/// optional far plane.
///
/// ```
/// use orrery_render::{Containment, Frustum};
/// use glam::Vec3;
///
/// let frustum = Frustum::with_far(90f64.to_radians(), 1.0, 1.0, 1000.0);
/// assert_eq!(frustum.test(Vec3::new(0.0, 0.0, -500.0)), Containment::Inside);
/// assert_eq!(frustum.test(Vec3::new(0.0, 0.0, 500.0)), Containment::Outside);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    planes: [Plane; 6],
    infinite: bool,
}

impl Frustum {
    /// Frustum without a far plane.
    pub fn new(fov_y: f64, aspect: f64, near: f64) -> Self {
        Self::build(fov_y, aspect, near, None)
    }

    pub fn with_far(fov_y: f64, aspect: f64, near: f64, far: f64) -> Self {
        Self::build(fov_y, aspect, near, Some(far))
    }

    fn build(fov_y: f64, aspect: f64, near: f64, far: Option<f64>) -> Self {
        let h = (fov_y / 2.0).tan();
        let w = h * aspect;

        let side = |n: DVec3| Plane::new(n.normalize(), 0.0);
        let planes = [
            side(DVec3::new(0.0, 1.0, -h)),
            side(DVec3::new(0.0, -1.0, -h)),
            side(DVec3::new(1.0, 0.0, -w)),
            side(DVec3::new(-1.0, 0.0, -w)),
            Plane::new(DVec3::NEG_Z, -near),
            // An infinite frustum keeps a placeholder that is never tested.
            Plane::new(DVec3::Z, far.unwrap_or(f64::INFINITY)),
        ];

        Self {
            planes,
            infinite: far.is_none(),
        }
    }

    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    /// Planes that take part in tests (five for an infinite frustum).
    pub fn planes(&self) -> &[Plane] {
        if self.infinite {
            &self.planes[..5]
        } else {
            &self.planes
        }
    }

    pub fn plane(&self, index: PlaneIndex) -> &Plane {
        &self.planes[index as usize]
    }

    /// Classify a point in double precision.
    pub fn test_point(&self, p: DVec3) -> Containment {
        if self.planes().iter().any(|plane| plane.distance(p) < 0.0) {
            Containment::Outside
        } else {
            Containment::Inside
        }
    }

    /// Classify a point in single precision.
    pub fn test(&self, p: Vec3) -> Containment {
        self.test_point(p.as_dvec3())
    }

    /// Classify a sphere in double precision.
    ///
    /// A radius of zero is treated as a point, so a sphere touching a plane
    /// exactly still counts as inside.
    pub fn test_sphere_f64(&self, center: DVec3, radius: f64) -> Containment {
        if radius <= 0.0 {
            return self.test_point(center);
        }

        let mut intersect = false;
        for plane in self.planes() {
            let distance = plane.distance(center);
            if distance < -radius {
                return Containment::Outside;
            }
            if distance <= radius {
                intersect = true;
            }
        }

        if intersect {
            Containment::Intersect
        } else {
            Containment::Inside
        }
    }

    /// Classify a sphere in single precision.
    pub fn test_sphere(&self, center: Vec3, radius: f32) -> Containment {
        self.test_sphere_f64(center.as_dvec3(), radius as f64)
    }

    /// Re-derive the planes after applying a rotation (or any invertible
    /// linear map) to the volume.
    pub fn transform(&mut self, m: &DMat3) {
        let inv_t = m.inverse().transpose();
        for plane in &mut self.planes {
            let normal = inv_t * plane.normal;
            let len = normal.length();
            if len > 0.0 {
                *plane = Plane::new(normal / len, plane.d / len);
            }
        }
    }

    /// Re-derive the planes after applying an affine transform to the volume.
    pub fn transform_affine(&mut self, m: &DMat4) {
        let inv_t = m.inverse().transpose();
        let count = if self.infinite { 5 } else { 6 };
        for plane in &mut self.planes[..count] {
            *plane = Plane::from_coefficients(inv_t * plane.coefficients());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn frustum() -> Frustum {
        Frustum::with_far(FRAC_PI_2, 1.0, 1.0, 1000.0)
    }

    #[test]
    fn test_points_along_axis() {
        let f = frustum();
        assert_eq!(f.test(Vec3::new(0.0, 0.0, -500.0)), Containment::Inside);
        assert_eq!(f.test(Vec3::new(0.0, 0.0, 500.0)), Containment::Outside);
        assert_eq!(f.test(Vec3::new(0.0, 0.0, -0.5)), Containment::Outside);
        assert_eq!(f.test(Vec3::new(0.0, 0.0, -1500.0)), Containment::Outside);
    }

    #[test]
    fn test_side_planes() {
        let f = frustum();
        // 90 degree fov: the side planes are the lines |x| = -z and |y| = -z.
        assert_eq!(f.test(Vec3::new(9.0, 0.0, -10.0)), Containment::Inside);
        assert_eq!(f.test(Vec3::new(11.0, 0.0, -10.0)), Containment::Outside);
        assert_eq!(f.test(Vec3::new(0.0, -11.0, -10.0)), Containment::Outside);
    }

    #[test]
    fn test_plane_order() {
        let f = frustum();
        assert_eq!(f.plane(PlaneIndex::Near).normal, DVec3::NEG_Z);
        assert_eq!(f.plane(PlaneIndex::Near).d, -1.0);
        assert_eq!(f.plane(PlaneIndex::Far).d, 1000.0);
        assert!(f.plane(PlaneIndex::Bottom).normal.y > 0.0);
        assert!(f.plane(PlaneIndex::Top).normal.y < 0.0);
        assert!(f.plane(PlaneIndex::Left).normal.x > 0.0);
        assert!(f.plane(PlaneIndex::Right).normal.x < 0.0);
    }

    #[test]
    fn test_sphere_classification() {
        let f = frustum();
        assert_eq!(
            f.test_sphere(Vec3::new(0.0, 0.0, -500.0), 10.0),
            Containment::Inside
        );
        assert_eq!(
            f.test_sphere(Vec3::new(0.0, 0.0, -1005.0), 10.0),
            Containment::Intersect
        );
        assert_eq!(
            f.test_sphere(Vec3::new(0.0, 0.0, -1020.0), 10.0),
            Containment::Outside
        );
        assert_eq!(
            f.test_sphere(Vec3::new(0.0, 0.0, 50.0), 10.0),
            Containment::Outside
        );
    }

    #[test]
    fn test_zero_radius_at_apex() {
        let f = Frustum::with_far(FRAC_PI_2, 1.0, 0.0, 100.0);
        assert_eq!(f.test_sphere_f64(DVec3::ZERO, 0.0), Containment::Inside);
    }

    #[test]
    fn test_infinite_has_five_planes() {
        let f = Frustum::new(FRAC_PI_2, 1.0, 1.0);
        assert!(f.is_infinite());
        assert_eq!(f.planes().len(), 5);
        assert_eq!(
            f.test_point(DVec3::new(0.0, 0.0, -1.0e30)),
            Containment::Inside
        );
    }

    #[test]
    fn test_rotation_transform() {
        let mut f = frustum();
        // Turn the volume to look down +X.
        let rot = DMat3::from_rotation_y(-FRAC_PI_2);
        f.transform(&rot);
        assert_eq!(
            f.test_point(DVec3::new(500.0, 0.0, 0.0)),
            Containment::Inside
        );
        assert_eq!(
            f.test_point(DVec3::new(0.0, 0.0, -500.0)),
            Containment::Outside
        );
    }

    #[test]
    fn test_affine_transform() {
        let mut f = frustum();
        f.transform_affine(&DMat4::from_translation(DVec3::new(0.0, 0.0, 100.0)));
        // The apex moved to z = 100, so the near plane is at z = 99.
        assert_eq!(
            f.test_point(DVec3::new(0.0, 0.0, 99.5)),
            Containment::Outside
        );
        assert_eq!(
            f.test_point(DVec3::new(0.0, 0.0, 98.0)),
            Containment::Inside
        );
        assert_eq!(
            f.test_point(DVec3::new(0.0, 0.0, -899.0)),
            Containment::Inside
        );
        assert_eq!(
            f.test_point(DVec3::new(0.0, 0.0, -901.0)),
            Containment::Outside
        );
    }
}
