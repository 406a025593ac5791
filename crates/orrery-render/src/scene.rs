//! Read-only scene queries consumed by the render list builder.
//!
//! The renderer never owns scene objects. It walks the frame tree through
//! [`SceneQuery`] and stores ids in its per-frame lists. [`StaticScene`] is a
//! small in-memory implementation for embedding and tests.
//!
//! All distances are kilometres, times are days.

use crate::flags::BodyClass;
use glam::DVec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StarId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

/// Root of a frame subtree: a star's planetary system or a body's satellites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameParent {
    Star(StarId),
    Body(BodyId),
}

/// Orbit of a star around its system barycenter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarOrbit {
    pub barycenter: DVec3,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StarRecord {
    pub name: String,
    pub radius: f64,
    /// Absolute magnitude (defined at 10 parsecs).
    pub abs_magnitude: f32,
    pub orbit: Option<StarOrbit>,
}

impl StarRecord {
    pub fn new(name: impl Into<String>, radius: f64, abs_magnitude: f32) -> Self {
        Self {
            name: name.into(),
            radius,
            abs_magnitude,
            orbit: None,
        }
    }

    pub fn with_orbit(mut self, barycenter: DVec3, radius: f64) -> Self {
        self.orbit = Some(StarOrbit { barycenter, radius });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyRecord {
    pub name: String,
    pub class: BodyClass,
    pub radius: f64,
    /// Radius of everything drawn with the body (rings, atmosphere).
    pub culling_radius: f64,
    /// Magnitude seen from one astronomical unit.
    pub abs_magnitude: f32,
    pub visible: bool,
    /// Drawn as a point when unresolved.
    pub visible_as_point: bool,
    /// Bounding radius of the orbit, `None` for bodies fixed to their parent.
    pub orbit_radius: Option<f64>,
}

impl BodyRecord {
    pub fn new(name: impl Into<String>, class: BodyClass, radius: f64) -> Self {
        Self {
            name: name.into(),
            class,
            radius,
            culling_radius: radius,
            abs_magnitude: 0.0,
            visible: true,
            visible_as_point: true,
            orbit_radius: None,
        }
    }

    pub fn with_culling_radius(mut self, radius: f64) -> Self {
        self.culling_radius = radius.max(self.radius);
        self
    }

    pub fn with_abs_magnitude(mut self, magnitude: f32) -> Self {
        self.abs_magnitude = magnitude;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_visible_as_point(mut self, visible: bool) -> Self {
        self.visible_as_point = visible;
        self
    }
}

/// Read-only access to the scene graph.
pub trait SceneQuery {
    /// Stars that root a frame tree.
    fn star_systems(&self) -> &[StarId];

    fn star(&self, id: StarId) -> Option<&StarRecord>;

    fn body(&self, id: BodyId) -> Option<&BodyRecord>;

    /// Direct children of a frame.
    fn frame_children(&self, parent: FrameParent) -> &[BodyId];

    /// Radius of a sphere around the frame origin that contains every
    /// descendant, including its drawn extent.
    fn frame_bounding_radius(&self, parent: FrameParent) -> f64;

    /// Universal position of a star.
    fn star_position(&self, id: StarId, t: f64) -> Option<DVec3>;

    /// Universal position of a body at time `t`.
    fn body_position(&self, id: BodyId, t: f64) -> Option<DVec3>;
}

/// How a [`StaticScene`] body moves relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyMotion {
    Fixed(DVec3),
    /// Circular orbit in the XZ plane.
    Circular {
        radius: f64,
        period: f64,
        phase: f64,
    },
}

impl BodyMotion {
    pub fn circular(radius: f64, period: f64, phase: f64) -> Self {
        BodyMotion::Circular {
            radius,
            period,
            phase,
        }
    }

    pub fn offset(&self, t: f64) -> DVec3 {
        match *self {
            BodyMotion::Fixed(offset) => offset,
            BodyMotion::Circular {
                radius,
                period,
                phase,
            } => {
                let theta = if period != 0.0 {
                    phase + std::f64::consts::TAU * t / period
                } else {
                    phase
                };
                DVec3::new(radius * theta.cos(), 0.0, -radius * theta.sin())
            }
        }
    }

    /// Largest distance from the parent this motion ever reaches.
    pub fn extent(&self) -> f64 {
        match *self {
            BodyMotion::Fixed(offset) => offset.length(),
            BodyMotion::Circular { radius, .. } => radius,
        }
    }
}

#[derive(Debug, Clone)]
struct StarNode {
    record: StarRecord,
    position: DVec3,
    children: Vec<BodyId>,
}

#[derive(Debug, Clone)]
struct BodyNode {
    record: BodyRecord,
    parent: FrameParent,
    motion: BodyMotion,
    children: Vec<BodyId>,
}

/// Frame trees deeper than this are treated as malformed.
pub const MAX_FRAME_DEPTH: usize = 64;

/// In-memory scene.
///
/// ```
/// use orrery_render::{BodyClass, BodyMotion, BodyRecord, FrameParent, SceneQuery, StarRecord, StaticScene};
/// use glam::DVec3;
///
/// let mut scene = StaticScene::new();
/// let sun = scene.add_star(StarRecord::new("Sol", 696_000.0, 4.83), DVec3::ZERO);
/// let earth = scene.add_body(
///     FrameParent::Star(sun),
///     BodyRecord::new("Earth", BodyClass::PLANET, 6_378.0),
///     BodyMotion::circular(149_597_870.7, 365.25, 0.0),
/// );
/// assert_eq!(scene.frame_children(FrameParent::Star(sun)), &[earth]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticScene {
    stars: Vec<StarNode>,
    roots: Vec<StarId>,
    bodies: Vec<BodyNode>,
}

impl StaticScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_star(&mut self, record: StarRecord, position: DVec3) -> StarId {
        let id = StarId(self.stars.len() as u32);
        self.stars.push(StarNode {
            record,
            position,
            children: Vec::new(),
        });
        self.roots.push(id);
        id
    }

    /// Add a body below `parent`. A parent that does not exist leaves the body
    /// unreachable from any frame tree.
    pub fn add_body(
        &mut self,
        parent: FrameParent,
        mut record: BodyRecord,
        motion: BodyMotion,
    ) -> BodyId {
        let id = BodyId(self.bodies.len() as u32);
        if let BodyMotion::Circular { radius, .. } = motion {
            record.orbit_radius.get_or_insert(radius);
        }
        match parent {
            FrameParent::Star(star) => {
                if let Some(node) = self.stars.get_mut(star.0 as usize) {
                    node.children.push(id);
                }
            }
            FrameParent::Body(body) => {
                if let Some(node) = self.bodies.get_mut(body.0 as usize) {
                    node.children.push(id);
                }
            }
        }
        self.bodies.push(BodyNode {
            record,
            parent,
            motion,
            children: Vec::new(),
        });
        id
    }

    pub fn body_parent(&self, id: BodyId) -> Option<FrameParent> {
        self.bodies.get(id.0 as usize).map(|node| node.parent)
    }

    fn bounding_radius(&self, parent: FrameParent, depth: usize) -> f64 {
        if depth > MAX_FRAME_DEPTH {
            return 0.0;
        }
        self.frame_children(parent)
            .iter()
            .filter_map(|&child| {
                let node = self.bodies.get(child.0 as usize)?;
                let subtree = self
                    .bounding_radius(FrameParent::Body(child), depth + 1)
                    .max(node.record.culling_radius);
                Some(node.motion.extent() + subtree)
            })
            .fold(0.0, f64::max)
    }

    fn position(&self, id: BodyId, t: f64, depth: usize) -> Option<DVec3> {
        if depth > MAX_FRAME_DEPTH {
            return None;
        }
        let node = self.bodies.get(id.0 as usize)?;
        let origin = match node.parent {
            FrameParent::Star(star) => self.stars.get(star.0 as usize)?.position,
            FrameParent::Body(body) => self.position(body, t, depth + 1)?,
        };
        Some(origin + node.motion.offset(t))
    }
}

impl SceneQuery for StaticScene {
    fn star_systems(&self) -> &[StarId] {
        &self.roots
    }

    fn star(&self, id: StarId) -> Option<&StarRecord> {
        self.stars.get(id.0 as usize).map(|node| &node.record)
    }

    fn body(&self, id: BodyId) -> Option<&BodyRecord> {
        self.bodies.get(id.0 as usize).map(|node| &node.record)
    }

    fn frame_children(&self, parent: FrameParent) -> &[BodyId] {
        let children = match parent {
            FrameParent::Star(id) => self.stars.get(id.0 as usize).map(|n| &n.children),
            FrameParent::Body(id) => self.bodies.get(id.0 as usize).map(|n| &n.children),
        };
        children.map(Vec::as_slice).unwrap_or(&[])
    }

    fn frame_bounding_radius(&self, parent: FrameParent) -> f64 {
        self.bounding_radius(parent, 0)
    }

    fn star_position(&self, id: StarId, _t: f64) -> Option<DVec3> {
        self.stars.get(id.0 as usize).map(|node| node.position)
    }

    fn body_position(&self, id: BodyId, t: f64) -> Option<DVec3> {
        self.position(id, t, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solar_system() -> (StaticScene, StarId, BodyId, BodyId) {
        let mut scene = StaticScene::new();
        let sun = scene.add_star(StarRecord::new("Sol", 696_000.0, 4.83), DVec3::ZERO);
        let earth = scene.add_body(
            FrameParent::Star(sun),
            BodyRecord::new("Earth", BodyClass::PLANET, 6_378.0),
            BodyMotion::circular(1.5e8, 365.25, 0.0),
        );
        let moon = scene.add_body(
            FrameParent::Body(earth),
            BodyRecord::new("Moon", BodyClass::MOON, 1_737.0),
            BodyMotion::circular(384_400.0, 27.3, 0.0),
        );
        (scene, sun, earth, moon)
    }

    #[test]
    fn test_positions_compose() {
        let (scene, _, earth, moon) = solar_system();
        let e = scene.body_position(earth, 0.0).unwrap();
        let m = scene.body_position(moon, 0.0).unwrap();
        assert_eq!(e, DVec3::new(1.5e8, 0.0, 0.0));
        assert!((m - DVec3::new(1.5e8 + 384_400.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_circular_motion_quarter_period() {
        let motion = BodyMotion::circular(10.0, 4.0, 0.0);
        let p = motion.offset(1.0);
        assert!(p.x.abs() < 1e-9);
        assert!((p.z + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounding_radius() {
        let (scene, sun, earth, _) = solar_system();
        let r = scene.frame_bounding_radius(FrameParent::Star(sun));
        assert!((r - (1.5e8 + 384_400.0 + 1_737.0)).abs() < 1e-6);
        let r = scene.frame_bounding_radius(FrameParent::Body(earth));
        assert!((r - (384_400.0 + 1_737.0)).abs() < 1e-6);
    }

    #[test]
    fn test_orbit_radius_from_motion() {
        let (scene, _, earth, _) = solar_system();
        assert_eq!(scene.body(earth).unwrap().orbit_radius, Some(1.5e8));
    }

    #[test]
    fn test_unknown_ids() {
        let mut scene = StaticScene::new();
        let orphan = scene.add_body(
            FrameParent::Star(StarId(7)),
            BodyRecord::new("Orphan", BodyClass::ASTEROID, 1.0),
            BodyMotion::Fixed(DVec3::X),
        );
        assert!(scene.body_position(orphan, 0.0).is_none());
        assert!(scene.frame_children(FrameParent::Star(StarId(7))).is_empty());
        assert_eq!(scene.frame_bounding_radius(FrameParent::Body(BodyId(99))), 0.0);
        assert!(scene.star_systems().is_empty());
    }
}
