//! Per-frame render list construction.
//!
//! [`RenderListBuilder::build`] walks every frame tree of a [`SceneQuery`],
//! filters objects by flags, size, brightness and the view frustum, and
//! produces three lists: drawable objects, orbit paths and label candidates.
//! [`remove_invisible_items`] is the second pass that drops entries entirely
//! outside the frustum and computes depth extents for partitioning.
//!
//! Depths in this module are positive distances along the view direction
//! (`-z` in camera space).

use crate::camera::{Observer, ViewParams};
use crate::color::Color;
use crate::flags::{BodyClass, LabelFlags, RenderFlags};
use crate::frustum::{Containment, Frustum};
use crate::scene::{BodyId, FrameParent, MAX_FRAME_DEPTH, SceneQuery, StarId};
use crate::settings::RenderSettings;
use glam::{DVec3, Vec3};
use orrery_core::math::astro;
use orrery_core::profiling::profile_function;

/// Closest the near plane of any entry may get, in kilometres.
pub const MIN_NEAR_PLANE_DISTANCE: f32 = 0.0001;

/// Largest far/near ratio allowed for a single entry.
pub const MAX_FAR_NEAR_RATIO: f32 = 2_000_000.0;

/// Object referenced by a render list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Renderable {
    Star(StarId),
    Body(BodyId),
}

/// A visible object for this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderListEntry {
    pub renderable: Renderable,
    /// Camera space position.
    pub position: Vec3,
    pub distance: f32,
    /// Depth of the object's center.
    pub center_z: f32,
    /// Depth extents, filled in by [`remove_invisible_items`].
    pub near_z: f32,
    pub far_z: f32,
    /// Culling radius in kilometres.
    pub radius: f32,
    /// Apparent radius in pixels.
    pub disc_size: f32,
    pub app_mag: f32,
    pub class: BodyClass,
}

/// An orbit path to draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitPathListEntry {
    pub renderable: Renderable,
    /// Camera space center of the orbit.
    pub origin: Vec3,
    /// Depth of the orbit center.
    pub center_z: f32,
    pub radius: f32,
    pub opacity: f32,
    pub color: Color,
}

impl OrbitPathListEntry {
    /// Sort key: entries with a larger key are drawn first.
    pub fn sort_key(&self) -> f32 {
        self.center_z - self.radius
    }
}

/// An object that should receive a text label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelCandidate {
    pub renderable: Renderable,
    pub name: String,
    pub position: Vec3,
    pub depth: f32,
    pub color: Color,
    /// Apparent radius in pixels. Labels are moved this far off the anchor
    /// so they clear the disc.
    pub disc_size: f32,
}

/// Output of [`RenderListBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct RenderLists {
    pub entries: Vec<RenderListEntry>,
    pub orbits: Vec<OrbitPathListEntry>,
    pub labels: Vec<LabelCandidate>,
}

impl RenderLists {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.orbits.is_empty() && self.labels.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.orbits.clear();
        self.labels.clear();
    }

    /// Sort entries and orbits farthest first, labels by depth.
    pub fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| b.center_z.total_cmp(&a.center_z));
        self.orbits
            .sort_by(|a, b| b.sort_key().total_cmp(&a.sort_key()));
        self.labels.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    }
}

/// Fade factor for something `screen_size` pixels big that disappears below
/// `min_size` and is fully opaque at `opaque_scale * min_size`.
pub fn size_fade(screen_size: f32, min_size: f32, opaque_scale: f32) -> f32 {
    let span = min_size * (opaque_scale - 1.0);
    if span <= 0.0 {
        return 1.0;
    }
    ((screen_size - min_size) / span).clamp(0.0, 1.0)
}

/// Builds [`RenderLists`] for one observer and viewport.
pub struct RenderListBuilder<'a> {
    settings: &'a RenderSettings,
    observer: &'a Observer,
    frustum: Frustum,
    pixel_size: f64,
    visible_classes: BodyClass,
    label_classes: BodyClass,
}

impl<'a> RenderListBuilder<'a> {
    pub fn new(settings: &'a RenderSettings, observer: &'a Observer, view: &ViewParams) -> Self {
        Self::with_frustum(
            settings,
            observer,
            view.frustum(MIN_NEAR_PLANE_DISTANCE as f64),
            view.pixel_size(),
        )
    }

    pub fn with_frustum(
        settings: &'a RenderSettings,
        observer: &'a Observer,
        frustum: Frustum,
        pixel_size: f64,
    ) -> Self {
        Self {
            settings,
            observer,
            frustum,
            pixel_size: pixel_size.max(f64::MIN_POSITIVE),
            visible_classes: settings.render_flags.visible_body_classes(),
            label_classes: settings.label_flags.body_classes(),
        }
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn build(&self, scene: &dyn SceneQuery) -> RenderLists {
        profile_function!();

        let mut lists = RenderLists::default();
        let flags = self.settings.render_flags;
        let t = self.observer.time;

        for &star in scene.star_systems() {
            let Some(position) = scene.star_position(star, t) else {
                continue;
            };

            if flags.contains(RenderFlags::SHOW_STARS) {
                self.add_star(scene, star, position, &mut lists);
            }

            if flags.contains(RenderFlags::SHOW_ORBITS)
                && self.settings.orbit_mask.contains(BodyClass::STELLAR)
            {
                self.add_star_orbit(scene, star, &mut lists);
            }

            if flags.intersects(RenderFlags::SHOW_SOLAR_SYSTEM_OBJECTS) {
                self.traverse(scene, FrameParent::Star(star), position, 0, &mut lists);
            }
        }

        tracing::trace!(
            "Built render lists: {} entries, {} orbits, {} labels",
            lists.entries.len(),
            lists.orbits.len(),
            lists.labels.len()
        );
        lists
    }

    fn add_star(&self, scene: &dyn SceneQuery, id: StarId, position: DVec3, lists: &mut RenderLists) {
        let Some(star) = scene.star(id) else {
            return;
        };
        let camera = self.observer.to_camera_space(position);
        let distance = camera.length();
        if astro::km_to_ly(distance) > self.settings.distance_limit as f64 {
            return;
        }

        let app_mag = astro::apparent_magnitude(star.abs_magnitude, distance, astro::KM_PER_PARSEC * 10.0);
        let disc_size = self.disc_size(star.radius, distance);
        let labeled = self.settings.label_flags.contains(LabelFlags::STAR);

        if self.frustum.test_sphere_f64(camera, star.radius) == Containment::Outside {
            return;
        }
        if !(disc_size >= 1.0 || app_mag <= self.settings.faintest_magnitude || labeled) {
            return;
        }

        lists.entries.push(RenderListEntry {
            renderable: Renderable::Star(id),
            position: camera.as_vec3(),
            distance: distance as f32,
            center_z: -camera.z as f32,
            near_z: 0.0,
            far_z: 0.0,
            radius: star.radius as f32,
            disc_size,
            app_mag,
            class: BodyClass::STELLAR,
        });

        if labeled && self.frustum.test_point(camera) == Containment::Inside {
            lists.labels.push(LabelCandidate {
                renderable: Renderable::Star(id),
                name: star.name.clone(),
                position: camera.as_vec3(),
                depth: -camera.z as f32,
                color: BodyClass::STELLAR.label_color(),
                disc_size,
            });
        }
    }

    fn add_star_orbit(&self, scene: &dyn SceneQuery, id: StarId, lists: &mut RenderLists) {
        let Some(orbit) = scene.star(id).and_then(|s| s.orbit) else {
            return;
        };
        let center = self.observer.to_camera_space(orbit.barycenter);
        if let Some(entry) = self.orbit_entry(Renderable::Star(id), BodyClass::STELLAR, center, orbit.radius) {
            lists.orbits.push(entry);
        }
    }

    fn orbit_entry(
        &self,
        renderable: Renderable,
        class: BodyClass,
        center: DVec3,
        radius: f64,
    ) -> Option<OrbitPathListEntry> {
        let distance = center.length();
        let size = if distance > radius {
            (radius / (distance * self.pixel_size)) as f32
        } else {
            f32::MAX
        };
        let min_size = self.settings.min_orbit_size;
        if size <= min_size {
            return None;
        }
        if self.frustum.test_sphere_f64(center, radius) == Containment::Outside {
            return None;
        }

        let opacity = if self
            .settings
            .render_flags
            .contains(RenderFlags::SHOW_FADING_ORBITS)
        {
            size_fade(size, min_size, 2.0)
        } else {
            1.0
        };

        Some(OrbitPathListEntry {
            renderable,
            origin: center.as_vec3(),
            center_z: -center.z as f32,
            radius: radius as f32,
            opacity,
            color: class.orbit_color(),
        })
    }

    fn disc_size(&self, radius: f64, distance: f64) -> f32 {
        if distance <= radius {
            f32::MAX
        } else {
            (radius / (distance * self.pixel_size)) as f32
        }
    }

    /// Walk one frame subtree whose origin sits at `frame_origin`.
    fn traverse(
        &self,
        scene: &dyn SceneQuery,
        parent: FrameParent,
        frame_origin: DVec3,
        depth: usize,
        lists: &mut RenderLists,
    ) {
        if depth > MAX_FRAME_DEPTH {
            tracing::debug!("Frame tree deeper than {}, pruning", MAX_FRAME_DEPTH);
            return;
        }

        let children = scene.frame_children(parent);
        if children.is_empty() {
            return;
        }

        let bounding_radius = scene.frame_bounding_radius(parent);
        let origin_camera = self.observer.to_camera_space(frame_origin);
        let distance_to_bound = origin_camera.length() - bounding_radius;
        if distance_to_bound > 0.0 {
            let max_size = bounding_radius / (distance_to_bound * self.pixel_size);
            if (max_size as f32) < self.settings.min_feature_size {
                return;
            }
        }
        if self
            .frustum
            .test_sphere_f64(origin_camera, bounding_radius)
            == Containment::Outside
        {
            return;
        }

        let t = self.observer.time;
        let show_orbits = self.settings.render_flags.contains(RenderFlags::SHOW_ORBITS);

        for &id in children {
            let (Some(body), Some(position)) = (scene.body(id), scene.body_position(id, t)) else {
                continue;
            };

            if show_orbits && self.settings.orbit_mask.intersects(body.class) {
                if let Some(radius) = body.orbit_radius {
                    if let Some(entry) =
                        self.orbit_entry(Renderable::Body(id), body.class, origin_camera, radius)
                    {
                        lists.orbits.push(entry);
                    }
                }
            }

            let camera = self.observer.to_camera_space(position);
            let distance = camera.length();
            let disc_size = self.disc_size(body.culling_radius, distance);
            let app_mag = astro::apparent_magnitude(body.abs_magnitude, distance, astro::KM_PER_AU);
            let labeled = self.label_classes.intersects(body.class);
            let point_visible = body.visible_as_point && app_mag <= self.settings.faintest_magnitude;

            let in_view = self.frustum.test_sphere_f64(camera, body.culling_radius) != Containment::Outside;
            if body.visible
                && in_view
                && self.visible_classes.intersects(body.class)
                && (disc_size >= 1.0 || point_visible || labeled)
            {
                lists.entries.push(RenderListEntry {
                    renderable: Renderable::Body(id),
                    position: camera.as_vec3(),
                    distance: distance as f32,
                    center_z: -camera.z as f32,
                    near_z: 0.0,
                    far_z: 0.0,
                    radius: body.culling_radius as f32,
                    disc_size,
                    app_mag,
                    class: body.class,
                });
            }

            if labeled && body.visible && self.frustum.test_point(camera) == Containment::Inside {
                lists.labels.push(LabelCandidate {
                    renderable: Renderable::Body(id),
                    name: body.name.clone(),
                    position: camera.as_vec3(),
                    depth: -camera.z as f32,
                    color: body.class.label_color(),
                    disc_size,
                });
            }

            self.traverse(scene, FrameParent::Body(id), position, depth + 1, lists);
        }
    }
}

/// Drop entries that lie entirely outside `frustum` and compute the depth
/// extents of the rest.
///
/// The near extent never drops below [`MIN_NEAR_PLANE_DISTANCE`] and is pushed
/// out so that `far_z / near_z` stays within [`MAX_FAR_NEAR_RATIO`].
pub fn remove_invisible_items(entries: &mut Vec<RenderListEntry>, frustum: &Frustum) {
    profile_function!();

    let before = entries.len();
    entries.retain_mut(|entry| {
        if frustum.test_sphere(entry.position, entry.radius) == Containment::Outside {
            return false;
        }

        let far_z = entry.center_z + entry.radius;
        if far_z <= 0.0 {
            return false;
        }
        let mut near_z = (entry.center_z - entry.radius).max(MIN_NEAR_PLANE_DISTANCE);
        if far_z / near_z > MAX_FAR_NEAR_RATIO {
            near_z = far_z / MAX_FAR_NEAR_RATIO;
        }

        entry.near_z = near_z;
        entry.far_z = far_z;
        true
    });

    if entries.len() != before {
        tracing::trace!("Removed {} invisible render list entries", before - entries.len());
    }
}
