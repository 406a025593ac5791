//! Observer state and view parameters.

use crate::frustum::Frustum;
use glam::{DQuat, DVec3, Mat4, Vec3};

/// Where the camera is, which way it looks, and when.
///
/// `orientation` rotates camera space into universal space. The camera looks
/// down its local `-Z` axis with `+Y` up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub position: DVec3,
    pub orientation: DQuat,
    /// Simulation time in days.
    pub time: f64,
}

impl Default for Observer {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
            time: 0.0,
        }
    }
}

impl Observer {
    pub fn new(position: DVec3, orientation: DQuat, time: f64) -> Self {
        Self {
            position,
            orientation,
            time,
        }
    }

    /// Observer at `position` looking at `target`.
    pub fn looking_at(position: DVec3, target: DVec3, up: DVec3, time: f64) -> Self {
        let forward = (target - position).normalize_or(DVec3::NEG_Z);
        let right = forward.cross(up).normalize_or(DVec3::X);
        let true_up = right.cross(forward);
        let basis = glam::DMat3::from_cols(right, true_up, -forward);
        Self::new(position, DQuat::from_mat3(&basis), time)
    }

    /// Map a universal position into camera space.
    pub fn to_camera_space(&self, p: DVec3) -> DVec3 {
        self.orientation.conjugate() * (p - self.position)
    }

    /// Camera space position in single precision.
    pub fn to_camera_space_f32(&self, p: DVec3) -> Vec3 {
        self.to_camera_space(p).as_vec3()
    }
}

/// Projection parameters of the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParams {
    /// Vertical field of view in radians.
    pub fov_y: f64,
    pub width: u32,
    pub height: u32,
}

impl ViewParams {
    pub fn new(fov_y: f64, width: u32, height: u32) -> Self {
        Self {
            fov_y,
            width,
            height,
        }
    }

    pub fn aspect(&self) -> f64 {
        self.width.max(1) as f64 / self.height.max(1) as f64
    }

    /// Angle subtended by one pixel, in radians.
    pub fn pixel_size(&self) -> f64 {
        2.0 * (self.fov_y / 2.0).tan() / self.height.max(1) as f64
    }

    /// Culling frustum without a far plane.
    pub fn frustum(&self, near: f64) -> Frustum {
        Frustum::new(self.fov_y, self.aspect(), near)
    }

    /// Right-handed perspective projection with `[0, 1]` depth.
    pub fn projection(&self, near: f32, far: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y as f32, self.aspect() as f32, near, far)
    }

    /// Pixel space projection with the origin at the bottom-left corner.
    pub fn ortho_2d(&self) -> Mat4 {
        Mat4::orthographic_rh(0.0, self.width as f32, 0.0, self.height as f32, -1.0, 1.0)
    }

    /// Project a camera space point to window pixels (origin bottom-left).
    /// Returns `None` for points behind the camera.
    pub fn project(&self, camera_pos: Vec3) -> Option<Vec3> {
        if camera_pos.z >= 0.0 {
            return None;
        }
        let depth = -camera_pos.z;
        let scale = (self.height as f64 / 2.0 / (self.fov_y / 2.0).tan()) as f32;
        Some(Vec3::new(
            self.width as f32 / 2.0 + camera_pos.x / depth * scale,
            self.height as f32 / 2.0 + camera_pos.y / depth * scale,
            depth,
        ))
    }
}
