//! Scene state: orbit camera, globals uniform, fog
//!
//! The camera orbits the tree: drag to rotate, scroll to zoom, with pitch
//! and distance clamped. While the tree is in chaos the camera slowly
//! auto-rotates.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::effects::tree_morph::srgb_to_linear;

const MIN_DISTANCE: f32 = 10.0;
const MAX_DISTANCE: f32 = 40.0;
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.05;
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 200.0;

pub const FOG_NEAR: f32 = 10.0;
pub const FOG_FAR: f32 = 50.0;

/// Per-frame uniform shared by every scene pipeline.
/// Field order and padding must match the WGSL `Globals` struct.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct Globals {
    pub view_proj: [[f32; 4]; 4],
    /// Camera right vector (xyz), w unused
    pub cam_right: [f32; 4],
    /// Camera up vector (xyz), w unused
    pub cam_up: [f32; 4],
    /// Camera position (xyz), w unused
    pub cam_pos: [f32; 4],
    /// Fog color (linear rgb), a unused
    pub fog_color: [f32; 4],
    /// x = fog near, y = fog far
    pub fog_params: [f32; 4],
    /// x = elapsed seconds
    pub time_params: [f32; 4],
}

/// Orbiting perspective camera
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub target: Vec3,
    pub fov_y: f32,
    /// Radians per second while auto-rotating
    pub auto_rotate_speed: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        // Start where the formed tree reads best: slightly above, pulled back
        Self {
            yaw: 0.0,
            pitch: 0.197,
            distance: 20.4,
            target: Vec3::ZERO,
            fov_y: 50f32.to_radians(),
            auto_rotate_speed: 0.05,
        }
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a mouse drag in physical pixels
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * 0.005;
        self.pitch = (self.pitch + dy * 0.005).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Apply a scroll delta in lines (positive zooms in)
    pub fn zoom(&mut self, lines: f32) {
        self.distance = (self.distance - lines * 1.5).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Advance auto-rotation
    pub fn update(&mut self, delta: f32, auto_rotate: bool) {
        if auto_rotate {
            self.yaw += self.auto_rotate_speed * delta;
        }
    }

    pub fn eye(&self) -> Vec3 {
        let dir = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        self.target + dir * self.distance
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye(), self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), NEAR_PLANE, FAR_PLANE);
        proj * view
    }

    /// Billboard basis for camera-facing sprites
    pub fn basis(&self) -> (Vec3, Vec3) {
        let forward = (self.target - self.eye()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        (right, up)
    }

    /// Build the per-frame uniform
    pub fn globals(&self, aspect: f32, time: f32) -> Globals {
        let (right, up) = self.basis();
        let eye = self.eye();
        let fog = srgb_to_linear([0.0, 0.02, 0.0]);
        Globals {
            view_proj: self.view_proj(aspect).to_cols_array_2d(),
            cam_right: [right.x, right.y, right.z, 0.0],
            cam_up: [up.x, up.y, up.z, 0.0],
            cam_pos: [eye.x, eye.y, eye.z, 0.0],
            fog_color: [fog[0], fog[1], fog[2], 1.0],
            fog_params: [FOG_NEAR, FOG_FAR, 0.0, 0.0],
            time_params: [time, 0.0, 0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_clamped() {
        let mut cam = OrbitCamera::new();
        cam.drag(0.0, 1e6);
        assert!(cam.pitch <= PITCH_LIMIT);
        cam.drag(0.0, -1e6);
        assert!(cam.pitch >= -PITCH_LIMIT);
    }

    #[test]
    fn test_distance_clamped() {
        let mut cam = OrbitCamera::new();
        cam.zoom(1e6);
        assert_eq!(cam.distance, MIN_DISTANCE);
        cam.zoom(-1e6);
        assert_eq!(cam.distance, MAX_DISTANCE);
    }

    #[test]
    fn test_auto_rotate_only_when_enabled() {
        let mut cam = OrbitCamera::new();
        let yaw = cam.yaw;
        cam.update(1.0, false);
        assert_eq!(cam.yaw, yaw);
        cam.update(1.0, true);
        assert!(cam.yaw > yaw);
    }

    #[test]
    fn test_eye_respects_distance() {
        let cam = OrbitCamera::new();
        let eye = cam.eye();
        assert!((eye.distance(cam.target) - cam.distance).abs() < 1e-3);
    }

    #[test]
    fn test_view_proj_finite() {
        let cam = OrbitCamera::new();
        let vp = cam.view_proj(16.0 / 9.0);
        for col in vp.to_cols_array() {
            assert!(col.is_finite());
        }
        // Degenerate aspect must not poison the matrix
        let vp = cam.view_proj(0.0);
        for col in vp.to_cols_array() {
            assert!(col.is_finite());
        }
    }

    #[test]
    fn test_globals_size() {
        assert_eq!(std::mem::size_of::<Globals>(), 160);
    }

    #[test]
    fn test_basis_orthonormal() {
        let cam = OrbitCamera::new();
        let (right, up) = cam.basis();
        assert!((right.length() - 1.0).abs() < 1e-4);
        assert!((up.length() - 1.0).abs() < 1e-4);
        assert!(right.dot(up).abs() < 1e-4);
    }
}
