// Damped free-orbit camera.
//
// Camera model:
//   - A `target` point in space the camera looks at
//   - `position` orbits the target on a sphere: drag rotates, wheel dollies
//   - Input feeds angular/zoom velocities that decay each frame, so motion
//     eases out instead of stopping dead
//   - The director (locked focus, cruise) moves `position`/`target` directly;
//     orbit parameters are re-derived from the offset every frame, so hand
//     control resumes exactly where the autopilot left the camera

use glam::{Mat4, Vec2, Vec3};

use super::input::InputState;

/// Keeps the orbit off the poles so the up vector never flips.
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

pub struct OrbitCamera {
    pub position: Vec3,
    pub target: Vec3,

    /// Pending yaw/pitch change in radians, decayed by damping each frame.
    rotate_velocity: Vec2,
    /// Pending dolly factor, decayed alongside.
    zoom_velocity: f32,

    /// Radians of rotation per pixel of drag.
    pub rotate_speed: f32,
    /// Fractional distance change per scroll line.
    pub zoom_speed: f32,
    /// Fraction of velocity shed per frame at 60 fps. 0.05 reads as light easing.
    pub damping: f32,

    pub min_distance: f32,
    pub max_distance: f32,

    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 45.0),
            target: Vec3::ZERO,
            rotate_velocity: Vec2::ZERO,
            zoom_velocity: 0.0,
            rotate_speed: 0.005,
            zoom_speed: 0.05,
            damping: 0.05,
            min_distance: 1.0,
            max_distance: 200.0,
            fov: 60.0_f32.to_radians(),
            near: 0.1,
            far: 2000.0,
        }
    }

    /// Accumulate drag/wheel input for this frame. `allow_rotate` is false
    /// while the camera is locked onto a star — zooming stays live so the
    /// user can frame the star, rotation does not fight the lock.
    pub fn feed_input(&mut self, input: &InputState, allow_rotate: bool) {
        if allow_rotate && input.is_left_held() {
            let (dx, dy) = input.mouse_delta;
            self.rotate_velocity += Vec2::new(dx, dy) * self.rotate_speed;
        }
        self.zoom_velocity += input.scroll_delta * self.zoom_speed;
    }

    /// Apply pending velocities and decay them. Call once per frame.
    pub fn update(&mut self, dt: f32) {
        let offset = self.position - self.target;
        let distance = offset.length().max(1e-4);

        // Spherical coordinates of the offset around the target.
        let mut yaw = offset.x.atan2(offset.z);
        let mut pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();

        yaw -= self.rotate_velocity.x;
        pitch = (pitch + self.rotate_velocity.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let new_distance = (distance * (1.0 - self.zoom_velocity))
            .clamp(self.min_distance, self.max_distance);

        self.position = self.target
            + Vec3::new(
                pitch.cos() * yaw.sin(),
                pitch.sin(),
                pitch.cos() * yaw.cos(),
            ) * new_distance;

        // Frame-rate independent exponential decay.
        let retain = (1.0 - self.damping).powf(dt * 60.0);
        self.rotate_velocity *= retain;
        self.zoom_velocity *= retain;
    }

    /// Unit vector from the camera toward its look target. Falls back to
    /// "forward" when the two coincide.
    pub fn facing(&self) -> Vec3 {
        let dir = self.target - self.position;
        if dir.length_squared() > 1e-8 {
            dir.normalize()
        } else {
            Vec3::NEG_Z
        }
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    /// Combined view-projection matrix ready to upload to the GPU.
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Camera-space right and up axes, used to billboard sprites.
    pub fn billboard_axes(&self) -> (Vec3, Vec3) {
        let view = self.view_matrix();
        // Rows of the view rotation are the camera basis vectors.
        let right = Vec3::new(view.x_axis.x, view.y_axis.x, view.z_axis.x);
        let up = Vec3::new(view.x_axis.y, view.y_axis.y, view.z_axis.y);
        (right, up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_is_unit_toward_target() {
        let mut cam = OrbitCamera::new();
        cam.position = Vec3::new(0.0, 0.0, 10.0);
        cam.target = Vec3::ZERO;
        let f = cam.facing();
        assert!((f - Vec3::NEG_Z).length() < 1e-5);
        assert!((f.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn degenerate_facing_falls_back_to_forward() {
        let mut cam = OrbitCamera::new();
        cam.position = Vec3::ONE;
        cam.target = Vec3::ONE;
        assert_eq!(cam.facing(), Vec3::NEG_Z);
    }

    #[test]
    fn update_without_input_keeps_pose() {
        let mut cam = OrbitCamera::new();
        let pos = cam.position;
        let tgt = cam.target;
        for _ in 0..120 {
            cam.update(1.0 / 60.0);
        }
        assert!((cam.position - pos).length() < 1e-3);
        assert_eq!(cam.target, tgt);
    }

    #[test]
    fn pitch_never_reaches_the_pole() {
        let mut cam = OrbitCamera::new();
        for _ in 0..600 {
            cam.rotate_velocity = Vec2::new(0.0, 0.2);
            cam.update(1.0 / 60.0);
        }
        let offset = cam.position - cam.target;
        let pitch = (offset.y / offset.length()).asin();
        assert!(pitch <= PITCH_LIMIT + 1e-4);
    }

    #[test]
    fn zoom_respects_distance_clamp() {
        let mut cam = OrbitCamera::new();
        for _ in 0..600 {
            cam.zoom_velocity = 0.5;
            cam.update(1.0 / 60.0);
        }
        assert!(cam.distance() >= cam.min_distance - 1e-3);

        for _ in 0..600 {
            cam.zoom_velocity = -0.5;
            cam.update(1.0 / 60.0);
        }
        assert!(cam.distance() <= cam.max_distance + 1e-3);
    }
}
