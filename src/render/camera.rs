use glam::{Mat4, Vec3};

pub const MIN_DISTANCE: f32 = 2.0;
pub const MAX_DISTANCE: f32 = 10.0;

/// Orbit camera circling a fixed target. Yaw 0 / pitch 0 looks down -Z.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 5.0)
    }
}

impl OrbitCamera {
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            distance: distance.clamp(MIN_DISTANCE, MAX_DISTANCE),
            yaw: 0.0,
            pitch: 0.0,
            fov_y: 40f32.to_radians(),
        }
    }

    pub fn eye(&self) -> Vec3 {
        let cos_pitch = self.pitch.cos();
        let offset = Vec3::new(
            self.yaw.sin() * cos_pitch,
            self.pitch.sin(),
            self.yaw.cos() * cos_pitch,
        );
        self.target + offset * self.distance
    }

    pub fn orbit(&mut self, yaw_delta: f32, pitch_delta: f32) {
        const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
        self.yaw += yaw_delta;
        if self.yaw.is_finite() {
            self.yaw = (self.yaw + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU)
                - std::f32::consts::PI;
        }
        self.pitch = (self.pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Positive `delta` moves closer.
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), 0.1, 200.0)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_eye_sits_on_the_z_axis() {
        let camera = OrbitCamera::default();
        assert!((camera.eye() - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn zoom_stays_within_limits() {
        let mut camera = OrbitCamera::default();
        camera.zoom(100.0);
        assert_eq!(camera.distance, MIN_DISTANCE);
        camera.zoom(-100.0);
        assert_eq!(camera.distance, MAX_DISTANCE);
    }

    #[test]
    fn orbit_keeps_distance_and_finite_angles() {
        let mut camera = OrbitCamera::default();
        camera.orbit(7.0, 3.0);
        assert!(camera.yaw.is_finite() && camera.yaw.abs() <= std::f32::consts::PI);
        assert!(camera.pitch < std::f32::consts::FRAC_PI_2);
        assert!(((camera.eye() - camera.target).length() - camera.distance).abs() < 1e-4);
    }
}
