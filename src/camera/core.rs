use glam::{Mat4, Vec3};

/// Default translation speed in world units per second.
pub const DEFAULT_SPEED: f32 = 6.0;

/// Default mouse-look sensitivity in degrees per pixel of mouse delta.
pub const DEFAULT_SENSITIVITY: f32 = 0.1;

/// Pitch is clamped strictly inside ±90°: at the poles the forward vector
/// becomes parallel to `world_up` and the cross-product basis degenerates.
const PITCH_LIMIT_DEG: f32 = 89.0;

/// Discrete movement commands consumed by [`Camera::process_keyboard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraMovement {
    /// Translate along the forward direction.
    Forward,
    /// Translate against the forward direction.
    Backward,
    /// Translate against the right vector.
    Left,
    /// Translate along the right vector.
    Right,
    /// Translate along the local up vector.
    Up,
    /// Translate against the local up vector.
    Down,
}

/// Free-flying first-person camera.
///
/// Orientation is stored as yaw/pitch Euler angles in degrees. The local
/// orthonormal basis (`direction`, `right`, `up`) is never integrated
/// incrementally — it is rebuilt from the angles on every orientation
/// change, so repeated small updates cannot accumulate drift and the
/// basis is exactly orthonormal whenever a caller can observe it.
///
/// [`process_mouse`](Self::process_mouse) is the only entry point that
/// changes orientation; [`process_keyboard`](Self::process_keyboard) only
/// translates [`position`](Self::position).
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye position in world space.
    pub position: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    direction: Vec3,
    right: Vec3,
    up: Vec3,
    speed: f32,
    sensitivity: f32,
}

impl Default for Camera {
    /// Origin, +Y world up, yaw −90° / pitch 0° — looking down −Z.
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Y, -90.0, 0.0)
    }
}

impl Camera {
    /// Create a camera at `position` with the given world-up reference and
    /// initial yaw/pitch in degrees.
    ///
    /// The basis is derived immediately, so the instance is usable without
    /// a separate initialization step. A `world_up` parallel to the derived
    /// forward direction is a caller contract violation and is not checked.
    #[must_use]
    pub fn new(position: Vec3, world_up: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            world_up,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG),
            direction: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            speed: DEFAULT_SPEED,
            sensitivity: DEFAULT_SENSITIVITY,
        };
        camera.update_basis();
        camera
    }

    /// Right-handed look-at view matrix from `position` toward
    /// `position + direction`.
    ///
    /// Pure read; calling it twice with no intervening state change
    /// returns bit-identical results.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.direction, self.up)
    }

    /// Translate the camera along its local basis.
    ///
    /// Moves `delta_time * speed` world units along `direction`
    /// (forward/backward), `right` (left/right), or `up` (up/down).
    /// Orientation and the basis are untouched.
    pub fn process_keyboard(&mut self, movement: CameraMovement, delta_time: f32) {
        let step = delta_time * self.speed;
        match movement {
            CameraMovement::Forward => self.position += self.direction * step,
            CameraMovement::Backward => self.position -= self.direction * step,
            CameraMovement::Left => self.position -= self.right * step,
            CameraMovement::Right => self.position += self.right * step,
            CameraMovement::Up => self.position += self.up * step,
            CameraMovement::Down => self.position -= self.up * step,
        }
    }

    /// Apply a mouse-look delta in pixels.
    ///
    /// Both deltas are scaled by the sensitivity constant, added to
    /// yaw/pitch, and pitch is hard-clamped to ±89° before the basis is
    /// rebuilt. This is the only orientation entry point.
    pub fn process_mouse(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw += delta_x * self.sensitivity;
        self.pitch = (self.pitch + delta_y * self.sensitivity)
            .clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);
        self.update_basis();
    }

    /// Rebuild the orthonormal basis from yaw/pitch.
    ///
    /// Spherical-to-Cartesian for the forward vector, then two normalized
    /// cross products. Re-deriving `right`/`up` from scratch (instead of
    /// rotating them) keeps the basis exactly orthonormal every frame.
    fn update_basis(&mut self) {
        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        let direction = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        self.direction = direction.normalize();
        self.right = self.direction.cross(self.world_up).normalize();
        self.up = self.right.cross(self.direction).normalize();
    }

    /// Yaw angle in degrees (unconstrained).
    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch angle in degrees, always within [−89, 89].
    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Unit forward vector.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Unit right vector.
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Unit local up vector.
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// World-up reference supplied at construction.
    #[must_use]
    pub fn world_up(&self) -> Vec3 {
        self.world_up
    }

    /// Translation speed in world units per second.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Override the translation speed.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Mouse-look sensitivity in degrees per pixel.
    #[must_use]
    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// Override the mouse-look sensitivity.
    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unit(v: Vec3) {
        assert!(
            (v.length() - 1.0).abs() < 1e-5,
            "expected unit vector, got length {}",
            v.length()
        );
    }

    fn assert_orthonormal(camera: &Camera) {
        let d = camera.direction();
        let r = camera.right();
        let u = camera.up();
        assert_unit(d);
        assert_unit(r);
        assert_unit(u);
        assert!(d.dot(r).abs() < 1e-5);
        assert!(d.dot(u).abs() < 1e-5);
        assert!(r.dot(u).abs() < 1e-5);
        // Right-handedness: cross(right, direction) points along up.
        let rebuilt_up = r.cross(d);
        assert!((rebuilt_up - u).length() < 1e-5);
    }

    #[test]
    fn default_looks_down_negative_z() {
        let camera = Camera::default();
        assert_eq!(camera.position, Vec3::ZERO);
        assert!((camera.direction() - Vec3::NEG_Z).length() < 1e-6);
        assert_orthonormal(&camera);
    }

    #[test]
    fn basis_orthonormal_after_construction_and_mouse() {
        let angles = [
            (-90.0, 0.0),
            (0.0, 45.0),
            (135.0, -60.0),
            (720.0, 88.0),
            (-270.0, -88.0),
        ];
        for (yaw, pitch) in angles {
            let camera = Camera::new(Vec3::ZERO, Vec3::Y, yaw, pitch);
            assert_orthonormal(&camera);
        }

        let mut camera = Camera::default();
        for i in 0..200 {
            let dx = ((i * 37) % 113) as f32 - 56.0;
            let dy = ((i * 53) % 97) as f32 - 48.0;
            camera.process_mouse(dx, dy);
            assert_orthonormal(&camera);
        }
    }

    #[test]
    fn pitch_never_leaves_clamp_range() {
        let mut camera = Camera::default();
        for i in 0..500 {
            // Alternating large deltas, biased upward.
            let dy = if i % 3 == 0 { -4000.0 } else { 2500.0 };
            camera.process_mouse(10.0, dy);
            assert!(camera.pitch() >= -89.0 && camera.pitch() <= 89.0);
        }
    }

    #[test]
    fn pitch_clamps_exactly_without_overshoot() {
        let mut camera = Camera::new(Vec3::ZERO, Vec3::Y, -90.0, 85.0);
        camera.process_mouse(0.0, 1000.0);
        assert_eq!(camera.pitch(), 89.0);

        camera.process_mouse(0.0, -100_000.0);
        assert_eq!(camera.pitch(), -89.0);
    }

    #[test]
    fn view_matrix_is_idempotent() {
        let camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Y, -35.0, 20.0);
        let a = camera.view_matrix().to_cols_array();
        let b = camera.view_matrix().to_cols_array();
        assert_eq!(a, b);
    }

    #[test]
    fn forward_movement_covers_speed_times_delta() {
        let mut camera = Camera::default();
        camera.process_keyboard(CameraMovement::Forward, 1.0);
        assert!((camera.position - Vec3::new(0.0, 0.0, -6.0)).length() < 1e-4);
    }

    #[test]
    fn movement_uses_local_basis_with_reference_signs() {
        let mut camera = Camera::default();
        camera.process_keyboard(CameraMovement::Right, 0.5);
        assert!((camera.position - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-4);

        let mut camera = Camera::default();
        camera.process_keyboard(CameraMovement::Left, 0.5);
        assert!((camera.position - Vec3::new(-3.0, 0.0, 0.0)).length() < 1e-4);

        let mut camera = Camera::default();
        camera.process_keyboard(CameraMovement::Up, 1.0);
        assert!((camera.position - Vec3::new(0.0, 6.0, 0.0)).length() < 1e-4);

        let mut camera = Camera::default();
        camera.process_keyboard(CameraMovement::Down, 1.0);
        assert!((camera.position - Vec3::new(0.0, -6.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn movement_leaves_orientation_untouched() {
        let mut camera = Camera::default();
        let before = (camera.yaw(), camera.pitch(), camera.direction());
        camera.process_keyboard(CameraMovement::Backward, 2.5);
        assert_eq!(before, (camera.yaw(), camera.pitch(), camera.direction()));
    }

    #[test]
    fn mouse_delta_yaws_by_sensitivity() {
        let mut camera = Camera::default();
        camera.process_mouse(10.0, 0.0);
        assert!((camera.yaw() - -89.0).abs() < 1e-5);

        let yaw = (-89.0f32).to_radians();
        let expected = Vec3::new(yaw.cos(), 0.0, yaw.sin()).normalize();
        assert!((camera.direction() - expected).length() < 1e-5);
    }

    #[test]
    fn custom_speed_and_sensitivity_apply() {
        let mut camera = Camera::default();
        camera.set_speed(2.0);
        camera.set_sensitivity(1.0);
        camera.process_keyboard(CameraMovement::Forward, 1.0);
        assert!((camera.position.z - -2.0).abs() < 1e-5);
        camera.process_mouse(5.0, 0.0);
        assert!((camera.yaw() - -85.0).abs() < 1e-5);
    }
}
