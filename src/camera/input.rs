use glam::Vec2;
use winit::event::{DeviceEvent, ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::core::{Camera, CameraMovement};

/// Movement bindings in [`CameraMovement`] order.
const MOVEMENTS: [CameraMovement; 6] = [
    CameraMovement::Forward,
    CameraMovement::Backward,
    CameraMovement::Left,
    CameraMovement::Right,
    CameraMovement::Up,
    CameraMovement::Down,
];

/// Accumulates winit input between frames and applies it to a [`Camera`].
///
/// The event loop feeds window and device events in as they arrive; the
/// render loop calls [`apply`](Self::apply) once per frame with the
/// frame's delta time. Held movement keys translate continuously; raw
/// mouse motion turns into one mouse-look call per frame.
///
/// ```ignore
/// // In the event loop:
/// let _ = input.handle_window_event(&event);
/// // Once per frame:
/// input.apply(&mut camera, clock.tick());
/// ```
#[derive(Debug, Default)]
pub struct CameraInput {
    pressed: [bool; 6],
    mouse_delta: Vec2,
    invert_y: bool,
}

impl CameraInput {
    /// New tracker with no keys held and no pending mouse motion.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the sign of vertical mouse-look (off by default, which means
    /// moving the mouse up pitches the camera up).
    pub fn set_invert_y(&mut self, invert: bool) {
        self.invert_y = invert;
    }

    /// Track a window event. Returns `true` if the event was consumed.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => self.handle_key(*code, *state == ElementState::Pressed),
            WindowEvent::Focused(false) => {
                // Key releases are lost while unfocused; drop held state.
                self.pressed = [false; 6];
                false
            }
            _ => false,
        }
    }

    /// Track a device event (raw mouse motion, unaffected by cursor
    /// clipping). Returns `true` if the event was consumed.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) -> bool {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.mouse_delta += Vec2::new(delta.0 as f32, delta.1 as f32);
            true
        } else {
            false
        }
    }

    /// Apply held keys and pending mouse motion to the camera, then clear
    /// the accumulated mouse delta.
    pub fn apply(&mut self, camera: &mut Camera, delta_time: f32) {
        for (held, movement) in self.pressed.iter().zip(MOVEMENTS) {
            if *held {
                camera.process_keyboard(movement, delta_time);
            }
        }

        if self.mouse_delta != Vec2::ZERO {
            // Window coordinates grow downward; pitch grows upward.
            let sign = if self.invert_y { 1.0 } else { -1.0 };
            camera.process_mouse(self.mouse_delta.x, self.mouse_delta.y * sign);
            self.mouse_delta = Vec2::ZERO;
        }
    }

    fn handle_key(&mut self, code: KeyCode, pressed: bool) -> bool {
        let movement = match code {
            KeyCode::KeyW | KeyCode::ArrowUp => CameraMovement::Forward,
            KeyCode::KeyS | KeyCode::ArrowDown => CameraMovement::Backward,
            KeyCode::KeyA | KeyCode::ArrowLeft => CameraMovement::Left,
            KeyCode::KeyD | KeyCode::ArrowRight => CameraMovement::Right,
            KeyCode::Space => CameraMovement::Up,
            KeyCode::ShiftLeft => CameraMovement::Down,
            _ => return false,
        };
        self.pressed[movement_index(movement)] = pressed;
        true
    }
}

fn movement_index(movement: CameraMovement) -> usize {
    match movement {
        CameraMovement::Forward => 0,
        CameraMovement::Backward => 1,
        CameraMovement::Left => 2,
        CameraMovement::Right => 3,
        CameraMovement::Up => 4,
        CameraMovement::Down => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn held_key_translates_each_frame() {
        let mut input = CameraInput::new();
        let mut camera = Camera::default();
        assert!(input.handle_key(KeyCode::KeyW, true));

        input.apply(&mut camera, 0.5);
        input.apply(&mut camera, 0.5);
        assert!((camera.position - Vec3::new(0.0, 0.0, -6.0)).length() < 1e-4);

        assert!(input.handle_key(KeyCode::KeyW, false));
        input.apply(&mut camera, 1.0);
        assert!((camera.position - Vec3::new(0.0, 0.0, -6.0)).length() < 1e-4);
    }

    #[test]
    fn unbound_key_is_ignored() {
        let mut input = CameraInput::new();
        assert!(!input.handle_key(KeyCode::KeyZ, true));
    }

    #[test]
    fn mouse_delta_drains_on_apply() {
        let mut input = CameraInput::new();
        let mut camera = Camera::default();
        assert!(input.handle_device_event(&DeviceEvent::MouseMotion { delta: (10.0, 0.0) }));

        input.apply(&mut camera, 0.016);
        assert!((camera.yaw() - -89.0).abs() < 1e-5);

        // Drained: a second apply does not turn further.
        input.apply(&mut camera, 0.016);
        assert!((camera.yaw() - -89.0).abs() < 1e-5);
    }

    #[test]
    fn vertical_motion_pitches_up_by_default() {
        let mut input = CameraInput::new();
        let mut camera = Camera::default();
        let _ = input.handle_device_event(&DeviceEvent::MouseMotion { delta: (0.0, -10.0) });
        input.apply(&mut camera, 0.016);
        assert!(camera.pitch() > 0.0);

        let mut inverted = CameraInput::new();
        inverted.set_invert_y(true);
        let mut camera = Camera::default();
        let _ = inverted.handle_device_event(&DeviceEvent::MouseMotion { delta: (0.0, -10.0) });
        inverted.apply(&mut camera, 0.016);
        assert!(camera.pitch() < 0.0);
    }
}
