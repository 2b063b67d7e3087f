// src/engine_lib/controller.rs

use glam::Vec3;
use log::{info, warn};
use winit::{
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window},
};

use crate::engine_lib::pose::WORLD_UP;
use crate::engine_lib::scene_logic::update_observer_in_scene;
use crate::engine_lib::scene_types::{Scene, StepOutcome};

/// Arrow-key look rate, degrees per second.
const KEYBOARD_LOOK_SPEED_DEG: f32 = 90.0;

/// Turns window input into observer motion. Key state is held between events; the actual
/// move happens once per frame in [`CameraController::apply_to_scene`].
pub struct CameraController {
    /// x: right, y: world up, z: forward. Each component is -1, 0 or 1.
    pub move_input: Vec3,
    pub yaw_input_keyboard: f32,
    pub pitch_input_keyboard: f32,

    pub mouse_dx_accum: f32,
    pub mouse_dy_accum: f32,

    /// Degrees per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    pub cursor_grabbed: bool,
    distortion_enabled: bool,
}

impl CameraController {
    pub fn new(initial_grab: bool, sensitivity: f32, distortion_enabled: bool) -> Self {
        Self {
            move_input: Vec3::ZERO,
            yaw_input_keyboard: 0.0,
            pitch_input_keyboard: 0.0,
            mouse_dx_accum: 0.0,
            mouse_dy_accum: 0.0,
            mouse_sensitivity: sensitivity,
            cursor_grabbed: initial_grab,
            distortion_enabled,
        }
    }

    pub fn distortion_enabled(&self) -> bool {
        self.distortion_enabled
    }

    pub fn toggle_distortion(&mut self) {
        self.distortion_enabled = !self.distortion_enabled;
        info!(
            "Scene distortion {}",
            if self.distortion_enabled { "enabled" } else { "disabled" }
        );
    }

    /// Updates held-key state. Returns `true` if the key is bound.
    pub fn process_key(&mut self, code: KeyCode, pressed: bool) -> bool {
        let axis = if pressed { 1.0 } else { 0.0 };
        match code {
            KeyCode::KeyW => self.move_input.z = axis,
            KeyCode::KeyS => self.move_input.z = -axis,
            KeyCode::KeyA => self.move_input.x = -axis,
            KeyCode::KeyD => self.move_input.x = axis,
            KeyCode::Space => self.move_input.y = axis,
            KeyCode::ControlLeft | KeyCode::ShiftLeft => self.move_input.y = -axis,
            KeyCode::ArrowLeft => self.yaw_input_keyboard = -axis,
            KeyCode::ArrowRight => self.yaw_input_keyboard = axis,
            KeyCode::ArrowUp => self.pitch_input_keyboard = axis,
            KeyCode::ArrowDown => self.pitch_input_keyboard = -axis,
            KeyCode::KeyN => {
                if pressed {
                    self.toggle_distortion();
                }
            }
            _ => return false,
        }
        true
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent, window: &Window) -> bool {
        match event {
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                let pressed = key_event.state == ElementState::Pressed;
                let PhysicalKey::Code(code) = key_event.physical_key else {
                    return false;
                };
                if code == KeyCode::Escape {
                    if pressed {
                        self.toggle_cursor_grab(window);
                    }
                    return true;
                }
                // held keys auto-repeat; only the first press may toggle
                if key_event.repeat && code == KeyCode::KeyN {
                    return true;
                }
                self.process_key(code, pressed)
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if !self.cursor_grabbed && *state == ElementState::Pressed && *button == MouseButton::Left {
                    self.grab_cursor(window, true);
                    return true;
                }
                false
            }
            WindowEvent::Focused(focused) => {
                if !*focused && self.cursor_grabbed {
                    self.grab_cursor(window, false);
                }
                false
            }
            _ => false,
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if !self.cursor_grabbed {
            self.mouse_dx_accum = 0.0;
            self.mouse_dy_accum = 0.0;
            return;
        }
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.mouse_dx_accum += *dx as f32;
            self.mouse_dy_accum += *dy as f32;
        }
    }

    pub fn toggle_cursor_grab(&mut self, window: &Window) {
        self.grab_cursor(window, !self.cursor_grabbed);
    }

    fn grab_cursor(&mut self, window: &Window, grab: bool) {
        if grab == self.cursor_grabbed {
            return;
        }
        if grab {
            if window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_e| window.set_cursor_grab(CursorGrabMode::Locked))
                .is_ok()
            {
                window.set_cursor_visible(false);
                self.cursor_grabbed = true;
            } else {
                warn!("Could not grab cursor");
            }
        } else if window.set_cursor_grab(CursorGrabMode::None).is_ok() {
            window.set_cursor_visible(true);
            self.cursor_grabbed = false;
            self.mouse_dx_accum = 0.0;
            self.mouse_dy_accum = 0.0;
        } else {
            warn!("Could not release cursor");
        }
    }

    /// Drains accumulated look input into (yaw, pitch) deltas in degrees.
    /// Mouse right turns right; mouse down looks down.
    pub fn take_look_delta(&mut self, dt: f32) -> (f32, f32) {
        let keyboard = KEYBOARD_LOOK_SPEED_DEG * dt;
        let yaw = self.mouse_dx_accum * self.mouse_sensitivity + self.yaw_input_keyboard * keyboard;
        let pitch = -self.mouse_dy_accum * self.mouse_sensitivity + self.pitch_input_keyboard * keyboard;
        self.mouse_dx_accum = 0.0;
        self.mouse_dy_accum = 0.0;
        (yaw, pitch)
    }

    /// World-space displacement for this frame. Horizontal keys follow the camera's own front
    /// and right, vertical keys follow world up.
    pub fn displacement(&self, front: Vec3, right: Vec3, speed: f32, dt: f32) -> Vec3 {
        let step = speed * dt;
        (front * self.move_input.z + right * self.move_input.x + WORLD_UP * self.move_input.y) * step
    }

    /// One simulation step: look, then move with the observer's scaled speed, then the
    /// crossing check.
    pub fn apply_to_scene(&mut self, scene: &mut Scene, dt: f32) -> StepOutcome {
        let (yaw, pitch) = self.take_look_delta(dt);
        if yaw != 0.0 || pitch != 0.0 {
            scene.observer.rotate(yaw, pitch);
        }

        let speed = scene.locomotion.speed(&scene.observer);
        let delta = self.displacement(scene.observer.front(), scene.observer.right(), speed, dt);
        if delta == Vec3::ZERO {
            return StepOutcome::Moved;
        }
        let target = scene.observer.position() + delta;
        update_observer_in_scene(scene, target)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use winit::keyboard::KeyCode;

    use super::CameraController;
    use crate::engine_lib::portal::{PortalDefinition, PortalTable};
    use crate::engine_lib::pose::ObserverPose;
    use crate::engine_lib::scene_types::{Locomotion, Scene, StepOutcome};

    const EPS: f32 = 1e-5;

    fn scene_at(position: Vec3, scale: f32) -> Scene {
        Scene {
            portals: PortalTable::new(),
            observer: ObserverPose::new(position, -90.0, 0.0).with_scale(scale),
            locomotion: Locomotion { base_speed: 2.0, base_collision_radius: 0.5 },
            props: Vec::new(),
        }
    }

    #[test]
    fn keys_set_and_clear_axes() {
        let mut controller = CameraController::new(false, 0.1, true);
        assert!(controller.process_key(KeyCode::KeyW, true));
        assert!(controller.process_key(KeyCode::KeyA, true));
        assert_eq!(controller.move_input, Vec3::new(-1.0, 0.0, 1.0));
        controller.process_key(KeyCode::KeyW, false);
        assert_eq!(controller.move_input, Vec3::new(-1.0, 0.0, 0.0));
        assert!(!controller.process_key(KeyCode::KeyQ, true));
    }

    #[test]
    fn n_toggles_distortion_on_press_only() {
        let mut controller = CameraController::new(false, 0.1, true);
        controller.process_key(KeyCode::KeyN, true);
        assert!(!controller.distortion_enabled());
        controller.process_key(KeyCode::KeyN, false);
        assert!(!controller.distortion_enabled());
        controller.process_key(KeyCode::KeyN, true);
        assert!(controller.distortion_enabled());
    }

    #[test]
    fn look_delta_drains_mouse_accumulators() {
        let mut controller = CameraController::new(true, 0.1, true);
        controller.mouse_dx_accum = 10.0;
        controller.mouse_dy_accum = 20.0;
        let (yaw, pitch) = controller.take_look_delta(0.016);
        assert!((yaw - 1.0).abs() < EPS);
        assert!((pitch + 2.0).abs() < EPS);
        assert_eq!(controller.take_look_delta(0.016), (0.0, 0.0));
    }

    #[test]
    fn movement_uses_scaled_speed() {
        let mut controller = CameraController::new(false, 0.1, true);
        controller.process_key(KeyCode::KeyW, true);

        let mut normal = scene_at(Vec3::ZERO, 1.0);
        controller.apply_to_scene(&mut normal, 0.5);
        assert!((normal.observer.position() - Vec3::new(0.0, 0.0, -1.0)).length() < EPS);

        let mut tiny = scene_at(Vec3::ZERO, 0.2);
        controller.apply_to_scene(&mut tiny, 0.5);
        assert!((tiny.observer.position() - Vec3::new(0.0, 0.0, -0.2)).length() < EPS);
    }

    #[test]
    fn vertical_keys_follow_world_up() {
        let mut controller = CameraController::new(false, 0.1, true);
        controller.process_key(KeyCode::Space, true);
        let front = Vec3::new(0.0, 0.7071, -0.7071);
        let delta = controller.displacement(front, Vec3::X, 2.0, 1.0);
        assert_eq!(delta, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn walking_into_a_portal_reports_transit() {
        let mut scene = scene_at(Vec3::new(0.0, 1.5, 0.2), 1.0);
        let a = scene
            .portals
            .insert(&PortalDefinition::new(Vec3::new(0.0, 1.5, 0.0), Vec3::Z, Vec3::Y, 2.5, 4.0))
            .unwrap();
        let b = scene
            .portals
            .insert(&PortalDefinition::new(Vec3::new(20.0, 1.5, -8.0), Vec3::Z, Vec3::Y, 2.5, 4.0))
            .unwrap();
        scene.portals.link(a, b).unwrap();

        let mut controller = CameraController::new(false, 0.1, true);
        controller.process_key(KeyCode::KeyW, true);
        let outcome = controller.apply_to_scene(&mut scene, 0.25);
        assert_eq!(outcome, StepOutcome::Transited { entry: a, exit: b });
    }
}
