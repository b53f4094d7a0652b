use glam::Vec3;

use super::camera::Camera;
use crate::constants::{
    CAMERA_DEFAULT_MOVE_SPEED, CAMERA_DEFAULT_SENSITIVITY, CAMERA_PITCH_CLAMP,
    CAMERA_SPEED_MAX, CAMERA_SPEED_MIN, CAMERA_SPEED_STEP, CAMERA_SPRINT_MULTIPLIER, FOV_MAX,
    FOV_MIN, FOV_SCROLL_STEP,
};

/// FPS-style camera controller (WASD + mouse look + scroll zoom).
///
/// Every `apply_*` method reports whether the pose changed so the caller can
/// restart accumulation.
pub struct CameraController {
    pub move_speed: f32,
    pub look_sensitivity: f32,
    pub sprint_multiplier: f32,
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub sprint: bool,
    pub mouse_captured: bool,
    pub speed_up: bool,
    pub speed_down: bool,
    mouse_delta: (f32, f32),
    scroll_delta: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            move_speed: CAMERA_DEFAULT_MOVE_SPEED,
            look_sensitivity: Self::resolve_sensitivity(),
            sprint_multiplier: CAMERA_SPRINT_MULTIPLIER,
            forward: false,
            backward: false,
            left: false,
            right: false,
            up: false,
            down: false,
            sprint: false,
            mouse_captured: false,
            speed_up: false,
            speed_down: false,
            mouse_delta: (0.0, 0.0),
            scroll_delta: 0.0,
        }
    }

    fn resolve_sensitivity() -> f32 {
        let Ok(val) = std::env::var("PATHTRACER_MOUSE_SENS") else {
            return CAMERA_DEFAULT_SENSITIVITY;
        };
        match val.parse::<f32>() {
            Ok(sens) if sens > 0.0 && sens.is_finite() => {
                log::info!("PATHTRACER_MOUSE_SENS={sens}");
                sens
            }
            _ => {
                log::warn!("PATHTRACER_MOUSE_SENS={val:?} invalid, using default");
                CAMERA_DEFAULT_SENSITIVITY
            }
        }
    }

    /// Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut Camera, dt: f32) -> bool {
        if self.speed_up {
            self.move_speed = (self.move_speed + CAMERA_SPEED_STEP * dt).min(CAMERA_SPEED_MAX);
        }
        if self.speed_down {
            self.move_speed = (self.move_speed - CAMERA_SPEED_STEP * dt).max(CAMERA_SPEED_MIN);
        }

        let sprint_factor = if self.sprint {
            self.sprint_multiplier
        } else {
            1.0
        };
        let speed = self.move_speed * sprint_factor * dt;
        let (cam_right, _cam_up, cam_forward) = camera.basis_vectors();

        let mut delta = Vec3::ZERO;
        if self.forward {
            delta += cam_forward;
        }
        if self.backward {
            delta -= cam_forward;
        }
        if self.right {
            delta += cam_right;
        }
        if self.left {
            delta -= cam_right;
        }
        if self.up {
            delta += camera.up;
        }
        if self.down {
            delta -= camera.up;
        }

        if delta != Vec3::ZERO && speed > 0.0 {
            camera.position += delta.normalize() * speed;
            true
        } else {
            false
        }
    }

    /// Accumulate relative mouse motion; only counted while the mouse is captured.
    pub fn accumulate_mouse_delta(&mut self, dx: f64, dy: f64) {
        if self.mouse_captured {
            self.mouse_delta.0 += dx as f32;
            self.mouse_delta.1 += dy as f32;
        }
    }

    pub fn accumulate_scroll(&mut self, lines: f32) {
        self.scroll_delta += lines;
    }

    /// Apply accumulated mouse delta to camera rotation (called once per frame).
    /// Returns true if the camera rotated.
    pub fn apply_mouse_look(&mut self, camera: &mut Camera) -> bool {
        let (dx, dy) = std::mem::take(&mut self.mouse_delta);
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        camera.yaw -= dx * self.look_sensitivity;
        camera.pitch = (camera.pitch - dy * self.look_sensitivity)
            .clamp(-CAMERA_PITCH_CLAMP, CAMERA_PITCH_CLAMP);
        true
    }

    /// Apply accumulated scroll to the field of view. Returns true if it changed.
    pub fn apply_zoom(&mut self, camera: &mut Camera) -> bool {
        let lines = std::mem::take(&mut self.scroll_delta);
        if lines == 0.0 {
            return false;
        }
        let fov = (camera.fov - lines * FOV_SCROLL_STEP).clamp(FOV_MIN, FOV_MAX);
        let changed = fov != camera.fov;
        camera.fov = fov;
        changed
    }

    /// Discard buffered mouse delta (call when toggling mouse capture to avoid a jump).
    pub fn clear_mouse_delta(&mut self) {
        self.mouse_delta = (0.0, 0.0);
    }

    /// Reset all movement flags (call on focus loss to prevent runaway movement).
    pub fn clear_movement(&mut self) {
        self.forward = false;
        self.backward = false;
        self.left = false;
        self.right = false;
        self.up = false;
        self.down = false;
        self.sprint = false;
        self.speed_up = false;
        self.speed_down = false;
    }
}
