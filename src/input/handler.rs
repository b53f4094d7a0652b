use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::CameraController;

/// Renderer-level commands triggered from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    ToggleAccumulation,
    ResetAccumulation,
    ReloadScene,
    Exit,
}

/// Routes camera input into the controller. Returns an action when the event
/// maps to a renderer command rather than camera motion.
pub fn handle_window_event(
    event: &WindowEvent,
    controller: &mut CameraController,
) -> Option<InputAction> {
    match event {
        WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(key),
                    state,
                    repeat,
                    ..
                },
            ..
        } => {
            let pressed = *state == ElementState::Pressed;
            match key {
                KeyCode::KeyW => controller.forward = pressed,
                KeyCode::KeyS => controller.backward = pressed,
                KeyCode::KeyA => controller.left = pressed,
                KeyCode::KeyD => controller.right = pressed,
                KeyCode::Space => controller.up = pressed,
                KeyCode::ShiftLeft | KeyCode::ShiftRight => controller.sprint = pressed,
                KeyCode::ControlLeft | KeyCode::ControlRight => controller.down = pressed,
                KeyCode::NumpadAdd => controller.speed_up = pressed,
                KeyCode::NumpadSubtract => controller.speed_down = pressed,
                KeyCode::Tab if pressed && !repeat => return Some(InputAction::ToggleAccumulation),
                KeyCode::KeyR if pressed && !repeat => return Some(InputAction::ResetAccumulation),
                KeyCode::F5 if pressed && !repeat => return Some(InputAction::ReloadScene),
                KeyCode::Escape if pressed => {
                    if controller.mouse_captured {
                        controller.mouse_captured = false;
                        controller.clear_mouse_delta();
                    } else {
                        return Some(InputAction::Exit);
                    }
                }
                _ => {}
            }
            None
        }
        WindowEvent::MouseInput {
            button: MouseButton::Right,
            state,
            ..
        } => {
            controller.mouse_captured = *state == ElementState::Pressed;
            controller.clear_mouse_delta();
            None
        }
        WindowEvent::MouseWheel { delta, .. } => {
            let lines = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(p) => (p.y / 40.0) as f32,
            };
            controller.accumulate_scroll(lines);
            None
        }
        WindowEvent::Focused(false) => {
            controller.mouse_captured = false;
            controller.clear_movement();
            controller.clear_mouse_delta();
            None
        }
        _ => None,
    }
}
