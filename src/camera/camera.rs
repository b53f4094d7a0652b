// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

use crate::constants::{
    DEFAULT_CAMERA_POSITION, DEFAULT_FAR, DEFAULT_FOV, DEFAULT_NEAR, WORLD_UP,
};
use crate::scene::scene::CameraConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,   // degrees
    pub pitch: f32, // degrees
    pub fov: f32,   // degrees, vertical
    /// Unit world up; yaw turns around it.
    pub up: Vec3,
}

impl Camera {
    /// The fly camera has no roll; a non-zero `rotation[2]` is ignored.
    pub fn from_config(config: &CameraConfig, world_up: Vec3) -> Self {
        if config.rotation[2] != 0.0 {
            log::warn!(
                "Camera roll {} ignored: the camera has no roll axis",
                config.rotation[2]
            );
        }
        Self {
            position: config.position.into(),
            pitch: config.rotation[0],
            yaw: config.rotation[1],
            fov: config.fov,
            up: world_up.normalize_or(Vec3::Y),
        }
    }

    /// Yaw/pitch in a Y-up frame, then rotated so that Y lands on `up`.
    pub fn orientation(&self) -> Quat {
        let frame = Quat::from_rotation_arc(Vec3::Y, self.up.normalize_or(Vec3::Y));
        frame
            * Quat::from_euler(
                glam::EulerRot::YXZ,
                self.yaw.to_radians(),
                self.pitch.to_radians(),
                0.0,
            )
    }

    /// Right, up, forward. At zero yaw and pitch with a Y-up world the camera
    /// looks down -Z.
    pub fn basis_vectors(&self) -> (Vec3, Vec3, Vec3) {
        let rot = self.orientation();
        let forward = rot * Vec3::NEG_Z;
        let right = rot * Vec3::X;
        let up = rot * Vec3::Y;
        (right, up, forward)
    }

    pub fn view_matrix(&self) -> Mat4 {
        let (_, up, forward) = self.basis_vectors();
        Mat4::look_to_rh(self.position, forward, up)
    }

    pub fn projection_matrix(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_rh(self.fov.to_radians(), aspect, DEFAULT_NEAR, DEFAULT_FAR)
    }

    /// Everything the kernel needs to generate primary rays, recomputed each frame.
    pub fn to_gpu(&self, width: u32, height: u32) -> CameraUniform {
        let view = self.view_matrix();
        let proj = self.projection_matrix(width, height);
        CameraUniform {
            view: view.to_cols_array_2d(),
            inv_view: view.inverse().to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            inv_proj: proj.inverse().to_cols_array_2d(),
            view_proj: (proj * view).to_cols_array_2d(),
            position: self.position.into(),
            tan_half_fov: (self.fov.to_radians() * 0.5).tan(),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::from(DEFAULT_CAMERA_POSITION),
            yaw: 0.0,
            pitch: 0.0,
            fov: DEFAULT_FOV,
            up: Vec3::from(WORLD_UP),
        }
    }
}

/// Must match the WGSL `Camera` uniform layout (336 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub inv_view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub inv_proj: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub tan_half_fov: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 336);
    }

    #[test]
    fn test_inverse_pairs() {
        let camera = Camera {
            position: Vec3::new(1.0, 2.0, 3.0),
            yaw: 30.0,
            pitch: -10.0,
            fov: 60.0,
            up: Vec3::Y,
        };
        let u = camera.to_gpu(800, 600);
        let view = Mat4::from_cols_array_2d(&u.view);
        let inv_view = Mat4::from_cols_array_2d(&u.inv_view);
        let proj = Mat4::from_cols_array_2d(&u.proj);
        let inv_proj = Mat4::from_cols_array_2d(&u.inv_proj);
        assert!((view * inv_view).abs_diff_eq(Mat4::IDENTITY, 1e-4));
        assert!((proj * inv_proj).abs_diff_eq(Mat4::IDENTITY, 1e-4));
        assert_eq!(u.position, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_tan_half_fov() {
        let camera = Camera {
            fov: 90.0,
            ..Camera::default()
        };
        let u = camera.to_gpu(100, 100);
        assert!((u.tan_half_fov - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_view_maps_camera_to_origin() {
        let camera = Camera {
            position: Vec3::new(4.0, -2.0, 7.0),
            ..Camera::default()
        };
        let view = camera.view_matrix();
        assert!(view.transform_point3(camera.position).abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn test_basis_is_right_handed_screen_space() {
        let camera = Camera::default();
        let (right, up, forward) = camera.basis_vectors();
        assert!(forward.abs_diff_eq(Vec3::NEG_Z, 1e-6));
        // A point to the camera's right lands at positive view-space x.
        let view = camera.view_matrix();
        let p = view.transform_point3(camera.position + right + forward);
        assert!(p.x > 0.0);
        assert!(up.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn test_from_config_reads_pitch_yaw() {
        let config = CameraConfig {
            position: [0.0, 1.0, 2.0],
            rotation: [15.0, 45.0, 0.0],
            fov: 50.0,
        };
        let camera = Camera::from_config(&config, Vec3::Y);
        assert_eq!(camera.pitch, 15.0);
        assert_eq!(camera.yaw, 45.0);
        assert_eq!(camera.fov, 50.0);
    }

    #[test]
    fn test_roll_component_is_ignored() {
        let level = CameraConfig {
            position: [0.0, 1.0, 2.0],
            rotation: [5.0, 20.0, 0.0],
            fov: 50.0,
        };
        let rolled = CameraConfig {
            rotation: [5.0, 20.0, 35.0],
            ..level.clone()
        };
        assert_eq!(
            Camera::from_config(&rolled, Vec3::Y),
            Camera::from_config(&level, Vec3::Y)
        );
    }

    #[test]
    fn test_z_up_world_gives_finite_uniform() {
        let camera = Camera::from_config(
            &CameraConfig {
                position: [0.0, -5.0, 1.0],
                rotation: [-10.0, 30.0, 0.0],
                fov: 50.0,
            },
            Vec3::new(0.0, 0.0, 2.0),
        );
        let u = camera.to_gpu(800, 600);
        for m in [u.view, u.inv_view, u.view_proj] {
            assert!(Mat4::from_cols_array_2d(&m).is_finite());
        }

        let (right, up, forward) = camera.basis_vectors();
        assert!(up.dot(Vec3::Z) > 0.9);
        assert!(forward.dot(Vec3::Z).abs() < 0.5);
        assert!(right.dot(Vec3::Z).abs() < 1e-5);
        let view = Mat4::from_cols_array_2d(&u.view);
        let inv_view = Mat4::from_cols_array_2d(&u.inv_view);
        assert!((view * inv_view).abs_diff_eq(Mat4::IDENTITY, 1e-4));
    }

    #[test]
    fn test_y_up_orientation_unchanged_by_frame() {
        let camera = Camera {
            yaw: 180.0,
            ..Camera::default()
        };
        let (_, _, forward) = camera.basis_vectors();
        assert!(forward.abs_diff_eq(Vec3::Z, 1e-5));
    }
}
