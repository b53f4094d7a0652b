// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use glam::Vec3;

use crate::camera::camera::Camera;
use crate::scene::scene::Scene;

/// Immutable renderer configuration, fixed for the lifetime of a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub world_up: Vec3,
    pub accumulate: bool,
    pub vsync: bool,
    pub shader_path: String,
    pub initial_camera: Camera,
}

impl RenderConfig {
    pub fn from_scene(scene: &Scene) -> Self {
        let world_up = scene.world_up();
        Self {
            world_up,
            accumulate: scene.render.accumulate,
            vsync: scene.render.vsync,
            shader_path: scene.render.shader.clone(),
            initial_camera: Camera::from_config(&scene.camera, world_up),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_scene_copies_settings() {
        let scene: Scene = serde_yml::from_str(
            "camera: { position: [1, 2, 3], fov: 45 }\nrender: { accumulate: false, world_up: [0, 0, 2] }\n",
        )
        .unwrap();
        let config = RenderConfig::from_scene(&scene);
        assert!(!config.accumulate);
        assert_eq!(config.world_up, Vec3::Z);
        assert_eq!(config.initial_camera.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(config.initial_camera.fov, 45.0);
        assert_eq!(config.initial_camera.up, Vec3::Z);

        let u = config.initial_camera.to_gpu(800, 600);
        assert!(glam::Mat4::from_cols_array_2d(&u.view).is_finite());
        assert!(glam::Mat4::from_cols_array_2d(&u.view_proj).is_finite());
    }
}
