// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::material::Material;
use super::model::ModelDescriptor;
use super::primitives::Sphere;
use super::store::SceneStore;
use crate::constants::{DEFAULT_CAMERA_POSITION, DEFAULT_FOV, DEFAULT_SHADER_PATH, WORLD_UP};
use crate::model::MeshLoader;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraConfig {
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],

    /// Pitch, yaw, roll in degrees.
    #[serde(default)]
    pub rotation: [f32; 3],

    #[serde(default = "default_fov")]
    pub fov: f32,
}

fn default_camera_position() -> [f32; 3] {
    DEFAULT_CAMERA_POSITION
}

fn default_fov() -> f32 {
    DEFAULT_FOV
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: default_camera_position(),
            rotation: [0.0; 3],
            fov: default_fov(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderSettings {
    #[serde(default = "default_true")]
    pub accumulate: bool,

    #[serde(default = "default_shader")]
    pub shader: String,

    #[serde(default = "default_world_up")]
    pub world_up: [f32; 3],

    #[serde(default = "default_true")]
    pub vsync: bool,
}

fn default_true() -> bool {
    true
}

fn default_shader() -> String {
    DEFAULT_SHADER_PATH.to_string()
}

fn default_world_up() -> [f32; 3] {
    WORLD_UP
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            accumulate: true,
            shader: default_shader(),
            world_up: default_world_up(),
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedMaterial {
    pub name: String,
    #[serde(flatten)]
    pub material: Material,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SphereDesc {
    pub center: [f32; 3],
    pub radius: f32,
    pub material: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangleDesc {
    pub v0: [f32; 3],
    pub v1: [f32; 3],
    pub v2: [f32; 3],
    pub material: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuadDesc {
    pub v0: [f32; 3],
    pub v1: [f32; 3],
    pub v2: [f32; 3],
    pub v3: [f32; 3],
    pub material: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRef {
    pub path: String,

    #[serde(default)]
    pub position: [f32; 3],

    /// Pitch, yaw, roll in degrees.
    #[serde(default)]
    pub rotation: [f32; 3],

    #[serde(default = "default_scale")]
    pub scale: f32,

    pub material: String,
}

fn default_scale() -> f32 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbientDesc {
    #[serde(default = "default_white")]
    pub color: [f32; 3],
    pub strength: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SunDesc {
    pub direction: [f32; 3],
    #[serde(default = "default_white")]
    pub color: [f32; 3],
    pub strength: f32,
}

fn default_white() -> [f32; 3] {
    [1.0; 3]
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub ambient: Option<AmbientDesc>,
    #[serde(default)]
    pub sun: Option<SunDesc>,
}

/// Host-authored scene file. Lowered into [`SceneStore`] calls by
/// [`Scene::build_store`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub camera: CameraConfig,

    #[serde(default)]
    pub render: RenderSettings,

    #[serde(default)]
    pub materials: Vec<NamedMaterial>,

    #[serde(default)]
    pub spheres: Vec<SphereDesc>,

    #[serde(default)]
    pub triangles: Vec<TriangleDesc>,

    #[serde(default)]
    pub quads: Vec<QuadDesc>,

    #[serde(default)]
    pub models: Vec<ModelRef>,

    #[serde(default)]
    pub environment: Environment,
}

impl Scene {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replay the description into a fresh store. Materials are added first
    /// so every primitive can reference them by name.
    pub fn build_store(&self, loader: &dyn MeshLoader) -> Result<SceneStore> {
        let mut store = SceneStore::new();
        let mut by_name: HashMap<&str, i32> = HashMap::new();
        for named in &self.materials {
            let index = store.add_material(named.material);
            if by_name.insert(named.name.as_str(), index).is_some() {
                bail!("Duplicate material name '{}'", named.name);
            }
        }
        let lookup = |name: &str| -> Result<i32> {
            by_name
                .get(name)
                .copied()
                .with_context(|| format!("Unknown material '{name}'"))
        };

        for (i, s) in self.spheres.iter().enumerate() {
            let material = lookup(&s.material).with_context(|| format!("sphere #{i}"))?;
            store.add_sphere(Sphere::new(s.center.into(), s.radius, material));
        }
        for (i, t) in self.triangles.iter().enumerate() {
            let material = lookup(&t.material).with_context(|| format!("triangle #{i}"))?;
            store.add_triangle(t.v0.into(), t.v1.into(), t.v2.into(), material);
        }
        for (i, q) in self.quads.iter().enumerate() {
            let material = lookup(&q.material).with_context(|| format!("quad #{i}"))?;
            store.add_quad(q.v0.into(), q.v1.into(), q.v2.into(), q.v3.into(), material);
        }
        for (i, m) in self.models.iter().enumerate() {
            let material = lookup(&m.material).with_context(|| format!("model #{i}"))?;
            let descriptor = ModelDescriptor {
                path: m.path.clone(),
                position: m.position.into(),
                pitch: m.rotation[0],
                yaw: m.rotation[1],
                roll: m.rotation[2],
                scale: m.scale,
                material,
            };
            store.add_model(&descriptor, loader);
        }

        if let Some(ambient) = &self.environment.ambient {
            store.add_ambient_light(ambient.color.into(), ambient.strength);
        }
        if let Some(sun) = &self.environment.sun {
            store.add_directional_light(sun.direction.into(), sun.color.into(), sun.strength);
        }

        let stats = store.stats();
        log::info!(
            "Scene built: {} spheres, {} triangles, {} meshes ({} triangles), {} materials, {} lights (strength sum {:.3})",
            stats.spheres,
            stats.triangles,
            stats.meshes,
            stats.mesh_triangles,
            stats.materials,
            stats.lights,
            store.lights_strength_sum()
        );
        Ok(store)
    }

    pub fn world_up(&self) -> Vec3 {
        let up = Vec3::from(self.render.world_up).normalize_or_zero();
        if up == Vec3::ZERO { Vec3::Y } else { up }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::model::MeshData;

    struct NoMeshes;

    impl MeshLoader for NoMeshes {
        fn load_mesh(&self, path: &Path) -> Result<MeshData> {
            anyhow::bail!("no mesh at {}", path.display())
        }
    }

    const YAML: &str = r#"
camera:
  position: [0, 1, 3]
  fov: 45
materials:
  - name: floor
    albedo: [0.5, 0.5, 0.5, 1.0]
  - name: lamp
    emission: [1.0, 0.9, 0.8, 5.0]
spheres:
  - { center: [0, -1000, 0], radius: 999, material: floor }
  - { center: [0, 1, 0], radius: 1, material: lamp }
quads:
  - { v0: [-1, 3, -1], v1: [1, 3, -1], v2: [1, 3, 1], v3: [-1, 3, 1], material: lamp }
models:
  - { path: missing.obj, material: floor }
environment:
  ambient: { strength: 0.25 }
"#;

    #[test]
    fn test_build_store_from_yaml() {
        let scene: Scene = serde_yml::from_str(YAML).unwrap();
        assert_eq!(scene.camera.fov, 45.0);
        assert!(scene.render.accumulate);

        let store = scene.build_store(&NoMeshes).unwrap();
        assert_eq!(store.spheres().len(), 2);
        assert_eq!(store.triangles().len(), 2);
        assert!(store.meshes().is_empty());
        // lamp sphere + two lamp triangles + ambient
        assert_eq!(store.lights().len(), 4);
        assert_eq!(store.lights_strength_sum(), 15.25);
    }

    #[test]
    fn test_unknown_material_is_an_error() {
        let scene: Scene = serde_json::from_str(
            r#"{ "spheres": [{ "center": [0, 0, 0], "radius": 1, "material": "nope" }] }"#,
        )
        .unwrap();
        let err = scene.build_store(&NoMeshes).unwrap_err();
        assert!(format!("{err:#}").contains("Unknown material 'nope'"));
    }

    #[test]
    fn test_duplicate_material_is_an_error() {
        let scene: Scene = serde_json::from_str(
            r#"{ "materials": [{ "name": "a" }, { "name": "a" }] }"#,
        )
        .unwrap();
        assert!(scene.build_store(&NoMeshes).is_err());
    }

    #[test]
    fn test_defaults() {
        let scene = Scene::empty();
        assert_eq!(scene.camera, CameraConfig::default());
        assert_eq!(scene.world_up(), Vec3::Y);
        assert!(scene.build_store(&NoMeshes).unwrap().is_empty());
    }
}
