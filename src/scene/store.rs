// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;

use glam::Vec3;

use super::light::{GpuLight, LightList, LightSource};
use super::material::{GpuMaterial, Material};
use super::model::{GpuMeshInfo, MeshInfo, ModelDescriptor};
use super::primitives::{GpuSphere, GpuTriangle, GpuVertex, Sphere, Triangle};
use crate::model::MeshLoader;

/// CPU-side authoritative scene: append-only primitive, material and mesh
/// arrays plus the light list derived from emissive primitives.
///
/// Mutated only while a scene is (re)loaded; the frame loop reads it through
/// [`SceneStore::gpu_data`] when uploading.
#[derive(Debug, Clone, Default)]
pub struct SceneStore {
    spheres: Vec<Sphere>,
    triangles: Vec<Triangle>,
    materials: Vec<Material>,
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    meshes: Vec<MeshInfo>,
    lights: LightList,
}

/// Upload-ready copies of every scene array.
pub struct SceneGpuData {
    pub spheres: Vec<GpuSphere>,
    pub materials: Vec<GpuMaterial>,
    pub lights: Vec<GpuLight>,
    pub triangles: Vec<GpuTriangle>,
    pub vertices: Vec<GpuVertex>,
    pub indices: Vec<u32>,
    pub meshes: Vec<GpuMeshInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStats {
    pub spheres: usize,
    pub triangles: usize,
    pub materials: usize,
    pub meshes: usize,
    pub mesh_triangles: usize,
    pub lights: usize,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp and append; the returned index stays valid for the lifetime of the store.
    pub fn add_material(&mut self, material: Material) -> i32 {
        self.materials.push(material.clamped());
        (self.materials.len() - 1) as i32
    }

    pub fn add_sphere(&mut self, sphere: Sphere) {
        let material = *self.material(sphere.material);
        self.spheres.push(sphere);
        if material.is_emissive() {
            self.add_light(
                LightSource::Sphere {
                    center: Vec3::from(sphere.center),
                    radius: sphere.radius,
                },
                &material,
            );
        }
    }

    pub fn add_triangle(&mut self, v0: Vec3, v1: Vec3, v2: Vec3, material: i32) {
        let triangle = Triangle::new(v0, v1, v2, material);
        if triangle.is_degenerate() {
            log::warn!("Degenerate triangle {v0} {v1} {v2}: zero normal");
        }
        self.push_triangle(triangle);
    }

    /// Split `v0 v1 v2 v3` into `{v0, v1, v2}` and `{v2, v3, v0}`.
    pub fn add_quad(&mut self, v0: Vec3, v1: Vec3, v2: Vec3, v3: Vec3, material: i32) {
        self.add_triangle(v0, v1, v2, material);
        self.add_triangle(v2, v3, v0, material);
    }

    /// Import a mesh, bake the model pose into its vertices and append it.
    /// A failed import is logged and leaves the store untouched.
    pub fn add_model(&mut self, model: &ModelDescriptor, loader: &dyn MeshLoader) -> Option<usize> {
        debug_assert!(
            self.is_valid_material(model.material),
            "material {} out of range",
            model.material
        );
        let mesh = match loader
            .load_mesh(Path::new(&model.path))
            .and_then(|mesh| mesh.validate().map(|()| mesh))
        {
            Ok(mesh) => mesh,
            Err(e) => {
                log::warn!("Skipping model '{}': {e:#}", model.path);
                return None;
            }
        };

        let transform = model.world_transform();
        let base = self.vertices.len() as u32;
        let index_start = self.indices.len() as u32;

        self.vertices
            .extend(mesh.positions.iter().map(|&p| transform.transform_point3(p)));
        self.indices.extend(mesh.indices.iter().map(|&i| i + base));
        self.meshes.push(MeshInfo {
            index_start,
            index_end: self.indices.len() as u32,
            material: model.material,
        });

        log::info!(
            "Loaded model '{}': {} triangles",
            model.path,
            mesh.triangle_count()
        );
        Some(self.meshes.len() - 1)
    }

    pub fn add_ambient_light(&mut self, color: Vec3, strength: f32) {
        self.lights.push(LightSource::Ambient, color, strength.max(0.0));
    }

    pub fn add_directional_light(&mut self, direction: Vec3, color: Vec3, strength: f32) {
        self.lights.push(
            LightSource::Directional {
                direction: direction.normalize_or_zero(),
            },
            color,
            strength.max(0.0),
        );
    }

    fn push_triangle(&mut self, triangle: Triangle) {
        let material = *self.material(triangle.material());
        let index = self.triangles.len() as u32;
        self.triangles.push(triangle);
        if material.is_emissive() {
            self.add_light(LightSource::Triangle { index }, &material);
        }
    }

    fn add_light(&mut self, source: LightSource, material: &Material) {
        let [r, g, b, strength] = material.emission;
        self.lights.push(source, Vec3::new(r, g, b), strength);
    }

    fn is_valid_material(&self, index: i32) -> bool {
        index >= 0 && (index as usize) < self.materials.len()
    }

    // Out-of-range indices are a caller bug; release builds fall back to a
    // non-emissive default so no light is registered.
    fn material(&self, index: i32) -> &Material {
        debug_assert!(self.is_valid_material(index), "material {index} out of range");
        const FALLBACK: Material = Material {
            albedo: [0.0; 4],
            subsurface: [0.0; 4],
            specular_tint: [0.0; 4],
            emission: [0.0; 4],
            roughness: 1.0,
            metallic: 0.0,
            ior: 1.5,
            trs_weight: 0.0,
        };
        usize::try_from(index)
            .ok()
            .and_then(|i| self.materials.get(i))
            .unwrap_or(&FALLBACK)
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn meshes(&self) -> &[MeshInfo] {
        &self.meshes
    }

    pub fn lights(&self) -> &LightList {
        &self.lights
    }

    pub fn lights_strength_sum(&self) -> f32 {
        self.lights.strength_sum()
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty() && self.triangles.is_empty() && self.meshes.is_empty()
    }

    pub fn stats(&self) -> SceneStats {
        SceneStats {
            spheres: self.spheres.len(),
            triangles: self.triangles.len(),
            materials: self.materials.len(),
            meshes: self.meshes.len(),
            mesh_triangles: self.indices.len() / 3,
            lights: self.lights.len(),
        }
    }

    pub fn gpu_data(&self) -> SceneGpuData {
        SceneGpuData {
            spheres: self.spheres.iter().map(GpuSphere::from).collect(),
            materials: self.materials.iter().map(GpuMaterial::from).collect(),
            lights: self.lights.to_gpu(),
            triangles: self.triangles.iter().map(GpuTriangle::from).collect(),
            vertices: self.vertices.iter().map(|&p| GpuVertex::from(p)).collect(),
            indices: self.indices.clone(),
            meshes: self.meshes.iter().map(GpuMeshInfo::from).collect(),
        }
    }
}
