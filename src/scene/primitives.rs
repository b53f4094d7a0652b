// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: [f32; 3],
    pub radius: f32,
    pub material: i32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material: i32) -> Self {
        Self {
            center: center.into(),
            radius,
            material,
        }
    }
}

/// A triangle with its face normal baked in.
///
/// Fields are private so the normal can only be produced by [`Triangle::new`]
/// or [`Triangle::set_vertices`]; it is never stale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    vertices: [Vec3; 3],
    normal: Vec3,
    material: i32,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: i32) -> Self {
        Self {
            vertices: [v0, v1, v2],
            normal: face_normal(v0, v1, v2),
            material,
        }
    }

    pub fn set_vertices(&mut self, v0: Vec3, v1: Vec3, v2: Vec3) {
        self.vertices = [v0, v1, v2];
        self.normal = face_normal(v0, v1, v2);
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        self.vertices
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn material(&self) -> i32 {
        self.material
    }

    pub fn is_degenerate(&self) -> bool {
        self.normal == Vec3::ZERO
    }
}

/// `normalize((v1 - v0) x (v2 - v0))`, or zero for a zero-area triangle.
pub fn face_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    (v1 - v0).cross(v2 - v0).normalize_or_zero()
}

/// Must match the WGSL `Sphere` struct layout (32 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuSphere {
    pub center: [f32; 3],
    pub radius: f32,
    pub material: i32,
    pub _pad: [u32; 3],
}

impl From<&Sphere> for GpuSphere {
    fn from(s: &Sphere) -> Self {
        Self {
            center: s.center,
            radius: s.radius,
            material: s.material,
            _pad: [0; 3],
        }
    }
}

/// Must match the WGSL `Triangle` struct layout (64 bytes). Each vertex is
/// padded to 16 bytes; the material index sits in the normal's padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuTriangle {
    pub v0: [f32; 3],
    pub _pad0: f32,
    pub v1: [f32; 3],
    pub _pad1: f32,
    pub v2: [f32; 3],
    pub _pad2: f32,
    pub normal: [f32; 3],
    pub material: i32,
}

impl From<&Triangle> for GpuTriangle {
    fn from(t: &Triangle) -> Self {
        let [v0, v1, v2] = t.vertices;
        Self {
            v0: v0.into(),
            _pad0: 0.0,
            v1: v1.into(),
            _pad1: 0.0,
            v2: v2.into(),
            _pad2: 0.0,
            normal: t.normal.into(),
            material: t.material,
        }
    }
}

/// Mesh vertex position, padded to a `vec4` stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub _pad: f32,
}

impl From<Vec3> for GpuVertex {
    fn from(p: Vec3) -> Self {
        Self {
            position: p.into(),
            _pad: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_normal_unit_and_perpendicular() {
        let cases = [
            (Vec3::ZERO, Vec3::X, Vec3::Y),
            (
                Vec3::new(1.0, 2.0, 3.0),
                Vec3::new(-4.0, 0.5, 2.0),
                Vec3::new(0.3, -7.0, 1.0),
            ),
            (
                Vec3::new(100.0, 0.0, 0.0),
                Vec3::new(100.0, 0.001, 0.0),
                Vec3::new(100.0, 0.0, 0.001),
            ),
        ];
        for (v0, v1, v2) in cases {
            let t = Triangle::new(v0, v1, v2, 0);
            let n = t.normal();
            assert!((n.length() - 1.0).abs() < EPS, "not unit: {n}");
            assert!(n.dot((v1 - v0).normalize()).abs() < EPS);
            assert!(n.dot((v2 - v0).normalize()).abs() < EPS);
        }
    }

    #[test]
    fn test_normal_follows_winding() {
        let t = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y, 0);
        assert!((t.normal() - Vec3::Z).length() < EPS);
    }

    #[test]
    fn test_set_vertices_recomputes_normal() {
        let mut t = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y, 3);
        t.set_vertices(Vec3::ZERO, Vec3::Z, Vec3::X);
        assert!((t.normal() - Vec3::Y).length() < EPS);
        assert_eq!(t.material(), 3);
    }

    #[test]
    fn test_degenerate_triangle_has_zero_normal() {
        let t = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0, 0);
        assert!(t.is_degenerate());
        assert!(!t.normal().is_nan());
    }

    #[test]
    fn test_gpu_layouts() {
        assert_eq!(std::mem::size_of::<GpuSphere>(), 32);
        assert_eq!(std::mem::size_of::<GpuTriangle>(), 64);
        assert_eq!(std::mem::size_of::<GpuVertex>(), 16);
    }
}
