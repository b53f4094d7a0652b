// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};

/// An imported mesh placed in the world. Angles are in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub path: String,
    pub position: Vec3,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub scale: f32,
    pub material: i32,
}

impl ModelDescriptor {
    /// Object-to-world transform baked into the vertices at import:
    /// scale, then yaw/pitch/roll (same Euler order as the camera), then translate.
    pub fn world_transform(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            self.roll.to_radians(),
        );
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), rotation, self.position)
    }
}

/// Range of the global index array that belongs to one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshInfo {
    pub index_start: u32,
    /// Exclusive.
    pub index_end: u32,
    pub material: i32,
}

impl MeshInfo {
    pub fn triangle_count(&self) -> u32 {
        (self.index_end - self.index_start) / 3
    }
}

/// Must match the WGSL `MeshInfo` struct layout (16 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuMeshInfo {
    pub index_start: u32,
    pub index_end: u32,
    pub material: i32,
    pub _pad: u32,
}

impl From<&MeshInfo> for GpuMeshInfo {
    fn from(m: &MeshInfo) -> Self {
        Self {
            index_start: m.index_start,
            index_end: m.index_end,
            material: m.material,
            _pad: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ModelDescriptor {
        ModelDescriptor {
            path: "m.obj".into(),
            position: Vec3::ZERO,
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            scale: 1.0,
            material: 0,
        }
    }

    #[test]
    fn test_identity_pose() {
        let m = descriptor().world_transform();
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn test_scale_applies_before_translation() {
        let m = ModelDescriptor {
            position: Vec3::new(10.0, 0.0, 0.0),
            scale: 2.0,
            ..descriptor()
        }
        .world_transform();
        let p = m.transform_point3(Vec3::new(1.0, 1.0, 0.0));
        assert!(p.abs_diff_eq(Vec3::new(12.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn test_yaw_rotates_about_up() {
        let m = ModelDescriptor {
            yaw: 90.0,
            ..descriptor()
        }
        .world_transform();
        let p = m.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5), "{p}");
    }
}
