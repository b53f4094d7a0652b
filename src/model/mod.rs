// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod obj_loader;

use std::path::Path;

use anyhow::{Result, bail};
use glam::Vec3;

pub use obj_loader::ObjMeshLoader;

/// Raw mesh as returned by an importer: object-space positions and a
/// triangle list indexing into them. No transform is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Reject meshes the kernel would read out of bounds.
    pub fn validate(&self) -> Result<()> {
        if self.indices.len() % 3 != 0 {
            bail!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            );
        }
        if let Some(&bad) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.positions.len())
        {
            bail!(
                "index {bad} out of range for {} vertices",
                self.positions.len()
            );
        }
        Ok(())
    }
}

/// Mesh file importer: path in, untransformed triangles out.
pub trait MeshLoader {
    fn load_mesh(&self, path: &Path) -> Result<MeshData>;
}
