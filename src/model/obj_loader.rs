use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec3;

use super::{MeshData, MeshLoader};

/// Wavefront OBJ importer backed by `tobj`. All objects in the file are
/// merged into one triangle list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjMeshLoader;

impl MeshLoader for ObjMeshLoader {
    fn load_mesh(&self, path: &Path) -> Result<MeshData> {
        let (models, _materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)
            .with_context(|| format!("Failed to load OBJ: {}", path.display()))?;

        let mut mesh = MeshData::default();
        for model in &models {
            let base = mesh.positions.len() as u32;
            mesh.positions.extend(
                model
                    .mesh
                    .positions
                    .chunks_exact(3)
                    .map(|p| Vec3::new(p[0], p[1], p[2])),
            );
            mesh.indices
                .extend(model.mesh.indices.iter().map(|&i| i + base));
        }

        log::debug!(
            "Read OBJ '{}': {} objects, {} vertices, {} triangles",
            path.display(),
            models.len(),
            mesh.positions.len(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }
}
