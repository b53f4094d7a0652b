// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::scene::Scene;
use crate::constants::resolve_resource_path;

pub fn load_scene(path: &Path) -> Result<Scene> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene file: {}", path.display()))?;

    let mut scene: Scene = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON scene file: {}", path.display()))?,
        _ => serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML scene file: {}", path.display()))?,
    };

    // Resolve relative model / shader paths so scenes work from any CWD.
    let scene_dir = path.parent().unwrap_or(Path::new("."));
    for model in &mut scene.models {
        model.path = resolve_resource_path(scene_dir, &model.path);
    }
    scene.render.shader = resolve_resource_path(scene_dir, &scene.render.shader);

    log::info!(
        "Loaded scene {}: {} materials, {} spheres, {} triangles, {} quads, {} models",
        path.display(),
        scene.materials.len(),
        scene.spheres.len(),
        scene.triangles.len(),
        scene.quads.len(),
        scene.models.len()
    );

    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_and_yaml_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("s.json");
        let yaml = dir.path().join("s.yaml");
        fs::write(&json, r#"{ "camera": { "fov": 30 } }"#).unwrap();
        fs::write(&yaml, "camera:\n  fov: 70\n").unwrap();

        assert_eq!(load_scene(&json).unwrap().camera.fov, 30.0);
        assert_eq!(load_scene(&yaml).unwrap().camera.fov, 70.0);
    }

    #[test]
    fn test_model_paths_resolve_against_scene_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cube.obj"), "").unwrap();
        let scene_path = dir.path().join("scene.yaml");
        fs::write(
            &scene_path,
            "materials:\n  - name: m\nmodels:\n  - { path: cube.obj, material: m }\n",
        )
        .unwrap();

        let scene = load_scene(&scene_path).unwrap();
        assert_eq!(
            Path::new(&scene.models[0].path),
            dir.path().join("cube.obj")
        );
    }

    #[test]
    fn test_parse_error_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_scene(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse JSON scene file"));
    }

    #[test]
    fn test_demo_scene_builds() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(crate::constants::DEFAULT_SCENE_PATH);
        let scene = load_scene(&path).unwrap();
        assert!(Path::new(&scene.render.shader).exists());

        let store = scene.build_store(&crate::model::ObjMeshLoader).unwrap();
        assert_eq!(store.spheres().len(), 3);
        assert_eq!(store.triangles().len(), 12);
        assert_eq!(store.meshes().len(), 1);
        assert_eq!(store.meshes()[0].triangle_count(), 6);
        // lamp quad (2 triangles) + lamp sphere + ambient
        assert_eq!(store.lights().len(), 4);
        assert!((store.lights_strength_sum() - 36.05).abs() < 1e-4);
    }
}
