// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::{Path, PathBuf};

// GPU / compute
// Tile edge of one compute workgroup; must match `@workgroup_size` in the kernel.
pub const WORKGROUP_SIZE: u32 = 16;
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

// Accumulation: vec4<f32> colour sum + u32 sample count per pixel
pub const ACCUM_COLOR_BYTES_PER_PIXEL: u64 = 16;
pub const ACCUM_COUNT_BYTES_PER_PIXEL: u64 = 4;

// Material clamping
pub const MIN_ROUGHNESS: f32 = 0.005;
pub const IOR_NUDGE: f32 = 1.00001;

// Camera defaults
pub const DEFAULT_FOV: f32 = 60.0;
pub const DEFAULT_CAMERA_POSITION: [f32; 3] = [0.0, 1.0, 0.0];
pub const DEFAULT_NEAR: f32 = 0.01;
pub const DEFAULT_FAR: f32 = 1000.0;
pub const FOV_MIN: f32 = 10.0;
pub const FOV_MAX: f32 = 120.0;
pub const FOV_SCROLL_STEP: f32 = 2.0;

// World
pub const WORLD_UP: [f32; 3] = [0.0, 1.0, 0.0];

// Camera controller
pub const CAMERA_DEFAULT_MOVE_SPEED: f32 = 5.0;
pub const CAMERA_SPRINT_MULTIPLIER: f32 = 3.0;
pub const CAMERA_DEFAULT_SENSITIVITY: f32 = 0.15;
pub const CAMERA_PITCH_CLAMP: f32 = 89.0;
pub const CAMERA_SPEED_STEP: f32 = 5.0;
pub const CAMERA_SPEED_MIN: f32 = 0.5;
pub const CAMERA_SPEED_MAX: f32 = 50.0;

// Window defaults
pub const DEFAULT_WINDOW_WIDTH: u32 = 1920;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 1080;
pub const WINDOW_TITLE: &str = "PathTracer";

// FPS readout refresh period in seconds
pub const FPS_WINDOW_SECS: f32 = 1.0;

// Default paths
pub const DEFAULT_SHADER_PATH: &str = "src/shaders/wgsl/path_trace.wgsl";
pub const DEFAULT_SCENE_PATH: &str = "resources/scenes/demo.yaml";

/// Resolve a data-file path: check next to the executable first, then macOS bundle, then CWD.
pub fn resolve_data_path(relative: &str) -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let candidates = [dir.join(relative), dir.join("../Resources").join(relative)];
            for path in &candidates {
                if path.exists() {
                    return path.clone();
                }
            }
        }
    }
    PathBuf::from(relative)
}

/// Resolve a resource path referenced from a scene file:
/// 1. as-is if it already exists (e.g. `cargo run` from the project root)
/// 2. relative to the scene file's directory
/// 3. via `resolve_data_path()`
/// 4. unchanged, leaving the missing file to the caller
pub fn resolve_resource_path(scene_dir: &Path, relative: &str) -> String {
    if Path::new(relative).exists() {
        return relative.to_string();
    }
    let scene_relative = scene_dir.join(relative);
    if scene_relative.exists() {
        return scene_relative.to_string_lossy().into_owned();
    }
    let data = resolve_data_path(relative);
    if data.exists() {
        return data.to_string_lossy().into_owned();
    }
    relative.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_scene_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bunny.obj"), "").unwrap();

        let resolved = resolve_resource_path(dir.path(), "bunny.obj");
        assert_eq!(Path::new(&resolved), dir.path().join("bunny.obj"));
    }

    #[test]
    fn test_resolve_missing_returns_input() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_resource_path(dir.path(), "does/not/exist.obj"),
            "does/not/exist.obj"
        );
    }
}
