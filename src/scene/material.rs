// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::constants::{IOR_NUDGE, MIN_ROUGHNESS};

/// Principled-BSDF-style material.
///
/// The alpha channel of every colour carries a second parameter:
/// albedo.a = opacity, subsurface.a = subsurface weight,
/// specular_tint.a = IOR level, emission.a = emission strength.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Material {
    #[serde(default = "default_albedo")]
    pub albedo: [f32; 4],

    #[serde(default)]
    pub subsurface: [f32; 4],

    #[serde(default = "default_specular_tint")]
    pub specular_tint: [f32; 4],

    #[serde(default)]
    pub emission: [f32; 4],

    #[serde(default = "default_roughness")]
    pub roughness: f32,

    #[serde(default)]
    pub metallic: f32,

    #[serde(default = "default_ior")]
    pub ior: f32,

    #[serde(default)]
    pub trs_weight: f32,
}

fn default_albedo() -> [f32; 4] {
    [0.8, 0.8, 0.8, 1.0]
}

fn default_specular_tint() -> [f32; 4] {
    [1.0, 1.0, 1.0, 0.5]
}

fn default_roughness() -> f32 {
    0.5
}

fn default_ior() -> f32 {
    1.5
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: default_albedo(),
            subsurface: [0.0; 4],
            specular_tint: default_specular_tint(),
            emission: [0.0; 4],
            roughness: default_roughness(),
            metallic: 0.0,
            ior: default_ior(),
            trs_weight: 0.0,
        }
    }
}

impl Material {
    pub fn emissive(color: [f32; 3], strength: f32) -> Self {
        Self {
            emission: [color[0], color[1], color[2], strength],
            ..Self::default()
        }
    }

    pub fn emission_strength(&self) -> f32 {
        self.emission[3]
    }

    pub fn is_emissive(&self) -> bool {
        self.emission_strength() > 0.0
    }

    /// Bring every field into the range the kernel can shade without
    /// singularities. Applied once, when the material enters the scene.
    pub fn clamped(&self) -> Self {
        let emission_rgb = clamp_unit3(&self.emission);
        Self {
            albedo: clamp_unit4(&self.albedo),
            subsurface: clamp_unit4(&self.subsurface),
            specular_tint: clamp_unit4(&self.specular_tint),
            emission: [
                emission_rgb[0],
                emission_rgb[1],
                emission_rgb[2],
                finite_or_zero(self.emission[3]).max(0.0),
            ],
            roughness: finite_or_zero(self.roughness).clamp(MIN_ROUGHNESS, 1.0),
            metallic: clamp_unit(self.metallic),
            ior: clamp_ior(self.ior),
            trs_weight: clamp_unit(self.trs_weight),
        }
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

fn clamp_unit(v: f32) -> f32 {
    finite_or_zero(v).clamp(0.0, 1.0)
}

fn clamp_unit3(v: &[f32; 4]) -> [f32; 3] {
    [clamp_unit(v[0]), clamp_unit(v[1]), clamp_unit(v[2])]
}

fn clamp_unit4(v: &[f32; 4]) -> [f32; 4] {
    v.map(clamp_unit)
}

// An ior of exactly 1.0 sends the refraction branch down a 0/0 path.
fn clamp_ior(ior: f32) -> f32 {
    let ior = finite_or_zero(ior).max(0.0);
    if ior == 1.0 { IOR_NUDGE } else { ior }
}

/// Must match the WGSL `Material` struct layout (80 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuMaterial {
    pub albedo: [f32; 4],
    pub subsurface: [f32; 4],
    pub specular_tint: [f32; 4],
    pub emission: [f32; 4],
    pub roughness: f32,
    pub metallic: f32,
    pub ior: f32,
    pub trs_weight: f32,
}

impl From<&Material> for GpuMaterial {
    fn from(mat: &Material) -> Self {
        Self {
            albedo: mat.albedo,
            subsurface: mat.subsurface,
            specular_tint: mat.specular_tint,
            emission: mat.emission,
            roughness: mat.roughness,
            metallic: mat.metallic,
            ior: mat.ior,
            trs_weight: mat.trs_weight,
        }
    }
}
