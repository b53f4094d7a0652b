// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// Light type tags shared with the kernel. `2` (point) and `4` (cone) are
/// reserved by the kernel and not produced by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum LightType {
    Ambient = 0,
    Sphere = 1,
    Directional = 3,
    Triangle = 5,
}

impl LightType {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Where a light comes from. Sphere and triangle lights are derived from
/// emissive primitives; the kernel re-reads triangle geometry by index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightSource {
    Ambient,
    Sphere { center: Vec3, radius: f32 },
    Triangle { index: u32 },
    Directional { direction: Vec3 },
}

impl LightSource {
    pub fn light_type(&self) -> LightType {
        match self {
            Self::Ambient => LightType::Ambient,
            Self::Sphere { .. } => LightType::Sphere,
            Self::Triangle { .. } => LightType::Triangle,
            Self::Directional { .. } => LightType::Directional,
        }
    }

    /// The `pos_angle_aux` payload the kernel reads for this light.
    pub fn payload(&self) -> Vec4 {
        match *self {
            Self::Ambient => Vec4::ZERO,
            Self::Sphere { center, radius } => center.extend(radius),
            Self::Triangle { index } => Vec4::new(index as f32, 0.0, 0.0, 0.0),
            Self::Directional { direction } => direction.normalize_or_zero().extend(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub source: LightSource,
    pub color: Vec3,
    pub strength: f32,
    /// Prefix sum of `strength` over this light and every light before it.
    pub accumulated_str: f32,
}

impl Light {
    pub fn to_gpu(&self) -> GpuLight {
        GpuLight {
            pos_angle_aux: self.source.payload().into(),
            color_str: self.color.extend(self.strength).into(),
            light_type: self.source.light_type().as_i32(),
            accumulated_str: self.accumulated_str,
            _pad: [0; 2],
        }
    }
}

/// Must match the WGSL `Light` struct layout (48 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuLight {
    pub pos_angle_aux: [f32; 4],
    pub color_str: [f32; 4],
    pub light_type: i32,
    pub accumulated_str: f32,
    pub _pad: [u32; 2],
}

/// Append-only light list with running prefix sums for importance sampling.
///
/// The kernel draws `u * strength_sum` and binary-searches the
/// `accumulated_str` column, so entries must stay in insertion order.
#[derive(Debug, Clone, Default)]
pub struct LightList {
    lights: Vec<Light>,
    strength_sum: f32,
}

impl LightList {
    pub fn push(&mut self, source: LightSource, color: Vec3, strength: f32) {
        self.strength_sum += strength;
        self.lights.push(Light {
            source,
            color,
            strength,
            accumulated_str: self.strength_sum,
        });
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn strength_sum(&self) -> f32 {
        self.strength_sum
    }

    pub fn to_gpu(&self) -> Vec<GpuLight> {
        self.lights.iter().map(Light::to_gpu).collect()
    }

    /// Host-side mirror of the kernel's light pick: the first light whose
    /// accumulated strength exceeds `u * strength_sum`, for `u` in `[0, 1)`.
    pub fn sample(&self, u: f32) -> Option<usize> {
        if self.lights.is_empty() || self.strength_sum <= 0.0 {
            return None;
        }
        let target = u * self.strength_sum;
        let idx = self.lights.partition_point(|l| l.accumulated_str <= target);
        Some(idx.min(self.lights.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(strengths: &[f32]) -> LightList {
        let mut lights = LightList::default();
        for (i, &s) in strengths.iter().enumerate() {
            lights.push(LightSource::Triangle { index: i as u32 }, Vec3::ONE, s);
        }
        lights
    }

    #[test]
    fn test_prefix_sums() {
        let lights = list(&[5.0, 0.5, 2.0, 10.0]);
        let l = lights.lights();
        assert_eq!(l[0].accumulated_str, l[0].strength);
        for i in 1..l.len() {
            assert_eq!(l[i].accumulated_str, l[i - 1].accumulated_str + l[i].strength);
        }
        assert_eq!(l.last().unwrap().accumulated_str, lights.strength_sum());
        assert_eq!(lights.strength_sum(), 17.5);
    }

    #[test]
    fn test_empty_list_sum_is_zero() {
        let lights = LightList::default();
        assert_eq!(lights.strength_sum(), 0.0);
        assert_eq!(lights.sample(0.5), None);
    }

    #[test]
    fn test_sample_is_proportional_to_strength() {
        let lights = list(&[1.0, 3.0]);
        assert_eq!(lights.sample(0.0), Some(0));
        assert_eq!(lights.sample(0.2), Some(0));
        assert_eq!(lights.sample(0.25), Some(1));
        assert_eq!(lights.sample(0.99), Some(1));
    }

    #[test]
    fn test_payload_packing() {
        let sphere = LightSource::Sphere {
            center: Vec3::new(1.0, 2.0, 3.0),
            radius: 0.5,
        };
        assert_eq!(sphere.payload(), Vec4::new(1.0, 2.0, 3.0, 0.5));
        assert_eq!(
            LightSource::Triangle { index: 7 }.payload(),
            Vec4::new(7.0, 0.0, 0.0, 0.0)
        );
        assert_eq!(
            LightSource::Directional { direction: Vec3::new(0.0, -2.0, 0.0) }.payload(),
            Vec4::new(0.0, -1.0, 0.0, 0.0)
        );
        assert_eq!(LightSource::Ambient.payload(), Vec4::ZERO);
    }

    #[test]
    fn test_gpu_light_layout_and_tags() {
        assert_eq!(std::mem::size_of::<GpuLight>(), 48);
        let lights = list(&[2.0]);
        let gpu = lights.to_gpu();
        assert_eq!(gpu[0].light_type, 5);
        assert_eq!(gpu[0].color_str, [1.0, 1.0, 1.0, 2.0]);
        assert_eq!(gpu[0].accumulated_str, 2.0);
    }
}
