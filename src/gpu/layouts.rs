// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Bind group layouts of the path-trace kernel: group 0 camera, group 1
//! scene buffers + output image, group 2 accumulation.

/// Scene storage buffers in binding order; the output image follows them.
pub const SCENE_BUFFER_LABELS: [&str; 7] = [
    "spheres",
    "materials",
    "lights",
    "triangles",
    "vertices",
    "indices",
    "meshes",
];

pub const OUTPUT_IMAGE_BINDING: u32 = SCENE_BUFFER_LABELS.len() as u32;

pub struct KernelLayouts {
    pub camera: wgpu::BindGroupLayout,
    pub scene: wgpu::BindGroupLayout,
    pub accumulation: wgpu::BindGroupLayout,
}

impl KernelLayouts {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat) -> Self {
        let camera = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let mut scene_entries: Vec<wgpu::BindGroupLayoutEntry> = (0..OUTPUT_IMAGE_BINDING)
            .map(|binding| storage_entry(binding, true))
            .collect();
        scene_entries.push(wgpu::BindGroupLayoutEntry {
            binding: OUTPUT_IMAGE_BINDING,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: output_format,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        });
        let scene = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene layout"),
            entries: &scene_entries,
        });

        let accumulation = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("accumulation layout"),
            entries: &[storage_entry(0, false), storage_entry(1, false)],
        });

        Self {
            camera,
            scene,
            accumulation,
        }
    }

    /// In set order.
    pub fn all(&self) -> [&wgpu::BindGroupLayout; 3] {
        [&self.camera, &self.scene, &self.accumulation]
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}
