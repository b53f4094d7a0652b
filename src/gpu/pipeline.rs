// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::error::RenderError;
use super::layouts::KernelLayouts;
use crate::render::accumulator::PushConstants;

const OUTPUT_FORMAT_TOKEN: &str = "rgba8unorm";

pub fn load_kernel_source(path: &Path) -> Result<String> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read compute shader: {}", path.display()))?;
    log::info!("Loaded compute shader {} ({} bytes)", path.display(), source.len());
    Ok(source)
}

/// The kernel is written against `rgba8unorm`; rewrite the storage format when
/// the surface (and thus the output image) is BGRA.
pub fn specialise_output_format(
    source: &str,
    format: wgpu::TextureFormat,
) -> Result<String, RenderError> {
    let token = match format {
        wgpu::TextureFormat::Rgba8Unorm => return Ok(source.to_string()),
        wgpu::TextureFormat::Bgra8Unorm => "bgra8unorm",
        other => {
            return Err(RenderError::UnsupportedSurface(format!(
                "{other:?} cannot be used as the output image format"
            )));
        }
    };
    if !source.contains(OUTPUT_FORMAT_TOKEN) {
        return Err(RenderError::Pipeline(format!(
            "kernel does not declare a {OUTPUT_FORMAT_TOKEN} output image"
        )));
    }
    Ok(source.replace(OUTPUT_FORMAT_TOKEN, token))
}

pub fn create_compute_pipeline(
    device: &wgpu::Device,
    shader_source: &str,
    layouts: &KernelLayouts,
    label: &str,
) -> Result<wgpu::ComputePipeline, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(shader_source.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} layout")),
        bind_group_layouts: &layouts.all(),
        push_constant_ranges: &[wgpu::PushConstantRange {
            stages: wgpu::ShaderStages::COMPUTE,
            range: 0..std::mem::size_of::<PushConstants>() as u32,
        }],
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        module: &shader_module,
        entry_point: Some("main"),
        compilation_options: Default::default(),
        cache: None,
    });

    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(RenderError::Pipeline(err.to_string())),
        None => Ok(pipeline),
    }
}
