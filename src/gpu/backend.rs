// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use super::context::GpuContext;
use super::error::RenderError;
use super::pipeline::{create_compute_pipeline, specialise_output_format};
use super::resources::ResourceManager;
use super::slots::ResourceVersions;
use crate::camera::camera::CameraUniform;
use crate::render::frame::{BindSet, FrameCommand};
use crate::render::scheduler::{Acquire, FrameBackend, PresentStatus};
use crate::scene::SceneStore;

/// [`FrameBackend`] on a wgpu device and window surface.
///
/// wgpu tracks texture usage itself, so recorded barriers only end the
/// current compute pass; the transitions are inserted at pass boundaries.
pub struct WgpuBackend {
    gpu: GpuContext,
    resources: ResourceManager,
    pipeline: wgpu::ComputePipeline,
    window_size: (u32, u32),
}

impl WgpuBackend {
    pub fn new(
        gpu: GpuContext,
        store: &SceneStore,
        kernel_source: &str,
    ) -> Result<Self, RenderError> {
        let (width, height) = (gpu.width(), gpu.height());
        let output_format = gpu.surface_format();
        let resources = ResourceManager::new(&gpu.device, store, width, height, output_format)?;
        let source = specialise_output_format(kernel_source, output_format)?;
        let pipeline =
            create_compute_pipeline(&gpu.device, &source, resources.layouts(), "path trace")?;
        log::info!("Renderer ready at {width}x{height} ({output_format:?})");
        Ok(Self {
            gpu,
            resources,
            pipeline,
            window_size: (width, height),
        })
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Latest drawable size reported by the window; applied on the next rebuild.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    /// Replace the scene buffers after a reload. The scheduler rebinds before
    /// the next recorded frame.
    pub fn upload_scene(&mut self, store: &SceneStore) -> Result<(), RenderError> {
        self.wait_idle()?;
        self.resources.upload_scene_buffers(&self.gpu.device, store)
    }

    fn check_device(&self) -> Result<(), RenderError> {
        match self.gpu.device_lost() {
            Some(reason) => Err(RenderError::DeviceLost(reason)),
            None => Ok(()),
        }
    }

    fn encode(
        &self,
        commands: &[FrameCommand],
        target: &wgpu::Texture,
    ) -> Result<wgpu::CommandBuffer, RenderError> {
        let scene_group = self
            .resources
            .scene_bind_group()
            .ok_or_else(|| RenderError::Pipeline("scene bind group missing".into()))?;
        let accumulation_group = self
            .resources
            .accumulation_bind_group()
            .ok_or_else(|| RenderError::Pipeline("accumulation bind group missing".into()))?;

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        let mut pass: Option<wgpu::ComputePass<'static>> = None;

        for command in commands {
            match *command {
                FrameCommand::ClearAccumulation => {
                    pass = None;
                    self.resources.accumulation().clear(&mut encoder);
                }
                FrameCommand::BindPipeline => {
                    compute_pass(&mut pass, &mut encoder).set_pipeline(&self.pipeline);
                }
                FrameCommand::BindGroup(set) => {
                    let group = match set {
                        BindSet::Camera { slot } => self.resources.camera_bind_group(slot),
                        BindSet::Scene => scene_group,
                        BindSet::Accumulation => accumulation_group,
                    };
                    compute_pass(&mut pass, &mut encoder).set_bind_group(
                        set.index(),
                        Some(group),
                        &[],
                    );
                }
                FrameCommand::PushConstants(constants) => {
                    compute_pass(&mut pass, &mut encoder)
                        .set_push_constants(0, bytemuck::bytes_of(&constants));
                }
                FrameCommand::Dispatch { x, y } => {
                    compute_pass(&mut pass, &mut encoder).dispatch_workgroups(x, y, 1);
                }
                FrameCommand::Barrier { .. } => {
                    pass = None;
                }
                FrameCommand::CopyOutputToSurface { width, height } => {
                    pass = None;
                    let output = self.resources.output();
                    let width = width.min(output.width).min(target.width());
                    let height = height.min(output.height).min(target.height());
                    encoder.copy_texture_to_texture(
                        output.texture.as_image_copy(),
                        target.as_image_copy(),
                        wgpu::Extent3d {
                            width,
                            height,
                            depth_or_array_layers: 1,
                        },
                    );
                }
            }
        }
        drop(pass);
        Ok(encoder.finish())
    }
}

fn compute_pass<'p>(
    pass: &'p mut Option<wgpu::ComputePass<'static>>,
    encoder: &mut wgpu::CommandEncoder,
) -> &'p mut wgpu::ComputePass<'static> {
    pass.get_or_insert_with(|| {
        encoder
            .begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("path trace pass"),
                timestamp_writes: None,
            })
            .forget_lifetime()
    })
}

impl FrameBackend for WgpuBackend {
    type Fence = wgpu::SubmissionIndex;
    type Image = wgpu::SurfaceTexture;

    fn surface_size(&self) -> (u32, u32) {
        self.window_size
    }

    fn wait_fence(&mut self, fence: wgpu::SubmissionIndex) -> Result<(), RenderError> {
        self.gpu
            .device
            .poll(wgpu::Maintain::WaitForSubmissionIndex(fence));
        self.check_device()
    }

    /// Presents are queued on the same queue as submissions, so ordering is
    /// already serialised; this reclaims finished work and surfaces device loss.
    fn wait_presentation_idle(&mut self) -> Result<(), RenderError> {
        self.gpu.device.poll(wgpu::Maintain::Poll);
        self.check_device()
    }

    fn wait_idle(&mut self) -> Result<(), RenderError> {
        self.gpu.device.poll(wgpu::Maintain::Wait);
        self.check_device()
    }

    fn acquire(&mut self) -> Result<Acquire<wgpu::SurfaceTexture>, RenderError> {
        match self.gpu.surface.get_current_texture() {
            Ok(texture) => Ok(Acquire::Ready(texture)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => Ok(Acquire::Stale),
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface acquire timed out");
                Ok(Acquire::Stale)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(RenderError::Allocation {
                resource: "surface texture".into(),
                message: "out of memory".into(),
            }),
            #[allow(unreachable_patterns)]
            Err(e) => Err(RenderError::Surface(e.to_string())),
        }
    }

    fn rebuild_for_size(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.gpu.resize(width, height);
        self.resources.resize(&self.gpu.device, width, height)?;
        self.check_device()
    }

    fn resource_versions(&self) -> ResourceVersions {
        self.resources.versions()
    }

    fn rebind(&mut self) -> Result<ResourceVersions, RenderError> {
        if self.resources.bound_versions() == self.resources.versions() {
            return Ok(self.resources.bound_versions());
        }
        self.resources.rebind_descriptors(&self.gpu.device)
    }

    fn write_camera(&mut self, slot: usize, uniform: &CameraUniform) {
        self.resources.write_camera(&self.gpu.queue, slot, uniform);
    }

    fn submit(
        &mut self,
        commands: &[FrameCommand],
        image: &wgpu::SurfaceTexture,
    ) -> Result<wgpu::SubmissionIndex, RenderError> {
        let command_buffer = self.encode(commands, &image.texture)?;
        Ok(self.gpu.queue.submit(Some(command_buffer)))
    }

    fn present(&mut self, image: wgpu::SurfaceTexture) -> Result<PresentStatus, RenderError> {
        let suboptimal = image.suboptimal;
        image.present();
        self.check_device()?;
        Ok(if suboptimal {
            PresentStatus::Stale
        } else {
            PresentStatus::Ok
        })
    }
}
