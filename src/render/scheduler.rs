// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Instant;

use glam::Vec3;

use super::accumulator::AccumulationController;
use super::config::RenderConfig;
use super::frame::{FrameCommand, record_frame};
use super::stats::FrameStats;
use crate::camera::camera::{Camera, CameraUniform};
use crate::constants::MAX_FRAMES_IN_FLIGHT;
use crate::gpu::error::RenderError;
use crate::gpu::slots::ResourceVersions;
use crate::scene::light::LightList;

/// Result of acquiring a presentable image.
pub enum Acquire<I> {
    Ready(I),
    /// Surface no longer matches the window; rebuild before rendering.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    Ok,
    /// Presented, but the surface is out of date or suboptimal.
    Stale,
}

/// The GPU operations the scheduler drives. Fatal conditions are returned as
/// [`RenderError`]; stale surfaces are reported through [`Acquire`] and
/// [`PresentStatus`].
pub trait FrameBackend {
    /// Submission token signalled when the GPU finishes a frame.
    type Fence;
    /// Acquired presentable image.
    type Image;

    fn surface_size(&self) -> (u32, u32);
    fn wait_fence(&mut self, fence: Self::Fence) -> Result<(), RenderError>;
    fn wait_presentation_idle(&mut self) -> Result<(), RenderError>;
    fn wait_idle(&mut self) -> Result<(), RenderError>;
    fn acquire(&mut self) -> Result<Acquire<Self::Image>, RenderError>;

    /// Reconfigure the surface and recreate size-dependent resources.
    /// Called only after [`wait_idle`](Self::wait_idle).
    fn rebuild_for_size(&mut self, width: u32, height: u32) -> Result<(), RenderError>;

    fn resource_versions(&self) -> ResourceVersions;
    /// Rebuild bind groups against the current slots; returns the versions bound.
    fn rebind(&mut self) -> Result<ResourceVersions, RenderError>;

    fn write_camera(&mut self, slot: usize, uniform: &CameraUniform);
    fn submit(
        &mut self,
        commands: &[FrameCommand],
        image: &Self::Image,
    ) -> Result<Self::Fence, RenderError>;
    fn present(&mut self, image: Self::Image) -> Result<PresentStatus, RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Acquiring,
    Recording,
    Submitted,
    Presenting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Window minimised.
    ZeroSize,
    StaleSurface,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Presented {
        slot: usize,
        reset: bool,
        /// New FPS value when the measurement window closed this frame.
        fps: Option<f32>,
    },
    Skipped(SkipReason),
}

struct FrameSlot<F> {
    fence: Option<F>,
}

/// Drives `Idle → Acquiring → Recording → Submitted → Presenting → Idle`
/// with at most [`MAX_FRAMES_IN_FLIGHT`] frames on the GPU.
pub struct FrameScheduler<B: FrameBackend> {
    backend: B,
    slots: Vec<FrameSlot<B::Fence>>,
    current: usize,
    state: FrameState,
    resize_pending: bool,
    bound: ResourceVersions,
    world_up: Vec3,
    stats: FrameStats,
}

impl<B: FrameBackend> FrameScheduler<B> {
    pub fn new(mut backend: B, config: &RenderConfig) -> Result<Self, RenderError> {
        let bound = backend.rebind()?;
        Ok(Self {
            backend,
            slots: (0..MAX_FRAMES_IN_FLIGHT)
                .map(|_| FrameSlot { fence: None })
                .collect(),
            current: 0,
            state: FrameState::Idle,
            resize_pending: false,
            bound,
            world_up: config.world_up,
            stats: FrameStats::new(Instant::now()),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn current_slot(&self) -> usize {
        self.current
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn resize_pending(&self) -> bool {
        self.resize_pending
    }

    /// Sampled at the start of the next tick; the frame in flight is untouched.
    pub fn request_resize(&mut self) {
        self.resize_pending = true;
    }

    pub fn tick(
        &mut self,
        accumulation: &mut AccumulationController,
        camera: &Camera,
        lights: &LightList,
    ) -> Result<TickOutcome, RenderError> {
        let outcome = self.run_frame(accumulation, camera, lights);
        self.state = FrameState::Idle;
        outcome
    }

    fn run_frame(
        &mut self,
        accumulation: &mut AccumulationController,
        camera: &Camera,
        lights: &LightList,
    ) -> Result<TickOutcome, RenderError> {
        let (width, height) = self.backend.surface_size();
        if width == 0 || height == 0 {
            return Ok(TickOutcome::Skipped(SkipReason::ZeroSize));
        }
        if self.resize_pending {
            self.rebuild(width, height, accumulation)?;
        }

        if let Some(fence) = self.slots[self.current].fence.take() {
            self.backend.wait_fence(fence)?;
        }
        self.backend.wait_presentation_idle()?;

        self.state = FrameState::Acquiring;
        let image = match self.backend.acquire()? {
            Acquire::Ready(image) => image,
            Acquire::Stale => {
                log::debug!("Surface stale at acquire, rebuilding");
                self.rebuild(width, height, accumulation)?;
                return Ok(TickOutcome::Skipped(SkipReason::StaleSurface));
            }
        };

        self.state = FrameState::Recording;
        self.ensure_bindings_current()?;
        let metadata = accumulation.consume_frame_metadata(
            lights.len() as u32,
            lights.strength_sum(),
            self.world_up,
        );
        self.backend
            .write_camera(self.current, &camera.to_gpu(width, height));
        let commands = record_frame(self.current, width, height, metadata.push_constants());

        let fence = self.backend.submit(&commands, &image)?;
        self.slots[self.current].fence = Some(fence);
        self.state = FrameState::Submitted;

        self.state = FrameState::Presenting;
        if self.backend.present(image)? == PresentStatus::Stale {
            self.resize_pending = true;
        }
        let fps = self.stats.record_present(Instant::now());

        let slot = self.current;
        self.current = (self.current + 1) % MAX_FRAMES_IN_FLIGHT;
        Ok(TickOutcome::Presented {
            slot,
            reset: metadata.reset,
            fps,
        })
    }

    /// Never records against bind groups built for replaced resources.
    fn ensure_bindings_current(&mut self) -> Result<(), RenderError> {
        let current = self.backend.resource_versions();
        if self.bound == current {
            return Ok(());
        }
        log::debug!("Bindings stale ({:?} vs {:?}), rebinding", self.bound, current);
        self.bound = self.backend.rebind()?;
        let current = self.backend.resource_versions();
        if self.bound != current {
            return Err(RenderError::StaleBindings {
                bound: self.bound,
                current,
            });
        }
        Ok(())
    }

    fn rebuild(
        &mut self,
        width: u32,
        height: u32,
        accumulation: &mut AccumulationController,
    ) -> Result<(), RenderError> {
        self.backend.wait_idle()?;
        for slot in &mut self.slots {
            slot.fence = None;
        }
        self.backend.rebuild_for_size(width, height)?;
        self.bound = self.backend.rebind()?;
        accumulation.mark_dirty();
        self.resize_pending = false;
        log::debug!("Rebuilt size-dependent resources at {width}x{height}");
        Ok(())
    }

    /// Drain the GPU before the backend is dropped.
    pub fn shutdown(&mut self) -> Result<(), RenderError> {
        self.backend.wait_idle()?;
        for slot in &mut self.slots {
            slot.fence = None;
        }
        Ok(())
    }
}
