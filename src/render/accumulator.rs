// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Instant;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Per-frame push-constant block. Must match the WGSL `FrameParams` layout (32 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq)]
pub struct PushConstants {
    pub time: f32,
    pub frame: u32,
    pub light_count: u32,
    pub light_strength_sum: f32,
    pub world_up: [f32; 3],
    pub reset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMetadata {
    pub time: f32,
    pub frame_index: u32,
    pub light_count: u32,
    pub light_strength_sum: f32,
    pub world_up: Vec3,
    pub reset: bool,
}

impl FrameMetadata {
    pub fn push_constants(&self) -> PushConstants {
        PushConstants {
            time: self.time,
            frame: self.frame_index,
            light_count: self.light_count,
            light_strength_sum: self.light_strength_sum,
            world_up: self.world_up.into(),
            reset: self.reset as u32,
        }
    }
}

/// Decides once per frame whether progressive accumulation restarts.
///
/// Any number of [`mark_dirty`](Self::mark_dirty) calls between two frames
/// coalesce into a single reset on the next consumed frame.
pub struct AccumulationController {
    enabled: bool,
    dirty: bool,
    frame_index: u32,
    sample_count: u32,
    render_start: Instant,
}

impl AccumulationController {
    /// Starts dirty so the first frame clears freshly created buffers.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            dirty: true,
            frame_index: 0,
            sample_count: 0,
            render_start: Instant::now(),
        }
    }

    /// Camera moved, FOV changed, resources were resized or the scene reloaded.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            log::info!(
                "Accumulation {}",
                if enabled { "enabled" } else { "disabled" }
            );
            self.enabled = enabled;
            self.dirty = true;
        }
    }

    pub fn toggle(&mut self) {
        self.set_enabled(!self.enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Samples accumulated since the last reset, including the frame just consumed.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn consume_frame_metadata(
        &mut self,
        light_count: u32,
        light_strength_sum: f32,
        world_up: Vec3,
    ) -> FrameMetadata {
        let reset = std::mem::take(&mut self.dirty) || !self.enabled;
        if reset {
            self.sample_count = 1;
            log::debug!("Accumulation reset at frame {}", self.frame_index);
        } else {
            self.sample_count = self.sample_count.saturating_add(1);
        }

        let metadata = FrameMetadata {
            time: self.render_start.elapsed().as_secs_f32(),
            frame_index: self.frame_index,
            light_count,
            light_strength_sum,
            world_up,
            reset,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consume(controller: &mut AccumulationController) -> FrameMetadata {
        controller.consume_frame_metadata(3, 7.5, Vec3::Y)
    }

    #[test]
    fn test_push_constant_layout() {
        assert_eq!(std::mem::size_of::<PushConstants>(), 32);
        assert_eq!(std::mem::offset_of!(PushConstants, world_up), 16);
        assert_eq!(std::mem::offset_of!(PushConstants, reset), 28);
    }

    #[test]
    fn test_first_frame_resets() {
        let mut controller = AccumulationController::new(true);
        assert!(consume(&mut controller).reset);
        assert!(!consume(&mut controller).reset);
    }

    #[test]
    fn test_camera_move_resets_exactly_once() {
        let mut controller = AccumulationController::new(true);
        consume(&mut controller);

        controller.mark_dirty();
        assert!(consume(&mut controller).reset);
        assert!(!consume(&mut controller).reset);
        assert!(!consume(&mut controller).reset);
    }

    #[test]
    fn test_multiple_changes_coalesce() {
        let mut controller = AccumulationController::new(true);
        consume(&mut controller);

        controller.mark_dirty();
        controller.mark_dirty();
        controller.mark_dirty();
        assert!(consume(&mut controller).reset);
        assert!(!consume(&mut controller).reset);
    }

    #[test]
    fn test_disabled_resets_every_frame() {
        let mut controller = AccumulationController::new(false);
        for _ in 0..4 {
            assert!(consume(&mut controller).reset);
            assert_eq!(controller.sample_count(), 1);
        }

        controller.set_enabled(true);
        assert!(consume(&mut controller).reset);
        assert!(!consume(&mut controller).reset);
        assert_eq!(controller.sample_count(), 2);
    }

    #[test]
    fn test_toggle_marks_dirty() {
        let mut controller = AccumulationController::new(true);
        consume(&mut controller);
        controller.set_enabled(true);
        assert!(!controller.is_dirty(), "no-op toggle");
        controller.toggle();
        assert!(controller.is_dirty());
        assert!(!controller.is_enabled());
    }

    #[test]
    fn test_metadata_fields() {
        let mut controller = AccumulationController::new(true);
        let first = consume(&mut controller);
        let second = consume(&mut controller);
        assert_eq!(first.frame_index, 0);
        assert_eq!(second.frame_index, 1);
        assert!(second.time >= first.time);

        let push = second.push_constants();
        assert_eq!(push.light_count, 3);
        assert_eq!(push.light_strength_sum, 7.5);
        assert_eq!(push.world_up, [0.0, 1.0, 0.0]);
        assert_eq!(push.reset, 0);
        assert_eq!(first.push_constants().reset, 1);
    }
}
