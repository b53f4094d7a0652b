// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::{Duration, Instant};

use crate::constants::FPS_WINDOW_SECS;

/// Presented-frame counters, updated by the scheduler after every present.
#[derive(Debug, Clone)]
pub struct FrameStats {
    frames_presented: u64,
    fps: f32,
    window_start: Instant,
    window_frames: u32,
}

impl FrameStats {
    pub fn new(now: Instant) -> Self {
        Self {
            frames_presented: 0,
            fps: 0.0,
            window_start: now,
            window_frames: 0,
        }
    }

    /// Returns the new FPS value when a measurement window closes.
    pub fn record_present(&mut self, now: Instant) -> Option<f32> {
        self.frames_presented += 1;
        self.window_frames += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < Duration::from_secs_f32(FPS_WINDOW_SECS) {
            return None;
        }
        self.fps = self.window_frames as f32 / elapsed.as_secs_f32();
        self.window_frames = 0;
        self.window_start = now;
        Some(self.fps)
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}
