// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use super::accumulator::PushConstants;
use crate::constants::WORKGROUP_SIZE;
use crate::gpu::buffers::dispatch_size;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameImage {
    Output,
    Surface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    Undefined,
    General,
    TransferSrc,
    TransferDst,
    Present,
}

/// The three bind groups the path-trace kernel expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindSet {
    /// Per-frame camera uniform of the given frame-in-flight slot.
    Camera { slot: usize },
    Scene,
    Accumulation,
}

impl BindSet {
    pub fn index(&self) -> u32 {
        match self {
            BindSet::Camera { .. } => 0,
            BindSet::Scene => 1,
            BindSet::Accumulation => 2,
        }
    }
}

/// One step of a recorded frame. Backends translate the list into API calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameCommand {
    /// Zero colour sum and sample count together.
    ClearAccumulation,
    BindPipeline,
    BindGroup(BindSet),
    PushConstants(PushConstants),
    Dispatch { x: u32, y: u32 },
    Barrier {
        image: FrameImage,
        from: ImageLayout,
        to: ImageLayout,
    },
    CopyOutputToSurface { width: u32, height: u32 },
}

/// Records one frame: compute pass over the whole output, then copy to the surface.
pub fn record_frame(
    slot: usize,
    width: u32,
    height: u32,
    push_constants: PushConstants,
) -> Vec<FrameCommand> {
    let mut commands = Vec::with_capacity(12);
    if push_constants.reset != 0 {
        commands.push(FrameCommand::ClearAccumulation);
    }
    commands.extend([
        FrameCommand::BindPipeline,
        FrameCommand::BindGroup(BindSet::Camera { slot }),
        FrameCommand::BindGroup(BindSet::Scene),
        FrameCommand::BindGroup(BindSet::Accumulation),
        FrameCommand::PushConstants(push_constants),
        FrameCommand::Dispatch {
            x: dispatch_size(width, WORKGROUP_SIZE),
            y: dispatch_size(height, WORKGROUP_SIZE),
        },
        FrameCommand::Barrier {
            image: FrameImage::Output,
            from: ImageLayout::General,
            to: ImageLayout::TransferSrc,
        },
        FrameCommand::Barrier {
            image: FrameImage::Surface,
            from: ImageLayout::Undefined,
            to: ImageLayout::TransferDst,
        },
        FrameCommand::CopyOutputToSurface { width, height },
        FrameCommand::Barrier {
            image: FrameImage::Output,
            from: ImageLayout::TransferSrc,
            to: ImageLayout::General,
        },
        FrameCommand::Barrier {
            image: FrameImage::Surface,
            from: ImageLayout::TransferDst,
            to: ImageLayout::Present,
        },
    ]);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(reset: bool) -> PushConstants {
        PushConstants {
            time: 0.0,
            frame: 0,
            light_count: 0,
            light_strength_sum: 0.0,
            world_up: [0.0, 1.0, 0.0],
            reset: reset as u32,
        }
    }

    fn position(commands: &[FrameCommand], wanted: FrameCommand) -> usize {
        commands
            .iter()
            .position(|c| *c == wanted)
            .unwrap_or_else(|| panic!("{wanted:?} not recorded"))
    }

    #[test]
    fn test_dispatch_covers_resolution() {
        let commands = record_frame(0, 1920, 1080, push(false));
        assert!(commands.contains(&FrameCommand::Dispatch { x: 120, y: 68 }));

        let commands = record_frame(0, 17, 1, push(false));
        assert!(commands.contains(&FrameCommand::Dispatch { x: 2, y: 1 }));
    }

    #[test]
    fn test_clear_only_on_reset() {
        let reset = record_frame(0, 64, 64, push(true));
        assert_eq!(reset[0], FrameCommand::ClearAccumulation);
        let clears = reset
            .iter()
            .filter(|c| **c == FrameCommand::ClearAccumulation)
            .count();
        assert_eq!(clears, 1);

        let steady = record_frame(0, 64, 64, push(false));
        assert!(!steady.contains(&FrameCommand::ClearAccumulation));
    }

    #[test]
    fn test_command_order() {
        let commands = record_frame(1, 800, 600, push(true));
        let clear = position(&commands, FrameCommand::ClearAccumulation);
        let pipeline = position(&commands, FrameCommand::BindPipeline);
        let dispatch = position(&commands, FrameCommand::Dispatch { x: 50, y: 38 });
        let to_src = position(
            &commands,
            FrameCommand::Barrier {
                image: FrameImage::Output,
                from: ImageLayout::General,
                to: ImageLayout::TransferSrc,
            },
        );
        let copy = position(
            &commands,
            FrameCommand::CopyOutputToSurface {
                width: 800,
                height: 600,
            },
        );
        let to_present = position(
            &commands,
            FrameCommand::Barrier {
                image: FrameImage::Surface,
                from: ImageLayout::TransferDst,
                to: ImageLayout::Present,
            },
        );
        assert!(clear < pipeline);
        assert!(pipeline < dispatch);
        assert!(dispatch < to_src);
        assert!(to_src < copy);
        assert!(copy < to_present);
    }

    #[test]
    fn test_binds_all_three_sets_for_slot() {
        let commands = record_frame(1, 8, 8, push(false));
        let sets: Vec<u32> = commands
            .iter()
            .filter_map(|c| match c {
                FrameCommand::BindGroup(set) => Some(set.index()),
                _ => None,
            })
            .collect();
        assert_eq!(sets, vec![0, 1, 2]);
        assert!(commands.contains(&FrameCommand::BindGroup(BindSet::Camera { slot: 1 })));
    }
}
