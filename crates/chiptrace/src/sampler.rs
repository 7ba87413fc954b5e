//! Runs a subsong's init once and its frame routine `frame_count` times,
//! latching register writes and snapshotting the chip after every frame.

use chiptrace_chips::{ChipConfig, ChipState, FrameSnapshot};
use log::{debug, trace};

use crate::config::ExtractionConfig;
use crate::diagnostics::{FaultRecord, SubsongDiagnostics};
use crate::tick::{Routine, RunOutcome, TickSource};

/// Snapshots of one subsong plus how sampling went.
#[derive(Debug, Clone)]
pub struct SampledSubsong {
    /// Power-on chip state; frame 0 is diffed against it.
    pub baseline: FrameSnapshot,
    /// One snapshot per sampled frame.
    pub snapshots: Vec<FrameSnapshot>,
    /// Sampling report (event count is filled in later).
    pub diagnostics: SubsongDiagnostics,
}

/// Drives a [`TickSource`] frame by frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler<'a> {
    chip: ChipConfig,
    config: &'a ExtractionConfig,
}

impl<'a> FrameSampler<'a> {
    /// Sampler for a chip under `config`.
    pub fn new(chip: ChipConfig, config: &'a ExtractionConfig) -> Self {
        Self { chip, config }
    }

    /// Sample subsong `index`.
    ///
    /// An init that faults or times out yields no frames. A frame that times
    /// out is still sampled; a frame that faults ends sampling and is dropped.
    pub fn sample(&self, index: usize, source: &mut dyn TickSource) -> SampledSubsong {
        let mut chip = ChipState::new(self.chip);
        let baseline = chip.snapshot(0);
        let mut diagnostics = SubsongDiagnostics::new(index);
        let mut snapshots = Vec::new();

        source.enter(Routine::Init);
        match source.run_until_halt(self.config.init_step_budget) {
            Ok(run) => {
                diagnostics.init_outcome = Some(run.outcome);
                debug!(
                    "subsong {index}: {} init {:?} after {} steps",
                    source.name(),
                    run.outcome,
                    run.steps
                );
                if run.outcome == RunOutcome::TimedOut {
                    return SampledSubsong {
                        baseline,
                        snapshots,
                        diagnostics,
                    };
                }
                diagnostics.writes += run.writes.len() as u64;
                chip.apply_all(run.writes);
            }
            Err(fault) => {
                debug!("subsong {index}: init fault: {fault}");
                diagnostics.fault = Some(FaultRecord { frame: None, fault });
                return SampledSubsong {
                    baseline,
                    snapshots,
                    diagnostics,
                };
            }
        }

        for frame in 0..self.config.frame_count {
            source.enter(Routine::Frame);
            match source.run_until_halt(self.config.frame_step_budget) {
                Ok(run) => {
                    if run.outcome == RunOutcome::TimedOut {
                        diagnostics.frame_timeouts += 1;
                    }
                    trace!(
                        "subsong {index} frame {frame}: {} writes in {} steps",
                        run.writes.len(),
                        run.steps
                    );
                    diagnostics.writes += run.writes.len() as u64;
                    chip.apply_all(run.writes);
                    snapshots.push(chip.snapshot(frame));
                }
                Err(fault) => {
                    debug!("subsong {index}: fault at frame {frame}: {fault}");
                    diagnostics.fault = Some(FaultRecord {
                        frame: Some(frame),
                        fault,
                    });
                    break;
                }
            }
        }

        diagnostics.frames_sampled = snapshots.len();
        SampledSubsong {
            baseline,
            snapshots,
            diagnostics,
        }
    }
}
