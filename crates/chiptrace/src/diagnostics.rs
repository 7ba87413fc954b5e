//! Per-subsong health report.

use crate::error::TickFault;
use crate::tick::RunOutcome;

/// Where a subsong's execution faulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultRecord {
    /// Frame being sampled, or `None` if init faulted.
    pub frame: Option<usize>,
    /// The fault.
    pub fault: TickFault,
}

/// What happened while a subsong was sampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsongDiagnostics {
    /// Subsong index within the job.
    pub index: usize,
    /// Frames that made it into the song.
    pub frames_sampled: usize,
    /// Init result; `None` when init faulted.
    pub init_outcome: Option<RunOutcome>,
    /// Frames whose routine ran out of budget (still sampled).
    pub frame_timeouts: usize,
    /// First fault, if any. Sampling stopped there.
    pub fault: Option<FaultRecord>,
    /// Tracker events reconstructed.
    pub events: usize,
    /// Register writes captured across init and all sampled frames.
    pub writes: u64,
}

impl SubsongDiagnostics {
    /// Fresh report for subsong `index`.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            frames_sampled: 0,
            init_outcome: None,
            frame_timeouts: 0,
            fault: None,
            events: 0,
            writes: 0,
        }
    }

    /// Whether init completed normally.
    pub fn init_completed(&self) -> bool {
        self.init_outcome == Some(RunOutcome::Halted)
    }

    /// Anything short of a clean run: init did not halt, a frame timed out,
    /// or a fault cut sampling short.
    pub fn is_degraded(&self) -> bool {
        !self.init_completed() || self.frame_timeouts > 0 || self.fault.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AddressFault, CpuFault};

    #[test]
    fn clean_run_is_not_degraded() {
        let diag = SubsongDiagnostics {
            init_outcome: Some(RunOutcome::Halted),
            frames_sampled: 10,
            ..SubsongDiagnostics::new(0)
        };
        assert!(!diag.is_degraded());
    }

    #[test]
    fn degraded_conditions() {
        let base = SubsongDiagnostics {
            init_outcome: Some(RunOutcome::Halted),
            ..SubsongDiagnostics::new(1)
        };
        let timed_out_init = SubsongDiagnostics {
            init_outcome: Some(RunOutcome::TimedOut),
            ..base.clone()
        };
        let slow_frame = SubsongDiagnostics {
            frame_timeouts: 1,
            ..base.clone()
        };
        let faulted = SubsongDiagnostics {
            fault: Some(FaultRecord {
                frame: Some(3),
                fault: CpuFault::Address(AddressFault { address: 0xF000 }).into(),
            }),
            ..base
        };
        assert!(timed_out_init.is_degraded());
        assert!(slow_frame.is_degraded());
        assert!(faulted.is_degraded());
        assert!(SubsongDiagnostics::new(2).is_degraded());
    }
}
