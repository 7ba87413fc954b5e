//! Trace-based music extraction.
//!
//! Many chiptune formats are not data but programs: a replay routine plus
//! song data, or per-voice macro bytecode. This crate runs that code against
//! an emulated CPU (or a macro interpreter), captures the sound-chip register
//! writes it makes, and rebuilds tracker events, deduplicated patterns and an
//! order list from them.
//!
//! Pipeline per subsong:
//!
//! 1. clone the job's [`MemoryImage`]
//! 2. run the init routine on a [`TickSource`] until it halts
//! 3. run the frame routine `frame_count` times, latching writes into a
//!    [`ChipState`](chiptrace_chips::ChipState) and snapshotting each frame
//! 4. diff consecutive snapshots into [`TrackerEvent`]s
//! 5. cut rows into blocks and deduplicate them into [`Pattern`]s
//!
//! Subsongs are independent and run on the rayon pool.
//!
//! ```no_run
//! use chiptrace::{EngineSpec, ExtractionConfig, ExtractionJob, Extractor, LoadBlock, SubsongEntry};
//! use chiptrace_chips::{ChipConfig, ChipFamily};
//!
//! # fn main() -> Result<(), chiptrace::ExtractError> {
//! # let code = vec![0xC9];
//! let job = ExtractionJob::new(
//!     0x10000,
//!     vec![LoadBlock::new(0x8000, code)],
//!     EngineSpec::zx_spectrum(0xFFFF),
//!     ChipConfig::with_default_clock(ChipFamily::Ay8910),
//! )
//! .with_subsongs([SubsongEntry::new(0x8000, 0x8003, 0)]);
//!
//! let extraction = Extractor::new(job, ExtractionConfig::default())?.extract();
//! for subsong in &extraction.song.subsongs {
//!     println!("{} patterns, {} orders", subsong.patterns.len(), subsong.order.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod assembler;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod job;
pub mod memory;
pub mod pattern;
pub mod reconstruct;
pub mod sampler;
pub mod tick;

pub use crate::assembler::{Extraction, Extractor, ReconstructedSong, Subsong};
pub use crate::config::ExtractionConfig;
pub use crate::diagnostics::{FaultRecord, SubsongDiagnostics};
pub use crate::error::{
    AddressFault, ConfigError, CpuFault, ExtractError, LoadError, MacroFault, TickFault,
};
pub use crate::job::{ExtractionJob, SubsongEntry};
pub use crate::memory::{LoadBlock, MAX_MEMORY_SIZE, MemoryImage, Width};
pub use crate::pattern::{Cell, Pattern, PatternPool, Row};
pub use crate::reconstruct::{EventKind, TrackerEvent};
pub use crate::sampler::{FrameSampler, SampledSubsong};
pub use crate::tick::{
    ChipWindow, EngineSpec, MacroSource, Mos6502Source, PortMap, Routine, RoutineRun, RunOutcome,
    TickSource, Z80Source,
};
