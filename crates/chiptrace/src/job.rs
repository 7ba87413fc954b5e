//! Extraction input as handed over by a format front-end.

use chiptrace_chips::ChipConfig;
use serde::{Deserialize, Serialize};

use crate::memory::LoadBlock;
use crate::tick::EngineSpec;

/// Default playback rate (PAL vertical blank).
pub const DEFAULT_FRAME_RATE_HZ: f64 = 50.0;

/// Entry points of one subsong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubsongEntry {
    /// Init routine (macro engine: voice table address).
    pub init: u16,
    /// Per-frame play routine (unused by the macro engine).
    pub frame: u16,
    /// Value loaded into the accumulator before init.
    #[serde(default)]
    pub selector: u8,
}

impl SubsongEntry {
    /// Create an entry.
    pub fn new(init: u16, frame: u16, selector: u8) -> Self {
        Self {
            init,
            frame,
            selector,
        }
    }

    /// `count` subsongs sharing one init/frame pair, selected by consecutive
    /// accumulator values starting at `first`.
    pub fn range(init: u16, frame: u16, count: usize, first: u8) -> Vec<SubsongEntry> {
        (0..count)
            .map(|i| SubsongEntry::new(init, frame, first.wrapping_add(i as u8)))
            .collect()
    }
}

/// Everything needed to extract a song from a loaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionJob {
    /// Size of the memory image.
    pub memory_size: usize,
    /// Blocks copied into memory in order.
    pub blocks: Vec<LoadBlock>,
    /// Code flavour.
    pub engine: EngineSpec,
    /// Chip being observed.
    pub chip: ChipConfig,
    /// Subsongs to extract.
    pub subsongs: Vec<SubsongEntry>,
    /// Frame routine call rate.
    #[serde(default = "default_frame_rate")]
    pub frame_rate_hz: f64,
}

fn default_frame_rate() -> f64 {
    DEFAULT_FRAME_RATE_HZ
}

impl ExtractionJob {
    /// Job with no subsongs yet, at the default frame rate.
    pub fn new(
        memory_size: usize,
        blocks: Vec<LoadBlock>,
        engine: EngineSpec,
        chip: ChipConfig,
    ) -> Self {
        Self {
            memory_size,
            blocks,
            engine,
            chip,
            subsongs: Vec::new(),
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
        }
    }

    /// Append subsongs.
    pub fn with_subsongs(mut self, subsongs: impl IntoIterator<Item = SubsongEntry>) -> Self {
        self.subsongs.extend(subsongs);
        self
    }

    /// Override the frame rate.
    pub fn with_frame_rate(mut self, hz: f64) -> Self {
        self.frame_rate_hz = hz;
        self
    }
}
