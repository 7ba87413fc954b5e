//! Song/subsong assembly: one independent pipeline per subsong.

use log::{debug, trace, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ExtractionConfig;
use crate::diagnostics::SubsongDiagnostics;
use crate::error::ExtractError;
use crate::job::{ExtractionJob, SubsongEntry};
use crate::memory::MemoryImage;
use crate::pattern::{Pattern, build_patterns, rows_from_events};
use crate::reconstruct::reconstruct;
use crate::sampler::FrameSampler;

/// Reconstructed patterns and order list of one subsong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subsong {
    /// Position in the job's subsong list.
    pub index: usize,
    /// Channels per row.
    pub channels: usize,
    /// Distinct patterns.
    pub patterns: Vec<Pattern>,
    /// Pattern indices in play order.
    pub order: Vec<usize>,
}

impl Subsong {
    /// Subsong with no patterns (init failed or nothing was sampled).
    pub fn empty(index: usize, channels: usize) -> Self {
        Self {
            index,
            channels,
            patterns: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Whether nothing was reconstructed.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total rows when the order list is played through.
    pub fn row_count(&self) -> usize {
        self.order
            .iter()
            .filter_map(|&idx| self.patterns.get(idx))
            .map(Pattern::len)
            .sum()
    }
}

/// Song model handed to the tracker side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructedSong {
    /// One entry per job subsong, in job order.
    pub subsongs: Vec<Subsong>,
}

/// Song plus per-subsong diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// The song model.
    pub song: ReconstructedSong,
    /// Aligned with `song.subsongs`.
    pub diagnostics: Vec<SubsongDiagnostics>,
}

impl Extraction {
    /// Subsongs whose extraction was cut short or otherwise degraded.
    pub fn degraded(&self) -> impl Iterator<Item = &SubsongDiagnostics> {
        self.diagnostics.iter().filter(|d| d.is_degraded())
    }
}

/// Loads a job once and extracts each of its subsongs.
#[derive(Debug, Clone)]
pub struct Extractor {
    job: ExtractionJob,
    memory: MemoryImage,
    config: ExtractionConfig,
}

impl Extractor {
    /// Validate `config` and build the memory image. Either failure is fatal
    /// for the whole file.
    pub fn new(job: ExtractionJob, config: ExtractionConfig) -> Result<Self, ExtractError> {
        config.validate()?;
        let memory = MemoryImage::load(job.memory_size, &job.blocks)?;
        debug!(
            "loaded {} blocks into {:#x} bytes, {} subsongs",
            job.blocks.len(),
            memory.size(),
            job.subsongs.len()
        );
        Ok(Self {
            job,
            memory,
            config,
        })
    }

    /// The job being extracted.
    pub fn job(&self) -> &ExtractionJob {
        &self.job
    }

    /// Active configuration.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Song model only. Never fails; faulty subsongs come back empty or short.
    pub fn assemble(&self) -> ReconstructedSong {
        self.extract().song
    }

    /// Song model plus diagnostics.
    pub fn extract(&self) -> Extraction {
        let entries: Vec<(usize, SubsongEntry)> =
            self.job.subsongs.iter().copied().enumerate().collect();
        let results: Vec<(Subsong, SubsongDiagnostics)> = if self.config.parallel {
            entries
                .par_iter()
                .map(|&(index, entry)| self.extract_subsong(index, entry))
                .collect()
        } else {
            entries
                .iter()
                .map(|&(index, entry)| self.extract_subsong(index, entry))
                .collect()
        };

        let (subsongs, diagnostics) = results.into_iter().unzip();
        Extraction {
            song: ReconstructedSong { subsongs },
            diagnostics,
        }
    }

    /// Run one subsong through sampling, reconstruction and pattern building.
    pub fn extract_subsong(
        &self,
        index: usize,
        entry: SubsongEntry,
    ) -> (Subsong, SubsongDiagnostics) {
        let chip = self.job.chip;
        let channels = chip.family.channel_count();
        debug!(
            "subsong {index}: init {:#06x} frame {:#06x} selector {}",
            entry.init, entry.frame, entry.selector
        );

        let mut source = self.job.engine.build(self.memory.clone(), chip, entry);
        let sampled = FrameSampler::new(chip, &self.config).sample(index, source.as_mut());
        let mut diagnostics = sampled.diagnostics;

        let subsong = if sampled.snapshots.is_empty() {
            Subsong::empty(index, channels)
        } else {
            let events = reconstruct(&sampled.baseline, &sampled.snapshots, &self.config.pitch);
            diagnostics.events = events.len();
            for event in &events {
                trace!(
                    "subsong {index} row {} ch {}: {}",
                    event.frame, event.channel, event.kind
                );
            }
            let rows = rows_from_events(&events, sampled.snapshots.len(), channels);
            let (patterns, order) = build_patterns(rows, self.config.frames_per_block);
            Subsong {
                index,
                channels,
                patterns,
                order,
            }
        };

        if diagnostics.is_degraded() {
            warn!(
                "subsong {index} degraded: init {:?}, {} frame timeouts, fault {:?}",
                diagnostics.init_outcome, diagnostics.frame_timeouts, diagnostics.fault
            );
        }
        debug!(
            "subsong {index}: {} frames ({:.1} s), {} events, {} patterns",
            diagnostics.frames_sampled,
            diagnostics.frames_sampled as f64 / self.job.frame_rate_hz,
            diagnostics.events,
            subsong.patterns.len()
        );
        (subsong, diagnostics)
    }
}
