//! Extraction tuning knobs.

use chiptrace_chips::PitchReference;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Frames sampled per subsong unless configured otherwise (6 s at 50 Hz).
pub const DEFAULT_FRAME_COUNT: usize = 300;
/// Rows per pattern block.
pub const DEFAULT_FRAMES_PER_BLOCK: usize = 16;
/// Step budget for an init routine.
pub const DEFAULT_INIT_STEP_BUDGET: usize = 1_000_000;
/// Step budget for one frame routine call.
pub const DEFAULT_FRAME_STEP_BUDGET: usize = 250_000;

/// Extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Frames sampled per subsong.
    pub frame_count: usize,
    /// Rows per pattern block.
    pub frames_per_block: usize,
    /// Steps an init routine may take before it is abandoned.
    pub init_step_budget: usize,
    /// Steps a frame routine may take before the frame is sampled anyway.
    pub frame_step_budget: usize,
    /// Frequency to note mapping.
    pub pitch: PitchReference,
    /// Extract subsongs on the rayon pool.
    pub parallel: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            frame_count: DEFAULT_FRAME_COUNT,
            frames_per_block: DEFAULT_FRAMES_PER_BLOCK,
            init_step_budget: DEFAULT_INIT_STEP_BUDGET,
            frame_step_budget: DEFAULT_FRAME_STEP_BUDGET,
            pitch: PitchReference::default(),
            parallel: true,
        }
    }
}

impl ExtractionConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ExtractionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_count == 0 {
            return Err(ConfigError::ZeroFrameCount);
        }
        if self.frames_per_block == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        if self.init_step_budget == 0 {
            return Err(ConfigError::ZeroStepBudget { routine: "init" });
        }
        if self.frame_step_budget == 0 {
            return Err(ConfigError::ZeroStepBudget { routine: "frame" });
        }
        let pitch = &self.pitch;
        if pitch.min_note > pitch.max_note {
            return Err(ConfigError::InvertedNoteRange {
                min: pitch.min_note,
                max: pitch.max_note,
            });
        }
        if !(pitch.reference_hz.is_finite() && pitch.reference_hz > 0.0) {
            return Err(ConfigError::InvalidReference(pitch.reference_hz));
        }
        Ok(())
    }

    /// Builder-style frame count override.
    pub fn with_frame_count(mut self, frames: usize) -> Self {
        self.frame_count = frames;
        self
    }

    /// Builder-style block size override.
    pub fn with_frames_per_block(mut self, frames: usize) -> Self {
        self.frames_per_block = frames;
        self
    }

    /// Builder-style parallelism switch.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ExtractionConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = ExtractionConfig::from_json(r#"{ "frame_count": 64 }"#).unwrap();
        assert_eq!(config.frame_count, 64);
        assert_eq!(config.frames_per_block, DEFAULT_FRAMES_PER_BLOCK);
        assert_eq!(config.pitch.reference_note, 69);
    }

    #[test]
    fn json_round_trip() {
        let config = ExtractionConfig::default()
            .with_frame_count(128)
            .with_parallel(false);
        let json = config.to_json().unwrap();
        assert_eq!(ExtractionConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let err = ExtractionConfig::from_json(r#"{ "frames_per_block": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroBlockSize));
    }

    #[test]
    fn inverted_note_range_is_rejected() {
        let mut config = ExtractionConfig::default();
        config.pitch.min_note = 100;
        config.pitch.max_note = 10;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedNoteRange { min: 100, max: 10 })
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            ExtractionConfig::from_json("{ frame_count"),
            Err(ConfigError::Json(_))
        ));
    }
}
