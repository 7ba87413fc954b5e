//! Sound-chip register sinks and channel decoders.
//!
//! Whatever produced the register writes (native replay code running on an
//! emulated CPU, or a macro bytecode interpreter), they all land in a
//! [`ChipState`]. Snapshots of that state are decoded into per-channel musical
//! parameters by pure, family-specific functions:
//!
//! - [`ay`]: AY-3-8910 / YM2149 PSG
//! - [`sid`]: MOS 6581/8580 SID
//! - [`paula`]: Amiga Paula voices as driven by macro players
//!
//! # Example
//!
//! ```
//! use chiptrace_chips::{ChipConfig, ChipFamily, ChipState, PitchReference, RegisterWrite};
//!
//! let mut chip = ChipState::new(ChipConfig::new(ChipFamily::Ay8910, 2_000_000.0));
//! chip.apply(RegisterWrite::new(0, 0xDE, 0)); // Tone A fine
//! chip.apply(RegisterWrite::new(1, 0x01, 1)); // Tone A coarse
//! chip.apply(RegisterWrite::new(7, 0x3E, 2)); // Mixer: tone A only
//! chip.apply(RegisterWrite::new(8, 0x0F, 3)); // Volume A
//!
//! let decoded = chip.decode_channel(0).unwrap();
//! let note = PitchReference::default().note_for(decoded.frequency_hz.unwrap());
//! assert_eq!(note, 60);
//! ```

#![warn(missing_docs)]

pub mod ay;
pub mod error;
pub mod family;
pub mod paula;
pub mod pitch;
pub mod registers;
pub mod sid;
pub mod state;

pub use error::{ChipError, Result};
pub use family::{ChipConfig, ChipFamily};
pub use pitch::{PitchReference, cents_between, note_name};
pub use registers::{MAX_REGISTERS, RegisterBank, RegisterWrite};
pub use state::{ChannelDecode, ChipState, FrameSnapshot, Waveform};
