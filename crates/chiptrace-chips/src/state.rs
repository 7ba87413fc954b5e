//! Latched chip state, frame snapshots and decoded channel parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ay;
use crate::error::{ChipError, Result};
use crate::family::ChipConfig;
use crate::registers::{RegisterBank, RegisterWrite};

/// Waveform (or sound source) a channel is currently producing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Waveform {
    /// Nothing routed to the output.
    Off,
    /// PSG square tone.
    Square,
    /// PSG noise only.
    Noise,
    /// PSG tone and noise mixed.
    SquareNoise,
    /// PSG hardware envelope with the given R13 shape.
    Envelope(u8),
    /// SID triangle.
    Triangle,
    /// SID sawtooth.
    Sawtooth,
    /// SID pulse.
    Pulse,
    /// SID combined waveform (raw control bits 4-7).
    Combined(u8),
    /// Paula sample/waveform slot.
    Sample(u8),
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Waveform::Off => write!(f, "off"),
            Waveform::Square => write!(f, "square"),
            Waveform::Noise => write!(f, "noise"),
            Waveform::SquareNoise => write!(f, "square+noise"),
            Waveform::Envelope(shape) => {
                write!(f, "env {:X} {}", shape, ay::envelope_shape_name(*shape))
            }
            Waveform::Triangle => write!(f, "triangle"),
            Waveform::Sawtooth => write!(f, "sawtooth"),
            Waveform::Pulse => write!(f, "pulse"),
            Waveform::Combined(bits) => write!(f, "combined {bits:02X}"),
            Waveform::Sample(slot) => write!(f, "sample {slot}"),
        }
    }
}

/// Musical view of one channel, derived purely from latched registers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelDecode {
    /// Raw period/frequency register value as the chip sees it.
    pub period: u32,
    /// Output frequency (None when the period does not produce a pitch).
    pub frequency_hz: Option<f64>,
    /// Volume in the family's native range (AY/SID 0-15, Paula 0-64).
    pub volume: u8,
    /// Whether the channel is routed to the output at all.
    pub enabled: bool,
    /// Current sound source.
    pub waveform: Waveform,
}

impl ChannelDecode {
    /// Silent, disabled channel.
    pub const SILENT: ChannelDecode = ChannelDecode {
        period: 0,
        frequency_hz: None,
        volume: 0,
        enabled: false,
        waveform: Waveform::Off,
    };

    /// A channel is audible when it is enabled, has a pitch and non-zero volume.
    pub fn is_audible(&self) -> bool {
        self.enabled && self.volume > 0 && self.frequency_hz.is_some()
    }
}

/// Live register table of one chip, mutated by [`RegisterWrite`] events.
#[derive(Debug, Clone)]
pub struct ChipState {
    config: ChipConfig,
    bank: RegisterBank,
    writes_applied: u64,
}

impl ChipState {
    /// Power-on state: every register zero.
    pub fn new(config: ChipConfig) -> Self {
        Self {
            config,
            bank: RegisterBank::new(config.family.register_count()),
            writes_applied: 0,
        }
    }

    /// Chip configuration.
    pub fn config(&self) -> ChipConfig {
        self.config
    }

    /// Number of musical channels.
    pub fn channel_count(&self) -> usize {
        self.config.family.channel_count()
    }

    /// Latch one write. Register indices past the family's table are ignored.
    pub fn apply(&mut self, write: RegisterWrite) {
        self.bank.write(write.register, write.value);
        self.writes_applied += 1;
    }

    /// Latch a batch of writes in order.
    pub fn apply_all<I>(&mut self, writes: I)
    where
        I: IntoIterator<Item = RegisterWrite>,
    {
        for write in writes {
            self.apply(write);
        }
    }

    /// Total writes latched so far.
    pub fn writes_applied(&self) -> u64 {
        self.writes_applied
    }

    /// Latched registers.
    pub fn registers(&self) -> &[u8] {
        self.bank.as_slice()
    }

    /// Deep copy of the current registers tagged with `frame`.
    pub fn snapshot(&self, frame: usize) -> FrameSnapshot {
        FrameSnapshot {
            frame,
            config: self.config,
            bank: self.bank,
        }
    }

    /// Decode channel `channel` from the latched registers.
    pub fn decode_channel(&self, channel: usize) -> Result<ChannelDecode> {
        decode(self.config, &self.bank, channel)
    }
}

/// Immutable copy of a [`ChipState`] taken at a frame boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSnapshot {
    frame: usize,
    config: ChipConfig,
    bank: RegisterBank,
}

impl FrameSnapshot {
    /// Frame index the snapshot was taken after.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Chip configuration at capture time.
    pub fn config(&self) -> ChipConfig {
        self.config
    }

    /// Registers at capture time.
    pub fn registers(&self) -> &[u8] {
        self.bank.as_slice()
    }

    /// Decode channel `channel` as it was at capture time.
    pub fn decode_channel(&self, channel: usize) -> Result<ChannelDecode> {
        decode(self.config, &self.bank, channel)
    }
}

fn decode(config: ChipConfig, bank: &RegisterBank, channel: usize) -> Result<ChannelDecode> {
    let channels = config.family.channel_count();
    if channel >= channels {
        return Err(ChipError::ChannelOutOfRange { channel, channels });
    }
    Ok(config
        .family
        .decode(bank.as_slice(), channel, config.clock_hz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{ATARI_ST_CLOCK, ChipFamily};

    fn psg() -> ChipState {
        ChipState::new(ChipConfig::new(ChipFamily::Ay8910, ATARI_ST_CLOCK))
    }

    #[test]
    fn power_on_state_is_silent() {
        let chip = psg();
        for ch in 0..chip.channel_count() {
            let decoded = chip.decode_channel(ch).unwrap();
            assert!(!decoded.is_audible());
        }
    }

    #[test]
    fn snapshot_is_detached_from_live_state() {
        let mut chip = psg();
        chip.apply(RegisterWrite::new(8, 0x0F, 0));
        let snap = chip.snapshot(3);
        chip.apply(RegisterWrite::new(8, 0x00, 1));

        assert_eq!(snap.frame(), 3);
        assert_eq!(snap.registers()[8], 0x0F);
        assert_eq!(chip.registers()[8], 0x00);
        assert_eq!(chip.writes_applied(), 2);
    }

    #[test]
    fn channel_out_of_range_is_reported() {
        let chip = psg();
        assert_eq!(
            chip.decode_channel(3),
            Err(ChipError::ChannelOutOfRange {
                channel: 3,
                channels: 3
            })
        );
    }

    #[test]
    fn replaying_writes_decodes_identically() {
        let writes = [
            RegisterWrite::new(0, 0xDE, 0),
            RegisterWrite::new(1, 0x01, 1),
            RegisterWrite::new(7, 0x3E, 2),
            RegisterWrite::new(8, 0x0C, 3),
            RegisterWrite::new(4, 0x10, 4),
            RegisterWrite::new(10, 0x1F, 5),
        ];
        let mut first = psg();
        let mut second = psg();
        first.apply_all(writes);
        second.apply_all(writes);
        for ch in 0..3 {
            assert_eq!(first.decode_channel(ch), second.decode_channel(ch));
        }
        assert_eq!(first.snapshot(0), second.snapshot(0));
    }
}
