//! AY-3-8910 / YM2149 PSG channel decoding.
//!
//! Register layout (R0-R15):
//!
//! - R0-R5: tone period fine/coarse for channels A, B, C (12 bits)
//! - R6: noise period
//! - R7: mixer (active low tone bits 0-2, noise bits 3-5)
//! - R8-R10: channel amplitude (bits 0-3), bit 4 selects the envelope
//! - R11-R12: envelope period, R13: envelope shape
//! - R14-R15: I/O ports

use bitflags::bitflags;

use crate::state::{ChannelDecode, Waveform};

/// Latched registers, including the two I/O ports.
pub const REGISTER_COUNT: usize = 16;
/// Tone channels.
pub const CHANNELS: usize = 3;

/// Mixer control register.
pub const MIXER: usize = 7;
/// First amplitude register (channel A).
pub const AMPLITUDE_A: usize = 8;
/// Envelope shape register.
pub const ENVELOPE_SHAPE: usize = 13;

const AMPLITUDE_MASK: u8 = 0x0F;
const ENVELOPE_MODE: u8 = 0x10;
const ENVELOPE_VOLUME: u8 = 15;

bitflags! {
    /// Mixer Control Register (R7) bitflags. A set bit disables the source.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MixerFlags: u8 {
        /// Channel A tone disable
        const CH_A_TONE = 0x01;
        /// Channel B tone disable
        const CH_B_TONE = 0x02;
        /// Channel C tone disable
        const CH_C_TONE = 0x04;
        /// Channel A noise disable
        const CH_A_NOISE = 0x08;
        /// Channel B noise disable
        const CH_B_NOISE = 0x10;
        /// Channel C noise disable
        const CH_C_NOISE = 0x20;
    }
}

impl MixerFlags {
    /// Create mixer flags from raw register value.
    pub fn from_register(value: u8) -> Self {
        MixerFlags::from_bits_truncate(value)
    }

    /// Whether tone output is enabled for `channel`.
    pub fn tone_enabled(&self, channel: usize) -> bool {
        !self.contains(MixerFlags::from_bits_truncate(1 << channel))
    }

    /// Whether noise output is enabled for `channel`.
    pub fn noise_enabled(&self, channel: usize) -> bool {
        !self.contains(MixerFlags::from_bits_truncate(8 << channel))
    }
}

/// 12-bit tone period of `channel`.
pub fn tone_period(regs: &[u8], channel: usize) -> u16 {
    let fine = reg(regs, channel * 2) as u16;
    let coarse = (reg(regs, channel * 2 + 1) & 0x0F) as u16;
    fine | (coarse << 8)
}

/// Tone frequency for a period: `clock / (16 * period)`.
///
/// The tone counter treats period 0 as 1, so every channel has a pitch and
/// noise-only channels with an unset tone period still decode as audible.
pub fn period_to_hz(period: u16, clock_hz: f64) -> f64 {
    clock_hz / (16.0 * period.max(1) as f64)
}

/// Decode channel `channel` (0-2) from a PSG register dump.
pub fn decode_channel(regs: &[u8], channel: usize, clock_hz: f64) -> ChannelDecode {
    let period = tone_period(regs, channel);
    let mixer = MixerFlags::from_register(reg(regs, MIXER));
    let tone = mixer.tone_enabled(channel);
    let noise = mixer.noise_enabled(channel);

    let amp_raw = reg(regs, AMPLITUDE_A + channel);
    let envelope = amp_raw & ENVELOPE_MODE != 0;

    let (volume, waveform) = if envelope {
        let shape = reg(regs, ENVELOPE_SHAPE) & 0x0F;
        (ENVELOPE_VOLUME, Waveform::Envelope(shape))
    } else {
        let source = match (tone, noise) {
            (true, true) => Waveform::SquareNoise,
            (true, false) => Waveform::Square,
            (false, true) => Waveform::Noise,
            (false, false) => Waveform::Off,
        };
        (amp_raw & AMPLITUDE_MASK, source)
    };

    ChannelDecode {
        period: period as u32,
        frequency_hz: Some(period_to_hz(period, clock_hz)),
        volume,
        enabled: tone || noise,
        waveform,
    }
}

/// Human-readable name for an envelope shape.
pub fn envelope_shape_name(shape: u8) -> &'static str {
    match shape & 0x0F {
        0x00..=0x03 => "\\___",
        0x04..=0x07 => "/___",
        0x08 => "\\\\\\\\",
        0x09 => "\\___",
        0x0A => "\\/\\/",
        0x0B => "\\¯¯¯",
        0x0C => "////",
        0x0D => "/¯¯¯",
        0x0E => "/\\/\\",
        _ => "/___",
    }
}

fn reg(regs: &[u8], index: usize) -> u8 {
    regs.get(index).copied().unwrap_or(0)
}
