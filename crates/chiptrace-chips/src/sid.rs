//! MOS 6581/8580 SID voice decoding.
//!
//! Each voice owns seven registers starting at `voice * 7`:
//! frequency lo/hi, pulse width lo/hi, control, attack/decay, sustain/release.
//! R21-R23 drive the filter, R24 holds the mode bits and master volume.

use bitflags::bitflags;

use crate::state::{ChannelDecode, Waveform};

/// Registers $D400-$D418.
pub const REGISTER_COUNT: usize = 25;
/// Oscillator voices.
pub const VOICES: usize = 3;
/// Register stride between voices.
pub const VOICE_STRIDE: usize = 7;
/// Mode/volume register.
pub const MODE_VOLUME: usize = 24;

const CONTROL_OFFSET: usize = 4;
const VOICE3_OFF: u8 = 0x80;
/// Oscillator accumulator width (24 bits).
const ACCUMULATOR_STEPS: f64 = 16_777_216.0;

bitflags! {
    /// Voice control register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControlFlags: u8 {
        /// Envelope gate
        const GATE = 0x01;
        /// Hard sync with the previous voice
        const SYNC = 0x02;
        /// Ring modulation with the previous voice
        const RING = 0x04;
        /// Oscillator reset/hold
        const TEST = 0x08;
        /// Triangle waveform
        const TRIANGLE = 0x10;
        /// Sawtooth waveform
        const SAWTOOTH = 0x20;
        /// Pulse waveform
        const PULSE = 0x40;
        /// Noise waveform
        const NOISE = 0x80;
    }
}

impl ControlFlags {
    const WAVEFORMS: ControlFlags = ControlFlags::TRIANGLE
        .union(ControlFlags::SAWTOOTH)
        .union(ControlFlags::PULSE)
        .union(ControlFlags::NOISE);

    /// Waveform selected by bits 4-7.
    pub fn waveform(&self) -> Waveform {
        let bits = self.intersection(Self::WAVEFORMS);
        if bits == ControlFlags::TRIANGLE {
            Waveform::Triangle
        } else if bits == ControlFlags::SAWTOOTH {
            Waveform::Sawtooth
        } else if bits == ControlFlags::PULSE {
            Waveform::Pulse
        } else if bits == ControlFlags::NOISE {
            Waveform::Noise
        } else if bits.is_empty() {
            Waveform::Off
        } else {
            Waveform::Combined(bits.bits() >> 4)
        }
    }
}

/// 16-bit oscillator frequency register of `voice`.
pub fn frequency_register(regs: &[u8], voice: usize) -> u16 {
    let base = voice * VOICE_STRIDE;
    u16::from_le_bytes([reg(regs, base), reg(regs, base + 1)])
}

/// Oscillator frequency: `reg * clock / 2^24`.
pub fn register_to_hz(freq_reg: u16, clock_hz: f64) -> Option<f64> {
    if freq_reg == 0 {
        None
    } else {
        Some(freq_reg as f64 * clock_hz / ACCUMULATOR_STEPS)
    }
}

/// Decode voice `voice` (0-2) from a SID register dump.
///
/// The gate bit acts as the channel enable; loudness follows the master
/// volume since the ADSR level itself is not observable from the registers.
pub fn decode_voice(regs: &[u8], voice: usize, clock_hz: f64) -> ChannelDecode {
    let freq_reg = frequency_register(regs, voice);
    let control = ControlFlags::from_bits_truncate(reg(regs, voice * VOICE_STRIDE + CONTROL_OFFSET));
    let mode_volume = reg(regs, MODE_VOLUME);
    let waveform = control.waveform();

    let muted = control.contains(ControlFlags::TEST)
        || (voice == 2 && mode_volume & VOICE3_OFF != 0)
        || waveform == Waveform::Off;

    ChannelDecode {
        period: freq_reg as u32,
        frequency_hz: register_to_hz(freq_reg, clock_hz),
        volume: mode_volume & 0x0F,
        enabled: control.contains(ControlFlags::GATE) && !muted,
        waveform,
    }
}

fn reg(regs: &[u8], index: usize) -> u8 {
    regs.get(index).copied().unwrap_or(0)
}
