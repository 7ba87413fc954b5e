//! Paula voices as driven by macro players.
//!
//! Macro formats never touch the real AUDx registers through code we execute;
//! the interpreter writes a compact synthetic layout instead, four registers
//! per channel: period hi, period lo, volume (0-64), waveform slot.
//! Waveform slot 0 means DMA off.

use crate::state::{ChannelDecode, Waveform};

/// Four channels times four synthetic registers.
pub const REGISTER_COUNT: usize = 16;
/// Hardware channels.
pub const CHANNELS: usize = 4;
/// Register stride between channels.
pub const CHANNEL_STRIDE: usize = 4;

/// Offset of the period high byte.
pub const PERIOD_HI: usize = 0;
/// Offset of the period low byte.
pub const PERIOD_LO: usize = 1;
/// Offset of the volume register.
pub const VOLUME: usize = 2;
/// Offset of the waveform slot register.
pub const WAVEFORM: usize = 3;

/// Paula's maximum volume.
pub const MAX_VOLUME: u8 = 64;
/// Samples per cycle of a synthetic macro waveform.
pub const CYCLE_LENGTH: f64 = 32.0;

/// Register index of `offset` on `channel`.
pub const fn register(channel: usize, offset: usize) -> u8 {
    (channel * CHANNEL_STRIDE + offset) as u8
}

/// Output frequency for a period: one waveform cycle every `period * 32` clocks.
pub fn period_to_hz(period: u16, clock_hz: f64) -> Option<f64> {
    if period == 0 {
        None
    } else {
        Some(clock_hz / (period as f64 * CYCLE_LENGTH))
    }
}

/// Decode channel `channel` (0-3).
pub fn decode_channel(regs: &[u8], channel: usize, clock_hz: f64) -> ChannelDecode {
    let base = channel * CHANNEL_STRIDE;
    let period = u16::from_be_bytes([reg(regs, base + PERIOD_HI), reg(regs, base + PERIOD_LO)]);
    let slot = reg(regs, base + WAVEFORM);
    let waveform = if slot == 0 {
        Waveform::Off
    } else {
        Waveform::Sample(slot)
    };

    ChannelDecode {
        period: period as u32,
        frequency_hz: period_to_hz(period, clock_hz),
        volume: reg(regs, base + VOLUME).min(MAX_VOLUME),
        enabled: slot != 0 && period != 0,
        waveform,
    }
}

fn reg(regs: &[u8], index: usize) -> u8 {
    regs.get(index).copied().unwrap_or(0)
}
