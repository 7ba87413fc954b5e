//! Per-voice macro bytecode interpreter.
//!
//! The subsong's init address points at a voice table: one little-endian
//! program address per chip channel, `0xFFFF` for an unused voice. Each frame
//! every running voice executes opcodes until one of them consumes the frame
//! (a wait or a ramp step) or the voice stops.
//!
//! Opcodes (multi-byte operands are big-endian):
//!
//! | byte | opcode       | operands                      |
//! |------|--------------|-------------------------------|
//! | 0x00 | `STOP`       |                               |
//! | 0x01 | `WAVE`       | slot u8                       |
//! | 0x02 | `PERIOD`     | period u16                    |
//! | 0x03 | `VOLUME`     | volume u8                     |
//! | 0x04 | `VOL_RAMP`   | start u8, end u8, frames u8   |
//! | 0x05 | `PITCH_RAMP` | start u16, end u16, frames u8 |
//! | 0x06 | `WAIT`       | frames u8                     |
//! | 0x07 | `JUMP`       | target u16                    |
//!
//! Writes go to the synthetic Paula layout in [`chiptrace_chips::paula`].

use chiptrace_chips::RegisterWrite;
use chiptrace_chips::paula::{PERIOD_HI, PERIOD_LO, VOLUME, WAVEFORM, register};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::{Routine, TickSource};
use crate::error::{AddressFault, MacroFault, TickFault};
use crate::memory::{MemoryImage, Width};

/// Marks an unused entry in the voice table.
pub const UNUSED_VOICE: u16 = 0xFFFF;

/// Macro instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum MacroOpcode {
    /// Stop the voice for good.
    Stop = 0x00,
    /// Select a waveform slot (0 turns the voice off).
    Wave = 0x01,
    /// Set the period.
    Period = 0x02,
    /// Set the volume.
    Volume = 0x03,
    /// Ramp the volume over a number of frames.
    VolumeRamp = 0x04,
    /// Ramp the period over a number of frames.
    PitchRamp = 0x05,
    /// Hold for a number of frames.
    Wait = 0x06,
    /// Continue at an absolute address.
    Jump = 0x07,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RampTarget {
    Volume,
    Period,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ramp {
    target: RampTarget,
    start: i32,
    end: i32,
    frames: u8,
    position: u8,
}

impl Ramp {
    /// Linear interpolation hitting `end` exactly on the last frame.
    fn value(&self) -> i32 {
        if self.frames <= 1 {
            self.end
        } else {
            let span = self.frames as i32 - 1;
            self.start + (self.end - self.start) * self.position as i32 / span
        }
    }

    fn finished(&self) -> bool {
        self.position >= self.frames
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    Stopped,
    Ready,
    Waiting { remaining: u8 },
    Ramping(Ramp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Voice {
    pc: u32,
    activity: Activity,
    /// Still owes the current frame a timed opcode.
    due: bool,
}

impl Voice {
    const IDLE: Voice = Voice {
        pc: 0,
        activity: Activity::Stopped,
        due: false,
    };

    fn consume_frame(&mut self, next: Activity) {
        self.activity = next;
        self.due = false;
    }
}

/// Interprets macro programs and reports synthetic Paula writes.
pub struct MacroSource {
    memory: MemoryImage,
    table: u16,
    voices: Vec<Voice>,
    loading_table: bool,
    tick: u32,
}

impl MacroSource {
    /// Interpreter for `channels` voices whose table lives at `table`.
    pub fn new(memory: MemoryImage, channels: usize, table: u16) -> Self {
        Self {
            memory,
            table,
            voices: vec![Voice::IDLE; channels],
            loading_table: false,
            tick: 0,
        }
    }

    /// Number of voices that have not stopped.
    pub fn running_voices(&self) -> usize {
        self.voices
            .iter()
            .filter(|v| v.activity != Activity::Stopped)
            .count()
    }

    fn load_table(&mut self) -> Result<(), MacroFault> {
        for (index, voice) in self.voices.iter_mut().enumerate() {
            let slot = self.table as u32 + 2 * index as u32;
            let address = self
                .memory
                .read(slot, Width::Word)
                .map_err(|f| fault(index, f))?
                as u16;
            *voice = if address == UNUSED_VOICE {
                Voice::IDLE
            } else {
                Voice {
                    pc: address as u32,
                    activity: Activity::Ready,
                    due: false,
                }
            };
        }
        Ok(())
    }

    fn advance(&mut self, index: usize, out: &mut Vec<(u8, u8)>) -> Result<(), MacroFault> {
        let mut voice = self.voices[index];
        let result = self.advance_voice(index, &mut voice, out);
        self.voices[index] = voice;
        result
    }

    fn advance_voice(
        &self,
        index: usize,
        voice: &mut Voice,
        out: &mut Vec<(u8, u8)>,
    ) -> Result<(), MacroFault> {
        match voice.activity {
            Activity::Stopped => {
                voice.due = false;
                return Ok(());
            }
            Activity::Waiting { remaining } => {
                let next = if remaining > 1 {
                    Activity::Waiting {
                        remaining: remaining - 1,
                    }
                } else {
                    Activity::Ready
                };
                voice.consume_frame(next);
                return Ok(());
            }
            Activity::Ramping(ramp) => {
                Self::continue_ramp(index, voice, ramp, out);
                return Ok(());
            }
            Activity::Ready => {}
        }

        let address = voice.pc;
        let byte = self.fetch_u8(index, &mut voice.pc)?;
        let opcode = MacroOpcode::from_u8(byte).ok_or(MacroFault::UnknownOpcode {
            voice: index,
            opcode: byte,
            address,
        })?;

        match opcode {
            MacroOpcode::Stop => voice.consume_frame(Activity::Stopped),
            MacroOpcode::Wave => {
                let slot = self.fetch_u8(index, &mut voice.pc)?;
                out.push((register(index, WAVEFORM), slot));
            }
            MacroOpcode::Period => {
                let period = self.fetch_u16(index, &mut voice.pc)?;
                emit(index, RampTarget::Period, period as i32, out);
            }
            MacroOpcode::Volume => {
                let volume = self.fetch_u8(index, &mut voice.pc)?;
                out.push((register(index, VOLUME), volume));
            }
            MacroOpcode::VolumeRamp => {
                let start = self.fetch_u8(index, &mut voice.pc)?;
                let end = self.fetch_u8(index, &mut voice.pc)?;
                let frames = self.fetch_u8(index, &mut voice.pc)?;
                Self::start_ramp(
                    index,
                    voice,
                    Ramp {
                        target: RampTarget::Volume,
                        start: start as i32,
                        end: end as i32,
                        frames,
                        position: 0,
                    },
                    out,
                );
            }
            MacroOpcode::PitchRamp => {
                let start = self.fetch_u16(index, &mut voice.pc)?;
                let end = self.fetch_u16(index, &mut voice.pc)?;
                let frames = self.fetch_u8(index, &mut voice.pc)?;
                Self::start_ramp(
                    index,
                    voice,
                    Ramp {
                        target: RampTarget::Period,
                        start: start as i32,
                        end: end as i32,
                        frames,
                        position: 0,
                    },
                    out,
                );
            }
            MacroOpcode::Wait => {
                let frames = self.fetch_u8(index, &mut voice.pc)?;
                match frames {
                    0 => {}
                    1 => voice.consume_frame(Activity::Ready),
                    n => voice.consume_frame(Activity::Waiting { remaining: n - 1 }),
                }
            }
            MacroOpcode::Jump => {
                voice.pc = self.fetch_u16(index, &mut voice.pc)? as u32;
            }
        }
        Ok(())
    }

    fn start_ramp(index: usize, voice: &mut Voice, ramp: Ramp, out: &mut Vec<(u8, u8)>) {
        if ramp.frames == 0 {
            emit(index, ramp.target, ramp.end, out);
            return;
        }
        Self::continue_ramp(index, voice, ramp, out);
    }

    fn continue_ramp(index: usize, voice: &mut Voice, mut ramp: Ramp, out: &mut Vec<(u8, u8)>) {
        emit(index, ramp.target, ramp.value(), out);
        ramp.position += 1;
        let next = if ramp.finished() {
            Activity::Ready
        } else {
            Activity::Ramping(ramp)
        };
        voice.consume_frame(next);
    }

    fn fetch_u8(&self, index: usize, pc: &mut u32) -> Result<u8, MacroFault> {
        let value = self.memory.read_byte(*pc).map_err(|f| fault(index, f))?;
        *pc += 1;
        Ok(value)
    }

    fn fetch_u16(&self, index: usize, pc: &mut u32) -> Result<u16, MacroFault> {
        let value = self.memory.read_be_word(*pc).map_err(|f| fault(index, f))?;
        *pc += 2;
        Ok(value)
    }
}

fn fault(voice: usize, fault: AddressFault) -> MacroFault {
    MacroFault::Address { voice, fault }
}

fn emit(channel: usize, target: RampTarget, value: i32, out: &mut Vec<(u8, u8)>) {
    match target {
        RampTarget::Volume => out.push((register(channel, VOLUME), value.clamp(0, 0xFF) as u8)),
        RampTarget::Period => {
            let [hi, lo] = (value.clamp(0, 0xFFFF) as u16).to_be_bytes();
            out.push((register(channel, PERIOD_HI), hi));
            out.push((register(channel, PERIOD_LO), lo));
        }
    }
}

impl TickSource for MacroSource {
    fn name(&self) -> &'static str {
        "macro"
    }

    fn enter(&mut self, routine: Routine) {
        self.tick = 0;
        match routine {
            Routine::Init => self.loading_table = true,
            Routine::Frame => {
                self.loading_table = false;
                for voice in &mut self.voices {
                    voice.due = voice.activity != Activity::Stopped;
                }
            }
        }
    }

    fn step(&mut self) -> Result<Vec<RegisterWrite>, TickFault> {
        let tick = self.tick;
        self.tick = self.tick.saturating_add(1);

        if self.loading_table {
            self.loading_table = false;
            self.load_table()?;
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for index in 0..self.voices.len() {
            if self.voices[index].due {
                self.advance(index, &mut out)?;
            }
        }
        Ok(out
            .into_iter()
            .map(|(register, value)| RegisterWrite::new(register, value, tick))
            .collect())
    }

    fn is_halted(&self) -> bool {
        !self.loading_table && self.voices.iter().all(|v| !v.due)
    }
}
