//! Tick sources: anything that advances replay logic one step at a time and
//! reports the sound-chip register writes each step produced.
//!
//! Three back-ends exist:
//!
//! - [`Z80Source`]: native Z80 replay code, chip on I/O ports ([`PortMap`])
//! - [`Mos6502Source`]: native 6502 replay code, chip memory-mapped
//! - [`MacroSource`]: per-voice macro bytecode writing synthetic Paula registers
//!
//! All of them are driven through [`TickSource`] so the frame sampler never
//! needs to know which one it is talking to.

mod m6502;
mod macro_interp;
mod z80;

use chiptrace_chips::{ChipConfig, MAX_REGISTERS, RegisterWrite};
use serde::{Deserialize, Serialize};

use crate::error::TickFault;
use crate::job::SubsongEntry;
use crate::memory::MemoryImage;

pub use macro_interp::{MacroOpcode, MacroSource};
pub use m6502::Mos6502Source;
pub use z80::{PortMap, Z80Source};

/// Return address pushed before entering a routine; reaching it means the
/// routine returned.
pub const SENTINEL_RETURN: u16 = 0x0000;

/// Which routine of the subsong to run next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Routine {
    /// One-time initialization (receives the subsong selector).
    Init,
    /// Per-frame play routine.
    Frame,
}

/// How a bounded routine run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunOutcome {
    /// The routine returned or halted.
    Halted,
    /// The step budget ran out first.
    TimedOut,
}

/// Writes and step count of one routine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineRun {
    /// Writes in execution order.
    pub writes: Vec<RegisterWrite>,
    /// Steps executed.
    pub steps: usize,
    /// Halted or timed out.
    pub outcome: RunOutcome,
}

/// A stepped executor of replay logic.
pub trait TickSource {
    /// Short back-end name for log output.
    fn name(&self) -> &'static str;

    /// Position execution at `routine`'s entry and reset the tick counter.
    fn enter(&mut self, routine: Routine);

    /// Execute one step. Steps taken after halting are no-ops.
    fn step(&mut self) -> Result<Vec<RegisterWrite>, TickFault>;

    /// Whether the current routine has finished.
    fn is_halted(&self) -> bool;

    /// Step until halted or `step_budget` steps have run.
    ///
    /// Running out of budget is reported as [`RunOutcome::TimedOut`], not as
    /// an error.
    fn run_until_halt(&mut self, step_budget: usize) -> Result<RoutineRun, TickFault> {
        let mut writes = Vec::new();
        let mut steps = 0;
        while !self.is_halted() {
            if steps >= step_budget {
                return Ok(RoutineRun {
                    writes,
                    steps,
                    outcome: RunOutcome::TimedOut,
                });
            }
            writes.extend(self.step()?);
            steps += 1;
        }
        Ok(RoutineRun {
            writes,
            steps,
            outcome: RunOutcome::Halted,
        })
    }
}

/// Address range where a sound chip is memory-mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipWindow {
    /// Address of chip register 0.
    pub base: u16,
    /// Number of registers mapped.
    pub len: u16,
}

impl ChipWindow {
    /// C64 SID at $D400-$D418.
    pub const SID: ChipWindow = ChipWindow {
        base: 0xD400,
        len: chiptrace_chips::sid::REGISTER_COUNT as u16,
    };

    /// Register index for `address`, if it falls inside the window.
    ///
    /// The window never reaches past [`MAX_REGISTERS`]; longer windows are
    /// cut there and the addresses beyond stay plain memory.
    pub fn register(&self, address: u16) -> Option<u8> {
        let offset = address.checked_sub(self.base)?;
        if offset >= self.len || offset as usize >= MAX_REGISTERS {
            return None;
        }
        u8::try_from(offset).ok()
    }
}

impl Default for ChipWindow {
    fn default() -> Self {
        ChipWindow::SID
    }
}

/// Execution engine a job's code targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EngineSpec {
    /// Z80 replay code.
    Z80 {
        /// How the chip is wired to the I/O space.
        ports: PortMap,
        /// Stack pointer loaded before each routine.
        stack: u16,
        /// Memory-mapped chip, if the machine has one.
        #[serde(default)]
        chip_window: Option<ChipWindow>,
    },
    /// 6502 replay code with a memory-mapped chip.
    Mos6502 {
        /// Where the chip registers live.
        #[serde(default)]
        chip_window: ChipWindow,
    },
    /// Macro bytecode, one program per voice.
    Macro,
}

impl EngineSpec {
    /// Z80 on the ZX Spectrum 128 port layout.
    pub fn zx_spectrum(stack: u16) -> Self {
        EngineSpec::Z80 {
            ports: PortMap::Zx128,
            stack,
            chip_window: None,
        }
    }

    /// 6502 with the SID at $D400.
    pub fn c64() -> Self {
        EngineSpec::Mos6502 {
            chip_window: ChipWindow::SID,
        }
    }

    /// Build a tick source over `memory` for one subsong.
    pub fn build(
        &self,
        memory: MemoryImage,
        chip: ChipConfig,
        entry: SubsongEntry,
    ) -> Box<dyn TickSource> {
        match *self {
            EngineSpec::Z80 {
                ports,
                stack,
                chip_window,
            } => Box::new(Z80Source::new(memory, ports, chip_window, stack, entry)),
            EngineSpec::Mos6502 { chip_window } => {
                Box::new(Mos6502Source::new(memory, chip_window, entry))
            }
            EngineSpec::Macro => Box::new(MacroSource::new(
                memory,
                chip.family.channel_count(),
                entry.init,
            )),
        }
    }
}
