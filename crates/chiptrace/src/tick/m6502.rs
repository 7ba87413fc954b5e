//! 6502 tick source with a memory-mapped chip.

use ::mos6502::cpu::CPU;
use ::mos6502::instruction::Nmos6502;
use ::mos6502::memory::Bus;
use ::mos6502::registers::StackPointer;
use chiptrace_chips::{MAX_REGISTERS, RegisterWrite};

use super::{ChipWindow, Routine, SENTINEL_RETURN, TickSource};
use crate::error::{AddressFault, CpuFault, TickFault};
use crate::job::SubsongEntry;
use crate::memory::MemoryImage;

const BRK_OPCODE: u8 = 0x00;
const STACK_PAGE: u16 = 0x0100;
const STACK_TOP: u8 = 0xFF;

/// RAM plus the chip window. Chip registers are write-only on real hardware;
/// reads return the last value written so read-modify-write code behaves.
struct C64Bus {
    memory: MemoryImage,
    window: ChipWindow,
    shadow: [u8; MAX_REGISTERS],
    pending: Vec<(u8, u8)>,
    fault: Option<AddressFault>,
}

impl C64Bus {
    fn record_fault(&mut self, address: u16) {
        self.fault.get_or_insert(AddressFault {
            address: address as u32,
        });
    }
}

impl Bus for C64Bus {
    fn get_byte(&mut self, addr: u16) -> u8 {
        if let Some(register) = self.window.register(addr) {
            return self.shadow.get(register as usize).copied().unwrap_or(0);
        }
        match self.memory.read_byte(addr as u32) {
            Ok(value) => value,
            Err(_) => {
                self.record_fault(addr);
                0xFF
            }
        }
    }

    fn set_byte(&mut self, addr: u16, val: u8) {
        if let Some(register) = self.window.register(addr) {
            if let Some(slot) = self.shadow.get_mut(register as usize) {
                *slot = val;
            }
            self.pending.push((register, val));
            return;
        }
        if self.memory.write_byte(addr as u32, val).is_err() {
            self.record_fault(addr);
        }
    }
}

/// Runs 6502 replay routines and captures chip writes.
pub struct Mos6502Source {
    cpu: CPU<C64Bus, Nmos6502>,
    entry: SubsongEntry,
    tick: u32,
    halted: bool,
}

impl Mos6502Source {
    /// Fresh CPU over `memory`.
    pub fn new(memory: MemoryImage, window: ChipWindow, entry: SubsongEntry) -> Self {
        let bus = C64Bus {
            memory,
            window,
            shadow: [0; MAX_REGISTERS],
            pending: Vec::new(),
            fault: None,
        };
        Self {
            cpu: CPU::new(bus, Nmos6502),
            entry,
            tick: 0,
            halted: true,
        }
    }

    /// JSR-style call: RTS pops the pushed address and adds one, so pushing
    /// `SENTINEL_RETURN - 1` lands on the sentinel.
    fn emulate_call(&mut self, entry: u16) {
        let ret = SENTINEL_RETURN.wrapping_sub(1);
        let mut sp = STACK_TOP;
        for byte in [(ret >> 8) as u8, ret as u8] {
            self.cpu.memory.set_byte(STACK_PAGE | sp as u16, byte);
            sp = sp.wrapping_sub(1);
        }
        self.cpu.registers.stack_pointer = StackPointer(sp);
        self.cpu.registers.program_counter = entry;
    }

    fn refresh_halted(&mut self) {
        let pc = self.cpu.registers.program_counter;
        self.halted = pc == SENTINEL_RETURN
            || self.cpu.memory.memory.read_byte(pc as u32).ok() == Some(BRK_OPCODE);
    }
}

impl TickSource for Mos6502Source {
    fn name(&self) -> &'static str {
        "6502"
    }

    fn enter(&mut self, routine: Routine) {
        self.tick = 0;
        self.cpu.memory.pending.clear();
        self.cpu.memory.fault = None;
        let entry = match routine {
            Routine::Init => {
                self.cpu.registers.accumulator = self.entry.selector;
                self.entry.init
            }
            Routine::Frame => self.entry.frame,
        };
        self.emulate_call(entry);
        self.refresh_halted();
    }

    fn step(&mut self) -> Result<Vec<RegisterWrite>, TickFault> {
        if self.halted {
            return Ok(Vec::new());
        }
        let pc = self.cpu.registers.program_counter;
        let Some(decoded) = self.cpu.fetch_next_and_decode() else {
            self.halted = true;
            if let Some(fault) = self.cpu.memory.fault.take() {
                return Err(CpuFault::Address(fault).into());
            }
            let opcode = self.cpu.memory.get_byte(pc);
            return Err(CpuFault::IllegalOpcode { opcode, pc }.into());
        };
        self.cpu.execute_instruction(decoded);
        if let Some(fault) = self.cpu.memory.fault.take() {
            self.halted = true;
            return Err(CpuFault::Address(fault).into());
        }

        let tick = self.tick;
        self.tick = self.tick.saturating_add(1);
        let writes = self
            .cpu
            .memory
            .pending
            .drain(..)
            .map(|(register, value)| RegisterWrite::new(register, value, tick))
            .collect();
        self.refresh_halted();
        Ok(writes)
    }

    fn is_halted(&self) -> bool {
        self.halted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::LoadBlock;
    use crate::tick::RunOutcome;

    fn source(code: &[u8], selector: u8) -> Mos6502Source {
        let memory = MemoryImage::load(0x10000, &[LoadBlock::new(0x1000, code.to_vec())]).unwrap();
        Mos6502Source::new(
            memory,
            ChipWindow::SID,
            SubsongEntry::new(0x1000, 0x1000, selector),
        )
    }

    #[test]
    fn rts_to_sentinel_halts() {
        // LDA #$0F; STA $D418; RTS
        let mut cpu = source(&[0xA9, 0x0F, 0x8D, 0x18, 0xD4, 0x60], 0);
        cpu.enter(Routine::Init);
        let run = cpu.run_until_halt(100).unwrap();
        assert_eq!(run.outcome, RunOutcome::Halted);
        assert_eq!(run.steps, 3);
        assert_eq!(run.writes, vec![RegisterWrite::new(24, 0x0F, 1)]);
    }

    #[test]
    fn chip_writes_do_not_touch_ram() {
        let mut cpu = source(&[0xA9, 0x0F, 0x8D, 0x18, 0xD4, 0x60], 0);
        cpu.enter(Routine::Frame);
        cpu.run_until_halt(100).unwrap();
        assert_eq!(cpu.cpu.memory.memory.read_byte(0xD418), Ok(0));
        assert_eq!(cpu.cpu.memory.shadow[24], 0x0F);
    }

    #[test]
    fn selector_arrives_in_accumulator() {
        // STA $D400; RTS
        let mut cpu = source(&[0x8D, 0x00, 0xD4, 0x60], 3);
        cpu.enter(Routine::Init);
        let run = cpu.run_until_halt(100).unwrap();
        assert_eq!(run.writes, vec![RegisterWrite::new(0, 3, 0)]);
    }

    #[test]
    fn brk_halts_before_executing() {
        let mut cpu = source(&[0xEA, 0x00], 0);
        cpu.enter(Routine::Frame);
        let run = cpu.run_until_halt(100).unwrap();
        assert_eq!(run.steps, 1);
        assert_eq!(run.outcome, RunOutcome::Halted);
    }

    #[test]
    fn illegal_opcode_faults() {
        let mut cpu = source(&[0x02], 0);
        cpu.enter(Routine::Frame);
        let err = cpu.run_until_halt(100).unwrap_err();
        assert_eq!(
            err,
            TickFault::Cpu(CpuFault::IllegalOpcode {
                opcode: 0x02,
                pc: 0x1000
            })
        );
    }

    #[test]
    fn busy_loop_times_out() {
        // JMP $1000
        let mut cpu = source(&[0x4C, 0x00, 0x10], 0);
        cpu.enter(Routine::Frame);
        let run = cpu.run_until_halt(50).unwrap();
        assert_eq!(run.outcome, RunOutcome::TimedOut);
        assert_eq!(run.steps, 50);
    }
}
