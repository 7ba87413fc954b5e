//! Z80 tick source with an AY-3-8910 port bridge.

use std::cell::Cell;

use chiptrace_chips::RegisterWrite;
use iz80::{Cpu, Machine, Reg8, Reg16};
use serde::{Deserialize, Serialize};

use super::{ChipWindow, Routine, SENTINEL_RETURN, TickSource};
use crate::error::{AddressFault, CpuFault, TickFault};
use crate::job::SubsongEntry;
use crate::memory::MemoryImage;

const HALT_OPCODE: u8 = 0x76;
const AY_REGISTER_MASK: u8 = 0x0F;

const ZX_PORT_MASK: u16 = 0xC002;
const ZX_REG_PORT: u16 = 0xC000;
const ZX_DATA_PORT: u16 = 0x8000;
const CPC_DATA_BUS_MASK: u16 = 0xFF00;
const CPC_PORT_A: u16 = 0xF400;
const CPC_PORT_C: u16 = 0xF600;
const CPC_BDIR: u8 = 0x80;
const CPC_BC1: u8 = 0x40;
const MSX_REG_PORT: u8 = 0xA0;
const MSX_DATA_PORT: u8 = 0xA1;

/// How the PSG is wired into the Z80 I/O space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PortMap {
    /// ZX Spectrum 128: `0xFFFD` selects, `0xBFFD` writes (decoded by mask `0xC002`).
    Zx128,
    /// Amstrad CPC: PPI port A (`0xF4xx`) carries the data bus, port C
    /// (`0xF6xx`) drives BDIR/BC1.
    Cpc,
    /// MSX: `0xA0` selects, `0xA1` writes.
    Msx,
}

/// Memory plus PSG bus seen by the CPU.
struct Z80Bus {
    memory: MemoryImage,
    ports: PortMap,
    chip_window: Option<ChipWindow>,
    selected_register: u8,
    cpc_bus_latch: u8,
    cpc_control: u8,
    pending: Vec<(u8, u8)>,
    // `Machine::peek` takes `&self`, so read faults are parked here.
    fault: Cell<Option<AddressFault>>,
    #[cfg(feature = "trace-ports")]
    port_log: Vec<String>,
}

impl Z80Bus {
    fn new(memory: MemoryImage, ports: PortMap, chip_window: Option<ChipWindow>) -> Self {
        Self {
            memory,
            ports,
            chip_window,
            selected_register: 0,
            cpc_bus_latch: 0,
            cpc_control: 0,
            pending: Vec::new(),
            fault: Cell::new(None),
            #[cfg(feature = "trace-ports")]
            port_log: Vec::new(),
        }
    }

    fn record_fault(&self, address: u16) {
        if self.fault.get().is_none() {
            self.fault.set(Some(AddressFault {
                address: address as u32,
            }));
        }
    }

    fn chip_write(&mut self, register: u8, value: u8) {
        self.pending.push((register, value));
    }

    fn handle_cpc_control(&mut self) {
        let bdir = self.cpc_control & CPC_BDIR != 0;
        let bc1 = self.cpc_control & CPC_BC1 != 0;
        match (bc1, bdir) {
            (true, true) => {
                self.selected_register = self.cpc_bus_latch & AY_REGISTER_MASK;
                #[cfg(feature = "trace-ports")]
                self.port_log
                    .push(format!("cpc latch {:02X}", self.selected_register));
            }
            (false, true) => {
                let reg = self.selected_register;
                #[cfg(feature = "trace-ports")]
                self.port_log
                    .push(format!("cpc write {:02X} {:02X}", reg, self.cpc_bus_latch));
                self.chip_write(reg, self.cpc_bus_latch);
            }
            _ => {}
        }
    }
}

impl Machine for Z80Bus {
    fn peek(&self, address: u16) -> u8 {
        match self.memory.read_byte(address as u32) {
            Ok(value) => value,
            Err(_) => {
                self.record_fault(address);
                0xFF
            }
        }
    }

    fn poke(&mut self, address: u16, value: u8) {
        if let Some(register) = self.chip_window.and_then(|w| w.register(address)) {
            self.chip_write(register, value);
            return;
        }
        if self.memory.write_byte(address as u32, value).is_err() {
            self.record_fault(address);
        }
    }

    fn port_in(&mut self, _address: u16) -> u8 {
        0xFF
    }

    fn port_out(&mut self, address: u16, value: u8) {
        match self.ports {
            PortMap::Zx128 => match address & ZX_PORT_MASK {
                ZX_REG_PORT => self.selected_register = value & AY_REGISTER_MASK,
                ZX_DATA_PORT => self.chip_write(self.selected_register, value),
                _ => {}
            },
            PortMap::Cpc => match address & CPC_DATA_BUS_MASK {
                CPC_PORT_A => {
                    self.cpc_bus_latch = value;
                    #[cfg(feature = "trace-ports")]
                    self.port_log
                        .push(format!("port f4{:02x} {:02X}", address as u8, value));
                }
                CPC_PORT_C => {
                    self.cpc_control = value;
                    #[cfg(feature = "trace-ports")]
                    self.port_log
                        .push(format!("port f6{:02x} {:02X}", address as u8, value));
                    self.handle_cpc_control();
                }
                _ => {}
            },
            PortMap::Msx => match address as u8 {
                MSX_REG_PORT => self.selected_register = value & AY_REGISTER_MASK,
                MSX_DATA_PORT => self.chip_write(self.selected_register, value),
                _ => {}
            },
        }
    }
}

/// Runs Z80 replay routines and captures PSG writes.
pub struct Z80Source {
    cpu: Cpu,
    bus: Z80Bus,
    stack: u16,
    entry: SubsongEntry,
    tick: u32,
    halted: bool,
}

impl Z80Source {
    /// Fresh CPU over `memory`.
    pub fn new(
        memory: MemoryImage,
        ports: PortMap,
        chip_window: Option<ChipWindow>,
        stack: u16,
        entry: SubsongEntry,
    ) -> Self {
        Self {
            cpu: Cpu::new(),
            bus: Z80Bus::new(memory, ports, chip_window),
            stack,
            entry,
            tick: 0,
            halted: true,
        }
    }

    #[cfg(feature = "trace-ports")]
    /// Retrieve and clear the recorded port log (trace-ports feature).
    pub fn take_port_log(&mut self) -> Vec<String> {
        std::mem::take(&mut self.bus.port_log)
    }

    fn emulate_call(&mut self, entry: u16) {
        let regs = self.cpu.registers();
        let mut sp = self.stack;
        sp = sp.wrapping_sub(1);
        self.bus.poke(sp, (SENTINEL_RETURN >> 8) as u8);
        sp = sp.wrapping_sub(1);
        self.bus.poke(sp, SENTINEL_RETURN as u8);
        regs.set16(Reg16::SP, sp);
        regs.set_pc(entry);
    }

    fn pc(&self) -> u16 {
        self.cpu.immutable_registers().pc()
    }

    fn refresh_halted(&mut self) {
        let pc = self.pc();
        self.halted = pc == SENTINEL_RETURN
            || self.bus.memory.read_byte(pc as u32).ok() == Some(HALT_OPCODE);
    }
}

impl TickSource for Z80Source {
    fn name(&self) -> &'static str {
        "z80"
    }

    fn enter(&mut self, routine: Routine) {
        self.tick = 0;
        self.bus.pending.clear();
        self.bus.fault.set(None);
        let entry = match routine {
            Routine::Init => {
                self.cpu.registers().set8(Reg8::A, self.entry.selector);
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
        self.cpu.execute_instruction(&mut self.bus);
        if let Some(fault) = self.bus.fault.take() {
            self.halted = true;
            return Err(CpuFault::Address(fault).into());
        }

        let tick = self.tick;
        self.tick = self.tick.saturating_add(1);
        let writes = self
            .bus
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
