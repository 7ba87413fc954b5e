//! Register writes and the raw latched register bank.
//!
//! Every tick source (CPU emulation or macro interpretation) reduces the code's
//! port/bus accesses to [`RegisterWrite`] events addressed by chip register
//! index. The bank simply latches them.

use serde::{Deserialize, Serialize};

/// Largest register table any supported chip family needs.
pub const MAX_REGISTERS: usize = 32;

/// One captured write to a sound-chip register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegisterWrite {
    /// Chip register index (already decoded from the port or bus address).
    pub register: u8,
    /// Value latched into the register.
    pub value: u8,
    /// Logical tick inside the routine that produced the write.
    pub tick: u32,
}

impl RegisterWrite {
    /// Create a write event.
    pub fn new(register: u8, value: u8, tick: u32) -> Self {
        Self {
            register,
            value,
            tick,
        }
    }
}

/// Raw register bank sized for the largest supported chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterBank {
    registers: [u8; MAX_REGISTERS],
    len: usize,
}

impl RegisterBank {
    /// Create a zeroed bank exposing `len` registers (clamped to [`MAX_REGISTERS`]).
    pub fn new(len: usize) -> Self {
        RegisterBank {
            registers: [0; MAX_REGISTERS],
            len: len.min(MAX_REGISTERS),
        }
    }

    /// Number of addressable registers.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the bank has no registers at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read a register value (0 for indices past the bank).
    pub fn read(&self, addr: u8) -> u8 {
        self.as_slice().get(addr as usize).copied().unwrap_or(0)
    }

    /// Latch a register value. Writes past the bank are dropped.
    pub fn write(&mut self, addr: u8, value: u8) {
        if let Some(slot) = self.registers[..self.len].get_mut(addr as usize) {
            *slot = value;
        }
    }

    /// Registers in use.
    pub fn as_slice(&self) -> &[u8] {
        &self.registers[..self.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_bank() {
        let mut bank = RegisterBank::new(16);
        assert_eq!(bank.read(0x00), 0);

        bank.write(0x00, 0x42);
        assert_eq!(bank.read(0x00), 0x42);
    }

    #[test]
    fn writes_past_the_bank_are_dropped() {
        let mut bank = RegisterBank::new(16);
        bank.write(0x10, 0xAA);
        assert_eq!(bank.read(0x10), 0);
        assert_eq!(bank.as_slice().len(), 16);
        assert!(bank.as_slice().iter().all(|&r| r == 0));
    }

    #[test]
    fn bank_length_is_clamped() {
        let bank = RegisterBank::new(100);
        assert_eq!(bank.len(), MAX_REGISTERS);
    }
}
