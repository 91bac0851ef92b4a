//! Memory handling for the 8051 simulator.
//!
//! This module consists of:
//! - [`MemoryBank`]: A fixed-size byte array (used for internal RAM and for ROM).
//! - [`RegisterFile`]: The four banks of general purpose registers.
//!
//! Internal RAM is a single 256-byte bank.
//! Addresses below [`SFR_START`] are general RAM, and addresses at or above it
//! are the special function register window.
//! Both halves live in the same array.

use std::collections::BTreeMap;

use crate::ast::Reg;

/// The size of internal RAM (general RAM and the SFR window).
pub const RAM_SIZE: usize = 256;
/// The size of ROM.
pub const ROM_SIZE: usize = 256;
/// The first address of the SFR window.
pub const SFR_START: u8 = 0x80;
/// The number of register banks.
pub const BANK_COUNT: usize = 4;

/// Errors from accessing a memory bank or the register file.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum MemErr {
    /// The address is outside of the bank's size.
    OutOfRange {
        /// The address accessed.
        addr: u16,
        /// The size of the bank.
        size: usize
    },
    /// The register name is not one of `R0`-`R7`.
    InvalidRegister(String),
    /// The bank index is not one of 0-3.
    InvalidBank(u8),
}
impl std::fmt::Display for MemErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemErr::OutOfRange { addr, size } => write!(f, "address {addr:#X} is out of range for memory of size {size:#X}"),
            MemErr::InvalidRegister(name) => write!(f, "invalid register '{name}'"),
            MemErr::InvalidBank(bank) => write!(f, "invalid register bank {bank}"),
        }
    }
}
impl std::error::Error for MemErr {}
impl crate::err::Error for MemErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            MemErr::OutOfRange { size, .. } => Some(format!("addresses must be less than {size:#X}").into()),
            MemErr::InvalidRegister(_) => Some("registers are named R0-R7".into()),
            MemErr::InvalidBank(_) => Some(format!("there are {BANK_COUNT} register banks (0-{})", BANK_COUNT - 1).into()),
        }
    }
}

/// A fixed-size, byte-addressable memory.
///
/// Every byte starts zeroed. Reads and writes are bounds checked.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct MemoryBank {
    data: Box<[u8]>
}
impl MemoryBank {
    /// Creates a zeroed memory bank of the given size.
    pub fn new(size: usize) -> Self {
        Self { data: vec![0; size].into_boxed_slice() }
    }

    /// Creates a memory bank of the given size from a sparse mapping of addresses to bytes.
    ///
    /// Addresses not in the mapping are zero.
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use mcs51_sim::sim::mem::MemoryBank;
    ///
    /// let sparse = BTreeMap::from([(3, 0xAA), (1, 0x55)]);
    /// let bank = MemoryBank::fill_from(&sparse, 4).unwrap();
    /// assert_eq!(bank.as_slice(), [0, 0x55, 0, 0xAA]);
    ///
    /// assert!(MemoryBank::fill_from(&sparse, 2).is_err());
    /// ```
    pub fn fill_from(sparse: &BTreeMap<u16, u8>, size: usize) -> Result<Self, MemErr> {
        let mut bank = Self::new(size);
        for (&addr, &value) in sparse {
            bank.write(addr, u32::from(value))?;
        }
        Ok(bank)
    }

    /// The number of bytes in this bank.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    fn check(&self, addr: u16) -> Result<usize, MemErr> {
        let index = usize::from(addr);
        match index < self.data.len() {
            true  => Ok(index),
            false => Err(MemErr::OutOfRange { addr, size: self.data.len() }),
        }
    }

    /// Reads the byte at the given address.
    pub fn read(&self, addr: u16) -> Result<u8, MemErr> {
        self.check(addr).map(|i| self.data[i])
    }

    /// Writes to the byte at the given address.
    ///
    /// The value is wrapped to a byte (i.e., only its low 8 bits are kept).
    pub fn write(&mut self, addr: u16, value: u32) -> Result<(), MemErr> {
        let i = self.check(addr)?;
        self.data[i] = value as u8;
        Ok(())
    }

    /// Zeroes every byte.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Views every byte of this bank, ordered by address.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// The register file: four banks of eight registers (`R0`-`R7`).
///
/// Each bank is independent storage.
/// Which bank is active is determined by the PSW (see [`super::Simulator::active_bank`]),
/// so the register file itself does not track it.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Default)]
pub struct RegisterFile([[u8; 8]; BANK_COUNT]);
impl RegisterFile {
    /// Creates a zeroed register file.
    pub fn new() -> Self {
        Default::default()
    }

    fn bank_index(bank: u8) -> Result<usize, MemErr> {
        match usize::from(bank) < BANK_COUNT {
            true  => Ok(usize::from(bank)),
            false => Err(MemErr::InvalidBank(bank)),
        }
    }

    /// Reads a register from a given bank.
    pub fn read(&self, bank: u8, reg: Reg) -> Result<u8, MemErr> {
        Ok(self.0[Self::bank_index(bank)?][usize::from(reg)])
    }

    /// Writes a register in a given bank.
    pub fn write(&mut self, bank: u8, reg: Reg, value: u8) -> Result<(), MemErr> {
        self.0[Self::bank_index(bank)?][usize::from(reg)] = value;
        Ok(())
    }

    /// Reads a register (by name, e.g. `"R3"`) from a given bank.
    ///
    /// ```
    /// use mcs51_sim::sim::mem::{MemErr, RegisterFile};
    ///
    /// let regs = RegisterFile::new();
    /// assert_eq!(regs.read_named(0, "R3"), Ok(0));
    /// assert_eq!(regs.read_named(0, "R8"), Err(MemErr::InvalidRegister("R8".into())));
    /// ```
    pub fn read_named(&self, bank: u8, name: &str) -> Result<u8, MemErr> {
        self.read(bank, Self::reg_by_name(name)?)
    }

    /// Writes a register (by name, e.g. `"R3"`) in a given bank.
    pub fn write_named(&mut self, bank: u8, name: &str, value: u8) -> Result<(), MemErr> {
        self.write(bank, Self::reg_by_name(name)?, value)
    }

    fn reg_by_name(name: &str) -> Result<Reg, MemErr> {
        Reg::from_name(name).ok_or_else(|| MemErr::InvalidRegister(name.to_string()))
    }

    /// All registers of a bank, ordered `R0`-`R7`.
    pub fn bank(&self, bank: u8) -> Result<&[u8; 8], MemErr> {
        Ok(&self.0[Self::bank_index(bank)?])
    }

    /// Zeroes every register of every bank.
    pub fn clear(&mut self) {
        self.0 = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::ast::reg_consts::{R0, R7};

    use super::{MemErr, MemoryBank, RegisterFile, RAM_SIZE};

    #[test]
    fn test_bank_bounds() {
        let mut ram = MemoryBank::new(RAM_SIZE);
        assert_eq!(ram.size(), 256);
        assert_eq!(ram.read(0xFF), Ok(0));
        assert_eq!(ram.read(0x100), Err(MemErr::OutOfRange { addr: 0x100, size: 256 }));
        assert_eq!(ram.write(0x200, 1), Err(MemErr::OutOfRange { addr: 0x200, size: 256 }));
        assert!(ram.as_slice().iter().all(|&b| b == 0));

        let mut small = MemoryBank::new(128);
        assert!(small.write(0x7F, 1).is_ok());
        assert!(small.write(0x80, 1).is_err());
    }

    #[test]
    fn test_bank_wrap() {
        let mut ram = MemoryBank::new(RAM_SIZE);
        ram.write(0x30, 0x1FF).unwrap();
        assert_eq!(ram.read(0x30), Ok(0xFF));
        ram.write(0x31, 256).unwrap();
        assert_eq!(ram.read(0x31), Ok(0));

        ram.clear();
        assert_eq!(ram.read(0x30), Ok(0));
    }

    #[test]
    fn test_fill_from() {
        let sparse = BTreeMap::from([(0x10, 1), (0x00, 2), (0xFF, 3)]);
        let bank = MemoryBank::fill_from(&sparse, 256).unwrap();
        assert_eq!(bank.read(0x00), Ok(2));
        assert_eq!(bank.read(0x10), Ok(1));
        assert_eq!(bank.read(0xFF), Ok(3));
        assert_eq!(bank.as_slice().iter().filter(|&&b| b != 0).count(), 3);
    }

    #[test]
    fn test_register_banks() {
        let mut regs = RegisterFile::new();
        regs.write(0, R0, 0x11).unwrap();
        regs.write(1, R0, 0x22).unwrap();
        regs.write(3, R7, 0x33).unwrap();

        assert_eq!(regs.read(0, R0), Ok(0x11));
        assert_eq!(regs.read(1, R0), Ok(0x22));
        assert_eq!(regs.read(2, R0), Ok(0));
        assert_eq!(regs.bank(3).unwrap(), &[0, 0, 0, 0, 0, 0, 0, 0x33]);
        assert_eq!(regs.read(4, R0), Err(MemErr::InvalidBank(4)));

        regs.write_named(2, "r5", 9).unwrap();
        assert_eq!(regs.read_named(2, "R5"), Ok(9));
        assert_eq!(regs.write_named(2, "R9", 9), Err(MemErr::InvalidRegister("R9".into())));

        regs.clear();
        assert_eq!(regs, RegisterFile::new());
    }
}
