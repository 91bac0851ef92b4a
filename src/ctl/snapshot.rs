//! Snapshots of the full machine state.
//!
//! A [`FullState`] is captured after every controller operation.
//! It serializes (with `serde`) into the JSON shape expected by a front end:
//!
//! ```text
//! {
//!   "registers": { "A": 0, "B": 0, "SP": 0, "DPTR": 0, "PSW": 0 },
//!   "flags": { "CY": 0, "AC": 0, "F0": 0, "RS1": 0, "RS0": 0, "OV": 0, "F1": 0, "P": 0 },
//!   "general_purpose_registers": { "0": { "R0": 0, ... }, ... },
//!   "ram": [[[0, 0], [1, 0], ...], ...],
//!   "sfr": [[[128, 0], ...], ...],
//!   "rom": [[[0, 0], ...], ...],
//!   "assembler": ["0000 MOV A, #1", ...],
//!   "index": 0,
//!   "ready": false
//! }
//! ```
//!
//! Memory is reported in chunks of 16 consecutive addresses, ordered by address.
//! Every address is present, so unwritten bytes appear as 0.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::ast::Reg;
use crate::sim::mem::{BANK_COUNT, SFR_START};
use crate::sim::{Psw, Simulator};

/// The number of addresses in one memory chunk.
pub const CHUNK_SIZE: usize = 16;

/// A chunk of consecutive memory, as `(address, value)` pairs.
pub type MemoryChunk = Vec<(u16, u8)>;

/// The named SFRs reported alongside the register banks.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct NamedRegisters {
    /// The accumulator.
    pub a: u8,
    /// The B register.
    pub b: u8,
    /// The stack pointer.
    pub sp: u8,
    /// The data pointer.
    pub dptr: u16,
    /// The program status word (with parity computed).
    pub psw: u8,
}

/// A snapshot of the full machine state.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct FullState {
    /// The named SFRs.
    pub registers: NamedRegisters,
    /// Every PSW flag.
    #[serde(serialize_with = "ser_flags")]
    pub flags: Psw,
    /// Every register bank, each ordered `R0`-`R7`.
    #[serde(serialize_with = "ser_banks")]
    pub general_purpose_registers: [[u8; 8]; BANK_COUNT],
    /// General RAM (`00h`-`7Fh`).
    pub ram: Vec<MemoryChunk>,
    /// The SFR window (`80h`-`FFh`).
    pub sfr: Vec<MemoryChunk>,
    /// ROM.
    pub rom: Vec<MemoryChunk>,
    /// The listing of the loaded program (empty if none is loaded).
    pub assembler: Vec<String>,
    /// The index of the next instruction to execute.
    pub index: usize,
    /// Whether a program is loaded.
    pub ready: bool,
}

impl FullState {
    /// Captures the state of a simulator.
    pub fn capture(sim: &Simulator) -> Self {
        let ram = sim.ram().as_slice();
        let sfr_start = usize::from(SFR_START);
        // The SFR window is read through the simulator so PSW parity is current.
        let sfr: Vec<_> = (SFR_START..=u8::MAX).map(|addr| sim.read_direct(addr)).collect();

        let mut banks = [[0; 8]; BANK_COUNT];
        for (bank, regs) in (0..).zip(&mut banks) {
            if let Ok(values) = sim.reg_file.bank(bank) {
                *regs = *values;
            }
        }

        FullState {
            registers: NamedRegisters {
                a: sim.acc(),
                b: sim.b(),
                sp: sim.sp(),
                dptr: sim.dptr(),
                psw: sim.psw().get(),
            },
            flags: sim.psw(),
            general_purpose_registers: banks,
            ram: chunk_memory(&ram[..sfr_start], 0),
            sfr: chunk_memory(&sfr, u16::from(SFR_START)),
            rom: chunk_memory(sim.rom().as_slice(), 0),
            assembler: sim.program().map(|p| p.listing()).unwrap_or_default(),
            index: sim.run_index(),
            ready: sim.program().is_some(),
        }
    }

    /// Serializes this state as compact JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serializes this state as indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Splits memory into chunks of [`CHUNK_SIZE`] `(address, value)` pairs,
/// where `start` is the address of the first byte.
///
/// ```
/// use mcs51_sim::ctl::snapshot::chunk_memory;
///
/// let chunks = chunk_memory(&[0; 40], 0x80);
/// assert_eq!(chunks.len(), 3);
/// assert_eq!(chunks[1][0], (0x90, 0));
/// assert_eq!(chunks[2].len(), 8);
/// ```
pub fn chunk_memory(bytes: &[u8], start: u16) -> Vec<MemoryChunk> {
    bytes.chunks(CHUNK_SIZE)
        .enumerate()
        .map(|(i, chunk)| {
            (start..).skip(i * CHUNK_SIZE)
                .zip(chunk.iter().copied())
                .collect()
        })
        .collect()
}

fn ser_flags<S: Serializer>(psw: &Psw, s: S) -> Result<S::Ok, S::Error> {
    s.collect_map(psw.flags().map(|(flag, set)| (flag.name(), u8::from(set))))
}

fn ser_banks<S: Serializer>(banks: &[[u8; 8]; BANK_COUNT], s: S) -> Result<S::Ok, S::Error> {
    struct Bank<'a>(&'a [u8; 8]);
    impl Serialize for Bank<'_> {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            let mut map = s.serialize_map(Some(8))?;
            for (reg, value) in Reg::ALL.iter().zip(self.0) {
                map.serialize_entry(&reg.to_string(), value)?;
            }
            map.end()
        }
    }

    s.collect_map(banks.iter().enumerate().map(|(i, bank)| (i, Bank(bank))))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::asm::assemble;
    use crate::sim::Simulator;

    use super::{chunk_memory, FullState};

    #[test]
    fn test_chunking() {
        let chunks = chunk_memory(&[7; 128], 0);
        assert_eq!(chunks.len(), 8);
        assert!(chunks.iter().all(|c| c.len() == 16));
        assert_eq!(chunks[7][15], (0x7F, 7));

        let addrs: Vec<_> = chunks.concat().into_iter().map(|(a, _)| a).collect();
        assert!(addrs.windows(2).all(|w| w[0] + 1 == w[1]));

        assert!(chunk_memory(&[], 0).is_empty());
    }

    #[test]
    fn test_capture() {
        let mut sim = Simulator::default();
        sim.load_program(assemble(&["MOV A, #7", "MOV R3, #2", "ORG 4", "DB 1, 2"]).unwrap()).unwrap();
        sim.run().unwrap();

        let state = FullState::capture(&sim);
        assert_eq!(state.registers.a, 7);
        assert_eq!(state.general_purpose_registers[0][3], 2);
        assert_eq!(state.ram.len(), 8);
        assert_eq!(state.sfr.len(), 8);
        assert_eq!(state.rom.len(), 16);
        assert_eq!(state.sfr[0][0].0, 0x80);
        // ACC is E0h, PSW is D0h with parity set (7 has three 1 bits)
        assert_eq!(state.sfr[6][0], (0xE0, 7));
        assert_eq!(state.sfr[5][0], (0xD0, 1));
        assert_eq!(state.rom[0][4], (4, 1));
        assert_eq!(state.rom[0][5], (5, 2));
        assert_eq!(state.assembler, ["0000 MOV A, #7h", "0001 MOV R3, #2h"]);
        assert_eq!(state.index, 2);
        assert!(state.ready);
    }

    #[test]
    fn test_json_shape() {
        let mut sim = Simulator::default();
        sim.load_program(assemble(&["MOV A, #1", "SETB RS1"]).unwrap()).unwrap();
        sim.run().unwrap();

        let value = serde_json::to_value(FullState::capture(&sim)).unwrap();
        assert_eq!(value["registers"], json!({ "A": 1, "B": 0, "SP": 0, "DPTR": 0, "PSW": 0x11 }));
        assert_eq!(value["flags"], json!({
            "CY": 0, "AC": 0, "F0": 0, "RS1": 1, "RS0": 0, "OV": 0, "F1": 0, "P": 1
        }));
        assert_eq!(value["general_purpose_registers"]["2"]["R7"], json!(0));
        assert_eq!(value["ram"][0][1], json!([1, 0]));
        assert_eq!(value["index"], json!(2));
        assert_eq!(value["ready"], json!(true));

        let text = FullState::capture(&Simulator::default()).to_json().unwrap();
        assert!(text.starts_with(r#"{"registers":{"A":0,"#));
        assert!(text.ends_with(r#""assembler":[],"index":0,"ready":false}"#));
    }
}
