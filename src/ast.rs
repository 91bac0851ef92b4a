//! Components relating to the abstract syntax trees (ASTs)
//! used in representing assembly instructions.
//!
//! These components together are used to construct...
//! - [`asm::AsmInstr`] (a data structure holding an assembly source code instruction),
//! - [`asm::Directive`] (a data structure holding an assembly source code directive),
//! - and [`sim::SimInstr`] (a data structure holding a resolved, executable instruction).
//!
//! This module also holds the operand vocabulary shared by the two instruction forms:
//! registers ([`Reg`]), byte locations ([`ByteLoc`]), byte sources ([`ByteSrc`]),
//! bit locations ([`BitLoc`]), and the names of the special function registers ([`sfr`])
//! and of the status word bits ([`PswFlag`]).

pub mod asm;
pub mod sim;

use std::fmt::Write as _;

/// A register of the active bank. Must be between 0 and 7.
///
/// This `Reg` struct can either be constructed by selecting a register from [`reg_consts`],
/// or by using [`Reg::try_from`].
///
/// ## Examples
///
/// ```text
/// MOV R0, #5
///     ~~
/// ADD R0, R1
///     ~~  ~~
/// MOV A, @R1
///         ~~
/// DJNZ R7, LOOP
///      ~~
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct Reg(pub(crate) u8);

/// Register constants!
pub mod reg_consts {
    use super::Reg;

    /// The 0th register in the active bank.
    pub const R0: Reg = Reg(0);
    /// The 1st register in the active bank.
    pub const R1: Reg = Reg(1);
    /// The 2nd register in the active bank.
    pub const R2: Reg = Reg(2);
    /// The 3rd register in the active bank.
    pub const R3: Reg = Reg(3);
    /// The 4th register in the active bank.
    pub const R4: Reg = Reg(4);
    /// The 5th register in the active bank.
    pub const R5: Reg = Reg(5);
    /// The 6th register in the active bank.
    pub const R6: Reg = Reg(6);
    /// The 7th register in the active bank.
    pub const R7: Reg = Reg(7);
}
impl Reg {
    /// All eight registers, in order.
    pub const ALL: [Reg; 8] = [Reg(0), Reg(1), Reg(2), Reg(3), Reg(4), Reg(5), Reg(6), Reg(7)];

    /// Gets the register number of this [`Reg`]. This is always between 0 and 7.
    pub fn reg_no(self) -> u8 {
        self.0
    }

    /// Looks up a register by its name (`R0`-`R7`, case-insensitive).
    pub fn from_name(name: &str) -> Option<Reg> {
        let digits = name.strip_prefix(['R', 'r'])?;
        match digits.as_bytes() {
            &[d @ b'0'..=b'7'] => Some(Reg(d - b'0')),
            _ => None
        }
    }
}
impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // padding should have no effect here
        write!(f, "R{}", self.0)
    }
}
impl From<Reg> for usize {
    // Used for indexing the register file in [`crate::sim::mem::RegisterFile`].
    fn from(value: Reg) -> Self {
        usize::from(value.0)
    }
}
impl TryFrom<u8> for Reg {
    type Error = std::num::TryFromIntError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0..=7 => Ok(Reg(value)),
            // HACKy, but there's no other way to create this error
            _     => u8::try_from(256).map(|_| unreachable!("should've been TryFromIntError")),
        }
    }
}

/// Addresses of the special function registers (the upper half of internal RAM).
pub mod sfr {
    #![allow(missing_docs)]

    pub const P0: u8   = 0x80;
    pub const SP: u8   = 0x81;
    pub const DPL: u8  = 0x82;
    pub const DPH: u8  = 0x83;
    pub const PCON: u8 = 0x87;
    pub const TCON: u8 = 0x88;
    pub const TMOD: u8 = 0x89;
    pub const TL0: u8  = 0x8A;
    pub const TL1: u8  = 0x8B;
    pub const TH0: u8  = 0x8C;
    pub const TH1: u8  = 0x8D;
    pub const P1: u8   = 0x90;
    pub const SCON: u8 = 0x98;
    pub const SBUF: u8 = 0x99;
    pub const P2: u8   = 0xA0;
    pub const IE: u8   = 0xA8;
    pub const P3: u8   = 0xB0;
    pub const IP: u8   = 0xB8;
    pub const PSW: u8  = 0xD0;
    pub const ACC: u8  = 0xE0;
    pub const B: u8    = 0xF0;

    /// The named SFRs, ordered by address.
    pub const NAMES: [(&str, u8); 21] = [
        ("P0", P0), ("SP", SP), ("DPL", DPL), ("DPH", DPH), ("PCON", PCON),
        ("TCON", TCON), ("TMOD", TMOD), ("TL0", TL0), ("TL1", TL1), ("TH0", TH0),
        ("TH1", TH1), ("P1", P1), ("SCON", SCON), ("SBUF", SBUF), ("P2", P2),
        ("IE", IE), ("P3", P3), ("IP", IP), ("PSW", PSW), ("ACC", ACC), ("B", B),
    ];

    /// Looks up the address of an SFR by name (case-insensitive).
    pub fn lookup(name: &str) -> Option<u8> {
        NAMES.iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, addr)| addr)
    }

    /// Looks up the name of the SFR at the given address.
    pub fn name_of(addr: u8) -> Option<&'static str> {
        NAMES.iter()
            .find(|&&(_, a)| a == addr)
            .map(|&(n, _)| n)
    }
}

/// A bit of the program status word (PSW).
///
/// The discriminant of each flag is its bit index within the PSW.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum PswFlag {
    /// Carry flag
    CY = 7,
    /// Auxiliary carry flag (carry out of bit 3)
    AC = 6,
    /// User flag 0
    F0 = 5,
    /// Register bank select, high bit
    RS1 = 4,
    /// Register bank select, low bit
    RS0 = 3,
    /// Overflow flag
    OV = 2,
    /// User flag 1
    F1 = 1,
    /// Parity flag (derived from the accumulator)
    P = 0,
}
impl PswFlag {
    /// All flags, ordered from the most significant bit to the least.
    pub const ALL: [PswFlag; 8] = [
        PswFlag::CY, PswFlag::AC, PswFlag::F0, PswFlag::RS1,
        PswFlag::RS0, PswFlag::OV, PswFlag::F1, PswFlag::P,
    ];

    /// The index of this flag's bit within the PSW.
    pub fn bit(self) -> u8 {
        self as u8
    }

    /// The bit address of this flag in the bit-addressable space.
    pub fn bit_addr(self) -> u8 {
        sfr::PSW + self.bit()
    }

    /// The canonical name of this flag.
    pub fn name(self) -> &'static str {
        match self {
            PswFlag::CY  => "CY",
            PswFlag::AC  => "AC",
            PswFlag::F0  => "F0",
            PswFlag::RS1 => "RS1",
            PswFlag::RS0 => "RS0",
            PswFlag::OV  => "OV",
            PswFlag::F1  => "F1",
            PswFlag::P   => "P",
        }
    }

    /// Looks up a flag by its canonical name (case-insensitive).
    ///
    /// This does not accept aliases (`C` or `UD`),
    /// as `C` is its own operand in assembly source.
    pub fn from_name(name: &str) -> Option<PswFlag> {
        PswFlag::ALL.into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Finds the flag with the given bit address (if it is a PSW bit).
    pub fn from_bit_addr(addr: u8) -> Option<PswFlag> {
        PswFlag::ALL.into_iter()
            .find(|f| f.bit_addr() == addr)
    }
}
impl std::fmt::Display for PswFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Splits a bit address into the byte address it lives in and its bit index within that byte.
///
/// Bit addresses `00h`-`7Fh` map onto RAM bytes `20h`-`2Fh`,
/// and bit addresses `80h`-`FFh` map onto the SFRs whose address is divisible by 8.
///
/// ```
/// use mcs51_sim::ast::bit_location;
///
/// assert_eq!(bit_location(0x00), (0x20, 0));
/// assert_eq!(bit_location(0x1B), (0x23, 3));
/// assert_eq!(bit_location(0xE7), (0xE0, 7));
/// assert_eq!(bit_location(0xD7), (0xD0, 7));
/// ```
pub fn bit_location(bit: u8) -> (u8, u8) {
    match bit {
        0x00..=0x7F => (0x20 + (bit >> 3), bit & 0b111),
        _           => (bit & 0xF8, bit & 0b111)
    }
}

/// Computes the bit address of bit `bit` within byte `byte`
/// (the `byte.bit` notation in assembly source).
///
/// This returns `None` if the byte is not bit-addressable or if the bit index exceeds 7.
///
/// ```
/// use mcs51_sim::ast::bit_address;
///
/// assert_eq!(bit_address(0x20, 3), Some(0x03));
/// assert_eq!(bit_address(0x2F, 7), Some(0x7F));
/// assert_eq!(bit_address(0xE0, 7), Some(0xE7));
/// assert_eq!(bit_address(0x30, 0), None);
/// assert_eq!(bit_address(0x81, 0), None);
/// assert_eq!(bit_address(0x20, 8), None);
/// ```
pub fn bit_address(byte: u16, bit: u16) -> Option<u8> {
    if bit > 7 { return None; }
    let bit = bit as u8;

    match byte {
        0x20..=0x2F => Some((byte as u8 - 0x20) * 8 + bit),
        0x80..=0xFF if byte % 8 == 0 => Some(byte as u8 + bit),
        _ => None
    }
}

/// Writes an address in the assembler's hex notation (e.g., `30h`, `0E0h`).
pub(crate) fn fmt_hex(f: &mut impl std::fmt::Write, value: u16) -> std::fmt::Result {
    let mut buf = String::new();
    write!(buf, "{value:X}")?;
    if buf.starts_with(|c: char| c.is_ascii_alphabetic()) {
        f.write_char('0')?;
    }
    write!(f, "{buf}h")
}

/// A location a byte can be read from or written to.
///
/// ## Examples
///
/// ```text
/// MOV A, 30h
///     ~  ~~~
/// INC R3
///     ~~
/// MOV @R0, #1
///     ~~~
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ByteLoc {
    /// The accumulator (`A`)
    Acc,
    /// A register of the active bank (`R0`-`R7`)
    Reg(Reg),
    /// A directly addressed byte of internal RAM or an SFR (e.g., `30h`, `B`)
    Direct(u8),
    /// A byte of internal RAM pointed to by `R0` or `R1` (e.g., `@R0`)
    Indirect(Reg),
}
impl std::fmt::Display for ByteLoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteLoc::Acc => f.write_str("A"),
            ByteLoc::Reg(r) => std::fmt::Display::fmt(r, f),
            ByteLoc::Direct(addr) => match sfr::name_of(*addr) {
                Some(name) => f.write_str(name),
                None => fmt_hex(f, u16::from(*addr)),
            },
            ByteLoc::Indirect(r) => write!(f, "@{r}"),
        }
    }
}

/// A value that can be read as a byte: either a location or an immediate value.
///
/// ## Examples
///
/// ```text
/// ADD A, #5
///        ~~
/// ADD A, R1
///        ~~
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ByteSrc {
    /// A byte location
    Loc(ByteLoc),
    /// An immediate value (e.g., `#5`)
    Imm(u8),
}
impl From<ByteLoc> for ByteSrc {
    fn from(value: ByteLoc) -> Self {
        ByteSrc::Loc(value)
    }
}
impl std::fmt::Display for ByteSrc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteSrc::Loc(loc) => std::fmt::Display::fmt(loc, f),
            ByteSrc::Imm(n) => {
                f.write_char('#')?;
                fmt_hex(f, u16::from(*n))
            }
        }
    }
}

/// A location a bit can be read from or written to.
///
/// ## Examples
///
/// ```text
/// SETB C
///      ~
/// CLR 20h.3
///     ~~~~~
/// CPL ACC.7
///     ~~~~~
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum BitLoc {
    /// The carry flag (`C`)
    Carry,
    /// A bit address
    Addr(u8),
}
impl std::fmt::Display for BitLoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BitLoc::Carry => f.write_str("C"),
            BitLoc::Addr(bit) => fmt_bit(f, *bit),
        }
    }
}
/// Writes a bit address in `byte.bit` form (or as a named PSW flag).
pub(crate) fn fmt_bit(f: &mut impl std::fmt::Write, bit: u8) -> std::fmt::Result {
    if let Some(flag) = PswFlag::from_bit_addr(bit) {
        return f.write_str(flag.name());
    }

    let (byte, idx) = bit_location(bit);
    match sfr::name_of(byte) {
        Some(name) => f.write_str(name)?,
        None => fmt_hex(f, u16::from(byte))?,
    }
    write!(f, ".{idx}")
}

/// A label.
///
/// This holds the label's name as well as the (0-indexed) source line it appeared on.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Label {
    /// The label's identifier
    pub name: String,

    /// The source line the label appeared on
    pub line: usize
}
impl Label {
    /// Creates a new label.
    pub fn new(name: String, line: usize) -> Self {
        Label { name, line }
    }
}
impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Names which refer to built-in operands and therefore cannot be used as labels.
pub(crate) fn is_reserved_name(name: &str) -> bool {
    ["A", "AB", "C", "DPTR"].iter().any(|n| n.eq_ignore_ascii_case(name))
        || sfr::lookup(name).is_some()
        || PswFlag::from_name(name).is_some()
        || Reg::from_name(name).is_some()
}
