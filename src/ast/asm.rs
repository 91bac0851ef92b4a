//! This module holds the AST for statements from assembly source code.
//!
//! For instructions that map to executable instructions without needing any label resolution,
//! see [`SimInstr`].
//!
//! Useful structs in this module include:
//! - [`AsmInstr`]: An enum of all possible assembly source code instructions
//! - [`Directive`]: An enum of all possible assembly source code directives
//! - [`Stmt`]: The format for a single "statement" in assembly source code

use super::sim::SimInstr;
use super::{ByteLoc, ByteSrc, Label};

/// An enum representing all of the possible instructions in 8051 assembly code.
///
/// Most instructions hold no label references and are already in their executable form.
/// Those that do reference labels carry them until the assembler resolves them
/// (see [`crate::asm::SymbolTable`]).
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum AsmInstr {
    /// An instruction which has no label operands.
    Plain(SimInstr),

    /// A `MOV DPTR, #label` instruction, which loads the ROM address of a data label.
    MovDptr(Label),

    /// A control flow instruction which targets a code label.
    Branch(Branch, Label),
}
impl std::fmt::Display for AsmInstr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AsmInstr::Plain(instr) => std::fmt::Display::fmt(instr, f),
            AsmInstr::MovDptr(label) => write!(f, "MOV DPTR, #{label}"),
            AsmInstr::Branch(Branch::Jmp, label)            => write!(f, "JMP {label}"),
            AsmInstr::Branch(Branch::Call, label)           => write!(f, "CALL {label}"),
            AsmInstr::Branch(Branch::Jz, label)             => write!(f, "JZ {label}"),
            AsmInstr::Branch(Branch::Jnz, label)            => write!(f, "JNZ {label}"),
            AsmInstr::Branch(Branch::Jc, label)             => write!(f, "JC {label}"),
            AsmInstr::Branch(Branch::Jnc, label)            => write!(f, "JNC {label}"),
            AsmInstr::Branch(Branch::Jb(bit), label)        => write!(f, "JB {}, {label}", super::BitLoc::Addr(*bit)),
            AsmInstr::Branch(Branch::Jnb(bit), label)       => write!(f, "JNB {}, {label}", super::BitLoc::Addr(*bit)),
            AsmInstr::Branch(Branch::Jbc(bit), label)       => write!(f, "JBC {}, {label}", super::BitLoc::Addr(*bit)),
            AsmInstr::Branch(Branch::Cjne(a, b), label)     => write!(f, "CJNE {a}, {b}, {label}"),
            AsmInstr::Branch(Branch::Djnz(loc), label)      => write!(f, "DJNZ {loc}, {label}"),
        }
    }
}

/// The kinds of control flow instructions which target a code label.
///
/// All of the absolute/long/short jump (and call) spellings collapse into one kind each,
/// since targets are resolved to instruction indices rather than byte offsets.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Branch {
    /// `SJMP`, `AJMP`, `LJMP`, `JMP`
    Jmp,
    /// `ACALL`, `LCALL`, `CALL`
    Call,
    /// `JZ`: jump if A is zero
    Jz,
    /// `JNZ`: jump if A is not zero
    Jnz,
    /// `JC`: jump if carry is set
    Jc,
    /// `JNC`: jump if carry is not set
    Jnc,
    /// `JB`: jump if bit is set
    Jb(u8),
    /// `JNB`: jump if bit is not set
    Jnb(u8),
    /// `JBC`: jump if bit is set, and clear the bit
    Jbc(u8),
    /// `CJNE`: compare and jump if not equal
    Cjne(ByteLoc, ByteSrc),
    /// `DJNZ`: decrement and jump if not zero
    Djnz(ByteLoc),
}
impl Branch {
    /// Creates the executable form of this branch, given the resolved target index.
    pub fn resolve(self, target: usize) -> SimInstr {
        match self {
            Branch::Jmp        => SimInstr::Jmp(target),
            Branch::Call       => SimInstr::Call(target),
            Branch::Jz         => SimInstr::Jz(target),
            Branch::Jnz        => SimInstr::Jnz(target),
            Branch::Jc         => SimInstr::Jc(target),
            Branch::Jnc        => SimInstr::Jnc(target),
            Branch::Jb(bit)    => SimInstr::Jb(bit, target),
            Branch::Jnb(bit)   => SimInstr::Jnb(bit, target),
            Branch::Jbc(bit)   => SimInstr::Jbc(bit, target),
            Branch::Cjne(a, b) => SimInstr::Cjne(a, b, target),
            Branch::Djnz(loc)  => SimInstr::Djnz(loc, target),
        }
    }
}

/// An enum representing all the possible directives in 8051 assembly code.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Directive {
    /// Sets the ROM address that following `DB` bytes are written to.
    ///
    /// ```text
    /// ORG 40h
    /// ```
    Org(u16),

    /// Writes the given bytes into ROM.
    ///
    /// Strings emit one byte per byte of the string.
    ///
    /// ```text
    /// TABLE: DB 1, 2, 0FFh, "hi"
    /// ```
    Db(Vec<u8>),

    /// Ends the program. Lines after this are not assembled.
    End
}
impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Directive::Org(addr) => {
                f.write_str("ORG ")?;
                super::fmt_hex(f, *addr)
            },
            Directive::Db(bytes) => {
                f.write_str("DB ")?;
                for (i, &b) in bytes.iter().enumerate() {
                    if i != 0 { f.write_str(", ")?; }
                    super::fmt_hex(f, u16::from(b))?;
                }
                Ok(())
            },
            Directive::End => f.write_str("END"),
        }
    }
}

/// Either an instruction or a directive.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum StmtKind {
    #[allow(missing_docs)]
    Instr(AsmInstr),
    #[allow(missing_docs)]
    Directive(Directive)
}

/// A "statement" in 8051 assembly.
///
/// Each line of source produces one statement.
/// A statement holds any labels defined on the line,
/// followed by an optional instruction or directive.
/// Lines which only hold labels (or comments) have no nucleus.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Stmt {
    /// The labels.
    pub labels: Vec<Label>,
    /// The instruction or directive.
    pub nucleus: Option<StmtKind>,
    /// The (0-indexed) source line of this statement.
    pub line: usize
}
