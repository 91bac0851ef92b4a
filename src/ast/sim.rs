//! This module holds the executable form of instructions.
//!
//! A [`SimInstr`] is produced once by the assembler and is never mutated afterwards.
//! All label references have already been resolved into instruction indices.

use super::{BitLoc, ByteLoc, ByteSrc, Reg};

/// An executable instruction.
///
/// Control flow targets are indices into the program's instruction list.
/// A target equal to the length of the program represents a halt.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum SimInstr {
    /// No operation.
    Nop,

    /// Copies a byte: `dst <- src`.
    Mov(ByteLoc, ByteSrc),
    /// Loads the data pointer with a 16-bit value.
    MovDptr(u16),
    /// Copies a bit into the carry flag: `C <- bit`.
    MovToCarry(u8),
    /// Copies the carry flag into a bit: `bit <- C`.
    MovFromCarry(u8),
    /// Reads ROM: `A <- ROM[A + DPTR]`.
    Movc,
    /// Pushes a direct byte onto the stack.
    Push(u8),
    /// Pops a byte from the stack into a direct byte.
    Pop(u8),
    /// Exchanges A with a byte.
    Xch(ByteLoc),
    /// Exchanges the low nibbles of A and `@Ri`.
    Xchd(Reg),
    /// Swaps the nibbles of A.
    Swap,

    /// Adds a byte: `dst <- dst + src`.
    Add(ByteLoc, ByteSrc),
    /// Adds a byte with carry: `dst <- dst + src + C`.
    Addc(ByteLoc, ByteSrc),
    /// Subtracts a byte with borrow: `dst <- dst - src - C`.
    Subb(ByteLoc, ByteSrc),
    /// Increments a byte (no flags).
    Inc(ByteLoc),
    /// Increments the data pointer.
    IncDptr,
    /// Decrements a byte (no flags).
    Dec(ByteLoc),
    /// Multiplies A and B: `B:A <- A * B`.
    Mul,
    /// Divides A by B: `A <- A / B`, `B <- A % B`.
    Div,
    /// Decimal-adjusts A after a BCD addition.
    Da,

    /// Bitwise and: `dst <- dst & src`.
    Anl(ByteLoc, ByteSrc),
    /// Bitwise or: `dst <- dst | src`.
    Orl(ByteLoc, ByteSrc),
    /// Bitwise xor: `dst <- dst ^ src`.
    Xrl(ByteLoc, ByteSrc),
    /// Ands a bit (or its complement, if the flag is set) into the carry.
    AnlC(u8, bool),
    /// Ors a bit (or its complement, if the flag is set) into the carry.
    OrlC(u8, bool),
    /// Clears A.
    ClrA,
    /// Clears a bit.
    Clr(BitLoc),
    /// Sets a bit.
    Setb(BitLoc),
    /// Complements A.
    CplA,
    /// Complements a bit.
    Cpl(BitLoc),
    /// Rotates A left.
    Rl,
    /// Rotates A left through the carry.
    Rlc,
    /// Rotates A right.
    Rr,
    /// Rotates A right through the carry.
    Rrc,

    /// Jumps to an instruction index.
    Jmp(usize),
    /// Jumps to the instruction index `A + DPTR`.
    JmpIndirect,
    /// Calls a subroutine, pushing the return index onto the stack.
    Call(usize),
    /// Returns from a subroutine.
    Ret,
    /// Returns from an interrupt routine.
    Reti,
    /// Jumps if A is zero.
    Jz(usize),
    /// Jumps if A is not zero.
    Jnz(usize),
    /// Jumps if the carry is set.
    Jc(usize),
    /// Jumps if the carry is not set.
    Jnc(usize),
    /// Jumps if the bit is set.
    Jb(u8, usize),
    /// Jumps if the bit is not set.
    Jnb(u8, usize),
    /// Jumps if the bit is set, clearing the bit.
    Jbc(u8, usize),
    /// Compares two bytes and jumps if they are not equal.
    Cjne(ByteLoc, ByteSrc, usize),
    /// Decrements a byte and jumps if the result is not zero.
    Djnz(ByteLoc, usize),
}
impl SimInstr {
    /// The mnemonic of this instruction.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            SimInstr::Nop => "NOP",
            SimInstr::Mov(..) | SimInstr::MovDptr(_) | SimInstr::MovToCarry(_) | SimInstr::MovFromCarry(_) => "MOV",
            SimInstr::Movc => "MOVC",
            SimInstr::Push(_) => "PUSH",
            SimInstr::Pop(_) => "POP",
            SimInstr::Xch(_) => "XCH",
            SimInstr::Xchd(_) => "XCHD",
            SimInstr::Swap => "SWAP",
            SimInstr::Add(..) => "ADD",
            SimInstr::Addc(..) => "ADDC",
            SimInstr::Subb(..) => "SUBB",
            SimInstr::Inc(_) | SimInstr::IncDptr => "INC",
            SimInstr::Dec(_) => "DEC",
            SimInstr::Mul => "MUL",
            SimInstr::Div => "DIV",
            SimInstr::Da => "DA",
            SimInstr::Anl(..) | SimInstr::AnlC(..) => "ANL",
            SimInstr::Orl(..) | SimInstr::OrlC(..) => "ORL",
            SimInstr::Xrl(..) => "XRL",
            SimInstr::ClrA | SimInstr::Clr(_) => "CLR",
            SimInstr::Setb(_) => "SETB",
            SimInstr::CplA | SimInstr::Cpl(_) => "CPL",
            SimInstr::Rl => "RL",
            SimInstr::Rlc => "RLC",
            SimInstr::Rr => "RR",
            SimInstr::Rrc => "RRC",
            SimInstr::Jmp(_) | SimInstr::JmpIndirect => "JMP",
            SimInstr::Call(_) => "CALL",
            SimInstr::Ret => "RET",
            SimInstr::Reti => "RETI",
            SimInstr::Jz(_) => "JZ",
            SimInstr::Jnz(_) => "JNZ",
            SimInstr::Jc(_) => "JC",
            SimInstr::Jnc(_) => "JNC",
            SimInstr::Jb(..) => "JB",
            SimInstr::Jnb(..) => "JNB",
            SimInstr::Jbc(..) => "JBC",
            SimInstr::Cjne(..) => "CJNE",
            SimInstr::Djnz(..) => "DJNZ",
        }
    }

    /// The instruction index this instruction may jump to, if it has a fixed target.
    pub fn target(&self) -> Option<usize> {
        match *self {
            | SimInstr::Jmp(t)
            | SimInstr::Call(t)
            | SimInstr::Jz(t)
            | SimInstr::Jnz(t)
            | SimInstr::Jc(t)
            | SimInstr::Jnc(t)
            | SimInstr::Jb(_, t)
            | SimInstr::Jnb(_, t)
            | SimInstr::Jbc(_, t)
            | SimInstr::Cjne(_, _, t)
            | SimInstr::Djnz(_, t) => Some(t),
            _ => None
        }
    }
}
impl std::fmt::Display for SimInstr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let m = self.mnemonic();
        match self {
            SimInstr::Nop | SimInstr::Ret | SimInstr::Reti => f.write_str(m),
            SimInstr::Mov(dst, src)
            | SimInstr::Add(dst, src)
            | SimInstr::Addc(dst, src)
            | SimInstr::Subb(dst, src)
            | SimInstr::Anl(dst, src)
            | SimInstr::Orl(dst, src)
            | SimInstr::Xrl(dst, src) => write!(f, "{m} {dst}, {src}"),
            SimInstr::MovDptr(value) => {
                f.write_str("MOV DPTR, #")?;
                super::fmt_hex(f, *value)
            },
            SimInstr::MovToCarry(bit) => write!(f, "MOV C, {}", BitLoc::Addr(*bit)),
            SimInstr::MovFromCarry(bit) => write!(f, "MOV {}, C", BitLoc::Addr(*bit)),
            SimInstr::Movc => f.write_str("MOVC A, @A+DPTR"),
            SimInstr::Push(addr) | SimInstr::Pop(addr) => write!(f, "{m} {}", ByteLoc::Direct(*addr)),
            SimInstr::Xch(loc) => write!(f, "XCH A, {loc}"),
            SimInstr::Xchd(r) => write!(f, "XCHD A, @{r}"),
            SimInstr::Swap | SimInstr::Da | SimInstr::ClrA | SimInstr::CplA
            | SimInstr::Rl | SimInstr::Rlc | SimInstr::Rr | SimInstr::Rrc => write!(f, "{m} A"),
            SimInstr::Inc(loc) | SimInstr::Dec(loc) => write!(f, "{m} {loc}"),
            SimInstr::IncDptr => f.write_str("INC DPTR"),
            SimInstr::Mul | SimInstr::Div => write!(f, "{m} AB"),
            SimInstr::AnlC(bit, inv) | SimInstr::OrlC(bit, inv) => {
                let slash = if *inv { "/" } else { "" };
                write!(f, "{m} C, {slash}{}", BitLoc::Addr(*bit))
            },
            SimInstr::Clr(bit) | SimInstr::Setb(bit) | SimInstr::Cpl(bit) => write!(f, "{m} {bit}"),
            SimInstr::JmpIndirect => f.write_str("JMP @A+DPTR"),
            SimInstr::Jmp(t) | SimInstr::Call(t)
            | SimInstr::Jz(t) | SimInstr::Jnz(t)
            | SimInstr::Jc(t) | SimInstr::Jnc(t) => write!(f, "{m} {t}"),
            SimInstr::Jb(bit, t) | SimInstr::Jnb(bit, t) | SimInstr::Jbc(bit, t) => write!(f, "{m} {}, {t}", BitLoc::Addr(*bit)),
            SimInstr::Cjne(a, b, t) => write!(f, "{m} {a}, {b}, {t}"),
            SimInstr::Djnz(loc, t) => write!(f, "{m} {loc}, {t}"),
        }
    }
}
