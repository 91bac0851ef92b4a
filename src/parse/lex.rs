//! Tokenizing MCS-51 assembly.
//!
//! This module holds the tokens that characterize 8051 assembly ([`Token`]).
//! This module is used by the parser to facilitate the conversion of
//! assembly source lines into statements.
//!
//! The module's key data structure is the [`Token`] enum,
//! which lists all of the tokens of 8051 assembly.

use std::num::IntErrorKind;

use logos::{Lexer, Logos};

/// The largest string literal that can be emitted with `DB` (the size of ROM).
pub const MAX_STR_LEN: usize = 256;

/// A unit of information in 8051 source code.
#[derive(Debug, Logos, PartialEq, Eq, Clone)]
#[logos(skip r"[ \t]+", error = LexErr)]
pub enum Token {
    // Note, these regexes span over tokens that are technically invalid
    // (e.g., 23trst matches for unsigned even though it shouldn't).
    // This is intended.
    // These regexes collect what would be considered one discernable unit
    // and validates it using the validator function.

    /// An unsigned numeric value (e.g., `9`, `9d`, `0Fh`, `0x0F`, `1010b`)
    #[regex(r"\d\w*", lex_unsigned)]
    Unsigned(u16),

    /// A negative numeric value (e.g., `-9`, `-0Fh`)
    #[regex(r"-\w*", lex_signed)]
    Signed(i16),

    /// A register value (i.e., `R0`-`R7`)
    #[regex(r"[Rr]\d+", lex_reg)]
    Reg(u8),

    /// A register used as a pointer (i.e., `@R0` or `@R1`)
    #[regex(r"@[Rr]\d+", lex_indirect)]
    Indirect(u8),

    /// The code-relative pointer `@A+DPTR` (used by `MOVC` and `JMP`)
    #[regex(r"@[Aa][ \t]*\+[ \t]*[Dd][Pp][Tt][Rr]")]
    AtAPlusDptr,

    /// An identifier.
    ///
    /// This can refer to either:
    /// - a label or a named operand (e.g., `LOOP`, `ACC`, `DPTR`, `CY`)
    /// - an instruction or directive (e.g. `MOV`, `ADD`, `ORG`)
    ///
    /// This token type is case-insensitive.
    #[regex(r"[A-Za-z_]\w*", |lx| lx.slice().parse::<Ident>().unwrap_or_else(|e| match e {}))]
    Ident(Ident),

    /// A string literal (e.g., `"Hello!"`)
    #[token(r#"""#, lex_str_literal)]
    String(String),

    /// The immediate marker (e.g., the `#` in `MOV A, #5`)
    #[token("#")]
    Hash,

    /// The bit complement marker (e.g., the `/` in `ANL C, /ACC.0`)
    #[token("/")]
    Slash,

    /// The bit selector (e.g., the `.` in `SETB 20h.3`)
    #[token(".")]
    Dot,

    /// A colon, which appears after labels
    #[token(":")]
    Colon,

    /// A comma, which delineate operands of an instruction
    #[token(",")]
    Comma,

    /// A comment, which starts with a semicolon and spans the remaining part of the line.
    #[regex(r";.*")]
    Comment,

    /// A new line
    #[regex(r"\r?\n")]
    NewLine
}
impl Token {
    pub(crate) fn is_whitespace(&self) -> bool {
        matches!(self, Token::NewLine | Token::Comment)
    }
}

macro_rules! ident_enum {
    ($($instr:ident),+) => {
        /// An identifier.
        ///
        /// This can refer to either:
        /// - a label or named operand (e.g., `LOOP`, `ACC`, `C`)
        /// - an instruction or directive (e.g. `MOV`, `DJNZ`, `ORG`)
        ///
        /// This token type is case insensitive.
        #[derive(Debug, PartialEq, Eq, Clone)]
        pub enum Ident {
            $(
                #[allow(missing_docs)]
                $instr
            ),+,
            #[allow(missing_docs)]
            Label(String)
        }

        impl std::str::FromStr for Ident {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match &*s.to_uppercase() {
                    $(stringify!($instr) => Ok(Self::$instr)),*,
                    _ => Ok(Self::Label(s.to_string()))
                }
            }
        }

        impl std::fmt::Display for Ident {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$instr => f.write_str(stringify!($instr))),*,
                    Self::Label(id) => f.write_str(id)
                }
            }
        }
    };
}
ident_enum! {
    MOV, MOVC, PUSH, POP, XCH, XCHD, SWAP,
    ADD, ADDC, SUBB, INC, DEC, MUL, DIV, DA,
    ANL, ORL, XRL, CLR, SETB, CPL, RL, RLC, RR, RRC,
    SJMP, AJMP, LJMP, JMP, ACALL, LCALL, CALL, RET, RETI,
    JZ, JNZ, JC, JNC, JB, JNB, JBC, CJNE, DJNZ, NOP,
    ORG, DB, END
}
impl Ident {
    /// Whether this identifier is a directive (`ORG`, `DB`, `END`) rather than an instruction.
    pub fn is_directive(&self) -> bool {
        matches!(self, Ident::ORG | Ident::DB | Ident::END)
    }
}

/// Any errors raised in attempting to tokenize an input stream.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum LexErr {
    /// Numeric literal (unsigned dec, hex, and bin) cannot fit within the range of a u16
    DoesNotFitU16,
    /// Numeric literal (negative) cannot fit within the range of a i16
    DoesNotFitI16,
    /// Hex literal (ending in h or starting with 0x) has invalid hex digits
    InvalidHex,
    /// Binary literal (ending in b) has digits other than 0 and 1
    InvalidBinary,
    /// Numeric literal could not be parsed as a decimal literal because it has invalid digits (i.e., not 0-9)
    InvalidNumeric,
    /// Hex literal (starting with 0x) doesn't have digits after it.
    InvalidHexEmpty,
    /// Numeric literal could not be parsed as a decimal literal because there are no digits in it (it's just -)
    InvalidDecEmpty,
    /// Int parsing failed but the reason why is unknown
    UnknownIntErr,
    /// String literal is missing an end quotation mark.
    UnclosedStrLit,
    /// String literal does not fit in ROM.
    StrLitTooBig,
    /// Token had the format R\d, but \d isn't 0-7.
    InvalidReg,
    /// Token had the format @R\d, but \d isn't 0 or 1.
    InvalidIndirect,
    /// A symbol was used which is not allowed in 8051 assembly files
    #[default]
    InvalidSymbol
}
impl std::fmt::Display for LexErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErr::DoesNotFitU16   => f.write_str("numeric token does not fit 16-bit unsigned integer"),
            LexErr::DoesNotFitI16   => f.write_str("numeric token does not fit 16-bit signed integer"),
            LexErr::InvalidHex      => f.write_str("invalid hex literal"),
            LexErr::InvalidBinary   => f.write_str("invalid binary literal"),
            LexErr::InvalidNumeric  => f.write_str("invalid decimal literal"),
            LexErr::InvalidHexEmpty => f.write_str("invalid hex literal"),
            LexErr::InvalidDecEmpty => f.write_str("invalid decimal literal"),
            LexErr::UnknownIntErr   => f.write_str("could not parse integer"),
            LexErr::UnclosedStrLit  => f.write_str("unclosed string literal"),
            LexErr::StrLitTooBig    => f.write_str("string literal is too large"),
            LexErr::InvalidReg      => f.write_str("invalid register"),
            LexErr::InvalidIndirect => f.write_str("invalid indirect register"),
            LexErr::InvalidSymbol   => f.write_str("unrecognized symbol"),
        }
    }
}
impl std::error::Error for LexErr {}
impl crate::err::Error for LexErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            LexErr::DoesNotFitU16    => Some(format!("the range for a 16-bit unsigned integer is [{}, {}]", u16::MIN, u16::MAX).into()),
            LexErr::DoesNotFitI16    => Some(format!("the range for a 16-bit signed integer is [{}, {}]", i16::MIN, i16::MAX).into()),
            LexErr::InvalidHex       => Some("a hex literal ends with 'h' (or starts with '0x') and consists of 0-9, A-F".into()),
            LexErr::InvalidBinary    => Some("a binary literal ends with 'b' and consists of 0 and 1".into()),
            LexErr::InvalidNumeric   => Some("a decimal literal only consists of digits 0-9".into()),
            LexErr::InvalidHexEmpty  => Some("there should be hex digits (0-9, A-F) here".into()),
            LexErr::InvalidDecEmpty  => Some("there should be digits (0-9) here".into()),
            LexErr::UnknownIntErr    => None,
            LexErr::UnclosedStrLit   => Some("add a quote to the end of the string literal".into()),
            LexErr::StrLitTooBig     => Some(format!("string literals are limited to at most {MAX_STR_LEN} characters").into()),
            LexErr::InvalidReg       => Some("this must be R0-R7".into()),
            LexErr::InvalidIndirect  => Some("only @R0 and @R1 can be used as pointers".into()),
            LexErr::InvalidSymbol    => Some("this char does not occur in any token in 8051 assembly".into()),
        }
    }
}
/// Helper that converts an int error kind to its corresponding LexErr, based on the provided inputs.
fn convert_int_error(
    e: &std::num::IntErrorKind,
    invalid_digits_err: LexErr,
    empty_err: LexErr,
    overflow_err: LexErr,
    src: &str
) -> LexErr {
    match e {
        IntErrorKind::Empty        => empty_err,
        IntErrorKind::InvalidDigit if src == "-" => empty_err,
        IntErrorKind::InvalidDigit => invalid_digits_err,
        IntErrorKind::PosOverflow  => overflow_err,
        IntErrorKind::NegOverflow  => overflow_err,
        _ => LexErr::UnknownIntErr,
    }
}
/// Parses an unsigned literal in any of the radix notations 8051 assemblers accept.
///
/// The radix is picked from the literal's shape:
/// - `0x` prefix, or `h` suffix: hexadecimal
/// - `b` suffix: binary
/// - `d` suffix or no suffix: decimal
fn parse_unsigned(src: &str) -> Result<u16, LexErr> {
    let lower = src.to_ascii_lowercase();

    let (digits, radix, invalid, empty) = if let Some(hex) = lower.strip_prefix("0x") {
        (hex, 16, LexErr::InvalidHex, LexErr::InvalidHexEmpty)
    } else if let Some(hex) = lower.strip_suffix('h') {
        (hex, 16, LexErr::InvalidHex, LexErr::InvalidHexEmpty)
    } else if let Some(bin) = lower.strip_suffix('b') {
        (bin, 2, LexErr::InvalidBinary, LexErr::InvalidDecEmpty)
    } else if let Some(dec) = lower.strip_suffix('d') {
        (dec, 10, LexErr::InvalidNumeric, LexErr::InvalidDecEmpty)
    } else {
        (&*lower, 10, LexErr::InvalidNumeric, LexErr::InvalidDecEmpty)
    };

    u16::from_str_radix(digits, radix)
        .map_err(|e| convert_int_error(e.kind(), invalid, empty, LexErr::DoesNotFitU16, digits))
}
fn lex_unsigned(lx: &Lexer<'_, Token>) -> Result<u16, LexErr> {
    parse_unsigned(lx.slice())
}
fn lex_signed(lx: &Lexer<'_, Token>) -> Result<i16, LexErr> {
    let Some(magnitude) = lx.slice().strip_prefix('-') else {
        unreachable!("Lexer slice should have started with -");
    };
    if magnitude.is_empty() {
        return Err(LexErr::InvalidDecEmpty);
    }

    let value = parse_unsigned(magnitude)
        .map_err(|e| match e {
            LexErr::DoesNotFitU16 => LexErr::DoesNotFitI16,
            e => e
        })?;

    i16::try_from(-i32::from(value))
        .map_err(|_| LexErr::DoesNotFitI16)
}
fn lex_reg(lx: &Lexer<'_, Token>) -> Result<u8, LexErr> {
    lx.slice()[1..].parse::<u8>().ok()
        .filter(|&r| r < 8)
        .ok_or(LexErr::InvalidReg)
}
fn lex_indirect(lx: &Lexer<'_, Token>) -> Result<u8, LexErr> {
    lx.slice()[2..].parse::<u8>().ok()
        .filter(|&r| r < 2)
        .ok_or(LexErr::InvalidIndirect)
}
fn lex_str_literal(lx: &mut Lexer<'_, Token>) -> Result<String, LexErr> {
    let rem = lx.remainder()
        .lines()
        .next()
        .unwrap_or("");

    // calculate the length of the string literal ignoring the quotes
    // consume tokens up to the end of the literal and including the unescaped quote
    let mlen = rem.match_indices('"')
        .map(|(n, _)| n)
        .find(|&n| n == 0 || !matches!(rem.get((n - 1)..(n + 1)), Some("\\\"")));

    match mlen {
        Some(len) => lx.bump(len + 1),
        None => {
            lx.bump(rem.len());
            return Err(LexErr::UnclosedStrLit);
        }
    }

    // get the string inside quotes:
    let mut remaining = &lx.slice()[1..(lx.slice().len() - 1)];
    let mut buf = String::with_capacity(remaining.len());

    // Look for escapes. Only a simple group of escapes are implemented.
    // (e.g., `\n`, `\r`, etc.)
    while let Some((left, right)) = remaining.split_once('\\') {
        buf.push_str(left);

        // there always has to be one, cause last character is not \
        let Some(&esc) = right.as_bytes().first() else {
            unreachable!("expected character after escape");
        };
        match esc {
            b'n'  => buf.push('\n'),
            b'r'  => buf.push('\r'),
            b't'  => buf.push('\t'),
            b'\\' => buf.push('\\'),
            b'0'  => buf.push('\0'),
            b'"'  => buf.push('\"'),
            c => {
                buf.push('\\');
                buf.push(char::from(c));
            }
        }

        remaining = &right[1..];
    }
    buf.push_str(remaining);

    match buf.len() <= MAX_STR_LEN {
        true  => Ok(buf),
        false => Err(LexErr::StrLitTooBig),
    }
}
