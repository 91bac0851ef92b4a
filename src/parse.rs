//! Parsing assembly source code into an AST.
//!
//! This module is used to convert strings (which represent assembly source code)
//! into abstract syntax trees that maintain the structure of the source code in memory.
//!
//! Source is parsed line by line: each line becomes one [`Stmt`]
//! (holding any labels on the line and the instruction or directive that follows them).
//! The operand shape of each instruction is validated here,
//! so the assembler only has to resolve labels.
//!
//! The main functions of this module are [`parse_line`], [`parse_lines`], and [`parse_source`].

pub mod lex;

use logos::Logos;

use crate::asm::{AsmErr, SyntaxErrKind};
use crate::ast::asm::{AsmInstr, Branch, Directive, Stmt, StmtKind};
use crate::ast::sim::SimInstr;
use crate::ast::{bit_address, is_reserved_name, sfr, BitLoc, ByteLoc, ByteSrc, Label, PswFlag, Reg};
use lex::{Ident, Token};

/// Parses a sequence of source lines into statements.
///
/// Parsing stops after an `END` directive; lines following it are not parsed.
///
/// # Example
/// ```
/// use mcs51_sim::parse::parse_lines;
///
/// let stmts = parse_lines(&["MOV R0, #5", "LOOP: DJNZ R0, LOOP", "END", "this is ignored"]).unwrap();
/// assert_eq!(stmts.len(), 3);
/// assert_eq!(stmts[1].labels[0].name, "LOOP");
/// ```
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Result<Vec<Stmt>, AsmErr> {
    let mut stmts = Vec::with_capacity(lines.len());

    for (line, src) in lines.iter().enumerate() {
        let stmt = parse_line(src.as_ref(), line)?;
        let end = matches!(stmt.nucleus, Some(StmtKind::Directive(Directive::End)));
        stmts.push(stmt);

        if end { break; }
    }

    Ok(stmts)
}

/// Parses a full source text into statements (see [`parse_lines`]).
pub fn parse_source(src: &str) -> Result<Vec<Stmt>, AsmErr> {
    let lines: Vec<_> = src.lines().collect();
    parse_lines(&lines)
}

/// Parses a single line of source into a statement.
///
/// `line` is the (0-indexed) line number reported in errors and stored in the statement.
pub fn parse_line(src: &str, line: usize) -> Result<Stmt, AsmErr> {
    Parser::new(src, line)
        .and_then(|mut p| p.parse_stmt())
        .map_err(|kind| AsmErr::Syntax { line, kind })
}

/// An operand, as written in source.
///
/// Plain addresses are kept ambiguous until the mnemonic determines
/// whether they refer to a byte or a bit.
#[derive(Debug, PartialEq, Eq, Clone)]
enum Operand {
    Acc,
    AB,
    Carry,
    Dptr,
    Reg(Reg),
    Indirect(Reg),
    AtAPlusDptr,
    Imm(Imm),
    Addr(u16),
    Bit(u8),
    NotBit(u8),
    Label(Label),
}
#[derive(Debug, PartialEq, Eq, Clone)]
enum Imm {
    Num(i32),
    Label(Label),
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    line: usize
}
impl Parser {
    fn new(src: &str, line: usize) -> Result<Self, SyntaxErrKind> {
        let tokens = Token::lexer(src)
            .filter(|t| !matches!(t, Ok(t) if t.is_whitespace()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(SyntaxErrKind::Lex)?;

        Ok(Parser { tokens, index: 0, line })
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.index + n)
    }
    fn peek(&self) -> Option<&Token> {
        self.peek_nth(0)
    }
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }
    fn advance_if(&mut self, token: &Token) -> bool {
        let matched = self.peek() == Some(token);
        if matched {
            self.index += 1;
        }
        matched
    }

    fn parse_stmt(&mut self) -> Result<Stmt, SyntaxErrKind> {
        let mut labels = vec![];
        loop {
            let name = match (self.peek_nth(0), self.peek_nth(1)) {
                (Some(Token::Ident(Ident::Label(name))), Some(Token::Colon)) => name.clone(),
                _ => break
            };
            if is_reserved_name(&name) {
                return Err(SyntaxErrKind::ReservedLabel(name));
            }

            labels.push(Label::new(name, self.line));
            self.index += 2;
        }

        let nucleus = match self.next() {
            None => None,
            Some(Token::Ident(Ident::Label(name))) => return Err(SyntaxErrKind::UnknownMnemonic(name)),
            Some(Token::Ident(id)) if id.is_directive() => Some(StmtKind::Directive(self.parse_directive(id)?)),
            Some(Token::Ident(id)) => Some(StmtKind::Instr(self.parse_instr(id)?)),
            Some(_) => return Err(SyntaxErrKind::ExpectedMnemonic),
        };

        match self.peek() {
            None => Ok(Stmt { labels, nucleus, line: self.line }),
            Some(_) => Err(SyntaxErrKind::UnexpectedToken),
        }
    }

    fn parse_directive(&mut self, id: Ident) -> Result<Directive, SyntaxErrKind> {
        match id {
            Ident::ORG => match self.next() {
                Some(Token::Unsigned(addr)) => Ok(Directive::Org(addr)),
                _ => Err(SyntaxErrKind::InvalidOperands(id.to_string())),
            },
            Ident::END => Ok(Directive::End),
            Ident::DB => {
                let mut bytes = vec![];
                loop {
                    match self.next() {
                        Some(Token::Unsigned(n)) => bytes.push(imm8(i32::from(n))?),
                        Some(Token::Signed(n))   => bytes.push(imm8(i32::from(n))?),
                        Some(Token::String(s))   => bytes.extend_from_slice(s.as_bytes()),
                        _ => return Err(SyntaxErrKind::ExpectedOperand),
                    }

                    if !self.advance_if(&Token::Comma) { break; }
                }
                Ok(Directive::Db(bytes))
            },
            _ => unreachable!("{id} should have been a directive"),
        }
    }

    fn parse_operands(&mut self) -> Result<Vec<Operand>, SyntaxErrKind> {
        let mut operands = vec![];
        if self.peek().is_none() {
            return Ok(operands);
        }

        loop {
            operands.push(self.parse_operand()?);
            if !self.advance_if(&Token::Comma) { break; }
        }
        Ok(operands)
    }

    fn parse_operand(&mut self) -> Result<Operand, SyntaxErrKind> {
        match self.next() {
            Some(Token::Hash) => match self.next() {
                Some(Token::Unsigned(n)) => Ok(Operand::Imm(Imm::Num(i32::from(n)))),
                Some(Token::Signed(n))   => Ok(Operand::Imm(Imm::Num(i32::from(n)))),
                Some(Token::Ident(Ident::Label(name))) if !is_reserved_name(&name) => {
                    Ok(Operand::Imm(Imm::Label(Label::new(name, self.line))))
                },
                _ => Err(SyntaxErrKind::ExpectedImmediate),
            },
            Some(Token::Reg(r))      => Ok(Operand::Reg(Reg(r))),
            Some(Token::Indirect(r)) => Ok(Operand::Indirect(Reg(r))),
            Some(Token::AtAPlusDptr) => Ok(Operand::AtAPlusDptr),
            Some(Token::Slash) => match self.parse_operand()? {
                Operand::Bit(bit) => Ok(Operand::NotBit(bit)),
                Operand::Addr(addr) => u8::try_from(addr)
                    .map(Operand::NotBit)
                    .map_err(|_| SyntaxErrKind::AddrOutOfRange(addr)),
                _ => Err(SyntaxErrKind::ExpectedBit),
            },
            Some(Token::Unsigned(n)) => self.parse_bit_suffix(n),
            Some(Token::Ident(Ident::Label(name))) => {
                if self.peek() == Some(&Token::Dot) {
                    let byte = sfr::lookup(&name).ok_or(SyntaxErrKind::InvalidBitAddress)?;
                    return self.parse_bit_suffix(u16::from(byte));
                }

                let operand = match &*name.to_uppercase() {
                    "A"    => Operand::Acc,
                    "AB"   => Operand::AB,
                    "C"    => Operand::Carry,
                    "DPTR" => Operand::Dptr,
                    upper => match (sfr::lookup(upper), PswFlag::from_name(upper)) {
                        (Some(addr), _) => Operand::Addr(u16::from(addr)),
                        (None, Some(flag)) => Operand::Bit(flag.bit_addr()),
                        (None, None) => Operand::Label(Label::new(name, self.line)),
                    }
                };
                Ok(operand)
            },
            _ => Err(SyntaxErrKind::ExpectedOperand),
        }
    }

    /// Parses the `.bit` part of a `byte.bit` operand, if present.
    fn parse_bit_suffix(&mut self, byte: u16) -> Result<Operand, SyntaxErrKind> {
        if !self.advance_if(&Token::Dot) {
            return Ok(Operand::Addr(byte));
        }

        match self.next() {
            Some(Token::Unsigned(bit)) => bit_address(byte, bit)
                .map(Operand::Bit)
                .ok_or(SyntaxErrKind::InvalidBitAddress),
            _ => Err(SyntaxErrKind::ExpectedBit),
        }
    }

    fn parse_instr(&mut self, id: Ident) -> Result<AsmInstr, SyntaxErrKind> {
        use AsmInstr::{Branch as Br, Plain};
        use Ident as I;
        use Operand as O;

        let operands = self.parse_operands()?;
        let sh = Shape { mnemonic: &id };

        let instr = match (&id, &*operands) {
            (I::NOP, []) => Plain(SimInstr::Nop),

            (I::MOV, [O::Dptr, O::Imm(Imm::Num(n))])   => Plain(SimInstr::MovDptr(imm16(*n)?)),
            (I::MOV, [O::Dptr, O::Imm(Imm::Label(l))]) => AsmInstr::MovDptr(l.clone()),
            (I::MOV, [O::Carry, bit]) => Plain(SimInstr::MovToCarry(sh.bit(bit)?)),
            (I::MOV, [bit, O::Carry]) => Plain(SimInstr::MovFromCarry(sh.bit(bit)?)),
            (I::MOV, [dst, src])      => Plain(SimInstr::Mov(sh.loc(dst)?, sh.src(src)?)),
            (I::MOVC, [O::Acc, O::AtAPlusDptr]) => Plain(SimInstr::Movc),
            (I::PUSH, [addr]) => Plain(SimInstr::Push(sh.direct(addr)?)),
            (I::POP, [addr])  => Plain(SimInstr::Pop(sh.direct(addr)?)),
            (I::XCH, [O::Acc, loc]) => Plain(SimInstr::Xch(sh.loc(loc)?)),
            (I::XCHD, [O::Acc, O::Indirect(r)]) => Plain(SimInstr::Xchd(*r)),
            (I::SWAP, [O::Acc]) => Plain(SimInstr::Swap),

            (I::ADD, [dst, src])  => Plain(SimInstr::Add(sh.loc(dst)?, sh.src(src)?)),
            (I::ADDC, [dst, src]) => Plain(SimInstr::Addc(sh.loc(dst)?, sh.src(src)?)),
            (I::SUBB, [dst, src]) => Plain(SimInstr::Subb(sh.loc(dst)?, sh.src(src)?)),
            (I::INC, [O::Dptr]) => Plain(SimInstr::IncDptr),
            (I::INC, [loc]) => Plain(SimInstr::Inc(sh.loc(loc)?)),
            (I::DEC, [loc]) => Plain(SimInstr::Dec(sh.loc(loc)?)),
            (I::MUL, [O::AB]) => Plain(SimInstr::Mul),
            (I::DIV, [O::AB]) => Plain(SimInstr::Div),
            (I::DA, [O::Acc]) => Plain(SimInstr::Da),

            (I::ANL, [O::Carry, O::NotBit(bit)]) => Plain(SimInstr::AnlC(*bit, true)),
            (I::ANL, [O::Carry, bit])            => Plain(SimInstr::AnlC(sh.bit(bit)?, false)),
            (I::ORL, [O::Carry, O::NotBit(bit)]) => Plain(SimInstr::OrlC(*bit, true)),
            (I::ORL, [O::Carry, bit])            => Plain(SimInstr::OrlC(sh.bit(bit)?, false)),
            (I::ANL, [dst, src]) => Plain(SimInstr::Anl(sh.loc(dst)?, sh.src(src)?)),
            (I::ORL, [dst, src]) => Plain(SimInstr::Orl(sh.loc(dst)?, sh.src(src)?)),
            (I::XRL, [dst, src]) => Plain(SimInstr::Xrl(sh.loc(dst)?, sh.src(src)?)),
            (I::CLR, [O::Acc]) => Plain(SimInstr::ClrA),
            (I::CLR, [bit])    => Plain(SimInstr::Clr(sh.bit_loc(bit)?)),
            (I::SETB, [bit])   => Plain(SimInstr::Setb(sh.bit_loc(bit)?)),
            (I::CPL, [O::Acc]) => Plain(SimInstr::CplA),
            (I::CPL, [bit])    => Plain(SimInstr::Cpl(sh.bit_loc(bit)?)),
            (I::RL, [O::Acc])  => Plain(SimInstr::Rl),
            (I::RLC, [O::Acc]) => Plain(SimInstr::Rlc),
            (I::RR, [O::Acc])  => Plain(SimInstr::Rr),
            (I::RRC, [O::Acc]) => Plain(SimInstr::Rrc),

            (I::JMP, [O::AtAPlusDptr]) => Plain(SimInstr::JmpIndirect),
            (I::SJMP | I::AJMP | I::LJMP | I::JMP, [O::Label(l)]) => Br(Branch::Jmp, l.clone()),
            (I::ACALL | I::LCALL | I::CALL, [O::Label(l)]) => Br(Branch::Call, l.clone()),
            (I::RET, [])  => Plain(SimInstr::Ret),
            (I::RETI, []) => Plain(SimInstr::Reti),
            (I::JZ, [O::Label(l)])  => Br(Branch::Jz, l.clone()),
            (I::JNZ, [O::Label(l)]) => Br(Branch::Jnz, l.clone()),
            (I::JC, [O::Label(l)])  => Br(Branch::Jc, l.clone()),
            (I::JNC, [O::Label(l)]) => Br(Branch::Jnc, l.clone()),
            (I::JB, [bit, O::Label(l)])  => Br(Branch::Jb(sh.bit(bit)?), l.clone()),
            (I::JNB, [bit, O::Label(l)]) => Br(Branch::Jnb(sh.bit(bit)?), l.clone()),
            (I::JBC, [bit, O::Label(l)]) => Br(Branch::Jbc(sh.bit(bit)?), l.clone()),
            (I::CJNE, [a, b, O::Label(l)]) => Br(Branch::Cjne(sh.loc(a)?, sh.src(b)?), l.clone()),
            (I::DJNZ, [loc, O::Label(l)])  => Br(Branch::Djnz(sh.loc(loc)?), l.clone()),

            _ => return Err(sh.invalid()),
        };

        Ok(instr)
    }
}

/// Converts ambiguous operands into the shape an instruction requires.
struct Shape<'a> {
    mnemonic: &'a Ident
}
impl Shape<'_> {
    fn invalid(&self) -> SyntaxErrKind {
        SyntaxErrKind::InvalidOperands(self.mnemonic.to_string())
    }

    fn direct(&self, op: &Operand) -> Result<u8, SyntaxErrKind> {
        match *op {
            Operand::Addr(addr) => u8::try_from(addr).map_err(|_| SyntaxErrKind::AddrOutOfRange(addr)),
            _ => Err(self.invalid()),
        }
    }

    fn loc(&self, op: &Operand) -> Result<ByteLoc, SyntaxErrKind> {
        match *op {
            Operand::Acc => Ok(ByteLoc::Acc),
            Operand::Reg(r) => Ok(ByteLoc::Reg(r)),
            Operand::Indirect(r) => Ok(ByteLoc::Indirect(r)),
            Operand::Addr(_) => self.direct(op).map(ByteLoc::Direct),
            _ => Err(self.invalid()),
        }
    }

    fn src(&self, op: &Operand) -> Result<ByteSrc, SyntaxErrKind> {
        match op {
            Operand::Imm(Imm::Num(n)) => imm8(*n).map(ByteSrc::Imm),
            _ => self.loc(op).map(ByteSrc::Loc),
        }
    }

    fn bit(&self, op: &Operand) -> Result<u8, SyntaxErrKind> {
        match *op {
            Operand::Bit(bit) => Ok(bit),
            Operand::Addr(_) => self.direct(op),
            _ => Err(self.invalid()),
        }
    }

    fn bit_loc(&self, op: &Operand) -> Result<BitLoc, SyntaxErrKind> {
        match op {
            Operand::Carry => Ok(BitLoc::Carry),
            _ => self.bit(op).map(BitLoc::Addr),
        }
    }
}

/// Validates an 8-bit immediate (which may be written signed or unsigned).
fn imm8(n: i32) -> Result<u8, SyntaxErrKind> {
    match n {
        -128..=255 => Ok(n as u8),
        _ => Err(SyntaxErrKind::ImmOutOfRange(n)),
    }
}
/// Validates a 16-bit immediate (which may be written signed or unsigned).
fn imm16(n: i32) -> Result<u16, SyntaxErrKind> {
    match n {
        -32768..=65535 => Ok(n as u16),
        _ => Err(SyntaxErrKind::ImmOutOfRange(n)),
    }
}

#[cfg(test)]
mod tests {
    use crate::asm::{AsmErr, SyntaxErrKind};
    use crate::ast::asm::{AsmInstr, Branch, Directive, Stmt, StmtKind};
    use crate::ast::reg_consts::{R0, R1, R7};
    use crate::ast::sim::SimInstr;
    use crate::ast::{sfr, BitLoc, ByteLoc, ByteSrc, Label};
    use crate::err::LexErr;

    use super::{parse_line, parse_lines};

    fn instr(src: &str) -> AsmInstr {
        match parse_line(src, 0) {
            Ok(Stmt { nucleus: Some(StmtKind::Instr(instr)), .. }) => instr,
            r => panic!("expected {src:?} to parse into an instruction, got {r:?}"),
        }
    }
    fn plain(src: &str) -> SimInstr {
        match instr(src) {
            AsmInstr::Plain(instr) => instr,
            i => panic!("expected {src:?} to have no label operands, got {i:?}"),
        }
    }
    fn syntax_err(src: &str) -> SyntaxErrKind {
        match parse_line(src, 0) {
            Err(AsmErr::Syntax { kind, .. }) => kind,
            r => panic!("expected {src:?} to fail to parse, got {r:?}"),
        }
    }
    fn label(name: &str) -> Label {
        Label::new(name.to_string(), 0)
    }

    #[test]
    fn test_data_transfer() {
        assert_eq!(plain("MOV R0, #5"), SimInstr::Mov(ByteLoc::Reg(R0), ByteSrc::Imm(5)));
        assert_eq!(plain("mov a, r7"), SimInstr::Mov(ByteLoc::Acc, ByteSrc::Loc(ByteLoc::Reg(R7))));
        assert_eq!(plain("MOV 30h, @R1"), SimInstr::Mov(ByteLoc::Direct(0x30), ByteSrc::Loc(ByteLoc::Indirect(R1))));
        assert_eq!(plain("MOV B, #-1"), SimInstr::Mov(ByteLoc::Direct(sfr::B), ByteSrc::Imm(0xFF)));
        assert_eq!(plain("MOV DPTR, #1234h"), SimInstr::MovDptr(0x1234));
        assert_eq!(instr("MOV DPTR, #TABLE"), AsmInstr::MovDptr(label("TABLE")));
        assert_eq!(plain("MOV C, 20h.1"), SimInstr::MovToCarry(0x01));
        assert_eq!(plain("MOV ACC.7, C"), SimInstr::MovFromCarry(0xE7));
        assert_eq!(plain("MOVC A, @A+DPTR"), SimInstr::Movc);
        assert_eq!(plain("PUSH ACC"), SimInstr::Push(sfr::ACC));
        assert_eq!(plain("POP 31h"), SimInstr::Pop(0x31));
        assert_eq!(plain("XCHD A, @R0"), SimInstr::Xchd(R0));
    }

    #[test]
    fn test_arith_logic() {
        assert_eq!(plain("ADD R0, R1"), SimInstr::Add(ByteLoc::Reg(R0), ByteSrc::Loc(ByteLoc::Reg(R1))));
        assert_eq!(plain("SUBB A, #0FFh"), SimInstr::Subb(ByteLoc::Acc, ByteSrc::Imm(0xFF)));
        assert_eq!(plain("INC DPTR"), SimInstr::IncDptr);
        assert_eq!(plain("MUL AB"), SimInstr::Mul);
        assert_eq!(plain("ANL C, /CY"), SimInstr::AnlC(0xD7, true));
        assert_eq!(plain("ORL C, 7Fh"), SimInstr::OrlC(0x7F, false));
        assert_eq!(plain("XRL P1, #0Fh"), SimInstr::Xrl(ByteLoc::Direct(sfr::P1), ByteSrc::Imm(0x0F)));
        assert_eq!(plain("CLR A"), SimInstr::ClrA);
        assert_eq!(plain("CLR C"), SimInstr::Clr(BitLoc::Carry));
        assert_eq!(plain("SETB RS0"), SimInstr::Setb(BitLoc::Addr(0xD3)));
        assert_eq!(plain("CPL PSW.5"), SimInstr::Cpl(BitLoc::Addr(0xD5)));
        assert_eq!(plain("RLC A"), SimInstr::Rlc);
    }

    #[test]
    fn test_branches() {
        assert_eq!(instr("SJMP LOOP"), AsmInstr::Branch(Branch::Jmp, label("LOOP")));
        assert_eq!(instr("LJMP LOOP"), AsmInstr::Branch(Branch::Jmp, label("LOOP")));
        assert_eq!(instr("LCALL SUB"), AsmInstr::Branch(Branch::Call, label("SUB")));
        assert_eq!(instr("JNB 20h.0, L"), AsmInstr::Branch(Branch::Jnb(0x00), label("L")));
        assert_eq!(instr("CJNE A, #10, L"), AsmInstr::Branch(Branch::Cjne(ByteLoc::Acc, ByteSrc::Imm(10)), label("L")));
        assert_eq!(instr("DJNZ R7, L"), AsmInstr::Branch(Branch::Djnz(ByteLoc::Reg(R7)), label("L")));
        assert_eq!(plain("JMP @A+DPTR"), SimInstr::JmpIndirect);
        assert_eq!(plain("RET"), SimInstr::Ret);
    }

    #[test]
    fn test_labels_and_comments() {
        let stmt = parse_line("A1: a2: NOP ; comment", 4).unwrap();
        assert_eq!(stmt.labels, vec![Label::new("A1".into(), 4), Label::new("a2".into(), 4)]);
        assert_eq!(stmt.nucleus, Some(StmtKind::Instr(AsmInstr::Plain(SimInstr::Nop))));
        assert_eq!(stmt.line, 4);

        let stmt = parse_line("ONLY:", 0).unwrap();
        assert_eq!(stmt.labels.len(), 1);
        assert_eq!(stmt.nucleus, None);

        let stmt = parse_line("   ; just a comment", 0).unwrap();
        assert!(stmt.labels.is_empty());
        assert_eq!(stmt.nucleus, None);
    }

    #[test]
    fn test_directives() {
        let stmt = parse_line("TABLE: DB 1, -1, 0Ah, \"hi\"", 0).unwrap();
        assert_eq!(stmt.nucleus, Some(StmtKind::Directive(Directive::Db(vec![1, 0xFF, 0x0A, b'h', b'i']))));
        assert_eq!(parse_line("ORG 10h", 0).unwrap().nucleus, Some(StmtKind::Directive(Directive::Org(0x10))));

        let stmts = parse_lines(&["NOP", "END", "NOT EVEN VALID"]).unwrap();
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn test_errors() {
        assert_eq!(syntax_err("FOO A, #1"), SyntaxErrKind::UnknownMnemonic("FOO".into()));
        assert_eq!(syntax_err("#5"), SyntaxErrKind::ExpectedMnemonic);
        assert_eq!(syntax_err("MOV A"), SyntaxErrKind::InvalidOperands("MOV".into()));
        assert_eq!(syntax_err("SWAP B"), SyntaxErrKind::InvalidOperands("SWAP".into()));
        assert_eq!(syntax_err("MOV A, #256"), SyntaxErrKind::ImmOutOfRange(256));
        assert_eq!(syntax_err("MOV A, 100h"), SyntaxErrKind::AddrOutOfRange(0x100));
        assert_eq!(syntax_err("SETB 30h.1"), SyntaxErrKind::InvalidBitAddress);
        assert_eq!(syntax_err("SETB 20h.8"), SyntaxErrKind::InvalidBitAddress);
        assert_eq!(syntax_err("NOP 5"), SyntaxErrKind::InvalidOperands("NOP".into()));
        assert_eq!(syntax_err("MOV A, #1 #2"), SyntaxErrKind::UnexpectedToken);
        assert_eq!(syntax_err("ACC: NOP"), SyntaxErrKind::ReservedLabel("ACC".into()));
        assert_eq!(syntax_err("MOV A, R8"), SyntaxErrKind::Lex(LexErr::InvalidReg));
        assert_eq!(syntax_err("DB"), SyntaxErrKind::ExpectedOperand);

        match parse_lines(&["NOP", "MOV A, $"]) {
            Err(AsmErr::Syntax { line, kind }) => {
                assert_eq!(line, 1);
                assert_eq!(kind, SyntaxErrKind::Lex(LexErr::InvalidSymbol));
            },
            r => panic!("expected syntax error, got {r:?}"),
        }
    }
}
