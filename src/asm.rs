//! Assembling assembly source into executable programs.
//!
//! This module is used to convert source statements (`Vec<`[`Stmt`]`>`) into programs
//! that can be executed by the simulator.
//!
//! The assembler module notably consists of:
//! - [`assemble`] and [`assemble_stmts`]: The main functions which assemble source into a program.
//! - [`SymbolTable`]: a struct holding the symbol table, which stores location information for labels after the first assembler pass
//! - [`Program`]: a struct holding the resolved program, which can be loaded into the simulator and executed
//!
//! Assembly is all-or-nothing: either every line assembles and every label resolves,
//! or an [`AsmErr`] is returned and no program is produced.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use crate::ast::asm::{AsmInstr, Directive, Stmt, StmtKind};
use crate::ast::sim::SimInstr;
use crate::ast::Label;
use crate::err::LexErr;
use crate::parse::parse_lines;
use crate::sim::mem::ROM_SIZE;

/// Assembles source lines into a program.
///
/// Line numbers in errors are the (0-indexed) positions of the lines in `lines`.
///
/// # Example
/// ```
/// use mcs51_sim::asm::assemble;
///
/// let program = assemble(&["MOV R0, #5", "LOOP: DJNZ R0, LOOP"]).unwrap();
/// assert_eq!(program.len(), 2);
/// assert_eq!(program.symbol_table().lookup_code_label("loop"), Some(1));
/// ```
pub fn assemble<S: AsRef<str>>(lines: &[S]) -> Result<Program, AsmErr> {
    let stmts = parse_lines(lines)?;
    assemble_stmts(stmts)
}
/// Assembles already parsed statements into a program.
pub fn assemble_stmts(stmts: Vec<Stmt>) -> Result<Program, AsmErr> {
    let sym = SymbolTable::new(&stmts)?;
    Program::new(stmts, sym)
}

/// Kinds of syntax errors that can occur from assembling given assembly code.
///
/// See [`AsmErr::Syntax`] for this error type with line information included.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum SyntaxErrKind {
    /// The line could not be tokenized.
    Lex(LexErr),
    /// The mnemonic is not a known instruction or directive.
    UnknownMnemonic(String),
    /// The line does not start with a mnemonic (after its labels).
    ExpectedMnemonic,
    /// An operand was expected.
    ExpectedOperand,
    /// An immediate value (a number or a data label) was expected after `#`.
    ExpectedImmediate,
    /// A bit operand was expected.
    ExpectedBit,
    /// There were tokens after the end of the statement.
    UnexpectedToken,
    /// The operands do not form a valid instruction with this mnemonic.
    InvalidOperands(String),
    /// A label has the name of a register, SFR, or flag.
    ReservedLabel(String),
    /// The byte is not bit-addressable (or the bit index exceeds 7).
    InvalidBitAddress,
    /// The immediate does not fit the operand.
    ImmOutOfRange(i32),
    /// The address does not fit in the 256-byte internal address space.
    AddrOutOfRange(u16),
    /// There were multiple labels of the same name (pass 1).
    DuplicateLabel(String),
    /// A data label was used as a jump or call target (pass 2).
    DataLabelAsTarget(String),
    /// A code label was used as a data pointer (pass 2).
    CodeLabelAsData(String),
    /// `DB` bytes extend past the end of ROM (pass 1).
    RomOverflow,
    /// `DB` bytes were written twice to this ROM address (pass 2).
    RomOverlap(u16),
}
impl std::fmt::Display for SyntaxErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lex(e)                 => std::fmt::Display::fmt(e, f),
            Self::UnknownMnemonic(m)     => write!(f, "unknown instruction '{m}'"),
            Self::ExpectedMnemonic       => f.write_str("expected instruction or directive"),
            Self::ExpectedOperand        => f.write_str("expected operand"),
            Self::ExpectedImmediate      => f.write_str("expected immediate value"),
            Self::ExpectedBit            => f.write_str("expected bit"),
            Self::UnexpectedToken        => f.write_str("unexpected token"),
            Self::InvalidOperands(m)     => write!(f, "invalid operands for {m}"),
            Self::ReservedLabel(l)       => write!(f, "'{l}' cannot be used as a label"),
            Self::InvalidBitAddress      => f.write_str("invalid bit address"),
            Self::ImmOutOfRange(n)       => write!(f, "immediate {n} is out of range"),
            Self::AddrOutOfRange(a)      => write!(f, "address {a:#X} is out of range"),
            Self::DuplicateLabel(l)      => write!(f, "label '{l}' was defined multiple times"),
            Self::DataLabelAsTarget(l)   => write!(f, "'{l}' labels data, not an instruction"),
            Self::CodeLabelAsData(l)     => write!(f, "'{l}' labels an instruction, not data"),
            Self::RomOverflow            => f.write_str("data extends past the end of ROM"),
            Self::RomOverlap(a)          => write!(f, "ROM address {a:#04X} was written multiple times"),
        }
    }
}

/// Error from assembling given assembly code.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum AsmErr {
    /// A line was malformed.
    Syntax {
        /// The (0-indexed) source line.
        line: usize,
        /// What was wrong with it.
        kind: SyntaxErrKind
    },
    /// A label was referenced but never defined.
    UnresolvedLabel {
        /// The (0-indexed) source line of the reference.
        line: usize,
        /// The label, as written in source.
        label: String
    },
}
impl AsmErr {
    fn syntax(line: usize, kind: SyntaxErrKind) -> Self {
        AsmErr::Syntax { line, kind }
    }
}
impl std::fmt::Display for AsmErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AsmErr::Syntax { line, kind } => write!(f, "syntax error on line {line}: {kind}"),
            AsmErr::UnresolvedLabel { line, label } => write!(f, "unresolved label '{label}' on line {line}"),
        }
    }
}
impl std::error::Error for AsmErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AsmErr::Syntax { kind: SyntaxErrKind::Lex(e), .. } => Some(e),
            _ => None
        }
    }
}
impl crate::err::Error for AsmErr {
    fn line(&self) -> Option<usize> {
        match self {
            AsmErr::Syntax { line, .. } | AsmErr::UnresolvedLabel { line, .. } => Some(*line),
        }
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        use crate::err::Error as _;

        let kind = match self {
            AsmErr::Syntax { kind, .. } => kind,
            AsmErr::UnresolvedLabel { .. } => return Some("try adding this label before an instruction or a DB directive".into()),
        };
        match kind {
            SyntaxErrKind::Lex(e)               => e.help(),
            SyntaxErrKind::UnknownMnemonic(_)   => Some("labels must be followed by a colon".into()),
            SyntaxErrKind::ExpectedMnemonic     => None,
            SyntaxErrKind::ExpectedOperand      => None,
            SyntaxErrKind::ExpectedImmediate    => Some("an immediate is a number or data label after '#'".into()),
            SyntaxErrKind::ExpectedBit          => Some("a bit is written as a bit address, byte.bit (e.g., 20h.3), or a flag name".into()),
            SyntaxErrKind::UnexpectedToken      => Some("operands must be separated by commas".into()),
            SyntaxErrKind::InvalidOperands(_)   => None,
            SyntaxErrKind::ReservedLabel(_)     => Some("registers, SFRs, and flags cannot be used as labels, try renaming the label".into()),
            SyntaxErrKind::InvalidBitAddress    => Some("only bytes 20h-2Fh and SFRs at addresses divisible by 8 are bit-addressable".into()),
            SyntaxErrKind::ImmOutOfRange(_)     => Some("byte immediates must be in [-128, 255]".into()),
            SyntaxErrKind::AddrOutOfRange(_)    => Some("direct addresses must be in [00h, 0FFh]".into()),
            SyntaxErrKind::DuplicateLabel(_)    => Some("labels must be unique within a program, try renaming one of the labels".into()),
            SyntaxErrKind::DataLabelAsTarget(_) => Some("jumps and calls must target a label on an instruction".into()),
            SyntaxErrKind::CodeLabelAsData(_)   => Some("MOV DPTR, #label requires a label on a DB directive".into()),
            SyntaxErrKind::RomOverflow          => Some(format!("ROM holds {ROM_SIZE} bytes, try moving the ORG or shortening the data").into()),
            SyntaxErrKind::RomOverlap(_)        => Some("try moving the ORG of one of these regions".into()),
        }
    }
}

/// The location a label refers to.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Symbol {
    /// A label on an instruction, resolved to its instruction index.
    ///
    /// A label after the last instruction resolves to the program length (the halt index).
    Code(usize),
    /// A label on a `DB` directive, resolved to its ROM address.
    Data(u16),
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
struct SymbolData {
    symbol: Symbol,
    line: usize,
}

/// The symbol table created in the first assembler pass
/// that encodes label information for the program.
///
/// Labels are case-insensitive.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct SymbolTable {
    /// A mapping from (uppercase) label to its location and the line it was defined on.
    label_map: HashMap<String, SymbolData>,
}

impl SymbolTable {
    /// Creates a new symbol table.
    ///
    /// This performs the first assembler pass, calculating the instruction index
    /// (or ROM address) of labels at each provided statement.
    ///
    /// Labels on a line of their own bind to whatever follows them:
    /// the next instruction (or the end of the program), or the next `DB` directive.
    ///
    /// ## Example
    /// ```
    /// use mcs51_sim::parse::parse_lines;
    /// use mcs51_sim::asm::{Symbol, SymbolTable};
    ///
    /// let src = ["START: MOV A, #1", "ORG 10h", "DATA:", "DB 1, 2, 3", "DONE:"];
    /// let stmts = parse_lines(&src).unwrap();
    ///
    /// let sym = SymbolTable::new(&stmts).unwrap();
    /// assert_eq!(sym.lookup_label("START"), Some(Symbol::Code(0)));
    /// assert_eq!(sym.lookup_label("data"), Some(Symbol::Data(0x10)));
    /// assert_eq!(sym.lookup_label("DONE"), Some(Symbol::Code(1)));
    /// ```
    pub fn new(stmts: &[Stmt]) -> Result<Self, AsmErr> {
        fn add_label(
            labels: &mut HashMap<String, SymbolData>,
            label: &Label,
            symbol: Symbol
        ) -> Result<(), AsmErr> {
            match labels.entry(label.name.to_uppercase()) {
                Entry::Occupied(_) => Err(AsmErr::syntax(label.line, SyntaxErrKind::DuplicateLabel(label.name.clone()))),
                Entry::Vacant(e) => {
                    e.insert(SymbolData { symbol, line: label.line });
                    Ok(())
                }
            }
        }

        let mut label_map = HashMap::new();
        // Labels waiting for the next statement with a nucleus.
        let mut pending: Vec<&Label> = vec![];
        let mut index = 0;
        let mut rom_cursor: usize = 0;

        for stmt in stmts {
            pending.extend(&stmt.labels);

            match &stmt.nucleus {
                None => continue,
                Some(StmtKind::Directive(Directive::Db(bytes))) => {
                    for label in pending.drain(..) {
                        let addr = u16::try_from(rom_cursor)
                            .map_err(|_| AsmErr::syntax(stmt.line, SyntaxErrKind::RomOverflow))?;
                        add_label(&mut label_map, label, Symbol::Data(addr))?;
                    }

                    rom_cursor += bytes.len();
                    if rom_cursor > ROM_SIZE {
                        return Err(AsmErr::syntax(stmt.line, SyntaxErrKind::RomOverflow));
                    }
                },
                Some(nucleus) => {
                    for label in pending.drain(..) {
                        add_label(&mut label_map, label, Symbol::Code(index))?;
                    }

                    match nucleus {
                        StmtKind::Instr(_) => index += 1,
                        StmtKind::Directive(Directive::Org(addr)) => rom_cursor = usize::from(*addr),
                        StmtKind::Directive(_) => {},
                    }
                }
            }
        }

        // Trailing labels point to the halt index.
        for label in pending {
            add_label(&mut label_map, label, Symbol::Code(index))?;
        }

        Ok(SymbolTable { label_map })
    }

    /// Gets the location of a given label (if it exists).
    pub fn lookup_label(&self, label: &str) -> Option<Symbol> {
        self.label_map.get(&label.to_uppercase()).map(|data| data.symbol)
    }

    /// Gets the instruction index of a given code label (if it exists and labels an instruction).
    pub fn lookup_code_label(&self, label: &str) -> Option<usize> {
        match self.lookup_label(label)? {
            Symbol::Code(index) => Some(index),
            Symbol::Data(_) => None,
        }
    }

    /// Gets the (0-indexed) source line a label was defined on.
    pub fn get_label_line(&self, label: &str) -> Option<usize> {
        self.label_map.get(&label.to_uppercase()).map(|data| data.line)
    }

    /// Gets the label which points to the given instruction index (if one exists).
    ///
    /// If multiple labels point to the index, the alphabetically first one is returned.
    pub fn rev_lookup_code_label(&self, index: usize) -> Option<&str> {
        self.label_map.iter()
            .filter(|(_, data)| data.symbol == Symbol::Code(index))
            .map(|(name, _)| &**name)
            .min()
    }

    /// Gets an iterable of the mapping from labels to locations.
    pub fn label_iter(&self) -> impl Iterator<Item=(&str, Symbol)> + '_ {
        self.label_map.iter()
            .map(|(label, data)| (&**label, data.symbol))
    }

    fn resolve(&self, label: &Label) -> Result<Symbol, AsmErr> {
        self.lookup_label(&label.name)
            .ok_or_else(|| AsmErr::UnresolvedLabel { line: label.line, label: label.name.clone() })
    }
}

impl AsmInstr {
    /// Converts an ASM instruction into a simulator instruction ([`SimInstr`])
    /// by resolving labels.
    pub fn into_sim_instr(self, sym: &SymbolTable) -> Result<SimInstr, AsmErr> {
        match self {
            AsmInstr::Plain(instr) => Ok(instr),
            AsmInstr::MovDptr(label) => match sym.resolve(&label)? {
                Symbol::Data(addr) => Ok(SimInstr::MovDptr(addr)),
                Symbol::Code(_) => Err(AsmErr::syntax(label.line, SyntaxErrKind::CodeLabelAsData(label.name))),
            },
            AsmInstr::Branch(branch, label) => match sym.resolve(&label)? {
                Symbol::Code(index) => Ok(branch.resolve(index)),
                Symbol::Data(_) => Err(AsmErr::syntax(label.line, SyntaxErrKind::DataLabelAsTarget(label.name))),
            },
        }
    }
}

/// An assembled program.
///
/// This holds the resolved instructions (which are immutable from here on),
/// the sparse ROM image written by `DB` directives, and the symbol table.
///
/// A program can be loaded into the simulator with [`crate::sim::Simulator::load_program`].
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Program {
    instrs: Vec<SimInstr>,
    /// The source line of each instruction.
    lines: Vec<usize>,
    rom: BTreeMap<u16, u8>,
    sym: SymbolTable,
}
impl Program {
    /// Creates an empty program.
    pub fn empty() -> Self {
        Default::default()
    }

    /// Creates a program directly from resolved instructions, with no ROM or labels.
    #[cfg(test)]
    pub(crate) fn from_instrs(instrs: Vec<SimInstr>) -> Self {
        let lines = (0..instrs.len()).collect();
        Program { instrs, lines, ..Default::default() }
    }

    /// Performs the second assembler pass, resolving every label.
    fn new(stmts: Vec<Stmt>, sym: SymbolTable) -> Result<Self, AsmErr> {
        let mut instrs = vec![];
        let mut lines = vec![];
        let mut rom = BTreeMap::new();
        let mut rom_cursor: u16 = 0;

        for stmt in stmts {
            match stmt.nucleus {
                Some(StmtKind::Instr(instr)) => {
                    instrs.push(instr.into_sim_instr(&sym)?);
                    lines.push(stmt.line);
                },
                Some(StmtKind::Directive(Directive::Org(addr))) => rom_cursor = addr,
                Some(StmtKind::Directive(Directive::Db(bytes))) => {
                    for byte in bytes {
                        if rom.insert(rom_cursor, byte).is_some() {
                            return Err(AsmErr::syntax(stmt.line, SyntaxErrKind::RomOverlap(rom_cursor)));
                        }
                        rom_cursor = rom_cursor.wrapping_add(1);
                    }
                },
                Some(StmtKind::Directive(Directive::End)) => break,
                None => {},
            }
        }

        Ok(Program { instrs, lines, rom, sym })
    }

    /// The resolved instructions.
    pub fn instructions(&self) -> &[SimInstr] {
        &self.instrs
    }
    /// Gets the instruction at a given index.
    pub fn get(&self, index: usize) -> Option<&SimInstr> {
        self.instrs.get(index)
    }
    /// The number of instructions (which is also the halt index).
    pub fn len(&self) -> usize {
        self.instrs.len()
    }
    /// Whether the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }
    /// The (0-indexed) source line of the instruction at a given index.
    pub fn source_line(&self, index: usize) -> Option<usize> {
        self.lines.get(index).copied()
    }
    /// The bytes written to ROM by `DB` directives, keyed by address.
    pub fn rom_image(&self) -> &BTreeMap<u16, u8> {
        &self.rom
    }
    /// The program's symbol table.
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.sym
    }

    /// Renders every instruction with its index, as a listing.
    ///
    /// ```
    /// use mcs51_sim::asm::assemble;
    ///
    /// let program = assemble(&["START: MOV A, #0Ah", "SJMP START"]).unwrap();
    /// assert_eq!(program.listing(), ["0000 START: MOV A, #0Ah", "0001 JMP 0"]);
    /// ```
    pub fn listing(&self) -> Vec<String> {
        self.instrs.iter()
            .enumerate()
            .map(|(i, instr)| match self.sym.rev_lookup_code_label(i) {
                Some(label) => format!("{i:04} {label}: {instr}"),
                None => format!("{i:04} {instr}"),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::asm::Branch;
    use crate::ast::reg_consts::R0;
    use crate::ast::sim::SimInstr;
    use crate::ast::{ByteLoc, ByteSrc};

    use super::{assemble, AsmErr, Program, Symbol, SyntaxErrKind};

    fn assemble_err(lines: &[&str]) -> AsmErr {
        match assemble(lines) {
            Ok(p) => panic!("expected assembly of {lines:?} to fail, got {p:?}"),
            Err(e) => e,
        }
    }
    fn syntax_kind(lines: &[&str]) -> (usize, SyntaxErrKind) {
        match assemble_err(lines) {
            AsmErr::Syntax { line, kind } => (line, kind),
            e => panic!("expected syntax error, got {e:?}"),
        }
    }

    #[test]
    fn test_basic() {
        let program = assemble(&["MOV R0, #5", "MOV R1, #3", "ADD R0, R1"]).unwrap();
        assert_eq!(program.len(), 3);
        assert_eq!(program.get(0), Some(&SimInstr::Mov(ByteLoc::Reg(R0), ByteSrc::Imm(5))));
        assert!(program.rom_image().is_empty());
    }

    #[test]
    fn test_label_resolution() {
        let program = assemble(&[
            "      MOV R7, #3",
            "LOOP:",
            "      DJNZ R7, LOOP",
            "      SJMP done",
            "      ; comment",
            "DONE:",
        ]).unwrap();

        assert_eq!(program.len(), 3);
        assert_eq!(program.get(1), Some(&Branch::Djnz(ByteLoc::Reg(crate::ast::reg_consts::R7)).resolve(1)));
        assert_eq!(program.get(2), Some(&SimInstr::Jmp(3)));
        assert_eq!(program.source_line(2), Some(3));
        assert_eq!(program.symbol_table().get_label_line("done"), Some(5));
    }

    #[test]
    fn test_data_labels() {
        let program = assemble(&[
            "MOV DPTR, #TABLE",
            "MOVC A, @A+DPTR",
            "ORG 20h",
            "TABLE: DB 1, 2, \"ab\"",
            "DB 0FFh",
        ]).unwrap();

        assert_eq!(program.get(0), Some(&SimInstr::MovDptr(0x20)));
        assert_eq!(program.symbol_table().lookup_label("TABLE"), Some(Symbol::Data(0x20)));
        let rom: Vec<_> = program.rom_image().iter().map(|(&a, &b)| (a, b)).collect();
        assert_eq!(rom, [(0x20, 1), (0x21, 2), (0x22, b'a'), (0x23, b'b'), (0x24, 0xFF)]);
    }

    #[test]
    fn test_unresolved_label() {
        assert_eq!(
            assemble_err(&["JMP undefined_label"]),
            AsmErr::UnresolvedLabel { line: 0, label: "undefined_label".into() }
        );
        assert_eq!(
            assemble_err(&["NOP", "MOV DPTR, #nowhere"]),
            AsmErr::UnresolvedLabel { line: 1, label: "nowhere".into() }
        );
    }

    #[test]
    fn test_label_kinds() {
        assert_eq!(
            syntax_kind(&["JMP T", "T: DB 1"]),
            (0, SyntaxErrKind::DataLabelAsTarget("T".into()))
        );
        assert_eq!(
            syntax_kind(&["L: MOV DPTR, #L"]),
            (0, SyntaxErrKind::CodeLabelAsData("L".into()))
        );
        assert_eq!(
            syntax_kind(&["L: NOP", "l: NOP"]),
            (1, SyntaxErrKind::DuplicateLabel("l".into()))
        );
    }

    #[test]
    fn test_rom_errors() {
        assert_eq!(syntax_kind(&["ORG 0FFh", "DB 1, 2"]), (1, SyntaxErrKind::RomOverflow));
        assert_eq!(syntax_kind(&["DB 1, 2", "ORG 1", "DB 3"]), (2, SyntaxErrKind::RomOverlap(1)));

        let program = assemble(&["ORG 0FFh", "DB 1"]).unwrap();
        assert_eq!(program.rom_image().get(&0xFF), Some(&1));
    }

    #[test]
    fn test_end_and_empty() {
        let program = assemble(&["NOP", "END", "garbage here"]).unwrap();
        assert_eq!(program.len(), 1);

        let program = assemble::<&str>(&[]).unwrap();
        assert_eq!(program, Program::empty());
        assert!(program.is_empty());
    }

    #[test]
    fn test_listing() {
        let program = assemble(&["CLR C", "L: CJNE A, #3, L", "RET"]).unwrap();
        assert_eq!(program.listing(), ["0000 CLR C", "0001 L: CJNE A, #3h, 1", "0002 RET"]);
    }
}
