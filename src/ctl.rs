//! The controller, which drives the assembler and simulator together.
//!
//! A [`Controller`] owns exactly one [`Simulator`] (and through it, the loaded program).
//! Each operation runs to completion and returns a [`FullState`] snapshot of the machine,
//! so a transport layer only has to marshal these results.
//!
//! ```
//! use mcs51_sim::ctl::Controller;
//!
//! let mut ctl = Controller::new();
//! let state = ctl.assemble(&["MOV R0, #5", "MOV R1, #3", "ADD R0, R1"], None).unwrap();
//! assert!(state.ready);
//! assert_eq!(state.index, 0);
//!
//! let state = ctl.run().unwrap();
//! assert_eq!(state.general_purpose_registers[0][0], 8);
//! assert_eq!(state.index, 3);
//! ```
//!
//! There is no global controller; each session should own its own instance.

pub mod snapshot;

use log::{debug, warn};

use crate::asm::{assemble, AsmErr};
use crate::ast::PswFlag;
use crate::err::Error as _;
use crate::sim::{SimErr, SimFlags, Simulator};

pub use self::snapshot::FullState;

/// Errors from controller operations.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum CtlErr {
    /// A program was run before one was successfully assembled.
    NotReady,
    /// Source failed to assemble.
    Asm(AsmErr),
    /// Execution (or a memory edit) failed.
    Sim(SimErr),
    /// A flag preset named an unknown or read-only flag, or was malformed.
    InvalidFlag(String),
}
impl std::fmt::Display for CtlErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CtlErr::NotReady        => f.write_str("no program is loaded"),
            CtlErr::Asm(e)          => std::fmt::Display::fmt(e, f),
            CtlErr::Sim(e)          => std::fmt::Display::fmt(e, f),
            CtlErr::InvalidFlag(n)  => write!(f, "invalid flag preset '{n}'"),
        }
    }
}
impl std::error::Error for CtlErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CtlErr::Asm(e) => Some(e),
            CtlErr::Sim(e) => Some(e),
            _ => None
        }
    }
}
impl crate::err::Error for CtlErr {
    fn line(&self) -> Option<usize> {
        match self {
            CtlErr::Asm(e) => e.line(),
            _ => None
        }
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            CtlErr::NotReady       => Some("assemble a program first".into()),
            CtlErr::Asm(e)         => e.help(),
            CtlErr::Sim(e)         => e.help(),
            CtlErr::InvalidFlag(_) => Some("presets are written NAME=VALUE, where NAME is one of CY, AC, F0, RS1, RS0, OV, F1".into()),
        }
    }
}
impl From<AsmErr> for CtlErr {
    fn from(value: AsmErr) -> Self {
        CtlErr::Asm(value)
    }
}
impl From<SimErr> for CtlErr {
    fn from(value: SimErr) -> Self {
        CtlErr::Sim(value)
    }
}

/// PSW flag values to apply when a program is assembled.
///
/// Presets are kept in insertion order and applied in that order.
/// Any non-zero value sets the flag.
///
/// ```
/// use mcs51_sim::ctl::FlagPresets;
///
/// let presets: FlagPresets = ["CY=1", "RS0=1"].into_iter()
///     .map(FlagPresets::parse_assignment)
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(presets.len(), 2);
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct FlagPresets(Vec<(String, u32)>);

impl FlagPresets {
    /// Creates an empty set of presets.
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a preset.
    ///
    /// The name is not checked until the presets are applied.
    pub fn insert(&mut self, name: impl Into<String>, value: u32) {
        self.0.push((name.into(), value));
    }

    /// The number of presets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no presets.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses a preset written as `NAME=VALUE` (e.g., `CY=1`).
    ///
    /// The value may be decimal, or hex with a `0x` prefix.
    pub fn parse_assignment(s: &str) -> Result<(String, u32), CtlErr> {
        let invalid = || CtlErr::InvalidFlag(s.to_string());

        let (name, value) = s.split_once('=').ok_or_else(invalid)?;
        let value = value.trim();
        let value = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => value.parse(),
        }.map_err(|_| invalid())?;

        Ok((name.trim().to_string(), value))
    }

    /// Looks up the flag a preset name refers to.
    ///
    /// This accepts the aliases `C` (for `CY`) and `UD` (for `F1`).
    /// The parity flag is derived from the accumulator, so it cannot be preset.
    fn lookup(name: &str) -> Result<PswFlag, CtlErr> {
        let flag = match &*name.to_ascii_uppercase() {
            "C"  => Some(PswFlag::CY),
            "UD" => Some(PswFlag::F1),
            upper => PswFlag::from_name(upper),
        };

        match flag {
            Some(PswFlag::P) | None => Err(CtlErr::InvalidFlag(name.to_string())),
            Some(flag) => Ok(flag),
        }
    }

    /// Validates every preset, producing the flag states to apply.
    fn resolve(&self) -> Result<Vec<(PswFlag, bool)>, CtlErr> {
        self.0.iter()
            .map(|(name, value)| Ok((Self::lookup(name)?, *value != 0)))
            .collect()
    }
}
impl<S: Into<String>> FromIterator<(S, u32)> for FlagPresets {
    fn from_iter<T: IntoIterator<Item = (S, u32)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(n, v)| (n.into(), v)).collect())
    }
}

/// The orchestrator for one simulator session.
///
/// This owns the simulator (and the loaded program),
/// and is the only thing that mutates it during an operation.
#[derive(Debug, Default)]
pub struct Controller {
    sim: Simulator,
}
impl Controller where Controller: Send + Sync {}

impl Controller {
    /// Creates a controller with the default simulator flags.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a controller with the given simulator flags.
    pub fn with_flags(flags: SimFlags) -> Self {
        Self { sim: Simulator::new(flags) }
    }

    /// The simulator flags (such as the iteration cap), which are preserved across resets.
    pub fn flags_mut(&mut self) -> &mut SimFlags {
        &mut self.sim.flags
    }

    /// The underlying simulator.
    pub fn simulator(&self) -> &Simulator {
        &self.sim
    }

    /// The underlying simulator, mutably (e.g., to edit breakpoints).
    pub fn simulator_mut(&mut self) -> &mut Simulator {
        &mut self.sim
    }

    /// Whether a program has been successfully assembled and loaded.
    pub fn is_ready(&self) -> bool {
        self.sim.program().is_some()
    }

    /// The index of the next instruction to execute.
    pub fn run_index(&self) -> usize {
        self.sim.run_index()
    }

    /// A snapshot of the full machine state.
    pub fn state(&self) -> FullState {
        FullState::capture(&self.sim)
    }

    /// Zeroes all memory and registers and unloads the program.
    pub fn reset(&mut self) -> FullState {
        self.sim.reset();
        self.state()
    }

    /// Assembles source lines and loads the resulting program.
    ///
    /// If presets are provided, they are applied to the PSW once the program is loaded.
    ///
    /// This is all-or-nothing: if the presets are invalid or the source fails to assemble,
    /// the previously loaded program, the run index, and the machine state are left untouched.
    pub fn assemble<S: AsRef<str>>(&mut self, lines: &[S], presets: Option<&FlagPresets>) -> Result<FullState, CtlErr> {
        let result = self.try_assemble(lines, presets);
        if let Err(e) = &result {
            warn!("assemble failed: {e}");
        }
        result
    }

    fn try_assemble<S: AsRef<str>>(&mut self, lines: &[S], presets: Option<&FlagPresets>) -> Result<FullState, CtlErr> {
        let presets = match presets {
            Some(p) => p.resolve()?,
            None => vec![],
        };
        let program = assemble(lines)?;
        let (n_instrs, n_labels) = (program.len(), program.symbol_table().label_iter().count());

        self.sim.load_program(program)?;
        self.sim.update_psw(|psw| {
            for (flag, value) in presets {
                psw.set_flag(flag, value);
            }
        });

        debug!("assembled {n_instrs} instructions ({n_labels} labels)");
        Ok(self.state())
    }

    fn ensure_ready(&self) -> Result<(), CtlErr> {
        match self.is_ready() {
            true  => Ok(()),
            false => Err(CtlErr::NotReady),
        }
    }

    /// Executes one instruction.
    ///
    /// If the program has already halted, this does nothing.
    pub fn run_once(&mut self) -> Result<FullState, CtlErr> {
        self.ensure_ready()?;
        self.sim.step_in()?;
        Ok(self.state())
    }

    /// Executes until the program halts (or a breakpoint is hit).
    ///
    /// If the iteration cap is exceeded, this fails with [`SimErr::ExecutionTimeout`],
    /// and the state reached so far is still available through [`Controller::state`].
    pub fn run(&mut self) -> Result<FullState, CtlErr> {
        self.ensure_ready()?;
        self.sim.run()?;
        Ok(self.state())
    }

    /// Executes one instruction, running any subroutine it calls to completion.
    pub fn step_over(&mut self) -> Result<FullState, CtlErr> {
        self.ensure_ready()?;
        self.sim.step_over()?;
        Ok(self.state())
    }

    /// Executes until the current subroutine returns.
    pub fn step_out(&mut self) -> Result<FullState, CtlErr> {
        self.ensure_ready()?;
        self.sim.step_out()?;
        Ok(self.state())
    }

    /// Reads a byte of internal RAM.
    pub fn read_memory(&self, addr: u16) -> Result<u8, CtlErr> {
        Ok(self.sim.read_memory(addr)?)
    }

    /// Writes a byte of internal RAM (wrapping the value to a byte).
    ///
    /// This works whether or not a program is loaded.
    pub fn write_memory(&mut self, addr: u16, value: u32) -> Result<FullState, CtlErr> {
        self.sim.write_memory(addr, value)?;
        debug!("wrote {:#04X} to ram[{addr:#04X}]", value as u8);
        Ok(self.state())
    }

    /// Writes several bytes of internal RAM.
    ///
    /// Every address is checked before any is written,
    /// so if one is out of range, memory is left untouched.
    pub fn write_memory_many(&mut self, writes: &[(u16, u32)]) -> Result<FullState, CtlErr> {
        if let Some(&(addr, _)) = writes.iter().find(|&&(addr, _)| self.sim.read_memory(addr).is_err()) {
            return Err(SimErr::InvalidAddress(usize::from(addr)).into());
        }
        for &(addr, value) in writes {
            self.sim.write_memory(addr, value)?;
        }
        debug!("wrote {} bytes to ram", writes.len());
        Ok(self.state())
    }
}

#[cfg(test)]
mod tests {
    use crate::asm::{AsmErr, SyntaxErrKind};
    use crate::ast::PswFlag;
    use crate::sim::{SimErr, SimFlags};

    use super::{Controller, CtlErr, FlagPresets};

    #[test]
    fn test_not_ready() {
        let mut ctl = Controller::new();
        assert_eq!(ctl.run(), Err(CtlErr::NotReady));
        assert_eq!(ctl.run_once(), Err(CtlErr::NotReady));
        assert_eq!(ctl.step_over(), Err(CtlErr::NotReady));
        assert_eq!(ctl.step_out(), Err(CtlErr::NotReady));

        // memory edits don't need a program
        let state = ctl.write_memory(0x30, 0x1FF).unwrap();
        assert_eq!(state.ram[3][0], (0x30, 0xFF));
        assert!(!state.ready);
    }

    #[test]
    fn test_assemble_all_or_nothing() {
        let mut ctl = Controller::new();
        ctl.assemble(&["MOV A, #1", "NOP"], None).unwrap();
        ctl.run_once().unwrap();
        let before = ctl.state();

        let err = ctl.assemble(&["MOV A, #2", "FOO A"], None).unwrap_err();
        assert_eq!(err, CtlErr::Asm(AsmErr::Syntax { line: 1, kind: SyntaxErrKind::UnknownMnemonic("FOO".into()) }));
        assert_eq!(ctl.state(), before);

        let presets = FlagPresets::from_iter([("P", 1)]);
        assert_eq!(ctl.assemble(&["NOP"], Some(&presets)), Err(CtlErr::InvalidFlag("P".into())));
        assert_eq!(ctl.state(), before);
    }

    #[test]
    fn test_presets() {
        let mut ctl = Controller::new();
        let presets = FlagPresets::from_iter([("C", 1), ("rs0", 5), ("UD", 1), ("RS1", 0)]);
        ctl.assemble(&["MOV R0, #9"], Some(&presets)).unwrap();

        let psw = ctl.simulator().psw();
        assert!(psw.cy() && psw.flag(PswFlag::F1));
        assert_eq!(psw.rs(), 1);

        ctl.run().unwrap();
        assert_eq!(ctl.simulator().reg_file.read(1, crate::ast::reg_consts::R0), Ok(9));

        let presets = FlagPresets::from_iter([("XY", 1)]);
        assert_eq!(ctl.assemble(&["NOP"], Some(&presets)), Err(CtlErr::InvalidFlag("XY".into())));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(FlagPresets::parse_assignment("CY=1"), Ok(("CY".into(), 1)));
        assert_eq!(FlagPresets::parse_assignment(" OV = 0x10 "), Ok(("OV".into(), 16)));
        assert_eq!(FlagPresets::parse_assignment("CY"), Err(CtlErr::InvalidFlag("CY".into())));
        assert_eq!(FlagPresets::parse_assignment("CY=x"), Err(CtlErr::InvalidFlag("CY=x".into())));
    }

    #[test]
    fn test_write_memory_many() {
        let mut ctl = Controller::new();
        let err = ctl.write_memory_many(&[(0x10, 1), (0x100, 2)]).unwrap_err();
        assert_eq!(err, CtlErr::Sim(SimErr::InvalidAddress(0x100)));
        assert_eq!(ctl.read_memory(0x10), Ok(0));

        ctl.write_memory_many(&[(0x10, 1), (0xFF, 258)]).unwrap();
        assert_eq!(ctl.read_memory(0x10), Ok(1));
        assert_eq!(ctl.read_memory(0xFF), Ok(2));
    }

    #[test]
    fn test_timeout_keeps_state() {
        let mut ctl = Controller::with_flags(SimFlags { max_steps: 10 });
        ctl.assemble(&["L: INC A", "SJMP L"], None).unwrap();
        assert_eq!(ctl.run(), Err(CtlErr::Sim(SimErr::ExecutionTimeout { limit: 10 })));
        assert_eq!(ctl.simulator().acc(), 5);

        ctl.flags_mut().max_steps = 20;
        ctl.reset();
        assert_eq!(ctl.simulator().flags.max_steps, 20);
        assert!(!ctl.is_ready());
    }
}
