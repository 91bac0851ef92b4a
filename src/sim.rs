//! Simulating and execution for 8051 assembly.
//!
//! This module is focused on executing fully assembled code (i.e., [`Program`]).
//!
//! This module consists of:
//! - [`Simulator`]: The struct that simulates assembled code.
//! - [`mem`]: The module handling internal RAM, ROM, and the register banks.
//! - [`debug`]: The module handling types of breakpoints for the simulator.
//!
//! # Usage
//!
//! To simulate some code, you need to instantiate a Simulator and load a program into it:
//!
//! ```
//! use mcs51_sim::asm::assemble;
//! use mcs51_sim::sim::Simulator;
//!
//! let program = assemble(&["MOV A, #1", "ADD A, #2"]).unwrap();
//!
//! let mut simulator = Simulator::new(Default::default());
//! simulator.load_program(program).unwrap();
//! simulator.run().unwrap();
//! assert_eq!(simulator.acc(), 3);
//! ```
//!
//! ## Flags
//!
//! Here, we define `simulator` to have the default flags.
//! We could also configure the simulator by editing the flags. For example,
//! if we wish to lower the iteration cap of [`Simulator::run`], we can edit the flags like so:
//!
//! ```
//! # use mcs51_sim::sim::{Simulator, SimFlags};
//! let mut simulator = Simulator::new(SimFlags { max_steps: 500 });
//! ```
//!
//! All of the available flags can be found in [`SimFlags`].
//!
//! ## Execution
//!
//! Beyond the basic [`Simulator::run`] (which runs until halting),
//! there are also:
//! - [`Simulator::step_in`], [`Simulator::step_out`], [`Simulator::step_over`]: manual step-by-step simulation
//! - [`Simulator::run_while`], [`Simulator::run_with_limit`]: more advanced programmatic execution
//!
//! ```
//! use mcs51_sim::asm::assemble;
//! use mcs51_sim::sim::Simulator;
//! use mcs51_sim::ast::reg_consts::R0;
//!
//! let program = assemble(&["MOV R0, #0", "INC R0", "INC R0"]).unwrap();
//!
//! let mut sim = Simulator::new(Default::default());
//! sim.load_program(program).unwrap();
//!
//! // Running step by step:
//! sim.step_in().unwrap();
//! assert_eq!(sim.read_reg(R0).unwrap(), 0);
//! sim.step_in().unwrap();
//! assert_eq!(sim.read_reg(R0).unwrap(), 1);
//! sim.step_in().unwrap();
//! assert_eq!(sim.read_reg(R0).unwrap(), 2);
//!
//! // The program is over, so stepping does nothing:
//! assert!(sim.is_halted());
//! sim.step_in().unwrap();
//! assert_eq!(sim.read_reg(R0).unwrap(), 2);
//! ```
//!
//! ## Querying State
//!
//! - The run index (the position of the next instruction) is accessible through [`Simulator::run_index`].
//! - The PSW is accessible through [`Simulator::psw`]. Its parity bit is always computed from the accumulator.
//! - The register file is accessible through the `reg_file` field,
//!   or through [`Simulator::read_reg`] for the active bank.
//! - Internal RAM (including the SFR window) is accessible through [`Simulator::ram`],
//!   [`Simulator::read_direct`], and [`Simulator::write_memory`].
//!
//! ## Debugging with breakpoints
//!
//! Breakpoints are accessible through the `breakpoints` field on [`Simulator`].
//!
//! To add a `breakpoint`, simply insert a [`Breakpoint`] and
//! it will break if its condition is met during all execution functions (except [`Simulator::step_in`]).
//!
//! ```
//! use mcs51_sim::asm::assemble;
//! use mcs51_sim::sim::Simulator;
//! use mcs51_sim::sim::debug::Breakpoint;
//!
//! let program = assemble(&["NOP", "NOP", "NOP", "NOP"]).unwrap();
//!
//! let mut sim = Simulator::new(Default::default());
//! sim.load_program(program.clone()).unwrap();
//!
//! // Without breakpoint
//! sim.run().unwrap();
//! assert_eq!(sim.run_index(), 4);
//!
//! // With breakpoint
//! sim.reset();
//! sim.load_program(program).unwrap();
//! sim.breakpoints.insert(Breakpoint::Index(2));
//! sim.run().unwrap();
//! assert_eq!(sim.run_index(), 2);
//! ```

pub mod mem;
pub mod debug;

use std::collections::HashSet;

use log::{debug, info, trace, warn};

use crate::asm::Program;
use crate::ast::sim::SimInstr;
use crate::ast::{bit_location, sfr, BitLoc, ByteLoc, ByteSrc, PswFlag, Reg};

use self::debug::Breakpoint;
use self::mem::{MemErr, MemoryBank, RegisterFile, RAM_SIZE, ROM_SIZE};

/// Errors that can occur during simulation.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SimErr {
    /// A memory address or instruction index was outside of its address space.
    InvalidAddress(usize),
    /// A register name or bank was invalid.
    InvalidRegister(String),
    /// An instruction which cannot be executed reached the simulator.
    ///
    /// The assembler never produces these, so this indicates a bug.
    InvalidOpcode(SimInstr),
    /// The program did not halt within the iteration cap.
    ExecutionTimeout {
        /// The iteration cap.
        limit: u64
    },
}
impl std::fmt::Display for SimErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimErr::InvalidAddress(addr)        => write!(f, "invalid address {addr:#X}"),
            SimErr::InvalidRegister(name)       => write!(f, "invalid register {name}"),
            SimErr::InvalidOpcode(instr)        => write!(f, "simulator executed invalid instruction '{instr}'"),
            SimErr::ExecutionTimeout { limit }  => write!(f, "program did not halt within {limit} steps"),
        }
    }
}
impl std::error::Error for SimErr {}
impl crate::err::Error for SimErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            SimErr::InvalidAddress(_)     => Some(format!("internal RAM and ROM addresses range over [0, {:#X}]", RAM_SIZE.max(ROM_SIZE) - 1).into()),
            SimErr::InvalidRegister(_)    => Some("registers are named R0-R7".into()),
            SimErr::InvalidOpcode(_)      => Some("this is a bug, please report it".into()),
            SimErr::ExecutionTimeout { .. } => Some("check the program for infinite loops, or raise the iteration cap".into()),
        }
    }
}
impl From<MemErr> for SimErr {
    fn from(value: MemErr) -> Self {
        match value {
            MemErr::OutOfRange { addr, .. } => SimErr::InvalidAddress(usize::from(addr)),
            MemErr::InvalidRegister(name) => SimErr::InvalidRegister(name),
            MemErr::InvalidBank(bank) => SimErr::InvalidRegister(format!("bank {bank}")),
        }
    }
}

/// Reason for why execution paused if it wasn't due to an error.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum PauseCondition {
    /// Program reached the end of its instructions.
    Halt,
    /// Program hit a breakpoint.
    Breakpoint,
    /// Program hit a tripwire condition.
    Tripwire,
    /// Program hit an error and did not pause successfully.
    #[default]
    Unsuccessful
}

/// The execution state of the simulator.
///
/// This is derived from whether a program is loaded and where the run index is.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum EngineState {
    /// No program is loaded.
    Idle,
    /// A program is loaded and no instruction has run yet (the run index is 0).
    Ready,
    /// A program is loaded and partway through execution.
    Running,
    /// The run index is at (or past) the end of the program.
    Halted,
}

/// Configuration flags for [`Simulator`].
///
/// These can be modified after the `Simulator` is created with [`Simulator::new`]
/// and their effects should still apply.
///
/// Read the field descriptions for more details.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SimFlags {
    /// The iteration cap for [`Simulator::run`], [`Simulator::step_over`], and [`Simulator::step_out`].
    ///
    /// If a program executes this many instructions without halting,
    /// those functions fail with [`SimErr::ExecutionTimeout`].
    ///
    /// By default, this flag is `100_000`.
    pub max_steps: u64
}
impl Default for SimFlags {
    fn default() -> Self {
        Self {
            max_steps: 100_000
        }
    }
}

/// Executes assembled programs.
pub struct Simulator {
    // ------------------ SIMULATION STATE ------------------
    // Calling [`Simulator::reset`] resets these values.

    /// Internal RAM: general RAM at `00h`-`7Fh`, SFRs at `80h`-`FFh`.
    ///
    /// This always holds [`RAM_SIZE`] bytes, so any `u8` address is in range.
    ram: MemoryBank,

    /// The simulator's register file.
    pub reg_file: RegisterFile,

    /// ROM, written from the program's `DB` directives.
    rom: MemoryBank,

    /// The loaded program.
    program: Option<Program>,

    /// The index of the next instruction to execute.
    run_index: usize,

    /// The number of subroutine calls that have not returned.
    call_depth: usize,

    /// The number of instructions successfully run since this `Simulator` was initialized.
    ///
    /// This can be set to 0 to reset the counter.
    pub instructions_run: u64,

    /// Indicates the reason why the last execution (via [`Simulator::run_while`] and adjacent)
    /// had paused.
    pause_condition: PauseCondition,

    // ------------------ CONFIG/DEBUG STATE ------------------
    // Calling [`Simulator::reset`] does not reset these values.

    /// Configuration settings for the simulator.
    ///
    /// These are preserved between resets.
    ///
    /// See [`SimFlags`] for more details on what configuration
    /// settings are available.
    pub flags: SimFlags,

    /// Breakpoints for the simulator.
    pub breakpoints: HashSet<Breakpoint>,
}
impl Simulator where Simulator: Send + Sync {}

impl Simulator {
    /// Creates a new simulator with the provided flags.
    ///
    /// All memory and registers start zeroed, and no program is loaded.
    pub fn new(flags: SimFlags) -> Self {
        Self {
            ram: MemoryBank::new(RAM_SIZE),
            reg_file: RegisterFile::new(),
            rom: MemoryBank::new(ROM_SIZE),
            program: None,
            run_index: 0,
            call_depth: 0,
            instructions_run: 0,
            pause_condition: Default::default(),
            flags,
            breakpoints: Default::default(),
        }
    }

    /// Resets the simulator.
    ///
    /// This zeroes RAM, ROM, and the register file, and unloads the program.
    /// Flags and breakpoints are kept.
    pub fn reset(&mut self) {
        self.ram.clear();
        self.reg_file.clear();
        self.rom.clear();
        self.program = None;
        self.run_index = 0;
        self.call_depth = 0;
        self.instructions_run = 0;
        self.pause_condition = Default::default();
        debug!("simulator reset");
    }

    /// Loads a program into the simulator.
    ///
    /// This replaces any previously loaded program, writes the program's data into ROM,
    /// and moves the run index to the start.
    /// Internal RAM and the register file are left untouched.
    pub fn load_program(&mut self, program: Program) -> Result<(), SimErr> {
        self.rom = MemoryBank::fill_from(program.rom_image(), ROM_SIZE)?;
        self.program = Some(program);
        self.run_index = 0;
        self.call_depth = 0;
        self.pause_condition = Default::default();
        Ok(())
    }

    /// The loaded program (if one is loaded).
    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// The index of the next instruction to execute.
    pub fn run_index(&self) -> usize {
        self.run_index
    }

    /// The number of subroutine calls that have not yet returned.
    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    /// The execution state of the simulator.
    pub fn state(&self) -> EngineState {
        match &self.program {
            None => EngineState::Idle,
            Some(p) if self.run_index >= p.len() => EngineState::Halted,
            Some(_) if self.run_index == 0 => EngineState::Ready,
            Some(_) => EngineState::Running,
        }
    }

    /// Whether there is no instruction left to execute.
    ///
    /// This is also true if no program is loaded.
    pub fn is_halted(&self) -> bool {
        matches!(self.state(), EngineState::Idle | EngineState::Halted)
    }

    /// Whether the last execution paused on a breakpoint.
    pub fn hit_breakpoint(&self) -> bool {
        self.pause_condition == PauseCondition::Breakpoint
    }

    /// Gets the reason for why the last execution paused.
    pub fn pause_condition(&self) -> PauseCondition {
        self.pause_condition
    }

    /// Internal RAM (general RAM and the SFR window), as stored.
    pub fn ram(&self) -> &MemoryBank {
        &self.ram
    }

    /// ROM.
    pub fn rom(&self) -> &MemoryBank {
        &self.rom
    }

    /// Reads a byte of internal RAM, as stored.
    ///
    /// Unlike [`Simulator::read_direct`], this returns the stored PSW byte
    /// rather than computing its parity bit.
    pub fn read_memory(&self, addr: u16) -> Result<u8, SimErr> {
        Ok(self.ram.read(addr)?)
    }

    /// Writes a byte of internal RAM.
    ///
    /// The value is wrapped to a byte. This fails if the address is outside of internal RAM.
    pub fn write_memory(&mut self, addr: u16, value: u32) -> Result<(), SimErr> {
        Ok(self.ram.write(addr, value)?)
    }

    fn raw(&self, addr: u8) -> u8 {
        self.ram.as_slice()[usize::from(addr)]
    }
    fn set_raw(&mut self, addr: u8, value: u8) {
        self.ram.as_mut_slice()[usize::from(addr)] = value;
    }

    /// Reads a directly addressed byte of internal RAM (or an SFR).
    ///
    /// Reading the PSW computes its parity bit from the accumulator.
    pub fn read_direct(&self, addr: u8) -> u8 {
        match addr {
            sfr::PSW => self.psw().get(),
            _ => self.raw(addr),
        }
    }

    /// Writes a directly addressed byte of internal RAM (or an SFR).
    pub fn write_direct(&mut self, addr: u8, value: u8) {
        self.set_raw(addr, value);
    }

    /// The accumulator.
    pub fn acc(&self) -> u8 {
        self.raw(sfr::ACC)
    }
    fn set_acc(&mut self, value: u8) {
        self.set_raw(sfr::ACC, value);
    }
    /// The B register.
    pub fn b(&self) -> u8 {
        self.raw(sfr::B)
    }
    /// The stack pointer.
    pub fn sp(&self) -> u8 {
        self.raw(sfr::SP)
    }
    /// The data pointer (`DPH:DPL`).
    pub fn dptr(&self) -> u16 {
        u16::from_be_bytes([self.raw(sfr::DPH), self.raw(sfr::DPL)])
    }
    fn set_dptr(&mut self, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.set_raw(sfr::DPH, hi);
        self.set_raw(sfr::DPL, lo);
    }

    /// The program status word.
    ///
    /// The parity bit is always computed from the current accumulator.
    pub fn psw(&self) -> Psw {
        Psw(self.raw(sfr::PSW)).with_parity(self.acc())
    }
    /// Edits the program status word.
    ///
    /// Any change to the parity bit is ignored, as parity is derived from the accumulator.
    pub fn update_psw(&mut self, f: impl FnOnce(&mut Psw)) {
        let mut psw = Psw(self.raw(sfr::PSW));
        f(&mut psw);
        self.set_raw(sfr::PSW, psw.get());
    }
    fn set_flag(&mut self, flag: PswFlag, value: bool) {
        self.update_psw(|psw| psw.set_flag(flag, value));
    }
    fn carry(&self) -> bool {
        self.psw().cy()
    }

    /// The index of the active register bank (from the PSW's `RS1:RS0` bits).
    pub fn active_bank(&self) -> u8 {
        self.psw().rs()
    }

    /// Reads a register of the active bank.
    pub fn read_reg(&self, reg: Reg) -> Result<u8, SimErr> {
        Ok(self.reg_file.read(self.active_bank(), reg)?)
    }
    /// Writes a register of the active bank.
    pub fn write_reg(&mut self, reg: Reg, value: u8) -> Result<(), SimErr> {
        Ok(self.reg_file.write(self.active_bank(), reg, value)?)
    }

    fn indirect_addr(&self, reg: Reg, instr: SimInstr) -> Result<u8, SimErr> {
        match reg.reg_no() {
            0 | 1 => self.read_reg(reg),
            _ => Err(SimErr::InvalidOpcode(instr)),
        }
    }
    fn read_loc(&self, loc: ByteLoc, instr: SimInstr) -> Result<u8, SimErr> {
        match loc {
            ByteLoc::Acc => Ok(self.acc()),
            ByteLoc::Reg(r) => self.read_reg(r),
            ByteLoc::Direct(addr) => Ok(self.read_direct(addr)),
            ByteLoc::Indirect(r) => Ok(self.read_direct(self.indirect_addr(r, instr)?)),
        }
    }
    fn write_loc(&mut self, loc: ByteLoc, value: u8, instr: SimInstr) -> Result<(), SimErr> {
        match loc {
            ByteLoc::Acc => self.set_acc(value),
            ByteLoc::Reg(r) => self.write_reg(r, value)?,
            ByteLoc::Direct(addr) => self.write_direct(addr, value),
            ByteLoc::Indirect(r) => {
                let addr = self.indirect_addr(r, instr)?;
                self.write_direct(addr, value);
            },
        }
        Ok(())
    }
    fn read_src(&self, src: ByteSrc, instr: SimInstr) -> Result<u8, SimErr> {
        match src {
            ByteSrc::Loc(loc) => self.read_loc(loc, instr),
            ByteSrc::Imm(value) => Ok(value),
        }
    }

    /// Reads a bit from the bit-addressable space.
    pub fn read_bit(&self, bit: u8) -> bool {
        let (byte, idx) = bit_location(bit);
        (self.read_direct(byte) >> idx) & 1 != 0
    }
    /// Writes a bit in the bit-addressable space.
    pub fn write_bit(&mut self, bit: u8, value: bool) {
        let (byte, idx) = bit_location(bit);
        let data = self.raw(byte);
        let data = match value {
            true  => data | (1 << idx),
            false => data & !(1 << idx),
        };
        self.write_direct(byte, data);
    }
    fn read_bit_loc(&self, loc: BitLoc) -> bool {
        match loc {
            BitLoc::Carry => self.carry(),
            BitLoc::Addr(bit) => self.read_bit(bit),
        }
    }
    fn write_bit_loc(&mut self, loc: BitLoc, value: bool) {
        match loc {
            BitLoc::Carry => self.set_flag(PswFlag::CY, value),
            BitLoc::Addr(bit) => self.write_bit(bit, value),
        }
    }

    fn push(&mut self, value: u8) {
        let sp = self.sp().wrapping_add(1);
        self.set_raw(sfr::SP, sp);
        self.set_raw(sp, value);
    }
    fn pop(&mut self) -> u8 {
        let sp = self.sp();
        let value = self.raw(sp);
        self.set_raw(sfr::SP, sp.wrapping_sub(1));
        value
    }

    /// Computes `a + b + carry_in`, setting CY, AC, and OV.
    fn add_with_flags(&mut self, a: u8, b: u8, carry_in: bool) -> u8 {
        let c = u8::from(carry_in);
        let sum = u16::from(a) + u16::from(b) + u16::from(c);

        let cy = sum > 0xFF;
        let ac = (a & 0x0F) + (b & 0x0F) + c > 0x0F;
        let c6 = (a & 0x7F) + (b & 0x7F) + c > 0x7F;
        self.update_psw(|psw| {
            psw.set_flag(PswFlag::CY, cy);
            psw.set_flag(PswFlag::AC, ac);
            psw.set_flag(PswFlag::OV, c6 != cy);
        });

        sum as u8
    }
    /// Computes `a - b - borrow_in`, setting CY, AC, and OV.
    fn sub_with_flags(&mut self, a: u8, b: u8, borrow_in: bool) -> u8 {
        let c = u8::from(borrow_in);

        let cy = u16::from(b) + u16::from(c) > u16::from(a);
        let ac = (b & 0x0F) + c > (a & 0x0F);
        let b6 = (b & 0x7F) + c > (a & 0x7F);
        self.update_psw(|psw| {
            psw.set_flag(PswFlag::CY, cy);
            psw.set_flag(PswFlag::AC, ac);
            psw.set_flag(PswFlag::OV, b6 != cy);
        });

        a.wrapping_sub(b).wrapping_sub(c)
    }

    fn program_len(&self) -> usize {
        self.program.as_ref().map_or(0, Program::len)
    }
    fn check_target(&self, target: usize) -> Result<usize, SimErr> {
        match target <= self.program_len() {
            true  => Ok(target),
            false => Err(SimErr::InvalidAddress(target)),
        }
    }

    /// Runs until the tripwire condition returns false (or any of the typical breaks occur).
    ///
    /// The typical break conditions are:
    /// - the program halts
    /// - A breakpoint matches
    pub fn run_while(&mut self, mut tripwire: impl FnMut(&Simulator) -> bool) -> Result<(), SimErr> {
        std::mem::take(&mut self.pause_condition);
        let start = self.instructions_run;

        // event loop
        // run until:
        // 1. the program halts
        // 2. the tripwire condition returns false
        // 3. any of the breakpoints are hit
        let result = loop {
            if self.is_halted() {
                break Ok(PauseCondition::Halt);
            }
            if !tripwire(self) {
                break Ok(PauseCondition::Tripwire);
            }

            // Run a step:
            if let Err(e) = self.step() {
                break Err(e);
            }

            // After executing, check that any breakpoints were hit.
            if self.breakpoints.iter().any(|bp| bp.check(self)) {
                break Ok(PauseCondition::Breakpoint);
            }
        };

        self.pause_condition = result?;
        info!(
            "paused ({:?}) at index {} after {} steps",
            self.pause_condition, self.run_index, self.instructions_run.wrapping_sub(start)
        );
        Ok(())
    }

    /// Runs while the condition holds, failing if the iteration cap is exceeded.
    fn run_capped(&mut self, mut cond: impl FnMut(&Simulator) -> bool) -> Result<(), SimErr> {
        let limit = self.flags.max_steps;
        let start = self.instructions_run;
        let mut timed_out = false;

        self.run_while(|sim| {
            if !cond(sim) { return false; }
            timed_out = sim.instructions_run.wrapping_sub(start) >= limit;
            !timed_out
        })?;

        match timed_out {
            true => {
                warn!("execution exceeded the iteration cap of {limit} steps (paused at index {})", self.run_index);
                Err(SimErr::ExecutionTimeout { limit })
            },
            false => Ok(())
        }
    }

    /// Execute the program.
    ///
    /// This blocks until the program halts or a breakpoint is hit.
    /// If the program executes [`SimFlags::max_steps`] instructions without halting,
    /// this fails with [`SimErr::ExecutionTimeout`] (keeping the state reached so far).
    ///
    /// If you would like to stop quietly after a number of steps, consider [`Simulator::run_with_limit`].
    pub fn run(&mut self) -> Result<(), SimErr> {
        self.run_capped(|_| true)
    }

    /// Execute the program with a limit on how many steps to execute.
    ///
    /// This blocks until the program ends or until the number of steps to execute has been hit.
    /// Hitting the limit is not an error.
    pub fn run_with_limit(&mut self, max_steps: u64) -> Result<(), SimErr> {
        let i = self.instructions_run;
        self.run_while(|sim| sim.instructions_run.wrapping_sub(i) < max_steps)
    }

    /// Simulate one step, executing one instruction.
    ///
    /// If the program has halted (or there is no program), this does nothing.
    /// If the instruction fails, the simulator is left in the state it was before the instruction.
    fn step(&mut self) -> Result<(), SimErr> {
        let Some(&instr) = self.program.as_ref().and_then(|p| p.get(self.run_index)) else {
            return Ok(());
        };
        trace!("{:04}: {instr}", self.run_index);

        let saved = (self.ram.clone(), self.reg_file.clone(), self.call_depth);
        match self.execute(instr) {
            Ok(next) => {
                self.run_index = next;
                self.instructions_run += 1;
                Ok(())
            },
            Err(e) => {
                (self.ram, self.reg_file, self.call_depth) = saved;
                Err(e)
            }
        }
    }

    /// Executes an instruction, returning the index of the next instruction.
    fn execute(&mut self, instr: SimInstr) -> Result<usize, SimErr> {
        let next = self.run_index + 1;
        let branch = |cond: bool, target: usize| -> usize {
            match cond {
                true  => target,
                false => next,
            }
        };

        match instr {
            SimInstr::Nop => {},
            SimInstr::Mov(dst, src) => {
                let value = self.read_src(src, instr)?;
                self.write_loc(dst, value, instr)?;
            },
            SimInstr::MovDptr(value) => self.set_dptr(value),
            SimInstr::MovToCarry(bit) => self.set_flag(PswFlag::CY, self.read_bit(bit)),
            SimInstr::MovFromCarry(bit) => self.write_bit(bit, self.carry()),
            SimInstr::Movc => {
                let addr = u16::from(self.acc()).wrapping_add(self.dptr());
                let value = self.rom.read(addr)?;
                self.set_acc(value);
            },
            SimInstr::Push(addr) => self.push(self.read_direct(addr)),
            SimInstr::Pop(addr) => {
                let value = self.pop();
                self.write_direct(addr, value);
            },
            SimInstr::Xch(loc) => {
                let value = self.read_loc(loc, instr)?;
                let acc = self.acc();
                self.write_loc(loc, acc, instr)?;
                self.set_acc(value);
            },
            SimInstr::Xchd(r) => {
                let addr = self.indirect_addr(r, instr)?;
                let (acc, mem) = (self.acc(), self.raw(addr));
                self.set_raw(addr, (mem & 0xF0) | (acc & 0x0F));
                self.set_acc((acc & 0xF0) | (mem & 0x0F));
            },
            SimInstr::Swap => self.set_acc(self.acc().rotate_left(4)),

            SimInstr::Add(dst, src) | SimInstr::Addc(dst, src) => {
                let carry_in = matches!(instr, SimInstr::Addc(..)) && self.carry();
                let (a, b) = (self.read_loc(dst, instr)?, self.read_src(src, instr)?);
                let result = self.add_with_flags(a, b, carry_in);
                self.write_loc(dst, result, instr)?;
            },
            SimInstr::Subb(dst, src) => {
                let (a, b) = (self.read_loc(dst, instr)?, self.read_src(src, instr)?);
                let result = self.sub_with_flags(a, b, self.carry());
                self.write_loc(dst, result, instr)?;
            },
            SimInstr::Inc(loc) => {
                let value = self.read_loc(loc, instr)?;
                self.write_loc(loc, value.wrapping_add(1), instr)?;
            },
            SimInstr::IncDptr => self.set_dptr(self.dptr().wrapping_add(1)),
            SimInstr::Dec(loc) => {
                let value = self.read_loc(loc, instr)?;
                self.write_loc(loc, value.wrapping_sub(1), instr)?;
            },
            SimInstr::Mul => {
                let [hi, lo] = (u16::from(self.acc()) * u16::from(self.b())).to_be_bytes();
                self.set_acc(lo);
                self.write_direct(sfr::B, hi);
                self.update_psw(|psw| {
                    psw.set_flag(PswFlag::CY, false);
                    psw.set_flag(PswFlag::OV, hi != 0);
                });
            },
            SimInstr::Div => {
                let (a, b) = (self.acc(), self.b());
                if let (Some(quot), Some(rem)) = (a.checked_div(b), a.checked_rem(b)) {
                    self.set_acc(quot);
                    self.write_direct(sfr::B, rem);
                }
                self.update_psw(|psw| {
                    psw.set_flag(PswFlag::CY, false);
                    psw.set_flag(PswFlag::OV, b == 0);
                });
            },
            SimInstr::Da => {
                let psw = self.psw();
                let mut value = u16::from(self.acc());
                let mut cy = psw.cy();

                if psw.ac() || (value & 0x0F) > 0x09 {
                    value += 0x06;
                    cy |= value > 0xFF;
                }
                if cy || (value & 0xF0) > 0x90 {
                    value += 0x60;
                    cy |= value > 0xFF;
                }

                self.set_acc(value as u8);
                self.set_flag(PswFlag::CY, cy);
            },

            SimInstr::Anl(dst, src) | SimInstr::Orl(dst, src) | SimInstr::Xrl(dst, src) => {
                let (a, b) = (self.read_loc(dst, instr)?, self.read_src(src, instr)?);
                let result = match instr {
                    SimInstr::Anl(..) => a & b,
                    SimInstr::Orl(..) => a | b,
                    _ => a ^ b,
                };
                self.write_loc(dst, result, instr)?;
            },
            SimInstr::AnlC(bit, invert) => {
                let value = self.read_bit(bit) != invert;
                self.set_flag(PswFlag::CY, self.carry() && value);
            },
            SimInstr::OrlC(bit, invert) => {
                let value = self.read_bit(bit) != invert;
                self.set_flag(PswFlag::CY, self.carry() || value);
            },
            SimInstr::ClrA => self.set_acc(0),
            SimInstr::Clr(loc) => self.write_bit_loc(loc, false),
            SimInstr::Setb(loc) => self.write_bit_loc(loc, true),
            SimInstr::CplA => self.set_acc(!self.acc()),
            SimInstr::Cpl(loc) => self.write_bit_loc(loc, !self.read_bit_loc(loc)),
            SimInstr::Rl => self.set_acc(self.acc().rotate_left(1)),
            SimInstr::Rr => self.set_acc(self.acc().rotate_right(1)),
            SimInstr::Rlc => {
                let acc = self.acc();
                self.set_acc((acc << 1) | u8::from(self.carry()));
                self.set_flag(PswFlag::CY, acc & 0x80 != 0);
            },
            SimInstr::Rrc => {
                let acc = self.acc();
                self.set_acc((acc >> 1) | (u8::from(self.carry()) << 7));
                self.set_flag(PswFlag::CY, acc & 0x01 != 0);
            },

            SimInstr::Jmp(target) => return self.check_target(target),
            SimInstr::JmpIndirect => {
                let target = usize::from(self.acc()) + usize::from(self.dptr());
                return self.check_target(target);
            },
            SimInstr::Call(target) => {
                let target = self.check_target(target)?;
                let [hi, lo] = u16::try_from(next)
                    .map_err(|_| SimErr::InvalidAddress(next))?
                    .to_be_bytes();
                self.push(lo);
                self.push(hi);
                self.call_depth += 1;
                return Ok(target);
            },
            SimInstr::Ret | SimInstr::Reti => {
                let hi = self.pop();
                let lo = self.pop();
                self.call_depth = self.call_depth.saturating_sub(1);
                return self.check_target(usize::from(u16::from_be_bytes([hi, lo])));
            },
            SimInstr::Jz(target)  => return self.check_target(branch(self.acc() == 0, target)),
            SimInstr::Jnz(target) => return self.check_target(branch(self.acc() != 0, target)),
            SimInstr::Jc(target)  => return self.check_target(branch(self.carry(), target)),
            SimInstr::Jnc(target) => return self.check_target(branch(!self.carry(), target)),
            SimInstr::Jb(bit, target)  => return self.check_target(branch(self.read_bit(bit), target)),
            SimInstr::Jnb(bit, target) => return self.check_target(branch(!self.read_bit(bit), target)),
            SimInstr::Jbc(bit, target) => {
                let set = self.read_bit(bit);
                if set {
                    self.write_bit(bit, false);
                }
                return self.check_target(branch(set, target));
            },
            SimInstr::Cjne(a, b, target) => {
                let (a, b) = (self.read_loc(a, instr)?, self.read_src(b, instr)?);
                self.set_flag(PswFlag::CY, a < b);
                return self.check_target(branch(a != b, target));
            },
            SimInstr::Djnz(loc, target) => {
                let value = self.read_loc(loc, instr)?.wrapping_sub(1);
                self.write_loc(loc, value, instr)?;
                return self.check_target(branch(value != 0, target));
            },
        }

        Ok(next)
    }

    /// Simulate one step, executing one instruction.
    ///
    /// If the program has already halted, this does nothing.
    pub fn step_in(&mut self) -> Result<(), SimErr> {
        std::mem::take(&mut self.pause_condition);
        self.step()
    }

    /// Simulate one step, executing one instruction and running through entire subroutines as a single step.
    pub fn step_over(&mut self) -> Result<(), SimErr> {
        let curr_depth = self.call_depth;
        let mut first = Some(()); // is Some if this is the first instruction executed in this call

        // this function should do at least one step before checking its condition
        // condition: run until we have landed back in the same frame
        self.run_capped(|sim| first.take().is_some() || curr_depth < sim.call_depth)
    }

    /// Run through the simulator's execution until the subroutine is exited.
    pub fn step_out(&mut self) -> Result<(), SimErr> {
        let curr_depth = self.call_depth;
        let mut first = Some(()); // is Some if this is the first instruction executed in this call

        // this function should do at least one step before checking its condition
        // condition: run until we've landed in a smaller frame
        if curr_depth != 0 {
            self.run_capped(|sim| first.take().is_some() || curr_depth <= sim.call_depth)?;
        }

        Ok(())
    }
}
impl Default for Simulator {
    fn default() -> Self {
        Self::new(Default::default())
    }
}
impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("state", &self.state())
            .field("run_index", &self.run_index)
            .field("psw", &self.psw())
            .field("instructions_run", &self.instructions_run)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// A wrapper over `u8` in order to faciliate the PSW.
///
/// The byte is encoded as the following:
///
/// ```text
///  bit:  7   6   5   4   3   2   1   0
///       CY  AC  F0 RS1 RS0  OV  F1   P
/// ```
///
/// `RS1:RS0` select the active register bank.
/// `P` is the parity of the accumulator (set when it has an odd number of 1 bits).
/// It is never stored reliably; [`Simulator::psw`] always recomputes it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Psw(u8);

impl Psw {
    /// Creates a PSW from its bit representation.
    pub fn new(data: u8) -> Self {
        Psw(data)
    }
    /// Gets the bit-representation of the PSW.
    pub fn get(&self) -> u8 {
        self.0
    }

    /// Checks whether a flag is set.
    pub fn flag(&self, flag: PswFlag) -> bool {
        (self.0 >> flag.bit()) & 1 != 0
    }
    /// Sets or clears a flag.
    pub fn set_flag(&mut self, flag: PswFlag, value: bool) {
        let mask = 1 << flag.bit();
        match value {
            true  => self.0 |= mask,
            false => self.0 &= !mask,
        }
    }

    /// Checks the carry flag.
    pub fn cy(&self) -> bool {
        self.flag(PswFlag::CY)
    }
    /// Checks the auxiliary carry flag.
    pub fn ac(&self) -> bool {
        self.flag(PswFlag::AC)
    }
    /// Checks the overflow flag.
    pub fn ov(&self) -> bool {
        self.flag(PswFlag::OV)
    }
    /// Checks the parity flag.
    pub fn p(&self) -> bool {
        self.flag(PswFlag::P)
    }
    /// The selected register bank (0-3).
    pub fn rs(&self) -> u8 {
        (self.0 >> PswFlag::RS0.bit()) & 0b11
    }
    /// Selects a register bank (only the low 2 bits of `bank` are used).
    pub fn set_rs(&mut self, bank: u8) {
        self.0 &= !(0b11 << PswFlag::RS0.bit());
        self.0 |= (bank & 0b11) << PswFlag::RS0.bit();
    }

    /// Computes this PSW with its parity bit derived from the given accumulator value.
    pub fn with_parity(mut self, acc: u8) -> Self {
        self.set_flag(PswFlag::P, acc.count_ones() % 2 == 1);
        self
    }

    /// Every flag with its state, ordered from the most significant bit to the least.
    pub fn flags(&self) -> [(PswFlag, bool); 8] {
        PswFlag::ALL.map(|f| (f, self.flag(f)))
    }
}
impl std::fmt::Debug for Psw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use std::fmt::Write;
        struct Flags(Psw);

        impl std::fmt::Debug for Flags {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                for (flag, set) in self.0.flags() {
                    if flag != PswFlag::RS1 && flag != PswFlag::RS0 && set {
                        f.write_str(flag.name())?;
                        f.write_char(' ')?;
                    }
                }
                Ok(())
            }
        }

        f.debug_struct("Psw")
            .field("bank", &self.rs())
            .field("flags", &Flags(*self))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::asm::{assemble, Program};
    use crate::ast::reg_consts::{R0, R1, R2, R3};
    use crate::ast::sim::SimInstr;
    use crate::ast::{sfr, ByteLoc, ByteSrc, PswFlag, Reg};

    use super::{EngineState, Psw, SimErr, SimFlags, Simulator};

    fn load(lines: &[&str]) -> Simulator {
        let mut sim = Simulator::default();
        sim.load_program(assemble(lines).unwrap()).unwrap();
        sim
    }
    fn run(lines: &[&str]) -> Simulator {
        let mut sim = load(lines);
        sim.run().unwrap();
        sim
    }

    #[test]
    fn test_add_registers() {
        let sim = run(&["MOV R0, #5", "MOV R1, #3", "ADD R0, R1"]);
        assert_eq!(sim.read_reg(R0), Ok(8));
        assert!(!sim.psw().cy());
        assert_eq!(sim.run_index(), 3);
        assert_eq!(sim.state(), EngineState::Halted);
        assert_eq!(sim.instructions_run, 3);
    }

    #[test]
    fn test_add_flags() {
        // 0x7F + 0x01: signed overflow, half carry
        let sim = run(&["MOV A, #7Fh", "ADD A, #1"]);
        assert_eq!(sim.acc(), 0x80);
        let psw = sim.psw();
        assert!(!psw.cy() && psw.ac() && psw.ov());

        // 0xFF + 0x01: carry out, no signed overflow
        let sim = run(&["MOV A, #0FFh", "ADD A, #1"]);
        assert_eq!(sim.acc(), 0);
        let psw = sim.psw();
        assert!(psw.cy() && psw.ac() && !psw.ov());

        // ADDC uses carry in
        let sim = run(&["SETB C", "MOV A, #1", "ADDC A, #1"]);
        assert_eq!(sim.acc(), 3);
        assert!(!sim.psw().cy());
    }

    #[test]
    fn test_subb_flags() {
        let sim = run(&["CLR C", "MOV A, #0", "SUBB A, #1"]);
        assert_eq!(sim.acc(), 0xFF);
        let psw = sim.psw();
        assert!(psw.cy() && psw.ac() && !psw.ov());

        // -128 - 1 overflows
        let sim = run(&["CLR C", "MOV A, #80h", "SUBB A, #1"]);
        assert_eq!(sim.acc(), 0x7F);
        let psw = sim.psw();
        assert!(!psw.cy() && psw.ov());

        let sim = run(&["SETB C", "MOV A, #5", "SUBB A, #2"]);
        assert_eq!(sim.acc(), 2);
        assert!(!sim.psw().cy());
    }

    #[test]
    fn test_mul_div_da() {
        let sim = run(&["MOV A, #20", "MOV B, #20", "MUL AB"]);
        assert_eq!((sim.acc(), sim.b()), (400u16 as u8, (400u16 >> 8) as u8));
        assert!(sim.psw().ov() && !sim.psw().cy());

        let sim = run(&["MOV A, #251", "MOV B, #18", "DIV AB"]);
        assert_eq!((sim.acc(), sim.b()), (13, 17));
        assert!(!sim.psw().ov());

        let sim = run(&["MOV A, #9", "MOV B, #0", "DIV AB"]);
        assert_eq!((sim.acc(), sim.b()), (9, 0));
        assert!(sim.psw().ov());

        // BCD 38 + 45 = 83
        let sim = run(&["MOV A, #38h", "ADD A, #45h", "DA A"]);
        assert_eq!(sim.acc(), 0x83);
        assert!(!sim.psw().cy());

        // BCD 99 + 01 = 100
        let sim = run(&["MOV A, #99h", "ADD A, #1", "DA A"]);
        assert_eq!(sim.acc(), 0x00);
        assert!(sim.psw().cy());
    }

    #[test]
    fn test_logic_and_rotates() {
        let sim = run(&["MOV A, #0F0h", "ANL A, #3Ch", "ORL A, #01h", "XRL A, #0FFh"]);
        assert_eq!(sim.acc(), !(0x30 | 0x01));

        let sim = run(&["MOV A, #81h", "CLR C", "RLC A"]);
        assert_eq!(sim.acc(), 0x02);
        assert!(sim.psw().cy());

        let sim = run(&["MOV A, #01h", "SETB C", "RRC A"]);
        assert_eq!(sim.acc(), 0x80);
        assert!(sim.psw().cy());

        let sim = run(&["MOV A, #81h", "RL A", "SWAP A"]);
        assert_eq!(sim.acc(), 0x30);
    }

    #[test]
    fn test_bits() {
        let sim = run(&["SETB 20h.3", "SETB 7Fh", "CPL 20h.0", "CLR 20h.0", "MOV C, 20h.3", "MOV 21h.1, C"]);
        assert_eq!(sim.read_direct(0x20), 0b1000);
        assert_eq!(sim.read_direct(0x2F), 0x80);
        assert_eq!(sim.read_direct(0x21), 0b10);
        assert!(sim.psw().cy());

        let sim = run(&["SETB C", "ANL C, /20h.0", "MOV 30h, C", "CLR C", "ORL C, /20h.0"]);
        assert!(sim.psw().cy());
        assert!(sim.read_bit(0x30));
    }

    #[test]
    fn test_parity() {
        let sim = run(&["MOV A, #3"]);
        assert!(!sim.psw().p());
        let sim = run(&["MOV A, #7"]);
        assert!(sim.psw().p());
        assert_eq!(sim.read_direct(sfr::PSW) & 1, 1);

        // Stored parity is ignored.
        let sim = run(&["MOV PSW, #1"]);
        assert!(!sim.psw().p());
    }

    #[test]
    fn test_bank_select() {
        let sim = run(&["MOV R0, #1", "SETB RS0", "MOV R0, #2", "MOV PSW, #18h", "MOV R0, #4"]);
        assert_eq!(sim.active_bank(), 3);
        assert_eq!(sim.reg_file.read(0, R0), Ok(1));
        assert_eq!(sim.reg_file.read(1, R0), Ok(2));
        assert_eq!(sim.reg_file.read(2, R0), Ok(0));
        assert_eq!(sim.reg_file.read(3, R0), Ok(4));
    }

    #[test]
    fn test_indirect_and_stack() {
        let sim = run(&[
            "MOV R1, #40h", "MOV @R1, #99", "MOV A, @R1",
            "MOV SP, #60h", "PUSH ACC", "MOV A, #0", "POP B",
            "MOV 41h, #0ABh", "INC R1", "MOV A, #12h", "XCHD A, @R1",
        ]);
        assert_eq!(sim.read_direct(0x40), 99);
        assert_eq!(sim.b(), 99);
        assert_eq!(sim.sp(), 0x60);
        assert_eq!(sim.read_direct(0x61), 99);
        assert_eq!(sim.read_direct(0x41), 0xA2);
        assert_eq!(sim.acc(), 0x1B);
    }

    #[test]
    fn test_branches() {
        // sum 1..=5 into A
        let sim = run(&[
            "      MOV R2, #5",
            "      CLR A",
            "LOOP: ADD A, R2",
            "      DJNZ R2, LOOP",
            "      CJNE A, #15, BAD",
            "      MOV 30h, #1",
            "      SJMP DONE",
            "BAD:  MOV 30h, #0FFh",
            "DONE:",
        ]);
        assert_eq!(sim.acc(), 15);
        assert_eq!(sim.read_direct(0x30), 1);
        assert_eq!(sim.read_reg(R2), Ok(0));
        assert!(sim.is_halted());

        let sim = run(&["MOV A, #3", "CJNE A, #4, L", "L: NOP"]);
        assert!(sim.psw().cy());

        let sim = run(&["SETB 20h.0", "JBC 20h.0, L", "MOV A, #1", "L: JNB 20h.0, M", "MOV A, #2", "M: NOP"]);
        assert_eq!(sim.acc(), 0);
        assert_eq!(sim.read_direct(0x20), 0);
    }

    #[test]
    fn test_calls() {
        let mut sim = load(&[
            "      MOV SP, #30h",
            "      CALL SUB",
            "      MOV R3, A",
            "      SJMP END1",
            "SUB:  MOV A, #42",
            "      RET",
            "END1:",
        ]);
        sim.step_in().unwrap();
        sim.step_in().unwrap();
        assert_eq!(sim.run_index(), 4);
        assert_eq!(sim.call_depth(), 1);
        assert_eq!(sim.sp(), 0x32);
        assert_eq!((sim.read_direct(0x31), sim.read_direct(0x32)), (2, 0));

        sim.step_out().unwrap();
        assert_eq!(sim.run_index(), 2);
        assert_eq!(sim.call_depth(), 0);
        sim.run().unwrap();
        assert_eq!(sim.read_reg(R3), Ok(42));
        assert_eq!(sim.sp(), 0x30);
    }

    #[test]
    fn test_step_over() {
        let mut sim = load(&["CALL SUB", "NOP", "SUB: INC A", "RET"]);
        sim.step_over().unwrap();
        assert_eq!(sim.run_index(), 1);
        assert_eq!(sim.acc(), 1);
        assert_eq!(sim.instructions_run, 3);
    }

    #[test]
    fn test_movc_and_jump_table() {
        let sim = run(&[
            "MOV DPTR, #TBL",
            "MOV A, #2",
            "MOVC A, @A+DPTR",
            "ORG 10h",
            "TBL: DB 10, 20, 30",
        ]);
        assert_eq!(sim.acc(), 30);
        assert_eq!(sim.dptr(), 0x10);

        let mut sim = load(&["MOV DPTR, #0FFh", "MOV A, #1", "MOVC A, @A+DPTR"]);
        sim.step_in().unwrap();
        sim.step_in().unwrap();
        assert_eq!(sim.step_in(), Err(SimErr::InvalidAddress(0x100)));
        // Failed instruction changes nothing.
        assert_eq!(sim.acc(), 1);
        assert_eq!(sim.run_index(), 2);

        let sim = run(&["MOV DPTR, #0", "MOV A, #4", "JMP @A+DPTR", "MOV R0, #1", "NOP"]);
        assert_eq!(sim.read_reg(R0), Ok(0));

        let mut sim = load(&["MOV A, #10", "JMP @A+DPTR"]);
        assert_eq!(sim.run(), Err(SimErr::InvalidAddress(10)));
    }

    #[test]
    fn test_halt_idempotent() {
        let mut sim = load(&["ADD R0, R1"]);
        sim.step_in().unwrap();
        let before = (sim.ram().clone(), sim.reg_file.clone(), sim.run_index(), sim.instructions_run);
        sim.step_in().unwrap();
        sim.step_in().unwrap();
        let after = (sim.ram().clone(), sim.reg_file.clone(), sim.run_index(), sim.instructions_run);
        assert_eq!(before, after);
    }

    #[test]
    fn test_timeout() {
        let mut sim = Simulator::new(SimFlags { max_steps: 50 });
        sim.load_program(assemble(&["L: INC A", "SJMP L"]).unwrap()).unwrap();
        assert_eq!(sim.run(), Err(SimErr::ExecutionTimeout { limit: 50 }));
        assert_eq!(sim.instructions_run, 50);
        assert_eq!(sim.acc(), 25);

        // exactly at the cap is fine
        let mut sim = Simulator::new(SimFlags { max_steps: 2 });
        sim.load_program(assemble(&["NOP", "NOP"]).unwrap()).unwrap();
        assert_eq!(sim.run(), Ok(()));

        // run_with_limit stops quietly
        let mut sim = load(&["L: INC A", "SJMP L"]);
        sim.run_with_limit(10).unwrap();
        assert_eq!(sim.instructions_run, 10);
    }

    #[test]
    fn test_invalid_opcode() {
        let mut sim = Simulator::default();
        let instr = SimInstr::Mov(ByteLoc::Indirect(Reg(2)), ByteSrc::Imm(1));
        sim.load_program(Program::from_instrs(vec![instr])).unwrap();
        assert_eq!(sim.step_in(), Err(SimErr::InvalidOpcode(instr)));
        assert_eq!(sim.run_index(), 0);
    }

    #[test]
    fn test_reset() {
        let mut sim = run(&["MOV A, #1", "MOV R1, #1", "SETB RS1"]);
        sim.breakpoints.insert(super::debug::Breakpoint::Index(9));
        sim.flags.max_steps = 7;

        sim.reset();
        assert_eq!(sim.state(), EngineState::Idle);
        assert_eq!(sim.acc(), 0);
        assert_eq!(sim.read_reg(R1), Ok(0));
        assert_eq!(sim.active_bank(), 0);
        assert_eq!(sim.flags.max_steps, 7);
        assert_eq!(sim.breakpoints.len(), 1);
    }

    #[test]
    fn test_psw() {
        let mut psw = Psw::new(0);
        psw.set_rs(2);
        psw.set_flag(PswFlag::CY, true);
        assert_eq!(psw.get(), 0b1001_0000);
        assert_eq!(psw.rs(), 2);
        assert!(psw.with_parity(0b111).p());
        assert_eq!(format!("{psw:?}"), "Psw { bank: 2, flags: CY  }");

    }
}
