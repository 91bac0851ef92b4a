//! Utilities to debug simulation.
//!
//! The key type here is [`Breakpoint`], which can be appended to the [`Simulator`]'s
//! breakpoint field to cause the simulator to break.
use std::fmt::Write;

use crate::ast::{PswFlag, Reg};

use super::Simulator;

/// Common breakpoints.
#[derive(PartialEq, Eq, Hash, Clone)]
pub enum Breakpoint {
    /// Break when the run index is equal to the given value.
    Index(usize),

    /// Break when the provided register (of the active bank) is set to a given value.
    Reg {
        /// Register to check.
        reg: Reg,
        /// Predicate to break against.
        value: Comparator
    },
    /// Break when the provided internal RAM address is written to with a given value.
    Mem {
        /// Address to check.
        addr: u8,
        /// Predicate to break against.
        value: Comparator
    },
    /// Break when the provided PSW flag has the given state.
    Flag {
        /// Flag to check.
        flag: PswFlag,
        /// State to break on.
        set: bool
    },
}

impl Breakpoint where Breakpoint: Send + Sync { /* assert Breakpoint is send/sync */ }

impl Breakpoint {
    /// Checks if a break should occur.
    pub fn check(&self, sim: &Simulator) -> bool {
        match self {
            Breakpoint::Index(expected) => *expected == sim.run_index(),
            Breakpoint::Reg { reg, value: cmp } => sim.read_reg(*reg).is_ok_and(|v| cmp.check(v)),
            Breakpoint::Mem { addr, value: cmp } => cmp.check(sim.read_direct(*addr)),
            Breakpoint::Flag { flag, set } => sim.psw().flag(*flag) == *set,
        }
    }

    fn fmt_bp(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Index(expected) => {
                write!(f, "index == {expected}")?;
            },
            Self::Reg { reg, value } => {
                write!(f, "{reg} ")?;
                value.fmt_cmp(f)?;
            },
            Self::Mem { addr, value } => {
                write!(f, "ram[{addr:02X}h] ")?;
                value.fmt_cmp(f)?;
            },
            Self::Flag { flag, set } => {
                write!(f, "{flag} == {}", u8::from(*set))?;
            },
        }
        Ok(())
    }
}
impl std::fmt::Debug for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Breakpoint(")?;
        self.fmt_bp(f)?;
        f.write_char(')')
    }
}
/// Predicate checking whether the current value is equal to the value.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum Comparator {
    /// Never breaks.
    Never,
    /// Break if the desired value is less than the provided value.
    Lt(u8),
    /// Break if the desired value is equal to the provided value.
    Eq(u8),
    /// Break if the desired value is less than or equal to the provided value.
    Le(u8),
    /// Break if the desired value is greater than the provided value.
    Gt(u8),
    /// Break if the desired value is not equal to the provided value.
    Ne(u8),
    /// Break if the desired value is greater than or equal to the provided value.
    Ge(u8),
    /// Always breaks.
    Always
}
impl Comparator {
    /// Checks if the operand passes the comparator.
    pub fn check(&self, operand: u8) -> bool {
        match *self {
            Comparator::Never  => false,
            Comparator::Lt(r)  => operand < r,
            Comparator::Eq(r)  => operand == r,
            Comparator::Le(r)  => operand <= r,
            Comparator::Gt(r)  => operand > r,
            Comparator::Ne(r)  => operand != r,
            Comparator::Ge(r)  => operand >= r,
            Comparator::Always => true,
        }
    }

    fn fmt_cmp(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Comparator::Never  => f.write_str("never"),
            Comparator::Lt(r)  => write!(f, "< {r}"),
            Comparator::Eq(r)  => write!(f, "== {r}"),
            Comparator::Le(r)  => write!(f, "<= {r}"),
            Comparator::Gt(r)  => write!(f, "> {r}"),
            Comparator::Ne(r)  => write!(f, "!= {r}"),
            Comparator::Ge(r)  => write!(f, ">= {r}"),
            Comparator::Always => f.write_str("always"),
        }
    }
}
