//! Error interface for this crate.
//!
//! Every error type in this crate implements [`Error`],
//! which extends [`std::error::Error`] with the source line (if any) and a help message.
//!
//! This module also re-exports every error type, so they can be imported from one place.
use std::borrow::Cow;

pub use crate::parse::lex::LexErr;
pub use crate::asm::{AsmErr, SyntaxErrKind};
pub use crate::sim::mem::MemErr;
pub use crate::sim::SimErr;
pub use crate::ctl::CtlErr;

/// Unified error interface for all errors in this crate.
pub trait Error: std::error::Error {
    /// The (0-indexed) source line where this error occurred, if it has one.
    fn line(&self) -> Option<usize> {
        None
    }

    /// A help message describing how to fix the error, if there is one.
    fn help(&self) -> Option<Cow<str>>;
}

/// Renders an error as a short report: the message, then the line and help (if present).
///
/// ```
/// use mcs51_sim::asm::assemble;
/// use mcs51_sim::err::report;
///
/// let err = assemble(&["NOP", "JMP MISSING"]).unwrap_err();
/// assert_eq!(
///     report(&err),
///     "error: unresolved label 'MISSING' on line 1\n  --> line 1\n  help: try adding this label before an instruction or a DB directive"
/// );
/// ```
pub fn report(err: &impl Error) -> String {
    let mut out = format!("error: {err}");
    if let Some(line) = err.line() {
        out.push_str(&format!("\n  --> line {line}"));
    }
    if let Some(help) = err.help() {
        out.push_str(&format!("\n  help: {help}"));
    }
    out
}
