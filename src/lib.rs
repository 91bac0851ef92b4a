//! An 8051 (MCS-51) parser, assembler, and simulator.
//!
//! This is meant to be the engine behind an educational 8051 simulator:
//! source is assembled line by line, executed instruction by instruction,
//! and the full machine state can be inspected (or serialized) at any point.
//!
//! # Usage
//!
//! To convert 8051 source code to a program, it must be assembled:
//! ```
//! use mcs51_sim::asm::assemble;
//!
//! let code = [
//!     "      MOV R0, #5",
//!     "      CLR A",
//!     "LOOP: ADD A, R0",
//!     "      DJNZ R0, LOOP",
//! ];
//! let program = assemble(&code).unwrap();
//! assert_eq!(program.len(), 4);
//! ```
//!
//! Once a program has been created, it can be executed with the simulator:
//! ```
//! # use mcs51_sim::asm::assemble;
//! # let program = assemble(&["MOV R0, #5", "CLR A", "LOOP: ADD A, R0", "DJNZ R0, LOOP"]).unwrap();
//! use mcs51_sim::sim::Simulator;
//!
//! let mut simulator = Simulator::new(Default::default());
//! simulator.load_program(program).unwrap();
//! simulator.run().unwrap(); // <-- Result can be handled accordingly
//! assert_eq!(simulator.acc(), 15);
//! ```
//!
//! If more granularity is needed for simulation, there are also step-in and step-out functions.
//! See the [`sim`] module for more details.
//!
//! The [`ctl`] module wraps both steps into a single [`ctl::Controller`],
//! which also produces serializable snapshots of the machine state.
#![warn(missing_docs)]

pub mod parse;
pub mod ast;
pub mod asm;
pub mod sim;
pub mod ctl;
pub mod err;
