//! Register machine for the SML assembly language.
//!
//! Source text is translated in one pass into a [`program::Program`] and a
//! [`labels::LabelTable`], then interpreted by [`machine::Machine`].
//!
//! # Architecture
//!
//! - **Registers**: unbounded file of `i32` values indexed by `u32`; unset
//!   registers read as `0`
//! - **Instruction set**: `add`, `sub`, `mul`, `div`, `lin`, `out`, `bnz`
//! - **Control flow**: sequential, except `bnz` which jumps to a label when its
//!   register is non-zero; a run ends when the program counter leaves the
//!   program
//! - **Faults**: division by zero and branches to unknown labels end the run
//!
//! # Modules
//!
//! - [`errors`]: Translation and execution error types
//! - [`isa`]: Instruction set definition and opcode lookup
//! - [`instruction`]: Instruction variants, execution and rendering
//! - [`labels`]: Label table
//! - [`machine`]: Execution engine and output sinks
//! - [`program`]: Translated instruction sequence
//! - [`registers`]: Register file
//! - [`translator`]: Source parsing and label resolution

pub mod errors;
pub mod instruction;
pub mod isa;
pub mod labels;
pub mod machine;
pub mod program;
pub mod registers;
pub mod translator;
