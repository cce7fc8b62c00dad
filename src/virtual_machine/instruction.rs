//! Translated SML instructions and their execution contract.
//!
//! An [`Instruction`] pairs an optional label with an [`Operation`], the closed
//! set of instruction variants generated from
//! [`for_each_instruction!`](crate::for_each_instruction). Each variant reads
//! registers through the [`Machine`], writes at most one register, and may
//! redirect the program counter (`bnz`) or emit a value (`out`).

use crate::define_instructions;
use crate::for_each_instruction;
use crate::virtual_machine::errors::SmlError;
use crate::virtual_machine::isa::Opcode;
use crate::virtual_machine::machine::{Machine, Output};
use std::fmt;

macro_rules! define_operations {
    (
        $(
            $(#[$doc:meta])*
            $name:ident, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        /// Instruction variant together with its operands.
        #[derive(Clone, Debug, Eq, PartialEq)]
        pub enum Operation {
            $(
                $(#[$doc])*
                $name {
                    $( $field: define_instructions!(@ty $kind) ),*
                },
            )*
        }

        impl Operation {
            /// Returns the opcode of this operation.
            pub const fn opcode(&self) -> Opcode {
                match self {
                    $( Operation::$name { .. } => Opcode::$name, )*
                }
            }
        }
    };
}

for_each_instruction!(define_operations);

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.opcode().mnemonic();
        match self {
            Operation::Add { result, op1, op2 } => {
                write!(f, "{m} {op1} + {op2} output to {result}")
            }
            Operation::Sub { result, op1, op2 } => {
                write!(f, "{m} {op1} - {op2} output to {result}")
            }
            Operation::Mul { result, op1, op2 } => {
                write!(f, "{m} {op1} * {op2} output to {result}")
            }
            Operation::Div { result, op1, op2 } => {
                write!(f, "{m} {op1} / {op2} output to register {result}")
            }
            Operation::Lin { register, value } => {
                write!(f, "{m} register {register} value is {value}")
            }
            Operation::Out { register } => write!(f, "{m} register {register}"),
            Operation::Bnz { register, target } => {
                write!(f, "{m} register {register} jump to {target}")
            }
        }
    }
}

/// A labeled operation, the unit of a [`Program`](super::program::Program).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instruction {
    /// Label of this instruction; empty when the line had none.
    label: String,
    operation: Operation,
}

impl Instruction {
    pub fn new(label: impl Into<String>, operation: Operation) -> Self {
        Self {
            label: label.into(),
            operation,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn opcode(&self) -> Opcode {
        self.operation.opcode()
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Human-readable rendering of label, mnemonic and operands.
    ///
    /// The layout is stable and relied upon by tooling, e.g.
    /// `f0: sub 21 - 22 output to 20`.
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Executes this instruction against the machine.
    ///
    /// Division by zero and branches to unknown labels are fatal and returned
    /// as errors; registers written by earlier instructions are kept.
    pub fn execute<O: Output>(&self, machine: &mut Machine<O>) -> Result<(), SmlError> {
        match &self.operation {
            Operation::Add { result, op1, op2 } => {
                let (a, b) = operands(machine, *op1, *op2);
                machine.registers_mut().set(*result, a.wrapping_add(b));
            }
            Operation::Sub { result, op1, op2 } => {
                let (a, b) = operands(machine, *op1, *op2);
                machine.registers_mut().set(*result, a.wrapping_sub(b));
            }
            Operation::Mul { result, op1, op2 } => {
                let (a, b) = operands(machine, *op1, *op2);
                machine.registers_mut().set(*result, a.wrapping_mul(b));
            }
            Operation::Div { result, op1, op2 } => {
                let (a, b) = operands(machine, *op1, *op2);
                if b == 0 {
                    return Err(SmlError::ArithmeticFault {
                        instruction: self.describe(),
                    });
                }
                machine.registers_mut().set(*result, a.wrapping_div(b));
            }
            Operation::Lin { register, value } => {
                machine.registers_mut().set(*register, *value);
            }
            Operation::Out { register } => {
                let value = machine.registers().get(*register);
                machine.emit(value);
            }
            Operation::Bnz { register, target } => {
                if machine.registers().get(*register) != 0 {
                    machine.branch_to(target)?;
                }
            }
        }
        Ok(())
    }
}

fn operands<O: Output>(machine: &Machine<O>, op1: u32, op2: u32) -> (i32, i32) {
    let regs = machine.registers();
    (regs.get(op1), regs.get(op2))
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "{}", self.operation)
        } else {
            write!(f, "{}: {}", self.label, self.operation)
        }
    }
}
