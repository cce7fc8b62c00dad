//! Execution engine.
//!
//! The machine owns the register file, the label table and the translated
//! program, and runs a fetch-execute loop over the program. There is no halt
//! instruction: a run ends when the program counter leaves
//! `[0, program.len())`, or when an instruction faults.

mod output;

pub use output::{Output, StdOutput};

use crate::debug;
use crate::virtual_machine::errors::SmlError;
use crate::virtual_machine::labels::LabelTable;
use crate::virtual_machine::program::Program;
use crate::virtual_machine::registers::Registers;
use std::mem;

/// Result of a run that terminated normally.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RunSummary {
    /// Number of instructions executed.
    pub steps: u64,
}

/// SML register machine.
pub struct Machine<O: Output = StdOutput> {
    registers: Registers,
    /// Register values loaded at the start of every run.
    inputs: Registers,
    labels: LabelTable,
    program: Program,
    /// Index of the instruction being executed.
    pc: usize,
    /// Branch target set by the current instruction, consumed after it runs.
    branch: Option<usize>,
    output: O,
}

impl Machine<StdOutput> {
    /// Creates a machine that prints `out` values to stdout.
    pub fn new(labels: LabelTable, program: Program) -> Self {
        Self::with_output(labels, program, StdOutput)
    }
}

impl<O: Output> Machine<O> {
    /// Creates a machine with a custom output sink.
    pub fn with_output(labels: LabelTable, program: Program, output: O) -> Self {
        Self {
            registers: Registers::new(),
            inputs: Registers::new(),
            labels,
            program,
            pc: 0,
            branch: None,
            output,
        }
    }

    /// Sets the register values every run starts from.
    pub fn with_inputs(mut self, inputs: Registers) -> Self {
        self.inputs = inputs;
        self
    }

    /// Executes the program from index 0 until the program counter leaves the
    /// program or an instruction faults.
    ///
    /// Each run starts from a fresh register file holding only the inputs.
    /// A fault ends the run immediately. Registers keep whatever earlier
    /// instructions wrote and [`Machine::pc`] points at the faulting
    /// instruction.
    pub fn run(&mut self) -> Result<RunSummary, SmlError> {
        self.registers.clone_from(&self.inputs);
        self.pc = 0;
        self.branch = None;

        // Detach the program so instructions can borrow the machine mutably.
        let program = mem::take(&mut self.program);
        let result = self.execute_program(&program);
        self.program = program;
        result
    }

    fn execute_program(&mut self, program: &Program) -> Result<RunSummary, SmlError> {
        let mut steps = 0u64;
        while let Some(instruction) = program.get(self.pc) {
            debug!("[{:>4}] {}", self.pc, instruction);
            instruction.execute(self)?;
            steps += 1;
            self.pc = match self.branch.take() {
                Some(target) => target,
                None => self.pc + 1,
            };
        }
        Ok(RunSummary { steps })
    }

    /// Redirects the program counter to the instruction labeled `label`.
    ///
    /// Takes effect once the current instruction finishes.
    pub(crate) fn branch_to(&mut self, label: &str) -> Result<(), SmlError> {
        let target = self
            .labels
            .index_of(label)
            .ok_or_else(|| SmlError::UnresolvedBranchTarget {
                label: label.to_string(),
            })?;
        self.branch = Some(target);
        Ok(())
    }

    pub(crate) fn emit(&mut self, value: i32) {
        self.output.emit(value);
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Register file written by executing instructions.
    pub(crate) fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Current program counter.
    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Consumes the machine, returning the register file and output sink.
    pub fn into_parts(self) -> (Registers, O) {
        (self.registers, self.output)
    }
}
