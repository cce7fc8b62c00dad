use crate::virtual_machine::instruction::Instruction;
use std::fmt::Write;
use std::ops::Index;

/// Ordered instruction sequence produced by the translator.
///
/// The position of an instruction in this sequence is its program counter
/// value and the index branch targets resolve to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn get(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }

    pub fn clear(&mut self) {
        self.instructions.clear();
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Renders one `describe()` line per instruction.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for instruction in &self.instructions {
            let _ = writeln!(out, "{instruction}");
        }
        out
    }
}

impl Index<usize> for Program {
    type Output = Instruction;

    fn index(&self, pc: usize) -> &Instruction {
        &self.instructions[pc]
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl FromIterator<Instruction> for Program {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        Self {
            instructions: iter.into_iter().collect(),
        }
    }
}
