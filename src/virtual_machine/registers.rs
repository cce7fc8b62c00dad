use std::collections::BTreeMap;
use std::fmt;

/// Register file holding machine storage.
///
/// Any non-negative index is addressable. Registers are lazily created on
/// first write; unset registers read as `0`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    regs: BTreeMap<u32, i32>,
}

impl Registers {
    /// Creates an empty register file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value in register `idx`, or `0` if it was never written.
    pub fn get(&self, idx: u32) -> i32 {
        self.regs.get(&idx).copied().unwrap_or(0)
    }

    /// Stores a value into register `idx`.
    pub fn set(&mut self, idx: u32, value: i32) {
        self.regs.insert(idx, value);
    }

    /// Clears every register back to `0`.
    pub fn reset(&mut self) {
        self.regs.clear();
    }

    /// Iterates written registers in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, i32)> + '_ {
        self.regs.iter().map(|(idx, value)| (*idx, *value))
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Registers:")?;
        for (idx, value) in self.iter() {
            write!(f, " r{idx}={value}")?;
        }
        Ok(())
    }
}
