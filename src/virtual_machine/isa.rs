//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_instruction!`](crate::for_each_instruction) macro holds the
//! canonical instruction list and invokes a callback macro for code generation,
//! so the opcode table, the operation enum and the operand parser are all
//! generated from one place. Adding an instruction means adding one line there
//! and one execution arm in [`instruction`](super::instruction).
//!
//! This module generates:
//! - The [`Opcode`] enum with mnemonic and operand-count mappings
//! - [`Opcode::from_token`], the static opcode lookup used by the translator
//!
//! # Operand kinds
//!
//! - `Reg`: register index (`u32`)
//! - `Imm`: integer literal (`i32`)
//! - `Label`: branch target label name (`String`)

/// Invokes a callback macro with the complete instruction definition list.
///
/// Operands are listed in the order they appear in source text.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            /// ADD result op1 op2 ; result = op1 + op2
            Add, "add" => [result: Reg, op1: Reg, op2: Reg],
            /// SUB result op1 op2 ; result = op1 - op2
            Sub, "sub" => [result: Reg, op1: Reg, op2: Reg],
            /// MUL result op1 op2 ; result = op1 * op2
            Mul, "mul" => [result: Reg, op1: Reg, op2: Reg],
            /// DIV result op1 op2 ; result = op1 / op2 (faults on division by zero)
            Div, "div" => [result: Reg, op1: Reg, op2: Reg],
            /// LIN register value ; register = value
            Lin, "lin" => [register: Reg, value: Imm],
            /// OUT register ; emit the value of register
            Out, "out" => [register: Reg],
            /// BNZ register target ; if register != 0 then PC = target
            Bnz, "bnz" => [register: Reg, target: Label],
        }
    };
}

#[macro_export]
macro_rules! define_instructions {
    (
        $(
            $(#[$doc:meta])*
            $name:ident, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        /// Opcode of an SML instruction.
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name,
            )*
        }

        impl Opcode {
            /// Every opcode, in definition order.
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];

            /// Returns the assembly mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Returns how many operand tokens this opcode consumes.
            pub const fn operand_count(&self) -> usize {
                match self {
                    $( Opcode::$name => <[&str]>::len(&[ $( stringify!($field) ),* ]), )*
                }
            }

            /// Exact lookup against the normalized opcode spelling (`Add`, `Bnz`, ...).
            fn from_normalized(name: &str) -> Option<Opcode> {
                match name {
                    $( stringify!($name) => Some(Opcode::$name), )*
                    _ => None,
                }
            }
        }
    };

    // ---------- types ----------
    (@ty Reg)   => { u32 };
    (@ty Imm)   => { i32 };
    (@ty Label) => { String };
}

for_each_instruction!(define_instructions);

impl Opcode {
    /// Looks up an opcode token as written in source.
    ///
    /// The token's casing is normalized first (first character upper-cased,
    /// the rest lower-cased), so `add`, `ADD` and `aDd` all resolve to
    /// [`Opcode::Add`]. Returns `None` for anything outside the instruction set.
    pub fn from_token(token: &str) -> Option<Opcode> {
        let mut chars = token.chars();
        let first = chars.next()?;
        let normalized: String = first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect();
        Opcode::from_normalized(&normalized)
    }
}
