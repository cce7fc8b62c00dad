//! SML source translator.
//!
//! Converts source text into a [`Program`] and its [`LabelTable`] in a single
//! pass. Uses [`for_each_instruction!`](for_each_instruction) to generate the
//! per-opcode operand parser.
//!
//! # Syntax
//!
//! ```text
//! [label] opcode operand1 operand2 ...
//! ```
//!
//! - Tokens are separated by whitespace; there are no comments or quoting
//! - The first token is a label when more tokens follow it, unless it is an
//!   opcode and the rest of the line is a complete operand list for it
//! - A line holding only a label names the next instruction
//! - Opcodes are matched case-insensitively (`add`, `ADD`)
//! - Register and literal operands are decimal integers
//!
//! # Degraded input
//!
//! Malformed content does not abort translation:
//! - a missing or unparsable numeric operand becomes [`MALFORMED_OPERAND`]
//! - a line with an unknown opcode is dropped
//!
//! Both outcomes are recorded as [`Degradation`]s. Only a duplicate label or an
//! unreadable source fails the translation.

use crate::for_each_instruction;
use crate::virtual_machine::errors::SmlError;
use crate::virtual_machine::instruction::{Instruction, Operation};
use crate::virtual_machine::isa::Opcode;
use crate::virtual_machine::labels::LabelTable;
use crate::virtual_machine::program::Program;
use crate::{error, warn};
use std::borrow::Cow;
use std::fmt::{self, Write};
use std::fs;
use std::path::{Path, PathBuf};

/// Value substituted for a numeric operand that is missing or unparsable.
pub const MALFORMED_OPERAND: i32 = i32::MAX;

/// A non-fatal translation problem. The line was still handled.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Degradation {
    /// A numeric operand was replaced by [`MALFORMED_OPERAND`].
    MalformedOperand {
        line: usize,
        opcode: Opcode,
        operand: &'static str,
    },
    /// The opcode is not part of the instruction set; the line was dropped.
    UnknownOpcode { line: usize, opcode: String },
}

impl Degradation {
    pub fn line(&self) -> usize {
        match self {
            Degradation::MalformedOperand { line, .. }
            | Degradation::UnknownOpcode { line, .. } => *line,
        }
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::MalformedOperand {
                line,
                opcode,
                operand,
            } => write!(
                f,
                "line {line}: malformed operand `{operand}` of {}, using {MALFORMED_OPERAND}",
                opcode.mnemonic()
            ),
            Degradation::UnknownOpcode { line, opcode } => {
                write!(f, "line {line}: unknown opcode `{opcode}`, line skipped")
            }
        }
    }
}

/// Output of a successful translation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Translation {
    pub labels: LabelTable,
    pub program: Program,
    pub degradations: Vec<Degradation>,
}

/// Cursor over the unprocessed part of one source line.
struct LineCursor<'a> {
    rest: &'a str,
    /// Names of operands that fell back to [`MALFORMED_OPERAND`].
    malformed: Vec<&'static str>,
}

impl<'a> LineCursor<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            rest: line,
            malformed: Vec::new(),
        }
    }

    /// Splits the next whitespace-delimited word off the line.
    /// Returns `""` once the line is exhausted.
    fn scan(&mut self) -> &'a str {
        let (word, rest) = split_word(self.rest);
        self.rest = rest;
        word
    }

    /// Returns the next word without consuming it.
    fn peek(&self) -> &'a str {
        split_word(self.rest).0
    }

    /// Scans an integer literal.
    fn scan_int(&mut self, operand: &'static str) -> i32 {
        match self.scan().parse::<i32>() {
            Ok(v) => v,
            Err(_) => {
                self.malformed.push(operand);
                MALFORMED_OPERAND
            }
        }
    }

    /// Scans a register index. Negative indices count as malformed.
    fn scan_register(&mut self, operand: &'static str) -> u32 {
        match self.scan().parse::<u32>() {
            Ok(v) => v,
            Err(_) => {
                self.malformed.push(operand);
                MALFORMED_OPERAND as u32
            }
        }
    }
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    s.split_at(end)
}

macro_rules! define_parse_operation {
    (
        $(
            $(#[$doc:meta])*
            $name:ident, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        /// Consumes the operands of `opcode` from the cursor, in source order.
        fn parse_operation(opcode: Opcode, cursor: &mut LineCursor<'_>) -> Operation {
            match opcode {
                $(
                    Opcode::$name => Operation::$name {
                        $(
                            $field: define_parse_operation!(@operand $kind, cursor, $field),
                        )*
                    },
                )*
            }
        }
    };

    (@operand Reg, $cursor:ident, $field:ident) => {
        $cursor.scan_register(stringify!($field))
    };

    (@operand Imm, $cursor:ident, $field:ident) => {
        $cursor.scan_int(stringify!($field))
    };

    (@operand Label, $cursor:ident, $field:ident) => {
        $cursor.scan().to_string()
    };
}

for_each_instruction!(define_parse_operation);

/// Returns whether `rest` holds every operand of `opcode` without degradation.
fn operands_complete(opcode: Opcode, rest: &str) -> bool {
    let mut trial = LineCursor::new(rest);
    parse_operation(opcode, &mut trial);
    trial.malformed.is_empty()
}

/// Mutable state threaded through one translation pass.
struct ParseContext<'a> {
    labels: &'a mut LabelTable,
    program: &'a mut Program,
    degradations: &'a mut Vec<Degradation>,
}

impl ParseContext<'_> {
    /// Translates one source line. `line_no` is 1-based.
    fn translate_line(&mut self, line_no: usize, line: &str) -> Result<(), SmlError> {
        let mut cursor = LineCursor::new(line);
        let first = cursor.scan();
        if first.is_empty() {
            return Ok(());
        }

        let next = cursor.peek();
        let first_opcode = Opcode::from_token(first);
        let (label, opcode_token) = if next.is_empty() {
            if first_opcode.is_none() {
                // Label-only line: names the next instruction appended.
                self.check_unique(first, line_no)?;
                self.labels.add_label(first, self.program.len());
                return Ok(());
            }
            ("", first)
        } else if first_opcode.is_some_and(|op| operands_complete(op, cursor.rest)) {
            ("", first)
        } else {
            (first, cursor.scan())
        };

        self.check_unique(label, line_no)?;

        let Some(opcode) = Opcode::from_token(opcode_token) else {
            let degradation = Degradation::UnknownOpcode {
                line: line_no,
                opcode: opcode_token.to_string(),
            };
            warn!("{degradation}");
            self.degradations.push(degradation);
            return Ok(());
        };

        let operation = parse_operation(opcode, &mut cursor);
        for operand in cursor.malformed.drain(..) {
            let degradation = Degradation::MalformedOperand {
                line: line_no,
                opcode,
                operand,
            };
            warn!("{degradation}");
            self.degradations.push(degradation);
        }

        self.labels.add_label(label, self.program.len());
        self.program.push(Instruction::new(label, operation));
        Ok(())
    }

    fn check_unique(&self, label: &str, line_no: usize) -> Result<(), SmlError> {
        if !label.is_empty() && self.labels.index_of(label).is_some() {
            return Err(SmlError::DuplicateLabel {
                label: label.to_string(),
                line: line_no,
            });
        }
        Ok(())
    }
}

/// Where a translator reads its source lines from.
#[derive(Clone, Debug)]
enum Origin {
    File(PathBuf),
    Text { name: String, text: String },
}

/// Translator for one SML source.
///
/// [`Translator::read_and_translate`] can be called repeatedly; every call
/// resets the label table and program first, so translating unchanged input
/// twice yields identical results.
#[derive(Clone, Debug)]
pub struct Translator {
    origin: Origin,
    degradations: Vec<Degradation>,
}

impl Translator {
    /// Translator reading from a file on every run.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::File(path.into()),
            degradations: Vec::new(),
        }
    }

    /// Translator over in-memory source text.
    pub fn from_source(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Text {
                name: "<source>".to_string(),
                text: text.into(),
            },
            degradations: Vec::new(),
        }
    }

    /// Name used in diagnostics: the file path or `<source>`.
    pub fn name(&self) -> Cow<'_, str> {
        match &self.origin {
            Origin::File(path) => path.to_string_lossy(),
            Origin::Text { name, .. } => Cow::Borrowed(name.as_str()),
        }
    }

    /// Degradations recorded by the last run.
    pub fn degradations(&self) -> &[Degradation] {
        &self.degradations
    }

    /// Translates the source into `labels` and `program`.
    ///
    /// Both are cleared first. On failure they are left empty and a
    /// compiler-style diagnostic is logged.
    pub fn read_and_translate(
        &mut self,
        labels: &mut LabelTable,
        program: &mut Program,
    ) -> Result<(), SmlError> {
        labels.reset();
        program.clear();
        self.degradations.clear();

        let source = load(&self.origin).inspect_err(|e| error!("{e}"))?;
        let mut ctx = ParseContext {
            labels: &mut *labels,
            program: &mut *program,
            degradations: &mut self.degradations,
        };

        let result = source
            .lines()
            .enumerate()
            .try_for_each(|(i, line)| ctx.translate_line(i + 1, line));

        if let Err(err) = &result {
            labels.reset();
            program.clear();
            error!("{}", render_diagnostic(&self.name(), &source, err));
        }
        result
    }
}

fn load(origin: &Origin) -> Result<Cow<'_, str>, SmlError> {
    match origin {
        Origin::File(path) => read_source(path).map(Cow::Owned),
        Origin::Text { text, .. } => Ok(Cow::Borrowed(text.as_str())),
    }
}

fn read_source(path: &Path) -> Result<String, SmlError> {
    fs::read_to_string(path).map_err(|source| SmlError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Formats a compiler-style diagnostic for a translation failure.
fn render_diagnostic(file: &str, source: &str, err: &SmlError) -> String {
    let mut diag = String::new();
    let _ = writeln!(diag, "error: {err}");
    let Some(line) = err.line() else {
        return diag;
    };
    let _ = writeln!(diag, " --> {file}:{line}");
    if let Some(raw_line) = source.lines().nth(line.saturating_sub(1)) {
        let _ = writeln!(diag, "  |");
        let _ = writeln!(diag, "{:>4} | {}", line, raw_line.trim_end_matches('\r'));
        let _ = writeln!(diag, "  |");
    }
    diag
}

fn translate(mut translator: Translator) -> Result<Translation, SmlError> {
    let mut labels = LabelTable::new();
    let mut program = Program::new();
    translator.read_and_translate(&mut labels, &mut program)?;
    Ok(Translation {
        labels,
        program,
        degradations: translator.degradations,
    })
}

/// Translates a full source string.
pub fn translate_source(source: impl Into<String>) -> Result<Translation, SmlError> {
    translate(Translator::from_source(source))
}

/// Convenience: translate directly from a file path.
pub fn translate_file<P: AsRef<Path>>(path: P) -> Result<Translation, SmlError> {
    translate(Translator::from_file(path.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn translated(source: &str) -> Translation {
        translate_source(source).expect("translation failed")
    }

    fn operation(t: &Translation, pc: usize) -> &Operation {
        t.program[pc].operation()
    }

    #[test]
    fn split_word_handles_tabs_and_padding() {
        assert_eq!(split_word("  add\t1 2"), ("add", "\t1 2"));
        assert_eq!(split_word("   "), ("", ""));
        assert_eq!(split_word("x"), ("x", ""));
    }

    #[test]
    fn cursor_scans_words_then_empty() {
        let mut cursor = LineCursor::new(" f0  lin 1 ");
        assert_eq!(cursor.peek(), "f0");
        assert_eq!(cursor.scan(), "f0");
        assert_eq!(cursor.scan(), "lin");
        assert_eq!(cursor.scan_int("value"), 1);
        assert_eq!(cursor.scan(), "");
        assert_eq!(cursor.scan_int("value"), MALFORMED_OPERAND);
        assert_eq!(cursor.malformed, vec!["value"]);
    }

    #[test]
    fn translate_labeled_program() {
        let t = translated("f0 lin 1 10\nf1 lin 2 3\nf2 sub 3 1 2\nf3 out 3\n");
        assert_eq!(t.program.len(), 4);
        assert_eq!(t.labels.len(), 4);
        assert_eq!(t.labels.index_of("f2"), Some(2));
        assert_eq!(
            operation(&t, 2),
            &Operation::Sub {
                result: 3,
                op1: 1,
                op2: 2
            }
        );
        assert!(t.degradations.is_empty());
    }

    #[test]
    fn translate_unlabeled_lines() {
        let t = translated("lin 1 5\nout 1\nbnz 1 f0\n");
        assert_eq!(t.program.len(), 3);
        assert!(t.labels.is_empty());
        assert_eq!(t.program[0].label(), "");
        assert_eq!(
            operation(&t, 2),
            &Operation::Bnz {
                register: 1,
                target: "f0".into()
            }
        );
    }

    #[test]
    fn label_named_like_an_opcode() {
        let t = translated("out out 1\n");
        assert_eq!(t.program.len(), 1);
        assert_eq!(t.program[0].label(), "out");
        assert_eq!(t.labels.index_of("out"), Some(0));
    }

    #[test]
    fn opcode_followed_by_unknown_opcode_is_a_label() {
        let t = translated("out foo 1\n");
        assert!(t.program.is_empty());
        assert!(t.labels.is_empty());
        assert_eq!(
            t.degradations,
            vec![Degradation::UnknownOpcode {
                line: 1,
                opcode: "foo".into()
            }]
        );
    }

    #[test]
    fn opcode_with_incomplete_operands_is_a_label() {
        let t = translated("add 1 2\nlin 3 4\n");
        assert_eq!(t.program.len(), 1);
        assert_eq!(t.program[0].opcode(), Opcode::Lin);
        assert_eq!(t.labels.index_of("add"), None);
        assert_eq!(
            t.degradations,
            vec![Degradation::UnknownOpcode {
                line: 1,
                opcode: "1".into()
            }]
        );
    }

    #[test]
    fn operands_complete_checks_every_operand() {
        assert!(operands_complete(Opcode::Add, " 1 2 3"));
        assert!(operands_complete(Opcode::Bnz, " 1 loop"));
        assert!(!operands_complete(Opcode::Add, " 1 2"));
        assert!(!operands_complete(Opcode::Out, " foo 1"));
        assert!(!operands_complete(Opcode::Lin, " 1 x"));
    }

    #[test]
    fn opcode_casing_is_normalized() {
        let t = translated("f0 LIN 1 2\nf1 Out 1\n");
        assert_eq!(t.program[0].opcode(), Opcode::Lin);
        assert_eq!(t.program[1].opcode(), Opcode::Out);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let t = translated("\n   \n\t\nf0 out 1\n\n");
        assert_eq!(t.program.len(), 1);
    }

    #[test]
    fn label_only_line_names_next_instruction() {
        let t = translated("f0 lin 1 1\nloop\nf1 out 1\nend\n");
        assert_eq!(t.program.len(), 2);
        assert_eq!(t.labels.index_of("loop"), Some(1));
        assert_eq!(t.labels.index_of("f1"), Some(1));
        assert_eq!(t.labels.index_of("end"), Some(2));
    }

    #[test]
    fn duplicate_label_fails() {
        let err = translate_source("f0 lin 1 1\nf0 out 1\n").unwrap_err();
        assert!(matches!(
            err,
            SmlError::DuplicateLabel { ref label, line: 2 } if label == "f0"
        ));
    }

    #[test]
    fn duplicate_label_only_line_fails() {
        let err = translate_source("f0\nf0 out 1\n").unwrap_err();
        assert!(matches!(err, SmlError::DuplicateLabel { line: 2, .. }));
    }

    #[test]
    fn duplicate_label_leaves_program_empty() {
        let mut translator = Translator::from_source("f0 lin 1 1\nf1 out 1\nf0 out 1\n");
        let mut labels = LabelTable::new();
        let mut program = Program::new();
        assert!(translator.read_and_translate(&mut labels, &mut program).is_err());
        assert!(program.is_empty());
        assert!(labels.is_empty());
    }

    #[test]
    fn unknown_opcode_drops_line() {
        let t = translated("f0 lin 1 1\nf1 mov 2 1\nf2 out 1\n");
        assert_eq!(t.program.len(), 2);
        assert_eq!(t.labels.index_of("f1"), None);
        assert_eq!(t.labels.index_of("f2"), Some(1));
        assert_eq!(
            t.degradations,
            vec![Degradation::UnknownOpcode {
                line: 2,
                opcode: "mov".into()
            }]
        );
    }

    #[test]
    fn missing_operand_becomes_sentinel() {
        let t = translated("f0 add 1 2\n");
        assert_eq!(
            operation(&t, 0),
            &Operation::Add {
                result: 1,
                op1: 2,
                op2: MALFORMED_OPERAND as u32
            }
        );
        assert_eq!(
            t.degradations,
            vec![Degradation::MalformedOperand {
                line: 1,
                opcode: Opcode::Add,
                operand: "op2"
            }]
        );
    }

    #[test]
    fn unparsable_operands_become_sentinel() {
        let t = translated("f0 lin r1 x\nf1 out -3\n");
        assert_eq!(
            operation(&t, 0),
            &Operation::Lin {
                register: MALFORMED_OPERAND as u32,
                value: MALFORMED_OPERAND
            }
        );
        assert_eq!(
            operation(&t, 1),
            &Operation::Out {
                register: MALFORMED_OPERAND as u32
            }
        );
        assert_eq!(t.degradations.len(), 3);
    }

    #[test]
    fn negative_literal_is_accepted() {
        let t = translated("f0 lin 4 -12\n");
        assert_eq!(
            operation(&t, 0),
            &Operation::Lin {
                register: 4,
                value: -12
            }
        );
        assert!(t.degradations.is_empty());
    }

    #[test]
    fn bare_opcode_line_is_an_instruction() {
        let t = translated("out\n");
        assert_eq!(t.program.len(), 1);
        assert!(t.labels.is_empty());
        assert_eq!(t.degradations.len(), 1);
    }

    #[test]
    fn missing_branch_target_is_empty() {
        let t = translated("f0 bnz 1\n");
        assert_eq!(
            operation(&t, 0),
            &Operation::Bnz {
                register: 1,
                target: String::new()
            }
        );
    }

    #[test]
    fn extra_tokens_are_ignored() {
        let t = translated("f0 out 1 2 3\n");
        assert_eq!(operation(&t, 0), &Operation::Out { register: 1 });
    }

    #[test]
    fn crlf_line_endings() {
        let t = translated("f0 lin 1 7\r\nf1 out 1\r\n");
        assert_eq!(t.program.len(), 2);
        assert!(t.degradations.is_empty());
    }

    #[test]
    fn program_length_counts_recognized_opcodes() {
        let source = "a lin 1 1\n\nb foo 1\nc\nd out 1\ne mul 1 1 1\n";
        let t = translated(source);
        assert_eq!(t.program.len(), 3);
    }

    #[test]
    fn retranslation_is_idempotent() {
        let mut translator = Translator::from_source("f0 lin 1 3\nloop\nf1 out 1\nf2 bnz 1 loop\n");
        let mut labels = LabelTable::new();
        let mut program = Program::new();
        translator.read_and_translate(&mut labels, &mut program).unwrap();
        let (first_labels, first_program) = (labels.clone(), program.clone());

        translator.read_and_translate(&mut labels, &mut program).unwrap();
        assert_eq!(labels, first_labels);
        assert_eq!(program, first_program);
    }

    #[test]
    fn translate_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "f0 lin 1 6").unwrap();
        writeln!(file, "f1 out 1").unwrap();
        let t = translate_file(file.path()).unwrap();
        assert_eq!(t.program.len(), 2);
        assert_eq!(t.program.listing(), "f0: lin register 1 value is 6\nf1: out register 1\n");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.sml");
        assert!(matches!(translate_file(&path), Err(SmlError::Io { .. })));
    }

    #[test]
    fn io_error_clears_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut translator = Translator::from_file(dir.path().join("missing.sml"));
        let mut labels = LabelTable::new();
        let mut program = Program::new();
        labels.add_label("stale", 0);
        assert!(translator.read_and_translate(&mut labels, &mut program).is_err());
        assert!(labels.is_empty());
    }

    #[test]
    fn diagnostic_points_at_line() {
        let source = "f0 lin 1 1\nf0 out 1\n";
        let err = translate_source(source).unwrap_err();
        let diag = render_diagnostic("prog.sml", source, &err);
        assert!(diag.starts_with("error: line 2: duplicate label: f0\n"));
        assert!(diag.contains(" --> prog.sml:2\n"));
        assert!(diag.contains("   2 | f0 out 1\n"));
    }

    #[test]
    fn degradation_display() {
        let d = Degradation::UnknownOpcode {
            line: 4,
            opcode: "jmp".into(),
        };
        assert_eq!(d.to_string(), "line 4: unknown opcode `jmp`, line skipped");
        assert_eq!(d.line(), 4);
    }
}
