use thiserror::Error;

/// Errors that can occur during translation or execution.
///
/// Malformed operands and unknown opcodes are not listed here: the translator
/// degrades on those instead of failing (see
/// [`Degradation`](crate::virtual_machine::translator::Degradation)).
#[derive(Debug, Error)]
pub enum SmlError {
    /// Label defined more than once.
    #[error("line {line}: duplicate label: {label}")]
    DuplicateLabel { label: String, line: usize },
    /// Branch to a label that is not in the label table.
    #[error("unresolved branch target: {label}")]
    UnresolvedBranchTarget { label: String },
    /// Division by zero.
    #[error("arithmetic fault: division by zero in `{instruction}`")]
    ArithmeticFault { instruction: String },
    /// The source could not be opened or read.
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Invalid command-line or environment configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SmlError {
    /// Returns the 1-based source line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            SmlError::DuplicateLabel { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Returns whether the error aborted a translation. The translator has
    /// already logged a diagnostic for these.
    pub fn is_translation_failure(&self) -> bool {
        matches!(self, SmlError::DuplicateLabel { .. } | SmlError::Io { .. })
    }
}
