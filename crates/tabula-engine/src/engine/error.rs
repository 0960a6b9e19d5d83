//! Formula error types

use thiserror::Error;

use super::CellRef;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while tokenizing, parsing or evaluating a formula
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FormulaError {
    #[error("Malformed token at offset {offset}: {text:?}")]
    Lex { offset: usize, text: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Missing start parenthesis")]
    MissingStartParenthesis,

    #[error("Misplaced parenthesis or comma")]
    MisplacedSeparator,

    #[error("Unmatched parenthesis")]
    UnmatchedParenthesis,

    #[error("Evaluation error: {0}")]
    Eval(String),

    #[error("Reversed range {start}:{end}")]
    ReversedRange { start: CellRef, end: CellRef },

    #[error("Formula left {0} values on the stack")]
    StackDepth(usize),

    #[error("Formula nesting exceeds {0} levels")]
    RecursionLimit(usize),
}
