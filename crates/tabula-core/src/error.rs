//! Error types for Tabula core.

use tabula_engine::engine::{CellRef, FormulaError};
use tabula_engine::script::{Flow, ScriptError};
use thiserror::Error;

/// Errors that can occur while editing a document or running scripts
#[derive(Error, Debug)]
pub enum TabulaError {
    #[error("{0}")]
    Script(#[from] ScriptError),

    #[error("Formula error: {0}")]
    Formula(#[from] FormulaError),

    #[error("Circular dependency detected: {}", format_path(.0))]
    CircularDependency(Vec<CellRef>),

    #[error("Invalid cell reference \"{0}\"")]
    InvalidCellRef(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

fn format_path(path: &[CellRef]) -> String {
    path.iter()
        .map(CellRef::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Host procedures report document failures as script errors.
impl From<TabulaError> for Flow {
    fn from(e: TabulaError) -> Self {
        match e {
            TabulaError::Script(e) => Flow::Error(e),
            other => Flow::Error(ScriptError::Host(other.to_string())),
        }
    }
}

pub type Result<T> = std::result::Result<T, TabulaError>;
