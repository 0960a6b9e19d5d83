//! tabula-core - UI-agnostic document model and command session.

pub mod document;
pub mod error;

pub use document::{DEFAULT_BINDINGS, Document, Session, UndoAction};
pub use error::{Result, TabulaError};

pub use tabula_engine::engine::CellRef;
pub use tabula_engine::script::ReturnCode;
