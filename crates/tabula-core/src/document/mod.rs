//! Document state and logic (UI-agnostic).

mod ops;
mod script;
mod state;

pub use script::{DEFAULT_BINDINGS, Session, binding_name};
pub use state::{Document, MAX_EVAL_DEPTH, UndoAction};
