//! Embedded command language.
//!
//! - [`Tokenizer`] - Splits script text into word pieces
//! - [`Interp`] - Evaluates scripts against a frame stack and procedure registry
//! - [`Registry`], [`Procedure`] - Native and scripted procedures, looked up by name
//! - [`evaluate_expr`] - Arithmetic for `expr`, `if`, `while` and `for`
//! - [`parse_list`], [`format_list`] - List values

mod builtins;
mod error;
mod expr;
mod frame;
mod interp;
mod list;
mod registry;
pub mod token;

pub use error::{EvalResult, Flow, ReturnCode, ScriptError};
pub use expr::{ExprError, evaluate_expr};
pub use frame::{CallFrame, FrameStack};
pub use interp::{DEFAULT_MAX_DEPTH, FrameGuard, Interp};
pub use list::{format_list, parse_list};
pub use registry::{NativeFn, Procedure, ProcedureInfo, Registry, ScriptedProc};
pub use token::{Token, TokenKind, Tokenizer};
