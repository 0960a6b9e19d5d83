//! Spreadsheet formula engine API.
//!
//! - [`CellRef`] - Cell reference parsing (A1 notation ↔ column/row indices)
//! - [`Cell`], [`CellType`], [`Grid`] - Data structures for cell storage
//! - [`Expr`] - Postfix formula nodes, with the operator and function tables
//! - [`try_parse_formula`] - Shunting-yard parse of formula text
//! - [`try_evaluate_formula`] - Stack-machine evaluation against a [`CellSource`]
//! - [`extract_dependencies`], [`detect_cycle`] - Dependency graph support
//! - [`format_number`] - Format values for display

mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod error;
mod eval;
mod expr;
mod format;
mod parser;
pub mod token;

pub use cell::{Cell, CellType, Grid};
pub use cell_ref::CellRef;
pub use cycle::detect_cycle;
pub use deps::extract_dependencies;
pub use error::{FormulaError, FormulaResult};
pub use eval::{CellSource, MAX_RANGE_CELLS, evaluate_formula, try_evaluate_formula};
pub use expr::{
    Arity, Expr, FUNCTIONS, FunctionInfo, FunctionKind, OPERATORS, OperatorInfo, OperatorKind,
};
pub use format::{format_cell_number, format_number};
pub use parser::{parse_formula, to_formula_text, try_parse_formula};
