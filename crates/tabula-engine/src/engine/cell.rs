//! Cell data structures for the spreadsheet grid.
//!
//! - [`CellType`] - The type of content in a cell (empty, text, number, or formula)
//! - [`Cell`] - A cell with content, its parsed formula and dependencies
//! - [`Grid`] - Sparse storage for cells (backed by `DashMap`)

use dashmap::DashMap;

use super::cell_ref::CellRef;
use super::deps::extract_dependencies;
use super::{Expr, parse_formula};

/// The type of content stored in a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellType {
    Empty,
    Text(String),
    Number(f64),
    /// Formula text without the leading '='.
    Formula(String),
}

/// A cell in the spreadsheet grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub contents: CellType,
    /// Postfix form of a formula cell. Empty when the formula failed to parse.
    pub postfix: Vec<Expr>,
    pub depends_on: Vec<CellRef>,
}

impl Cell {
    pub fn new_empty() -> Cell {
        Cell {
            contents: CellType::Empty,
            postfix: vec![],
            depends_on: vec![],
        }
    }

    pub fn new_text(text: &str) -> Cell {
        Cell {
            contents: CellType::Text(text.to_string()),
            postfix: vec![],
            depends_on: vec![],
        }
    }

    pub fn new_number(n: f64) -> Cell {
        Cell {
            contents: CellType::Number(n),
            postfix: vec![],
            depends_on: vec![],
        }
    }

    /// Create a new cell containing a formula.
    /// The formula is parsed once here; dependencies come from the postfix form.
    pub fn new_formula(formula: &str) -> Cell {
        let postfix = parse_formula(formula);
        Cell {
            depends_on: extract_dependencies(&postfix),
            postfix,
            contents: CellType::Formula(formula.to_string()),
        }
    }

    /// Parse user input and create appropriate cell type.
    /// - Empty string or whitespace -> Empty
    /// - Starts with '=' -> Formula (without the '=')
    /// - Quoted string -> Text (without quotes)
    /// - Valid number -> Number
    /// - Otherwise -> Text
    pub fn from_input(input: &str) -> Cell {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Cell::new_empty();
        }

        if let Some(formula) = trimmed.strip_prefix('=') {
            return Cell::new_formula(formula);
        }

        if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
            let text = &trimmed[1..trimmed.len() - 1];
            return Cell::new_text(text);
        }

        if let Ok(n) = trimmed.parse::<f64>() {
            return Cell::new_number(n);
        }

        Cell::new_text(trimmed)
    }

    /// Get the raw text of the cell (for editing).
    pub fn to_input_string(&self) -> String {
        match &self.contents {
            CellType::Empty => String::new(),
            CellType::Text(s) => s.clone(),
            CellType::Number(n) => n.to_string(),
            CellType::Formula(s) => format!("={}", s),
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.contents, CellType::Formula(_))
    }
}

/// Sparse grid storage.
pub type Grid = DashMap<CellRef, Cell>;
