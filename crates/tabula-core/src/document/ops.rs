use std::collections::HashSet;

use super::{Document, MAX_EVAL_DEPTH, UndoAction};
use crate::error::{Result, TabulaError};
use tabula_engine::engine::{
    Cell, CellRef, CellSource, CellType, FormulaError, FormulaResult, detect_cycle,
    format_cell_number, try_evaluate_formula,
};
use tracing::debug;

impl Document {
    /// Drop the cached values of the changed cell and everything that
    /// (transitively) reads from it.
    fn invalidate_dependents(&self, changed_cell: &CellRef) {
        let mut to_process = vec![*changed_cell];
        let mut visited = HashSet::new();
        while let Some(cell_ref) = to_process.pop() {
            if !visited.insert(cell_ref) {
                continue;
            }
            self.value_cache.remove(&cell_ref);
            if let Some(deps) = self.dependents.get(&cell_ref) {
                to_process.extend(deps.iter().copied());
            }
        }
    }

    /// Push an undo action before modifying a cell
    fn push_undo(&mut self, cell_ref: CellRef, new_cell: Option<Cell>) {
        let old_cell = self.grid.get(&cell_ref).map(|r| r.clone());
        self.undo_stack.push(UndoAction {
            cell_ref,
            old_cell,
            new_cell,
        });
        self.redo_stack.clear();
        if self.undo_stack.len() > super::state::MAX_UNDO_STACK {
            self.undo_stack.remove(0);
        }
    }

    /// Replace a cell, keeping the reverse dependency map and value cache
    /// in step with the grid.
    fn apply_cell_state(&mut self, cell_ref: CellRef, state: Option<Cell>) {
        let old_deps = self
            .grid
            .get(&cell_ref)
            .map(|cell| cell.depends_on.clone())
            .unwrap_or_default();
        for dep in old_deps {
            if let Some(users) = self.dependents.get_mut(&dep) {
                users.remove(&cell_ref);
                if users.is_empty() {
                    self.dependents.remove(&dep);
                }
            }
        }

        match state {
            Some(cell) => {
                for dep in &cell.depends_on {
                    self.dependents.entry(*dep).or_default().insert(cell_ref);
                }
                self.grid.insert(cell_ref, cell);
            }
            None => {
                self.grid.remove(&cell_ref);
            }
        }
        self.invalidate_dependents(&cell_ref);
    }

    /// Set cell contents from input text.
    ///
    /// Text starting with `=` is a formula, numeric text is a number, and
    /// blank text clears the cell. A formula that would make the cell depend
    /// on itself is rejected and the cell keeps its old contents.
    pub fn set_cell_text(&mut self, cell_ref: CellRef, input: &str) -> Result<()> {
        let cell = Cell::from_input(input);
        if cell.contents == CellType::Empty {
            self.clear_cell(&cell_ref);
            return Ok(());
        }

        if cell.is_formula() {
            // Temporarily insert to check for cycles
            let old_cell = self.grid.get(&cell_ref).map(|r| r.clone());
            self.grid.insert(cell_ref, cell.clone());
            let cycle = detect_cycle(&cell_ref, &self.grid);
            match old_cell {
                Some(old) => {
                    self.grid.insert(cell_ref, old);
                }
                None => {
                    self.grid.remove(&cell_ref);
                }
            }
            if let Some(path) = cycle {
                debug!(cell = %cell_ref, "rejected circular formula");
                return Err(TabulaError::CircularDependency(path));
            }
        }

        self.push_undo(cell_ref, Some(cell.clone()));
        self.apply_cell_state(cell_ref, Some(cell));
        Ok(())
    }

    /// Raw text of a cell, as it would be typed back in. Empty for missing cells.
    pub fn cell_text(&self, cell_ref: &CellRef) -> String {
        self.grid
            .get(cell_ref)
            .map(|cell| cell.to_input_string())
            .unwrap_or_default()
    }

    /// Clear the specified cell
    pub fn clear_cell(&mut self, cell_ref: &CellRef) {
        if self.grid.get(cell_ref).is_some() {
            self.push_undo(*cell_ref, None);
            self.apply_cell_state(*cell_ref, None);
        }
    }

    /// Text shown for a cell in a grid view.
    pub fn cell_display(&self, cell_ref: &CellRef) -> String {
        let Some(cell) = self.grid.get(cell_ref).map(|r| r.clone()) else {
            return String::new();
        };
        match cell.contents {
            CellType::Empty => String::new(),
            CellType::Text(text) => text,
            CellType::Number(n) => format_cell_number(n),
            CellType::Formula(_) => match self.cell_value(*cell_ref) {
                Ok(n) => format_cell_number(n),
                Err(_) => "#ERR!".to_string(),
            },
        }
    }

    /// Numeric value of a cell as scripts see it.
    ///
    /// A formula that fails to evaluate reads as 0.0, except that nesting
    /// deeper than [`MAX_EVAL_DEPTH`] is an error.
    pub fn numeric_value(&self, cell_ref: CellRef) -> Result<f64> {
        match self.cell_value(cell_ref) {
            Ok(value) => Ok(value),
            Err(e @ FormulaError::RecursionLimit(_)) => Err(e.into()),
            Err(e) => {
                debug!(cell = %cell_ref, error = %e, "formula evaluation failed");
                Ok(0.0)
            }
        }
    }

    pub fn undo(&mut self) -> Result<()> {
        let action = self.undo_stack.pop().ok_or(TabulaError::NothingToUndo)?;
        let current = self.grid.get(&action.cell_ref).map(|r| r.clone());
        self.redo_stack.push(UndoAction {
            cell_ref: action.cell_ref,
            old_cell: action.old_cell.clone(),
            new_cell: current,
        });
        self.apply_cell_state(action.cell_ref, action.old_cell);
        Ok(())
    }

    pub fn redo(&mut self) -> Result<()> {
        let action = self.redo_stack.pop().ok_or(TabulaError::NothingToRedo)?;
        let current = self.grid.get(&action.cell_ref).map(|r| r.clone());
        self.undo_stack.push(UndoAction {
            cell_ref: action.cell_ref,
            old_cell: current,
            new_cell: action.new_cell.clone(),
        });
        self.apply_cell_state(action.cell_ref, action.new_cell);
        Ok(())
    }

    pub fn cursor(&self) -> CellRef {
        self.cursor
    }

    pub fn set_cursor(&mut self, cell_ref: CellRef) {
        self.cursor = cell_ref;
    }

    /// Move the cursor by a relative offset, stopping at the first row and column.
    pub fn move_cursor(&mut self, dcol: i64, drow: i64) {
        self.cursor = self.cursor.offset(dcol, drow);
    }

    pub fn flash_message(&mut self, message: impl Into<String>) {
        self.flash = Some(message.into());
    }

    pub fn flash(&self) -> Option<&str> {
        self.flash.as_deref()
    }

    /// Remove and return the pending flash message.
    pub fn take_flash(&mut self) -> Option<String> {
        self.flash.take()
    }
}

/// Formula evaluation reads cells lazily from the grid. Missing, empty and
/// text cells are 0.0; formula cells are evaluated on demand and cached until
/// a cell they read from changes.
impl CellSource for Document {
    fn cell_value(&self, at: CellRef) -> FormulaResult<f64> {
        let postfix = match self.grid.get(&at) {
            None => return Ok(0.0),
            Some(cell) => match &cell.contents {
                CellType::Number(n) => return Ok(*n),
                CellType::Empty | CellType::Text(_) => return Ok(0.0),
                CellType::Formula(_) => cell.postfix.clone(),
            },
        };
        if let Some(value) = self.value_cache.get(&at).map(|v| *v) {
            return Ok(value);
        }

        let depth = self.eval_depth.get();
        if depth >= MAX_EVAL_DEPTH {
            debug!(cell = %at, limit = MAX_EVAL_DEPTH, "formula nesting too deep");
            return Err(FormulaError::RecursionLimit(MAX_EVAL_DEPTH));
        }
        self.eval_depth.set(depth + 1);
        let value = try_evaluate_formula(&postfix, self);
        self.eval_depth.set(depth);

        let value = value?;
        self.value_cache.insert(at, value);
        Ok(value)
    }

    fn has_value(&self, at: CellRef) -> bool {
        self.grid
            .get(&at)
            .is_some_and(|cell| cell.contents != CellType::Empty)
    }
}
