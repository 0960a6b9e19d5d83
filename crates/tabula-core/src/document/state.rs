use std::collections::{HashMap, HashSet};

use dashmap::DashMap;
use tabula_engine::engine::{Cell, CellRef, Grid};

/// Maximum number of undo entries to keep
pub(crate) const MAX_UNDO_STACK: usize = 100;

/// Maximum number of formula cells evaluated inside one another
pub const MAX_EVAL_DEPTH: usize = 256;

/// Evaluated formula values, keyed by cell. Entries are dropped whenever a
/// cell they read from changes.
pub(crate) type ValueCache = DashMap<CellRef, f64>;

/// Represents an undoable action for a single cell
#[derive(Clone, Debug)]
pub struct UndoAction {
    pub cell_ref: CellRef,
    pub old_cell: Option<Cell>,
    pub new_cell: Option<Cell>,
}

/// UI-agnostic document state for the spreadsheet.
pub struct Document {
    /// The spreadsheet grid
    pub(crate) grid: Grid,
    /// Cell under the cursor
    pub(crate) cursor: CellRef,
    /// Status line message waiting to be shown
    pub(crate) flash: Option<String>,
    /// Undo stack
    pub(crate) undo_stack: Vec<UndoAction>,
    /// Redo stack
    pub(crate) redo_stack: Vec<UndoAction>,
    /// Reverse dependency map: cell -> cells that depend on it
    pub(crate) dependents: HashMap<CellRef, HashSet<CellRef>>,
    /// Computed values of formula cells
    pub(crate) value_cache: ValueCache,
    /// Formula cells currently being evaluated
    pub(crate) eval_depth: std::cell::Cell<usize>,
}

impl Document {
    /// Create an empty document with the cursor at A1.
    pub fn new() -> Self {
        Document {
            grid: Grid::new(),
            cursor: CellRef::new(0, 0),
            flash: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            dependents: HashMap::new(),
            value_cache: ValueCache::default(),
            eval_depth: std::cell::Cell::new(0),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
