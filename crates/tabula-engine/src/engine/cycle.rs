//! Circular dependency detection for formula cells.
//!
//! When a formula is entered, we must verify it doesn't create a cycle
//! (e.g., A1 references B1, B1 references C1, C1 references A1).
//! This module uses depth-first search to detect such cycles before
//! they cause runaway evaluation.

use std::collections::HashSet;

use super::{CellRef, Grid};

/// Detect circular dependencies starting from a cell.
/// Returns Some(cycle_path) if a cycle is found, None otherwise.
pub fn detect_cycle(start: &CellRef, grid: &Grid) -> Option<Vec<CellRef>> {
    let mut visiting = HashSet::new();
    let mut done = HashSet::new();
    let mut path = Vec::new();

    if detect_cycle_dfs(start, grid, &mut visiting, &mut done, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn detect_cycle_dfs(
    current: &CellRef,
    grid: &Grid,
    visiting: &mut HashSet<CellRef>,
    done: &mut HashSet<CellRef>,
    path: &mut Vec<CellRef>,
) -> bool {
    if visiting.contains(current) {
        path.push(*current);
        return true;
    }
    if done.contains(current) {
        return false;
    }

    let deps = match grid.get(current) {
        Some(entry) => entry.depends_on.clone(),
        None => return false,
    };

    visiting.insert(*current);
    path.push(*current);

    for dep in &deps {
        if detect_cycle_dfs(dep, grid, visiting, done, path) {
            return true;
        }
    }

    path.pop();
    visiting.remove(current);
    done.insert(*current);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Cell;

    #[test]
    fn test_detects_three_cell_cycle() {
        let grid = Grid::new();
        grid.insert(CellRef::new(0, 0), Cell::from_input("=B1"));
        grid.insert(CellRef::new(1, 0), Cell::from_input("=C1"));
        grid.insert(CellRef::new(2, 0), Cell::from_input("=A1+1"));
        let cycle = detect_cycle(&CellRef::new(0, 0), &grid).unwrap();
        assert_eq!(cycle.first(), Some(&CellRef::new(0, 0)));
        assert_eq!(cycle.last(), Some(&CellRef::new(0, 0)));
    }

    #[test]
    fn test_shared_dependency_is_not_a_cycle() {
        let grid = Grid::new();
        grid.insert(CellRef::new(0, 0), Cell::from_input("=B1+B1"));
        grid.insert(CellRef::new(1, 0), Cell::from_input("=SUM(C1:C3)"));
        assert!(detect_cycle(&CellRef::new(0, 0), &grid).is_none());
    }
}
