//! Dependency extraction from parsed formulas.
//!
//! Walks a postfix sequence to find all cell references the formula reads.
//! This is used to build the dependency graph for cycle detection.
//!
//! Handles:
//! - Simple cell references: `A1`, `B2`
//! - Ranges in aggregate functions: `SUM(A1:B5)` expands to every cell

use super::cell_ref::CellRef;
use super::{Expr, OperatorKind};

const MAX_DEPENDENCY_RANGE_CELLS: usize = 1_000_000;

/// Extract all cell references from a postfix formula as dependencies.
pub fn extract_dependencies(postfix: &[Expr]) -> Vec<CellRef> {
    let mut deps = Vec::new();

    for (i, node) in postfix.iter().enumerate() {
        match node {
            Expr::CellRef(cell) => deps.push(*cell),
            Expr::Operator(OperatorKind::Range) if i >= 2 => {
                let (Expr::CellRef(start), Expr::CellRef(end)) = (postfix[i - 2], postfix[i - 1])
                else {
                    continue;
                };
                let min_row = start.row.min(end.row);
                let max_row = start.row.max(end.row);
                let min_col = start.col.min(end.col);
                let max_col = start.col.max(end.col);

                let row_count = max_row - min_row + 1;
                let col_count = max_col - min_col + 1;
                let Some(cell_count) = row_count.checked_mul(col_count) else {
                    continue;
                };
                if cell_count > MAX_DEPENDENCY_RANGE_CELLS {
                    continue;
                }

                // The two bounds were pushed as plain references; the
                // expansion below covers them.
                deps.truncate(deps.len().saturating_sub(2));
                for row in min_row..=max_row {
                    for col in min_col..=max_col {
                        deps.push(CellRef::new(col, row));
                    }
                }
            }
            _ => {}
        }
    }

    deps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::try_parse_formula;
    use pretty_assertions::assert_eq;

    fn deps(formula: &str) -> Vec<CellRef> {
        extract_dependencies(&try_parse_formula(formula).unwrap())
    }

    #[test]
    fn test_extract_dependencies_empty() {
        assert!(extract_dependencies(&[]).is_empty());
        assert!(deps("10 + 20").is_empty());
    }

    #[test]
    fn test_extract_dependencies_expands_ranges() {
        assert_eq!(
            deps("SUM(A1:B2) + C3"),
            vec![
                CellRef::new(0, 0),
                CellRef::new(1, 0),
                CellRef::new(0, 1),
                CellRef::new(1, 1),
                CellRef::new(2, 2),
            ]
        );
    }

    #[test]
    fn test_extract_dependencies_skips_over_limit_ranges() {
        assert_eq!(
            deps("SUM(A1:A1000001)+B2"),
            vec![CellRef::new(0, 0), CellRef::new(0, 1000000), CellRef::new(1, 1)]
        );
    }
}
