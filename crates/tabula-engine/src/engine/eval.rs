//! Stack-machine evaluation of postfix formulas against live cell data.
//!
//! The value stack holds [`Expr`] nodes rather than numbers so that cell
//! references resolve lazily and a range stays deferred until the function
//! consuming it pops it.

use std::collections::HashMap;

use tracing::warn;

use super::{CellRef, Expr, FormulaError, FormulaResult, FunctionKind, OperatorKind};

/// Upper bound on the number of cells an aggregate may visit.
pub const MAX_RANGE_CELLS: usize = 1_000_000;

/// Read access to cell values for formula evaluation.
///
/// Missing or non-numeric cells resolve to 0.0. A cell whose own formula
/// fails reports the error, which fails the formula reading it.
pub trait CellSource {
    fn cell_value(&self, at: CellRef) -> FormulaResult<f64>;

    /// Whether the cell holds anything at all. Used by `COUNT` and `AVG`.
    fn has_value(&self, at: CellRef) -> bool {
        let _ = at;
        true
    }
}

impl CellSource for HashMap<CellRef, f64> {
    fn cell_value(&self, at: CellRef) -> FormulaResult<f64> {
        Ok(self.get(&at).copied().unwrap_or(0.0))
    }

    fn has_value(&self, at: CellRef) -> bool {
        self.contains_key(&at)
    }
}

fn scalar(node: Expr, cells: &impl CellSource) -> FormulaResult<f64> {
    match node {
        Expr::Constant(n) => Ok(n),
        Expr::CellRef(at) => cells.cell_value(at),
        Expr::Operator(OperatorKind::Range) => {
            Err(FormulaError::Eval("range used outside a function".to_string()))
        }
        other => Err(FormulaError::Eval(format!("'{}' is not a value", other))),
    }
}

fn pop(stack: &mut Vec<Expr>) -> FormulaResult<Expr> {
    stack
        .pop()
        .ok_or_else(|| FormulaError::Eval("operand stack underflow".to_string()))
}

fn pop_cell(stack: &mut Vec<Expr>) -> FormulaResult<CellRef> {
    match pop(stack)? {
        Expr::CellRef(at) => Ok(at),
        other => Err(FormulaError::Eval(format!(
            "range bound '{}' is not a cell",
            other
        ))),
    }
}

/// Pop `start end :` off the stack and return the ordered rectangle.
fn pop_range(stack: &mut Vec<Expr>) -> FormulaResult<(CellRef, CellRef)> {
    match pop(stack)? {
        Expr::Operator(OperatorKind::Range) => {}
        other => {
            return Err(FormulaError::Eval(format!(
                "expected a range argument, found '{}'",
                other
            )));
        }
    }
    let end = pop_cell(stack)?;
    let start = pop_cell(stack)?;
    if start.col > end.col || start.row > end.row {
        return Err(FormulaError::ReversedRange { start, end });
    }
    let cols = end.col - start.col + 1;
    let rows = end.row - start.row + 1;
    match cols.checked_mul(rows) {
        Some(n) if n <= MAX_RANGE_CELLS => Ok((start, end)),
        _ => Err(FormulaError::Eval(format!(
            "range {}:{} is too large",
            start, end
        ))),
    }
}

/// Sum and count the non-empty cells of an inclusive rectangle.
fn aggregate(
    start: CellRef,
    end: CellRef,
    cells: &impl CellSource,
) -> FormulaResult<(f64, usize)> {
    let mut sum = 0.0;
    let mut count = 0;
    for row in start.row..=end.row {
        for col in start.col..=end.col {
            let at = CellRef::new(col, row);
            if cells.has_value(at) {
                sum += cells.cell_value(at)?;
                count += 1;
            }
        }
    }
    Ok((sum, count))
}

/// Evaluate a postfix formula.
pub fn try_evaluate_formula(postfix: &[Expr], cells: &impl CellSource) -> FormulaResult<f64> {
    let mut stack: Vec<Expr> = Vec::with_capacity(postfix.len());

    for &node in postfix {
        match node {
            Expr::Constant(_) | Expr::CellRef(_) | Expr::Operator(OperatorKind::Range) => {
                stack.push(node)
            }
            Expr::Operator(op) => {
                let rhs = scalar(pop(&mut stack)?, cells)?;
                let lhs = scalar(pop(&mut stack)?, cells)?;
                let value = op
                    .apply(lhs, rhs)
                    .ok_or_else(|| FormulaError::Eval(format!("cannot apply '{}'", node)))?;
                stack.push(Expr::Constant(value));
            }
            Expr::Function(func @ (FunctionKind::Sum | FunctionKind::Avg | FunctionKind::Count)) => {
                let (start, end) = pop_range(&mut stack)?;
                let (sum, count) = aggregate(start, end, cells)?;
                let value = match func {
                    FunctionKind::Sum => sum,
                    FunctionKind::Avg => sum / count as f64,
                    _ => count as f64,
                };
                stack.push(Expr::Constant(value));
            }
            Expr::Function(func @ (FunctionKind::Min | FunctionKind::Max)) => {
                let rhs = scalar(pop(&mut stack)?, cells)?;
                let lhs = scalar(pop(&mut stack)?, cells)?;
                let value = if func == FunctionKind::Min {
                    lhs.min(rhs)
                } else {
                    lhs.max(rhs)
                };
                stack.push(Expr::Constant(value));
            }
        }
    }

    if stack.len() != 1 {
        return Err(FormulaError::StackDepth(stack.len()));
    }
    scalar(pop(&mut stack)?, cells)
}

/// Evaluate a postfix formula, logging any failure and returning 0.0.
///
/// 0.0 on its own does not mean success; use [`try_evaluate_formula`] when
/// the distinction matters.
pub fn evaluate_formula(postfix: &[Expr], cells: &impl CellSource) -> f64 {
    match try_evaluate_formula(postfix, cells) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "formula evaluation failed");
            0.0
        }
    }
}
