//! Shunting-yard transform of formula text into a postfix [`Expr`] sequence.
//!
//! The operator stack holds pending operators, `(` sentinels and function
//! markers. A function marker is emitted once the `)` closing its argument
//! list has been consumed.

use tracing::warn;

use super::token::{TokenKind, Tokenizer};
use super::{Arity, CellRef, Expr, FormulaError, FormulaResult, FunctionKind, OperatorKind};

#[derive(Clone, Copy, Debug)]
enum Pending {
    Operator(OperatorKind),
    Function(FunctionKind),
    LeftParenthesis,
}

/// Parse formula text (with or without the leading `=`) into postfix form.
pub fn try_parse_formula(text: &str) -> FormulaResult<Vec<Expr>> {
    let text = text.trim();
    let text = text.strip_prefix('=').unwrap_or(text);

    let mut tokenizer = Tokenizer::new(text);
    let mut output: Vec<Expr> = Vec::new();
    let mut stack: Vec<Pending> = Vec::new();

    loop {
        let tok = tokenizer.next_token();
        match tok.kind {
            TokenKind::Number => {
                let n = tok.text.parse::<f64>().map_err(|_| FormulaError::Lex {
                    offset: tok.offset,
                    text: tok.text.to_string(),
                })?;
                output.push(Expr::Constant(n));
            }
            TokenKind::Cell => {
                let cell = CellRef::parse(tok.text).ok_or_else(|| FormulaError::Lex {
                    offset: tok.offset,
                    text: tok.text.to_string(),
                })?;
                output.push(Expr::CellRef(cell));
            }
            TokenKind::Operator => {
                let op = tok
                    .text
                    .chars()
                    .next()
                    .and_then(OperatorKind::from_char)
                    .ok_or_else(|| FormulaError::Lex {
                        offset: tok.offset,
                        text: tok.text.to_string(),
                    })?;
                while let Some(&Pending::Operator(top)) = stack.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    output.push(Expr::Operator(top));
                    stack.pop();
                }
                stack.push(Pending::Operator(op));
            }
            TokenKind::Identifier => {
                let func = FunctionKind::from_name(tok.text)
                    .ok_or_else(|| FormulaError::UnknownFunction(tok.text.to_string()))?;
                stack.push(Pending::Function(func));
            }
            TokenKind::LeftParenthesis => stack.push(Pending::LeftParenthesis),
            TokenKind::RightParenthesis => {
                unwind_to_parenthesis(&mut stack, &mut output)
                    .ok_or(FormulaError::MissingStartParenthesis)?;
                stack.pop();
                if let Some(&Pending::Function(func)) = stack.last() {
                    stack.pop();
                    output.push(Expr::Function(func));
                }
            }
            TokenKind::Comma => {
                unwind_to_parenthesis(&mut stack, &mut output)
                    .ok_or(FormulaError::MisplacedSeparator)?;
            }
            TokenKind::EndOfFile => break,
            TokenKind::Error => {
                return Err(FormulaError::Lex {
                    offset: tok.offset,
                    text: tok.text.to_string(),
                });
            }
        }
    }

    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Operator(op) => output.push(Expr::Operator(op)),
            Pending::Function(func) => output.push(Expr::Function(func)),
            Pending::LeftParenthesis => return Err(FormulaError::UnmatchedParenthesis),
        }
    }

    check_arity(&output)?;
    Ok(output)
}

/// Pop and emit operators down to (not through) the nearest `(`.
/// Returns None when the stack holds no `(`.
fn unwind_to_parenthesis(stack: &mut Vec<Pending>, output: &mut Vec<Expr>) -> Option<()> {
    loop {
        match stack.last()? {
            Pending::LeftParenthesis => return Some(()),
            Pending::Operator(op) => output.push(Expr::Operator(*op)),
            Pending::Function(func) => output.push(Expr::Function(*func)),
        }
        stack.pop();
    }
}

/// Verify every operator and function finds its operands, and that the
/// sequence reduces to exactly one value.
fn check_arity(postfix: &[Expr]) -> FormulaResult<()> {
    let mut depth = 0usize;
    for node in postfix {
        let needs = match node {
            Expr::Constant(_) | Expr::CellRef(_) => 0,
            Expr::Operator(_) => 2,
            Expr::Function(func) => match func.arity() {
                Arity::Range => 1,
                Arity::Binary => 2,
            },
        };
        if depth < needs {
            return Err(FormulaError::Parse(format!(
                "'{}' is missing operands",
                node
            )));
        }
        depth = depth - needs + 1;
    }
    match depth {
        1 => Ok(()),
        0 => Err(FormulaError::Parse("empty formula".to_string())),
        n => Err(FormulaError::Parse(format!(
            "{} values without an operator between them",
            n
        ))),
    }
}

/// Parse a formula, returning an empty sequence on failure.
///
/// An empty result always means the formula did not parse.
pub fn parse_formula(text: &str) -> Vec<Expr> {
    match try_parse_formula(text) {
        Ok(postfix) => postfix,
        Err(e) => {
            warn!(formula = text, error = %e, "formula failed to parse");
            Vec::new()
        }
    }
}

/// Render a postfix sequence back into infix formula text.
pub fn to_formula_text(postfix: &[Expr]) -> FormulaResult<String> {
    // Each entry remembers whether it is a bare `a:b` range.
    let mut stack: Vec<(String, bool)> = Vec::new();
    let missing = |node: &Expr| FormulaError::Parse(format!("'{}' is missing operands", node));

    for node in postfix {
        match node {
            Expr::Constant(_) | Expr::CellRef(_) => stack.push((node.to_string(), false)),
            Expr::Operator(op) => {
                let (rhs, rhs_range) = stack.pop().ok_or_else(|| missing(node))?;
                let (lhs, _) = stack.pop().ok_or_else(|| missing(node))?;
                stack.push(match op {
                    // Ranges nest to the left, so a range on the right needs parentheses.
                    OperatorKind::Range if rhs_range => (format!("{}:({})", lhs, rhs), true),
                    OperatorKind::Range => (format!("{}:{}", lhs, rhs), true),
                    _ => (format!("({} {} {})", lhs, op.symbol(), rhs), false),
                });
            }
            Expr::Function(func) => match func.arity() {
                Arity::Range => {
                    let (arg, _) = stack.pop().ok_or_else(|| missing(node))?;
                    stack.push((format!("{}({})", func.name(), arg), false));
                }
                Arity::Binary => {
                    let (rhs, _) = stack.pop().ok_or_else(|| missing(node))?;
                    let (lhs, _) = stack.pop().ok_or_else(|| missing(node))?;
                    stack.push((format!("{}({}, {})", func.name(), lhs, rhs), false));
                }
            },
        }
    }

    match stack.len() {
        1 => Ok(stack.pop().map(|(text, _)| text).unwrap_or_default()),
        n => Err(FormulaError::StackDepth(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(name: &str) -> Expr {
        Expr::CellRef(CellRef::parse(name).unwrap())
    }

    #[test]
    fn test_precedence_orders_postfix() {
        assert_eq!(
            try_parse_formula("A1+B1*2").unwrap(),
            vec![
                cell("A1"),
                cell("B1"),
                Expr::Constant(2.0),
                Expr::Operator(OperatorKind::Multiply),
                Expr::Operator(OperatorKind::Add),
            ]
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        assert_eq!(
            try_parse_formula("=(A1+B1)*2").unwrap(),
            vec![
                cell("A1"),
                cell("B1"),
                Expr::Operator(OperatorKind::Add),
                Expr::Constant(2.0),
                Expr::Operator(OperatorKind::Multiply),
            ]
        );
    }

    #[test]
    fn test_function_with_range() {
        assert_eq!(
            try_parse_formula("SUM(A1:A3)").unwrap(),
            vec![
                cell("A1"),
                cell("A3"),
                Expr::Operator(OperatorKind::Range),
                Expr::Function(FunctionKind::Sum),
            ]
        );
    }

    #[test]
    fn test_comma_separates_arguments() {
        assert_eq!(
            try_parse_formula("MAX(A1+1, 2)").unwrap(),
            vec![
                cell("A1"),
                Expr::Constant(1.0),
                Expr::Operator(OperatorKind::Add),
                Expr::Constant(2.0),
                Expr::Function(FunctionKind::Max),
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            try_parse_formula("A1+2)"),
            Err(FormulaError::MissingStartParenthesis)
        );
        assert_eq!(try_parse_formula("(A1+2"), Err(FormulaError::UnmatchedParenthesis));
        assert_eq!(try_parse_formula("1, 2"), Err(FormulaError::MisplacedSeparator));
        assert_eq!(
            try_parse_formula("POW(2, 3)"),
            Err(FormulaError::UnknownFunction("POW".to_string()))
        );
        assert!(matches!(try_parse_formula("MIN(1)"), Err(FormulaError::Parse(_))));
        assert!(matches!(try_parse_formula("1 2"), Err(FormulaError::Parse(_))));
    }

    #[test]
    fn test_failed_parse_yields_empty_sequence() {
        assert!(parse_formula("").is_empty());
        assert!(parse_formula("A1 +").is_empty());
        assert!(!parse_formula("A1 + 1").is_empty());
    }

    #[test]
    fn test_render_round_trip() {
        for text in ["A1+B1*2", "SUM(A1:B4) / 2", "MIN(-3, A2-1)", "AVG(A1:A9)*(B1+2)"] {
            let postfix = try_parse_formula(text).unwrap();
            let rendered = to_formula_text(&postfix).unwrap();
            assert_eq!(try_parse_formula(&rendered).unwrap(), postfix, "{}", rendered);
        }
    }

    #[test]
    fn test_render_keeps_range_nesting() {
        let right = vec![
            cell("A1"),
            cell("B1"),
            cell("C1"),
            Expr::Operator(OperatorKind::Range),
            Expr::Operator(OperatorKind::Range),
        ];
        let text = to_formula_text(&right).unwrap();
        assert_eq!(text, "A1:(B1:C1)");
        assert_eq!(try_parse_formula(&text).unwrap(), right);

        let left = try_parse_formula("A1:B1:C1").unwrap();
        assert_eq!(to_formula_text(&left).unwrap(), "A1:B1:C1");
        assert_ne!(left, right);
    }
}
