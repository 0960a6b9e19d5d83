//! Arithmetic expression evaluator behind the `expr` procedure.
//!
//! Single pass over the input with a value stack and a pending-operator
//! stack. Before an operator is pushed, every pending operator binding at
//! least as tightly is applied (strictly tighter for the right-associative
//! unary minus). `(` sits on the operator stack as a sentinel with the
//! lowest precedence.
//!
//! Comparisons and logical operators yield 1 or 0. `==` and `!=` compare
//! with a tolerance of 1e-7.

use thiserror::Error;

const EQUALITY_TOLERANCE: f64 = 1e-7;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExprError {
    #[error("syntax error in expression \"{expr}\": {reason}")]
    Syntax { expr: String, reason: String },

    #[error("malformed expression \"{expr}\": {reason}")]
    Stack { expr: String, reason: String },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Op {
    Negate,
    Multiply,
    Divide,
    Add,
    Subtract,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
    Open,
}

impl Op {
    fn precedence(self) -> u8 {
        match self {
            Op::Negate => 11,
            Op::Multiply | Op::Divide => 10,
            Op::Add | Op::Subtract => 9,
            Op::Less | Op::Greater | Op::LessEqual | Op::GreaterEqual => 7,
            Op::Equal | Op::NotEqual => 6,
            Op::And => 2,
            Op::Or => 1,
            Op::Open => 0,
        }
    }

    fn is_right_assoc(self) -> bool {
        self == Op::Negate
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Number(f64),
    Op(Op),
    Close,
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn syntax(&self, reason: String) -> ExprError {
        ExprError::Syntax {
            expr: self.src.to_string(),
            reason,
        }
    }

    fn next(&mut self) -> Result<Option<Token>, ExprError> {
        let rest = self.src[self.pos..].trim_start();
        self.pos = self.src.len() - rest.len();
        let Some(c) = rest.chars().next() else {
            return Ok(None);
        };

        if c.is_ascii_digit() || c == '.' {
            let len = number_len(rest);
            let text = &rest[..len];
            self.pos += len;
            return text
                .parse::<f64>()
                .map(|n| Some(Token::Number(n)))
                .map_err(|_| self.syntax(format!("bad number \"{}\"", text)));
        }

        const OPERATORS: &[(&str, Op)] = &[
            ("==", Op::Equal),
            ("!=", Op::NotEqual),
            ("<=", Op::LessEqual),
            (">=", Op::GreaterEqual),
            ("&&", Op::And),
            ("||", Op::Or),
            ("<", Op::Less),
            (">", Op::Greater),
            ("*", Op::Multiply),
            ("/", Op::Divide),
            ("+", Op::Add),
            ("-", Op::Subtract),
            ("(", Op::Open),
        ];
        if let Some(&(symbol, op)) = OPERATORS.iter().find(|(s, _)| rest.starts_with(s)) {
            self.pos += symbol.len();
            return Ok(Some(Token::Op(op)));
        }
        if c == ')' {
            self.pos += 1;
            return Ok(Some(Token::Close));
        }
        Err(self.syntax(format!("unexpected character '{}'", c)))
    }
}

/// Length of the numeric literal at the start of `s`: digits, one optional
/// decimal point, optional exponent.
fn number_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    let digits = |i: &mut usize| {
        while *i < bytes.len() && bytes[*i].is_ascii_digit() {
            *i += 1;
        }
    };
    digits(&mut i);
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        digits(&mut i);
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            i = j;
            digits(&mut i);
        }
    }
    i
}

fn truth(v: f64) -> bool {
    v != 0.0
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

struct Machine<'a> {
    src: &'a str,
    values: Vec<f64>,
    ops: Vec<Op>,
}

impl Machine<'_> {
    fn stack_error(&self, reason: &str) -> ExprError {
        ExprError::Stack {
            expr: self.src.to_string(),
            reason: reason.to_string(),
        }
    }

    fn pop_value(&mut self) -> Result<f64, ExprError> {
        self.values
            .pop()
            .ok_or_else(|| self.stack_error("missing operand"))
    }

    fn apply(&mut self, op: Op) -> Result<(), ExprError> {
        if op == Op::Negate {
            let v = self.pop_value()?;
            self.values.push(-v);
            return Ok(());
        }
        let rhs = self.pop_value()?;
        let lhs = self.pop_value()?;
        let v = match op {
            Op::Multiply => lhs * rhs,
            Op::Divide => lhs / rhs,
            Op::Add => lhs + rhs,
            Op::Subtract => lhs - rhs,
            Op::Less => flag(lhs < rhs),
            Op::Greater => flag(lhs > rhs),
            Op::LessEqual => flag(lhs <= rhs),
            Op::GreaterEqual => flag(lhs >= rhs),
            Op::Equal => flag((lhs - rhs).abs() < EQUALITY_TOLERANCE),
            Op::NotEqual => flag((lhs - rhs).abs() >= EQUALITY_TOLERANCE),
            Op::And => flag(truth(lhs) && truth(rhs)),
            Op::Or => flag(truth(lhs) || truth(rhs)),
            Op::Negate | Op::Open => return Err(self.stack_error("misplaced '('")),
        };
        self.values.push(v);
        Ok(())
    }

    fn push_operator(&mut self, op: Op) -> Result<(), ExprError> {
        while let Some(&top) = self.ops.last() {
            let binds = if op.is_right_assoc() {
                top.precedence() > op.precedence()
            } else {
                top.precedence() >= op.precedence()
            };
            if top == Op::Open || !binds {
                break;
            }
            self.ops.pop();
            self.apply(top)?;
        }
        self.ops.push(op);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ExprError> {
        while let Some(top) = self.ops.pop() {
            if top == Op::Open {
                return Ok(());
            }
            self.apply(top)?;
        }
        Err(self.stack_error("missing '('"))
    }

    fn finish(mut self) -> Result<f64, ExprError> {
        while let Some(top) = self.ops.pop() {
            if top == Op::Open {
                return Err(self.stack_error("missing ')'"));
            }
            self.apply(top)?;
        }
        match self.values.as_slice() {
            [v] => Ok(*v),
            [] => Err(self.stack_error("empty expression")),
            _ => Err(self.stack_error("missing operator")),
        }
    }
}

/// Evaluate an arithmetic expression over numbers.
pub fn evaluate_expr(src: &str) -> Result<f64, ExprError> {
    let mut lexer = Lexer { src, pos: 0 };
    let mut machine = Machine {
        src,
        values: Vec::new(),
        ops: Vec::new(),
    };
    // True at the start, after `(` and after an operator.
    let mut expect_operand = true;

    while let Some(tok) = lexer.next()? {
        match tok {
            Token::Number(n) => {
                if !expect_operand {
                    return Err(lexer.syntax(format!("missing operator before {}", n)));
                }
                machine.values.push(n);
                expect_operand = false;
            }
            Token::Op(Op::Open) => {
                if !expect_operand {
                    return Err(lexer.syntax("missing operator before '('".to_string()));
                }
                machine.ops.push(Op::Open);
            }
            Token::Op(op) => {
                let op = match (expect_operand, op) {
                    (false, op) => op,
                    (true, Op::Subtract) => Op::Negate,
                    (true, _) => {
                        return Err(lexer.syntax("operator is missing its left operand".to_string()));
                    }
                };
                machine.push_operator(op)?;
                expect_operand = true;
            }
            Token::Close => {
                if expect_operand {
                    return Err(lexer.syntax("missing operand before ')'".to_string()));
                }
                machine.close()?;
            }
        }
    }

    machine.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> f64 {
        evaluate_expr(src).unwrap()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1 + 2 * 3"), 7.0);
        assert_eq!(eval("(1 + 2) * 3"), 9.0);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("8 / 4 / 2"), 1.0);
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(eval("-3 + 4"), 1.0);
        assert_eq!(eval("2 * -3"), -6.0);
        assert_eq!(eval("--3"), 3.0);
        assert_eq!(eval("-(2 + 3)"), -5.0);
    }

    #[test]
    fn test_comparison_and_logic() {
        assert_eq!(eval("2 == 2"), 1.0);
        assert_eq!(eval("0.1 + 0.2 == 0.3"), 1.0);
        assert_eq!(eval("1 != 1"), 0.0);
        assert_eq!(eval("1 && 0"), 0.0);
        assert_eq!(eval("1 || 0"), 1.0);
        assert_eq!(eval("1 < 2 && 3 >= 3"), 1.0);
        assert_eq!(eval("1 + 1 > 1"), 1.0);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(eval("1.5e2"), 150.0);
        assert_eq!(eval(".5 * 4"), 2.0);
    }

    #[test]
    fn test_division_by_zero_follows_floats() {
        assert!(eval("1 / 0").is_infinite());
    }

    #[test]
    fn test_errors() {
        assert!(matches!(evaluate_expr(""), Err(ExprError::Stack { .. })));
        assert!(matches!(evaluate_expr("* 3"), Err(ExprError::Syntax { .. })));
        assert!(matches!(evaluate_expr("1 +"), Err(ExprError::Stack { .. })));
        assert!(matches!(evaluate_expr("1 2"), Err(ExprError::Syntax { .. })));
        assert!(matches!(evaluate_expr("(1 + 2"), Err(ExprError::Stack { .. })));
        assert!(matches!(evaluate_expr("1 + 2)"), Err(ExprError::Stack { .. })));
        assert!(matches!(evaluate_expr("abc"), Err(ExprError::Syntax { .. })));
    }
}
