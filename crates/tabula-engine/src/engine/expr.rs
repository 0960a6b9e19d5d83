//! Postfix formula nodes and the operator/function tables.

use std::fmt;

use super::CellRef;

/// One node of a parsed formula, in postfix order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Expr {
    Constant(f64),
    CellRef(CellRef),
    Operator(OperatorKind),
    Function(FunctionKind),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum OperatorKind {
    Range,
    Multiply,
    Divide,
    Add,
    Subtract,
}

impl OperatorKind {
    /// Look up a single-character operator.
    pub fn from_char(c: char) -> Option<OperatorKind> {
        OPERATORS.iter().find(|op| op.symbol == c).map(|op| op.kind)
    }

    pub fn precedence(self) -> u8 {
        self.info().precedence
    }

    pub fn symbol(self) -> char {
        self.info().symbol
    }

    fn info(self) -> &'static OperatorInfo {
        OPERATORS
            .iter()
            .find(|op| op.kind == self)
            .expect("every operator kind has a table entry")
    }

    /// Apply an arithmetic operator. Division by zero yields infinity or NaN.
    pub fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        match self {
            OperatorKind::Range => None,
            OperatorKind::Multiply => Some(lhs * rhs),
            OperatorKind::Divide => Some(lhs / rhs),
            OperatorKind::Add => Some(lhs + rhs),
            OperatorKind::Subtract => Some(lhs - rhs),
        }
    }
}

pub struct OperatorInfo {
    pub symbol: char,
    pub precedence: u8,
    pub kind: OperatorKind,
}

/// All formula operators are left-associative.
pub const OPERATORS: &[OperatorInfo] = &[
    OperatorInfo {
        symbol: ':',
        precedence: 5,
        kind: OperatorKind::Range,
    },
    OperatorInfo {
        symbol: '*',
        precedence: 4,
        kind: OperatorKind::Multiply,
    },
    OperatorInfo {
        symbol: '/',
        precedence: 3,
        kind: OperatorKind::Divide,
    },
    OperatorInfo {
        symbol: '+',
        precedence: 1,
        kind: OperatorKind::Add,
    },
    OperatorInfo {
        symbol: '-',
        precedence: 1,
        kind: OperatorKind::Subtract,
    },
];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FunctionKind {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

/// Argument shape of a spreadsheet function.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Arity {
    /// A single `start:end` range.
    Range,
    /// Two scalar operands.
    Binary,
}

pub struct FunctionInfo {
    pub name: &'static str,
    pub kind: FunctionKind,
    pub arity: Arity,
}

pub const FUNCTIONS: &[FunctionInfo] = &[
    FunctionInfo {
        name: "SUM",
        kind: FunctionKind::Sum,
        arity: Arity::Range,
    },
    FunctionInfo {
        name: "AVG",
        kind: FunctionKind::Avg,
        arity: Arity::Range,
    },
    FunctionInfo {
        name: "COUNT",
        kind: FunctionKind::Count,
        arity: Arity::Range,
    },
    FunctionInfo {
        name: "MIN",
        kind: FunctionKind::Min,
        arity: Arity::Binary,
    },
    FunctionInfo {
        name: "MAX",
        kind: FunctionKind::Max,
        arity: Arity::Binary,
    },
];

impl FunctionKind {
    /// Function names are matched case-insensitively.
    pub fn from_name(name: &str) -> Option<FunctionKind> {
        FUNCTIONS
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.kind)
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn arity(self) -> Arity {
        self.info().arity
    }

    fn info(self) -> &'static FunctionInfo {
        FUNCTIONS
            .iter()
            .find(|f| f.kind == self)
            .expect("every function kind has a table entry")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(n) => write!(f, "{}", n),
            Expr::CellRef(cell) => write!(f, "{}", cell),
            Expr::Operator(op) => write!(f, "{}", op.symbol()),
            Expr::Function(func) => write!(f, "{}", func.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_table_precedence() {
        assert_eq!(OperatorKind::Range.precedence(), 5);
        assert_eq!(OperatorKind::Multiply.precedence(), 4);
        assert_eq!(OperatorKind::Divide.precedence(), 3);
        assert_eq!(OperatorKind::Add.precedence(), 1);
        assert_eq!(OperatorKind::Subtract.precedence(), 1);
    }

    #[test]
    fn test_function_lookup_is_case_insensitive() {
        assert_eq!(FunctionKind::from_name("sum"), Some(FunctionKind::Sum));
        assert_eq!(FunctionKind::from_name("Max"), Some(FunctionKind::Max));
        assert_eq!(FunctionKind::from_name("POW"), None);
    }

    #[test]
    fn test_divide_by_zero_is_not_an_error() {
        let r = OperatorKind::Divide.apply(1.0, 0.0).unwrap();
        assert!(r.is_infinite());
        let nan = OperatorKind::Divide.apply(0.0, 0.0).unwrap();
        assert!(nan.is_nan());
    }
}
