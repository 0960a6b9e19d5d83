//! Script errors and the control-flow codes threaded through evaluation.

use thiserror::Error;

/// Errors raised while evaluating a script. All of them are recoverable at
/// statement granularity: the failing script stops, the host carries on.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScriptError {
    /// Malformed token (unterminated quote, brace or bracket).
    #[error("syntax error: {0}")]
    Lex(String),

    /// Wrong argument count or malformed procedure definition.
    #[error("{0}")]
    Parse(String),

    /// Runtime type or range mismatch.
    #[error("{0}")]
    Eval(String),

    #[error("can't read \"{0}\": no such variable")]
    UndefinedVariable(String),

    #[error("invalid command name \"{0}\"")]
    UndefinedProcedure(String),

    #[error("too many nested evaluations (limit {0})")]
    RecursionLimit(usize),

    /// A host procedure rejected its request.
    #[error("{0}")]
    Host(String),

    /// Raised by the `error` procedure.
    #[error("{0}")]
    User(String),
}

impl ScriptError {
    /// Wrong number of arguments, with the usage string shown to the user.
    pub fn arity(usage: &str) -> ScriptError {
        ScriptError::Parse(format!("wrong # args: should be \"{}\"", usage))
    }
}

/// Anything that stops a script from running to completion.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Error(ScriptError),
    Break,
    Continue,
    Return(String),
}

impl From<ScriptError> for Flow {
    fn from(e: ScriptError) -> Self {
        Flow::Error(e)
    }
}

/// Outcome of evaluating a script: its result text, or the flow change that
/// interrupted it.
pub type EvalResult = Result<String, Flow>;

/// Flat status of an evaluation, as reported to the host.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReturnCode {
    Ok,
    Error,
    Return,
    Break,
    Continue,
}

impl ReturnCode {
    pub fn of(result: &EvalResult) -> ReturnCode {
        match result {
            Ok(_) => ReturnCode::Ok,
            Err(Flow::Error(_)) => ReturnCode::Error,
            Err(Flow::Return(_)) => ReturnCode::Return,
            Err(Flow::Break) => ReturnCode::Break,
            Err(Flow::Continue) => ReturnCode::Continue,
        }
    }

    /// Numeric code as reported by `catch`.
    pub fn as_int(self) -> i64 {
        match self {
            ReturnCode::Ok => 0,
            ReturnCode::Error => 1,
            ReturnCode::Return => 2,
            ReturnCode::Break => 3,
            ReturnCode::Continue => 4,
        }
    }
}
