//! The command evaluator.
//!
//! [`Interp`] owns the frame stack and the procedure registry for one
//! session, plus the host value `H` that native procedures act on. Nested
//! `[...]` substitutions and procedure bodies re-enter [`Interp::eval`] on
//! the same call stack; each level keeps its own argument list, and the
//! shared state is only touched between statements.

use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use tracing::{debug, warn};

use super::builtins::register_builtins;
use super::expr::evaluate_expr;
use super::frame::FrameStack;
use super::registry::{Procedure, Registry, ScriptedProc};
use super::token::{TokenKind, Tokenizer};
use super::{EvalResult, Flow, ReturnCode, ScriptError};

/// Default bound on nested evaluations (substitutions plus procedure calls).
pub const DEFAULT_MAX_DEPTH: usize = 200;

pub struct Interp<H> {
    frames: FrameStack,
    procs: Registry<H>,
    depth: usize,
    max_depth: usize,
    output: Vec<String>,
    pub host: H,
}

/// Keeps a procedure frame pushed for as long as it lives.
pub struct FrameGuard<'a, H> {
    interp: &'a mut Interp<H>,
}

impl<H> Deref for FrameGuard<'_, H> {
    type Target = Interp<H>;

    fn deref(&self) -> &Interp<H> {
        self.interp
    }
}

impl<H> DerefMut for FrameGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut Interp<H> {
        self.interp
    }
}

impl<H> Drop for FrameGuard<'_, H> {
    fn drop(&mut self) {
        self.interp.frames.pop();
        debug!(depth = self.interp.frames.depth(), "frame popped");
    }
}

impl<H: 'static> Interp<H> {
    /// Create an interpreter with the built-in procedures registered.
    pub fn new(host: H) -> Self {
        let mut interp = Interp {
            frames: FrameStack::new(),
            procs: Registry::new(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            output: Vec::new(),
            host,
        };
        register_builtins(&mut interp);
        interp
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    pub fn register_native(
        &mut self,
        name: &str,
        f: impl Fn(&mut Interp<H>, &[String]) -> EvalResult + 'static,
    ) {
        debug!(name, "registering native procedure");
        self.procs.register(name, Procedure::Native(Rc::new(f)));
    }

    /// Define (or redefine) a scripted procedure.
    pub fn register_proc(&mut self, name: &str, params: Vec<String>, body: String) {
        debug!(name, ?params, "registering procedure");
        let replaced = self.procs.register(
            name,
            Procedure::Scripted(Rc::new(ScriptedProc::new(params, body))),
        );
        if replaced {
            debug!(name, "procedure replaced");
        }
    }

    pub fn has_procedure(&self, name: &str) -> bool {
        self.procs.contains(name)
    }

    pub fn procedure_names(&self) -> Vec<&str> {
        self.procs.names()
    }

    /// Evaluate `script`, storing its result (or error message) in the
    /// active frame.
    pub fn evaluate(&mut self, script: &str) -> ReturnCode {
        let outcome = self.eval(script);
        let code = ReturnCode::of(&outcome);
        let text = match outcome {
            Ok(value) | Err(Flow::Return(value)) => value,
            Err(Flow::Error(e)) => {
                warn!(error = %e, "script failed");
                e.to_string()
            }
            Err(Flow::Break) => "invoked \"break\" outside of a loop".to_string(),
            Err(Flow::Continue) => "invoked \"continue\" outside of a loop".to_string(),
        };
        self.frames.current_mut().result = text;
        code
    }

    /// Result of the most recent command in the active frame.
    pub fn result(&self) -> &str {
        &self.frames.current().result
    }

    /// Evaluate `script` and return its result.
    pub fn eval(&mut self, script: &str) -> EvalResult {
        if self.depth >= self.max_depth {
            return Err(ScriptError::RecursionLimit(self.max_depth).into());
        }
        self.depth += 1;
        let outcome = self.run(script);
        self.depth -= 1;
        outcome
    }

    fn run(&mut self, script: &str) -> EvalResult {
        let mut tokenizer = Tokenizer::new(script);
        let mut args: Vec<String> = Vec::new();
        let mut result = String::new();
        let mut word_start = true;

        loop {
            let tok = tokenizer.next_token();
            let piece = match tok.kind {
                TokenKind::Separator => {
                    word_start = true;
                    continue;
                }
                TokenKind::EndOfLine | TokenKind::EndOfFile => {
                    if !args.is_empty() {
                        result = self.call(&args)?;
                        self.frames.current_mut().result = result.clone();
                        args.clear();
                    }
                    if tok.kind == TokenKind::EndOfFile {
                        return Ok(result);
                    }
                    word_start = true;
                    continue;
                }
                TokenKind::Error => return Err(ScriptError::Lex(tok.text.into_owned()).into()),
                TokenKind::Variable => self.lookup(&tok.text)?,
                TokenKind::Command => self.eval(&tok.text)?,
                TokenKind::String | TokenKind::Escaped => tok.text.into_owned(),
            };
            match args.last_mut() {
                Some(last) if !word_start => last.push_str(&piece),
                _ => args.push(piece),
            }
            word_start = false;
        }
    }

    /// Invoke the procedure named by `args[0]` with the full argument vector.
    pub fn call(&mut self, args: &[String]) -> EvalResult {
        let Some(name) = args.first() else {
            return Ok(String::new());
        };
        let procedure = self
            .procs
            .get(name)
            .cloned()
            .ok_or_else(|| ScriptError::UndefinedProcedure(name.clone()))?;
        debug!(name = name.as_str(), argc = args.len(), "dispatch");
        match procedure {
            Procedure::Native(f) => f(self, args),
            Procedure::Scripted(p) => self.call_scripted(&p, args),
        }
    }

    fn call_scripted(&mut self, procedure: &ScriptedProc, args: &[String]) -> EvalResult {
        let bindings = procedure.bind(args)?;
        let mut frame = self.push_frame();
        for (name, value) in bindings {
            frame.set_var(&name, value);
        }
        match frame.eval(&procedure.body) {
            Ok(value) | Err(Flow::Return(value)) => Ok(value),
            Err(Flow::Break) => {
                Err(ScriptError::Eval("invoked \"break\" outside of a loop".to_string()).into())
            }
            Err(Flow::Continue) => {
                Err(ScriptError::Eval("invoked \"continue\" outside of a loop".to_string()).into())
            }
            Err(e) => Err(e),
        }
    }

    /// Push a fresh frame; it is popped when the guard drops.
    pub fn push_frame(&mut self) -> FrameGuard<'_, H> {
        self.frames.push();
        debug!(depth = self.frames.depth(), "frame pushed");
        FrameGuard { interp: self }
    }

    /// Number of frames, including the global one.
    pub fn frame_depth(&self) -> usize {
        self.frames.depth()
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.frames.current().get(name)
    }

    fn lookup(&self, name: &str) -> Result<String, ScriptError> {
        self.var(name)
            .map(str::to_string)
            .ok_or_else(|| ScriptError::UndefinedVariable(name.to_string()))
    }

    pub fn set_var(&mut self, name: &str, value: String) {
        self.frames.current_mut().set(name, value);
    }

    pub fn unset_var(&mut self, name: &str) -> Option<String> {
        self.frames.current_mut().unset(name)
    }

    /// Perform variable and command substitution on `text`, keeping the
    /// whitespace between words.
    pub fn subst(&mut self, text: &str) -> EvalResult {
        let mut tokenizer = Tokenizer::without_comments(text);
        let mut out = String::new();
        loop {
            let tok = tokenizer.next_token();
            match tok.kind {
                TokenKind::EndOfFile => return Ok(out),
                TokenKind::Error => return Err(ScriptError::Lex(tok.text.into_owned()).into()),
                TokenKind::Variable => out.push_str(&self.lookup(&tok.text)?),
                TokenKind::Command => out.push_str(&self.eval(&tok.text)?),
                _ => out.push_str(&tok.text),
            }
        }
    }

    /// Substitute and evaluate an arithmetic expression.
    pub fn eval_expr(&mut self, text: &str) -> Result<f64, Flow> {
        let substituted = self.subst(text)?;
        evaluate_expr(&substituted).map_err(|e| ScriptError::Eval(e.to_string()).into())
    }

    /// Evaluate a loop or `if` condition.
    pub fn eval_condition(&mut self, text: &str) -> Result<bool, Flow> {
        Ok(self.eval_expr(text)? != 0.0)
    }

    /// Append a line to the output buffer (written by `puts`).
    pub fn emit(&mut self, line: String) {
        self.output.push(line);
    }

    /// Drain everything written by `puts` since the last call.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn interp() -> Interp<()> {
        Interp::new(())
    }

    #[test]
    fn test_set_with_variable_substitution() {
        let mut i = interp();
        i.set_var("x", "5".to_string());
        assert_eq!(i.evaluate("set y $x"), ReturnCode::Ok);
        assert_eq!(i.var("y"), Some("5"));
        assert_eq!(i.result(), "5");
    }

    #[test]
    fn test_command_substitution() {
        let mut i = interp();
        assert_eq!(i.evaluate("set z [expr 1 + 1]"), ReturnCode::Ok);
        assert_eq!(i.var("z"), Some("2"));
    }

    #[test]
    fn test_adjacent_words_concatenate() {
        let mut i = interp();
        assert_eq!(i.eval("set v 3; set w cell$v[expr 1+1]"), Ok("cell32".to_string()));
        assert_eq!(i.eval("set q \"$v and {$v}\""), Ok("3 and {3}".to_string()));
    }

    #[test]
    fn test_undefined_names_are_errors() {
        let mut i = interp();
        assert_eq!(
            i.eval("set a $nope"),
            Err(Flow::Error(ScriptError::UndefinedVariable("nope".to_string())))
        );
        assert_eq!(i.evaluate("frobnicate 1"), ReturnCode::Error);
        assert_eq!(i.result(), "invalid command name \"frobnicate\"");
    }

    #[test]
    fn test_error_aborts_remaining_statements() {
        let mut i = interp();
        assert_eq!(i.evaluate("set a 1\nbogus\nset a 2"), ReturnCode::Error);
        assert_eq!(i.var("a"), Some("1"));
    }

    #[test]
    fn test_unterminated_input_is_lex_error() {
        let mut i = interp();
        assert!(matches!(i.eval("set a {b"), Err(Flow::Error(ScriptError::Lex(_)))));
        assert!(matches!(i.eval("set a \"b"), Err(Flow::Error(ScriptError::Lex(_)))));
    }

    #[test]
    fn test_procedure_frames_are_isolated() {
        let mut i = interp();
        i.eval("set g 1; proc f {x} { set y $x; return [expr $x * 2] }").unwrap();
        assert_eq!(i.eval("f 21"), Ok("42".to_string()));
        assert_eq!(i.var("y"), None);
        assert!(i.eval("proc h {} { set g }; h").is_err());
        assert_eq!(i.frame_depth(), 1);
    }

    #[test]
    fn test_recursion_limit() {
        let mut i = Interp::new(()).with_max_depth(20);
        i.eval("proc loop {} { loop }").unwrap();
        assert_eq!(
            i.eval("loop"),
            Err(Flow::Error(ScriptError::RecursionLimit(20)))
        );
        assert_eq!(i.frame_depth(), 1);
    }

    #[test]
    fn test_subst_keeps_spacing() {
        let mut i = interp();
        i.set_var("x", "4".to_string());
        assert_eq!(i.subst("$x  + [set x]"), Ok("4  + 4".to_string()));
    }

    #[test]
    fn test_native_procedures_reach_the_host() {
        let mut i = Interp::new(Vec::<String>::new());
        i.register_native("log", |interp, args| {
            interp.host.extend(args[1..].iter().cloned());
            Ok(String::new())
        });
        i.eval("log a b; log c").unwrap();
        assert_eq!(i.host, vec!["a", "b", "c"]);
    }
}
