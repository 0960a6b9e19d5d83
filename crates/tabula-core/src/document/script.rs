//! Command-mode scripting against a document.
//!
//! A [`Session`] owns the command interpreter with the [`Document`] as its
//! host. Host procedures give scripts access to cells, the cursor, the flash
//! message and undo/redo. Key bindings are procedures named `key:<key>`, so
//! rebinding a key replaces its procedure in place.

use super::Document;
use crate::error::{Result, TabulaError};
use tabula_engine::engine::{CellRef, format_number};
use tabula_engine::script::{EvalResult, Flow, Interp, ReturnCode, ScriptError};
use tracing::{debug, info, warn};

/// Bindings installed before any startup file runs.
pub const DEFAULT_BINDINGS: &str = r#"
# Vim-style navigation
bind h {move -1 0}
bind j {move 0 1}
bind k {move 0 -1}
bind l {move 1 0}
bind Left {move -1 0}
bind Down {move 0 1}
bind Up {move 0 -1}
bind Right {move 1 0}
bind Tab {move 1 0}
bind BackTab {move -1 0}

bind x {clearcell [cursor]}
bind Delete {clearcell [cursor]}
bind u undo
bind C-r redo
bind C-Home {goto A1}
"#;

/// Name of the procedure holding the binding for `key`.
pub fn binding_name(key: &str) -> String {
    format!("key:{}", key)
}

pub struct Session {
    interp: Interp<Document>,
}

fn check_arity(
    args: &[String],
    min: usize,
    max: usize,
    usage: &str,
) -> std::result::Result<(), ScriptError> {
    if args.len() < min || args.len() > max {
        return Err(ScriptError::arity(usage));
    }
    Ok(())
}

fn cell_arg(text: &str) -> Result<CellRef> {
    CellRef::parse(text).ok_or_else(|| TabulaError::InvalidCellRef(text.to_string()))
}

fn int_arg(text: &str) -> std::result::Result<i64, ScriptError> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| ScriptError::Eval(format!("expected integer but got \"{}\"", text)))
}

fn register_host_procedures(interp: &mut Interp<Document>) {
    interp.register_native("getcell", |interp, args| {
        check_arity(args, 2, 2, "getcell ref")?;
        Ok(interp.host.cell_text(&cell_arg(&args[1])?))
    });
    interp.register_native("setcell", |interp, args| {
        check_arity(args, 3, 3, "setcell ref text")?;
        interp.host.set_cell_text(cell_arg(&args[1])?, &args[2])?;
        Ok(args[2].clone())
    });
    interp.register_native("getvalue", |interp, args| {
        check_arity(args, 2, 2, "getvalue ref")?;
        let value = interp.host.numeric_value(cell_arg(&args[1])?)?;
        Ok(format_number(value))
    });
    interp.register_native("clearcell", |interp, args| {
        check_arity(args, 2, 2, "clearcell ref")?;
        interp.host.clear_cell(&cell_arg(&args[1])?);
        Ok(String::new())
    });
    interp.register_native("cursor", |interp, args| {
        check_arity(args, 1, 2, "cursor ?ref?")?;
        if let Some(text) = args.get(1) {
            interp.host.set_cursor(cell_arg(text)?);
        }
        Ok(interp.host.cursor().to_string())
    });
    interp.register_native("move", |interp, args| {
        check_arity(args, 3, 3, "move dx dy")?;
        let (dcol, drow) = (int_arg(&args[1])?, int_arg(&args[2])?);
        interp.host.move_cursor(dcol, drow);
        Ok(interp.host.cursor().to_string())
    });
    interp.register_native("goto", |interp, args| {
        check_arity(args, 2, 2, "goto ref")?;
        interp.host.set_cursor(cell_arg(&args[1])?);
        Ok(interp.host.cursor().to_string())
    });
    interp.register_native("flash", |interp, args| {
        check_arity(args, 2, 2, "flash text")?;
        interp.host.flash_message(args[1].clone());
        Ok(String::new())
    });
    interp.register_native("undo", |interp, args| {
        check_arity(args, 1, 1, "undo")?;
        interp.host.undo()?;
        Ok(String::new())
    });
    interp.register_native("redo", |interp, args| {
        check_arity(args, 1, 1, "redo")?;
        interp.host.redo()?;
        Ok(String::new())
    });
    interp.register_native("bind", |interp, args| {
        check_arity(args, 3, 3, "bind key script")?;
        interp.register_proc(&binding_name(&args[1]), Vec::new(), args[2].clone());
        Ok(String::new())
    });
    interp.register_native("press", |interp, args| {
        check_arity(args, 2, 2, "press key")?;
        press_key(interp, &args[1])
    });
}

fn press_key(interp: &mut Interp<Document>, key: &str) -> EvalResult {
    let name = binding_name(key);
    if !interp.has_procedure(&name) {
        return Err(ScriptError::Host(format!("no binding for key \"{}\"", key)).into());
    }
    interp.call(&[name])
}

impl Session {
    /// Create a session over an empty document.
    pub fn new() -> Self {
        Self::with_document(Document::new())
    }

    /// Create a session over `doc` with the default key bindings installed.
    pub fn with_document(doc: Document) -> Self {
        let mut interp = Interp::new(doc);
        register_host_procedures(&mut interp);
        if interp.evaluate(DEFAULT_BINDINGS) != ReturnCode::Ok {
            warn!(error = interp.result(), "default bindings failed to load");
        }
        Session { interp }
    }

    pub fn document(&self) -> &Document {
        &self.interp.host
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.interp.host
    }

    pub fn interp_mut(&mut self) -> &mut Interp<Document> {
        &mut self.interp
    }

    /// Evaluate a script, leaving its result (or error message) in [`Session::result`].
    pub fn evaluate(&mut self, script: &str) -> ReturnCode {
        self.interp.evaluate(script)
    }

    pub fn result(&self) -> &str {
        self.interp.result()
    }

    /// Run a script and return its result.
    pub fn run(&mut self, script: &str) -> Result<String> {
        match self.interp.eval(script) {
            Ok(value) | Err(Flow::Return(value)) => Ok(value),
            Err(Flow::Error(e)) => Err(TabulaError::Script(e)),
            Err(Flow::Break | Flow::Continue) => Err(TabulaError::Script(ScriptError::Eval(
                "loop control outside of a loop".to_string(),
            ))),
        }
    }

    /// Run a startup file. Failures are reported and leave the session usable.
    pub fn load_rc(&mut self, source: &str, text: &str) -> Result<()> {
        info!(source, "loading startup script");
        self.run(text).map(|_| ()).inspect_err(|e| {
            warn!(source, error = %e, "startup script failed");
        })
    }

    /// Execute a line typed in command mode. Errors are shown as the flash message.
    pub fn command(&mut self, line: &str) -> ReturnCode {
        debug!(line, "command");
        let code = self.interp.evaluate(line);
        if code == ReturnCode::Error {
            let message = self.interp.result().to_string();
            self.interp.host.flash_message(message);
        }
        code
    }

    /// Bind `key` to `script`, replacing any existing binding.
    pub fn bind(&mut self, key: &str, script: &str) {
        self.interp
            .register_proc(&binding_name(key), Vec::new(), script.to_string());
    }

    /// Run the binding for `key`. Errors are shown as the flash message.
    pub fn press(&mut self, key: &str) -> ReturnCode {
        let outcome = press_key(&mut self.interp, key);
        let code = ReturnCode::of(&outcome);
        if let Err(Flow::Error(e)) = outcome {
            warn!(key, error = %e, "key binding failed");
            self.interp.host.flash_message(e.to_string());
        }
        code
    }

    /// Lines written by `puts` since the last call.
    pub fn take_output(&mut self) -> Vec<String> {
        self.interp.take_output()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(name: &str) -> CellRef {
        CellRef::parse(name).unwrap()
    }

    #[test]
    fn test_setcell_and_getvalue() {
        let mut session = Session::new();
        assert_eq!(session.evaluate("setcell A1 3; setcell B1 {=A1*2}"), ReturnCode::Ok);
        assert_eq!(session.run("getvalue B1").unwrap(), "6");
        assert_eq!(session.run("getcell B1").unwrap(), "=A1*2");
        assert_eq!(session.document().cell_text(&at("A1")), "3");
    }

    #[test]
    fn test_getvalue_reports_deep_nesting() {
        let mut session = Session::new();
        session
            .run("setcell A1 1; for {set r 2} {$r <= 300} {incr r} { setcell A$r \"=A[expr $r - 1]+1\" }")
            .unwrap();
        let err = session.run("getvalue A300").unwrap_err();
        assert_eq!(err.to_string(), "Formula error: Formula nesting exceeds 256 levels");
        assert_eq!(session.run("getvalue A100").unwrap(), "100");
    }

    #[test]
    fn test_default_bindings_move_cursor() {
        let mut session = Session::new();
        assert_eq!(session.press("l"), ReturnCode::Ok);
        assert_eq!(session.press("j"), ReturnCode::Ok);
        assert_eq!(session.document().cursor(), at("B2"));
        session.press("k");
        session.press("k");
        assert_eq!(session.document().cursor(), at("B1"));
    }

    #[test]
    fn test_rebinding_replaces_binding() {
        let mut session = Session::new();
        session.bind("j", "move 0 5");
        session.press("j");
        assert_eq!(session.document().cursor(), at("A6"));
        assert_eq!(session.evaluate("bind j {goto C3}; press j"), ReturnCode::Ok);
        assert_eq!(session.document().cursor(), at("C3"));
    }

    #[test]
    fn test_errors_become_flash_messages() {
        let mut session = Session::new();
        assert_eq!(session.command("setcell nowhere 1"), ReturnCode::Error);
        assert_eq!(
            session.document_mut().take_flash(),
            Some("Invalid cell reference \"nowhere\"".to_string())
        );
        assert_eq!(session.press("F13"), ReturnCode::Error);
        assert_eq!(
            session.document_mut().take_flash(),
            Some("no binding for key \"F13\"".to_string())
        );
    }

    #[test]
    fn test_partial_effects_are_kept() {
        let mut session = Session::new();
        assert_eq!(session.command("setcell A1 1; bogus; setcell A2 2"), ReturnCode::Error);
        assert_eq!(session.document().cell_text(&at("A1")), "1");
        assert_eq!(session.document().cell_text(&at("A2")), "");
    }

    #[test]
    fn test_cycle_is_reported_to_script() {
        let mut session = Session::new();
        session.run("setcell A1 {=B1}").unwrap();
        let err = session.run("setcell B1 {=A1}").unwrap_err();
        assert!(err.to_string().starts_with("Circular dependency detected"));
        assert_eq!(session.run("catch {setcell B1 {=A1}}").unwrap(), "1");
    }

    #[test]
    fn test_undo_from_script_and_key() {
        let mut session = Session::new();
        session.run("setcell A1 1; setcell A1 2").unwrap();
        session.press("u");
        assert_eq!(session.run("getcell A1").unwrap(), "1");
        session.press("C-r");
        assert_eq!(session.run("getcell A1").unwrap(), "2");
        session.run("undo; undo").unwrap();
        assert!(session.run("undo").is_err());
    }

    #[test]
    fn test_clear_binding_uses_cursor() {
        let mut session = Session::new();
        session.run("setcell B2 x; goto B2").unwrap();
        session.press("x");
        assert_eq!(session.document().cell_text(&at("B2")), "");
    }
}
