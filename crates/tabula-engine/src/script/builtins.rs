//! Built-in procedures available in every interpreter.

use crate::engine::format_number;

use super::{EvalResult, Flow, Interp, ReturnCode, ScriptError, format_list, parse_list};

pub(crate) fn register_builtins<H: 'static>(interp: &mut Interp<H>) {
    interp.register_native("set", cmd_set);
    interp.register_native("unset", cmd_unset);
    interp.register_native("incr", cmd_incr);
    interp.register_native("append", cmd_append);
    interp.register_native("expr", cmd_expr);
    interp.register_native("if", cmd_if);
    interp.register_native("while", cmd_while);
    interp.register_native("for", cmd_for);
    interp.register_native("foreach", cmd_foreach);
    interp.register_native("break", |_, args| {
        check_arity(args, 1, 1, "break")?;
        Err(Flow::Break)
    });
    interp.register_native("continue", |_, args| {
        check_arity(args, 1, 1, "continue")?;
        Err(Flow::Continue)
    });
    interp.register_native("return", |_, args| {
        check_arity(args, 1, 2, "return ?value?")?;
        Err(Flow::Return(args.get(1).cloned().unwrap_or_default()))
    });
    interp.register_native("proc", cmd_proc);
    interp.register_native("eval", |interp, args| {
        check_arity(args, 2, usize::MAX, "eval arg ?arg ...?")?;
        let script = args[1..].join(" ");
        interp.eval(&script)
    });
    interp.register_native("catch", cmd_catch);
    interp.register_native("error", |_, args| {
        check_arity(args, 2, 2, "error message")?;
        Err(ScriptError::User(args[1].clone()).into())
    });
    interp.register_native("list", |_, args| Ok(format_list(&args[1..])));
    interp.register_native("llength", |_, args| {
        check_arity(args, 2, 2, "llength list")?;
        Ok(parse_list(&args[1])?.len().to_string())
    });
    interp.register_native("lindex", cmd_lindex);
    interp.register_native("puts", |interp, args| {
        check_arity(args, 2, 2, "puts string")?;
        interp.emit(args[1].clone());
        Ok(String::new())
    });
    interp.register_native("info", cmd_info);
}

/// Require between `min` and `max` words, counting the procedure name.
fn check_arity(args: &[String], min: usize, max: usize, usage: &str) -> Result<(), ScriptError> {
    if args.len() < min || args.len() > max {
        return Err(ScriptError::arity(usage));
    }
    Ok(())
}

fn parse_int(text: &str) -> Result<i64, ScriptError> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| ScriptError::Eval(format!("expected integer but got \"{}\"", text)))
}

fn cmd_set<H: 'static>(interp: &mut Interp<H>, args: &[String]) -> EvalResult {
    check_arity(args, 2, 3, "set varName ?newValue?")?;
    match args.get(2) {
        Some(value) => {
            interp.set_var(&args[1], value.clone());
            Ok(value.clone())
        }
        None => interp
            .var(&args[1])
            .map(str::to_string)
            .ok_or_else(|| ScriptError::UndefinedVariable(args[1].clone()).into()),
    }
}

fn cmd_unset<H: 'static>(interp: &mut Interp<H>, args: &[String]) -> EvalResult {
    check_arity(args, 2, usize::MAX, "unset varName ?varName ...?")?;
    for name in &args[1..] {
        if interp.unset_var(name).is_none() {
            return Err(ScriptError::UndefinedVariable(name.clone()).into());
        }
    }
    Ok(String::new())
}

fn cmd_incr<H: 'static>(interp: &mut Interp<H>, args: &[String]) -> EvalResult {
    check_arity(args, 2, 3, "incr varName ?increment?")?;
    let step = match args.get(2) {
        Some(text) => parse_int(text)?,
        None => 1,
    };
    let current = match interp.var(&args[1]) {
        Some(text) => parse_int(text)?,
        None => 0,
    };
    let value = current.wrapping_add(step).to_string();
    interp.set_var(&args[1], value.clone());
    Ok(value)
}

fn cmd_append<H: 'static>(interp: &mut Interp<H>, args: &[String]) -> EvalResult {
    check_arity(args, 2, usize::MAX, "append varName ?value ...?")?;
    let mut value = interp.var(&args[1]).unwrap_or_default().to_string();
    for piece in &args[2..] {
        value.push_str(piece);
    }
    interp.set_var(&args[1], value.clone());
    Ok(value)
}

fn cmd_expr<H: 'static>(interp: &mut Interp<H>, args: &[String]) -> EvalResult {
    check_arity(args, 2, usize::MAX, "expr arg ?arg ...?")?;
    let value = interp.eval_expr(&args[1..].join(" "))?;
    Ok(format_number(value))
}

fn cmd_if<H: 'static>(interp: &mut Interp<H>, args: &[String]) -> EvalResult {
    const USAGE: &str = "if expr ?then? body ?elseif expr ?then? body ...? ?else? ?body?";
    let mut i = 1;
    loop {
        let condition = args.get(i).ok_or_else(|| ScriptError::arity(USAGE))?;
        i += 1;
        if args.get(i).is_some_and(|w| w == "then") {
            i += 1;
        }
        let body = args.get(i).ok_or_else(|| ScriptError::arity(USAGE))?;
        i += 1;
        if interp.eval_condition(condition)? {
            return interp.eval(body);
        }
        match args.get(i).map(String::as_str) {
            None => return Ok(String::new()),
            Some("elseif") => i += 1,
            Some("else") => {
                let body = args.get(i + 1).ok_or_else(|| ScriptError::arity(USAGE))?;
                if args.len() > i + 2 {
                    return Err(ScriptError::arity(USAGE).into());
                }
                return interp.eval(body);
            }
            Some(_) if args.len() == i + 1 => return interp.eval(&args[i]),
            Some(_) => return Err(ScriptError::arity(USAGE).into()),
        }
    }
}

/// Run one loop iteration. Returns false when the loop should stop.
fn loop_body<H: 'static>(interp: &mut Interp<H>, body: &str) -> Result<bool, Flow> {
    match interp.eval(body) {
        Ok(_) | Err(Flow::Continue) => Ok(true),
        Err(Flow::Break) => Ok(false),
        Err(e) => Err(e),
    }
}

fn cmd_while<H: 'static>(interp: &mut Interp<H>, args: &[String]) -> EvalResult {
    check_arity(args, 3, 3, "while test command")?;
    while interp.eval_condition(&args[1])? {
        if !loop_body(interp, &args[2])? {
            break;
        }
    }
    Ok(String::new())
}

fn cmd_for<H: 'static>(interp: &mut Interp<H>, args: &[String]) -> EvalResult {
    check_arity(args, 5, 5, "for start test next command")?;
    interp.eval(&args[1])?;
    while interp.eval_condition(&args[2])? {
        if !loop_body(interp, &args[4])? {
            break;
        }
        interp.eval(&args[3])?;
    }
    Ok(String::new())
}

fn cmd_foreach<H: 'static>(interp: &mut Interp<H>, args: &[String]) -> EvalResult {
    check_arity(args, 4, 4, "foreach varName list command")?;
    for item in parse_list(&args[2])? {
        interp.set_var(&args[1], item);
        if !loop_body(interp, &args[3])? {
            break;
        }
    }
    Ok(String::new())
}

fn cmd_proc<H: 'static>(interp: &mut Interp<H>, args: &[String]) -> EvalResult {
    check_arity(args, 4, 4, "proc name args body")?;
    let params = parse_list(&args[2])?;
    interp.register_proc(&args[1], params, args[3].clone());
    Ok(String::new())
}

fn cmd_catch<H: 'static>(interp: &mut Interp<H>, args: &[String]) -> EvalResult {
    check_arity(args, 2, 3, "catch script ?varName?")?;
    let outcome = interp.eval(&args[1]);
    let code = ReturnCode::of(&outcome);
    let value = match outcome {
        Ok(value) | Err(Flow::Return(value)) => value,
        Err(Flow::Error(e)) => e.to_string(),
        Err(Flow::Break | Flow::Continue) => String::new(),
    };
    if let Some(name) = args.get(2) {
        interp.set_var(name, value);
    }
    Ok(code.as_int().to_string())
}

fn cmd_lindex<H: 'static>(_interp: &mut Interp<H>, args: &[String]) -> EvalResult {
    check_arity(args, 3, 3, "lindex list index")?;
    let items = parse_list(&args[1])?;
    let index = parse_int(&args[2])?;
    Ok(usize::try_from(index)
        .ok()
        .and_then(|i| items.into_iter().nth(i))
        .unwrap_or_default())
}

fn cmd_info<H: 'static>(interp: &mut Interp<H>, args: &[String]) -> EvalResult {
    const USAGE: &str = "info exists varName | info commands";
    match args.get(1).map(String::as_str) {
        Some("exists") if args.len() == 3 => {
            Ok(if interp.var(&args[2]).is_some() { "1" } else { "0" }.to_string())
        }
        Some("commands") if args.len() == 2 => Ok(format_list(&interp.procedure_names())),
        _ => Err(ScriptError::arity(USAGE).into()),
    }
}
