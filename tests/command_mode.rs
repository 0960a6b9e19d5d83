//! Integration tests for command mode (-c/--command flag) and the stdin prompt

use std::io::Write;
use std::process::{Command, Stdio};

fn tabula() -> Command {
    let mut cmd = Command::new("cargo");
    cmd.arg("run").arg("-q").arg("--");
    cmd
}

fn run_command(args: &[&str]) -> (String, String, i32) {
    let output = tabula()
        // Tests must be deterministic and not depend on a user's ~/.config/tabula/tabularc.
        .arg("--no-rc")
        .args(args)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn run_prompt(input: &str) -> (String, String) {
    let mut child = tabula()
        .arg("--no-rc")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn tabula");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write commands");
    let output = child.wait_with_output().expect("Failed to wait for tabula");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

#[test]
fn test_basic_arithmetic() {
    let (stdout, _, code) = run_command(&["-c", "expr 5 + 3"]);
    assert_eq!(stdout.trim(), "8");
    assert_eq!(code, 0);
}

#[test]
fn test_expr_precedence() {
    let (stdout, _, _) = run_command(&["-c", "expr {(1 + 2) * 3}"]);
    assert_eq!(stdout.trim(), "9");
}

#[test]
fn test_formula_over_cells() {
    let (stdout, _, code) = run_command(&[
        "-c",
        "setcell A1 1; setcell A2 2; setcell A3 3; setcell B1 {=SUM(A1:A3)*2}; getvalue B1",
    ]);
    assert_eq!(stdout.trim(), "12");
    assert_eq!(code, 0);
}

#[test]
fn test_puts_output_precedes_result() {
    let (stdout, _, code) = run_command(&["-c", "puts hello; expr 2"]);
    assert_eq!(stdout.trim(), "hello\n2");
    assert_eq!(code, 0);
}

#[test]
fn test_error_exit_code() {
    let (stdout, stderr, code) = run_command(&["-c", "undefined_procedure 1"]);
    assert!(stdout.is_empty());
    assert!(stderr.contains("invalid command name \"undefined_procedure\""));
    assert_eq!(code, 1);
}

#[test]
fn test_circular_formula_is_an_error() {
    let (_, stderr, code) = run_command(&["-c", "setcell A1 {=A1}"]);
    assert!(stderr.contains("Circular dependency"));
    assert_eq!(code, 1);
}

#[test]
fn test_division_by_zero_is_not_an_error() {
    let (stdout, _, code) = run_command(&["-c", "expr 1 / 0"]);
    assert_eq!(stdout.trim(), "Inf");
    assert_eq!(code, 0);
}

#[test]
fn test_rc_file_is_loaded() {
    let path = std::env::temp_dir().join(format!("tabula-test-rc-{}", std::process::id()));
    std::fs::write(&path, "setcell A1 41\nproc answer {} { expr [getvalue A1] + 1 }\n").unwrap();
    let output = tabula()
        .arg("--rc")
        .arg(&path)
        .args(["-c", "answer"])
        .output()
        .expect("Failed to execute command");
    std::fs::remove_file(&path).unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "42");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_prompt_runs_commands_and_keys() {
    let (stdout, stderr) = run_prompt("setcell B2 5\n!l\n!j\ncursor\n!F13\n");
    assert_eq!(stdout.trim(), "5\nB2");
    assert!(stderr.contains("no binding for key \"F13\""));
}
