//! Tabula - A headless spreadsheet driven by an embedded command language

mod error;
mod rc;

use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::Context;
use tabula_core::Session;
use tabula_engine::script::ReturnCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("Usage: tabula [OPTIONS]");
    eprintln!();
    eprintln!("Without -c, commands are read from stdin one line at a time.");
    eprintln!("A line starting with '!' presses the key that follows it.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <SCRIPT>    Run a script, print its result and exit");
    eprintln!("  --rc <FILE>               Startup file to load instead of the default");
    eprintln!("  --no-rc                   Do not load any startup file");
    eprintln!("  -h, --help                Print help");
}

/// Load the startup file. A missing default file is not an error.
fn load_startup(session: &mut Session, rc_file: Option<PathBuf>, no_rc: bool) {
    if no_rc {
        return;
    }
    let path = match rc_file {
        Some(path) => path,
        None => match rc::default_rc_path() {
            Some(path) if path.is_file() => path,
            _ => {
                info!("no startup file");
                return;
            }
        },
    };
    match rc::read_rc(&path) {
        Ok(text) => {
            let source = path.display().to_string();
            if let Err(e) = session.load_rc(&source, &text) {
                eprintln!("Warning: {}: {}", source, e);
            }
        }
        Err(e) => eprintln!("Warning: {}", e),
    }
}

fn print_output(session: &mut Session) {
    for line in session.take_output() {
        println!("{}", line);
    }
}

/// Run a one-shot script. Returns the process exit code.
fn run_command(session: &mut Session, script: &str) -> i32 {
    let code = session.evaluate(script);
    print_output(session);
    match code {
        ReturnCode::Ok | ReturnCode::Return => {
            if !session.result().is_empty() {
                println!("{}", session.result());
            }
            0
        }
        _ => {
            eprintln!("Error: {}", session.result());
            1
        }
    }
}

/// Read commands from stdin until end of input.
fn run_prompt(session: &mut Session) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            print!("> ");
            io::stdout().flush().context("failed to flush prompt")?;
        }
        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line.context("failed to read command")?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        // Key presses only report through the flash message.
        let (code, pressed) = match line.strip_prefix('!') {
            Some(key) => (session.press(key.trim()), true),
            None => (session.command(line), false),
        };
        print_output(session);
        if code == ReturnCode::Ok && !pressed && !session.result().is_empty() {
            println!("{}", session.result());
        }
        if let Some(message) = session.document_mut().take_flash() {
            eprintln!("{}", message);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    let mut command: Option<String> = None;
    let mut rc_file: Option<PathBuf> = None;
    let mut no_rc = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-c" | "--command" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --command requires a script");
                    std::process::exit(1);
                }
                command = Some(args[i].to_string());
            }
            "--rc" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --rc requires a file path");
                    std::process::exit(1);
                }
                rc_file = Some(PathBuf::from(&args[i]));
            }
            "--no-rc" => no_rc = true,
            arg => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut session = Session::new();
    load_startup(&mut session, rc_file, no_rc);

    if let Some(script) = command {
        std::process::exit(run_command(&mut session, &script));
    }
    if let Err(e) = run_prompt(&mut session) {
        warn!(error = %e, "command prompt stopped");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
