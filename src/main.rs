// ABOUTME: CLI entry point: executes script files or runs the interactive
// REPL with SIGINT-driven cancellation.

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use vesper::lexer::match_chars;
use vesper::{EvalError, Scope, Value, Vm};

/// Interpreter for the Vesper scripting language
#[derive(Parser, Debug)]
#[command(name = "vesper")]
#[command(version)]
#[command(about = "A tree-walking interpreter for a small s-expression language")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Evaluate one expression and print its value
    #[arg(short = 'e', long = "eval", value_name = "EXPR", conflicts_with = "script")]
    expr: Option<String>,
}

/// Host-level exit: `(exit)` or `(exit code)`.
fn builtin_exit(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let code = match args {
        [] => 0,
        [Value::Int(code)] => *code as i32,
        _ => {
            scope.throw("exit : expected an optional int status");
            return Value::Nil;
        }
    };
    std::process::exit(code);
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let vm = Vm::with_builtins();
    vm.register("exit", builtin_exit);

    if let Some(expr) = args.expr {
        return match vm.eval(&expr) {
            Ok(Value::Nil) => ExitCode::SUCCESS,
            Ok(value) => {
                println!("{value}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::FAILURE
            }
        };
    }

    if let Some(path) = args.script {
        return run_file(&vm, &path);
    }

    run_interactive(&vm)
}

fn run_file(vm: &Vm, path: &PathBuf) -> ExitCode {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("error: cannot open {}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };
    match vm.load_reader(file) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// The interactive loop: accumulates input lines until the delimiters
/// balance, evaluates, and prints non-nil results. SIGINT while an
/// evaluation is running signals the VM to stop; the cancellation error is
/// reported and the VM resumed.
fn run_interactive(vm: &Vm) -> ExitCode {
    let config = Config::builder().auto_add_history(true).build();
    let mut editor = match DefaultEditor::with_config(config) {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("error: failed to initialize the line editor: {err}");
            return ExitCode::FAILURE;
        }
    };
    let history_file = ".vesper_history";
    let _ = editor.load_history(history_file);

    // SIGINT stops the VM only while an evaluation is running; at the
    // prompt it just clears the line.
    let running = Arc::new(AtomicBool::new(false));
    {
        let running = running.clone();
        let control = vm.root().control().clone();
        let mut signals = match signal_hook::iterator::Signals::new([signal_hook::consts::SIGINT])
        {
            Ok(signals) => signals,
            Err(err) => {
                eprintln!("error: cannot install signal handler: {err}");
                return ExitCode::FAILURE;
            }
        };
        std::thread::spawn(move || {
            for _ in signals.forever() {
                if running.load(Ordering::SeqCst) {
                    control.stop();
                }
            }
        });
    }

    println!("vesper {}", env!("CARGO_PKG_VERSION"));
    println!("Type an expression, or Ctrl-D to leave.");

    let mut expression = String::new();
    loop {
        let prompt = if expression.is_empty() { ">>> " } else { "... " };
        match editor.readline(prompt) {
            Ok(line) => {
                let part = line.trim();
                if part.is_empty() {
                    continue;
                }
                if expression.is_empty() && !part.starts_with('(') {
                    // A bare atom: resolve and print it directly.
                    report(vm.eval(part));
                    continue;
                }
                if !expression.is_empty() {
                    expression.push('\n');
                }
                expression.push_str(part);
                if match_chars(expression.trim(), 0, b'(', b')').is_some() {
                    running.store(true, Ordering::SeqCst);
                    let outcome = vm.eval(&expression);
                    running.store(false, Ordering::SeqCst);
                    if matches!(outcome, Err(EvalError::Cancelled)) {
                        eprintln!("interrupted");
                        vm.resume();
                    } else {
                        report(outcome);
                    }
                    expression.clear();
                }
            }
            Err(ReadlineError::Interrupted) => {
                expression.clear();
                println!("^C");
            }
            Err(ReadlineError::Eof) => {
                println!("\nBye...");
                break;
            }
            Err(err) => {
                eprintln!("error: {err}");
                break;
            }
        }
    }

    let _ = editor.save_history(history_file);
    ExitCode::SUCCESS
}

fn report(outcome: Result<Value, EvalError>) {
    match outcome {
        Ok(Value::Nil) => {}
        Ok(value) => println!("=> {value}"),
        Err(err) => eprintln!("error: {err}"),
    }
}
