use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use smallstep::ast::Term;
use smallstep::builtinops::get_builtin_ops;
use smallstep::history::changed_path;
use smallstep::json::{history_to_json, parse_json_term};
use smallstep::sexpr::{ParseConfig, parse_sexpr_with_config};
use smallstep::{Error, History, can_step, redex_path};
use std::panic;
use std::process;
use tracing_subscriber::EnvFilter;

const DEFAULT_STEP_LIMIT: usize = 10_000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let result = panic::catch_unwind(|| {
        run_repl();
    });

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

/// The loaded program and REPL settings
struct Session {
    history: Option<History>,
    step_limit: usize,
}

impl Session {
    fn history(&mut self) -> Option<&mut History> {
        if self.history.is_none() {
            println!("Nothing loaded. Enter an expression first.");
        }
        self.history.as_mut()
    }
}

fn run_repl() {
    println!("smallstep - watch a program reduce one step at a time");
    println!("Enter S-expressions like: (add (mul 2 3) 4)");
    println!("or JSON terms like: [\"add\", 1, 2]");
    println!("Type :help for more commands, or Ctrl+C to exit.");
    println!();

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("Could not initialize REPL: {err}");
            process::exit(1);
        }
    };
    let mut session = Session {
        history: None,
        step_limit: DEFAULT_STEP_LIMIT,
    };

    loop {
        match rl.readline("smallstep> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if line.starts_with(':') {
                    if !handle_command(line, &mut session) {
                        println!("Goodbye!");
                        break;
                    }
                    continue;
                }

                match read_term(line) {
                    Ok(term) => {
                        let history = session.history.insert(History::new(term));
                        print_snapshot(history);
                        run_to_normal_form(history, session.step_limit);
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

/// JSON when the line looks like JSON, s-expression otherwise
fn read_term(line: &str) -> Result<Term, Error> {
    if line.starts_with('[') || line.starts_with('{') {
        parse_json_term(line)
    } else {
        parse_sexpr_with_config(
            line,
            ParseConfig {
                handle_comments: true,
            },
        )
    }
}

/// Returns false when the REPL should exit
fn handle_command(line: &str, session: &mut Session) -> bool {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default();
    let argument = words.next();

    match command {
        ":help" => print_help(),
        ":builtins" => print_builtins(),
        ":quit" | ":exit" => return false,
        ":limit" => match argument.map(str::parse::<usize>) {
            Some(Ok(limit)) => {
                session.step_limit = limit;
                println!("Step limit set to {limit}");
            }
            Some(Err(_)) => println!("Usage: :limit N"),
            None => println!("Step limit is {}", session.step_limit),
        },
        ":step" => {
            if let Some(history) = session.history() {
                match history.forward().map(|next| next.is_some()) {
                    Ok(true) => print_snapshot(history),
                    Ok(false) => println!("Already in normal form."),
                    Err(e) => println!("Error: {e}"),
                }
            }
        }
        ":back" => {
            if let Some(history) = session.history() {
                if history.backward().is_some() {
                    print_snapshot(history);
                } else {
                    println!("Already at the initial term.");
                }
            }
        }
        ":run" => {
            let limit = session.step_limit;
            if let Some(history) = session.history() {
                run_to_normal_form(history, limit);
            }
        }
        ":path" => {
            if let Some(history) = session.history() {
                match redex_path(history.current()) {
                    Some(path) => println!("next redex at {path:?}"),
                    None => println!("normal form"),
                }
                if let Some(previous) = history.position().checked_sub(1) {
                    let snapshots = history.snapshots();
                    if let Some(path) = changed_path(&snapshots[previous], history.current()) {
                        println!("last change at {path:?}");
                    }
                }
            }
        }
        ":json" => {
            if let Some(history) = session.history() {
                match history_to_json(history) {
                    Ok(json) => println!("{json}"),
                    Err(e) => println!("Error: {e}"),
                }
            }
        }
        other => println!("Unknown command {other}. Type :help for a list of commands."),
    }
    true
}

/// Step from the cursor until normal form, an error, or `limit` new steps
fn run_to_normal_form(history: &mut History, limit: usize) {
    for _ in 0..limit {
        match history.forward().map(|next| next.is_some()) {
            Ok(true) => print_snapshot(history),
            Ok(false) => return,
            Err(e) => {
                println!("Error: {e}");
                return;
            }
        }
    }
    if can_step(history.current()) {
        println!("Stopped after {limit} steps; use :run to continue or :limit to raise the bound.");
    }
}

fn print_snapshot(history: &History) {
    println!("{:>4}: {}", history.position(), history.current());
}

fn print_help() {
    println!("Commands:");
    println!("  <expr>     - Load an expression and print its full reduction");
    println!("  :step      - Take one step forward (replays recorded steps first)");
    println!("  :back      - Move one step back");
    println!("  :run       - Step until normal form, bounded by the step limit");
    println!("  :limit N   - Set the step limit used by :run and new expressions");
    println!("  :path      - Show where the next step will rewrite");
    println!("  :json      - Print the recorded snapshots as JSON");
    println!("  :builtins  - List builtin operations");
    println!("  :quit      - Exit the REPL");
    println!();
    println!("Examples:");
    println!("  (add (mul 2 3) 4)");
    println!("  (if (lt 1 2) 'yes 'no)");
    println!("  ((lambda (x y) (cons x y)) 1 2)");
    println!("  ((lambda (f) (f f 5)) (lambda (self n) (if (lte n 1) 1 (mul n (self self (sub n 1))))))");
    println!();
}

fn print_builtins() {
    let ops = get_builtin_ops();
    println!("Builtin operations ({}):", ops.len());
    let mut col = 0;
    for op in ops {
        print!("  {:<10}", format!("{}/{}", op.id, op.arity));
        col += 1;
        if col % 6 == 0 {
            println!();
        }
    }
    if col % 6 != 0 {
        println!();
    }
    println!();
}
