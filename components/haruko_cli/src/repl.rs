//! REPL (Read-Eval-Print Loop) implementation

use crate::error::{CliError, CliResult};
use crate::runtime::Runtime;
use core_types::Value;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// State of one REPL session
///
/// Every evaluated entry compiles to its own unit, named `Repl1`, `Repl2`
/// and so on.
#[derive(Debug, Default)]
pub struct Session {
    entries: u32,
}

impl Session {
    /// Create a session with no entries yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for the next unit
    pub fn next_unit_name(&mut self) -> String {
        self.entries += 1;
        format!("Repl{}", self.entries)
    }

    /// Compile and run one entry as a fresh unit
    pub fn eval(&mut self, runtime: &mut Runtime, source: &str) -> CliResult<Value> {
        let unit_name = self.next_unit_name();
        runtime.execute_source(&unit_name, source)
    }
}

/// Run the interactive REPL
///
/// # Returns
/// `Ok(())` when REPL exits normally
pub fn run_repl(runtime: &mut Runtime) -> CliResult<()> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| CliError::Repl(format!("Failed to initialize editor: {}", e)))?;
    let mut session = Session::new();

    println!("Haruko v{}", env!("CARGO_PKG_VERSION"));
    println!("Type an expression or 'exit' to quit.");
    println!();

    let mut line_buffer = String::new();

    loop {
        let prompt = if line_buffer.is_empty() { "> " } else { "... " };

        match editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if line_buffer.is_empty() {
                    if trimmed == "exit" || trimmed == ".exit" || trimmed == "quit" {
                        println!("Goodbye!");
                        break;
                    }
                    if trimmed == ".help" {
                        print_help();
                        continue;
                    }
                    if trimmed.is_empty() {
                        continue;
                    }
                } else {
                    line_buffer.push('\n');
                }
                line_buffer.push_str(&line);

                if !is_input_complete(&line_buffer) {
                    continue;
                }

                let _ = editor.add_history_entry(line_buffer.as_str());
                match session.eval(runtime, &line_buffer) {
                    Ok(value) if value.is_nil() => {}
                    Ok(value) => println!("{}", value.repr()),
                    Err(e) => eprintln!("{}", e),
                }
                line_buffer.clear();
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                if line_buffer.is_empty() {
                    println!("Press Ctrl-D or type 'exit' to quit");
                } else {
                    println!("^C");
                    line_buffer.clear();
                }
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                return Err(CliError::Repl(format!("Readline error: {}", err)));
            }
        }
    }

    Ok(())
}

fn print_help() {
    println!("REPL Commands:");
    println!("  .help     - Show this help message");
    println!("  .exit     - Exit the REPL");
    println!("  exit      - Exit the REPL");
    println!("  quit      - Exit the REPL");
}

/// Whether every bracket opened in `input` has been closed
///
/// Brackets inside strings and `;` comments do not count.
/// Over-closed input counts as complete so the compiler reports it.
fn is_input_complete(input: &str) -> bool {
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escape_next = false;
    let mut in_comment = false;

    for c in input.chars() {
        if in_comment {
            in_comment = c != '\n';
            continue;
        }
        if escape_next {
            escape_next = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            ';' => in_comment = true,
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            _ => {}
        }
    }

    depth <= 0 && !in_string
}
