//! Haruko CLI
//!
//! Entry point for the `haruko` binary. Parses CLI arguments and delegates
//! to the Runtime for compilation and execution.

use clap::Parser as ClapParser;
use haruko_cli::{Cli, CliError, Command, Runtime};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut runtime = Runtime::new()
        .with_print_ast(cli.print_ast)
        .with_print_bytecode(cli.print_bytecode);

    let result = match (&cli.command, cli.repl) {
        (Some(Command::Run { path }), _) => runtime.execute_file(path).map(|value| {
            if !value.is_nil() {
                println!("{}", value.repr());
            }
        }),
        (Some(Command::Compile { path, output }), _) => runtime
            .compile_file(path, output.as_deref())
            .map(|written| println!("wrote {}", written.display())),
        (None, true) => runtime.repl(),
        (None, false) => {
            println!("Haruko v{}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Usage:");
            println!("  haruko run <FILE>                 Compile and run a file");
            println!("  haruko compile <FILE> [-o OUT]    Write the compiled artifact");
            println!("  haruko --repl                     Start interactive REPL");
            println!();
            println!("Run 'haruko --help' for more options.");
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Io(e)) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
