//! Command line arguments

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Haruko compiler and runtime
#[derive(Debug, Parser)]
#[command(name = "haruko", version, about = "Compile and run Haruko programs")]
pub struct Cli {
    /// What to do; without a command, `--repl` starts the REPL
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Start interactive REPL
    #[arg(short, long)]
    pub repl: bool,

    /// Print the parsed program before compiling
    #[arg(long, global = true)]
    pub print_ast: bool,

    /// Print the disassembled unit before running
    #[arg(long, global = true)]
    pub print_bytecode: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Subcommands
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Compile a source file and execute it
    Run {
        /// Source file; its stem names the unit
        path: PathBuf,
    },
    /// Compile a source file to an artifact
    Compile {
        /// Source file; its stem names the unit
        path: PathBuf,
        /// Artifact path, `<stem>.hku` next to the source by default
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
