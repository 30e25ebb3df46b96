//! CLI module for the rosetta translator
//!
//! ## Commands
//!
//! - `check <program.json>` - load the program and report diagnostics
//! - `emit <program.json> --out <dir>` - load, translate and write one file per type
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::config::{EmitConfig, TargetKind};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Source-to-source translator for type-checked programs
#[derive(Parser, Debug)]
#[command(name = "rosetta")]
#[command(version = VERSION)]
#[command(about = "Translate a type-checked program into TypeScript or Python", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a program and report its diagnostics
    Check {
        /// Serialized program model
        #[arg(value_name = "PROGRAM")]
        program: PathBuf,
        /// Backend whose compiler extensions are run
        #[arg(long, value_enum, default_value_t = TargetKind::TypeScript)]
        target: TargetKind,
    },

    /// Translate a program and write the output files
    Emit {
        /// Serialized program model
        #[arg(value_name = "PROGRAM")]
        program: PathBuf,
        /// Output directory
        #[arg(short, long = "out", value_name = "DIR")]
        out_dir: PathBuf,
        #[command(flatten)]
        options: EmitOptions,
    },
}

/// Flags that map onto [`EmitConfig`].
#[derive(Args, Debug, Clone)]
pub struct EmitOptions {
    /// Target language
    #[arg(long, value_enum, default_value_t = TargetKind::TypeScript)]
    pub target: TargetKind,
    /// Maximum number of types emitted concurrently (default: processor count)
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,
    /// Emit on a single worker
    #[arg(long)]
    pub debug: bool,
    /// Give nested types their own output files
    #[arg(long = "flatten-nested")]
    pub flatten_nested: bool,
    /// Spaces per indentation level
    #[arg(long = "indent", value_name = "WIDTH", default_value_t = 4)]
    pub indent: usize,
}

impl EmitOptions {
    pub fn to_config(&self) -> EmitConfig {
        let mut config = EmitConfig::new()
            .with_target(self.target)
            .with_debug(self.debug)
            .with_flatten_nested_types(self.flatten_nested)
            .with_indent_width(self.indent);
        if let Some(jobs) = self.jobs {
            config = config.with_parallelism(jobs);
        }
        config
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Check { program, target } => commands::check_program(&program, target),
        Command::Emit {
            program,
            out_dir,
            options,
        } => commands::emit_program(&program, &out_dir, &options.to_config()),
    }
}

// ============================================================================
// Tests
// ============================================================================
