//! CLI module for the minitest runner
//!
//! ## Usage
//!
//! `minitest [OPTIONS] <MODULE>...` runs each module binary in its own process and prints a combined report.
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//! - `console` - Console and JSON reporters
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
pub mod console;

use std::fmt;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use crate::version::MINITEST_VERSION;
use commands::OutputMode;

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

    pub fn with_code(message: impl Into<String>, code: i32) -> Self {
        Self::new(message, ExitCode(code))
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

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Metadata-driven test runner
#[derive(Parser, Debug)]
#[command(name = "minitest")]
#[command(version = MINITEST_VERSION)]
#[command(about = "Run minitest modules, each in its own process", long_about = None)]
pub struct Cli {
    /// Test module binaries to run, in order
    #[arg(value_name = "MODULE", required = true)]
    pub modules: Vec<PathBuf>,

    /// Echo output printed by test modules
    #[arg(short, long)]
    pub verbose: bool,

    /// Only run cases whose display name contains PATTERN
    #[arg(short = 'k', long, value_name = "PATTERN")]
    pub filter: Option<String>,

    /// Per-case timeout for asynchronous bodies and hooks
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print a JSON run report instead of console output
    #[arg(long, conflicts_with = "verbose")]
    pub json: bool,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Console {
                verbose: self.verbose,
                color: !self.no_color && std::io::stdout().is_terminal(),
            }
        }
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
    let mode = cli.output_mode();
    let config = commands::runner_config(cli.filter, cli.timeout_ms)?;
    commands::run_modules(&cli.modules, &config, mode)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_modules() {
        let cli = Cli::try_parse_from(["minitest", "target/debug/a", "target/debug/b"]).unwrap();
        assert_eq!(cli.modules.len(), 2);
        assert!(!cli.verbose && !cli.json);
    }

    #[test]
    fn test_cli_requires_a_module() {
        assert!(Cli::try_parse_from(["minitest"]).is_err());
    }

    #[test]
    fn test_cli_parse_flags() {
        let cli = Cli::try_parse_from(["minitest", "-v", "-k", "add", "--timeout", "250", "--no-color", "calc"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.no_color);
        assert_eq!(cli.filter.as_deref(), Some("add"));
        assert_eq!(cli.timeout_ms, Some(250));
    }

    #[test]
    fn test_cli_json_mode() {
        let cli = Cli::try_parse_from(["minitest", "--json", "calc"]).unwrap();
        assert_eq!(cli.output_mode(), OutputMode::Json);
        assert!(Cli::try_parse_from(["minitest", "--json", "-v", "calc"]).is_err());
    }
}
