//! Command implementations.
//!
//! Each command returns a `CliResult<ExitCode>`; printing of errors and the process exit are left to `cli::run`.

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use super::console::{ConsoleReporter, JsonReporter};
use super::{CliError, CliResult, ExitCode};
use crate::engine::config::RunnerConfig;
use crate::engine::reporter::Reporter;
use crate::engine::results::RunTotals;
use crate::isolation;

/// How results are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Console { verbose: bool, color: bool },
    Json,
}

/// Build the runner configuration from command-line values.
pub fn runner_config(filter: Option<String>, timeout_ms: Option<u64>) -> CliResult<RunnerConfig> {
    let mut config = RunnerConfig::default();
    if let Some(filter) = filter {
        if filter.is_empty() {
            return Err(CliError::with_code("error: --filter must not be empty", 2));
        }
        config = config.with_filter(filter);
    }
    if let Some(ms) = timeout_ms {
        if ms == 0 {
            return Err(CliError::with_code("error: --timeout must be at least 1ms", 2));
        }
        config = config.with_case_timeout(Duration::from_millis(ms));
    }
    Ok(config)
}

/// Run every module, each in its own process, and map the totals to an exit code.
pub fn run_modules(modules: &[PathBuf], config: &RunnerConfig, mode: OutputMode) -> CliResult<ExitCode> {
    info!(modules = modules.len(), ?config, "starting run");
    let totals = match mode {
        OutputMode::Console { verbose, color } => drive(modules, config, ConsoleReporter::stdout(verbose, color)),
        OutputMode::Json => drive(modules, config, JsonReporter::stdout()),
    };
    Ok(exit_code(&totals))
}

fn drive(modules: &[PathBuf], config: &RunnerConfig, mut reporter: impl Reporter) -> RunTotals {
    isolation::run_modules(modules, config, &mut reporter)
}

pub fn exit_code(totals: &RunTotals) -> ExitCode {
    if totals.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
