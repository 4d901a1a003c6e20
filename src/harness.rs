//! Entry point of a test module binary.
//!
//! A module binary is an ordinary executable whose `main` is generated by [`module_main!`](crate::module_main).
//! Spawned by the runner, it speaks the event protocol on stdout; started by hand, it prints the console report
//! for its own classes and exits non-zero when anything failed.

use std::io::{self, IsTerminal};
use std::panic;

use tracing::error;

use crate::cli::console::ConsoleReporter;
use crate::engine::config::{RunnerConfig, protocol_token};
use crate::engine::module::{InventoryModule, TestModule};
use crate::engine::orchestrator::Orchestrator;
use crate::engine::reporter::Reporter;
use crate::engine::results::RunTotals;
use crate::isolation::protocol::{Marker, ProtocolReporter};

/// Run every `#[test_class]` linked into this binary and return the process exit code.
pub fn serve() -> i32 {
    crate::init_logging("warn");

    let config = match RunnerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return 2;
        }
    };

    // Panics are captured as case faults; the default hook would only duplicate them on stderr.
    panic::set_hook(Box::new(|_| {}));

    let module = InventoryModule::current();
    let orchestrator = Orchestrator::new(config);

    if let Some(token) = protocol_token() {
        // Unlocked handle: test code and its threads keep writing to stdout between events.
        let mut reporter = ProtocolReporter::new(io::stdout(), Marker::new(token));
        match orchestrator.run_module(&module, &mut reporter) {
            Ok(result) if result.failed() == 0 => 0,
            Ok(_) => 1,
            Err(fault) => {
                error!("{fault}");
                1
            }
        }
    } else {
        let mut reporter = ConsoleReporter::stdout(false, io::stdout().is_terminal());
        let mut totals = RunTotals::default();
        match orchestrator.run_module(&module, &mut reporter) {
            Ok(result) => totals.record(&result),
            Err(fault) => {
                reporter.on_load_fault(module.name(), &fault);
                totals.record_load_fault();
            }
        }
        reporter.on_run_complete(&totals);
        if totals.is_success() { 0 } else { 1 }
    }
}

/// Generate `main` for a test module binary.
///
/// ```ignore
/// use minitest::prelude::*;
///
/// struct Calc;
///
/// #[test_class]
/// impl Calc {
///     pub fn new() -> Self { Calc }
///
///     #[test_method]
///     #[data_row(2, 3, 5)]
///     fn add(&mut self, a: i64, b: i64, expected: i64) -> AssertResult {
///         assert::are_equal(expected, a + b)
///     }
/// }
///
/// minitest::module_main!();
/// ```
#[macro_export]
macro_rules! module_main {
    () => {
        fn main() {
            ::std::process::exit($crate::harness::serve())
        }
    };
}
