#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
//! minitest: metadata-driven test discovery and execution
//!
//! Test code declares classes with `#[test_class]`; the engine discovers them from the metadata the macro
//! registers, builds an ordered plan (data rows expand into cases, priority orders them), executes each case
//! through a fixed lifecycle and aggregates the results. The `minitest` binary runs every module in its own
//! process so nothing a module leaves behind survives into the next one.
//!
//! ## Layout
//!
//! - `engine` - discovery, execution, orchestration, results and the reporter boundary
//! - `isolation` - process-per-module driver and the event protocol between runner and module
//! - `harness` - `main` of a module binary (`module_main!`)
//! - `cli` - argument parsing and the console / JSON reporters
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The crate enforces
//!   `#![deny(clippy::unwrap_used)]`; `cli` also denies `expect_used`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **User code**: panics raised by test bodies, hooks and constructors are caught at the case boundary and
//!   reported as faults; they never abort a run.

extern crate self as minitest;

pub mod cli;
pub mod engine;
pub mod harness;
pub mod isolation;
pub mod registry;
pub mod version;

pub use inventory;
pub use minitest_assert as assert;
pub use minitest_core::invoke;
pub use minitest_core::{
    ClassTag, DataRow, Fault, IntoOutcome, Invocation, MethodEntry, MethodTag, Outcome, TestType, TypeEntry, Value,
};
pub use minitest_derive::test_class;
pub use registry::TypeRegistration;

pub use engine::{
    ClassResult, FaultKind, LoadFault, ModuleResult, Orchestrator, Reporter, RunTotals, RunnerConfig, StaticModule,
    TestCaseResult, TestModule,
};

/// Everything a test module usually needs.
pub mod prelude {
    pub use crate::assert::{self, AssertContext, AssertResult};
    pub use crate::{Fault, Outcome, test_class};
}

/// Install the `tracing` subscriber. `RUST_LOG` overrides `default_filter`. Always writes to stderr so stdout
/// stays free for reports and protocol events.
pub fn init_logging(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
