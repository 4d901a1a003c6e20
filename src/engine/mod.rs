//! The in-process test engine.
//!
//! ## Modules
//!
//! - `discovery` - registry entries → ordered execution plan
//! - `executor` - one case: instantiate, hooks, body, classification
//! - `orchestrator` - one module: load, discover, execute, aggregate, release
//! - `context` / `module` - where type entries come from and how a module is released
//! - `results` / `reporter` - what a run produces and who observes it
//! - `config` / `error` - runner settings and module-level failures

pub mod config;
pub mod context;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod module;
pub mod orchestrator;
pub mod reporter;
pub mod results;

pub use config::RunnerConfig;
pub use context::RunContext;
pub use discovery::{Discovery, DiscoveryWarning, HookKind, TestCaseMetadata, TestClassDescriptor, discover};
pub use error::{LoadFault, ProtocolError};
pub use executor::{Executor, TimedOut};
pub use module::{InventoryModule, StaticModule, TestModule};
pub use orchestrator::Orchestrator;
pub use reporter::{NullReporter, RecordingReporter, Reporter};
pub use results::{CapturedFault, ClassResult, FaultKind, ModuleResult, RunTotals, TestCaseResult};
