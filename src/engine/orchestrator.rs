//! Runs one module: load, discover, execute every selected case, aggregate, release.

use tracing::{debug, instrument, warn};

use super::config::RunnerConfig;
use super::context::RunContext;
use super::discovery::{TestCaseMetadata, discover};
use super::error::LoadFault;
use super::executor::Executor;
use super::module::TestModule;
use super::reporter::Reporter;
use super::results::{ClassResult, ModuleResult};

#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    config: RunnerConfig,
    executor: Executor,
}

impl Orchestrator {
    pub fn new(config: RunnerConfig) -> Self {
        let executor = Executor::new(config.case_timeout);
        Self { config, executor }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every selected case of `module` in plan order.
    ///
    /// Only a failure to load the module is an error. Case faults of any kind end up in the returned result. The
    /// module is unloaded before this returns, on every path.
    #[instrument(skip_all, fields(module = module.name()))]
    pub fn run_module(&self, module: &dyn TestModule, reporter: &mut dyn Reporter) -> Result<ModuleResult, LoadFault> {
        let context = RunContext::acquire(module)?;
        reporter.on_module_start(context.module_name());

        let discovery = discover(context.types());
        for warning in &discovery.warnings {
            warn!("{warning}");
            reporter.on_discovery_warning(warning);
        }

        let mut result = ModuleResult::new(context.module_name());
        for class in &discovery.classes {
            let selected: Vec<&TestCaseMetadata> = class
                .cases
                .iter()
                .filter(|case| self.config.selects(&case.name()))
                .collect();
            if selected.is_empty() && !class.cases.is_empty() {
                debug!(class = class.name, "no case matches the filter");
                continue;
            }

            reporter.on_class_start(class.name, class.description.as_deref());
            let mut class_result = ClassResult::new(class.name, class.description.clone());
            for case in selected {
                let case_result = self.executor.execute(class, case, reporter);
                reporter.on_case_complete(class.name, &case_result);
                class_result.push(case_result);
            }
            reporter.on_class_complete(&class_result);
            result.classes.push(class_result);
        }

        debug!(passed = result.passed(), failed = result.failed(), "module complete");
        reporter.on_module_complete(&result);
        drop(context);
        Ok(result)
    }
}
