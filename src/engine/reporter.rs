//! Reporter boundary.
//!
//! The engine never prints. Everything a user sees flows through a [`Reporter`], in this order per module:
//! module start, discovery warnings, then for each class a start event, one completion per case (fixture warnings
//! interleaved) and a class summary, and finally the module summary. The driver adds load faults, pass-through
//! module output and the final run summary.

use super::discovery::DiscoveryWarning;
use super::error::LoadFault;
use super::results::{ClassResult, ModuleResult, RunTotals, TestCaseResult};

/// Observer for run progress. Only case and module completion are required.
pub trait Reporter {
    fn on_module_start(&mut self, _module: &str) {}

    fn on_discovery_warning(&mut self, _warning: &DiscoveryWarning) {}

    fn on_class_start(&mut self, _class: &str, _description: Option<&str>) {}

    fn on_case_complete(&mut self, class: &str, result: &TestCaseResult);

    /// An after-each hook faulted. The case outcome is unchanged.
    fn on_fixture_warning(&mut self, _class: &str, _case: &str, _message: &str) {}

    fn on_class_complete(&mut self, _result: &ClassResult) {}

    fn on_module_complete(&mut self, result: &ModuleResult);

    fn on_load_fault(&mut self, _module: &str, _fault: &LoadFault) {}

    /// A stdout line from a module process that was not a protocol event.
    fn on_module_output(&mut self, _module: &str, _line: &str) {}

    fn on_run_complete(&mut self, _totals: &RunTotals) {}
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn on_module_start(&mut self, module: &str) {
        (**self).on_module_start(module)
    }
    fn on_discovery_warning(&mut self, warning: &DiscoveryWarning) {
        (**self).on_discovery_warning(warning)
    }
    fn on_class_start(&mut self, class: &str, description: Option<&str>) {
        (**self).on_class_start(class, description)
    }
    fn on_case_complete(&mut self, class: &str, result: &TestCaseResult) {
        (**self).on_case_complete(class, result)
    }
    fn on_fixture_warning(&mut self, class: &str, case: &str, message: &str) {
        (**self).on_fixture_warning(class, case, message)
    }
    fn on_class_complete(&mut self, result: &ClassResult) {
        (**self).on_class_complete(result)
    }
    fn on_module_complete(&mut self, result: &ModuleResult) {
        (**self).on_module_complete(result)
    }
    fn on_load_fault(&mut self, module: &str, fault: &LoadFault) {
        (**self).on_load_fault(module, fault)
    }
    fn on_module_output(&mut self, module: &str, line: &str) {
        (**self).on_module_output(module, line)
    }
    fn on_run_complete(&mut self, totals: &RunTotals) {
        (**self).on_run_complete(totals)
    }
}

/// Reporter that stays silent.
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn on_case_complete(&mut self, _class: &str, _result: &TestCaseResult) {}
    fn on_module_complete(&mut self, _result: &ModuleResult) {}
}

/// Reporter that records a one-line trace of every event, for assertions on ordering.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<String>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events starting with `prefix`.
    pub fn matching<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.events
            .iter()
            .map(String::as_str)
            .filter(move |e| e.starts_with(prefix))
    }
}

impl Reporter for RecordingReporter {
    fn on_module_start(&mut self, module: &str) {
        self.events.push(format!("module_start {module}"));
    }

    fn on_discovery_warning(&mut self, warning: &DiscoveryWarning) {
        self.events.push(format!("warning {warning}"));
    }

    fn on_class_start(&mut self, class: &str, _description: Option<&str>) {
        self.events.push(format!("class_start {class}"));
    }

    fn on_case_complete(&mut self, class: &str, result: &TestCaseResult) {
        let status = if result.passed { "passed" } else { "failed" };
        self.events.push(format!("case {class}::{} {status}", result.name));
    }

    fn on_fixture_warning(&mut self, class: &str, case: &str, message: &str) {
        self.events.push(format!("fixture_warning {class}::{case} {message}"));
    }

    fn on_class_complete(&mut self, result: &ClassResult) {
        self.events.push(format!(
            "class_complete {} {}/{}",
            result.name,
            result.passed(),
            result.total()
        ));
    }

    fn on_module_complete(&mut self, result: &ModuleResult) {
        self.events.push(format!(
            "module_complete {} {}/{}",
            result.name,
            result.passed(),
            result.total()
        ));
    }

    fn on_load_fault(&mut self, module: &str, fault: &LoadFault) {
        self.events.push(format!("load_fault {module}: {fault}"));
    }

    fn on_module_output(&mut self, module: &str, line: &str) {
        self.events.push(format!("output {module}: {line}"));
    }

    fn on_run_complete(&mut self, totals: &RunTotals) {
        self.events.push(format!(
            "run_complete {}/{} load_faults={}",
            totals.passed, totals.total, totals.load_faults
        ));
    }
}
