//! Result model: case → class → module → run.
//!
//! Only case results store data. Pass/fail/total counts at every level above are derived on demand so they can
//! never drift from the cases they summarize.

use std::time::Duration;

use minitest_core::Fault;
use serde::{Deserialize, Serialize};

/// Classification attached to a non-passing case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// An assertion helper reported a violated expectation.
    AssertionFailure,
    /// The before-each hook faulted; the body never ran.
    FixtureFailure,
    /// The test class could not be instantiated.
    InfrastructureFault,
    /// Any other fault or panic from the body, including argument mismatches and timeouts.
    UnexpectedFault,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::AssertionFailure => "assertion failure",
            FaultKind::FixtureFailure => "fixture failure",
            FaultKind::InfrastructureFault => "infrastructure fault",
            FaultKind::UnexpectedFault => "unexpected fault",
        }
    }
}

/// A fault captured into a result. The live `Fault` cannot cross the process boundary; this record can.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedFault {
    pub kind: FaultKind,
    /// Message of the original fault, without any classification prefix.
    pub message: String,
    /// Rust type name of the original error.
    pub type_name: String,
}

impl CapturedFault {
    pub fn capture(kind: FaultKind, fault: &Fault) -> Self {
        Self {
            kind,
            message: fault.to_string(),
            type_name: fault.type_name().to_string(),
        }
    }
}

/// Outcome of one executed case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseResult {
    /// Display name (method name, data-row rendering, or the explicit override).
    pub name: String,
    pub passed: bool,
    pub failure_message: Option<String>,
    pub fault: Option<CapturedFault>,
    pub description: Option<String>,
    pub duration: Duration,
}

impl TestCaseResult {
    pub fn pass(name: impl Into<String>, description: Option<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            passed: true,
            failure_message: None,
            fault: None,
            description,
            duration,
        }
    }

    pub fn fail(
        name: impl Into<String>,
        description: Option<String>,
        message: impl Into<String>,
        fault: CapturedFault,
        duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            passed: false,
            failure_message: Some(message.into()),
            fault: Some(fault),
            description,
            duration,
        }
    }

    pub fn fault_kind(&self) -> Option<FaultKind> {
        self.fault.as_ref().map(|f| f.kind)
    }
}

/// Results of every executed case in one test class, in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassResult {
    pub name: String,
    pub description: Option<String>,
    pub cases: Vec<TestCaseResult>,
}

impl ClassResult {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
            cases: Vec::new(),
        }
    }

    pub fn push(&mut self, result: TestCaseResult) {
        self.cases.push(result);
    }

    pub fn total(&self) -> usize {
        self.cases.len()
    }

    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.iter().filter(|c| !c.passed).count()
    }
}

/// Results of one module, class by class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleResult {
    pub name: String,
    pub classes: Vec<ClassResult>,
}

impl ModuleResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.classes.iter().map(ClassResult::total).sum()
    }

    pub fn passed(&self) -> usize {
        self.classes.iter().map(ClassResult::passed).sum()
    }

    pub fn failed(&self) -> usize {
        self.classes.iter().map(ClassResult::failed).sum()
    }

    pub fn class(&self, name: &str) -> Option<&ClassResult> {
        self.classes.iter().find(|c| c.name == name)
    }
}

/// Process-wide fold over every module of one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub modules: usize,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Modules that could not be loaded or died before completing.
    pub load_faults: usize,
}

impl RunTotals {
    pub fn record(&mut self, module: &ModuleResult) {
        self.modules += 1;
        self.total += module.total();
        self.passed += module.passed();
        self.failed += module.failed();
    }

    pub fn record_load_fault(&mut self) {
        self.modules += 1;
        self.load_faults += 1;
    }

    /// No failed case and every module loaded.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.load_faults == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(name: &str, passed: bool) -> TestCaseResult {
        if passed {
            TestCaseResult::pass(name, None, Duration::from_millis(1))
        } else {
            let fault = CapturedFault {
                kind: FaultKind::AssertionFailure,
                message: "expected: 1, actual: 2".into(),
                type_name: "minitest_core::fault::AssertionFailure".into(),
            };
            TestCaseResult::fail(name, None, "expected: 1, actual: 2", fault, Duration::from_millis(1))
        }
    }

    #[test]
    fn test_class_counts_are_derived() {
        let mut class = ClassResult::new("Calc", None);
        class.push(case("a", true));
        class.push(case("b", false));
        class.push(case("c", true));
        assert_eq!((class.passed(), class.failed(), class.total()), (2, 1, 3));
    }

    #[test]
    fn test_module_counts_sum_classes() {
        let mut first = ClassResult::new("First", None);
        first.push(case("a", true));
        let mut second = ClassResult::new("Second", None);
        second.push(case("b", false));
        second.push(case("c", false));

        let module = ModuleResult {
            name: "m".into(),
            classes: vec![first, second],
        };
        assert_eq!((module.passed(), module.failed(), module.total()), (1, 2, 3));
        assert!(module.class("Second").is_some());
    }

    #[test]
    fn test_run_totals_fold() {
        let mut module = ModuleResult::new("m");
        let mut class = ClassResult::new("C", None);
        class.push(case("a", true));
        class.push(case("b", false));
        module.classes.push(class);

        let mut totals = RunTotals::default();
        assert!(totals.is_success());
        totals.record(&module);
        totals.record(&ModuleResult::new("empty"));
        assert_eq!(totals.modules, 2);
        assert_eq!(totals.total, 2);
        assert_eq!(totals.failed, 1);
        assert!(!totals.is_success());
    }

    #[test]
    fn test_load_fault_alone_fails_the_run() {
        let mut totals = RunTotals::default();
        totals.record(&ModuleResult::new("ok"));
        totals.record_load_fault();
        assert_eq!(totals.failed, 0);
        assert!(!totals.is_success());
    }

    #[test]
    fn test_fault_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FaultKind::FixtureFailure).expect("serialize");
        assert_eq!(json, "\"fixture_failure\"");
    }
}
