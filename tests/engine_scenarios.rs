//! End-to-end engine scenarios: classes declared with `#[test_class]`, run in-process through the orchestrator.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use minitest::engine::{RecordingReporter, StaticModule};
use minitest::prelude::*;
use minitest::{FaultKind, ModuleResult, Orchestrator, RunnerConfig, TestCaseResult};

fn run(module: &StaticModule) -> (ModuleResult, RecordingReporter) {
    run_with(RunnerConfig::default(), module)
}

fn run_with(config: RunnerConfig, module: &StaticModule) -> (ModuleResult, RecordingReporter) {
    let mut reporter = RecordingReporter::new();
    let result = Orchestrator::new(config)
        .run_module(module, &mut reporter)
        .expect("static modules always load");
    (result, reporter)
}

fn case<'a>(result: &'a ModuleResult, class: &str, name: &str) -> &'a TestCaseResult {
    result
        .class(class)
        .and_then(|c| c.cases.iter().find(|r| r.name == name))
        .unwrap_or_else(|| panic!("no case {class}::{name} in {result:#?}"))
}

// ============================================================================
// Calc: the canonical data-row scenario
// ============================================================================

struct Calc;

#[test_class(description = "Integer arithmetic")]
impl Calc {
    pub fn new() -> Self {
        Calc
    }

    #[test_method]
    #[data_row(2, 3, 5)]
    #[data_row(2, 2, 5)]
    fn add(&mut self, a: i64, b: i64, expected: i64) -> AssertResult {
        assert::are_equal(expected, a + b)
    }
}

#[test]
fn calc_rows_pass_and_fail_independently() {
    let (result, _) = run(&StaticModule::new("calc").with_type::<Calc>());

    let calc = result.class("Calc").unwrap();
    assert_eq!(calc.description.as_deref(), Some("Integer arithmetic"));
    assert_eq!((calc.passed(), calc.failed(), calc.total()), (1, 1, 2));

    assert!(case(&result, "Calc", "add(2, 3, 5)").passed);
    let failed = case(&result, "Calc", "add(2, 2, 5)");
    assert!(!failed.passed);
    assert_eq!(failed.fault_kind(), Some(FaultKind::AssertionFailure));
    assert_eq!(failed.failure_message.as_deref(), Some("expected: 5, actual: 4"));
}

// ============================================================================
// Fixtures
// ============================================================================

static BROKEN_SETUP_BODY: AtomicUsize = AtomicUsize::new(0);
static BROKEN_SETUP_TEARDOWN: AtomicUsize = AtomicUsize::new(0);

struct BrokenSetup;

#[test_class]
impl BrokenSetup {
    pub fn new() -> Self {
        BrokenSetup
    }

    #[before_each]
    fn setup(&mut self) -> Outcome {
        Err(Fault::msg("database unavailable"))
    }

    #[test_method]
    fn body(&mut self) {
        BROKEN_SETUP_BODY.fetch_add(1, Ordering::SeqCst);
    }

    #[after_each]
    fn teardown(&mut self) {
        BROKEN_SETUP_TEARDOWN.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn before_hook_fault_skips_body_but_runs_after_hook_once() {
    let (result, _) = run(&StaticModule::new("fixtures").with_type::<BrokenSetup>());

    let body = case(&result, "BrokenSetup", "body");
    assert_eq!(body.fault_kind(), Some(FaultKind::FixtureFailure));
    assert_eq!(
        body.failure_message.as_deref(),
        Some("before-each hook `setup` failed: database unavailable")
    );
    assert_eq!(BROKEN_SETUP_BODY.load(Ordering::SeqCst), 0);
    assert_eq!(BROKEN_SETUP_TEARDOWN.load(Ordering::SeqCst), 1);
}

struct BrokenTeardown;

#[test_class]
impl BrokenTeardown {
    pub fn new() -> Self {
        BrokenTeardown
    }

    #[test_method]
    fn passes(&mut self) {}

    #[after_each]
    fn teardown(&mut self) {
        panic!("cleanup exploded");
    }
}

#[test]
fn after_hook_fault_is_a_warning_not_a_failure() {
    let (result, reporter) = run(&StaticModule::new("fixtures").with_type::<BrokenTeardown>());

    assert!(case(&result, "BrokenTeardown", "passes").passed);
    let warnings: Vec<&str> = reporter.matching("fixture_warning").collect();
    assert_eq!(
        warnings,
        ["fixture_warning BrokenTeardown::passes after-each hook `teardown` failed: cleanup exploded"]
    );
}

struct BothHooksFail;

#[test_class]
impl BothHooksFail {
    pub fn new() -> Self {
        BothHooksFail
    }

    #[before_each]
    fn setup(&mut self) -> Outcome {
        Err(Fault::msg("setup boom"))
    }

    #[test_method]
    fn body(&mut self) {}

    #[after_each]
    fn teardown(&mut self) -> Outcome {
        Err(Fault::msg("teardown boom"))
    }
}

#[test]
fn after_hook_fault_keeps_the_before_hook_classification() {
    let (result, reporter) = run(&StaticModule::new("fixtures").with_type::<BothHooksFail>());

    let body = case(&result, "BothHooksFail", "body");
    assert_eq!(body.fault_kind(), Some(FaultKind::FixtureFailure));
    assert_eq!(
        body.failure_message.as_deref(),
        Some("before-each hook `setup` failed: setup boom")
    );
    let warnings: Vec<&str> = reporter.matching("fixture_warning").collect();
    assert_eq!(
        warnings,
        ["fixture_warning BothHooksFail::body after-each hook `teardown` failed: teardown boom"]
    );
}

struct FreshInstances {
    touched: bool,
}

#[test_class]
impl FreshInstances {
    pub fn new() -> Self {
        FreshInstances { touched: false }
    }

    #[test_method]
    #[data_row(1)]
    #[data_row(2)]
    #[data_row(3)]
    fn sees_a_new_instance(&mut self, _row: i32) -> AssertResult {
        assert::is_false(self.touched).context("instance state leaked between cases")?;
        self.touched = true;
        Ok(())
    }
}

#[test]
fn every_case_gets_its_own_instance() {
    let (result, _) = run(&StaticModule::new("fresh").with_type::<FreshInstances>());
    assert_eq!(result.total(), 3);
    assert_eq!(result.failed(), 0);
}

// ============================================================================
// Discovery outcomes
// ============================================================================

struct Ordered;

#[test_class]
impl Ordered {
    pub fn new() -> Self {
        Ordered
    }

    #[test_method]
    fn zeta(&mut self) {}

    #[test_method]
    #[priority(-1)]
    fn runs_first(&mut self) {}

    #[test_method]
    #[priority(2)]
    #[data_row("b")]
    #[data_row("a")]
    fn last(&mut self, _tag: String) {}

    #[test_method]
    fn alpha(&mut self) {}
}

#[test]
fn cases_run_by_priority_then_name_with_rows_in_declaration_order() {
    let (result, reporter) = run(&StaticModule::new("ordered").with_type::<Ordered>());
    let names: Vec<&str> = result.classes[0].cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["runs_first", "alpha", "zeta", r#"last("b")"#, r#"last("a")"#]);

    insta::assert_debug_snapshot!(reporter.events, @r###"
    [
        "module_start ordered",
        "class_start Ordered",
        "case Ordered::runs_first passed",
        "case Ordered::alpha passed",
        "case Ordered::zeta passed",
        "case Ordered::last(\"b\") passed",
        "case Ordered::last(\"a\") passed",
        "class_complete Ordered 5/5",
        "module_complete ordered 5/5",
    ]
    "###);
}

struct NoConstructor {
    _seed: u64,
}

#[test_class]
impl NoConstructor {
    #[test_method]
    fn never_runs(&mut self) -> AssertResult {
        assert::fail("excluded classes must not run")
    }
}

#[test]
fn class_without_constructor_is_excluded_with_a_warning() {
    let module = StaticModule::new("mixed").with_type::<NoConstructor>().with_type::<Calc>();
    let (result, reporter) = run(&module);

    assert!(result.class("NoConstructor").is_none());
    assert_eq!(result.classes.len(), 1);
    assert_eq!(
        reporter.matching("warning").collect::<Vec<_>>(),
        ["warning `NoConstructor` has no public argument-less constructor and was skipped"]
    );
}

#[derive(Default)]
struct DefaultConstructed;

#[test_class(default)]
impl DefaultConstructed {
    #[test_method]
    fn runs(&mut self) {}
}

#[test]
fn default_option_supplies_the_constructor() {
    let (result, _) = run(&StaticModule::new("default").with_type::<DefaultConstructed>());
    assert!(case(&result, "DefaultConstructed", "runs").passed);
}

struct TwoSetups;

#[test_class]
impl TwoSetups {
    pub fn new() -> Self {
        TwoSetups
    }

    #[before_each]
    fn first(&mut self) {}

    #[before_each]
    fn second(&mut self) -> Outcome {
        Err(Fault::msg("the ignored hook ran"))
    }

    #[test_method]
    fn body(&mut self) {}
}

#[test]
fn duplicate_hook_keeps_the_first_declared() {
    let (result, reporter) = run(&StaticModule::new("hooks").with_type::<TwoSetups>());
    assert!(case(&result, "TwoSetups", "body").passed);
    assert_eq!(
        reporter.matching("warning").collect::<Vec<_>>(),
        ["warning `TwoSetups` declares more than one before-each hook; using `first`, ignoring `second`"]
    );
}

// ============================================================================
// Faults
// ============================================================================

struct Mismatched;

#[test_class]
impl Mismatched {
    pub fn new() -> Self {
        Mismatched
    }

    #[test_method]
    #[data_row("two", 3)]
    #[data_row(1)]
    #[data_row(1, 2, display_name = "fits")]
    fn sum(&mut self, a: i64, b: i64) -> AssertResult {
        assert::are_equal(3, a + b)
    }
}

#[test]
fn argument_mismatches_surface_at_invocation() {
    let (result, _) = run(&StaticModule::new("mismatch").with_type::<Mismatched>());

    let wrong_type = case(&result, "Mismatched", r#"sum("two", 3)"#);
    assert_eq!(wrong_type.fault_kind(), Some(FaultKind::UnexpectedFault));
    assert_eq!(
        wrong_type.failure_message.as_deref(),
        Some(r#"unexpected fault: argument 0: expected i64, got string `"two"`"#)
    );

    let wrong_arity = case(&result, "Mismatched", "sum(1)");
    assert_eq!(
        wrong_arity.failure_message.as_deref(),
        Some("unexpected fault: expected 2 argument(s), got 1")
    );

    assert!(case(&result, "Mismatched", "fits").passed);
}

#[derive(Debug, thiserror::Error)]
#[error("ledger out of balance by {0}")]
struct LedgerError(i64);

struct Faulty;

#[test_class]
impl Faulty {
    pub fn new() -> Self {
        Faulty
    }

    #[test_method]
    fn returns_error(&mut self) -> Result<(), LedgerError> {
        Err(LedgerError(7))
    }

    #[test_method]
    fn panics(&mut self) {
        let empty: Vec<u8> = Vec::new();
        let _ = empty[0];
    }

    #[test_method]
    fn panics_with_assertion(&mut self) {
        std::panic::panic_any(minitest::assert::AssertionFailure::new("raised as a panic"));
    }
}

#[test]
fn faults_are_classified() {
    let (result, _) = run(&StaticModule::new("faulty").with_type::<Faulty>());

    let returned = case(&result, "Faulty", "returns_error");
    assert_eq!(returned.fault_kind(), Some(FaultKind::UnexpectedFault));
    assert_eq!(
        returned.failure_message.as_deref(),
        Some("unexpected fault: ledger out of balance by 7")
    );
    assert!(returned.fault.as_ref().unwrap().type_name.ends_with("LedgerError"));

    let panicked = case(&result, "Faulty", "panics");
    assert_eq!(panicked.fault_kind(), Some(FaultKind::UnexpectedFault));
    assert!(panicked.failure_message.as_deref().unwrap().contains("index out of bounds"));

    let asserted = case(&result, "Faulty", "panics_with_assertion");
    assert_eq!(asserted.fault_kind(), Some(FaultKind::AssertionFailure));
    assert_eq!(asserted.failure_message.as_deref(), Some("raised as a panic"));
}

struct ExplodingConstructor;

#[test_class]
impl ExplodingConstructor {
    pub fn new() -> Self {
        panic!("constructor blew up")
    }

    #[before_each]
    fn setup(&mut self) {
        unreachable!("hooks must not run without an instance");
    }

    #[test_method]
    fn body(&mut self) {}
}

#[test]
fn constructor_fault_is_an_infrastructure_fault() {
    let (result, reporter) = run(&StaticModule::new("ctor").with_type::<ExplodingConstructor>());
    let body = case(&result, "ExplodingConstructor", "body");
    assert_eq!(body.fault_kind(), Some(FaultKind::InfrastructureFault));
    assert_eq!(
        body.failure_message.as_deref(),
        Some("failed to instantiate `ExplodingConstructor`: constructor blew up")
    );
    assert_eq!(reporter.matching("fixture_warning").count(), 0);
}

// ============================================================================
// Async bodies and timeouts
// ============================================================================

struct Asynchronous {
    ready: bool,
}

#[test_class]
impl Asynchronous {
    pub fn new() -> Self {
        Asynchronous { ready: false }
    }

    #[before_each]
    async fn warm_up(&mut self) {
        tokio::task::yield_now().await;
        self.ready = true;
    }

    #[test_method]
    async fn awaits(&mut self) -> AssertResult {
        let handle = tokio::spawn(async { 21 * 2 });
        let answer = handle.await.map_err(|e| assert::AssertionFailure::new(e.to_string()))?;
        assert::is_true(self.ready)?;
        assert::are_equal(42, answer)
    }

    #[test_method]
    async fn hangs(&mut self) {
        tokio::time::sleep(Duration::from_secs(60)).await;
    }
}

#[test]
fn async_bodies_run_and_time_out() {
    let config = RunnerConfig::default().with_case_timeout(Duration::from_millis(50));
    let (result, _) = run_with(config, &StaticModule::new("async").with_type::<Asynchronous>());

    assert!(case(&result, "Asynchronous", "awaits").passed);
    let hung = case(&result, "Asynchronous", "hangs");
    assert_eq!(hung.fault_kind(), Some(FaultKind::UnexpectedFault));
    assert_eq!(hung.failure_message.as_deref(), Some("unexpected fault: timed out after 50ms"));
    assert!(hung.duration < Duration::from_secs(60));
}

// ============================================================================
// Filtering, aggregation, release
// ============================================================================

#[test]
fn filter_selects_by_display_name_and_omits_empty_classes() {
    let module = StaticModule::new("filtered").with_type::<Calc>().with_type::<Ordered>();
    let (result, _) = run_with(RunnerConfig::default().with_filter("(2, 3"), &module);

    assert_eq!(result.classes.len(), 1);
    assert_eq!(result.total(), 1);
    assert!(case(&result, "Calc", "add(2, 3, 5)").passed);
}

#[test]
fn module_counts_equal_the_sum_of_classes() {
    let module = StaticModule::new("all")
        .with_type::<Calc>()
        .with_type::<Ordered>()
        .with_type::<Mismatched>()
        .with_type::<Faulty>();
    let (result, _) = run(&module);

    let classes_total: usize = result.classes.iter().map(|c| c.total()).sum();
    assert_eq!(result.total(), classes_total);
    assert_eq!(result.passed() + result.failed(), result.total());
    assert_eq!(result.total(), 2 + 5 + 3 + 3);
}

#[test]
fn module_is_unloaded_once_after_the_run() {
    let unloads = Rc::new(Cell::new(0));
    let counter = Rc::clone(&unloads);
    let module = StaticModule::new("released")
        .with_type::<Calc>()
        .on_unload(move || counter.set(counter.get() + 1));

    run(&module);
    assert_eq!(unloads.get(), 1);
}

#[test]
fn registered_types_include_macro_classes() {
    let names: Vec<&str> = minitest::registry::registered_types().iter().map(|t| t.name).collect();
    assert!(names.contains(&"Calc"));
    assert!(names.contains(&"NoConstructor"));
    assert!(names.windows(2).all(|w| w[0] <= w[1]), "registry order must be sorted: {names:?}");
}
