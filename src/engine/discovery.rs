//! Test discovery: turns a module's type registry into an ordered execution plan.
//!
//! Discovery never fails, never instantiates a class and never calls user code. Types that cannot run are left
//! out of the plan with a [`DiscoveryWarning`].

use std::any::Any;
use std::fmt;

use minitest_core::value::render_arguments;
use minitest_core::{Constructor, Invocation, Invoker, MethodEntry, MethodTag, TypeEntry, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

// ============================================================================
// Plan model
// ============================================================================

/// One executable case: a test method, optionally bound to one data row.
#[derive(Clone)]
pub struct TestCaseMetadata {
    pub class: &'static str,
    pub method: &'static str,
    /// Lower runs first.
    pub priority: i32,
    pub description: Option<String>,
    /// `None` for a method without data rows.
    pub arguments: Option<Vec<Value>>,
    /// Explicit display name from the data row.
    pub display_name: Option<String>,
    pub is_async: bool,
    invoker: Invoker,
}

impl TestCaseMetadata {
    /// The name results and reporters use for this case.
    pub fn name(&self) -> String {
        match (&self.display_name, &self.arguments) {
            (Some(name), _) => name.clone(),
            (None, Some(args)) => format!("{}{}", self.method, render_arguments(args)),
            (None, None) => self.method.to_string(),
        }
    }

    pub fn arguments(&self) -> &[Value] {
        self.arguments.as_deref().unwrap_or(&[])
    }

    pub fn invoker(&self) -> Invoker {
        self.invoker
    }
}

impl fmt::Debug for TestCaseMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCaseMetadata")
            .field("class", &self.class)
            .field("name", &self.name())
            .field("priority", &self.priority)
            .field("is_async", &self.is_async)
            .finish_non_exhaustive()
    }
}

/// A before-each or after-each hook.
#[derive(Clone)]
pub struct Hook {
    pub name: &'static str,
    pub is_async: bool,
    invoker: Invoker,
}

impl Hook {
    fn from_method(method: &MethodEntry) -> Self {
        Self {
            name: method.name,
            is_async: method.is_async,
            invoker: method.invoker,
        }
    }

    pub fn invoke<'a>(&self, instance: &'a mut (dyn Any + 'static)) -> Invocation<'a> {
        (self.invoker)(instance, &[])
    }

    pub fn invoker(&self) -> Invoker {
        self.invoker
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").field("name", &self.name).finish_non_exhaustive()
    }
}

/// A runnable test class and its ordered cases.
#[derive(Clone)]
pub struct TestClassDescriptor {
    pub name: &'static str,
    pub description: Option<String>,
    pub constructor: Constructor,
    pub before_each: Option<Hook>,
    pub after_each: Option<Hook>,
    pub cases: Vec<TestCaseMetadata>,
}

impl fmt::Debug for TestClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClassDescriptor")
            .field("name", &self.name)
            .field("before_each", &self.before_each)
            .field("after_each", &self.after_each)
            .field("cases", &self.cases)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    BeforeEach,
    AfterEach,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookKind::BeforeEach => "before-each",
            HookKind::AfterEach => "after-each",
        })
    }
}

/// Why part of a module was left out of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscoveryWarning {
    MissingConstructor {
        class: String,
    },
    DuplicateHook {
        class: String,
        hook: HookKind,
        kept: String,
        ignored: String,
    },
}

impl fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryWarning::MissingConstructor { class } => {
                write!(f, "`{class}` has no public argument-less constructor and was skipped")
            }
            DiscoveryWarning::DuplicateHook {
                class,
                hook,
                kept,
                ignored,
            } => write!(
                f,
                "`{class}` declares more than one {hook} hook; using `{kept}`, ignoring `{ignored}`"
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub classes: Vec<TestClassDescriptor>,
    pub warnings: Vec<DiscoveryWarning>,
}

impl Discovery {
    pub fn case_count(&self) -> usize {
        self.classes.iter().map(|c| c.cases.len()).sum()
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Build the plan for a module's registry. Classes keep registry order; cases are ordered by priority, then
/// method name, with data rows of one method in declaration order.
#[instrument(skip_all, fields(types = types.len()))]
pub fn discover(types: &[TypeEntry]) -> Discovery {
    let mut discovery = Discovery::default();

    for entry in types.iter().filter(|t| t.is_test_class()) {
        let Some(constructor) = entry.constructor else {
            discovery.warnings.push(DiscoveryWarning::MissingConstructor {
                class: entry.name.to_string(),
            });
            continue;
        };
        let class = describe_class(entry, constructor, &mut discovery.warnings);
        debug!(class = class.name, cases = class.cases.len(), "discovered class");
        discovery.classes.push(class);
    }

    debug!(
        classes = discovery.classes.len(),
        cases = discovery.case_count(),
        warnings = discovery.warnings.len(),
        "discovery complete"
    );
    discovery
}

fn describe_class(entry: &TypeEntry, constructor: Constructor, warnings: &mut Vec<DiscoveryWarning>) -> TestClassDescriptor {
    let mut class = TestClassDescriptor {
        name: entry.name,
        description: entry.description().map(str::to_string),
        constructor,
        before_each: None,
        after_each: None,
        cases: Vec::new(),
    };

    for method in &entry.methods {
        if method.has_tag(&MethodTag::BeforeEach) {
            bind_hook(&mut class.before_each, HookKind::BeforeEach, entry.name, method, warnings);
        } else if method.has_tag(&MethodTag::AfterEach) {
            bind_hook(&mut class.after_each, HookKind::AfterEach, entry.name, method, warnings);
        } else if method.has_tag(&MethodTag::TestMethod) {
            expand_cases(entry.name, method, &mut class.cases);
        }
    }

    class
        .cases
        .sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.method.cmp(b.method)));
    class
}

fn bind_hook(
    slot: &mut Option<Hook>,
    kind: HookKind,
    class: &str,
    method: &MethodEntry,
    warnings: &mut Vec<DiscoveryWarning>,
) {
    match slot {
        None => *slot = Some(Hook::from_method(method)),
        Some(kept) => warnings.push(DiscoveryWarning::DuplicateHook {
            class: class.to_string(),
            hook: kind,
            kept: kept.name.to_string(),
            ignored: method.name.to_string(),
        }),
    }
}

fn expand_cases(class: &'static str, method: &MethodEntry, cases: &mut Vec<TestCaseMetadata>) {
    let case = |arguments: Option<Vec<Value>>, display_name: Option<String>| TestCaseMetadata {
        class,
        method: method.name,
        priority: method.priority(),
        description: method.description().map(str::to_string),
        arguments,
        display_name,
        is_async: method.is_async,
        invoker: method.invoker,
    };

    let before = cases.len();
    cases.extend(
        method
            .data_rows()
            .map(|row| case(Some(row.values.clone()), row.display_name.clone())),
    );
    if cases.len() == before {
        cases.push(case(None, None));
    }
}
