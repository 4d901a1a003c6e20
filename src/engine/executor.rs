//! Single-case execution.
//!
//! One case is: instantiate → before-each → body → after-each. Every step that calls user code is fenced with
//! `catch_unwind`, so a panic becomes a [`Fault`] and never escapes the case boundary. The after-each hook runs
//! whenever instantiation succeeded and its fault is only ever a warning.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use minitest_core::invoke::PendingOutcome;
use minitest_core::{Fault, Invocation, Invoker, Outcome, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::discovery::{Hook, TestCaseMetadata, TestClassDescriptor};
use super::reporter::Reporter;
use super::results::{CapturedFault, FaultKind, TestCaseResult};

/// An asynchronous body or hook exceeded the per-case limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out after {}ms", .0.as_millis())]
pub struct TimedOut(pub Duration);

#[derive(Debug, Clone, Copy, Default)]
pub struct Executor {
    case_timeout: Option<Duration>,
}

impl Executor {
    pub fn new(case_timeout: Option<Duration>) -> Self {
        Self { case_timeout }
    }

    pub fn execute(&self, class: &TestClassDescriptor, case: &TestCaseMetadata, reporter: &mut dyn Reporter) -> TestCaseResult {
        let started = Instant::now();
        let name = case.name();
        debug!(class = class.name, case = %name, "executing");

        let mut instance = match panic::catch_unwind(class.constructor) {
            Ok(instance) => instance,
            Err(payload) => {
                let fault = Fault::from_panic(payload);
                let message = format!("failed to instantiate `{}`: {fault}", class.name);
                return failed(case, name, FaultKind::InfrastructureFault, message, &fault, started);
            }
        };

        let before = match &class.before_each {
            Some(hook) => self.run_hook(hook, instance.as_mut()).map_err(|fault| (hook.name, fault)),
            None => Ok(()),
        };
        let verdict = match before {
            Err((hook, fault)) => {
                let message = format!("before-each hook `{hook}` failed: {fault}");
                Some((FaultKind::FixtureFailure, message, fault))
            }
            Ok(()) => match self.invoke(case.invoker(), instance.as_mut(), case.arguments()) {
                Ok(()) => None,
                Err(fault) if fault.is_assertion() => Some((FaultKind::AssertionFailure, fault.to_string(), fault)),
                Err(fault) => Some((FaultKind::UnexpectedFault, format!("unexpected fault: {fault}"), fault)),
            },
        };

        if let Some(hook) = &class.after_each {
            if let Err(fault) = self.run_hook(hook, instance.as_mut()) {
                let message = format!("after-each hook `{}` failed: {fault}", hook.name);
                warn!(class = class.name, case = %name, "{message}");
                reporter.on_fixture_warning(class.name, &name, &message);
            }
        }
        drop(instance);

        match verdict {
            None => TestCaseResult::pass(name, case.description.clone(), started.elapsed()),
            Some((kind, message, fault)) => failed(case, name, kind, message, &fault, started),
        }
    }

    fn run_hook(&self, hook: &Hook, instance: &mut (dyn Any + 'static)) -> Outcome {
        self.invoke(hook.invoker(), instance, &[])
    }

    /// Call an invoker and drive a pending result to completion.
    fn invoke(&self, invoker: Invoker, instance: &mut (dyn Any + 'static), args: &[Value]) -> Outcome {
        // Rebinding moves the borrow into the closure, keeping it `FnOnce`.
        let call = move || {
            let instance = instance;
            invoker(instance, args)
        };
        let invocation = match panic::catch_unwind(AssertUnwindSafe(call)) {
            Ok(invocation) => invocation,
            Err(payload) => return Err(Fault::from_panic(payload)),
        };
        match invocation {
            Invocation::Ready(outcome) => outcome,
            Invocation::Pending(future) => self.block_on(future),
        }
    }

    /// Drive a future on a runtime owned by this call. The runtime is dropped before returning, taking any task
    /// the body spawned with it.
    fn block_on(&self, future: PendingOutcome<'_>) -> Outcome {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let timeout = self.case_timeout;
        let driven = panic::catch_unwind(AssertUnwindSafe(|| {
            runtime.block_on(async move {
                match timeout {
                    Some(limit) => match tokio::time::timeout(limit, future).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(Fault::from(TimedOut(limit))),
                    },
                    None => future.await,
                }
            })
        }));
        drop(runtime);
        driven.unwrap_or_else(|payload| Err(Fault::from_panic(payload)))
    }
}

fn failed(
    case: &TestCaseMetadata,
    name: String,
    kind: FaultKind,
    message: String,
    fault: &Fault,
    started: Instant,
) -> TestCaseResult {
    TestCaseResult::fail(
        name,
        case.description.clone(),
        message,
        CapturedFault::capture(kind, fault),
        started.elapsed(),
    )
}
