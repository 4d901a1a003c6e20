//! Type-erased invocation of test methods and fixtures.
//!
//! The `#[test_class]` macro turns every method into an [`Invoker`]: a plain function pointer that downcasts the
//! instance, checks and converts the positional arguments, and calls the method. Asynchronous methods hand back a
//! pending future which the engine drives to completion.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::fault::{Fault, IntoOutcome, Outcome};
use crate::value::{FromValue, Value};

/// A boxed, not necessarily `Send`, future borrowing the test instance.
pub type PendingOutcome<'a> = Pin<Box<dyn Future<Output = Outcome> + 'a>>;

/// Calls one method on a type-erased instance with positional arguments.
pub type Invoker = for<'a> fn(&'a mut (dyn Any + 'static), &[Value]) -> Invocation<'a>;

/// What an invoker produced: either a finished outcome, or a future still to be awaited.
pub enum Invocation<'a> {
    Ready(Outcome),
    Pending(PendingOutcome<'a>),
}

impl<'a> Invocation<'a> {
    pub fn ready(outcome: impl IntoOutcome) -> Self {
        Invocation::Ready(outcome.into_outcome())
    }

    pub fn fault(fault: impl Into<Fault>) -> Self {
        Invocation::Ready(Err(fault.into()))
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Outcome> + 'a,
    {
        Invocation::Pending(Box::pin(future))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Invocation::Pending(_))
    }
}

/// Faults raised while binding an invocation, before any user code runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    #[error("instance is not a `{expected}`")]
    ReceiverMismatch { expected: &'static str },

    #[error("expected {expected} argument(s), got {actual}")]
    Arity { expected: usize, actual: usize },
}

/// Downcast the instance to the method's receiver type.
pub fn receiver<'a, T: Any>(instance: &'a mut (dyn Any + 'static), type_name: &'static str) -> Result<&'a mut T, Fault> {
    instance
        .downcast_mut::<T>()
        .ok_or_else(|| Fault::from(InvocationError::ReceiverMismatch { expected: type_name }))
}

pub fn check_arity(args: &[Value], expected: usize) -> Result<(), Fault> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(Fault::from(InvocationError::Arity {
            expected,
            actual: args.len(),
        }))
    }
}

/// Convert the argument at `index`; the caller has already checked arity.
pub fn argument<T: FromValue>(args: &[Value], index: usize) -> Result<T, Fault> {
    let value = args.get(index).ok_or_else(|| {
        Fault::from(InvocationError::Arity {
            expected: index + 1,
            actual: args.len(),
        })
    })?;
    T::from_value(value, index).map_err(Fault::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::value::ValueError;

    struct Counter {
        hits: u32,
    }

    fn bump<'a>(instance: &'a mut (dyn Any + 'static), args: &[Value]) -> Invocation<'a> {
        let this = match receiver::<Counter>(instance, "Counter") {
            Ok(this) => this,
            Err(fault) => return Invocation::fault(fault),
        };
        if let Err(fault) = check_arity(args, 1) {
            return Invocation::fault(fault);
        }
        let by = match argument::<u32>(args, 0) {
            Ok(v) => v,
            Err(fault) => return Invocation::fault(fault),
        };
        this.hits += by;
        Invocation::ready(())
    }

    fn outcome(invocation: Invocation<'_>) -> Outcome {
        match invocation {
            Invocation::Ready(outcome) => outcome,
            Invocation::Pending(_) => panic!("expected a ready invocation"),
        }
    }

    #[test]
    fn test_invoker_binds_and_calls() {
        let invoker: Invoker = bump;
        let mut instance: Box<dyn Any> = Box::new(Counter { hits: 1 });
        outcome(invoker(instance.as_mut(), &[Value::Int(2)])).unwrap();
        assert_eq!(instance.downcast_ref::<Counter>().unwrap().hits, 3);
    }

    #[test]
    fn test_arity_mismatch_is_a_fault() {
        let mut instance: Box<dyn Any> = Box::new(Counter { hits: 0 });
        let fault = outcome(bump(instance.as_mut(), &[])).unwrap_err();
        assert_eq!(fault.to_string(), "expected 1 argument(s), got 0");
        assert!(fault.is::<InvocationError>());
    }

    #[test]
    fn test_argument_type_mismatch_is_a_fault() {
        let mut instance: Box<dyn Any> = Box::new(Counter { hits: 0 });
        let fault = outcome(bump(instance.as_mut(), &[Value::Bool(true)])).unwrap_err();
        assert!(fault.is::<ValueError>());
    }

    #[test]
    fn test_wrong_receiver_is_a_fault() {
        let mut instance: Box<dyn Any> = Box::new(17_u8);
        let fault = outcome(bump(instance.as_mut(), &[Value::Int(1)])).unwrap_err();
        assert_eq!(fault.to_string(), "instance is not a `Counter`");
    }
}
