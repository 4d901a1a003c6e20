//! Assertion helpers for minitest test bodies.
//!
//! Every helper returns `Result<(), AssertionFailure>`, so a test body propagates a violated assertion with `?`:
//!
//! ```ignore
//! #[test_method]
//! fn adds(&mut self) -> Outcome {
//!     assert::are_equal(4, 2 + 2)?;
//!     assert::is_true(self.ready).context("fixture did not run")?;
//!     Ok(())
//! }
//! ```
//!
//! The engine recognises the [`AssertionFailure`] fault kind and reports its message verbatim; any other fault is
//! reported as unexpected.

#![deny(clippy::unwrap_used)]

use std::any::type_name;
use std::error::Error as StdError;
use std::fmt::{Debug, Display};
use std::panic::{self, AssertUnwindSafe};

pub use minitest_core::AssertionFailure;
use minitest_core::fault::panic_message;
use minitest_core::IntoOutcome;

/// Result of a single assertion.
pub type AssertResult = Result<(), AssertionFailure>;

/// Attach a caller-supplied message to a failed assertion.
pub trait AssertContext {
    fn context(self, message: impl Display) -> Self;
}

impl AssertContext for AssertResult {
    fn context(self, message: impl Display) -> Self {
        self.map_err(|failure| failure.with_context(message))
    }
}

/// Assert that two values are equal.
pub fn are_equal<T: PartialEq + Debug>(expected: T, actual: T) -> AssertResult {
    if expected == actual {
        Ok(())
    } else {
        Err(AssertionFailure::new(format!(
            "expected: {:?}, actual: {:?}",
            expected, actual
        )))
    }
}

/// Assert that two values are not equal.
pub fn are_not_equal<T: PartialEq + Debug>(not_expected: T, actual: T) -> AssertResult {
    if not_expected != actual {
        Ok(())
    } else {
        Err(AssertionFailure::new(format!(
            "expected any value except: {:?}, actual: {:?}",
            not_expected, actual
        )))
    }
}

/// Assert that a condition is true.
pub fn is_true(condition: bool) -> AssertResult {
    if condition {
        Ok(())
    } else {
        Err(AssertionFailure::new("condition should be true"))
    }
}

/// Assert that a condition is false.
pub fn is_false(condition: bool) -> AssertResult {
    if condition {
        Err(AssertionFailure::new("condition should be false"))
    } else {
        Ok(())
    }
}

/// Explicitly fail a test with a message.
pub fn fail(message: impl Display) -> AssertResult {
    Err(AssertionFailure::new("test marked as failed").with_context(message))
}

/// Assert that `action` raises a fault of exactly type `E`.
///
/// The fault may be returned (`Err(E)` or a `Fault` wrapping `E`) or raised with `std::panic::panic_any`. A
/// different fault, a plain panic, or no fault at all fails the assertion.
pub fn throws<E, F, R>(action: F) -> AssertResult
where
    E: StdError + 'static,
    F: FnOnce() -> R,
    R: IntoOutcome,
{
    let expected = type_name::<E>();
    match panic::catch_unwind(AssertUnwindSafe(|| action().into_outcome())) {
        Ok(Ok(())) => Err(AssertionFailure::new(format!(
            "expected fault of type <{expected}> but none was raised"
        ))),
        Ok(Err(fault)) if fault.is::<E>() => Ok(()),
        Ok(Err(fault)) => Err(AssertionFailure::new(format!(
            "expected fault of type <{expected}> but got <{}>: {fault}",
            fault.type_name()
        ))),
        Err(payload) if payload.is::<E>() => Ok(()),
        Err(payload) => Err(AssertionFailure::new(format!(
            "expected fault of type <{expected}> but got a panic: {}",
            panic_message(payload.as_ref())
        ))),
    }
}
