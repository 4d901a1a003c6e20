//! Provide the metadata model shared by the minitest engine and the test modules it runs.
//!
//! This crate is intentionally small and dependency-light. It contains the pure data contracts that:
//! - the `#[test_class]` macro emits into test modules (tags, registry entries, invokers), and
//! - the engine reads during discovery and execution (values, outcomes, faults).
//!
//! ## Notes
//!
//! - This is a "model" crate: **no IO**, no global state, and no engine-specific types.
//! - Nothing here validates metadata. Malformed data rows or mismatched argument lists only surface when an invoker
//!   runs and converts its arguments.

pub mod fault;
pub mod invoke;
pub mod metadata;
pub mod value;

pub use fault::{AssertionFailure, Fault, IntoOutcome, Outcome, Panicked};
pub use invoke::{Invocation, InvocationError, Invoker};
pub use metadata::{ClassTag, Constructor, DataRow, MethodEntry, MethodTag, TypeEntry};
pub use value::{FromValue, Value, ValueError};

/// Implemented by every type annotated with `#[test_class]`.
///
/// The generated implementation describes the type, its constructor and all of its methods as a [`TypeEntry`].
/// Building the entry never constructs the type or runs any of its methods.
pub trait TestType: 'static {
    fn type_entry() -> TypeEntry;
}
