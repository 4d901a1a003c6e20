//! Faults raised by user code: test bodies, fixtures and constructors.
//!
//! A [`Fault`] is the type-erased error a test body reports. Any `std::error::Error + Send + Sync + 'static`
//! converts into one with `?`, and a panic payload converts with [`Fault::from_panic`]. The engine only needs to
//! tell one distinguished kind apart: [`AssertionFailure`], produced by the assertion helpers.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Result of invoking a test body or fixture.
pub type Outcome = Result<(), Fault>;

/// A fault raised by user code.
///
/// `Fault` deliberately does not implement `std::error::Error` itself, so that every error type (including
/// [`AssertionFailure`]) can flow into it with `?`.
pub struct Fault {
    inner: Box<dyn StdError + Send + Sync + 'static>,
    type_name: &'static str,
}

impl Fault {
    /// Create a fault from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Fault::from(Message(message.into()))
    }

    /// Convert a panic payload caught with `catch_unwind`.
    ///
    /// Payloads raised with `std::panic::panic_any` carrying an [`AssertionFailure`] or a `Fault` keep their
    /// identity; string payloads become [`Panicked`].
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<AssertionFailure>() {
            Ok(failure) => return Fault::from(*failure),
            Err(other) => other,
        };
        let payload = match payload.downcast::<Fault>() {
            Ok(fault) => return *fault,
            Err(other) => other,
        };
        Fault::from(Panicked {
            message: panic_message(payload.as_ref()),
        })
    }

    /// Check whether the original error is exactly of type `E`.
    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.inner.is::<E>()
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// Rust type name of the original error.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_assertion(&self) -> bool {
        self.is::<AssertionFailure>()
    }
}

impl<E> From<E> for Fault
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Fault {
            inner: Box::new(error),
            type_name: std::any::type_name::<E>(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("type_name", &self.type_name)
            .field("message", &self.inner.to_string())
            .finish()
    }
}

/// Extract the human-readable part of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// The distinguished fault kind produced by a violated assertion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AssertionFailure {
    message: String,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Append a caller-supplied message to the generated one.
    pub fn with_context(mut self, context: impl fmt::Display) -> Self {
        let context = context.to_string();
        if !context.is_empty() {
            self.message = format!("{}. {}", self.message, context);
        }
        self
    }
}

/// A panic raised by user code, converted into a fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Panicked {
    pub message: String,
}

/// Plain message fault created with [`Fault::msg`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct Message(pub String);

/// Conversion of a test method's return value into an [`Outcome`].
///
/// Test bodies may return `()`, an `Outcome`, or `Result<(), E>` for any error type.
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Outcome {
        Ok(())
    }
}

impl<E: Into<Fault>> IntoOutcome for Result<(), E> {
    fn into_outcome(self) -> Outcome {
        self.map_err(Into::into)
    }
}
