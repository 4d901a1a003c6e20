//! A small test module: run it directly for a console report, or hand it to `minitest`.
//!
//! Contains one deliberately failing data row, one class whose before-each hook fails, and one class that cannot
//! be constructed and is therefore skipped.

use std::time::Duration;

use minitest::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("division by zero")]
pub struct DivideByZero;

fn divide(a: i64, b: i64) -> Result<i64, DivideByZero> {
    if b == 0 { Err(DivideByZero) } else { Ok(a / b) }
}

pub struct Calc;

#[test_class(description = "Integer arithmetic")]
impl Calc {
    pub fn new() -> Self {
        Calc
    }

    #[test_method]
    #[data_row(2, 3, 5)]
    #[data_row(2, 2, 5)]
    #[data_row(-2, 2, 0, display_name = "negatives cancel")]
    fn add(&mut self, a: i64, b: i64, expected: i64) -> AssertResult {
        assert::are_equal(expected, a + b)
    }

    #[test_method]
    #[priority(1)]
    #[description("dividing by zero is reported, not a crash")]
    fn divide_by_zero(&mut self) -> AssertResult {
        assert::throws::<DivideByZero, _, _>(|| divide(1, 0).map(|_| ()))
    }
}

#[derive(Default)]
pub struct Database {
    connected: bool,
}

#[test_class(default, description = "Fixture lifecycle")]
impl Database {
    #[before_each]
    fn connect(&mut self) -> Outcome {
        Err(Fault::msg("connection refused"))
    }

    #[test_method]
    fn query(&mut self) -> AssertResult {
        assert::is_true(self.connected).context("connect never ran")
    }

    #[after_each]
    fn disconnect(&mut self) {
        println!("disconnect called (connected: {})", self.connected);
    }
}

pub struct Greeter {
    greeting: String,
}

#[test_class]
impl Greeter {
    pub fn new() -> Self {
        Self {
            greeting: "hello".to_string(),
        }
    }

    #[test_method]
    async fn greets_after_a_pause(&mut self) -> AssertResult {
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert::are_equal("hello", self.greeting.as_str())
    }
}

/// No argument-less constructor: discovery skips it with a warning.
pub struct Unconstructible {
    #[allow(dead_code)]
    seed: u64,
}

#[test_class]
impl Unconstructible {
    #[allow(dead_code)]
    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    #[test_method]
    fn never_runs(&mut self) -> AssertResult {
        assert::fail("an unconstructible class was executed")
    }
}

minitest::module_main!();
