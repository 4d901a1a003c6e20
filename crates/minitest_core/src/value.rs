//! Literal argument values carried by data rows.
//!
//! A data row is a positional tuple of [`Value`]s. The generated invoker converts each value into the declared
//! parameter type with [`FromValue`]; a conversion failure is a [`ValueError`] and is reported when the case runs.

use std::fmt;

use thiserror::Error;

/// A literal that can appear in a `#[data_row(...)]` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
}

impl Value {
    /// Name of the value's kind, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Char(c) => write!(f, "{c:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// Errors produced when a data-row value does not fit the parameter it is bound to.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("argument {index}: expected {expected}, got {actual} `{value}`")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        actual: &'static str,
        value: String,
    },

    #[error("argument {index}: {value} does not fit in {target}")]
    OutOfRange { index: usize, value: i64, target: &'static str },
}

impl ValueError {
    fn mismatch(index: usize, expected: &'static str, value: &Value) -> Self {
        ValueError::TypeMismatch {
            index,
            expected,
            actual: value.kind(),
            value: value.to_string(),
        }
    }
}

/// Conversion from a data-row [`Value`] into a test method parameter.
///
/// `index` is the position of the argument in the row and only feeds error messages.
pub trait FromValue: Sized {
    fn from_value(value: &Value, index: usize) -> Result<Self, ValueError>;
}

macro_rules! impl_from_value_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value, index: usize) -> Result<Self, ValueError> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(*i).map_err(|_| ValueError::OutOfRange {
                            index,
                            value: *i,
                            target: stringify!($ty),
                        }),
                        other => Err(ValueError::mismatch(index, stringify!($ty), other)),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for i128 {
    fn from_value(value: &Value, index: usize) -> Result<Self, ValueError> {
        match value {
            Value::Int(i) => Ok(i128::from(*i)),
            other => Err(ValueError::mismatch(index, "i128", other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value, index: usize) -> Result<Self, ValueError> {
        match value {
            Value::Float(x) => Ok(*x),
            // Integer literals widen to floats, like numeric literals in most host languages.
            Value::Int(i) => Ok(*i as f64),
            other => Err(ValueError::mismatch(index, "f64", other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value, index: usize) -> Result<Self, ValueError> {
        f64::from_value(value, index)
            .map(|x| x as f32)
            .map_err(|_| ValueError::mismatch(index, "f32", value))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value, index: usize) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(ValueError::mismatch(index, "bool", other)),
        }
    }
}

impl FromValue for char {
    fn from_value(value: &Value, index: usize) -> Result<Self, ValueError> {
        match value {
            Value::Char(c) => Ok(*c),
            other => Err(ValueError::mismatch(index, "char", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value, index: usize) -> Result<Self, ValueError> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            Value::Char(c) => Ok(c.to_string()),
            other => Err(ValueError::mismatch(index, "String", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value, index: usize) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other, index).map(Some),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value, _index: usize) -> Result<Self, ValueError> {
        Ok(value.clone())
    }
}

/// Render an argument tuple the way case display names show it: `(2, 3, "x")`.
pub fn render_arguments(values: &[Value]) -> String {
    let parts: Vec<String> = values.iter().map(Value::to_string).collect();
    format!("({})", parts.join(", "))
}
