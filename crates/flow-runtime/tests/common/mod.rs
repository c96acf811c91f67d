//! Shared test utilities
//!
//! Helpers for evaluating Flow source against the standard runtime and
//! asserting on the result.

#![allow(dead_code)]

use flow_runtime::value::Detached;
use flow_runtime::{ErrorKind, Flow, FlowError, Value, ValueKind};

// Re-export testing utilities
pub use pretty_assertions::{assert_eq, assert_ne};

/// Evaluate with the standard runtime, panicking on error
pub fn eval(source: &str) -> Value {
    match Flow::new().eval(source) {
        Ok(value) => value,
        Err(error) => panic!("evaluation of {:?} failed: {}", source, error),
    }
}

/// Evaluate with the standard runtime, expecting an error
pub fn eval_err(source: &str) -> FlowError {
    match Flow::new().eval(source) {
        Ok(value) => panic!("expected {:?} to fail, got {:?}", source, value),
        Err(error) => error,
    }
}

/// Display form of a result. Display overrides are not honored here; use
/// `core.text(...)` inside the program for those.
pub fn render(value: &Value) -> String {
    value
        .display(&mut Detached)
        .map(|text| text.to_string())
        .unwrap_or_else(|error| panic!("display failed: {}", error))
}

/// Assert that source code evaluates to an Integer
///
/// # Example
/// ```
/// assert_eval_integer("1 + 2", 3);
/// ```
pub fn assert_eval_integer(source: &str, expected: i64) {
    let value = eval(source);
    assert_eq!(value.kind(), ValueKind::Integer, "{:?} gave {:?}", source, value);
    assert_eq!(value.as_integer(), Some(expected));
}

/// Assert that source code evaluates to a Float
pub fn assert_eval_float(source: &str, expected: f64) {
    let value = eval(source);
    assert_eq!(value.kind(), ValueKind::Float, "{:?} gave {:?}", source, value);
    assert_eq!(value.as_float(), Some(expected));
}

/// Assert that source code evaluates to a String
///
/// # Example
/// ```
/// assert_eval_string(r#""ab" * 2"#, "abab");
/// ```
pub fn assert_eval_string(source: &str, expected: &str) {
    let value = eval(source);
    assert_eq!(value.as_str().as_deref(), Some(expected), "{:?} gave {:?}", source, value);
}

/// Assert that source code evaluates to a Boolean
pub fn assert_eval_bool(source: &str, expected: bool) {
    let value = eval(source);
    assert_eq!(value.as_bool(), Some(expected), "{:?} gave {:?}", source, value);
}

/// Assert that source code evaluates to null
pub fn assert_eval_null(source: &str) {
    let value = eval(source);
    assert!(value.is_null(), "{:?} gave {:?}", source, value);
}

/// Assert on the display form of the result
///
/// # Example
/// ```
/// assert_eval_display("[1, 2] + [3]", "[1, 2, 3]");
/// ```
pub fn assert_eval_display(source: &str, expected: &str) {
    assert_eq!(render(&eval(source)), expected);
}

/// Assert that source code raises an error of the given kind
pub fn assert_error_kind(source: &str, expected: ErrorKind) {
    let error = eval_err(source);
    assert_eq!(error.kind, expected, "{:?} raised {}", source, error);
}

