//! Standard builtin modules
//!
//! Hosts opt in with [`crate::Context::with_standard_modules`]:
//! - `core`: conversions, introspection and list helpers
//! - `math`: numeric helpers

mod core;
mod math;

pub use self::core::CoreModule;
pub use self::math::MathModule;

use crate::context::BuiltinModule;
use crate::value::number::Number;
use crate::value::{FlowError, Value};
use std::rc::Rc;

/// The standard modules with their canonical names
pub fn standard_modules() -> Vec<(Rc<dyn BuiltinModule>, String)> {
    vec![
        (Rc::new(CoreModule) as Rc<dyn BuiltinModule>, "core".to_string()),
        (Rc::new(MathModule) as Rc<dyn BuiltinModule>, "math".to_string()),
    ]
}

/// Numeric argument, or a Type error naming the operation
pub(crate) fn expect_number(value: &Value, operation: &str) -> Result<Number, FlowError> {
    value.number().ok_or_else(|| {
        FlowError::type_error(format!(
            "{}() expects a number, not '{}'",
            operation,
            value.type_name()
        ))
    })
}

pub(crate) fn expect_integer(value: &Value, operation: &str) -> Result<i64, FlowError> {
    value.as_integer().ok_or_else(|| {
        FlowError::type_error(format!(
            "{}() expects an integer, not '{}'",
            operation,
            value.type_name()
        ))
    })
}

pub(crate) fn expect_list(value: &Value, operation: &str) -> Result<Vec<Value>, FlowError> {
    value.list_items().ok_or_else(|| {
        FlowError::type_error(format!(
            "{}() expects a list, not '{}'",
            operation,
            value.type_name()
        ))
    })
}
