//! The `math` module
//!
//! Integers stay integers wherever the result is integral (`abs`, `floor`,
//! `ceil`, `round` with no places). Domain errors raise rather than
//! producing NaN.

use super::expect_number;
use crate::context::{BuiltinModule, Operation, ParamSpec};
use crate::value::number::{self, Number};
use crate::value::{Arguments, ErrorKind, FlowError, Interchange, Value};

/// π
pub const PI: f64 = std::f64::consts::PI;

pub struct MathModule;

impl BuiltinModule for MathModule {
    fn operations(&self) -> Vec<Operation> {
        vec![
            Operation::new("abs", vec![ParamSpec::required("x")], abs),
            Operation::new("floor", vec![ParamSpec::required("x")], floor),
            Operation::new("ceil", vec![ParamSpec::required("x")], ceil),
            Operation::new(
                "round",
                vec![
                    ParamSpec::required("x"),
                    ParamSpec::optional("places", Interchange::Integer(0)),
                ],
                round,
            ),
            Operation::new(
                "min",
                vec![ParamSpec::required("a"), ParamSpec::required("b")],
                min,
            ),
            Operation::new(
                "max",
                vec![ParamSpec::required("a"), ParamSpec::required("b")],
                max,
            ),
            Operation::new("sqrt", vec![ParamSpec::required("x")], sqrt),
            Operation::new("pi", vec![], |args| args.heap().float(PI)),
        ]
    }
}

// ============================================================================
// Basic Operations
// ============================================================================

/// abs(x) -> number
fn abs(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let x = expect_number(&args.get("x")?, "abs")?;
    let result = match x {
        Number::Int(n) => Number::Int(n.abs()),
        Number::Float(f) => Number::Float(f.abs()),
    };
    args.heap().number(result)
}

/// Apply an integral rounding to a float, keeping integers as they are
fn integral(args: &mut Arguments<'_>, operation: &str, round: fn(f64) -> f64) -> Result<Value, FlowError> {
    let x = expect_number(&args.get("x")?, operation)?;
    match x {
        Number::Int(n) => args.heap().integer(n),
        Number::Float(f) => {
            let rounded = round(f);
            if rounded.abs() > number::MAX_SAFE_INTEGER as f64 {
                return Err(FlowError::number_too_big(format!(
                    "{}() result exceeds the largest supported integer",
                    operation
                )));
            }
            args.heap().integer(rounded as i64)
        }
    }
}

/// floor(x) -> Integer
fn floor(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    integral(args, "floor", f64::floor)
}

/// ceil(x) -> Integer
fn ceil(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    integral(args, "ceil", f64::ceil)
}

/// round(x, places = 0) -> number
///
/// Halves round away from zero. With no places the result is an Integer.
fn round(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let places = args.get("places")?.as_integer().ok_or_else(|| {
        FlowError::type_error("round() expects an integer number of places")
    })?;
    if places <= 0 {
        return integral(args, "round", f64::round);
    }
    match expect_number(&args.get("x")?, "round")? {
        Number::Int(n) => args.heap().integer(n),
        Number::Float(f) => args.heap().float(number::round_to(f, places as usize)),
    }
}

// ============================================================================
// Comparison
// ============================================================================

/// min(a, b) -> a or b
fn min(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let a = args.get("a")?;
    let b = args.get("b")?;
    let b_smaller = b.less(&a, args.invoker())?.truthy(args.invoker())?;
    Ok(if b_smaller { b } else { a })
}

/// max(a, b) -> a or b
fn max(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let a = args.get("a")?;
    let b = args.get("b")?;
    let b_larger = b.greater(&a, args.invoker())?.truthy(args.invoker())?;
    Ok(if b_larger { b } else { a })
}

// ============================================================================
// Exponential
// ============================================================================

/// sqrt(x) -> Float
fn sqrt(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let x = expect_number(&args.get("x")?, "sqrt")?.as_f64();
    if x < 0.0 {
        return Err(FlowError::new(
            ErrorKind::Error,
            "sqrt() of a negative number",
        ));
    }
    args.heap().float(x.sqrt())
}
