//! Numeric semantics
//!
//! Integers are exact up to `MAX_SAFE_INTEGER`; anything beyond raises
//! NumberTooBig, as does any non-finite float. Float sums and differences
//! are rounded to the larger operand's decimal places and products to the
//! sum of both, which hides binary floating-point noise such as
//! `0.1 + 0.2`. Rounding is skipped past 15 places.

use crate::value::FlowError;
use std::cmp::Ordering;

/// Largest integer magnitude a Flow Integer may hold (2^53 - 1)
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

const MAX_ROUNDING_PLACES: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(n) => n == 0,
            Number::Float(f) => f == 0.0,
        }
    }

    /// Decimal places observed in the shortest rendering
    fn places(self) -> usize {
        match self {
            Number::Int(_) => 0,
            Number::Float(f) => decimals(f),
        }
    }
}

pub fn check_integer(n: i64) -> Result<i64, FlowError> {
    if n.abs() > MAX_SAFE_INTEGER {
        Err(FlowError::number_too_big(format!(
            "{} exceeds the largest supported integer",
            n
        )))
    } else {
        Ok(n)
    }
}

pub fn check_float(f: f64) -> Result<f64, FlowError> {
    if f.is_finite() {
        Ok(f)
    } else {
        Err(FlowError::number_too_big("result is not a finite number"))
    }
}

/// Digits after the decimal point in the shortest round-trip rendering
pub fn decimals(f: f64) -> usize {
    let text = f.to_string();
    match text.find('.') {
        Some(dot) => text.len() - dot - 1,
        None => 0,
    }
}

/// Round half away from zero to `places` decimals
pub fn round_to(f: f64, places: usize) -> f64 {
    if places > MAX_ROUNDING_PLACES {
        return f;
    }
    let factor = 10f64.powi(places as i32);
    let scaled = f * factor;
    if !scaled.is_finite() {
        return f;
    }
    // Re-parse through the exact decimal text so the result is the float
    // nearest the rounded decimal
    let rounded = scaled.round() / factor;
    format!("{:.*}", places, rounded).parse().unwrap_or(rounded)
}

fn int_result(result: Option<i64>) -> Result<Number, FlowError> {
    match result {
        Some(n) => check_integer(n).map(Number::Int),
        None => Err(FlowError::number_too_big(
            "result exceeds the largest supported integer",
        )),
    }
}

fn float_result(f: f64, places: usize) -> Result<Number, FlowError> {
    let f = check_float(f)?;
    Ok(Number::Float(round_to(f, places)))
}

pub fn add(a: Number, b: Number) -> Result<Number, FlowError> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => int_result(x.checked_add(y)),
        _ => float_result(a.as_f64() + b.as_f64(), a.places().max(b.places())),
    }
}

pub fn subtract(a: Number, b: Number) -> Result<Number, FlowError> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => int_result(x.checked_sub(y)),
        _ => float_result(a.as_f64() - b.as_f64(), a.places().max(b.places())),
    }
}

pub fn multiply(a: Number, b: Number) -> Result<Number, FlowError> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => int_result(x.checked_mul(y)),
        _ => float_result(a.as_f64() * b.as_f64(), a.places() + b.places()),
    }
}

pub fn divide(a: Number, b: Number) -> Result<Number, FlowError> {
    if b.is_zero() {
        return Err(FlowError::zero_division());
    }
    match (a, b) {
        (Number::Int(x), Number::Int(y)) if x % y == 0 => int_result(x.checked_div(y)),
        _ => Ok(Number::Float(check_float(a.as_f64() / b.as_f64())?)),
    }
}

/// Remainder with the sign of the divisor
pub fn remainder(a: Number, b: Number) -> Result<Number, FlowError> {
    if b.is_zero() {
        return Err(FlowError::zero_division());
    }
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => {
            let mut r = x % y;
            if r != 0 && (r < 0) != (y < 0) {
                r += y;
            }
            Ok(Number::Int(r))
        }
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            let mut r = x % y;
            if r != 0.0 && (r < 0.0) != (y < 0.0) {
                r += y;
            }
            float_result(r, a.places().max(b.places()))
        }
    }
}

pub fn power(a: Number, b: Number) -> Result<Number, FlowError> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) if y >= 0 => match u32::try_from(y) {
            Ok(exp) => int_result(x.checked_pow(exp)),
            Err(_) if x == 0 || x == 1 => Ok(Number::Int(x)),
            Err(_) if x == -1 => Ok(Number::Int(if y % 2 == 0 { 1 } else { -1 })),
            Err(_) => Err(FlowError::number_too_big(
                "result exceeds the largest supported integer",
            )),
        },
        _ => {
            if a.is_zero() && b.as_f64() < 0.0 {
                return Err(FlowError::zero_division());
            }
            Ok(Number::Float(check_float(a.as_f64().powf(b.as_f64()))?))
        }
    }
}

pub fn negate(a: Number) -> Number {
    match a {
        Number::Int(n) => Number::Int(-n),
        Number::Float(f) => Number::Float(-f),
    }
}

pub fn compare(a: Number, b: Number) -> Ordering {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x.cmp(&y),
        _ => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
    }
}
