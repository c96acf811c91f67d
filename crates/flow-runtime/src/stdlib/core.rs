//! The `core` module
//!
//! Conversions, introspection and list helpers. Every operation takes its
//! arguments by name, so translations can rename both.

use super::{expect_integer, expect_list};
use crate::context::{BuiltinModule, Operation, ParamSpec};
use crate::value::{
    check_sequence_length, Arguments, Data, ErrorKind, FlowError, Interchange, Value, ValueKind,
};

pub struct CoreModule;

impl BuiltinModule for CoreModule {
    fn operations(&self) -> Vec<Operation> {
        vec![
            Operation::new("length", vec![ParamSpec::required("value")], length),
            Operation::new("type", vec![ParamSpec::required("value")], type_name),
            Operation::new("text", vec![ParamSpec::required("value")], text),
            Operation::new("number", vec![ParamSpec::required("value")], number),
            Operation::new("keys", vec![ParamSpec::required("dict")], keys),
            Operation::new("values", vec![ParamSpec::required("dict")], values),
            Operation::new("doc", vec![ParamSpec::required("value")], doc),
            Operation::new(
                "error",
                vec![ParamSpec::required("type"), ParamSpec::required("message")],
                error,
            ),
            Operation::new(
                "range",
                vec![
                    ParamSpec::required("start"),
                    ParamSpec::optional("stop", Interchange::Null),
                    ParamSpec::optional("step", Interchange::Integer(1)),
                ],
                range,
            ),
            Operation::new(
                "map",
                vec![ParamSpec::required("list"), ParamSpec::required("function")],
                map,
            ),
            Operation::new(
                "filter",
                vec![ParamSpec::required("list"), ParamSpec::required("function")],
                filter,
            ),
        ]
    }
}

// ============================================================================
// Introspection
// ============================================================================

/// length(value) -> Integer
fn length(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let value = args.get("value")?;
    value.length(args.invoker())
}

/// type(value) -> String
///
/// Kind name; structs report their module's name.
fn type_name(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let value = args.get("value")?;
    Ok(args.heap().string(value.type_name()))
}

/// doc(value) -> String or null
fn doc(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let value = args.get("value")?;
    Ok(match value.doc() {
        Some(doc) => args.heap().string(doc),
        None => args.heap().null(),
    })
}

// ============================================================================
// Conversions
// ============================================================================

/// text(value) -> String
fn text(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let value = args.get("value")?;
    let rendered = value.display(args.invoker())?;
    Ok(args.heap().string(rendered))
}

/// number(value) -> Integer or Float
///
/// Strings are parsed with the active decimal separator.
fn number(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let value = args.get("value")?;
    let heap = args.heap().clone();
    if let Some(n) = value.number() {
        return heap.number(n);
    }
    let text = value.as_str().ok_or_else(|| {
        FlowError::type_error(format!(
            "number() expects a string or a number, not '{}'",
            value.type_name()
        ))
    })?;
    let separator = args.settings().decimal_separator();
    let normalized = text.trim().replace(separator, ".");
    if let Ok(n) = normalized.parse::<i64>() {
        return heap.integer(n);
    }
    match normalized.parse::<f64>() {
        Ok(f) if normalized.contains('.') => heap.float(f),
        _ => Err(FlowError::type_error(format!(
            "cannot convert '{}' to a number",
            text
        ))),
    }
}

/// error(type, message) -> Error
///
/// Builds an Error value without raising it.
fn error(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let kind = args.get("type")?;
    let message = args.get("message")?;
    let name = kind.as_str().ok_or_else(|| {
        FlowError::type_error(format!(
            "error() expects a string type, not '{}'",
            kind.type_name()
        ))
    })?;
    let kind = ErrorKind::from_name(&name, args.settings());
    Ok(args.heap().error(kind, message))
}

// ============================================================================
// Collections
// ============================================================================

fn entries(value: &Value, operation: &str) -> Result<Vec<(Value, Value)>, FlowError> {
    if let Some(entries) = value.dict_entries() {
        return Ok(entries);
    }
    let fields = match &*value.data() {
        Data::Struct(data) => data.fields.clone(),
        _ => {
            return Err(FlowError::type_error(format!(
                "{}() expects a dict, not '{}'",
                operation,
                value.type_name()
            )))
        }
    };
    Ok(fields.dict_entries().unwrap_or_default())
}

/// keys(dict) -> List
fn keys(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let dict = args.get("dict")?;
    let keys = entries(&dict, "keys")?.into_iter().map(|(k, _)| k).collect();
    Ok(args.heap().list(keys))
}

/// values(dict) -> List
fn values(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let dict = args.get("dict")?;
    let values = entries(&dict, "values")?
        .into_iter()
        .map(|(_, v)| v)
        .collect();
    Ok(args.heap().list(values))
}

/// range(start, stop = null, step = 1) -> List
///
/// With one argument counts from 0 up to `start`, exclusive.
fn range(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let first = expect_integer(&args.get("start")?, "range")?;
    let stop = args.get("stop")?;
    let step = expect_integer(&args.get("step")?, "range")?;
    let (start, stop) = if stop.is_null() {
        (0, first)
    } else {
        (first, expect_integer(&stop, "range")?)
    };
    if step == 0 {
        return Err(FlowError::type_error("range() step must not be zero"));
    }
    let distance = i128::from(stop) - i128::from(start);
    let count = if distance != 0 && (distance > 0) == (step > 0) {
        (distance.abs() + i128::from(step).abs() - 1) / i128::from(step).abs()
    } else {
        0
    };
    let count = check_sequence_length(usize::try_from(count).ok(), "range()")?;
    let heap = args.heap().clone();
    let mut items = Vec::with_capacity(count);
    let mut current = start;
    while (step > 0 && current < stop) || (step < 0 && current > stop) {
        items.push(heap.integer(current)?);
        current += step;
    }
    Ok(heap.list(items))
}

fn expect_function(value: &Value, operation: &str) -> Result<(), FlowError> {
    if value.kind() == ValueKind::Function {
        Ok(())
    } else {
        Err(FlowError::type_error(format!(
            "{}() expects a function, not '{}'",
            operation,
            value.type_name()
        )))
    }
}

/// map(list, function) -> List
fn map(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let items = expect_list(&args.get("list")?, "map")?;
    let function = args.get("function")?;
    expect_function(&function, "map")?;
    let mut mapped = Vec::with_capacity(items.len());
    for item in items {
        mapped.push(args.call(&function, vec![item])?);
    }
    Ok(args.heap().list(mapped))
}

/// filter(list, function) -> List
fn filter(args: &mut Arguments<'_>) -> Result<Value, FlowError> {
    let items = expect_list(&args.get("list")?, "filter")?;
    let function = args.get("function")?;
    expect_function(&function, "filter")?;
    let mut kept = Vec::new();
    for item in items {
        let verdict = args.call(&function, vec![item.clone()])?;
        if verdict.truthy(args.invoker())? {
            kept.push(item);
        }
    }
    Ok(args.heap().list(kept))
}
