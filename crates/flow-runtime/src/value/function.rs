//! Callable and namespace payloads

use super::{FlowError, Heap, Invoke, Value};
use crate::ast::FunctionDef;
use crate::interpreter::Scope;
use flow_config::Settings;
use std::rc::Rc;

/// Native operation body
pub type NativeFn = Rc<dyn Fn(&mut Arguments<'_>) -> Result<Value, FlowError>>;

/// A declared parameter
#[derive(Clone)]
pub struct Param {
    pub name: Rc<str>,
    /// Localized spelling accepted for named arguments
    pub alias: Option<Rc<str>>,
    /// Absent for required parameters
    pub default: Option<Value>,
}

impl Param {
    pub fn required(name: impl Into<Rc<str>>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            default: None,
        }
    }

    pub fn optional(name: impl Into<Rc<str>>, default: Value) -> Self {
        Self {
            name: name.into(),
            alias: None,
            default: Some(default),
        }
    }

    fn answers_to(&self, name: &str) -> bool {
        &*self.name == name || self.alias.as_deref() == Some(name)
    }
}

pub enum FunctionBody {
    User { def: Rc<FunctionDef>, scope: Scope },
    Native(NativeFn),
}

pub struct FunctionData {
    pub name: Option<Rc<str>>,
    pub params: Rc<[Param]>,
    pub body: FunctionBody,
}

pub struct ModuleData {
    pub name: Option<Rc<str>>,
    /// Shared with every use of the module
    pub attributes: Scope,
    /// Present when the module constructs structs
    pub params: Option<Rc<[Param]>>,
}

pub struct StructData {
    pub module: Value,
    /// A Dict of field name to value
    pub fields: Value,
}

/// Arguments as written at a call site
#[derive(Default)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub named: Vec<(Rc<str>, Value)>,
}

impl CallArgs {
    pub fn positional(values: Vec<Value>) -> Self {
        Self {
            positional: values,
            named: Vec::new(),
        }
    }
}

/// Bind call arguments to declared parameters, in declaration order
pub fn bind_parameters(
    params: &[Param],
    args: CallArgs,
    callee: &str,
) -> Result<Vec<(Rc<str>, Value)>, FlowError> {
    if args.positional.len() > params.len() {
        return Err(FlowError::attribute(format!(
            "{} takes {} argument{} but {} were given",
            callee,
            params.len(),
            if params.len() == 1 { "" } else { "s" },
            args.positional.len()
        )));
    }
    let mut slots: Vec<Option<Value>> = vec![None; params.len()];
    for (slot, value) in slots.iter_mut().zip(args.positional) {
        *slot = Some(value);
    }
    for (name, value) in args.named {
        let index = params
            .iter()
            .position(|param| param.answers_to(&name))
            .ok_or_else(|| {
                FlowError::attribute(format!("{} got an unexpected argument '{}'", callee, name))
            })?;
        if slots[index].is_some() {
            return Err(FlowError::attribute(format!(
                "{} got multiple values for '{}'",
                callee, params[index].name
            )));
        }
        slots[index] = Some(value);
    }

    let mut bound = Vec::with_capacity(params.len());
    let mut missing = Vec::new();
    for (param, slot) in params.iter().zip(slots) {
        match slot.or_else(|| param.default.clone()) {
            Some(value) => bound.push((param.name.clone(), value)),
            None => missing.push(format!("'{}'", param.name)),
        }
    }
    if !missing.is_empty() {
        return Err(FlowError::attribute(format!(
            "{} missing required argument{}: {}",
            callee,
            if missing.len() == 1 { "" } else { "s" },
            missing.join(", ")
        )));
    }
    Ok(bound)
}

/// Bound arguments handed to a native operation
pub struct Arguments<'a> {
    values: Vec<(Rc<str>, Value)>,
    heap: Rc<Heap>,
    invoker: &'a mut dyn Invoke,
}

impl<'a> Arguments<'a> {
    pub fn new(values: Vec<(Rc<str>, Value)>, heap: Rc<Heap>, invoker: &'a mut dyn Invoke) -> Self {
        Self {
            values,
            heap,
            invoker,
        }
    }

    pub fn get(&self, name: &str) -> Result<Value, FlowError> {
        self.values
            .iter()
            .find(|(param, _)| &**param == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| FlowError::attribute(format!("missing argument '{}'", name)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (&**name, value))
    }

    pub fn heap(&self) -> &Rc<Heap> {
        &self.heap
    }

    pub fn settings(&self) -> &Settings {
        self.heap.settings()
    }

    /// Call a Flow function back
    pub fn call(&mut self, function: &Value, args: Vec<Value>) -> Result<Value, FlowError> {
        self.invoker.invoke(function, args)
    }

    /// Invoker for value operations that may run struct overrides
    pub fn invoker(&mut self) -> &mut dyn Invoke {
        &mut *self.invoker
    }
}
