//! Struct overrides and the callback interface
//!
//! Operations that may run Flow code take a `&mut dyn Invoke`. The
//! interpreter implements it; [`Detached`] serves host-side conversions and
//! natives called outside an evaluation.

use super::{bind_parameters, Arguments, CallArgs, Data, FlowError, FunctionBody, Value};
use flow_config::MethodRole;

/// Calls a Flow function value with positional arguments
pub trait Invoke {
    fn invoke(&mut self, function: &Value, args: Vec<Value>) -> Result<Value, FlowError>;
}

/// Invoker available when no interpreter is running. Natives still run;
/// user-defined functions cannot.
pub struct Detached;

impl Invoke for Detached {
    fn invoke(&mut self, function: &Value, args: Vec<Value>) -> Result<Value, FlowError> {
        let (native, params, name) = match &*function.data() {
            Data::Function(data) => match &data.body {
                FunctionBody::Native(native) => (
                    native.clone(),
                    data.params.clone(),
                    data.name.clone().unwrap_or_else(|| "function".into()),
                ),
                FunctionBody::User { .. } => {
                    return Err(FlowError::type_error(
                        "cannot run a Flow function outside an evaluation",
                    ))
                }
            },
            _ => {
                return Err(FlowError::type_error(format!(
                    "'{}' is not callable",
                    function.type_name()
                )))
            }
        };
        let bound = bind_parameters(&params, CallArgs::positional(args), &name)?;
        let heap = function.heap().clone();
        let mut arguments = Arguments::new(bound, heap, self);
        native(&mut arguments)
    }
}

impl Value {
    /// The function a struct's module binds to `role`, if any
    pub fn find_override(&self, role: MethodRole) -> Option<Value> {
        let module = match &*self.data() {
            Data::Struct(data) => data.module.clone(),
            _ => return None,
        };
        let name = self.settings().special_method(role);
        module.module_attribute(name).filter(Value::is_function)
    }

    /// Run a struct override with the receiver prepended to `args`
    pub fn call_override(
        &self,
        role: MethodRole,
        args: &[Value],
        cx: &mut dyn Invoke,
    ) -> Result<Option<Value>, FlowError> {
        match self.find_override(role) {
            Some(function) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(self.clone());
                full.extend_from_slice(args);
                cx.invoke(&function, full).map(Some)
            }
            None => Ok(None),
        }
    }
}
