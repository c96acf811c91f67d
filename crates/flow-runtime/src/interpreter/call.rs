//! Calls, the tail-call trampoline and struct construction

use super::{EvalResult, Evaluated, Interpreter, Record, RecordKind};
use crate::stack::ensure_sufficient_stack;
use crate::value::{
    bind_parameters, Arguments, CallArgs, Data, ErrorKind, FlowError, FunctionBody, Param,
    StructData, Unwind, Value,
};
use std::rc::Rc;
use tracing::{trace, warn};

/// What a call resolves to once the callee's payload is read
enum Callee {
    User {
        def: Rc<crate::ast::FunctionDef>,
        scope: super::Scope,
    },
    Native(crate::value::NativeFn),
}

impl Interpreter {
    /// Run a call to completion, bouncing tail calls in a loop
    pub(crate) fn call_function(&mut self, function: Value, args: CallArgs) -> Result<Value, FlowError> {
        let mut function = function;
        let mut args = args;
        loop {
            match ensure_sufficient_stack(|| self.enter_call(&function, args))? {
                Evaluated::Value(value) => return Ok(value),
                Evaluated::TailCall {
                    function: next,
                    args: next_args,
                } => {
                    trace!(
                        function = next.function_name().as_deref().unwrap_or("anonymous"),
                        "tail call"
                    );
                    function = next;
                    args = next_args;
                }
            }
        }
    }

    /// Execute one call frame. A call in tail position of the body comes
    /// back unevaluated for the trampoline.
    fn enter_call(&mut self, function: &Value, args: CallArgs) -> Result<Evaluated, FlowError> {
        let (callee, params, name) = match &*function.data() {
            Data::Function(data) => {
                let callee = match &data.body {
                    FunctionBody::User { def, scope } => Callee::User {
                        def: Rc::clone(def),
                        scope: Rc::clone(scope),
                    },
                    FunctionBody::Native(native) => Callee::Native(Rc::clone(native)),
                };
                let name = data
                    .name
                    .as_deref()
                    .unwrap_or("anonymous")
                    .to_string();
                (callee, Rc::clone(&data.params), name)
            }
            _ => {
                return Err(FlowError::type_error(format!(
                    "'{}' is not callable",
                    function.type_name()
                )))
            }
        };
        let bound = bind_parameters(&params, args, &name)?;

        let limit = self.settings.max_call_depth();
        if self.depth >= limit {
            warn!(depth = self.depth, function = %name, "maximum call depth exceeded");
            return Err(FlowError::new(
                ErrorKind::Error,
                format!("maximum call depth of {} exceeded in {}", limit, name),
            ));
        }

        self.depth += 1;
        let result = match callee {
            Callee::User { def, scope } => {
                let frame = Record::new_scope(RecordKind::Call, Some(scope));
                for (param, value) in bound {
                    frame.borrow_mut().define(&param, value);
                }
                self.stack.push(frame);
                let result = self.eval_block_tail(&def.body, true);
                self.stack.pop();
                match result {
                    Ok(evaluated) => Ok(evaluated),
                    Err(Unwind::Return(value)) => Ok(Evaluated::Value(value)),
                    Err(Unwind::Raise(error)) => Err(error),
                }
            }
            Callee::Native(native) => {
                let heap = Rc::clone(&self.heap);
                let mut arguments = Arguments::new(bound, heap, self);
                native(&mut arguments).map(Evaluated::Value)
            }
        };
        self.depth -= 1;
        result
    }

    /// Build a struct from a module declared with parameters
    pub(super) fn construct(&mut self, module: &Value, args: CallArgs) -> EvalResult {
        let (params, name): (Rc<[Param]>, String) = match &*module.data() {
            Data::Module(data) => {
                let name = data.name.as_deref().unwrap_or("anonymous").to_string();
                match &data.params {
                    Some(params) => (Rc::clone(params), name),
                    None => {
                        return Err(FlowError::type_error(format!(
                            "module {} does not construct structs",
                            name
                        ))
                        .into())
                    }
                }
            }
            _ => {
                return Err(FlowError::type_error(format!(
                    "'{}' cannot construct a struct",
                    module.type_name()
                ))
                .into())
            }
        };
        let bound = bind_parameters(&params, args, &name)?;
        let heap = Rc::clone(&self.heap);
        let entries = bound
            .into_iter()
            .map(|(field, value)| (heap.string(field), value))
            .collect();
        let fields = heap.dict(entries, self)?;
        Ok(Value::new(
            Data::Struct(StructData {
                module: module.clone(),
                fields,
            }),
            &heap,
        ))
    }
}
