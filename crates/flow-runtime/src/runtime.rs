//! Flow runtime API for embedding

use crate::context::Context;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::value::{FlowError, Heap, Value};
use std::rc::Rc;
use tracing::debug;

/// Evaluate `source` against a host context.
///
/// Every registered builtin module is bound in the program record before
/// the first statement runs. An error that reaches the program boundary is
/// returned to the caller, or converted into an Error value when
/// `ignore_all_errors` is set.
///
/// The result's transfer form is computed before returning when it can
/// be, so user transfer overrides run while the evaluator is still alive.
#[tracing::instrument(level = "debug", skip_all)]
pub fn evaluate(
    source: &str,
    context: &Context,
    ignore_all_errors: bool,
) -> Result<Value, FlowError> {
    let heap = Heap::new(Rc::clone(context.settings()));
    let outcome = run(source, context, &heap);
    debug!(
        source_len = source.len(),
        outcome = match &outcome {
            Ok(value) => value.kind().name(),
            Err(_) => "error",
        },
        "evaluated"
    );
    match outcome {
        Ok(value) => Ok(value),
        Err(error) if ignore_all_errors => Ok(heap.error_value(&error)),
        Err(error) => Err(error),
    }
}

fn run(source: &str, context: &Context, heap: &Rc<Heap>) -> Result<Value, FlowError> {
    let program = Parser::from_source(source, Rc::clone(context.settings())).parse()?;
    let mut interpreter = Interpreter::new(Rc::clone(heap));
    context.install(&mut interpreter)?;
    let value = interpreter.run(&program)?;
    // A result without a transfer form is still a result; `to_json`
    // reports the failure if the host asks for it
    if let Err(error) = value.transfer(&mut interpreter) {
        debug!(%error, "result has no transfer form");
    }
    Ok(value)
}

/// Flow runtime instance
///
/// Owns a [`Context`] and evaluates programs against it.
///
/// # Examples
///
/// ```
/// use flow_runtime::Flow;
///
/// let runtime = Flow::new();
/// let result = runtime.eval("1 + 2").unwrap();
/// assert_eq!(result.as_integer(), Some(3));
/// ```
pub struct Flow {
    context: Context,
}

impl Flow {
    /// Create a runtime with English defaults and the standard modules
    ///
    /// # Examples
    ///
    /// ```
    /// use flow_runtime::Flow;
    ///
    /// let runtime = Flow::new();
    /// let result = runtime.eval("math.abs(-4)").unwrap();
    /// assert_eq!(result.as_integer(), Some(4));
    /// ```
    pub fn new() -> Self {
        Self::with_context(Context::with_standard_modules())
    }

    pub fn with_context(context: Context) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Mutable access for registering or translating modules
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Evaluate Flow source code
    ///
    /// # Examples
    ///
    /// ```
    /// use flow_runtime::{ErrorKind, Flow};
    ///
    /// let runtime = Flow::new();
    /// let error = runtime.eval("10 / 0").unwrap_err();
    /// assert_eq!(error.kind, ErrorKind::ZeroDivision);
    /// ```
    pub fn eval(&self, source: &str) -> Result<Value, FlowError> {
        evaluate(source, &self.context, false)
    }

    /// Evaluate Flow source code, returning an uncaught error as an Error value
    ///
    /// # Examples
    ///
    /// ```
    /// use flow_runtime::{Flow, ValueKind};
    ///
    /// let runtime = Flow::new();
    /// let value = runtime.eval_lenient("10 / 0");
    /// assert_eq!(value.kind(), ValueKind::Error);
    /// ```
    pub fn eval_lenient(&self, source: &str) -> Value {
        let heap = Heap::new(Rc::clone(self.context.settings()));
        match evaluate(source, &self.context, true) {
            Ok(value) => value,
            // Only reachable if conversion itself failed
            Err(error) => heap.error_value(&error),
        }
    }
}

impl Default for Flow {
    fn default() -> Self {
        Self::new()
    }
}
