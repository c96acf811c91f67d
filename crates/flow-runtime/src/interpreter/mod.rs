//! Tree-walking evaluator
//!
//! Evaluates the AST against a stack of scope records. Supports:
//! - Operator dispatch through the value protocol
//! - Closures over shared scope records
//! - `return` and `raise` as typed non-local exits ([`Unwind`])
//! - Tail calls, trampolined so self-recursion in tail position does not
//!   grow the host stack
//! - Module bodies evaluated under an assignment lock

mod call;
mod expr;
mod record;
mod stmt;

pub use record::{assign, lookup, Record, RecordKind, Scope};

use crate::ast::Program;
use crate::value::{CallArgs, FlowError, Heap, Invoke, Unwind, Value};
use flow_config::Settings;
use std::rc::Rc;

/// Result of evaluating a node: a value or a non-local exit
pub(crate) type EvalResult<T = Value> = Result<T, Unwind>;

/// Outcome of a node evaluated in tail position
pub(crate) enum Evaluated {
    Value(Value),
    /// A call left for the enclosing trampoline to run
    TailCall { function: Value, args: CallArgs },
}

/// Interpreter state
pub struct Interpreter {
    pub(super) heap: Rc<Heap>,
    pub(super) settings: Rc<Settings>,
    /// Active records, innermost last. The first is the program record.
    pub(super) stack: Vec<Scope>,
    /// Number of calls currently executing
    pub(super) depth: usize,
}

impl Interpreter {
    pub fn new(heap: Rc<Heap>) -> Self {
        let settings = Rc::clone(heap.settings());
        Self {
            heap,
            settings,
            stack: vec![Record::new_scope(RecordKind::Program, None)],
            depth: 0,
        }
    }

    pub fn heap(&self) -> &Rc<Heap> {
        &self.heap
    }

    /// The program record
    pub fn globals(&self) -> Scope {
        Rc::clone(&self.stack[0])
    }

    /// Bind a name in the program record
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.stack[0].borrow_mut().define(name, value);
    }

    /// Innermost record
    pub(super) fn scope(&self) -> Scope {
        match self.stack.last() {
            Some(scope) => Rc::clone(scope),
            None => self.globals(),
        }
    }

    /// Evaluate a program. A top-level `return` ends it with its value.
    pub fn run(&mut self, program: &Program) -> Result<Value, FlowError> {
        match self.eval_block(&program.body) {
            Ok(value) => Ok(value),
            Err(Unwind::Return(value)) => Ok(value),
            Err(Unwind::Raise(error)) => Err(error),
        }
    }
}

impl Invoke for Interpreter {
    fn invoke(&mut self, function: &Value, args: Vec<Value>) -> Result<Value, FlowError> {
        self.call_function(function.clone(), CallArgs::positional(args))
    }
}
