//! Expression evaluation

use super::{lookup, EvalResult, Evaluated, Interpreter};
use crate::ast::{Argument, BinaryOp, Block, LogicalOp, Node, NodeKind, UnaryOp};
use crate::stack::ensure_sufficient_stack;
use crate::value::{CallArgs, FlowError, Unwind, Value, ValueKind};
use flow_config::MethodRole;
use std::rc::Rc;

impl Interpreter {
    /// Evaluate a node to a value
    pub(super) fn eval(&mut self, node: &Node) -> EvalResult {
        match self.eval_node(node, false)? {
            Evaluated::Value(value) => Ok(value),
            Evaluated::TailCall { function, args } => Ok(self.call_function(function, args)?),
        }
    }

    /// Evaluate a node; with `tail` set a call may come back deferred
    pub(super) fn eval_node(&mut self, node: &Node, tail: bool) -> EvalResult<Evaluated> {
        ensure_sufficient_stack(|| {
            self.eval_kind(node, tail).map_err(|unwind| match unwind {
                Unwind::Raise(error) => Unwind::Raise(error.with_span(node.span)),
                other => other,
            })
        })
    }

    /// Evaluate a block; its value is the value of its last statement
    pub(super) fn eval_block(&mut self, block: &Block) -> EvalResult {
        match self.eval_block_tail(block, false)? {
            Evaluated::Value(value) => Ok(value),
            Evaluated::TailCall { function, args } => Ok(self.call_function(function, args)?),
        }
    }

    pub(super) fn eval_block_tail(&mut self, block: &Block, tail: bool) -> EvalResult<Evaluated> {
        let Some((last, rest)) = block.split_last() else {
            return Ok(Evaluated::Value(self.heap.null()));
        };
        for node in rest {
            self.eval(node)?;
        }
        self.eval_node(last, tail)
    }

    fn eval_kind(&mut self, node: &Node, tail: bool) -> EvalResult<Evaluated> {
        let heap = Rc::clone(&self.heap);
        let value = match &node.kind {
            NodeKind::Integer(n) => heap.integer(*n)?,
            NodeKind::Float(f) => heap.float(*f)?,
            NodeKind::Str(s) => heap.string(s.as_str()),
            NodeKind::DateTime(s) => heap.string(s.as_str()),
            NodeKind::Boolean(b) => heap.boolean(*b),
            NodeKind::Null => heap.null(),
            NodeKind::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item)?);
                }
                heap.list(values)
            }
            NodeKind::Dict(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = self.eval(key)?;
                    let value = self.eval(value)?;
                    pairs.push((key, value));
                }
                heap.dict(pairs, self)?
            }
            NodeKind::Variable(name) => {
                lookup(&self.scope(), name).ok_or_else(|| FlowError::name_error(name))?
            }
            NodeKind::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                match op {
                    UnaryOp::Plus => operand.positive(self)?,
                    UnaryOp::Minus => operand.negative(self)?,
                }
            }
            NodeKind::Not(operand) => {
                let operand = self.eval(operand)?;
                operand.not(self)?
            }
            NodeKind::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                self.binary(*op, &left, &right)?
            }
            NodeKind::Logical { op, left, right } => self.logical(*op, left, right)?,
            NodeKind::Attribute { object, name } => {
                let object = self.eval(object)?;
                object.get_attribute(name, self)?
            }
            NodeKind::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                object.get_item(&index, self)?
            }
            NodeKind::Call { callee, args } => {
                let function = self.eval(callee)?;
                let args = self.eval_arguments(args)?;
                if tail && function.kind() == ValueKind::Function {
                    return Ok(Evaluated::TailCall { function, args });
                }
                self.call_function(function, args)?
            }
            NodeKind::Construct { callee, args } => {
                let module = self.eval(callee)?;
                let args = self.eval_arguments(args)?;
                self.construct(&module, args)?
            }
            NodeKind::Assign { target, value } => self.eval_assign(target, value)?,
            NodeKind::If {
                branches,
                otherwise,
            } => return self.eval_if(branches, otherwise.as_ref(), tail),
            NodeKind::Try {
                body,
                binding,
                handler,
            } => self.eval_try(body, binding.as_deref(), handler)?,
            NodeKind::Function(def) => self.eval_function(def)?,
            NodeKind::Module(def) => self.eval_module(def)?,
            NodeKind::Return(operand) => {
                let value = match operand {
                    Some(operand) => self.eval(operand)?,
                    None => heap.null(),
                };
                return Err(Unwind::Return(value));
            }
            NodeKind::Raise { kind, message } => {
                return Err(self.eval_raise(kind.as_deref(), message)?.into())
            }
            NodeKind::Doc { text, target } => self.eval_doc(text, target)?,
        };
        Ok(Evaluated::Value(value))
    }

    fn binary(&mut self, op: BinaryOp, left: &Value, right: &Value) -> Result<Value, FlowError> {
        match op {
            BinaryOp::Add => left.add(right, self),
            BinaryOp::Subtract => left.subtract(right, self),
            BinaryOp::Multiply => left.multiply(right, self),
            BinaryOp::Divide => left.divide(right, self),
            BinaryOp::Remainder => left.remainder(right, self),
            BinaryOp::Power => left.power(right, self),
            BinaryOp::Equal => left.equals(right, self),
            BinaryOp::NotEqual => left.not_equals(right, self),
            BinaryOp::Less => left.less(right, self),
            BinaryOp::LessEqual => left.less_equal(right, self),
            BinaryOp::Greater => left.greater(right, self),
            BinaryOp::GreaterEqual => left.greater_equal(right, self),
            BinaryOp::In => right.contains(left, self),
        }
    }

    /// `and` / `or` return an operand, evaluating the right one only when
    /// the left does not decide the result
    fn logical(&mut self, op: LogicalOp, left: &Node, right: &Node) -> EvalResult {
        let left = self.eval(left)?;
        let role = match op {
            LogicalOp::And => MethodRole::And,
            LogicalOp::Or => MethodRole::Or,
        };
        if left.find_override(role).is_some() {
            let right = self.eval(right)?;
            if let Some(result) = left.call_override(role, &[right], self)? {
                return Ok(result);
            }
        }
        let truthy = left.truthy(self)?;
        match (op, truthy) {
            (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
            _ => self.eval(right),
        }
    }

    pub(super) fn eval_arguments(&mut self, args: &[Argument]) -> EvalResult<CallArgs> {
        let mut call_args = CallArgs::default();
        for arg in args {
            let value = self.eval(&arg.value)?;
            match &arg.name {
                Some(name) => call_args.named.push((name.as_str().into(), value)),
                None => call_args.positional.push(value),
            }
        }
        Ok(call_args)
    }
}
