//! Statement-like constructs: assignment, branches, try, definitions,
//! raise and documentation

use super::{assign, EvalResult, Evaluated, Interpreter, Record, RecordKind};
use crate::ast::{Block, FunctionDef, ModuleDef, Node, NodeKind, Parameter};
use crate::value::{
    Data, ErrorKind, FlowError, FunctionBody, FunctionData, ModuleData, Param, Unwind, Value,
};
use std::rc::Rc;

/// Remove the indentation shared by every non-blank line, and blank lines
/// at either end
pub(crate) fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.iter().position(|line| !line.trim().is_empty());
    let end = lines.iter().rposition(|line| !line.trim().is_empty());
    let (Some(start), Some(end)) = (start, end) else {
        return String::new();
    };
    let lines = &lines[start..=end];
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                // Indentation is ASCII whitespace, so this is a char boundary
                line.get(indent..).unwrap_or(line.trim_start())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether a module body statement defines a nested module
fn defines_module(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Module(_) => true,
        NodeKind::Doc { target, .. } => defines_module(target),
        _ => false,
    }
}

impl Interpreter {
    pub(super) fn eval_assign(&mut self, target: &Node, value: &Node) -> EvalResult {
        match &target.kind {
            NodeKind::Variable(name) => {
                let value = self.eval(value)?;
                value.name_if_anonymous(name);
                assign(&self.scope(), name, value.clone());
                Ok(value)
            }
            NodeKind::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                let value = self.eval(value)?;
                object.set_item(&index, &value, self)?;
                Ok(value)
            }
            NodeKind::Attribute { object, name } => {
                let object = self.eval(object)?;
                let value = self.eval(value)?;
                object.set_attribute(name, &value, self)?;
                Ok(value)
            }
            _ => Err(FlowError::type_error("invalid assignment target").into()),
        }
    }

    /// Walk an `if` / `else if` chain without recursing per branch
    pub(super) fn eval_if(
        &mut self,
        branches: &[(Node, Block)],
        otherwise: Option<&Block>,
        tail: bool,
    ) -> EvalResult<Evaluated> {
        for (condition, block) in branches {
            let condition = self.eval(condition)?;
            if condition.truthy(self)? {
                return self.eval_block_tail(block, tail);
            }
        }
        match otherwise {
            Some(block) => self.eval_block_tail(block, tail),
            None => Ok(Evaluated::Value(self.heap.null())),
        }
    }

    pub(super) fn eval_try(
        &mut self,
        body: &Block,
        binding: Option<&str>,
        handler: &Block,
    ) -> EvalResult {
        let depth = self.depth;
        let stack_len = self.stack.len();
        let error = match self.eval_block(body) {
            Err(Unwind::Raise(error)) => error,
            other => return other,
        };
        self.depth = depth;
        self.stack.truncate(stack_len);

        let frame = Record::new_scope(RecordKind::Catch, Some(self.scope()));
        if let Some(name) = binding {
            let value = self.heap.error_value(&error);
            frame.borrow_mut().define(name, value);
        }
        self.stack.push(frame);
        let result = self.eval_block(handler);
        self.stack.pop();
        result
    }

    fn eval_params(&mut self, params: &[Parameter]) -> EvalResult<Rc<[Param]>> {
        let mut evaluated = Vec::with_capacity(params.len());
        for param in params {
            let default = match &param.default {
                Some(node) => Some(self.eval(node)?),
                None => None,
            };
            evaluated.push(Param {
                name: param.name.as_str().into(),
                alias: None,
                default,
            });
        }
        Ok(evaluated.into())
    }

    pub(super) fn eval_function(&mut self, def: &Rc<FunctionDef>) -> EvalResult {
        let params = self.eval_params(&def.params)?;
        let scope = self.scope();
        let function = Value::new(
            Data::Function(FunctionData {
                name: def.name.as_deref().map(Rc::from),
                params,
                body: FunctionBody::User {
                    def: Rc::clone(def),
                    scope: Rc::clone(&scope),
                },
            }),
            &self.heap,
        );
        if let Some(name) = &def.name {
            scope.borrow_mut().define(name, function.clone());
        }
        Ok(function)
    }

    /// Evaluate a module body in its own record while the enclosing record
    /// is locked. Nested module definitions run after the other statements.
    pub(super) fn eval_module(&mut self, def: &Rc<ModuleDef>) -> EvalResult {
        let enclosing = self.scope();
        let record = Record::new_scope(RecordKind::Module, Some(Rc::clone(&enclosing)));
        let was_locked = enclosing.borrow().is_locked();
        enclosing.borrow_mut().set_locked(true);
        self.stack.push(Rc::clone(&record));

        let (nested, simple): (Vec<&Node>, Vec<&Node>) =
            def.body.iter().partition(|node| defines_module(node));
        let mut outcome = Ok(());
        for node in simple.into_iter().chain(nested) {
            if let Err(unwind) = self.eval(node) {
                outcome = Err(unwind);
                break;
            }
        }

        self.stack.pop();
        enclosing.borrow_mut().set_locked(was_locked);
        outcome?;

        let params = match &def.params {
            Some(params) => Some(self.eval_params(params)?),
            None => None,
        };
        let module = Value::new(
            Data::Module(ModuleData {
                name: def.name.as_deref().map(Rc::from),
                attributes: record,
                params,
            }),
            &self.heap,
        );
        if let Some(name) = &def.name {
            enclosing.borrow_mut().define(name, module.clone());
        }
        Ok(module)
    }

    pub(super) fn eval_raise(&mut self, kind: Option<&Node>, message: &Node) -> EvalResult<FlowError> {
        let settings = Rc::clone(&self.settings);
        let kind = match kind {
            Some(node) => {
                let name = self.eval(node)?;
                match name.as_str() {
                    Some(name) => Some(ErrorKind::from_name(&name, &settings)),
                    None => {
                        return Err(FlowError::type_error(format!(
                            "error type must be a string, not '{}'",
                            name.type_name()
                        ))
                        .into())
                    }
                }
            }
            None => None,
        };
        let message = self.eval(message)?;

        // Raising an Error value re-raises it unless a type is given
        let (error_kind, payload) = match (&*message.data(), kind) {
            (_, Some(kind)) => (kind, message.clone()),
            (Data::Error(data), None) => (data.kind.clone(), data.message.clone()),
            (_, None) => (ErrorKind::Error, message.clone()),
        };
        let text = payload.display(self)?;
        Ok(FlowError::new(error_kind, text.to_string()).with_payload(payload))
    }

    pub(super) fn eval_doc(&mut self, text: &str, target: &Node) -> EvalResult {
        let value = self.eval(target)?;
        value.set_doc(dedent(text));
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dedent() {
        let text = "\n    First line\n      indented\n\n    last\n  ";
        assert_eq!(dedent(text), "First line\n  indented\n\nlast");
    }

    #[test]
    fn test_dedent_blank() {
        assert_eq!(dedent("   \n  "), "");
    }
}
