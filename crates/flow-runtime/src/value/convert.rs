//! Derived forms: display, interchange, transfer and dict key strings
//!
//! Each form is computed on first use and cached in the value's cell until
//! the value or something it contains changes.

use super::number::Number;
use super::{Data, FlowError, Heap, Invoke, Value, ValueKind};
use crate::stack::ensure_sufficient_stack;
use flow_config::{KeywordRole, MethodRole};
use std::rc::Rc;

/// Language-native form used for structural comparison. Booleans appear
/// as the integers 1 and 0.
#[derive(Debug, Clone)]
pub enum Interchange {
    Null,
    Integer(i64),
    Float(f64),
    Str(String),
    List(Vec<Interchange>),
    Map(Vec<(String, Interchange)>),
}

impl Interchange {
    fn numeric(&self) -> Option<f64> {
        match self {
            Interchange::Integer(n) => Some(*n as f64),
            Interchange::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl PartialEq for Interchange {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Interchange::Null, Interchange::Null) => true,
            (Interchange::Integer(a), Interchange::Integer(b)) => a == b,
            (Interchange::Str(a), Interchange::Str(b)) => a == b,
            (Interchange::List(a), Interchange::List(b)) => a == b,
            (Interchange::Map(a), Interchange::Map(b)) => a == b,
            (a, b) => match (a.numeric(), b.numeric()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

/// Clears the render mark when a traversal leaves a value
struct Visit<'a> {
    heap: &'a Heap,
    id: u64,
}

impl<'a> Visit<'a> {
    fn enter(value: &'a Value) -> Option<Self> {
        let heap = value.heap();
        if heap.enter(value.id()) {
            Some(Visit {
                heap,
                id: value.id(),
            })
        } else {
            None
        }
    }
}

impl Drop for Visit<'_> {
    fn drop(&mut self) {
        self.heap.leave(self.id);
    }
}

fn self_reference() -> FlowError {
    FlowError::type_error("cannot convert a value that contains itself")
}

/// Render a float with a fractional part and the given separator
pub fn format_float(f: f64, separator: char) -> String {
    let mut text = f.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    if separator != '.' {
        text = text.replace('.', &separator.to_string());
    }
    text
}

fn quote(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Snapshot of what a form needs, taken so no borrow is held while
/// children or overrides are evaluated
enum Shape {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Str(Rc<str>),
    List(Vec<Value>),
    Dict(Vec<(Value, Value)>),
    Struct { module: Value, fields: Value },
    Named(String),
    Error { kind: String, message: Value },
}

impl Value {
    fn shape(&self) -> Shape {
        let settings = self.settings();
        match &*self.data() {
            Data::Null => Shape::Null,
            Data::Boolean(b) => Shape::Boolean(*b),
            Data::Integer(n) => Shape::Integer(*n),
            Data::Float(f) => Shape::Float(*f),
            Data::Str(s) => Shape::Str(Rc::clone(s)),
            Data::List(items) => Shape::List(items.iter().cloned().collect()),
            Data::Dict(table) => {
                Shape::Dict(table.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            }
            Data::Struct(data) => Shape::Struct {
                module: data.module.clone(),
                fields: data.fields.clone(),
            },
            Data::Module(data) => Shape::Named(format!(
                "<{} {}>",
                settings.keyword(KeywordRole::Module),
                data.name.as_deref().unwrap_or("anonymous")
            )),
            Data::Function(data) => Shape::Named(format!(
                "<{} {}>",
                settings.keyword(KeywordRole::Function),
                data.name.as_deref().unwrap_or("anonymous")
            )),
            Data::Error(data) => Shape::Error {
                kind: data.kind.name(settings).to_string(),
                message: data.message.clone(),
            },
        }
    }

    /// Human-readable form. Strings render raw.
    pub fn display(&self, cx: &mut dyn Invoke) -> Result<Rc<str>, FlowError> {
        if let Some(cached) = self.cached_display() {
            return Ok(cached);
        }
        let rendered: Rc<str> = ensure_sufficient_stack(|| self.render(cx))?.into();
        self.store_display(Rc::clone(&rendered));
        Ok(rendered)
    }

    /// Display form as it appears inside a container: strings are quoted
    pub fn nested_display(&self, cx: &mut dyn Invoke) -> Result<Rc<str>, FlowError> {
        match self.as_str() {
            Some(s) => {
                let q = self.settings().symbols().quotes.first().copied().unwrap_or('"');
                Ok(quote(&s, q).into())
            }
            None => self.display(cx),
        }
    }

    fn render(&self, cx: &mut dyn Invoke) -> Result<String, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Display, &[], cx)? {
            return Ok(result.display(cx)?.to_string());
        }
        let settings = Rc::clone(self.settings());
        let separator = format!("{} ", settings.argument_separator());
        Ok(match self.shape() {
            Shape::Null => settings.keyword(KeywordRole::Null).to_string(),
            Shape::Boolean(true) => settings.keyword(KeywordRole::True).to_string(),
            Shape::Boolean(false) => settings.keyword(KeywordRole::False).to_string(),
            Shape::Integer(n) => n.to_string(),
            Shape::Float(f) => format_float(f, settings.decimal_separator()),
            Shape::Str(s) => s.to_string(),
            Shape::List(items) => {
                let Some(_visit) = Visit::enter(self) else {
                    return Ok("[...]".to_string());
                };
                let mut parts = Vec::with_capacity(items.len());
                for item in &items {
                    parts.push(item.nested_display(cx)?.to_string());
                }
                format!("[{}]", parts.join(&separator))
            }
            Shape::Dict(entries) => {
                let Some(_visit) = Visit::enter(self) else {
                    return Ok("{...}".to_string());
                };
                let mut parts = Vec::with_capacity(entries.len());
                for (key, value) in &entries {
                    parts.push(format!(
                        "{}: {}",
                        key.nested_display(cx)?,
                        value.nested_display(cx)?
                    ));
                }
                format!("{{{}}}", parts.join(&separator))
            }
            Shape::Struct { module, fields } => {
                let Some(_visit) = Visit::enter(self) else {
                    return Ok("{...}".to_string());
                };
                let mut parts = Vec::new();
                for (key, value) in fields.dict_entries().unwrap_or_default() {
                    parts.push(format!("{} = {}", key.display(cx)?, value.nested_display(cx)?));
                }
                format!(
                    "{}{{{}}}",
                    module.module_name().as_deref().unwrap_or(""),
                    parts.join(&separator)
                )
            }
            Shape::Named(text) => text,
            Shape::Error { kind, message } => format!("{}: {}", kind, message.display(cx)?),
        })
    }

    /// Structural form used for equality of aggregates
    pub fn interchange(&self, cx: &mut dyn Invoke) -> Result<Rc<Interchange>, FlowError> {
        if let Some(cached) = self.cached_interchange() {
            return Ok(cached);
        }
        let form = Rc::new(ensure_sufficient_stack(|| self.build_interchange(cx))?);
        self.store_interchange(Rc::clone(&form));
        Ok(form)
    }

    fn build_interchange(&self, cx: &mut dyn Invoke) -> Result<Interchange, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Interchange, &[], cx)? {
            return Ok((*result.interchange(cx)?).clone());
        }
        let settings = Rc::clone(self.settings());
        Ok(match self.shape() {
            Shape::Null => Interchange::Null,
            Shape::Boolean(b) => Interchange::Integer(b as i64),
            Shape::Integer(n) => Interchange::Integer(n),
            Shape::Float(f) => Interchange::Float(f),
            Shape::Str(s) => Interchange::Str(s.to_string()),
            Shape::Named(text) => Interchange::Str(text),
            Shape::List(items) => {
                let _visit = Visit::enter(self).ok_or_else(self_reference)?;
                let mut forms = Vec::with_capacity(items.len());
                for item in &items {
                    forms.push((*item.interchange(cx)?).clone());
                }
                Interchange::List(forms)
            }
            Shape::Dict(entries) => {
                let _visit = Visit::enter(self).ok_or_else(self_reference)?;
                let mut forms = Vec::with_capacity(entries.len());
                for (key, value) in &entries {
                    forms.push((key.display(cx)?.to_string(), (*value.interchange(cx)?).clone()));
                }
                Interchange::Map(forms)
            }
            Shape::Struct { fields, .. } => {
                let _visit = Visit::enter(self).ok_or_else(self_reference)?;
                (*fields.interchange(cx)?).clone()
            }
            Shape::Error { kind, message } => Interchange::Map(vec![
                (
                    settings.error_type_attribute().to_string(),
                    Interchange::Str(kind),
                ),
                (
                    settings.error_message_attribute().to_string(),
                    (*message.interchange(cx)?).clone(),
                ),
            ]),
        })
    }

    /// Host-neutral form for hand-off to JSON encoders
    pub fn transfer(&self, cx: &mut dyn Invoke) -> Result<Rc<serde_json::Value>, FlowError> {
        if let Some(cached) = self.cached_transfer() {
            return Ok(cached);
        }
        let form = Rc::new(ensure_sufficient_stack(|| self.build_transfer(cx))?);
        self.store_transfer(Rc::clone(&form));
        Ok(form)
    }

    fn build_transfer(&self, cx: &mut dyn Invoke) -> Result<serde_json::Value, FlowError> {
        use serde_json::Value as Json;

        if let Some(result) = self.call_override(MethodRole::Transfer, &[], cx)? {
            return Ok((*result.transfer(cx)?).clone());
        }
        let settings = Rc::clone(self.settings());
        Ok(match self.shape() {
            Shape::Null => Json::Null,
            Shape::Boolean(b) => Json::Bool(b),
            Shape::Integer(n) => Json::from(n),
            Shape::Float(f) => serde_json::Number::from_f64(f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Shape::Str(s) => Json::String(s.to_string()),
            Shape::Named(text) => Json::String(text),
            Shape::List(items) => {
                let _visit = Visit::enter(self).ok_or_else(self_reference)?;
                let mut forms = Vec::with_capacity(items.len());
                for item in &items {
                    forms.push((*item.transfer(cx)?).clone());
                }
                Json::Array(forms)
            }
            Shape::Dict(entries) => {
                let _visit = Visit::enter(self).ok_or_else(self_reference)?;
                let mut map = serde_json::Map::new();
                for (key, value) in &entries {
                    map.insert(key.display(cx)?.to_string(), (*value.transfer(cx)?).clone());
                }
                Json::Object(map)
            }
            Shape::Struct { fields, .. } => {
                let _visit = Visit::enter(self).ok_or_else(self_reference)?;
                (*fields.transfer(cx)?).clone()
            }
            Shape::Error { kind, message } => {
                let mut map = serde_json::Map::new();
                map.insert(settings.error_type_attribute().to_string(), Json::String(kind));
                map.insert(
                    settings.error_message_attribute().to_string(),
                    (*message.transfer(cx)?).clone(),
                );
                Json::Object(map)
            }
        })
    }

    /// Transfer form without a running interpreter
    pub fn to_json(&self) -> Result<serde_json::Value, FlowError> {
        Ok((*self.transfer(&mut super::Detached)?).clone())
    }

    /// Canonical text identifying a dict key. Numbers equal across kinds
    /// share one key string.
    pub fn key_string(&self, cx: &mut dyn Invoke) -> Result<Rc<str>, FlowError> {
        if let Some(n) = self.number() {
            let f = n.as_f64();
            return Ok(match n {
                Number::Int(i) => i.to_string().into(),
                Number::Float(_) if f.fract() == 0.0 && f.abs() < 1e15 => {
                    (f as i64).to_string().into()
                }
                Number::Float(_) => f.to_string().into(),
            });
        }
        match self.kind() {
            ValueKind::List | ValueKind::Dict => Err(FlowError::type_error(format!(
                "unhashable type: '{}'",
                self.type_name()
            ))),
            ValueKind::Struct if self.find_override(MethodRole::Hash).is_some() => {
                Ok(format!("#{}", self.hash_value(cx)?).into())
            }
            ValueKind::Struct | ValueKind::Function | ValueKind::Module => {
                Ok(format!("@{}", self.id()).into())
            }
            _ => self.nested_display(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Detached;
    use flow_config::{Settings, SettingsLoader};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn heap() -> Rc<Heap> {
        Heap::new(Rc::new(Settings::default()))
    }

    #[test]
    fn test_scalar_display() {
        let heap = heap();
        let cx = &mut Detached;
        assert_eq!(&*heap.null().display(cx).unwrap(), "null");
        assert_eq!(&*heap.boolean(true).display(cx).unwrap(), "true");
        assert_eq!(&*heap.float(2.0).unwrap().display(cx).unwrap(), "2.0");
        assert_eq!(&*heap.float(0.25).unwrap().display(cx).unwrap(), "0.25");
        assert_eq!(&*heap.string("hi").display(cx).unwrap(), "hi");
    }

    #[test]
    fn test_nested_strings_are_quoted() {
        let heap = heap();
        let list = heap.list(vec![heap.string("a\"b"), heap.integer(1).unwrap()]);
        assert_eq!(&*list.display(&mut Detached).unwrap(), "[\"a\\\"b\", 1]");
    }

    #[test]
    fn test_translated_display() {
        let settings = SettingsLoader::new()
            .without_env()
            .load_from_str(
                "[keywords]\ntrue = \"vrai\"\n[symbols]\ndecimal_separator = \",\"\nargument_separator = \";\"\n",
            )
            .unwrap();
        let heap = Heap::new(Rc::new(settings));
        let list = heap.list(vec![heap.boolean(true), heap.float(1.5).unwrap()]);
        assert_eq!(&*list.display(&mut Detached).unwrap(), "[vrai; 1,5]");
    }

    #[test]
    fn test_display_is_cached() {
        let heap = heap();
        let list = heap.list(vec![heap.integer(1).unwrap()]);
        let first = list.display(&mut Detached).unwrap();
        let second = list.display(&mut Detached).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_self_containing_list() {
        let heap = heap();
        let list = heap.list(vec![]);
        list.push_item(list.clone()).unwrap();
        assert_eq!(&*list.display(&mut Detached).unwrap(), "[[...]]");
        assert!(list.transfer(&mut Detached).is_err());
    }

    #[test]
    fn test_transfer_and_interchange() {
        let heap = heap();
        let dict = heap
            .dict(
                vec![
                    (heap.string("flag"), heap.boolean(false)),
                    (heap.integer(2).unwrap(), heap.list(vec![heap.null()])),
                ],
                &mut Detached,
            )
            .unwrap();
        assert_eq!(dict.to_json().unwrap(), json!({"flag": false, "2": [null]}));
        assert_eq!(
            *dict.interchange(&mut Detached).unwrap(),
            Interchange::Map(vec![
                ("flag".into(), Interchange::Integer(0)),
                ("2".into(), Interchange::List(vec![Interchange::Null])),
            ])
        );
    }

    #[test]
    fn test_key_strings() {
        let heap = heap();
        let cx = &mut Detached;
        assert_eq!(&*heap.integer(1).unwrap().key_string(cx).unwrap(), "1");
        assert_eq!(&*heap.float(1.0).unwrap().key_string(cx).unwrap(), "1");
        assert_eq!(&*heap.boolean(true).key_string(cx).unwrap(), "1");
        assert_eq!(&*heap.string("1").key_string(cx).unwrap(), "\"1\"");
        assert!(heap.list(vec![]).key_string(cx).is_err());
    }
}
