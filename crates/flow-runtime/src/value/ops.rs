//! Operator protocol
//!
//! Every operation first gives a struct's module the chance to override it,
//! then falls back to the per-kind behavior, and finally raises a Type
//! error naming the operand kinds.

use super::number;
use super::{check_sequence_length, Data, FlowError, Invoke, Value, ValueKind};
use flow_config::MethodRole;
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

fn unsupported(symbol: &str, left: &Value, right: &Value) -> FlowError {
    FlowError::type_error(format!(
        "unsupported operand kinds for {}: '{}' and '{}'",
        symbol,
        left.type_name(),
        right.type_name()
    ))
}

fn unsupported_unary(symbol: &str, operand: &Value) -> FlowError {
    FlowError::type_error(format!(
        "bad operand kind for unary {}: '{}'",
        symbol,
        operand.type_name()
    ))
}

/// Position of `index` in a sequence of `len`, counting negatives from the end
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

/// Repetition count for `*`; negative counts repeat nothing. The result
/// length is bounded before anything is allocated.
fn repeat_count(len: usize, times: i64, what: &str) -> Result<usize, FlowError> {
    let times = usize::try_from(times).unwrap_or(0);
    check_sequence_length(len.checked_mul(times), what)?;
    Ok(times)
}

impl Value {
    /// Integer index operand; booleans are not accepted
    fn index_operand(&self) -> Option<i64> {
        self.as_integer()
    }

    pub fn add(&self, other: &Value, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Add, &[other.clone()], cx)? {
            return Ok(result);
        }
        let heap = self.heap();
        if let (Some(a), Some(b)) = (self.number(), other.number()) {
            return heap.number(number::add(a, b)?);
        }
        if let Some(left) = self.as_str() {
            let right = match (other.as_str(), other.number()) {
                (Some(s), _) => s,
                (None, Some(_)) => other.display(cx)?,
                (None, None) => return Err(unsupported("+", self, other)),
            };
            return Ok(heap.string(format!("{}{}", left, right)));
        }
        if let (Some(mut left), Some(right)) = (self.list_items(), other.list_items()) {
            left.extend(right);
            return Ok(heap.list(left));
        }
        if let (Some(mut left), Some(right)) = (self.dict_entries(), other.dict_entries()) {
            left.extend(right);
            return heap.dict(left, cx);
        }
        Err(unsupported("+", self, other))
    }

    pub fn subtract(&self, other: &Value, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Subtract, &[other.clone()], cx)? {
            return Ok(result);
        }
        let heap = self.heap();
        if let (Some(a), Some(b)) = (self.number(), other.number()) {
            return heap.number(number::subtract(a, b)?);
        }
        if let (Some(left), Some(right)) = (self.as_str(), other.as_str()) {
            if right.is_empty() {
                return Ok(heap.string(left));
            }
            return Ok(heap.string(left.replace(&*right, "")));
        }
        if let Some(mut items) = self.list_items() {
            let index = other
                .index_operand()
                .ok_or_else(|| unsupported("-", self, other))?;
            let position = normalize_index(index, items.len())
                .ok_or_else(|| FlowError::index(format!("list index {} out of range", index)))?;
            items.remove(position);
            return Ok(heap.list(items));
        }
        if let Some(mut entries) = self.dict_entries() {
            let key = other.key_string(cx)?;
            let mut position = None;
            for (i, (k, _)) in entries.iter().enumerate() {
                if k.key_string(cx)? == key {
                    position = Some(i);
                    break;
                }
            }
            let position = position
                .ok_or_else(|| FlowError::key(format!("key {} not found", other.nested_display_lossy())))?;
            entries.remove(position);
            return heap.dict(entries, cx);
        }
        Err(unsupported("-", self, other))
    }

    pub fn multiply(&self, other: &Value, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Multiply, &[other.clone()], cx)? {
            return Ok(result);
        }
        let heap = self.heap();
        if let (Some(a), Some(b)) = (self.number(), other.number()) {
            return heap.number(number::multiply(a, b)?);
        }
        if let (Some(text), Some(times)) = (self.as_str(), other.as_integer()) {
            let times = repeat_count(text.len(), times, "repeated string")?;
            return Ok(heap.string(text.repeat(times)));
        }
        if let (Some(items), Some(times)) = (self.list_items(), other.as_integer()) {
            let times = repeat_count(items.len(), times, "repeated list")?;
            let mut repeated = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                repeated.extend(items.iter().cloned());
            }
            return Ok(heap.list(repeated));
        }
        Err(unsupported("*", self, other))
    }

    pub fn divide(&self, other: &Value, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Divide, &[other.clone()], cx)? {
            return Ok(result);
        }
        match (self.number(), other.number()) {
            (Some(a), Some(b)) => self.heap().number(number::divide(a, b)?),
            _ => Err(unsupported("/", self, other)),
        }
    }

    pub fn remainder(&self, other: &Value, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Remainder, &[other.clone()], cx)? {
            return Ok(result);
        }
        match (self.number(), other.number()) {
            (Some(a), Some(b)) => self.heap().number(number::remainder(a, b)?),
            _ => Err(unsupported("%", self, other)),
        }
    }

    pub fn power(&self, other: &Value, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Power, &[other.clone()], cx)? {
            return Ok(result);
        }
        match (self.number(), other.number()) {
            (Some(a), Some(b)) => self.heap().number(number::power(a, b)?),
            _ => Err(unsupported("^", self, other)),
        }
    }

    pub fn positive(&self, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Positive, &[], cx)? {
            return Ok(result);
        }
        match self.number() {
            Some(n) => self.heap().number(n),
            None => Err(unsupported_unary("+", self)),
        }
    }

    pub fn negative(&self, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Negative, &[], cx)? {
            return Ok(result);
        }
        match self.number() {
            Some(n) => self.heap().number(number::negate(n)),
            None => Err(unsupported_unary("-", self)),
        }
    }

    /// `item in self`
    pub fn contains(&self, item: &Value, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Contains, &[item.clone()], cx)? {
            return Ok(result);
        }
        let found = match self.kind() {
            ValueKind::String => match (self.as_str(), item.as_str()) {
                (Some(text), Some(needle)) => text.contains(&*needle),
                _ => return Err(unsupported("in", item, self)),
            },
            ValueKind::List => {
                let mut found = false;
                for candidate in self.list_items().unwrap_or_default() {
                    if candidate.is_equal(item, cx)? {
                        found = true;
                        break;
                    }
                }
                found
            }
            ValueKind::Dict => self.dict_lookup(item, cx)?.is_some(),
            ValueKind::Struct => match item.as_str() {
                Some(name) => self.field(&name).is_some(),
                None => false,
            },
            ValueKind::Module => match item.as_str() {
                Some(name) => self.module_attribute(&name).is_some(),
                None => false,
            },
            _ => return Err(unsupported("in", item, self)),
        };
        Ok(self.heap().boolean(found))
    }

    /// Structural equality without producing a value
    pub fn is_equal(&self, other: &Value, cx: &mut dyn Invoke) -> Result<bool, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Equals, &[other.clone()], cx)? {
            return result.truthy(cx);
        }
        if self.ptr_eq(other) {
            return Ok(true);
        }
        if let (Some(a), Some(b)) = (self.number(), other.number()) {
            return Ok(number::compare(a, b) == Ordering::Equal);
        }
        match (self.kind(), other.kind()) {
            (ValueKind::Null, ValueKind::Null) => Ok(true),
            (ValueKind::String, ValueKind::String) => Ok(self.as_str() == other.as_str()),
            (ValueKind::List, ValueKind::List) | (ValueKind::Dict, ValueKind::Dict) => {
                Ok(*self.interchange(cx)? == *other.interchange(cx)?)
            }
            (ValueKind::Error, ValueKind::Error) => {
                let (left, right) = match (&*self.data(), &*other.data()) {
                    (Data::Error(a), Data::Error(b)) if a.kind == b.kind => {
                        (a.message.clone(), b.message.clone())
                    }
                    _ => return Ok(false),
                };
                left.is_equal(&right, cx)
            }
            _ => Ok(false),
        }
    }

    pub fn equals(&self, other: &Value, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Equals, &[other.clone()], cx)? {
            return Ok(result);
        }
        Ok(self.heap().boolean(self.is_equal(other, cx)?))
    }

    pub fn not_equals(&self, other: &Value, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        if let Some(result) = self.call_override(MethodRole::NotEquals, &[other.clone()], cx)? {
            return Ok(result);
        }
        Ok(self.heap().boolean(!self.is_equal(other, cx)?))
    }

    fn ordering(&self, other: &Value, symbol: &str) -> Result<Ordering, FlowError> {
        if let (Some(a), Some(b)) = (self.number(), other.number()) {
            return Ok(number::compare(a, b));
        }
        if let (Some(a), Some(b)) = (self.as_str(), other.as_str()) {
            return Ok(a.cmp(&b));
        }
        Err(unsupported(symbol, self, other))
    }

    fn compare_with(
        &self,
        other: &Value,
        role: MethodRole,
        symbol: &str,
        accept: fn(Ordering) -> bool,
        cx: &mut dyn Invoke,
    ) -> Result<Value, FlowError> {
        if let Some(result) = self.call_override(role, &[other.clone()], cx)? {
            return Ok(result);
        }
        let ordering = self.ordering(other, symbol)?;
        Ok(self.heap().boolean(accept(ordering)))
    }

    pub fn less(&self, other: &Value, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        self.compare_with(other, MethodRole::Less, "<", Ordering::is_lt, cx)
    }

    pub fn less_equal(&self, other: &Value, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        self.compare_with(other, MethodRole::LessEqual, "<=", Ordering::is_le, cx)
    }

    pub fn greater(&self, other: &Value, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        self.compare_with(other, MethodRole::Greater, ">", Ordering::is_gt, cx)
    }

    pub fn greater_equal(&self, other: &Value, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        self.compare_with(other, MethodRole::GreaterEqual, ">=", Ordering::is_ge, cx)
    }

    /// Boolean coercion
    pub fn truthy(&self, cx: &mut dyn Invoke) -> Result<bool, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Boolean, &[], cx)? {
            if result.kind() == ValueKind::Struct {
                return Err(FlowError::type_error(format!(
                    "{} must not return a struct",
                    self.settings().special_method(MethodRole::Boolean)
                )));
            }
            return result.truthy(cx);
        }
        Ok(match &*self.data() {
            Data::Null => false,
            Data::Boolean(b) => *b,
            Data::Integer(n) => *n != 0,
            Data::Float(f) => *f != 0.0,
            Data::Str(s) => !s.is_empty(),
            Data::List(items) => !items.is_empty(),
            Data::Dict(table) => !table.is_empty(),
            _ => true,
        })
    }

    pub fn not(&self, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Not, &[], cx)? {
            return Ok(result);
        }
        Ok(self.heap().boolean(!self.truthy(cx)?))
    }

    fn dict_lookup(&self, key: &Value, cx: &mut dyn Invoke) -> Result<Option<Value>, FlowError> {
        let hash = key.hash_value(cx)?;
        let key_string = key.key_string(cx)?;
        Ok(match &*self.data() {
            Data::Dict(table) => table.search(&key_string, hash).map(|entry| entry.value.clone()),
            _ => None,
        })
    }

    /// Field of a struct
    pub fn field(&self, name: &str) -> Option<Value> {
        let fields = match &*self.data() {
            Data::Struct(data) => data.fields.clone(),
            _ => return None,
        };
        let found = match &*fields.data() {
            Data::Dict(table) => table
                .iter()
                .find(|(key, _)| key.as_str().as_deref() == Some(name))
                .map(|(_, value)| value.clone()),
            _ => None,
        };
        found
    }

    fn fields(&self) -> Option<Value> {
        match &*self.data() {
            Data::Struct(data) => Some(data.fields.clone()),
            _ => None,
        }
    }

    /// Display form for messages; falls back to the kind name when an
    /// override fails
    pub(crate) fn nested_display_lossy(&self) -> String {
        self.nested_display(&mut super::Detached)
            .map(|s| s.to_string())
            .unwrap_or_else(|_| self.type_name())
    }

    pub fn get_item(&self, index: &Value, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        if let Some(result) = self.call_override(MethodRole::GetItem, &[index.clone()], cx)? {
            return Ok(result);
        }
        match self.kind() {
            ValueKind::List => {
                let items = self.list_items().unwrap_or_default();
                let i = index.index_operand().ok_or_else(|| {
                    FlowError::type_error(format!(
                        "list indices must be integers, not '{}'",
                        index.type_name()
                    ))
                })?;
                normalize_index(i, items.len())
                    .map(|position| items[position].clone())
                    .ok_or_else(|| FlowError::index(format!("list index {} out of range", i)))
            }
            ValueKind::String => {
                let text = self.as_str().unwrap_or_default();
                let i = index.index_operand().ok_or_else(|| {
                    FlowError::type_error(format!(
                        "string indices must be integers, not '{}'",
                        index.type_name()
                    ))
                })?;
                let chars: Vec<char> = text.chars().collect();
                normalize_index(i, chars.len())
                    .map(|position| self.heap().string(chars[position].to_string()))
                    .ok_or_else(|| FlowError::index(format!("string index {} out of range", i)))
            }
            ValueKind::Dict => self.dict_lookup(index, cx)?.ok_or_else(|| {
                FlowError::key(format!("key {} not found", index.nested_display_lossy()))
            }),
            ValueKind::Struct => {
                let fields = self.fields().ok_or_else(|| unsupported("[]", self, index))?;
                fields.get_item(index, cx)
            }
            _ => Err(FlowError::type_error(format!(
                "'{}' is not subscriptable",
                self.type_name()
            ))),
        }
    }

    pub fn set_item(&self, index: &Value, value: &Value, cx: &mut dyn Invoke) -> Result<(), FlowError> {
        if self
            .call_override(MethodRole::SetItem, &[index.clone(), value.clone()], cx)?
            .is_some()
        {
            return Ok(());
        }
        match self.kind() {
            ValueKind::List => {
                let i = index.index_operand().ok_or_else(|| {
                    FlowError::type_error(format!(
                        "list indices must be integers, not '{}'",
                        index.type_name()
                    ))
                })?;
                let replaced = {
                    let mut data = self.data_mut();
                    let Data::List(items) = &mut *data else {
                        return Err(FlowError::type_error("expected a list"));
                    };
                    let position = normalize_index(i, items.len()).ok_or_else(|| {
                        FlowError::index(format!("list assignment index {} out of range", i))
                    })?;
                    items.insert_at(value.clone(), position, true)
                };
                drop(replaced);
                self.heap().link(value, self);
                self.invalidate();
                Ok(())
            }
            ValueKind::Dict => {
                let hash = index.hash_value(cx)?;
                let key_string = index.key_string(cx)?;
                let replaced = {
                    let mut data = self.data_mut();
                    let Data::Dict(table) = &mut *data else {
                        return Err(FlowError::type_error("expected a dict"));
                    };
                    table.insert(index.clone(), hash, key_string, value.clone())
                };
                drop(replaced);
                self.heap().link(index, self);
                self.heap().link(value, self);
                self.invalidate();
                Ok(())
            }
            ValueKind::Struct => {
                let name = index.as_str().ok_or_else(|| {
                    FlowError::type_error(format!(
                        "field names must be strings, not '{}'",
                        index.type_name()
                    ))
                })?;
                self.set_field(&name, value, cx)
            }
            _ => Err(FlowError::type_error(format!(
                "'{}' does not support item assignment",
                self.type_name()
            ))),
        }
    }

    /// Assign an existing struct field
    fn set_field(&self, name: &str, value: &Value, cx: &mut dyn Invoke) -> Result<(), FlowError> {
        let fields = self
            .fields()
            .ok_or_else(|| FlowError::attribute(format!("no field '{}'", name)))?;
        if self.field(name).is_none() {
            return Err(FlowError::attribute(format!(
                "'{}' has no field '{}'",
                self.type_name(),
                name
            )));
        }
        let key = self.heap().string(name);
        fields.set_item(&key, value, cx)
    }

    /// Append to a list
    pub fn push_item(&self, value: Value) -> Result<(), FlowError> {
        {
            let mut data = self.data_mut();
            let Data::List(items) = &mut *data else {
                return Err(FlowError::type_error(format!(
                    "cannot append to '{}'",
                    data.kind().name()
                )));
            };
            items.push(value.clone());
        }
        self.heap().link(&value, self);
        self.invalidate();
        Ok(())
    }

    pub fn get_attribute(&self, name: &str, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        match self.kind() {
            ValueKind::Struct => {
                if let Some(value) = self.field(name) {
                    return Ok(value);
                }
                let heap = self.heap();
                if let Some(result) =
                    self.call_override(MethodRole::GetAttribute, &[heap.string(name)], cx)?
                {
                    return Ok(result);
                }
                let module = match &*self.data() {
                    Data::Struct(data) => data.module.clone(),
                    _ => return Err(self.missing_attribute(name)),
                };
                module
                    .module_attribute(name)
                    .ok_or_else(|| self.missing_attribute(name))
            }
            ValueKind::Module => self
                .module_attribute(name)
                .ok_or_else(|| self.missing_attribute(name)),
            ValueKind::Error => {
                let settings = Rc::clone(self.settings());
                let (kind, message) = match &*self.data() {
                    Data::Error(data) => (data.kind.clone(), data.message.clone()),
                    _ => return Err(self.missing_attribute(name)),
                };
                if name == settings.error_type_attribute() {
                    Ok(self.heap().string(kind.name(&settings)))
                } else if name == settings.error_message_attribute() {
                    Ok(message)
                } else {
                    Err(self.missing_attribute(name))
                }
            }
            _ => Err(self.missing_attribute(name)),
        }
    }

    pub fn set_attribute(&self, name: &str, value: &Value, cx: &mut dyn Invoke) -> Result<(), FlowError> {
        match self.kind() {
            ValueKind::Struct => {
                if self.field(name).is_some() {
                    return self.set_field(name, value, cx);
                }
                let heap = self.heap();
                if self
                    .call_override(
                        MethodRole::SetAttribute,
                        &[heap.string(name), value.clone()],
                        cx,
                    )?
                    .is_some()
                {
                    return Ok(());
                }
                Err(self.missing_attribute(name))
            }
            ValueKind::Module => {
                let attributes = match &*self.data() {
                    Data::Module(data) => Rc::clone(&data.attributes),
                    _ => return Err(self.missing_attribute(name)),
                };
                attributes.borrow_mut().define(name, value.clone());
                Ok(())
            }
            _ => Err(FlowError::attribute(format!(
                "cannot set attribute '{}' on '{}'",
                name,
                self.type_name()
            ))),
        }
    }

    fn missing_attribute(&self, name: &str) -> FlowError {
        FlowError::attribute(format!("'{}' has no attribute '{}'", self.type_name(), name))
    }

    pub fn length(&self, cx: &mut dyn Invoke) -> Result<Value, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Length, &[], cx)? {
            return Ok(result);
        }
        let count = match &*self.data() {
            Data::Str(s) => s.chars().count(),
            Data::List(items) => items.len(),
            Data::Dict(table) => table.len(),
            Data::Module(data) => data.attributes.borrow().len(),
            _ => {
                return Err(FlowError::type_error(format!(
                    "'{}' has no length",
                    self.type_name()
                )))
            }
        };
        self.heap().count(count)
    }

    /// Hash consistent with equality for every hashable kind
    pub fn hash_value(&self, cx: &mut dyn Invoke) -> Result<u64, FlowError> {
        if let Some(result) = self.call_override(MethodRole::Hash, &[], cx)? {
            return result.as_integer().map(|n| n as u64).ok_or_else(|| {
                FlowError::type_error(format!(
                    "{} must return an integer",
                    self.settings().special_method(MethodRole::Hash)
                ))
            });
        }
        let mut hasher = DefaultHasher::new();
        match &*self.data() {
            Data::Null => 0u8.hash(&mut hasher),
            Data::Boolean(b) => (*b as i64).hash(&mut hasher),
            Data::Integer(n) => n.hash(&mut hasher),
            Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).hash(&mut hasher),
            Data::Float(f) => f.to_bits().hash(&mut hasher),
            Data::Str(s) => s.hash(&mut hasher),
            Data::List(_) | Data::Dict(_) => {
                return Err(FlowError::type_error(format!(
                    "unhashable type: '{}'",
                    self.type_name()
                )))
            }
            Data::Error(data) => data.kind.hash(&mut hasher),
            Data::Struct(_) | Data::Module(_) | Data::Function(_) => self.id().hash(&mut hasher),
        }
        Ok(hasher.finish())
    }
}
