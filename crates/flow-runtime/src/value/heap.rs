//! Value allocation and the container graph
//!
//! The heap records, for every value stored inside an aggregate, which
//! containers hold it. Edges are weak: a container that is dropped simply
//! stops receiving invalidations.

use super::{number, Data, ErrorData, ErrorKind, FlowError, Interchange, Value, ValueCell, ValueId};
use crate::containers::{DynamicArray, OrderedTable};
use crate::value::Invoke;
use flow_config::Settings;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

/// Most elements (bytes for strings) one operation may build
pub const MAX_SEQUENCE_LENGTH: usize = 1 << 24;

/// Reject a sequence of `len` elements before it is allocated. `None`
/// means the length computation itself overflowed.
pub(crate) fn check_sequence_length(len: Option<usize>, what: &str) -> Result<usize, FlowError> {
    match len {
        Some(len) if len <= MAX_SEQUENCE_LENGTH => Ok(len),
        _ => Err(FlowError::number_too_big(format!(
            "{} would exceed {} elements",
            what, MAX_SEQUENCE_LENGTH
        ))),
    }
}

pub struct Heap {
    settings: Rc<Settings>,
    owners: RefCell<HashMap<ValueId, Vec<Weak<ValueCell>>>>,
    /// Values dropped while `owners` was borrowed, removed on next access
    retired: RefCell<Vec<ValueId>>,
    rendering: RefCell<HashSet<ValueId>>,
}

impl Heap {
    pub fn new(settings: Rc<Settings>) -> Rc<Heap> {
        Rc::new(Heap {
            settings,
            owners: RefCell::new(HashMap::new()),
            retired: RefCell::new(Vec::new()),
            rendering: RefCell::new(HashSet::new()),
        })
    }

    pub fn settings(&self) -> &Rc<Settings> {
        &self.settings
    }

    /// Record that `container` holds `child`
    pub(crate) fn link(&self, child: &Value, container: &Value) {
        if child.ptr_eq(container) {
            return;
        }
        let mut owners = self.owners.borrow_mut();
        self.sweep_retired(&mut owners);
        let edges = owners.entry(child.id()).or_default();
        edges.retain(|edge| edge.strong_count() > 0);
        let cell = Rc::downgrade(container.cell());
        if !edges.iter().any(|edge| Weak::ptr_eq(edge, &cell)) {
            edges.push(cell);
        }
    }

    /// Number of live containers recorded for a value
    pub fn container_count(&self, value: &Value) -> usize {
        self.owners
            .borrow()
            .get(&value.id())
            .map(|edges| edges.iter().filter(|edge| edge.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Clear cached forms of `start` and everything that transitively
    /// contains it
    pub(crate) fn invalidate(&self, start: &Value) {
        let mut visited = HashSet::new();
        let mut pending = vec![start.clone()];
        while let Some(value) = pending.pop() {
            if !visited.insert(value.id()) {
                continue;
            }
            value.clear_caches();
            let containers: Vec<Value> = {
                let owners = self.owners.borrow();
                owners
                    .get(&value.id())
                    .map(|edges| {
                        edges
                            .iter()
                            .filter_map(Weak::upgrade)
                            .map(Value::from_cell)
                            .collect()
                    })
                    .unwrap_or_default()
            };
            pending.extend(containers);
        }
    }

    pub(crate) fn forget(&self, id: ValueId) {
        match self.owners.try_borrow_mut() {
            Ok(mut owners) => {
                owners.remove(&id);
                self.sweep_retired(&mut owners);
            }
            Err(_) => self.retired.borrow_mut().push(id),
        }
    }

    fn sweep_retired(&self, owners: &mut HashMap<ValueId, Vec<Weak<ValueCell>>>) {
        for id in self.retired.borrow_mut().drain(..) {
            owners.remove(&id);
        }
    }

    /// Mark a value as being rendered. Returns false when it already is,
    /// which means the value contains itself.
    pub(crate) fn enter(&self, id: ValueId) -> bool {
        self.rendering.borrow_mut().insert(id)
    }

    pub(crate) fn leave(&self, id: ValueId) {
        self.rendering.borrow_mut().remove(&id);
    }

    pub fn null(self: &Rc<Self>) -> Value {
        Value::new(Data::Null, self)
    }

    pub fn boolean(self: &Rc<Self>, b: bool) -> Value {
        Value::new(Data::Boolean(b), self)
    }

    pub fn integer(self: &Rc<Self>, n: i64) -> Result<Value, FlowError> {
        Ok(Value::new(Data::Integer(number::check_integer(n)?), self))
    }

    pub fn float(self: &Rc<Self>, f: f64) -> Result<Value, FlowError> {
        Ok(Value::new(Data::Float(number::check_float(f)?), self))
    }

    pub(crate) fn number(self: &Rc<Self>, n: number::Number) -> Result<Value, FlowError> {
        match n {
            number::Number::Int(i) => self.integer(i),
            number::Number::Float(f) => self.float(f),
        }
    }

    /// Integer from a length or count
    pub(crate) fn count(self: &Rc<Self>, n: usize) -> Result<Value, FlowError> {
        let n = i64::try_from(n).map_err(|_| FlowError::number_too_big("count too large"))?;
        self.integer(n)
    }

    pub fn string(self: &Rc<Self>, s: impl Into<Rc<str>>) -> Value {
        Value::new(Data::Str(s.into()), self)
    }

    pub fn list(self: &Rc<Self>, items: Vec<Value>) -> Value {
        let items: DynamicArray<Value> = items.into_iter().collect();
        Value::new(Data::List(items), self)
    }

    /// Build a dict; later duplicates of a key overwrite earlier ones
    pub fn dict(
        self: &Rc<Self>,
        entries: Vec<(Value, Value)>,
        cx: &mut dyn Invoke,
    ) -> Result<Value, FlowError> {
        let mut table = OrderedTable::new();
        for (key, value) in entries {
            let hash = key.hash_value(cx)?;
            let key_string = key.key_string(cx)?;
            table.insert(key, hash, key_string, value);
        }
        Ok(Value::new(Data::Dict(table), self))
    }

    pub fn error(self: &Rc<Self>, kind: ErrorKind, message: Value) -> Value {
        Value::new(Data::Error(ErrorData { kind, message }), self)
    }

    /// The Error value carried by a raised error
    pub fn error_value(self: &Rc<Self>, error: &FlowError) -> Value {
        let message = match &error.payload {
            Some(payload) => payload.clone(),
            None => self.string(error.message.as_str()),
        };
        self.error(error.kind.clone(), message)
    }

    pub fn from_interchange(
        self: &Rc<Self>,
        form: &Interchange,
        cx: &mut dyn Invoke,
    ) -> Result<Value, FlowError> {
        Ok(match form {
            Interchange::Null => self.null(),
            Interchange::Integer(n) => self.integer(*n)?,
            Interchange::Float(f) => self.float(*f)?,
            Interchange::Str(s) => self.string(s.as_str()),
            Interchange::List(items) => {
                let items = items
                    .iter()
                    .map(|item| self.from_interchange(item, cx))
                    .collect::<Result<Vec<_>, _>>()?;
                self.list(items)
            }
            Interchange::Map(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    pairs.push((self.string(key.as_str()), self.from_interchange(value, cx)?));
                }
                self.dict(pairs, cx)?
            }
        })
    }
}
