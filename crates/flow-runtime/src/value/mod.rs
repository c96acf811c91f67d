//! Runtime value model
//!
//! A [`Value`] is a shared handle to a cell holding one of a closed set of
//! kinds. Each cell carries a process-unique identity and lazily caches its
//! display, interchange and transfer forms. Aggregates record every
//! container they are stored in with the [`Heap`], and a mutation clears the
//! caches of the value and of each transitive container.
//!
//! Operations are split across submodules:
//! - `ops`: arithmetic, comparison, membership, container access
//! - `convert`: display, interchange and transfer forms
//! - `protocol`: struct overrides and the callback interface

mod convert;
mod error;
mod function;
mod heap;
pub(crate) mod number;
mod ops;
mod protocol;

pub use convert::Interchange;
pub use error::{ErrorKind, FlowError, Unwind};
pub use function::{
    bind_parameters, Arguments, CallArgs, FunctionBody, FunctionData, ModuleData, NativeFn, Param,
    StructData,
};
pub use heap::{Heap, MAX_SEQUENCE_LENGTH};
pub(crate) use heap::check_sequence_length;
pub use number::MAX_SAFE_INTEGER;
pub use protocol::{Detached, Invoke};

use crate::containers::{DynamicArray, OrderedTable};
use flow_config::Settings;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique value identity
pub type ValueId = u64;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// The kind tag of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    List,
    Dict,
    Struct,
    Module,
    Function,
    Error,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "Null",
            ValueKind::Boolean => "Boolean",
            ValueKind::Integer => "Integer",
            ValueKind::Float => "Float",
            ValueKind::String => "String",
            ValueKind::List => "List",
            ValueKind::Dict => "Dict",
            ValueKind::Struct => "Struct",
            ValueKind::Module => "Module",
            ValueKind::Function => "Function",
            ValueKind::Error => "Error",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload of an Error value
pub struct ErrorData {
    pub kind: ErrorKind,
    pub message: Value,
}

/// Cell contents
pub enum Data {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Str(Rc<str>),
    List(DynamicArray<Value>),
    Dict(OrderedTable<Value, Value>),
    Struct(StructData),
    Module(ModuleData),
    Function(FunctionData),
    Error(ErrorData),
}

impl Data {
    pub fn kind(&self) -> ValueKind {
        match self {
            Data::Null => ValueKind::Null,
            Data::Boolean(_) => ValueKind::Boolean,
            Data::Integer(_) => ValueKind::Integer,
            Data::Float(_) => ValueKind::Float,
            Data::Str(_) => ValueKind::String,
            Data::List(_) => ValueKind::List,
            Data::Dict(_) => ValueKind::Dict,
            Data::Struct(_) => ValueKind::Struct,
            Data::Module(_) => ValueKind::Module,
            Data::Function(_) => ValueKind::Function,
            Data::Error(_) => ValueKind::Error,
        }
    }

    /// Values held directly by this one
    fn children(&self) -> Vec<Value> {
        match self {
            Data::List(items) => items.iter().cloned().collect(),
            Data::Dict(table) => table
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect(),
            Data::Struct(data) => vec![data.fields.clone()],
            Data::Error(data) => vec![data.message.clone()],
            _ => Vec::new(),
        }
    }
}

pub(crate) struct ValueCell {
    id: ValueId,
    data: RefCell<Data>,
    doc: RefCell<Option<Rc<str>>>,
    heap: Rc<Heap>,
    display: RefCell<Option<Rc<str>>>,
    interchange: RefCell<Option<Rc<Interchange>>>,
    transfer: RefCell<Option<Rc<serde_json::Value>>>,
}

impl ValueCell {
    fn clear_caches(&self) {
        self.display.borrow_mut().take();
        self.interchange.borrow_mut().take();
        self.transfer.borrow_mut().take();
    }
}

impl Drop for ValueCell {
    fn drop(&mut self) {
        self.heap.forget(self.id);
    }
}

/// A shared handle to a runtime value
#[derive(Clone)]
pub struct Value(Rc<ValueCell>);

impl Value {
    /// Allocate a cell and register it as the container of its children
    pub fn new(data: Data, heap: &Rc<Heap>) -> Value {
        let children = data.children();
        let value = Value(Rc::new(ValueCell {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            data: RefCell::new(data),
            doc: RefCell::new(None),
            heap: Rc::clone(heap),
            display: RefCell::new(None),
            interchange: RefCell::new(None),
            transfer: RefCell::new(None),
        }));
        for child in &children {
            heap.link(child, &value);
        }
        value
    }

    pub fn id(&self) -> ValueId {
        self.0.id
    }

    pub fn kind(&self) -> ValueKind {
        self.0.data.borrow().kind()
    }

    /// Kind name for messages; structs report their module's name
    pub fn type_name(&self) -> String {
        match &*self.data() {
            Data::Struct(data) => data
                .module
                .module_name()
                .map(|name| name.to_string())
                .unwrap_or_else(|| ValueKind::Struct.name().to_string()),
            data => data.kind().name().to_string(),
        }
    }

    pub fn heap(&self) -> &Rc<Heap> {
        &self.0.heap
    }

    pub fn settings(&self) -> &Rc<Settings> {
        self.0.heap.settings()
    }

    pub fn data(&self) -> Ref<'_, Data> {
        self.0.data.borrow()
    }

    pub(crate) fn data_mut(&self) -> RefMut<'_, Data> {
        self.0.data.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn cell(&self) -> &Rc<ValueCell> {
        &self.0
    }

    pub(crate) fn from_cell(cell: Rc<ValueCell>) -> Value {
        Value(cell)
    }

    /// Replace the contents of this value in place
    pub fn reinitialize(&self, data: Data) {
        let children = data.children();
        *self.0.data.borrow_mut() = data;
        for child in &children {
            self.0.heap.link(child, self);
        }
        self.invalidate();
    }

    /// Clear cached forms here and in every container holding this value
    pub fn invalidate(&self) {
        self.0.heap.invalidate(self);
    }

    pub(crate) fn clear_caches(&self) {
        self.0.clear_caches();
    }

    pub(crate) fn cached_display(&self) -> Option<Rc<str>> {
        self.0.display.borrow().clone()
    }

    pub(crate) fn store_display(&self, form: Rc<str>) {
        *self.0.display.borrow_mut() = Some(form);
    }

    pub(crate) fn cached_interchange(&self) -> Option<Rc<Interchange>> {
        self.0.interchange.borrow().clone()
    }

    pub(crate) fn store_interchange(&self, form: Rc<Interchange>) {
        *self.0.interchange.borrow_mut() = Some(form);
    }

    pub(crate) fn cached_transfer(&self) -> Option<Rc<serde_json::Value>> {
        self.0.transfer.borrow().clone()
    }

    pub(crate) fn store_transfer(&self, form: Rc<serde_json::Value>) {
        *self.0.transfer.borrow_mut() = Some(form);
    }

    /// Documentation attached to this instance
    pub fn doc(&self) -> Option<Rc<str>> {
        self.0.doc.borrow().clone()
    }

    pub fn set_doc(&self, doc: impl Into<Rc<str>>) {
        *self.0.doc.borrow_mut() = Some(doc.into());
    }

    pub fn is_null(&self) -> bool {
        matches!(&*self.data(), Data::Null)
    }

    pub fn is_function(&self) -> bool {
        matches!(&*self.data(), Data::Function(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &*self.data() {
            Data::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match &*self.data() {
            Data::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match &*self.data() {
            Data::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<Rc<str>> {
        match &*self.data() {
            Data::Str(s) => Some(Rc::clone(s)),
            _ => None,
        }
    }

    /// Numeric view; booleans count as 1 and 0
    pub(crate) fn number(&self) -> Option<number::Number> {
        match &*self.data() {
            Data::Boolean(b) => Some(number::Number::Int(*b as i64)),
            Data::Integer(n) => Some(number::Number::Int(*n)),
            Data::Float(f) => Some(number::Number::Float(*f)),
            _ => None,
        }
    }

    /// Snapshot of list items
    pub fn list_items(&self) -> Option<Vec<Value>> {
        match &*self.data() {
            Data::List(items) => Some(items.iter().cloned().collect()),
            _ => None,
        }
    }

    /// Snapshot of dict entries in insertion order
    pub fn dict_entries(&self) -> Option<Vec<(Value, Value)>> {
        match &*self.data() {
            Data::Dict(table) => Some(
                table
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn module_name(&self) -> Option<Rc<str>> {
        match &*self.data() {
            Data::Module(data) => data.name.clone(),
            _ => None,
        }
    }

    pub fn function_name(&self) -> Option<Rc<str>> {
        match &*self.data() {
            Data::Function(data) => data.name.clone(),
            _ => None,
        }
    }

    /// Give an anonymous function or module the name it was bound to
    pub fn name_if_anonymous(&self, name: &str) {
        let named = match &mut *self.data_mut() {
            Data::Function(data) if data.name.is_none() => {
                data.name = Some(name.into());
                true
            }
            Data::Module(data) if data.name.is_none() => {
                data.name = Some(name.into());
                true
            }
            _ => false,
        };
        if named {
            self.invalidate();
        }
    }

    /// Module attribute lookup, without struct fallbacks
    pub fn module_attribute(&self, name: &str) -> Option<Value> {
        match &*self.data() {
            Data::Module(data) => data.attributes.borrow().get_local(name),
            _ => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &*self.data() {
            Data::Error(data) => Some(data.kind.clone()),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.data() {
            Data::Null => write!(f, "Null"),
            Data::Boolean(b) => write!(f, "Boolean({})", b),
            Data::Integer(n) => write!(f, "Integer({})", n),
            Data::Float(x) => write!(f, "Float({})", x),
            Data::Str(s) => write!(f, "Str({:?})", s),
            Data::List(items) => write!(f, "List(#{}, len {})", self.id(), items.len()),
            Data::Dict(table) => write!(f, "Dict(#{}, len {})", self.id(), table.len()),
            Data::Struct(data) => write!(f, "Struct(#{}, {:?})", self.id(), data.module.module_name()),
            Data::Module(data) => write!(f, "Module(#{}, {:?})", self.id(), data.name),
            Data::Function(data) => write!(f, "Function(#{}, {:?})", self.id(), data.name),
            Data::Error(data) => write!(f, "Error({:?}, {:?})", data.kind, data.message),
        }
    }
}
