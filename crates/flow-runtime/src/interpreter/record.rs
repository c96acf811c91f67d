//! Lexical scope records
//!
//! Records chain to their parent through shared ownership. A record is
//! locked while a module body evaluates inside it, so assignments made in
//! the module body stay in the module's own record.

use crate::containers::OrderedTable;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Shared handle to a record
pub type Scope = Rc<RefCell<Record>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Program,
    Call,
    Catch,
    Module,
}

pub struct Record {
    vars: OrderedTable<Rc<str>, Value>,
    parent: Option<Scope>,
    locked: bool,
    kind: RecordKind,
}

fn name_hash(name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    hasher.finish()
}

impl Record {
    pub fn new_scope(kind: RecordKind, parent: Option<Scope>) -> Scope {
        Rc::new(RefCell::new(Record {
            vars: OrderedTable::new(),
            parent,
            locked: false,
            kind,
        }))
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn parent(&self) -> Option<Scope> {
        self.parent.clone()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.vars
            .search(name, name_hash(name))
            .map(|entry| entry.value.clone())
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.vars.contains(name, name_hash(name))
    }

    /// Bind `name` in this record, replacing any earlier binding
    pub fn define(&mut self, name: &str, value: Value) -> Option<Value> {
        let key: Rc<str> = name.into();
        self.vars.insert(key.clone(), name_hash(name), key, value)
    }

    /// Bindings in definition order
    pub fn entries(&self) -> Vec<(Rc<str>, Value)> {
        self.vars
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Find `name` in `scope` or its ancestors
pub fn lookup(scope: &Scope, name: &str) -> Option<Value> {
    let mut current = Some(Rc::clone(scope));
    while let Some(record) = current {
        let record = record.borrow();
        if let Some(value) = record.get_local(name) {
            return Some(value);
        }
        current = record.parent();
    }
    None
}

/// Rebind `name` where it is already visible, or define it in `scope`.
/// The search does not cross a locked record.
pub fn assign(scope: &Scope, name: &str, value: Value) {
    let mut current = Some(Rc::clone(scope));
    while let Some(record) = current {
        if record.borrow().is_locked() {
            break;
        }
        if record.borrow().has_local(name) {
            record.borrow_mut().define(name, value);
            return;
        }
        current = record.borrow().parent();
    }
    scope.borrow_mut().define(name, value);
}
