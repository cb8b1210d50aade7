//! Values produced by evaluating units, and the namespaces that carry
//! a unit's exports to its importers.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A value produced by a unit body
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value
    #[default]
    Undefined,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// Immutable string
    Str(Rc<str>),
    /// Namespace of another unit
    Namespace(Namespace),
}

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Name of the value's type, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Namespace(_) => "namespace",
        }
    }

    /// Get the integer payload, if any
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the string payload, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the namespace payload, if any
    pub fn as_namespace(&self) -> Option<&Namespace> {
        match self {
            Value::Namespace(ns) => Some(ns),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Namespace(a), Value::Namespace(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Namespace(ns) => write!(f, "[namespace {}]", ns.url()),
        }
    }
}

/// State of a single export binding
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// The namespace has no export with this name
    Missing,
    /// Declared, but the owning unit has not initialized it yet
    Uninitialized,
    /// Initialized
    Ready(Value),
}

#[derive(Default)]
struct Exports {
    url: String,
    names: Vec<String>,
    slots: FxHashMap<String, Option<Value>>,
}

/// Live table of a unit's export bindings
///
/// Cloning shares the table: an importer holding a clone sees every
/// initialization the owner performs later. Export names are fixed when the
/// namespace is created, so importers can bind to them before the owner runs.
#[derive(Clone, Default)]
pub struct Namespace {
    inner: Rc<RefCell<Exports>>,
}

impl Namespace {
    /// Create a namespace with the given export names, all uninitialized
    pub fn new<I, S>(url: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut exports = Exports {
            url: url.to_string(),
            ..Exports::default()
        };
        for name in names {
            let name = name.into();
            if exports.slots.insert(name.clone(), None).is_none() {
                exports.names.push(name);
            }
        }
        Self {
            inner: Rc::new(RefCell::new(exports)),
        }
    }

    /// URL of the owning unit
    pub fn url(&self) -> String {
        self.inner.borrow().url.clone()
    }

    /// Export names in declaration order
    pub fn names(&self) -> Vec<String> {
        self.inner.borrow().names.clone()
    }

    /// Whether `name` is an export of this namespace
    pub fn has(&self, name: &str) -> bool {
        self.inner.borrow().slots.contains_key(name)
    }

    /// Look up an export binding
    pub fn lookup(&self, name: &str) -> Binding {
        match self.inner.borrow().slots.get(name) {
            None => Binding::Missing,
            Some(None) => Binding::Uninitialized,
            Some(Some(value)) => Binding::Ready(value.clone()),
        }
    }

    /// Initialize an export
    ///
    /// Returns `false` if `name` is not an export of this namespace.
    pub fn initialize(&self, name: &str, value: Value) -> bool {
        match self.inner.borrow_mut().slots.get_mut(name) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    /// Whether two handles share the same table
    pub fn ptr_eq(&self, other: &Namespace) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

// Namespaces may reach themselves through their own bindings, so Debug
// only prints the owner and the export names.
impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exports = self.inner.borrow();
        f.debug_struct("Namespace")
            .field("url", &exports.url)
            .field("names", &exports.names)
            .finish()
    }
}
