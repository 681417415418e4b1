//! Value Object Module
//!
//! A tagged, reference-counted handle over the five supported value kinds.
//!
//! ## Responsibilities
//! - Fix the kind of a value at creation
//! - Report an encoding hint for diagnostics
//! - Track how many key bindings hold the object
//! - Enforce type discipline through checked accessors
//!
//! ## Ownership Model
//! An `Object` is one owning reference. `retain()` hands out another,
//! `release()` consumes one. The reference count is the number of live
//! handles, so once every key binding has been released the payload is
//! returned to the last releaser and nothing can read it again.

mod containers;

pub use containers::{
    Container, HashValue, ListValue, SetValue, SortedSetValue, StringValue, COMPACT_MAX_ENTRIES,
    COMPACT_MAX_VALUE, EMBSTR_MAX_LEN, INTSET_MAX_ENTRIES,
};

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{NimbusError, Result};

/// Data type tag of a value, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    List,
    Set,
    SortedSet,
    Hash,
}

impl Kind {
    /// Name reported by TYPE
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::List => "list",
            Kind::Set => "set",
            Kind::SortedSet => "zset",
            Kind::Hash => "hash",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal representation hint. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Int,
    Embstr,
    Raw,
    Listpack,
    Quicklist,
    Intset,
    Hashtable,
    Skiplist,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Int => "int",
            Encoding::Embstr => "embstr",
            Encoding::Raw => "raw",
            Encoding::Listpack => "listpack",
            Encoding::Quicklist => "quicklist",
            Encoding::Intset => "intset",
            Encoding::Hashtable => "hashtable",
            Encoding::Skiplist => "skiplist",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a value object
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(StringValue),
    List(ListValue),
    Set(SetValue),
    SortedSet(SortedSetValue),
    Hash(HashValue),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::String(_) => Kind::String,
            Value::List(_) => Kind::List,
            Value::Set(_) => Kind::Set,
            Value::SortedSet(_) => Kind::SortedSet,
            Value::Hash(_) => Kind::Hash,
        }
    }

    fn container(&self) -> &dyn Container {
        match self {
            Value::String(v) => v,
            Value::List(v) => v,
            Value::Set(v) => v,
            Value::SortedSet(v) => v,
            Value::Hash(v) => v,
        }
    }

    /// Byte length for strings, cardinality for aggregates
    pub fn len(&self) -> usize {
        self.container().len()
    }

    pub fn is_empty(&self) -> bool {
        self.container().is_empty()
    }

    pub fn encoding(&self) -> Encoding {
        self.container().encoding()
    }
}

#[derive(Debug)]
struct ObjectInner {
    value: Value,
    encoding: Encoding,
}

/// Reference-counted handle to a typed value
#[derive(Debug)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

impl Object {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Wrap a payload; the new object starts with a reference count of 1
    pub fn new(value: Value) -> Self {
        let encoding = value.encoding();
        Self {
            inner: Arc::new(ObjectInner { value, encoding }),
        }
    }

    pub fn string(bytes: impl Into<Bytes>) -> Self {
        Self::new(Value::String(StringValue::new(bytes)))
    }

    pub fn list<B: Into<Bytes>>(items: impl IntoIterator<Item = B>) -> Self {
        Self::new(Value::List(items.into_iter().collect()))
    }

    pub fn set<B: Into<Bytes>>(members: impl IntoIterator<Item = B>) -> Self {
        Self::new(Value::Set(members.into_iter().collect()))
    }

    pub fn sorted_set<B: Into<Bytes>>(pairs: impl IntoIterator<Item = (B, f64)>) -> Self {
        Self::new(Value::SortedSet(SortedSetValue::from_pairs(pairs)))
    }

    pub fn hash<F: Into<Bytes>, V: Into<Bytes>>(fields: impl IntoIterator<Item = (F, V)>) -> Self {
        Self::new(Value::Hash(fields.into_iter().collect()))
    }

    // =========================================================================
    // Reference Counting
    // =========================================================================

    /// Take another owning reference (count + 1)
    pub fn retain(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Give up this reference (count - 1).
    ///
    /// Returns the payload when this was the last reference; the caller
    /// then owns it outright and no handle to it remains.
    pub fn release(self) -> Option<Value> {
        Arc::into_inner(self.inner).map(|inner| inner.value)
    }

    /// Number of live references to this object
    pub fn refcount(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether both handles refer to the same object
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn kind(&self) -> Kind {
        self.inner.value.kind()
    }

    pub fn encoding(&self) -> Encoding {
        self.inner.encoding
    }

    pub fn value(&self) -> &Value {
        &self.inner.value
    }

    pub fn len(&self) -> usize {
        self.inner.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.value.is_empty()
    }

    // =========================================================================
    // Typed Accessors
    // =========================================================================

    fn wrong_type(&self, expected: Kind) -> NimbusError {
        NimbusError::WrongType {
            expected,
            actual: self.kind(),
        }
    }

    pub fn as_string(&self) -> Result<&StringValue> {
        match &self.inner.value {
            Value::String(v) => Ok(v),
            _ => Err(self.wrong_type(Kind::String)),
        }
    }

    pub fn as_list(&self) -> Result<&ListValue> {
        match &self.inner.value {
            Value::List(v) => Ok(v),
            _ => Err(self.wrong_type(Kind::List)),
        }
    }

    pub fn as_set(&self) -> Result<&SetValue> {
        match &self.inner.value {
            Value::Set(v) => Ok(v),
            _ => Err(self.wrong_type(Kind::Set)),
        }
    }

    pub fn as_sorted_set(&self) -> Result<&SortedSetValue> {
        match &self.inner.value {
            Value::SortedSet(v) => Ok(v),
            _ => Err(self.wrong_type(Kind::SortedSet)),
        }
    }

    pub fn as_hash(&self) -> Result<&HashValue> {
        match &self.inner.value {
            Value::Hash(v) => Ok(v),
            _ => Err(self.wrong_type(Kind::Hash)),
        }
    }
}

/// Structural equality of payloads; objects of different kinds never compare equal
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.inner.value == other.inner.value
    }
}

impl From<Value> for Object {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}
