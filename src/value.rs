//! Runtime values held by record fields.
//!
//! `Value` is the dynamic universe the matcher inspects. It is deliberately
//! small: the scalar kinds a record field usually carries, two container
//! shapes (ordered list, insertion-ordered dict), function values, and nested
//! record instances. Everything is `Eq + Hash` so values can key a `Dict`.
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use ordered_float::OrderedFloat;

// ------------------------------- Value ------------------------------------ //

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
    Bytes(Vec<u8>),
    DateTime(DateTime<Utc>),
    List(Vec<Value>),
    Dict(IndexMap<Value, Value>),
    Callable(Callable),
    Record(RecordValue),
}

impl Value {
    /// Runtime type name, as it appears in mismatch messages.
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Str(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::DateTime(_) => "DateTime",
            Value::List(_) => "List",
            Value::Dict(_) => "Dict",
            Value::Callable(_) => "Callable",
            Value::Record(r) => &r.type_name,
        }
    }

    pub fn bytes(b: impl Into<Vec<u8>>) -> Self { Value::Bytes(b.into()) }

    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn dict<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Dict(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn is_none(&self) -> bool { matches!(self, Value::None) }
}

// `IndexMap` has no `Hash`; containers hash their shape only, which keeps
// `a == b => hash(a) == hash(b)` without depending on entry order.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::None => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.hash(state),
            Value::Str(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::DateTime(t) => t.hash(state),
            Value::List(xs) => xs.hash(state),
            Value::Dict(m) => m.len().hash(state),
            Value::Callable(c) => c.hash(state),
            Value::Record(r) => {
                r.type_name.hash(state);
                r.fields.len().hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => {
                // keep a decimal point on integral floats so 3.0 never reads as an Int
                if x.0.is_finite() && x.0.fract() == 0.0 {
                    write!(f, "{:.1}", x.0)
                } else {
                    write!(f, "{}", x.0)
                }
            }
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "b\"{}\"", b.escape_ascii()),
            Value::DateTime(t) => f.write_str(&t.to_rfc3339()),
            Value::List(xs) => {
                f.write_str("[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{x}")?;
                }
                f.write_str("]")
            }
            Value::Dict(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Callable(c) => write!(f, "<callable {}>", c.name()),
            Value::Record(r) => write!(f, "{r}"),
        }
    }
}

// ----------------------------- Conversions -------------------------------- //

impl From<bool> for Value { fn from(b: bool) -> Self { Value::Bool(b) } }
impl From<i64> for Value { fn from(i: i64) -> Self { Value::Int(i) } }
impl From<i32> for Value { fn from(i: i32) -> Self { Value::Int(i64::from(i)) } }
impl From<u32> for Value { fn from(i: u32) -> Self { Value::Int(i64::from(i)) } }
impl From<f64> for Value { fn from(x: f64) -> Self { Value::Float(OrderedFloat(x)) } }
impl From<&str> for Value { fn from(s: &str) -> Self { Value::Str(s.to_string()) } }
impl From<String> for Value { fn from(s: String) -> Self { Value::Str(s) } }
impl From<DateTime<Utc>> for Value { fn from(t: DateTime<Utc>) -> Self { Value::DateTime(t) } }
impl From<Callable> for Value { fn from(c: Callable) -> Self { Value::Callable(c) } }
impl From<RecordValue> for Value { fn from(r: RecordValue) -> Self { Value::Record(r) } }
impl From<IndexMap<Value, Value>> for Value { fn from(m: IndexMap<Value, Value>) -> Self { Value::Dict(m) } }

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(xs: Vec<T>) -> Self { Value::list(xs) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(x: Option<T>) -> Self {
        match x {
            Some(x) => x.into(),
            None => Value::None,
        }
    }
}

// ------------------------------ Callable ---------------------------------- //

type CallableFn = dyn Fn(&[Value]) -> Value + Send + Sync;

/// A named function value. Identity is the shared function object: clones
/// compare equal, two separately built callables never do.
#[derive(Clone)]
pub struct Callable {
    name: Arc<str>,
    func: Arc<CallableFn>,
}

impl Callable {
    pub fn new<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self { name: name.into(), func: Arc::new(func) }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn call(&self, args: &[Value]) -> Value { (self.func)(args) }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callable").field(&self.name).finish()
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.func, &other.func) }
}

impl Eq for Callable {}

impl Hash for Callable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.func) as *const () as usize).hash(state);
    }
}

// ---------------------------- RecordValue --------------------------------- //

/// A nested record instance: a nominal type name plus fields in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordValue {
    pub type_name: String,
    pub fields: IndexMap<String, Value>,
}

impl RecordValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self { type_name: type_name.into(), fields: IndexMap::new() }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> { self.fields.get(name) }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.type_name)?;
        for (i, (k, v)) in self.fields.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            write!(f, "{k}: {v}")?;
        }
        if self.fields.is_empty() { f.write_str("}") } else { f.write_str(" }") }
    }
}

// ------------------------------- Tests ------------------------------------ //
