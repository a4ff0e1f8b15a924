//! Argument and field values, both as declared on a descriptor (`ValueSpec`)
//! and as handed to constructors and setters once resolved (`Value`).

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ArgError;

/// A shared handle to a managed bean instance.
///
/// Cloning a `Bean` is cheap; clones point at the same instance.
#[derive(Clone)]
pub struct Bean {
  inner: Arc<dyn Any + Send + Sync>,
  type_name: &'static str,
}

impl Bean {
  /// Wraps an owned value into a new bean handle.
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self::from_arc(Arc::new(value))
  }

  /// Wraps an already shared value without copying it.
  pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
    Self {
      inner: value,
      type_name: std::any::type_name::<T>(),
    }
  }

  pub(crate) fn from_box(value: Box<dyn Any + Send + Sync>, type_name: &'static str) -> Self {
    Self {
      inner: Arc::from(value),
      type_name,
    }
  }

  /// Returns the instance as an `Arc<T>`, or `None` if it is not a `T`.
  pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.inner.clone().downcast::<T>().ok()
  }

  pub fn is<T: Any>(&self) -> bool {
    self.concrete_type_id() == TypeId::of::<T>()
  }

  /// The `TypeId` of the concrete instance, not of the handle.
  pub fn concrete_type_id(&self) -> TypeId {
    let any: &(dyn Any + Send + Sync) = &*self.inner;
    any.type_id()
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub(crate) fn as_any(&self) -> &(dyn Any + Send + Sync) {
    &*self.inner
  }

  /// True when both handles point at the same instance.
  pub fn ptr_eq(a: &Bean, b: &Bean) -> bool {
    Arc::ptr_eq(&a.inner, &b.inner)
  }
}

impl fmt::Debug for Bean {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Bean({} @ {:p})", self.type_name, Arc::as_ptr(&self.inner))
  }
}

/// Placeholder meaning "resolve the bean with this id first".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
  target_id: String,
}

impl Reference {
  pub fn new(target_id: impl Into<String>) -> Self {
    Self {
      target_id: target_id.into(),
    }
  }

  pub fn target_id(&self) -> &str {
    &self.target_id
  }
}

/// A resolved value, as passed to constructors, factory methods and setters.
#[derive(Debug, Clone)]
pub enum Value {
  Str(String),
  Int(i64),
  Float(f64),
  Bool(bool),
  Bean(Bean),
  List(Vec<Value>),
  Map(BTreeMap<String, Value>),
  Properties(BTreeMap<String, String>),
}

impl Value {
  /// The runtime kind of this value, used for constructor matching.
  pub fn param(&self) -> Param {
    match self {
      Value::Str(_) => Param::Str,
      Value::Int(_) => Param::Int,
      Value::Float(_) => Param::Float,
      Value::Bool(_) => Param::Bool,
      Value::Bean(bean) => Param::Bean {
        type_id: bean.concrete_type_id(),
        type_name: bean.type_name(),
      },
      Value::List(_) => Param::List,
      Value::Map(_) => Param::Map,
      Value::Properties(_) => Param::Properties,
    }
  }

  fn wrong_kind(&self, expected: &str) -> ArgError {
    ArgError::WrongKind {
      expected: expected.to_owned(),
      found: self.param().to_string(),
    }
  }

  pub fn as_str(&self) -> Result<&str, ArgError> {
    match self {
      Value::Str(s) => Ok(s),
      other => Err(other.wrong_kind("str")),
    }
  }

  pub fn as_int(&self) -> Result<i64, ArgError> {
    match self {
      Value::Int(i) => Ok(*i),
      other => Err(other.wrong_kind("int")),
    }
  }

  pub fn as_float(&self) -> Result<f64, ArgError> {
    match self {
      Value::Float(x) => Ok(*x),
      Value::Int(i) => Ok(*i as f64),
      other => Err(other.wrong_kind("float")),
    }
  }

  pub fn as_bool(&self) -> Result<bool, ArgError> {
    match self {
      Value::Bool(b) => Ok(*b),
      other => Err(other.wrong_kind("bool")),
    }
  }

  pub fn into_string(self) -> Result<String, ArgError> {
    match self {
      Value::Str(s) => Ok(s),
      other => Err(other.wrong_kind("str")),
    }
  }

  /// Downcasts a `Value::Bean` to the concrete type `T`.
  pub fn to_bean<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ArgError> {
    match self {
      Value::Bean(bean) => bean
        .downcast::<T>()
        .ok_or_else(|| self.wrong_kind(std::any::type_name::<T>())),
      other => Err(other.wrong_kind(std::any::type_name::<T>())),
    }
  }

  pub fn into_list(self) -> Result<Vec<Value>, ArgError> {
    match self {
      Value::List(items) => Ok(items),
      other => Err(other.wrong_kind("list")),
    }
  }

  /// Converts a list of beans into typed handles, preserving order.
  pub fn to_beans<T: Any + Send + Sync>(&self) -> Result<Vec<Arc<T>>, ArgError> {
    match self {
      Value::List(items) => items.iter().map(Value::to_bean::<T>).collect(),
      other => Err(other.wrong_kind("list")),
    }
  }

  pub fn into_map(self) -> Result<BTreeMap<String, Value>, ArgError> {
    match self {
      Value::Map(map) => Ok(map),
      other => Err(other.wrong_kind("map")),
    }
  }

  pub fn into_properties(self) -> Result<BTreeMap<String, String>, ArgError> {
    match self {
      Value::Properties(props) => Ok(props),
      other => Err(other.wrong_kind("properties")),
    }
  }
}

impl From<&str> for Value {
  fn from(value: &str) -> Self {
    Value::Str(value.to_owned())
  }
}

impl From<String> for Value {
  fn from(value: String) -> Self {
    Value::Str(value)
  }
}

impl From<i64> for Value {
  fn from(value: i64) -> Self {
    Value::Int(value)
  }
}

impl From<f64> for Value {
  fn from(value: f64) -> Self {
    Value::Float(value)
  }
}

impl From<bool> for Value {
  fn from(value: bool) -> Self {
    Value::Bool(value)
  }
}

impl From<Bean> for Value {
  fn from(value: Bean) -> Self {
    Value::Bean(value)
  }
}

/// A declared, not yet resolved, argument or field value.
#[derive(Debug, Clone)]
pub enum ValueSpec {
  /// Passed through unchanged.
  Literal(Value),
  /// Replaced by the referenced bean.
  Ref(Reference),
  /// Resolved element by element, order preserved.
  List(Vec<ValueSpec>),
  /// Resolved value by value; keys are kept as is.
  Map(BTreeMap<String, ValueSpec>),
  Properties(BTreeMap<String, String>),
}

impl ValueSpec {
  pub fn literal(value: impl Into<Value>) -> Self {
    ValueSpec::Literal(value.into())
  }

  pub fn reference(target_id: impl Into<String>) -> Self {
    ValueSpec::Ref(Reference::new(target_id))
  }

  /// A list of references, the common shape for collection injection.
  pub fn references<I, S>(target_ids: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    ValueSpec::List(target_ids.into_iter().map(ValueSpec::reference).collect())
  }

  pub fn list(items: impl IntoIterator<Item = ValueSpec>) -> Self {
    ValueSpec::List(items.into_iter().collect())
  }

  pub fn map<I, K>(entries: I) -> Self
  where
    I: IntoIterator<Item = (K, ValueSpec)>,
    K: Into<String>,
  {
    ValueSpec::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
  }

  pub fn properties<I, K, V>(entries: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    ValueSpec::Properties(
      entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect(),
    )
  }
}

impl From<Reference> for ValueSpec {
  fn from(value: Reference) -> Self {
    ValueSpec::Ref(value)
  }
}

impl From<Value> for ValueSpec {
  fn from(value: Value) -> Self {
    ValueSpec::Literal(value)
  }
}

impl From<&str> for ValueSpec {
  fn from(value: &str) -> Self {
    ValueSpec::literal(value)
  }
}

impl From<String> for ValueSpec {
  fn from(value: String) -> Self {
    ValueSpec::literal(value)
  }
}

impl From<i64> for ValueSpec {
  fn from(value: i64) -> Self {
    ValueSpec::literal(value)
  }
}

impl From<bool> for ValueSpec {
  fn from(value: bool) -> Self {
    ValueSpec::literal(value)
  }
}

/// The declared kind of a constructor or method parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
  Str,
  Int,
  Float,
  Bool,
  Bean {
    type_id: TypeId,
    type_name: &'static str,
  },
  List,
  Map,
  Properties,
  /// Accepts a value of any kind.
  Any,
}

impl Param {
  /// A parameter accepting a bean of concrete type `T`.
  pub fn bean<T: Any>() -> Self {
    Param::Bean {
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
    }
  }

  /// Whether a value of kind `arg` may be passed to this parameter.
  pub fn accepts(&self, arg: &Param) -> bool {
    match (self, arg) {
      (Param::Any, _) => true,
      (Param::Float, Param::Int) => true,
      (Param::Bean { type_id: want, .. }, Param::Bean { type_id: got, .. }) => want == got,
      (want, got) => want == got,
    }
  }
}

impl fmt::Display for Param {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Param::Str => f.write_str("str"),
      Param::Int => f.write_str("int"),
      Param::Float => f.write_str("float"),
      Param::Bool => f.write_str("bool"),
      Param::Bean { type_name, .. } => f.write_str(type_name),
      Param::List => f.write_str("list"),
      Param::Map => f.write_str("map"),
      Param::Properties => f.write_str("properties"),
      Param::Any => f.write_str("any"),
    }
  }
}
