//! Type handles: the constructor, factory, lifecycle and field tables that
//! stand in for run-time reflection.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{ArgError, BoxError};
use crate::value::{Param, Value};

pub(crate) type AnyBox = Box<dyn Any + Send + Sync>;

type CreateFn = Box<dyn Fn(&Args) -> Result<Product, BoxError> + Send + Sync>;
type InstanceCreateFn = Box<dyn Fn(&(dyn Any + Send + Sync), &Args) -> Result<Product, BoxError> + Send + Sync>;
type InitFn = Box<dyn Fn(&mut (dyn Any + Send + Sync)) -> Result<(), BoxError> + Send + Sync>;
type DestroyFn = Box<dyn Fn(&(dyn Any + Send + Sync)) -> Result<(), BoxError> + Send + Sync>;
type SetterFn = Box<dyn Fn(&mut (dyn Any + Send + Sync), Value) -> Result<(), BoxError> + Send + Sync>;

/// A freshly created, not yet shared instance.
pub(crate) struct Product {
  pub(crate) value: AnyBox,
  pub(crate) type_name: &'static str,
}

impl Product {
  fn new<R: Any + Send + Sync>(value: R) -> Self {
    Self {
      value: Box::new(value),
      type_name: std::any::type_name::<R>(),
    }
  }

  pub(crate) fn type_id(&self) -> TypeId {
    let any: &(dyn Any + Send + Sync) = &*self.value;
    any.type_id()
  }
}

/// Resolved arguments handed to a constructor or factory method.
#[derive(Debug, Clone, Default)]
pub struct Args {
  values: Vec<Value>,
}

impl Args {
  pub(crate) fn new(values: Vec<Value>) -> Self {
    Self { values }
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn get(&self, index: usize) -> Result<&Value, ArgError> {
    self.values.get(index).ok_or(ArgError::Missing(index))
  }

  pub fn string(&self, index: usize) -> Result<String, ArgError> {
    self.get(index)?.as_str().map(str::to_owned)
  }

  pub fn int(&self, index: usize) -> Result<i64, ArgError> {
    self.get(index)?.as_int()
  }

  pub fn float(&self, index: usize) -> Result<f64, ArgError> {
    self.get(index)?.as_float()
  }

  pub fn bool(&self, index: usize) -> Result<bool, ArgError> {
    self.get(index)?.as_bool()
  }

  pub fn bean<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>, ArgError> {
    self.get(index)?.to_bean::<T>()
  }

  pub fn beans<T: Any + Send + Sync>(&self, index: usize) -> Result<Vec<Arc<T>>, ArgError> {
    self.get(index)?.to_beans::<T>()
  }

  pub(crate) fn params(&self) -> Vec<Param> {
    self.values.iter().map(Value::param).collect()
  }

  pub fn values(&self) -> &[Value] {
    &self.values
  }
}

pub(crate) struct Constructor {
  pub(crate) name: String,
  pub(crate) params: Vec<Param>,
  pub(crate) create: CreateFn,
}

pub(crate) struct StaticMethod {
  pub(crate) params: Vec<Param>,
  pub(crate) create: CreateFn,
}

pub(crate) struct FactoryMethod {
  pub(crate) params: Vec<Param>,
  pub(crate) create: InstanceCreateFn,
}

/// Whether a signature accepts the given argument kinds, position by position.
pub(crate) fn signature_accepts(params: &[Param], args: &[Param]) -> bool {
  params.len() == args.len() && params.iter().zip(args).all(|(p, a)| p.accepts(a))
}

/// The closure tables for one concrete type.
///
/// Built once at configuration time through [`BeanType::builder`].
pub struct BeanType {
  name: &'static str,
  type_id: TypeId,
  pub(crate) constructors: Vec<Constructor>,
  pub(crate) static_methods: HashMap<String, StaticMethod>,
  pub(crate) factory_methods: HashMap<String, FactoryMethod>,
  pub(crate) init_methods: HashMap<String, InitFn>,
  pub(crate) destroy_methods: HashMap<String, DestroyFn>,
  pub(crate) fields: HashMap<String, SetterFn>,
}

impl BeanType {
  /// Starts describing the type `T`.
  pub fn builder<T: Any + Send + Sync>() -> BeanTypeBuilder<T> {
    BeanTypeBuilder {
      inner: BeanType {
        name: std::any::type_name::<T>(),
        type_id: TypeId::of::<T>(),
        constructors: Vec::new(),
        static_methods: HashMap::new(),
        factory_methods: HashMap::new(),
        init_methods: HashMap::new(),
        destroy_methods: HashMap::new(),
        fields: HashMap::new(),
      },
      _marker: PhantomData,
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  pub fn has_field(&self, field: &str) -> bool {
    self.fields.contains_key(field)
  }

  pub(crate) fn constructor_named(&self, name: &str) -> Option<usize> {
    self.constructors.iter().position(|c| c.name == name)
  }
}

impl fmt::Debug for BeanType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut ctors: Vec<_> = self.constructors.iter().map(|c| c.name.as_str()).collect();
    ctors.sort_unstable();
    f.debug_struct("BeanType")
      .field("name", &self.name)
      .field("constructors", &ctors)
      .field("static_methods", &self.static_methods.len())
      .field("factory_methods", &self.factory_methods.len())
      .field("fields", &self.fields.len())
      .finish_non_exhaustive()
  }
}

/// Typed builder for a [`BeanType`].
///
/// Every closure sees `T` directly; the builder erases it when storing.
pub struct BeanTypeBuilder<T> {
  inner: BeanType,
  _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> BeanTypeBuilder<T> {
  /// Adds a named constructor with the given parameter signature.
  pub fn constructor<F>(mut self, name: &str, params: impl Into<Vec<Param>>, create: F) -> Self
  where
    F: Fn(&Args) -> Result<T, BoxError> + Send + Sync + 'static,
  {
    self.inner.constructors.push(Constructor {
      name: name.to_owned(),
      params: params.into(),
      create: Box::new(move |args| create(args).map(Product::new)),
    });
    self
  }

  /// Adds a zero-parameter constructor named `new`.
  pub fn default_constructor<F>(self, create: F) -> Self
  where
    F: Fn() -> T + Send + Sync + 'static,
  {
    self.constructor("new", Vec::<Param>::new(), move |_| Ok(create()))
  }

  /// Adds a static factory method; it may produce any type.
  pub fn static_factory<R, F>(mut self, name: &str, params: impl Into<Vec<Param>>, create: F) -> Self
  where
    R: Any + Send + Sync,
    F: Fn(&Args) -> Result<R, BoxError> + Send + Sync + 'static,
  {
    self.inner.static_methods.insert(
      name.to_owned(),
      StaticMethod {
        params: params.into(),
        create: Box::new(move |args| create(args).map(Product::new)),
      },
    );
    self
  }

  /// Adds a factory method invoked on an instance of `T`.
  pub fn factory_method<R, F>(mut self, name: &str, params: impl Into<Vec<Param>>, create: F) -> Self
  where
    R: Any + Send + Sync,
    F: Fn(&T, &Args) -> Result<R, BoxError> + Send + Sync + 'static,
  {
    let type_name = self.inner.name;
    self.inner.factory_methods.insert(
      name.to_owned(),
      FactoryMethod {
        params: params.into(),
        create: Box::new(move |this, args| {
          let this = this
            .downcast_ref::<T>()
            .ok_or_else(|| receiver_mismatch(type_name))?;
          create(this, args).map(Product::new)
        }),
      },
    );
    self
  }

  /// Adds a zero-argument method usable as an init method.
  pub fn init_method<F>(mut self, name: &str, init: F) -> Self
  where
    F: Fn(&mut T) -> Result<(), BoxError> + Send + Sync + 'static,
  {
    let type_name = self.inner.name;
    self.inner.init_methods.insert(
      name.to_owned(),
      Box::new(move |this| {
        let this = this
          .downcast_mut::<T>()
          .ok_or_else(|| receiver_mismatch(type_name))?;
        init(this)
      }),
    );
    self
  }

  /// Adds a zero-argument method usable as a destroy method.
  pub fn destroy_method<F>(mut self, name: &str, destroy: F) -> Self
  where
    F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
  {
    let type_name = self.inner.name;
    self.inner.destroy_methods.insert(
      name.to_owned(),
      Box::new(move |this| {
        let this = this
          .downcast_ref::<T>()
          .ok_or_else(|| receiver_mismatch(type_name))?;
        destroy(this)
      }),
    );
    self
  }

  /// Adds an injectable field and the setter that assigns it.
  pub fn field<F>(mut self, name: &str, set: F) -> Self
  where
    F: Fn(&mut T, Value) -> Result<(), BoxError> + Send + Sync + 'static,
  {
    let type_name = self.inner.name;
    self.inner.fields.insert(
      name.to_owned(),
      Box::new(move |this, value| {
        let this = this
          .downcast_mut::<T>()
          .ok_or_else(|| receiver_mismatch(type_name))?;
        set(this, value)
      }),
    );
    self
  }

  pub fn build(self) -> Arc<BeanType> {
    Arc::new(self.inner)
  }
}

fn receiver_mismatch(type_name: &str) -> BoxError {
  format!("receiver is not a '{type_name}'").into()
}
