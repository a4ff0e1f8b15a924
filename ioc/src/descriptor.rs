//! Bean descriptors: the declarative recipe for building one bean.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::bean_type::BeanType;
use crate::value::ValueSpec;

/// How long a bean instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Scope {
  /// One instance per id, cached until the container is closed.
  #[default]
  Singleton,
  /// A fresh instance on every request, owned by the caller.
  Prototype,
}

impl FromStr for Scope {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "singleton" => Ok(Scope::Singleton),
      "prototype" => Ok(Scope::Prototype),
      other => Err(format!("unknown scope '{other}'")),
    }
  }
}

/// How a descriptor's bean is created, derived from which fields are set.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Strategy<'a> {
  Constructor(&'a Arc<BeanType>),
  StaticFactory(&'a Arc<BeanType>, &'a str),
  InstanceFactory(&'a str, &'a str),
}

/// The recipe for one bean.
///
/// Descriptors are assembled by the configuration layer and never change
/// after registration, except for the lazily cached constructor of a
/// prototype bean.
#[derive(Default)]
pub struct Descriptor {
  target_type: Option<Arc<BeanType>>,
  factory_bean: Option<String>,
  factory_method: Option<String>,
  static_factory_method: Option<String>,
  constructor: Option<String>,
  init_method: Option<String>,
  destroy_method: Option<String>,
  scope: Scope,
  args: Vec<ValueSpec>,
  fields: BTreeMap<String, ValueSpec>,
  cached_constructor: OnceCell<usize>,
}

impl Descriptor {
  /// An empty descriptor; it is invalid until a creation path is set.
  pub fn new() -> Self {
    Self::default()
  }

  /// A bean built by one of `bean_type`'s constructors.
  pub fn of_type(bean_type: Arc<BeanType>) -> Self {
    Self::new().target_type(bean_type)
  }

  /// A bean built by calling `method` on the bean named `factory_bean`.
  pub fn from_factory(factory_bean: impl Into<String>, method: impl Into<String>) -> Self {
    Self::new().factory_bean(factory_bean).factory_method(method)
  }

  pub fn target_type(mut self, bean_type: Arc<BeanType>) -> Self {
    self.target_type = Some(bean_type);
    self
  }

  pub fn factory_bean(mut self, id: impl Into<String>) -> Self {
    self.factory_bean = Some(id.into());
    self
  }

  pub fn factory_method(mut self, name: impl Into<String>) -> Self {
    self.factory_method = Some(name.into());
    self
  }

  /// Creates the bean through a static method of the target type.
  pub fn static_factory(mut self, name: impl Into<String>) -> Self {
    self.static_factory_method = Some(name.into());
    self
  }

  /// Names the constructor to use, bypassing overload matching.
  pub fn constructor(mut self, name: impl Into<String>) -> Self {
    self.constructor = Some(name.into());
    self
  }

  pub fn init_method(mut self, name: impl Into<String>) -> Self {
    self.init_method = Some(name.into());
    self
  }

  pub fn destroy_method(mut self, name: impl Into<String>) -> Self {
    self.destroy_method = Some(name.into());
    self
  }

  pub fn scope(mut self, scope: Scope) -> Self {
    self.scope = scope;
    self
  }

  /// Appends one constructor (or factory method) argument.
  pub fn arg(mut self, spec: impl Into<ValueSpec>) -> Self {
    self.args.push(spec.into());
    self
  }

  pub fn args(mut self, specs: impl IntoIterator<Item = ValueSpec>) -> Self {
    self.args.extend(specs);
    self
  }

  /// Sets the value injected into `name`; a later call for the same field wins.
  pub fn field(mut self, name: impl Into<String>, spec: impl Into<ValueSpec>) -> Self {
    self.fields.insert(name.into(), spec.into());
    self
  }

  // --- Accessors ---

  pub fn bean_type(&self) -> Option<&Arc<BeanType>> {
    self.target_type.as_ref()
  }

  pub fn factory_bean_id(&self) -> Option<&str> {
    self.factory_bean.as_deref()
  }

  pub fn factory_method_name(&self) -> Option<&str> {
    self.factory_method.as_deref()
  }

  pub fn static_factory_name(&self) -> Option<&str> {
    self.static_factory_method.as_deref()
  }

  pub fn constructor_name(&self) -> Option<&str> {
    self.constructor.as_deref()
  }

  pub fn init_method_name(&self) -> Option<&str> {
    self.init_method.as_deref()
  }

  pub fn destroy_method_name(&self) -> Option<&str> {
    self.destroy_method.as_deref()
  }

  pub fn scope_kind(&self) -> Scope {
    self.scope
  }

  pub fn is_singleton(&self) -> bool {
    self.scope == Scope::Singleton
  }

  pub fn is_prototype(&self) -> bool {
    self.scope == Scope::Prototype
  }

  pub fn arg_specs(&self) -> &[ValueSpec] {
    &self.args
  }

  pub fn field_specs(&self) -> &BTreeMap<String, ValueSpec> {
    &self.fields
  }

  pub(crate) fn cached_constructor(&self) -> Option<usize> {
    self.cached_constructor.get().copied()
  }

  /// Records the matched constructor; only the first call has any effect.
  pub(crate) fn cache_constructor(&self, index: usize) {
    let _ = self.cached_constructor.set(index);
  }

  /// Checks that exactly one creation path is fully described.
  pub fn validate(&self) -> Result<(), String> {
    if self.target_type.is_none() {
      if is_blank(&self.factory_bean) || is_blank(&self.factory_method) {
        return Err("needs a target type, or a factory bean together with a factory method".into());
      }
      if self.static_factory_method.is_some() {
        return Err("a static factory method requires a target type".into());
      }
    }
    if self.static_factory_method.is_some() && is_blank(&self.static_factory_method) {
      return Err("the static factory method name is blank".into());
    }
    if self.constructor.is_some() && self.strategy().map_or(true, |s| !matches!(s, Strategy::Constructor(_))) {
      return Err("an explicit constructor only applies to the constructor path".into());
    }
    Ok(())
  }

  /// Selects the creation strategy, in priority order.
  pub(crate) fn strategy(&self) -> Option<Strategy<'_>> {
    match (&self.target_type, &self.static_factory_method) {
      (Some(ty), None) => Some(Strategy::Constructor(ty)),
      (Some(ty), Some(method)) => Some(Strategy::StaticFactory(ty, method)),
      (None, _) => match (&self.factory_bean, &self.factory_method) {
        (Some(bean), Some(method)) => Some(Strategy::InstanceFactory(bean, method)),
        _ => None,
      },
    }
  }
}

fn is_blank(value: &Option<String>) -> bool {
  value.as_deref().map_or(true, |s| s.trim().is_empty())
}

impl fmt::Debug for Descriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Descriptor")
      .field("target_type", &self.target_type.as_ref().map(|t| t.name()))
      .field("factory_bean", &self.factory_bean)
      .field("factory_method", &self.factory_method)
      .field("static_factory_method", &self.static_factory_method)
      .field("scope", &self.scope)
      .field("args", &self.args.len())
      .field("fields", &self.fields.keys().collect::<Vec<_>>())
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Widget;

  fn widget_type() -> Arc<BeanType> {
    BeanType::builder::<Widget>().default_constructor(|| Widget).build()
  }

  #[test]
  fn scope_parses_from_strings() {
    assert_eq!("singleton".parse::<Scope>(), Ok(Scope::Singleton));
    assert_eq!(" prototype ".parse::<Scope>(), Ok(Scope::Prototype));
    assert!("request".parse::<Scope>().is_err());
    assert_eq!(Scope::default(), Scope::Singleton);
  }

  #[test]
  fn empty_descriptor_is_invalid() {
    assert!(Descriptor::new().validate().is_err());
    assert!(Descriptor::new().factory_bean("factory").validate().is_err());
    assert!(Descriptor::new().factory_method("create").validate().is_err());
    assert!(Descriptor::from_factory(" ", "create").validate().is_err());
  }

  #[test]
  fn each_creation_path_validates() {
    assert!(Descriptor::of_type(widget_type()).validate().is_ok());
    assert!(Descriptor::of_type(widget_type()).static_factory("make").validate().is_ok());
    assert!(Descriptor::from_factory("factory", "create").validate().is_ok());
  }

  #[test]
  fn misplaced_options_are_rejected() {
    assert!(Descriptor::from_factory("factory", "create")
      .static_factory("make")
      .validate()
      .is_err());
    assert!(Descriptor::from_factory("factory", "create")
      .constructor("new")
      .validate()
      .is_err());
    assert!(Descriptor::of_type(widget_type()).static_factory("").validate().is_err());
  }

  #[test]
  fn strategy_follows_priority_order() {
    let by_ctor = Descriptor::of_type(widget_type());
    assert!(matches!(by_ctor.strategy(), Some(Strategy::Constructor(_))));

    let by_static = Descriptor::of_type(widget_type()).static_factory("make");
    assert!(matches!(by_static.strategy(), Some(Strategy::StaticFactory(_, "make"))));

    let by_factory = Descriptor::from_factory("factory", "create");
    assert!(matches!(
      by_factory.strategy(),
      Some(Strategy::InstanceFactory("factory", "create"))
    ));
  }

  #[test]
  fn constructor_cache_is_set_once() {
    let descriptor = Descriptor::of_type(widget_type()).scope(Scope::Prototype);
    assert_eq!(descriptor.cached_constructor(), None);
    descriptor.cache_constructor(2);
    descriptor.cache_constructor(5);
    assert_eq!(descriptor.cached_constructor(), Some(2));
  }
}
