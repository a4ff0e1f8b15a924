//! The resolution pipeline: cycle check, cache, strategy selection,
//! argument resolution, instantiation, initialization, field injection.

use std::any::TypeId;
use std::sync::Arc;

use tracing::debug;

use crate::bean_type::{signature_accepts, Args, BeanType, Product};
use crate::chain::ResolutionChain;
use crate::container::Container;
use crate::descriptor::{Descriptor, Strategy};
use crate::error::{BeanError, Result, Stage};
use crate::value::{Bean, Param, Value, ValueSpec};

impl Container {
  pub(crate) fn resolve(&self, id: &str, chain: &ResolutionChain) -> Result<Bean> {
    let _guard = chain.enter(id)?;

    if let Some(bean) = self.cached_singleton(id) {
      debug!(bean = %id, "singleton cache hit");
      return Ok(bean);
    }

    let descriptor = self
      .registry
      .lookup(id)
      .ok_or_else(|| BeanError::UnknownBean { id: id.to_owned() })?;

    if !descriptor.is_singleton() {
      return self.create(id, &descriptor, chain);
    }

    // Clone the cell out so no map guard is held while building.
    let cell = self
      .singletons
      .entry(id.to_owned())
      .or_default()
      .value()
      .clone();
    if let Some(bean) = cell.get() {
      return Ok(bean.clone());
    }
    // Blocking on a cell whose builder waits on us would never return.
    let _waiting = self.waits.wait_for(id, chain)?;
    let bean = cell.get_or_try_init(|| {
      let _building = self.waits.build(id, chain.id());
      let bean = self.create(id, &descriptor, chain)?;
      self.creation_order.lock().push(id.to_owned());
      Ok::<_, BeanError>(bean)
    })?;
    Ok(bean.clone())
  }

  fn create(&self, id: &str, descriptor: &Descriptor, chain: &ResolutionChain) -> Result<Bean> {
    let strategy = descriptor
      .strategy()
      .ok_or_else(|| BeanError::InvalidDescriptor {
        id: id.to_owned(),
        reason: "no creation path".into(),
      })?;

    let mut product = match strategy {
      Strategy::Constructor(bean_type) => {
        let args = self.resolve_args(descriptor, chain)?;
        let index = match_constructor(id, descriptor, bean_type, &args)?;
        let constructor = &bean_type.constructors[index];
        debug!(bean = %id, constructor = %constructor.name, "creating bean by constructor");
        (constructor.create)(&args).map_err(|e| BeanError::construction(id, Stage::Constructor, e))?
      }
      Strategy::StaticFactory(bean_type, method) => {
        let args = self.resolve_args(descriptor, chain)?;
        let factory = bean_type
          .static_methods
          .get(method)
          .ok_or_else(|| unknown_method(id, bean_type.name(), method))?;
        check_signature(id, &format!("static factory method '{method}'"), &factory.params, &args)?;
        debug!(bean = %id, method, "creating bean by static factory method");
        (factory.create)(&args).map_err(|e| BeanError::construction(id, Stage::StaticFactory, e))?
      }
      Strategy::InstanceFactory(factory_id, method) => {
        let factory_bean = self.resolve(factory_id, chain)?;
        let args = self.resolve_args(descriptor, chain)?;
        let factory = self
          .registry
          .type_of(factory_bean.concrete_type_id())
          .ok_or_else(|| unknown_method(id, factory_bean.type_name(), method))?;
        let factory_method = factory
          .factory_methods
          .get(method)
          .ok_or_else(|| unknown_method(id, factory.name(), method))?;
        check_signature(id, &format!("factory method '{method}'"), &factory_method.params, &args)?;
        debug!(bean = %id, factory = %factory_id, method, "creating bean by factory bean");
        (factory_method.create)(factory_bean.as_any(), &args)
          .map_err(|e| BeanError::construction(id, Stage::InstanceFactory, e))?
      }
    };

    let runtime_type = self.runtime_type(descriptor, product.type_id());
    self.run_init(id, descriptor, runtime_type.as_deref(), &mut product)?;
    self.inject_fields(id, descriptor, runtime_type.as_deref(), &mut product, chain)?;

    Ok(Bean::from_box(product.value, product.type_name))
  }

  /// The method/field table of an instance: the descriptor's own type when
  /// it matches, otherwise whatever the registry knows for that `TypeId`.
  pub(crate) fn runtime_type(&self, descriptor: &Descriptor, type_id: TypeId) -> Option<Arc<BeanType>> {
    match descriptor.bean_type() {
      Some(bean_type) if bean_type.type_id() == type_id => Some(bean_type.clone()),
      _ => self.registry.type_of(type_id),
    }
  }

  fn resolve_args(&self, descriptor: &Descriptor, chain: &ResolutionChain) -> Result<Args> {
    let values = descriptor
      .arg_specs()
      .iter()
      .map(|spec| self.resolve_value(spec, chain))
      .collect::<Result<Vec<_>>>()?;
    Ok(Args::new(values))
  }

  fn resolve_value(&self, spec: &ValueSpec, chain: &ResolutionChain) -> Result<Value> {
    Ok(match spec {
      ValueSpec::Literal(value) => value.clone(),
      ValueSpec::Ref(reference) => Value::Bean(self.resolve(reference.target_id(), chain)?),
      ValueSpec::List(items) => Value::List(
        items
          .iter()
          .map(|item| self.resolve_value(item, chain))
          .collect::<Result<_>>()?,
      ),
      ValueSpec::Map(entries) => Value::Map(
        entries
          .iter()
          .map(|(key, item)| Ok((key.clone(), self.resolve_value(item, chain)?)))
          .collect::<Result<_>>()?,
      ),
      ValueSpec::Properties(props) => Value::Properties(props.clone()),
    })
  }

  fn inject_fields(
    &self,
    id: &str,
    descriptor: &Descriptor,
    runtime_type: Option<&BeanType>,
    product: &mut Product,
    chain: &ResolutionChain,
  ) -> Result<()> {
    for (field, spec) in descriptor.field_specs() {
      let setter = runtime_type
        .and_then(|ty| ty.fields.get(field))
        .ok_or_else(|| BeanError::UnknownField {
          id: id.to_owned(),
          type_name: product.type_name.to_owned(),
          field: field.clone(),
        })?;
      let value = self.resolve_value(spec, chain)?;
      setter(&mut *product.value, value).map_err(|e| BeanError::construction(id, Stage::Field, e))?;
    }
    Ok(())
  }
}

/// Picks the constructor of `bean_type` for the resolved `args`.
///
/// Order: explicit name, zero-argument constructor, cached handle, exact
/// kind match, then arity and assignability filtering. Ties are errors.
fn match_constructor(id: &str, descriptor: &Descriptor, bean_type: &BeanType, args: &Args) -> Result<usize> {
  let kinds = args.params();
  let no_match = || BeanError::NoMatchingConstructor {
    id: id.to_owned(),
    target: format!("constructor of '{}'", bean_type.name()),
    args: kinds.clone(),
  };
  let constructors = &bean_type.constructors;

  if let Some(name) = descriptor.constructor_name() {
    let index = bean_type
      .constructor_named(name)
      .ok_or_else(|| unknown_method(id, bean_type.name(), name))?;
    return if signature_accepts(&constructors[index].params, &kinds) {
      Ok(index)
    } else {
      Err(no_match())
    };
  }

  if kinds.is_empty() {
    return constructors
      .iter()
      .position(|c| c.params.is_empty())
      .ok_or_else(no_match);
  }

  if let Some(index) = descriptor.cached_constructor() {
    return Ok(index);
  }

  if let Some(index) = constructors.iter().position(|c| c.params == kinds) {
    return Ok(index);
  }

  let same_arity: Vec<usize> = (0..constructors.len())
    .filter(|&i| constructors[i].params.len() == kinds.len())
    .collect();
  let index = match same_arity.as_slice() {
    [] => return Err(no_match()),
    [only] => *only,
    candidates => {
      let assignable: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&i| signature_accepts(&constructors[i].params, &kinds))
        .collect();
      match assignable.as_slice() {
        [] => return Err(no_match()),
        [only] => *only,
        several => {
          return Err(BeanError::AmbiguousConstructor {
            id: id.to_owned(),
            candidates: several.iter().map(|&i| constructors[i].name.clone()).collect(),
          })
        }
      }
    }
  };

  if descriptor.is_prototype() {
    descriptor.cache_constructor(index);
  }
  Ok(index)
}

fn check_signature(id: &str, target: &str, params: &[Param], args: &Args) -> Result<()> {
  let kinds = args.params();
  if signature_accepts(params, &kinds) {
    Ok(())
  } else {
    Err(BeanError::NoMatchingConstructor {
      id: id.to_owned(),
      target: target.to_owned(),
      args: kinds,
    })
  }
}

fn unknown_method(id: &str, type_name: &str, method: &str) -> BeanError {
  BeanError::UnknownMethod {
    id: id.to_owned(),
    type_name: type_name.to_owned(),
    method: method.to_owned(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::descriptor::Scope;

  struct Pair;

  fn overloaded() -> Arc<BeanType> {
    BeanType::builder::<Pair>()
      .default_constructor(|| Pair)
      .constructor("str_any", [Param::Str, Param::Any], |_| Ok(Pair))
      .constructor("any_int", [Param::Any, Param::Int], |_| Ok(Pair))
      .constructor("int_int", [Param::Int, Param::Int], |_| Ok(Pair))
      .constructor("one", [Param::Bool], |_| Ok(Pair))
      .build()
  }

  fn args(values: Vec<Value>) -> Args {
    Args::new(values)
  }

  #[test]
  fn no_arguments_pick_the_default_constructor() {
    let ty = overloaded();
    let descriptor = Descriptor::of_type(ty.clone());
    assert_eq!(match_constructor("p", &descriptor, &ty, &args(vec![])).unwrap(), 0);
  }

  #[test]
  fn exact_kinds_win_over_assignable_ones() {
    let ty = overloaded();
    let descriptor = Descriptor::of_type(ty.clone());
    let picked = match_constructor("p", &descriptor, &ty, &args(vec![Value::Int(1), Value::Int(2)])).unwrap();
    assert_eq!(ty.constructors[picked].name, "int_int");
  }

  #[test]
  fn single_arity_match_is_used_as_is() {
    let ty = overloaded();
    let descriptor = Descriptor::of_type(ty.clone());
    let picked = match_constructor("p", &descriptor, &ty, &args(vec![Value::from("x")])).unwrap();
    assert_eq!(ty.constructors[picked].name, "one");
  }

  #[test]
  fn ties_are_reported_not_guessed() {
    let ty = overloaded();
    let descriptor = Descriptor::of_type(ty.clone());
    let err = match_constructor("p", &descriptor, &ty, &args(vec![Value::from("x"), Value::Int(2)])).unwrap_err();
    match err {
      BeanError::AmbiguousConstructor { candidates, .. } => {
        assert_eq!(candidates, vec!["str_any".to_string(), "any_int".into()]);
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn explicit_name_resolves_a_tie() {
    let ty = overloaded();
    let descriptor = Descriptor::of_type(ty.clone()).constructor("any_int");
    let picked = match_constructor("p", &descriptor, &ty, &args(vec![Value::from("x"), Value::Int(2)])).unwrap();
    assert_eq!(ty.constructors[picked].name, "any_int");
  }

  #[test]
  fn wrong_arity_is_rejected() {
    let ty = overloaded();
    let descriptor = Descriptor::of_type(ty.clone());
    let three = args(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert!(matches!(
      match_constructor("p", &descriptor, &ty, &three),
      Err(BeanError::NoMatchingConstructor { .. })
    ));
  }

  #[test]
  fn prototype_caches_fallback_matches_only() {
    let ty = overloaded();
    let prototype = Descriptor::of_type(ty.clone()).scope(Scope::Prototype);
    match_constructor("p", &prototype, &ty, &args(vec![Value::Int(1), Value::Int(2)])).unwrap();
    assert_eq!(prototype.cached_constructor(), None);

    match_constructor("p", &prototype, &ty, &args(vec![Value::from("x")])).unwrap();
    assert_eq!(prototype.cached_constructor(), ty.constructor_named("one"));

    let singleton = Descriptor::of_type(ty.clone());
    match_constructor("s", &singleton, &ty, &args(vec![Value::from("x")])).unwrap();
    assert_eq!(singleton.cached_constructor(), None);
  }
}
