//! Descriptor and type-table storage.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;

use crate::bean_type::BeanType;
use crate::descriptor::Descriptor;
use crate::error::BeanError;

/// Outcome of a successful insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Registered {
  New,
  Replaced,
}

/// The id → descriptor store, plus the runtime type table used to find
/// lifecycle methods and field setters on a concrete instance.
#[derive(Default)]
pub(crate) struct Registry {
  descriptors: DashMap<String, Arc<Descriptor>>,
  types: DashMap<TypeId, Arc<BeanType>>,
}

impl Registry {
  pub(crate) fn register(&self, id: &str, descriptor: Descriptor) -> Result<Registered, BeanError> {
    if id.trim().is_empty() {
      return Err(BeanError::InvalidDescriptor {
        id: id.to_owned(),
        reason: "the bean id is blank".into(),
      });
    }
    descriptor
      .validate()
      .map_err(|reason| BeanError::InvalidDescriptor {
        id: id.to_owned(),
        reason,
      })?;

    if let Some(bean_type) = descriptor.bean_type() {
      self.register_type(bean_type.clone());
    }
    let previous = self.descriptors.insert(id.to_owned(), Arc::new(descriptor));
    Ok(match previous {
      Some(_) => Registered::Replaced,
      None => Registered::New,
    })
  }

  pub(crate) fn register_type(&self, bean_type: Arc<BeanType>) {
    self.types.insert(bean_type.type_id(), bean_type);
  }

  pub(crate) fn contains(&self, id: &str) -> bool {
    self.descriptors.contains_key(id)
  }

  /// Returns a shared handle; the map guard is released before returning.
  pub(crate) fn lookup(&self, id: &str) -> Option<Arc<Descriptor>> {
    self.descriptors.get(id).map(|entry| entry.value().clone())
  }

  pub(crate) fn type_of(&self, type_id: TypeId) -> Option<Arc<BeanType>> {
    self.types.get(&type_id).map(|entry| entry.value().clone())
  }

  pub(crate) fn ids(&self) -> Vec<String> {
    self.descriptors.iter().map(|entry| entry.key().clone()).collect()
  }

  #[cfg(test)]
  pub(crate) fn len(&self) -> usize {
    self.descriptors.len()
  }
}
