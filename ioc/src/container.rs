//! The main `Container` struct and its public API.

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::bean_type::BeanType;
use crate::chain::{ResolutionChain, WaitGraph};
use crate::config::{ContainerConfig, LifecyclePolicy};
use crate::descriptor::Descriptor;
use crate::error::{BeanError, Result, TeardownError};
use crate::registry::{Registered, Registry};
use crate::value::Bean;

/// The bean container.
///
/// Holds the descriptor registry and the singleton cache. Every method takes
/// `&self`; registration and resolution are safe from any number of threads.
#[derive(Default)]
pub struct Container {
  pub(crate) registry: Registry,
  /// One cell per singleton id. A cell is only ever initialized with a fully
  /// built bean; failed constructions leave it empty.
  pub(crate) singletons: DashMap<String, Arc<OnceCell<Bean>>>,
  /// Singleton ids in the order their construction completed.
  pub(crate) creation_order: Mutex<Vec<String>>,
  /// Builders and waiters of in-progress singletons, across all threads.
  pub(crate) waits: WaitGraph,
  pub(crate) config: ContainerConfig,
}

impl Container {
  /// Creates a new, empty `Container` with the default configuration.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_config(config: ContainerConfig) -> Self {
    Self {
      config,
      ..Self::default()
    }
  }

  pub fn config(&self) -> &ContainerConfig {
    &self.config
  }

  // --- Registration ---

  /// Registers `descriptor` under `id`.
  ///
  /// A blank id or a descriptor failing [`Descriptor::validate`] is rejected
  /// with [`BeanError::InvalidDescriptor`] and leaves the container unchanged.
  /// Registering an id twice replaces the earlier descriptor; a singleton
  /// already built from it stays cached.
  pub fn register(&self, id: &str, descriptor: Descriptor) -> Result<()> {
    match self.registry.register(id, descriptor) {
      Ok(Registered::New) => {
        debug!(bean = %id, "registered descriptor");
        Ok(())
      }
      Ok(Registered::Replaced) => {
        if self.config.warn_on_override {
          warn!(bean = %id, "descriptor already existed and was replaced");
        }
        Ok(())
      }
      Err(err) => {
        error!(bean = %id, error = %err, "rejected descriptor");
        Err(err)
      }
    }
  }

  /// Registers the method and field table of a type that is only produced by
  /// factories, so its init/destroy methods and fields can be found.
  pub fn register_type(&self, bean_type: Arc<BeanType>) {
    debug!(type_name = bean_type.name(), "registered bean type");
    self.registry.register_type(bean_type);
  }

  pub fn contains(&self, id: &str) -> bool {
    self.registry.contains(id)
  }

  pub fn lookup(&self, id: &str) -> Option<Arc<Descriptor>> {
    self.registry.lookup(id)
  }

  /// The ids of every registered descriptor, in no particular order.
  pub fn bean_ids(&self) -> Vec<String> {
    self.registry.ids()
  }

  // --- Resolution ---

  /// Resolves the bean registered under `id`, building it (and everything it
  /// references) if needed.
  pub fn get_bean(&self, id: &str) -> Result<Bean> {
    let chain = ResolutionChain::new();
    let result = self.resolve(id, &chain);
    debug_assert!(chain.is_empty());
    result
  }

  /// Resolves `id` and downcasts it to `T`.
  pub fn get_bean_as<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>> {
    let bean = self.get_bean(id)?;
    bean.downcast::<T>().ok_or_else(|| BeanError::TypeMismatch {
      id: id.to_owned(),
      expected: std::any::type_name::<T>(),
      actual: bean.type_name(),
    })
  }

  /// True once the singleton `id` has been fully built and cached.
  pub fn is_cached(&self, id: &str) -> bool {
    self.cached_singleton(id).is_some()
  }

  pub fn singleton_count(&self) -> usize {
    self
      .singletons
      .iter()
      .filter(|entry| entry.value().get().is_some())
      .count()
  }

  pub(crate) fn cached_singleton(&self, id: &str) -> Option<Bean> {
    self
      .singletons
      .get(id)
      .and_then(|entry| entry.value().get().cloned())
  }

  // --- Teardown ---

  /// Invokes the destroy method of every built singleton, most recently
  /// created first, then empties the singleton cache.
  ///
  /// Every singleton is attempted even if an earlier one fails. Under
  /// [`LifecyclePolicy::Strict`] the failures are returned; under
  /// [`LifecyclePolicy::Lenient`] they are only logged. Must not run
  /// concurrently with `get_bean`.
  pub fn close(&self) -> std::result::Result<(), TeardownError> {
    info!(singletons = self.singleton_count(), "closing container");
    let failures = self.destroy_singletons();
    if failures.is_empty() || self.config.lifecycle_policy == LifecyclePolicy::Lenient {
      Ok(())
    } else {
      Err(TeardownError { failures })
    }
  }
}
