//! Init and destroy method invocation.

use tracing::{debug, warn};

use crate::bean_type::{BeanType, Product};
use crate::config::LifecyclePolicy;
use crate::container::Container;
use crate::descriptor::Descriptor;
use crate::error::{BeanError, Result, Stage};

impl Container {
  /// Runs the descriptor's init method on a freshly created instance.
  pub(crate) fn run_init(
    &self,
    id: &str,
    descriptor: &Descriptor,
    runtime_type: Option<&BeanType>,
    product: &mut Product,
  ) -> Result<()> {
    let Some(method) = descriptor.init_method_name() else {
      return Ok(());
    };
    let outcome = match runtime_type.and_then(|ty| ty.init_methods.get(method)) {
      Some(init) => {
        debug!(bean = %id, method, "running init method");
        init(&mut *product.value).map_err(|e| BeanError::construction(id, Stage::Init, e))
      }
      None => Err(BeanError::UnknownMethod {
        id: id.to_owned(),
        type_name: product.type_name.to_owned(),
        method: method.to_owned(),
      }),
    };
    self.apply_policy(outcome)
  }

  /// Destroys every built singleton, newest first, and empties the cache.
  ///
  /// Returns the failures that the lifecycle policy did not swallow.
  pub(crate) fn destroy_singletons(&self) -> Vec<BeanError> {
    let order = std::mem::take(&mut *self.creation_order.lock());
    let mut failures = Vec::new();

    for id in order.iter().rev() {
      let Some(bean) = self.cached_singleton(id) else {
        continue;
      };
      let Some(descriptor) = self.registry.lookup(id) else {
        continue;
      };
      let Some(method) = descriptor.destroy_method_name() else {
        continue;
      };
      if !descriptor.is_singleton() {
        continue;
      }

      let runtime_type = self.runtime_type(&descriptor, bean.concrete_type_id());
      let outcome = match runtime_type.as_deref().and_then(|ty| ty.destroy_methods.get(method)) {
        Some(destroy) => {
          debug!(bean = %id, method, "running destroy method");
          destroy(bean.as_any()).map_err(|e| BeanError::construction(id, Stage::Destroy, e))
        }
        None => Err(BeanError::UnknownMethod {
          id: id.clone(),
          type_name: bean.type_name().to_owned(),
          method: method.to_owned(),
        }),
      };
      if let Err(err) = self.apply_policy(outcome) {
        failures.push(err);
      }
    }

    self.singletons.clear();
    failures
  }

  fn apply_policy(&self, outcome: Result<()>) -> Result<()> {
    match (outcome, self.config.lifecycle_policy) {
      (Err(err), LifecyclePolicy::Lenient) => {
        warn!(error = %err, "ignoring lifecycle failure");
        Ok(())
      }
      (outcome, _) => outcome,
    }
  }
}
