//! Container configuration.

/// What happens when an init or destroy method is missing or fails.
///
/// The same policy covers both hooks. Constructor and factory failures
/// always propagate regardless of the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LifecyclePolicy {
  /// An init failure aborts the resolution; destroy failures are returned
  /// from `close` once every bean has been attempted.
  #[default]
  Strict,
  /// Failures are logged at `warn` and otherwise ignored.
  Lenient,
}

/// Settings for a [`Container`](crate::Container).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct ContainerConfig {
  pub lifecycle_policy: LifecyclePolicy,
  /// Log a warning when a registration replaces an existing descriptor.
  pub warn_on_override: bool,
}

impl Default for ContainerConfig {
  fn default() -> Self {
    Self {
      lifecycle_policy: LifecyclePolicy::Strict,
      warn_on_override: true,
    }
  }
}

impl ContainerConfig {
  pub fn lifecycle_policy(mut self, policy: LifecyclePolicy) -> Self {
    self.lifecycle_policy = policy;
    self
  }

  pub fn warn_on_override(mut self, warn: bool) -> Self {
    self.warn_on_override = warn;
    self
  }
}
