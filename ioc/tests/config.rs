// ioc/tests/config.rs

//! Deserialization of container settings, as loaded by a configuration layer.

use fibre_beans::{Container, ContainerConfig, LifecyclePolicy, Scope};
use pretty_assertions::assert_eq;

#[test]
fn test_full_config_deserializes() {
  let json = r#"{ "lifecycle_policy": "lenient", "warn_on_override": false }"#;

  let config: ContainerConfig = serde_json::from_str(json).unwrap();

  assert_eq!(
    config,
    ContainerConfig::default()
      .lifecycle_policy(LifecyclePolicy::Lenient)
      .warn_on_override(false)
  );
}

#[test]
fn test_empty_config_uses_defaults() {
  let config: ContainerConfig = serde_json::from_str("{}").unwrap();

  assert_eq!(config, ContainerConfig::default());
  assert_eq!(config.lifecycle_policy, LifecyclePolicy::Strict);
  assert!(config.warn_on_override);
}

#[test]
fn test_unknown_config_field_is_rejected() {
  let json = r#"{ "lifecycle_policy": "strict", "lazy_init": true }"#;

  let err = serde_json::from_str::<ContainerConfig>(json).unwrap_err();

  assert!(err.to_string().contains("lazy_init"), "unexpected error: {err}");
}

#[test]
fn test_unknown_policy_is_rejected() {
  let result = serde_json::from_str::<ContainerConfig>(r#"{ "lifecycle_policy": "relaxed" }"#);

  assert!(result.is_err());
}

#[test]
fn test_scope_deserializes_and_parses() {
  let scopes: Vec<Scope> = serde_json::from_str(r#"["singleton", "prototype"]"#).unwrap();

  assert_eq!(scopes, vec![Scope::Singleton, Scope::Prototype]);
  assert_eq!(" prototype ".parse::<Scope>(), Ok(Scope::Prototype));
  assert!("session".parse::<Scope>().is_err());
}

#[test]
fn test_loaded_config_drives_container() {
  let config: ContainerConfig =
    serde_json::from_str(r#"{ "lifecycle_policy": "lenient" }"#).unwrap();

  let container = Container::with_config(config);

  assert_eq!(container.config().lifecycle_policy, LifecyclePolicy::Lenient);
}
