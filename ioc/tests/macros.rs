// ioc/tests/macros.rs

//! Tests for the `bean!` resolution macro against the global container.
//! Every test registers under its own id since the global container is
//! shared by the whole test binary.

use fibre_beans::{bean, global, Args, Bean, BeanType, Descriptor, Param, Scope, ValueSpec};
use std::sync::Arc;

// --- Test Fixtures ---

struct MacroTestService {
  value: i64,
}

struct MacroTestClient {
  service: Arc<MacroTestService>,
}

fn service_type() -> Arc<BeanType> {
  BeanType::builder::<MacroTestService>()
    .constructor("new", [Param::Int], |args: &Args| {
      Ok(MacroTestService { value: args.int(0)? })
    })
    .build()
}

fn client_type() -> Arc<BeanType> {
  BeanType::builder::<MacroTestClient>()
    .constructor("new", [Param::bean::<MacroTestService>()], |args: &Args| {
      Ok(MacroTestClient {
        service: args.bean(0)?,
      })
    })
    .build()
}

// --- Typed form ---

#[test]
fn test_bean_macro_typed_resolution() {
  global()
    .register("macro_typed_service", Descriptor::of_type(service_type()).arg(42i64))
    .unwrap();

  let service = bean!(MacroTestService, "macro_typed_service");
  let again = bean!(MacroTestService, "macro_typed_service");

  assert_eq!(service.value, 42);
  assert!(Arc::ptr_eq(&service, &again));
}

#[test]
fn test_bean_macro_resolves_dependencies() {
  global()
    .register("macro_dep_service", Descriptor::of_type(service_type()).arg(7i64))
    .unwrap();
  global()
    .register(
      "macro_dep_client",
      Descriptor::of_type(client_type()).arg(ValueSpec::reference("macro_dep_service")),
    )
    .unwrap();

  let client = bean!(MacroTestClient, "macro_dep_client");
  let service = bean!(MacroTestService, "macro_dep_service");

  assert!(Arc::ptr_eq(&client.service, &service));
}

// --- Untyped form ---

#[test]
fn test_bean_macro_untyped_resolution() {
  global()
    .register(
      "macro_untyped_service",
      Descriptor::of_type(service_type())
        .arg(1i64)
        .scope(Scope::Prototype),
    )
    .unwrap();

  let first: Bean = bean!("macro_untyped_service");
  let second: Bean = bean!("macro_untyped_service");

  assert!(first.is::<MacroTestService>());
  assert!(!Bean::ptr_eq(&first, &second));
}

// --- Panics ---

#[test]
#[should_panic(expected = "Failed to resolve required bean 'macro_missing'")]
fn test_bean_macro_panics_on_unknown_bean() {
  let _ = bean!("macro_missing");
}

#[test]
#[should_panic(expected = "Failed to resolve required bean 'macro_wrong_type' as")]
fn test_bean_macro_panics_on_type_mismatch() {
  global()
    .register("macro_wrong_type", Descriptor::of_type(service_type()).arg(3i64))
    .unwrap();

  let _ = bean!(MacroTestClient, "macro_wrong_type");
}
