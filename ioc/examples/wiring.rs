use fibre_beans::{Args, BeanType, Container, Descriptor, Param, Scope, ValueSpec};
use std::sync::Arc;

struct Repository {
  url: String,
}

struct Service {
  name: String,
  repo: Arc<Repository>,
}

struct ServiceFactory {
  prefix: String,
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let repository = BeanType::builder::<Repository>()
    .constructor("new", [Param::Str], |args: &Args| {
      Ok(Repository { url: args.string(0)? })
    })
    .build();

  let service = BeanType::builder::<Service>()
    .constructor("with_repo", [Param::Str, Param::bean::<Repository>()], |args: &Args| {
      Ok(Service {
        name: args.string(0)?,
        repo: args.bean(1)?,
      })
    })
    .static_factory("standalone", [Param::Str], |args: &Args| {
      Ok(Service {
        name: args.string(0)?,
        repo: Arc::new(Repository { url: "memory://".into() }),
      })
    })
    .build();

  let factory = BeanType::builder::<ServiceFactory>()
    .constructor("new", [Param::Str], |args: &Args| {
      Ok(ServiceFactory { prefix: args.string(0)? })
    })
    .factory_method("make", [Param::Str, Param::bean::<Repository>()], |this: &ServiceFactory, args: &Args| {
      Ok(Service {
        name: format!("{}-{}", this.prefix, args.string(0)?),
        repo: args.bean(1)?,
      })
    })
    .build();

  let container = Container::new();
  // The factory-bean path needs the service type's method table too.
  container.register_type(service.clone());

  container
    .register("repo", Descriptor::of_type(repository).arg("postgres://localhost/app"))
    .unwrap();
  container
    .register(
      "users",
      Descriptor::of_type(service.clone())
        .arg("users")
        .arg(ValueSpec::reference("repo")),
    )
    .unwrap();
  container
    .register(
      "scratch",
      Descriptor::of_type(service)
        .static_factory("standalone")
        .arg("scratch")
        .scope(Scope::Prototype),
    )
    .unwrap();
  container
    .register("factory", Descriptor::of_type(factory).arg("tenant"))
    .unwrap();
  container
    .register(
      "orders",
      Descriptor::from_factory("factory", "make")
        .arg("orders")
        .arg(ValueSpec::reference("repo")),
    )
    .unwrap();

  println!("Registered beans: {:?}", container.bean_ids());

  for id in ["users", "scratch", "orders"] {
    let service = container.get_bean_as::<Service>(id).unwrap();
    println!("{id}: name={} repo={}", service.name, service.repo.url);
  }

  let users = container.get_bean_as::<Service>("users").unwrap();
  let orders = container.get_bean_as::<Service>("orders").unwrap();
  assert!(Arc::ptr_eq(&users.repo, &orders.repo));
  println!("'users' and 'orders' share the singleton repository.");

  let first = container.get_bean("scratch").unwrap();
  let second = container.get_bean("scratch").unwrap();
  assert!(!fibre_beans::Bean::ptr_eq(&first, &second));
  println!("'scratch' is a prototype: each request builds a new instance.");
}
