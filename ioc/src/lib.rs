//! # Fibre Beans
//!
//! A thread-safe, descriptor-driven bean container for Rust.
//!
//! A configuration layer describes each bean with a [`Descriptor`]: which
//! type to build and how (constructor, static factory method, or a method on
//! another bean), which arguments to pass, which fields to inject, which
//! init/destroy methods to call, and whether the result is a singleton or a
//! prototype. The container turns those recipes into object graphs on
//! demand.
//!
//! ## Core Concepts
//!
//! - **BeanType**: the closure table for one Rust type (its constructors,
//!   factory methods, lifecycle methods and field setters), built once.
//! - **Descriptor**: the recipe for one bean id.
//! - **Reference**: an argument or field value meaning "the bean named X".
//! - **Container**: registers descriptors and resolves beans. Singletons are
//!   built once, even under concurrent first access; prototypes are built on
//!   every request.
//! - **Cycle detection**: each resolution carries its own chain of ids under
//!   construction, so `a -> b -> a` fails with
//!   [`BeanError::CircularDependency`] while unrelated resolutions on other
//!   threads proceed independently. A cycle split across threads (one
//!   thread building `a`, another building `b`) also fails instead of
//!   blocking forever.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_beans::{Args, BeanType, Container, Descriptor, Param, ValueSpec};
//! use std::sync::Arc;
//!
//! struct Repository {
//!   url: String,
//! }
//!
//! struct Service {
//!   name: String,
//!   repo: Arc<Repository>,
//! }
//!
//! let repository = BeanType::builder::<Repository>()
//!   .constructor("new", [Param::Str], |args: &Args| {
//!     Ok(Repository { url: args.string(0)? })
//!   })
//!   .build();
//! let service = BeanType::builder::<Service>()
//!   .constructor("new", [Param::Str, Param::bean::<Repository>()], |args: &Args| {
//!     Ok(Service { name: args.string(0)?, repo: args.bean(1)? })
//!   })
//!   .build();
//!
//! let container = Container::new();
//! container
//!   .register("repo", Descriptor::of_type(repository).arg("postgres://localhost"))
//!   .unwrap();
//! container
//!   .register(
//!     "service",
//!     Descriptor::of_type(service).arg("users").arg(ValueSpec::reference("repo")),
//!   )
//!   .unwrap();
//!
//! let service = container.get_bean_as::<Service>("service").unwrap();
//! assert_eq!(service.name, "users");
//! assert_eq!(service.repo.url, "postgres://localhost");
//! ```

mod bean_type;
mod chain;
mod config;
mod container;
mod descriptor;
mod engine;
mod error;
mod global;
mod lifecycle;
mod macros;
mod registry;
mod value;

pub use bean_type::{Args, BeanType, BeanTypeBuilder};
pub use config::{ContainerConfig, LifecyclePolicy};
pub use container::Container;
pub use descriptor::{Descriptor, Scope};
pub use error::{ArgError, BeanError, BoxError, Result, Stage, TeardownError};
pub use global::global;
pub use value::{Bean, Param, Reference, Value, ValueSpec};
