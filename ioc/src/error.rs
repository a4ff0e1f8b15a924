use std::fmt;

use thiserror::Error;

use crate::value::Param;

/// Boxed error returned by user-supplied constructors, factories, lifecycle
/// methods and field setters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The step of bean creation (or teardown) at which a user closure failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Constructor,
  StaticFactory,
  InstanceFactory,
  Init,
  Field,
  Destroy,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Stage::Constructor => "constructor",
      Stage::StaticFactory => "static factory method",
      Stage::InstanceFactory => "instance factory method",
      Stage::Init => "init method",
      Stage::Field => "field setter",
      Stage::Destroy => "destroy method",
    };
    f.write_str(name)
  }
}

/// The main error type for `fibre_beans`.
#[derive(Debug, Error)]
pub enum BeanError {
  #[error("Invalid descriptor for bean '{id}': {reason}")]
  InvalidDescriptor { id: String, reason: String },

  #[error("No bean named '{id}' is registered")]
  UnknownBean { id: String },

  #[error("Circular dependency detected: {}", .chain.join(" -> "))]
  CircularDependency { chain: Vec<String> },

  #[error("No {target} of bean '{id}' accepts arguments ({})", format_params(.args))]
  NoMatchingConstructor {
    id: String,
    target: String,
    args: Vec<Param>,
  },

  #[error(
    "Bean '{id}' has several constructors accepting its arguments ({}); name one explicitly",
    .candidates.join(", ")
  )]
  AmbiguousConstructor { id: String, candidates: Vec<String> },

  #[error("Type '{type_name}' has no method '{method}' (required by bean '{id}')")]
  UnknownMethod {
    id: String,
    type_name: String,
    method: String,
  },

  #[error("The {stage} of bean '{id}' failed: {source}")]
  ConstructionFailure {
    id: String,
    stage: Stage,
    #[source]
    source: BoxError,
  },

  #[error("Type '{type_name}' has no injectable field '{field}' (required by bean '{id}')")]
  UnknownField {
    id: String,
    type_name: String,
    field: String,
  },

  #[error("Bean '{id}' is a '{actual}', not a '{expected}'")]
  TypeMismatch {
    id: String,
    expected: &'static str,
    actual: &'static str,
  },
}

impl BeanError {
  pub(crate) fn construction(id: &str, stage: Stage, source: BoxError) -> Self {
    BeanError::ConstructionFailure {
      id: id.to_owned(),
      stage,
      source,
    }
  }
}

/// Errors raised while reading resolved arguments or field values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
  #[error("Missing argument at position {0}")]
  Missing(usize),

  #[error("Expected a value of kind {expected}, found {found}")]
  WrongKind { expected: String, found: String },
}

/// Every destroy-method failure collected by one `Container::close` call.
#[derive(Debug, Error)]
#[error("{} bean(s) failed to shut down cleanly", .failures.len())]
pub struct TeardownError {
  pub failures: Vec<BeanError>,
}

/// A specialized `Result` type for `fibre_beans` operations.
pub type Result<T, E = BeanError> = std::result::Result<T, E>;

fn format_params(params: &[Param]) -> String {
  params
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join(", ")
}
