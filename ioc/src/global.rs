//! The global container instance and access functions.

use crate::container::Container;
use once_cell::sync::Lazy;

// Created on first access, with the default configuration.
static GLOBAL_CONTAINER: Lazy<Container> = Lazy::new(Container::default);

/// Provides a reference to the process-wide container.
///
/// Useful when descriptors are registered from many places in an
/// application. Tests should prefer their own [`Container`] so they stay
/// isolated from each other.
///
/// # Examples
///
/// ```
/// use fibre_beans::{global, BeanType, Descriptor};
///
/// struct Clock;
///
/// let clock = BeanType::builder::<Clock>().default_constructor(|| Clock).build();
/// global().register("doc_clock", Descriptor::of_type(clock)).unwrap();
/// assert!(global().contains("doc_clock"));
/// ```
pub fn global() -> &'static Container {
  &GLOBAL_CONTAINER
}
