//! Public macros for ergonomic bean resolution.

/// Resolves a bean from the global container.
///
/// `bean!("id")` yields the untyped [`Bean`](crate::Bean) handle;
/// `bean!(Type, "id")` yields an `Arc<Type>`.
///
/// # Panics
///
/// Panics if the bean cannot be resolved or is not of the requested type.
/// For a non-panicking version, use `global().get_bean(...)` or
/// `global().get_bean_as::<T>(...)` directly.
///
/// # Examples
///
/// ```
/// use fibre_beans::{bean, global, Args, BeanType, Descriptor, Param};
///
/// struct Greeting(String);
///
/// let greeting = BeanType::builder::<Greeting>()
///   .constructor("new", [Param::Str], |args: &Args| Ok(Greeting(args.string(0)?)))
///   .build();
/// global()
///   .register("doc_greeting", Descriptor::of_type(greeting).arg("hello"))
///   .unwrap();
///
/// let greeting = bean!(Greeting, "doc_greeting");
/// assert_eq!(greeting.0, "hello");
/// ```
#[macro_export]
macro_rules! bean {
  ($id:expr) => {
    $crate::global()
      .get_bean($id)
      .unwrap_or_else(|err| panic!("Failed to resolve required bean '{}': {}", $id, err))
  };

  ($type:ty, $id:expr) => {
    $crate::global()
      .get_bean_as::<$type>($id)
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required bean '{}' as {}: {}",
          $id,
          std::any::type_name::<$type>(),
          err
        )
      })
  };
}
