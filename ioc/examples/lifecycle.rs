use fibre_beans::{
  Args, BeanError, BeanType, Container, ContainerConfig, Descriptor, LifecyclePolicy, Param, Value,
  ValueSpec,
};

struct Pool {
  name: String,
  size: i64,
}

fn pool_type() -> std::sync::Arc<BeanType> {
  BeanType::builder::<Pool>()
    .constructor("new", [Param::Str], |args: &Args| {
      Ok(Pool {
        name: args.string(0)?,
        size: 1,
      })
    })
    .constructor("with_parent", [Param::Str, Param::bean::<Pool>()], |args: &Args| {
      let parent = args.bean::<Pool>(1)?;
      Ok(Pool {
        name: format!("{}/{}", parent.name, args.string(0)?),
        size: 1,
      })
    })
    .init_method("connect", |this: &mut Pool| {
      println!("  init: connecting {}", this.name);
      Ok(())
    })
    .field("size", |this: &mut Pool, value: Value| {
      this.size = value.as_int()?;
      Ok(())
    })
    .destroy_method("shutdown", |this: &Pool| {
      if this.size > 8 {
        return Err(format!("{} has {} open connections", this.name, this.size).into());
      }
      println!("  destroy: {} closed", this.name);
      Ok(())
    })
    .build()
}

fn register(container: &Container) {
  let pool = pool_type();
  container
    .register(
      "primary",
      Descriptor::of_type(pool.clone())
        .arg("primary")
        .init_method("connect")
        .destroy_method("shutdown")
        .field("size", 4i64),
    )
    .unwrap();
  container
    .register(
      "replica",
      Descriptor::of_type(pool)
        .arg("replica")
        .arg(ValueSpec::reference("primary"))
        .init_method("connect")
        .destroy_method("shutdown")
        .field("size", 16i64),
    )
    .unwrap();
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  println!("--- Strict policy ---");
  let strict = Container::new();
  register(&strict);
  strict.get_bean("replica").unwrap();
  match strict.close() {
    Ok(()) => println!("closed cleanly"),
    Err(err) => {
      println!("close reported: {err}");
      for failure in &err.failures {
        if let BeanError::ConstructionFailure { id, source, .. } = failure {
          println!("  '{id}': {source}");
        }
      }
    }
  }

  println!("--- Lenient policy ---");
  let lenient = Container::with_config(
    ContainerConfig::default().lifecycle_policy(LifecyclePolicy::Lenient),
  );
  register(&lenient);
  lenient.get_bean("replica").unwrap();
  lenient.close().unwrap();
  println!("closed; destroy failures were logged only");
}
