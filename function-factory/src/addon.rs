use crate::env::CallbackInfo;
use crate::env::Env;
use crate::env::Module;
use crate::env::NativeFunction;

/// Display name given to functions produced by [`CreateFunction`].
pub const FUNCTION_NAME: &str = "theFunction";
/// The value every produced function returns.
pub const GREETING: &str = "hello world";
/// Property of the module record that holds the module's export.
pub const EXPORTS_KEY: &str = "exports";

/// Returns [`GREETING`]. Arguments are ignored.
pub struct HelloWorld;

impl NativeFunction for HelloWorld {
  fn call<E: Env>(env: &mut E, info: &mut CallbackInfo<E::Value>) -> Result<(), E::Error> {
    let greeting = env.create_string(GREETING)?;
    env.set_return_value(info, greeting);
    Ok(())
  }
}

/// Creates and returns a new [`HelloWorld`] function on every call. Arguments are ignored.
///
/// When `NAMED` is false the naming step is skipped, which leaves the created function anonymous.
pub struct Factory<const NAMED: bool>;

pub type CreateFunction = Factory<true>;
pub type CreateAnonymousFunction = Factory<false>;

impl<const NAMED: bool> NativeFunction for Factory<NAMED> {
  fn call<E: Env>(env: &mut E, info: &mut CallbackInfo<E::Value>) -> Result<(), E::Error> {
    let function = env.create_function::<HelloWorld>()?;
    if NAMED {
      let name = env.create_string(FUNCTION_NAME)?;
      env.set_function_name(function, name)?;
    }
    tracing::trace!(
      target: "function_factory::factory",
      named = NAMED,
      ignored_args = info.len(),
      "created function"
    );
    env.set_return_value(info, function);
    Ok(())
  }
}

fn register<E: Env, F: NativeFunction>(env: &mut E, module: E::Value) -> Result<(), E::Error> {
  let key = env.property_name(EXPORTS_KEY)?;
  let factory = env.create_function::<F>()?;
  env.set_property(module, key, factory)?;
  tracing::debug!(
    target: "function_factory::init",
    factory = std::any::type_name::<F>(),
    "registered module export"
  );
  Ok(())
}

/// Second-stage initializer: replaces `module.exports` with a [`CreateFunction`] factory.
pub fn init<E: Env>(env: &mut E, _exports: E::Value, module: E::Value) -> Result<(), E::Error> {
  register::<E, CreateFunction>(env, module)
}

/// Like [`init`], but the factory produces anonymous functions.
pub fn init_anonymous<E: Env>(
  env: &mut E,
  _exports: E::Value,
  module: E::Value,
) -> Result<(), E::Error> {
  register::<E, CreateAnonymousFunction>(env, module)
}

/// The module whose export is a [`CreateFunction`] factory.
pub struct FunctionFactoryModule;

impl Module for FunctionFactoryModule {
  fn init<E: Env>(env: &mut E, exports: E::Value, module: E::Value) -> Result<(), E::Error> {
    init(env, exports, module)
  }
}

/// The module whose export is a [`CreateAnonymousFunction`] factory.
pub struct AnonymousFunctionFactoryModule;

impl Module for AnonymousFunctionFactoryModule {
  fn init<E: Env>(env: &mut E, exports: E::Value, module: E::Value) -> Result<(), E::Error> {
    init_anonymous(env, exports, module)
  }
}
