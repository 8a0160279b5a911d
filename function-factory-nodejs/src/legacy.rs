use crate::env::NeonEnv;
use function_factory::Module;
use function_factory::EXPORTS_KEY;
use neon::prelude::*;

/// Property of the native exports object that carries a replaced `module.exports`. Must match
/// `index.js`.
pub(crate) const REPLACED_EXPORTS_KEY: &str = "__replacedModuleExports";

/// Where the final `module.exports` is published on the native exports object, if anywhere. When
/// the module only added properties to `exports`, the exports object itself is the result.
pub(crate) fn republish_key(replaced: bool) -> Option<&'static str> {
  replaced.then_some(REPLACED_EXPORTS_KEY)
}

// Neon's module entry point only hands us the exports object and gives no way to replace it. We
// fake a module record around it, run the VM-neutral initializer against that, and publish a
// replaced `module.exports` for `index.js` to pick up.
pub fn load_module<M: Module>(cx: &mut ModuleContext) -> NeonResult<()> {
  let exports = cx.exports_object()?;
  let module = cx.empty_object();
  module.set(cx, EXPORTS_KEY, exports)?;

  M::init(&mut NeonEnv::new(&mut *cx), exports.upcast(), module.upcast())?;

  let result: Handle<JsValue> = module.get(cx, EXPORTS_KEY)?;
  let replaced = !result.strict_equals(cx, exports);
  if let Some(key) = republish_key(replaced) {
    exports.set(cx, key, result)?;
  }
  tracing::debug!(
    target: "function_factory::init",
    module = std::any::type_name::<M>(),
    replaced,
    "loaded native module"
  );
  Ok(())
}
