use function_factory::CallbackInfo;
use function_factory::Env;
use function_factory::NativeFunction;
use neon::prelude::*;
use neon::result::Throw;
use std::marker::PhantomData;

/// [`Env`] over a Neon context.
///
/// Value handles are Neon handles scoped to the context's lifetime `'a`, so they cannot escape the
/// call that produced them.
pub struct NeonEnv<'a, 'cx, C: Context<'a>> {
  cx: &'cx mut C,
  _scope: PhantomData<Handle<'a, JsValue>>,
}

impl<'a, 'cx, C: Context<'a>> NeonEnv<'a, 'cx, C> {
  pub fn new(cx: &'cx mut C) -> Self {
    Self {
      cx,
      _scope: PhantomData,
    }
  }
}

impl<'a, 'cx, C: Context<'a>> Env for NeonEnv<'a, 'cx, C> {
  type Value = Handle<'a, JsValue>;
  type Error = Throw;

  fn create_string(&mut self, value: &str) -> NeonResult<Handle<'a, JsValue>> {
    Ok(self.cx.string(value).upcast())
  }

  fn create_function<F: NativeFunction>(&mut self) -> NeonResult<Handle<'a, JsValue>> {
    let function: Handle<'a, JsValue> = JsFunction::new(&mut *self.cx, dispatch::<F>)?.upcast();
    // Neon names new functions after their Rust type; clear that so they start out anonymous.
    let empty: Handle<'a, JsValue> = self.cx.string("").upcast();
    define_name(&mut *self.cx, function, empty)?;
    Ok(function)
  }

  fn set_function_name(
    &mut self,
    function: Handle<'a, JsValue>,
    name: Handle<'a, JsValue>,
  ) -> NeonResult<()> {
    define_name(&mut *self.cx, function, name)
  }

  fn set_property(
    &mut self,
    object: Handle<'a, JsValue>,
    key: Handle<'a, JsValue>,
    value: Handle<'a, JsValue>,
  ) -> NeonResult<()> {
    let object = object.downcast_or_throw::<JsObject, _>(&mut *self.cx)?;
    object.set(&mut *self.cx, key, value)?;
    Ok(())
  }
}

/// Attributes of the `name` property on function objects, besides its value.
pub(crate) const NAME_DESCRIPTOR_FLAGS: [(&str, bool); 3] = [
  ("writable", false),
  ("enumerable", false),
  ("configurable", true),
];

// `name` is non-writable on functions, so it has to be redefined rather than assigned. `Object`
// itself is a function, which Neon will not downcast to `JsObject`.
fn define_name<'a, C: Context<'a>>(
  cx: &mut C,
  function: Handle<'a, JsValue>,
  name: Handle<'a, JsValue>,
) -> NeonResult<()> {
  let global = cx.global();
  let object: Handle<JsFunction> = global.get(cx, "Object")?;
  let define_property: Handle<JsFunction> = object.get(cx, "defineProperty")?;
  let descriptor = cx.empty_object();
  descriptor.set(cx, "value", name)?;
  for (flag, enabled) in NAME_DESCRIPTOR_FLAGS {
    let enabled = cx.boolean(enabled);
    descriptor.set(cx, flag, enabled)?;
  }
  let key = cx.string("name").upcast::<JsValue>();
  let args = vec![function, key, descriptor.upcast()];
  define_property.call(cx, object, args)?;
  Ok(())
}

/// Entry point Neon calls for every function created through [`NeonEnv::create_function`].
fn dispatch<F: NativeFunction>(mut cx: FunctionContext) -> JsResult<JsValue> {
  let mut args = Vec::new();
  for i in 0..cx.len() {
    args.push(cx.argument::<JsValue>(i)?);
  }
  let mut info = CallbackInfo::new(args);
  F::call(&mut NeonEnv::new(&mut cx), &mut info)?;
  match info.into_return_value() {
    Some(value) => Ok(value),
    None => Ok(cx.undefined().upcast()),
  }
}

#[cfg(test)]
mod tests {
  use super::NAME_DESCRIPTOR_FLAGS;

  fn flag(name: &str) -> Option<bool> {
    NAME_DESCRIPTOR_FLAGS
      .iter()
      .find(|(flag, _)| *flag == name)
      .map(|(_, enabled)| *enabled)
  }

  #[test]
  fn name_descriptor_matches_builtin_function_names() {
    assert_eq!(flag("writable"), Some(false));
    assert_eq!(flag("enumerable"), Some(false));
    assert_eq!(flag("configurable"), Some(true));
    assert_eq!(flag("value"), None);
  }
}
