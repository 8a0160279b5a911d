use neon::prelude::*;

mod env;
mod legacy;

#[cfg(not(feature = "anonymous"))]
type Addon = function_factory::FunctionFactoryModule;
#[cfg(feature = "anonymous")]
type Addon = function_factory::AnonymousFunctionFactoryModule;

#[neon::main]
fn main(mut cx: ModuleContext) -> NeonResult<()> {
  legacy::load_module::<Addon>(&mut cx)
}
