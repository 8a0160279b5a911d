//! VM-neutral native function creation for JavaScript hosts.
//!
//! Native module logic is written once against [`Env`] and [`NativeFunction`]; each host supplies
//! a thin adapter at its load-time boundary. [`MemoryHost`] is an in-process host for running
//! modules without a JavaScript engine.
//!
//! ```
//! use function_factory::{FunctionFactoryModule, MemoryHost};
//!
//! let mut host = MemoryHost::new();
//! let factory = host.load_module::<FunctionFactoryModule>().unwrap();
//! let the_function = host.call(factory, &[]).unwrap();
//! let greeting = host.call(the_function, &[]).unwrap();
//! assert_eq!(host.string_value(greeting).unwrap(), "hello world");
//! assert_eq!(host.function_name(the_function).unwrap(), Some("theFunction"));
//! ```

pub use addon::init;
pub use addon::init_anonymous;
pub use addon::AnonymousFunctionFactoryModule;
pub use addon::CreateAnonymousFunction;
pub use addon::CreateFunction;
pub use addon::Factory;
pub use addon::FunctionFactoryModule;
pub use addon::HelloWorld;
pub use addon::EXPORTS_KEY;
pub use addon::FUNCTION_NAME;
pub use addon::GREETING;
pub use env::CallbackInfo;
pub use env::Env;
pub use env::Module;
pub use env::NativeFunction;
pub use error::HostError;
pub use host::HeapId;
pub use host::HostValue;
pub use host::MemoryHost;

mod addon;
mod env;
mod error;
mod host;
