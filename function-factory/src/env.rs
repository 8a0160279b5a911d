/// Arguments and return-value slot for a single native call.
///
/// A `CallbackInfo` is created by the host when it dispatches into a [`NativeFunction`] and is
/// dropped when the call returns; the values it holds are only valid for that call unless they are
/// handed back through the return-value slot.
#[derive(Debug, Clone)]
pub struct CallbackInfo<V> {
  args: Vec<V>,
  return_value: Option<V>,
}

impl<V: Copy> CallbackInfo<V> {
  pub fn new(args: Vec<V>) -> Self {
    Self {
      args,
      return_value: None,
    }
  }

  /// Number of arguments supplied by the caller.
  pub fn len(&self) -> usize {
    self.args.len()
  }

  pub fn is_empty(&self) -> bool {
    self.args.is_empty()
  }

  /// Returns argument `index`, or `None` if the caller passed fewer arguments.
  pub fn argument(&self, index: usize) -> Option<V> {
    self.args.get(index).copied()
  }

  pub fn arguments(&self) -> &[V] {
    &self.args
  }

  /// Sets the value the call evaluates to. Later calls overwrite earlier ones.
  pub fn set_return_value(&mut self, value: V) {
    self.return_value = Some(value);
  }

  pub fn return_value(&self) -> Option<V> {
    self.return_value
  }

  /// Consumes the info, yielding the return value. `None` means the call evaluates to
  /// `undefined`.
  pub fn into_return_value(self) -> Option<V> {
    self.return_value
  }
}

/// A native `[[Call]]` implementation that runs against any [`Env`].
///
/// Implementations are zero-sized markers; the host instantiates `call` for its own environment
/// type when the function object is created.
pub trait NativeFunction: 'static {
  fn call<E: Env>(env: &mut E, info: &mut CallbackInfo<E::Value>) -> Result<(), E::Error>;
}

/// A VM-neutral view of one execution context of a JavaScript host.
///
/// Values are opaque handles owned by the host's garbage collector. Addon code never frees them
/// and must not hold them past the call in which they were obtained.
pub trait Env {
  type Value: Copy;
  /// A pending host exception. Addon code propagates it unchanged.
  type Error;

  fn create_string(&mut self, value: &str) -> Result<Self::Value, Self::Error>;

  /// Creates a function object whose `[[Call]]` dispatches to `F`. The function is anonymous until
  /// [`Env::set_function_name`] is applied to it.
  fn create_function<F: NativeFunction>(&mut self) -> Result<Self::Value, Self::Error>;

  /// Sets the display name (`Function.prototype.name`) of a function created by this host.
  fn set_function_name(
    &mut self,
    function: Self::Value,
    name: Self::Value,
  ) -> Result<(), Self::Error>;

  /// Creates a property key handle for `name`.
  fn property_name(&mut self, name: &str) -> Result<Self::Value, Self::Error> {
    self.create_string(name)
  }

  fn set_property(
    &mut self,
    object: Self::Value,
    key: Self::Value,
    value: Self::Value,
  ) -> Result<(), Self::Error>;

  fn set_return_value(&mut self, info: &mut CallbackInfo<Self::Value>, value: Self::Value) {
    info.set_return_value(value);
  }
}

/// A loadable native module written against [`Env`].
///
/// `exports` is the object the host created for the module and `module` is the module record whose
/// `exports` property determines what a script receives when it loads the module.
pub trait Module {
  fn init<E: Env>(env: &mut E, exports: E::Value, module: E::Value) -> Result<(), E::Error>;
}
