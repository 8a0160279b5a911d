use crate::env::CallbackInfo;
use crate::env::Env;
use crate::env::Module;
use crate::env::NativeFunction;
use crate::error::HostError;
use crate::EXPORTS_KEY;
use ahash::HashMap;
use core::fmt;

/// A stable identifier for an allocation in a [`MemoryHost`].
///
/// This is a packed `{ index: u32, generation: u32 }`. The generation is incremented each time the
/// slot is freed, so a `HeapId` is only valid while its slot is occupied by the same generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct HeapId(u64);

impl HeapId {
  fn from_parts(index: u32, generation: u32) -> Self {
    Self((index as u64) | ((generation as u64) << 32))
  }

  #[inline]
  pub fn index(self) -> u32 {
    self.0 as u32
  }

  #[inline]
  pub fn generation(self) -> u32 {
    (self.0 >> 32) as u32
  }
}

impl fmt::Debug for HeapId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("HeapId")
      .field("index", &self.index())
      .field("generation", &self.generation())
      .finish()
  }
}

/// A value handle of the [`MemoryHost`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum HostValue {
  Undefined,
  Heap(HeapId),
}

type NativeCallFn = fn(&mut MemoryHost, &mut CallbackInfo<HostValue>) -> Result<(), HostError>;

type Properties = HashMap<Box<str>, HostValue>;

struct Function {
  call: NativeCallFn,
  name: Option<Box<str>>,
  properties: Properties,
}

enum Cell {
  String(Box<str>),
  Object(Properties),
  Function(Function),
}

struct Slot {
  generation: u32,
  cell: Option<Cell>,
}

/// A minimal in-process JavaScript host.
///
/// It models only what native modules built on [`Env`] need: strings, plain objects and native
/// functions, all addressed through generation-checked handles. There is no collector; every
/// allocation lives until [`MemoryHost::reset`].
#[derive(Default)]
pub struct MemoryHost {
  slots: Vec<Slot>,
  free: Vec<u32>,
}

impl MemoryHost {
  pub fn new() -> Self {
    Self::default()
  }

  /// Loads `M` the way `require` would: creates the `exports` and `module` objects, runs the
  /// module's initializer and returns the final value of `module.exports`.
  pub fn load_module<M: Module>(&mut self) -> Result<HostValue, HostError> {
    let exports = self.alloc_object()?;
    let module = self.alloc_object()?;
    let key = self.property_name(EXPORTS_KEY)?;
    self.set_property(module, key, exports)?;
    M::init(self, exports, module)?;
    self.get_property(module, EXPORTS_KEY)
  }

  pub fn alloc_object(&mut self) -> Result<HostValue, HostError> {
    Ok(self.alloc(Cell::Object(Properties::default())))
  }

  /// Invokes `function` with `args` and returns what it placed in its return-value slot, or
  /// `undefined` if it placed nothing.
  pub fn call(&mut self, function: HostValue, args: &[HostValue]) -> Result<HostValue, HostError> {
    let call = match self.cell(function)? {
      Cell::Function(f) => f.call,
      _ => return Err(HostError::NotCallable),
    };
    let mut info = CallbackInfo::new(args.to_vec());
    call(self, &mut info)?;
    Ok(info.into_return_value().unwrap_or(HostValue::Undefined))
  }

  pub fn is_callable(&self, value: HostValue) -> bool {
    matches!(self.cell(value), Ok(Cell::Function(_)))
  }

  /// The `typeof` of `value`.
  pub fn type_of(&self, value: HostValue) -> Result<&'static str, HostError> {
    if value == HostValue::Undefined {
      return Ok("undefined");
    }
    Ok(match self.cell(value)? {
      Cell::String(_) => "string",
      Cell::Object(_) => "object",
      Cell::Function(_) => "function",
    })
  }

  pub fn string_value(&self, value: HostValue) -> Result<&str, HostError> {
    match self.cell(value)? {
      Cell::String(s) => Ok(&**s),
      _ => Err(HostError::NotAString),
    }
  }

  /// The display name of a function, or `None` if it was never named.
  pub fn function_name(&self, function: HostValue) -> Result<Option<&str>, HostError> {
    match self.cell(function)? {
      Cell::Function(f) => Ok(f.name.as_deref()),
      _ => Err(HostError::NotCallable),
    }
  }

  /// Reads an own property; missing properties read as `undefined`.
  pub fn get_property(&self, object: HostValue, key: &str) -> Result<HostValue, HostError> {
    Ok(
      self
        .properties(object)?
        .get(key)
        .copied()
        .unwrap_or(HostValue::Undefined),
    )
  }

  /// Own property keys of `object`, sorted.
  pub fn own_property_keys(&self, object: HostValue) -> Result<Vec<&str>, HostError> {
    let mut keys: Vec<&str> = self.properties(object)?.keys().map(|k| &**k).collect();
    keys.sort_unstable();
    Ok(keys)
  }

  /// Number of live allocations.
  pub fn live_count(&self) -> usize {
    self.slots.len() - self.free.len()
  }

  /// Frees every allocation. All previously issued handles become invalid.
  pub fn reset(&mut self) {
    let mut freed = 0usize;
    for (index, slot) in self.slots.iter_mut().enumerate() {
      if slot.cell.take().is_some() {
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index as u32);
        freed += 1;
      }
    }
    tracing::debug!(target: "function_factory::host", freed, "reset heap");
  }

  fn alloc(&mut self, cell: Cell) -> HostValue {
    let index = match self.free.pop() {
      Some(index) => index as usize,
      None => {
        self.slots.push(Slot {
          generation: 0,
          cell: None,
        });
        self.slots.len() - 1
      }
    };
    let slot = &mut self.slots[index];
    slot.cell = Some(cell);
    let id = HeapId::from_parts(index as u32, slot.generation);
    tracing::trace!(target: "function_factory::host", ?id, "allocated");
    HostValue::Heap(id)
  }

  fn cell(&self, value: HostValue) -> Result<&Cell, HostError> {
    let HostValue::Heap(id) = value else {
      return Err(HostError::InvalidHandle);
    };
    match self.slots.get(id.index() as usize) {
      Some(Slot {
        generation,
        cell: Some(cell),
      }) if *generation == id.generation() => Ok(cell),
      _ => Err(HostError::InvalidHandle),
    }
  }

  fn cell_mut(&mut self, value: HostValue) -> Result<&mut Cell, HostError> {
    let HostValue::Heap(id) = value else {
      return Err(HostError::InvalidHandle);
    };
    match self.slots.get_mut(id.index() as usize) {
      Some(Slot {
        generation,
        cell: Some(cell),
      }) if *generation == id.generation() => Ok(cell),
      _ => Err(HostError::InvalidHandle),
    }
  }

  fn properties(&self, object: HostValue) -> Result<&Properties, HostError> {
    match self.cell(object)? {
      Cell::Object(properties) => Ok(properties),
      Cell::Function(f) => Ok(&f.properties),
      Cell::String(_) => Err(HostError::NotAnObject),
    }
  }
}

impl Env for MemoryHost {
  type Value = HostValue;
  type Error = HostError;

  fn create_string(&mut self, value: &str) -> Result<HostValue, HostError> {
    Ok(self.alloc(Cell::String(value.into())))
  }

  fn create_function<F: NativeFunction>(&mut self) -> Result<HostValue, HostError> {
    Ok(self.alloc(Cell::Function(Function {
      call: F::call::<MemoryHost>,
      name: None,
      properties: Properties::default(),
    })))
  }

  fn set_function_name(&mut self, function: HostValue, name: HostValue) -> Result<(), HostError> {
    let name: Box<str> = self.string_value(name)?.into();
    match self.cell_mut(function)? {
      Cell::Function(f) => {
        f.name = Some(name);
        Ok(())
      }
      _ => Err(HostError::NotCallable),
    }
  }

  fn set_property(
    &mut self,
    object: HostValue,
    key: HostValue,
    value: HostValue,
  ) -> Result<(), HostError> {
    let key: Box<str> = self.string_value(key)?.into();
    if value != HostValue::Undefined {
      self.cell(value)?;
    }
    let properties = match self.cell_mut(object)? {
      Cell::Object(properties) => properties,
      Cell::Function(f) => &mut f.properties,
      Cell::String(_) => return Err(HostError::NotAnObject),
    };
    properties.insert(key, value);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct ReturnsFirstArgument;

  impl NativeFunction for ReturnsFirstArgument {
    fn call<E: Env>(env: &mut E, info: &mut CallbackInfo<E::Value>) -> Result<(), E::Error> {
      if let Some(first) = info.argument(0) {
        env.set_return_value(info, first);
      }
      Ok(())
    }
  }

  #[test]
  fn heap_id_packs_index_and_generation() {
    let id = HeapId::from_parts(7, 3);
    assert_eq!(id.index(), 7);
    assert_eq!(id.generation(), 3);
  }

  #[test]
  fn call_dispatches_with_arguments() -> Result<(), HostError> {
    let mut host = MemoryHost::new();
    let f = host.create_function::<ReturnsFirstArgument>()?;
    let s = host.create_string("x")?;
    assert_eq!(host.call(f, &[s])?, s);
    assert_eq!(host.call(f, &[])?, HostValue::Undefined);
    Ok(())
  }

  #[test]
  fn calling_a_non_function_fails() -> Result<(), HostError> {
    let mut host = MemoryHost::new();
    let s = host.create_string("x")?;
    assert_eq!(host.call(s, &[]), Err(HostError::NotCallable));
    assert_eq!(host.call(HostValue::Undefined, &[]), Err(HostError::InvalidHandle));
    Ok(())
  }

  #[test]
  fn properties_require_objects_and_string_keys() -> Result<(), HostError> {
    let mut host = MemoryHost::new();
    let obj = host.alloc_object()?;
    let key = host.property_name("a")?;
    let s = host.create_string("v")?;
    host.set_property(obj, key, s)?;
    assert_eq!(host.get_property(obj, "a")?, s);
    assert_eq!(host.get_property(obj, "b")?, HostValue::Undefined);
    assert_eq!(host.set_property(s, key, s), Err(HostError::NotAnObject));
    assert_eq!(host.set_property(obj, obj, s), Err(HostError::NotAString));
    Ok(())
  }

  #[test]
  fn naming_requires_a_function_and_a_string() -> Result<(), HostError> {
    let mut host = MemoryHost::new();
    let f = host.create_function::<ReturnsFirstArgument>()?;
    let obj = host.alloc_object()?;
    let name = host.create_string("named")?;
    assert_eq!(host.function_name(f)?, None);
    assert_eq!(host.set_function_name(obj, name), Err(HostError::NotCallable));
    assert_eq!(host.set_function_name(f, obj), Err(HostError::NotAString));
    host.set_function_name(f, name)?;
    assert_eq!(host.function_name(f)?, Some("named"));
    Ok(())
  }

  #[test]
  fn reset_invalidates_handles_and_reuses_slots() -> Result<(), HostError> {
    let mut host = MemoryHost::new();
    let old = host.create_string("old")?;
    assert_eq!(host.live_count(), 1);
    host.reset();
    assert_eq!(host.live_count(), 0);
    assert_eq!(host.string_value(old), Err(HostError::InvalidHandle));

    let new = host.create_string("new")?;
    let (HostValue::Heap(old_id), HostValue::Heap(new_id)) = (old, new) else {
      panic!("expected heap handles");
    };
    assert_eq!(old_id.index(), new_id.index());
    assert_ne!(old_id.generation(), new_id.generation());
    assert_eq!(host.string_value(new)?, "new");
    Ok(())
  }

  #[test]
  fn allocation_appends_until_slots_are_freed() -> Result<(), HostError> {
    let mut host = MemoryHost::new();
    let mut indices = Vec::new();
    for _ in 0..4 {
      let HostValue::Heap(id) = host.create_string("s")? else {
        panic!("expected heap handle");
      };
      indices.push(id.index());
    }
    assert_eq!(indices, vec![0, 1, 2, 3]);
    assert_eq!(host.live_count(), 4);

    host.reset();
    assert_eq!(host.live_count(), 0);
    for _ in 0..4 {
      host.alloc_object()?;
    }
    assert_eq!(host.live_count(), 4);
    assert_eq!(host.slots.len(), 4);
    host.alloc_object()?;
    assert_eq!(host.slots.len(), 5);
    Ok(())
  }

  #[test]
  fn type_of_reports_kinds() -> Result<(), HostError> {
    let mut host = MemoryHost::new();
    let s = host.create_string("s")?;
    let o = host.alloc_object()?;
    let f = host.create_function::<ReturnsFirstArgument>()?;
    assert_eq!(host.type_of(HostValue::Undefined)?, "undefined");
    assert_eq!(host.type_of(s)?, "string");
    assert_eq!(host.type_of(o)?, "object");
    assert_eq!(host.type_of(f)?, "function");
    assert!(host.is_callable(f));
    assert!(!host.is_callable(o));
    Ok(())
  }
}
