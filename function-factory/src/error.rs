/// Errors produced by [`MemoryHost`](crate::MemoryHost).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
  /// A handle was used after its slot was freed (or the handle is otherwise malformed).
  #[error("invalid handle")]
  InvalidHandle,

  #[error("value is not an object")]
  NotAnObject,

  #[error("value is not a string")]
  NotAString,

  /// Attempted to call (or name) a non-callable value.
  #[error("value is not callable")]
  NotCallable,
}
