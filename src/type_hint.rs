use std::marker::PhantomData;

/// Zero-sized marker that pins an item type onto an operator struct.
///
/// Operators such as `map` only mention their input item type in trait
/// bounds; storing a `TypeHint` keeps that type in the struct so impls stay
/// constrained. `fn() -> T` keeps the marker `Send + Sync` whatever `T` is.
pub struct TypeHint<T>(PhantomData<fn() -> T>);

impl<T> TypeHint<T> {
  #[inline]
  pub const fn new() -> Self { TypeHint(PhantomData) }
}

impl<T> Default for TypeHint<T> {
  fn default() -> Self { Self::new() }
}

impl<T> Clone for TypeHint<T> {
  #[inline]
  fn clone(&self) -> Self { *self }
}

impl<T> Copy for TypeHint<T> {}
