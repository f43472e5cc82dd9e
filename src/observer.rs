//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).

use tracing::warn;

use crate::rc::{MutArc, MutRc, RcDeref, RcDerefMut};

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: The consumer of data in reactive programming
///
/// An Observer receives values, errors, and completion notifications from
/// an Observable. At most one of `error` / `complete` is ever called, and
/// since both consume the observer nothing can follow them.
pub trait Observer<Item, Err> {
  /// Receive the next value from the observable
  fn next(&mut self, value: Item);

  /// Handle an error from the observable
  fn error(self, err: Err);

  /// Handle completion of the observable
  fn complete(self);

  /// Returns `true` if the observer will not accept more values.
  ///
  /// Sources poll this to stop producing early and subjects use it to drop
  /// observers that terminated themselves.
  fn is_closed(&self) -> bool;
}

// ============================================================================
// Emitter Trait
// ============================================================================

/// Object-safe emission facade handed to [`create`](crate::observable::create)
/// closures.
///
/// All methods take `&mut self`, so a closure can drive any concrete observer
/// through `&mut dyn Emitter` without knowing its type. Once `error` or
/// `complete` has been called further calls are ignored.
pub trait Emitter<Item, Err> {
  fn next(&mut self, value: Item);
  fn error(&mut self, err: Err);
  fn complete(&mut self);
  fn is_closed(&self) -> bool;
}

// ============================================================================
// DynObserver Trait - Object-safe Observer
// ============================================================================

/// Helper trait to enable object-safe Observers (Box<dyn Observer>)
///
/// Standard Observer trait is not object-safe because `error` and `complete`
/// take `self` by value. DynObserver mirrors the interface with boxed
/// receivers.
pub trait DynObserver<Item, Err> {
  fn box_next(&mut self, value: Item);
  fn box_error(self: Box<Self>, err: Err);
  fn box_complete(self: Box<Self>);
  fn box_is_closed(&self) -> bool;
}

impl<T, Item, Err> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  fn box_next(&mut self, value: Item) { self.next(value); }
  fn box_error(self: Box<Self>, err: Err) { self.error(err); }
  fn box_complete(self: Box<Self>) { self.complete(); }
  fn box_is_closed(&self) -> bool { self.is_closed() }
}

macro_rules! impl_observer_for_box {
  ($ty:ty) => {
    impl<'a, Item, Err> Observer<Item, Err> for $ty {
      #[inline]
      fn next(&mut self, value: Item) { (**self).box_next(value) }

      #[inline]
      fn error(self, err: Err) { self.box_error(err) }

      #[inline]
      fn complete(self) { self.box_complete() }

      #[inline]
      fn is_closed(&self) -> bool { (**self).box_is_closed() }
    }
  };
}

impl_observer_for_box!(Box<dyn DynObserver<Item, Err> + 'a>);
impl_observer_for_box!(Box<dyn DynObserver<Item, Err> + Send + 'a>);

/// Boxed observer (single-threaded, no Send bound)
pub type BoxedObserver<'a, Item, Err> = Box<dyn DynObserver<Item, Err> + 'a>;

/// Boxed observer with Send bound (multi-threaded)
pub type BoxedObserverSend<'a, Item, Err> = Box<dyn DynObserver<Item, Err> + Send + 'a>;

// ============================================================================
// Queued delivery
// ============================================================================

/// An event waiting in a delivery queue.
pub(crate) enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

impl<Item, Err> Notification<Item, Err> {
  pub(crate) fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }
}

/// Runs `F` if the current thread unwinds while the guard is alive.
///
/// Delivery loops use it to clear their `emitting` flag so a panicking
/// observer does not leave the queue locked forever.
pub(crate) struct ResetOnPanic<F: FnMut()>(pub(crate) F);

impl<F: FnMut()> Drop for ResetOnPanic<F> {
  fn drop(&mut self) {
    if std::thread::panicking() {
      (self.0)();
    }
  }
}

// ============================================================================
// Closure observers
// ============================================================================

/// Logs an error that reached an observer without an error handler.
pub(crate) fn log_unhandled<Err>(_err: Err) {
  warn!(
    error_type = std::any::type_name::<Err>(),
    "stream error reached an observer without an error handler; dropping it"
  );
}

pub(crate) fn ignore_complete() {}

/// Observer assembled from three closures.
///
/// `subscribe(next)` fills the missing handlers with [`NextOnly`] defaults:
/// errors are logged, completion is ignored.
#[derive(Clone)]
pub struct ObserverFns<N, E, C> {
  next: N,
  error: E,
  complete: C,
}

/// Observer built from a `next` closure alone.
pub type NextOnly<N, Err> = ObserverFns<N, fn(Err), fn()>;

impl<N, E, C> ObserverFns<N, E, C> {
  pub fn new(next: N, error: E, complete: C) -> Self { Self { next, error, complete } }
}

impl<N, Err> ObserverFns<N, fn(Err), fn()> {
  pub fn next_only(next: N) -> Self {
    Self { next, error: log_unhandled::<Err>, complete: ignore_complete }
  }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for ObserverFns<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value) }

  #[inline]
  fn error(self, err: Err) { (self.error)(err) }

  #[inline]
  fn complete(self) { (self.complete)() }

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// Observer record whose three callbacks are all optional.
///
/// A missing `next` or `complete` is a no-op; a missing `error` logs the
/// dropped error. Useful when the set of handlers is only known at runtime.
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxclock::prelude::*;
///
/// let seen = Rc::new(RefCell::new(vec![]));
/// let c_seen = seen.clone();
/// observable::from_iter([1, 2])
///   .subscribe_with(Callbacks::new().on_next(move |v| c_seen.borrow_mut().push(v)));
/// assert_eq!(*seen.borrow(), vec![1, 2]);
/// ```
pub struct Callbacks<'a, Item, Err> {
  next: Option<Box<dyn FnMut(Item) + 'a>>,
  error: Option<Box<dyn FnOnce(Err) + 'a>>,
  complete: Option<Box<dyn FnOnce() + 'a>>,
}

impl<Item, Err> Default for Callbacks<'_, Item, Err> {
  fn default() -> Self { Self { next: None, error: None, complete: None } }
}

impl<'a, Item, Err> Callbacks<'a, Item, Err> {
  pub fn new() -> Self { Self::default() }

  pub fn on_next(mut self, f: impl FnMut(Item) + 'a) -> Self {
    self.next = Some(Box::new(f));
    self
  }

  pub fn on_error(mut self, f: impl FnOnce(Err) + 'a) -> Self {
    self.error = Some(Box::new(f));
    self
  }

  pub fn on_complete(mut self, f: impl FnOnce() + 'a) -> Self {
    self.complete = Some(Box::new(f));
    self
  }
}

impl<Item, Err> Observer<Item, Err> for Callbacks<'_, Item, Err> {
  fn next(&mut self, value: Item) {
    if let Some(next) = self.next.as_mut() {
      next(value);
    }
  }

  fn error(self, err: Err) {
    match self.error {
      Some(error) => error(err),
      None => log_unhandled(err),
    }
  }

  fn complete(self) {
    if let Some(complete) = self.complete {
      complete();
    }
  }

  fn is_closed(&self) -> bool { false }
}

// ============================================================================
// Observer implementations for Option and reference-counted Option wrappers
// ============================================================================

/// Option observer - None ignores all events, Some delegates to inner
impl<O, Item, Err> Observer<Item, Err> for Option<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(inner) = self {
      inner.next(value);
    }
  }

  fn error(self, err: Err) {
    if let Some(inner) = self {
      inner.error(err);
    }
  }

  fn complete(self) {
    if let Some(inner) = self {
      inner.complete();
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(Observer::is_closed) }
}

macro_rules! impl_observer_for_shared_option {
  ($rc:ident) => {
    /// Shared slot; terminal events take the inner observer out so every
    /// other clone of the slot sees it closed.
    impl<O, Item, Err> Observer<Item, Err> for $rc<Option<O>>
    where
      O: Observer<Item, Err>,
    {
      fn next(&mut self, value: Item) {
        Observer::<Item, Err>::next(&mut *self.rc_deref_mut(), value);
      }

      fn error(self, err: Err) {
        let inner = self.rc_deref_mut().take();
        if let Some(inner) = inner {
          inner.error(err);
        }
      }

      fn complete(self) {
        let inner = self.rc_deref_mut().take();
        if let Some(inner) = inner {
          inner.complete();
        }
      }

      fn is_closed(&self) -> bool { Observer::<Item, Err>::is_closed(&*self.rc_deref()) }
    }
  };
}

impl_observer_for_shared_option!(MutRc);
impl_observer_for_shared_option!(MutArc);

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use tracing_test::traced_test;

  use super::*;

  struct TestObserver {
    values: Vec<i32>,
  }

  impl Observer<i32, ()> for TestObserver {
    fn next(&mut self, value: i32) { self.values.push(value); }

    fn error(self, _: ()) {}

    fn complete(self) {}

    fn is_closed(&self) -> bool { false }
  }

  #[rxclock_macro::test]
  fn test_observer_trait() {
    let mut obs = TestObserver { values: vec![] };
    obs.next(1);
    obs.next(2);
    assert_eq!(obs.values, vec![1, 2]);
    assert!(!obs.is_closed());
  }

  #[rxclock_macro::test]
  fn test_closure_as_observer() {
    let mut count = 0;
    let mut closure_obs = NextOnly::<_, Infallible>::next_only(|v: i32| count += v);
    closure_obs.next(10);
    closure_obs.next(20);
    closure_obs.complete();
    assert_eq!(count, 30);
  }

  #[rxclock_macro::test]
  fn callbacks_missing_slots_are_noops() {
    let mut obs = Callbacks::<i32, ()>::new();
    obs.next(1);
    obs.complete();

    let done = Rc::new(RefCell::new(false));
    let c_done = done.clone();
    Callbacks::<i32, ()>::new()
      .on_complete(move || *c_done.borrow_mut() = true)
      .complete();
    assert!(*done.borrow());
  }

  #[rxclock_macro::test]
  #[traced_test]
  fn unhandled_error_is_logged() {
    Callbacks::<i32, &str>::new().error("boom");
    assert!(logs_contain("without an error handler"));
  }

  #[rxclock_macro::test]
  fn boxed_observer_delegates() {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let mut boxed: BoxedObserver<'_, i32, ()> =
      Box::new(Callbacks::new().on_next(move |v| c_seen.borrow_mut().push(v)));
    boxed.next(7);
    assert!(!boxed.is_closed());
    boxed.complete();
    assert_eq!(*seen.borrow(), vec![7]);
  }

  #[rxclock_macro::test]
  fn shared_slot_closes_every_clone() {
    let slot = MutRc::own(Some(TestObserver { values: vec![] }));
    let other = slot.clone();
    assert!(!other.is_closed());
    slot.complete();
    assert!(other.is_closed());
  }
}
