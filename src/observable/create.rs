use crate::{
  observable::{Observable, ObservableExt},
  observer::{Emitter, Observer},
  scope::SharedScope,
  type_hint::TypeHint,
};

/// Creates a cold observable from a closure that drives an [`Emitter`].
///
/// The closure runs once per subscription, synchronously. Events emitted
/// after `error` / `complete`, or after the subscriber closed, are dropped.
///
/// ```rust
/// use std::convert::Infallible;
///
/// use rxclock::prelude::*;
///
/// let mut out = vec![];
/// observable::create(|emitter: &mut dyn Emitter<i32, Infallible>| {
///   emitter.next(1);
///   emitter.next(2);
///   emitter.complete();
///   emitter.next(3);
/// })
/// .subscribe(|v| out.push(v));
/// assert_eq!(out, vec![1, 2]);
/// ```
pub fn create<F, Item, Err>(f: F) -> Create<F, Item, Err>
where
  F: FnOnce(&mut dyn Emitter<Item, Err>),
{
  Create { func: f, _hint: TypeHint::new() }
}

pub struct Create<F, Item, Err> {
  func: F,
  _hint: TypeHint<(Item, Err)>,
}

impl<F: Clone, Item, Err> Clone for Create<F, Item, Err> {
  fn clone(&self) -> Self { Self { func: self.func.clone(), _hint: TypeHint::new() } }
}

/// Adapts a consuming [`Observer`] to the `&mut self` emitter facade.
struct EmitterSlot<O>(Option<O>);

impl<Item, Err, O> Emitter<Item, Err> for EmitterSlot<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(observer) = self.0.as_mut() {
      if !observer.is_closed() {
        observer.next(value);
      }
    }
  }

  fn error(&mut self, err: Err) {
    if let Some(observer) = self.0.take() {
      observer.error(err);
    }
  }

  fn complete(&mut self) {
    if let Some(observer) = self.0.take() {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.0.as_ref().is_none_or(Observer::is_closed) }
}

impl<F, Item, Err, O> Observable<Item, Err, O> for Create<F, Item, Err>
where
  F: FnOnce(&mut dyn Emitter<Item, Err>),
  O: Observer<Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let mut slot = EmitterSlot(Some(observer));
    (self.func)(&mut slot);
  }
}

impl<F, Item, Err> ObservableExt<Item, Err> for Create<F, Item, Err>
where
  F: FnOnce(&mut dyn Emitter<Item, Err>),
{
  type Scope = SharedScope;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxclock_macro::test]
  fn error_is_terminal() {
    let mut values = vec![];
    let mut errors = vec![];
    create(|e: &mut dyn Emitter<i32, &str>| {
      e.next(1);
      e.error("broken");
      e.next(2);
      e.complete();
      assert!(e.is_closed());
    })
    .subscribe_err(|v| values.push(v), |err| errors.push(err));
    assert_eq!(values, vec![1]);
    assert_eq!(errors, vec!["broken"]);
  }

  #[rxclock_macro::test]
  fn emitter_sees_downstream_close() {
    let mut values = vec![];
    create(|e: &mut dyn Emitter<i32, ()>| {
      for v in 0..10 {
        if e.is_closed() {
          break;
        }
        e.next(v);
      }
    })
    .first()
    .subscribe(|v| values.push(v));
    assert_eq!(values, vec![0]);
  }
}
