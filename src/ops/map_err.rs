use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};

/// Converts the error type of the source.
pub struct MapErrOp<S, F, Err> {
  source: S,
  func: F,
  _hint: TypeHint<Err>,
}

impl<S, F, Err> MapErrOp<S, F, Err> {
  pub(crate) fn new(source: S, func: F) -> Self { Self { source, func, _hint: TypeHint::new() } }
}

impl<S: Clone, F: Clone, Err> Clone for MapErrOp<S, F, Err> {
  fn clone(&self) -> Self { Self::new(self.source.clone(), self.func.clone()) }
}

impl<Item, Err, E2, O, S, F> Observable<Item, E2, O> for MapErrOp<S, F, Err>
where
  O: Observer<Item, E2>,
  S: Observable<Item, Err, MapErrObserver<O, F>>,
  F: FnOnce(Err) -> E2,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(MapErrObserver { observer, func: self.func })
  }
}

impl<Item, Err, E2, S, F> ObservableExt<Item, E2> for MapErrOp<S, F, Err>
where
  S: ObservableExt<Item, Err>,
  F: FnOnce(Err) -> E2,
{
  type Scope = S::Scope;
}

pub struct MapErrObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, E2, O, F> Observer<Item, Err> for MapErrObserver<O, F>
where
  O: Observer<Item, E2>,
  F: FnOnce(Err) -> E2,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) { self.observer.error((self.func)(err)) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxclock_macro::test]
  fn converts_error() {
    let subject = LocalSubject::<i32, u8>::new();
    let errors = Rc::new(RefCell::new(vec![]));
    let c_errors = errors.clone();
    subject
      .clone()
      .map_err(|code| format!("code {code}"))
      .subscribe_err(|_| {}, move |e| c_errors.borrow_mut().push(e));
    subject.error(7);
    assert_eq!(*errors.borrow(), vec!["code 7".to_string()]);
  }
}
