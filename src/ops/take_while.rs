use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

/// Forwards values while a predicate holds and completes on the first value
/// that fails it. That value is not forwarded.
#[derive(Clone)]
pub struct TakeWhileOp<S, F> {
  source: S,
  predicate: F,
}

impl<S, F> TakeWhileOp<S, F> {
  pub(crate) fn new(source: S, predicate: F) -> Self { Self { source, predicate } }
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for TakeWhileOp<S, F>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, TakeWhileObserver<O, F>>,
  F: FnMut(&Item) -> bool,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(TakeWhileObserver { observer: Some(observer), predicate: self.predicate })
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for TakeWhileOp<S, F>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  type Scope = S::Scope;
}

pub struct TakeWhileObserver<O, F> {
  observer: Option<O>,
  predicate: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for TakeWhileObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    if (self.predicate)(&value) {
      if let Some(observer) = self.observer.as_mut() {
        observer.next(value);
      }
    } else if let Some(observer) = self.observer.take() {
      observer.complete();
    }
  }

  fn error(self, err: Err) {
    if let Some(observer) = self.observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    if let Some(observer) = self.observer {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.observer.as_ref().is_none_or(Observer::is_closed) }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use crate::prelude::*;

  #[rxclock_macro::test]
  fn completes_on_first_failure() {
    let mut out = vec![];
    let mut completed = 0;
    observable::from_iter([1, 2, 5, 1])
      .take_while(|v| *v < 3)
      .subscribe_complete(|v| out.push(v), || completed += 1);
    assert_eq!(out, vec![1, 2]);
    assert_eq!(completed, 1);
  }

  #[rxclock_macro::test]
  fn detaches_from_subject() {
    let subject = LocalSubject::<i32, Infallible>::new();
    let out = Rc::new(RefCell::new(vec![]));
    let c_out = out.clone();
    let handle = subject
      .clone()
      .take_while(|v| *v > 0)
      .subscribe(move |v| c_out.borrow_mut().push(v));

    subject.next(2);
    subject.next(0);
    subject.next(3);

    assert_eq!(*out.borrow(), vec![2]);
    assert!(handle.is_closed());
    assert!(subject.is_empty());
  }
}
