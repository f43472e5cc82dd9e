use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};

/// `map` with a fallible function.
///
/// The first `Err` returned by the function is delivered downstream as the
/// stream's error. The adapter is closed from then on, so a subject upstream
/// drops it and a synchronous source stops producing.
pub struct TryMapOp<S, F, Item> {
  source: S,
  func: F,
  _hint: TypeHint<Item>,
}

impl<S, F, Item> TryMapOp<S, F, Item> {
  pub(crate) fn new(source: S, func: F) -> Self { Self { source, func, _hint: TypeHint::new() } }
}

impl<S: Clone, F: Clone, Item> Clone for TryMapOp<S, F, Item> {
  fn clone(&self) -> Self { Self::new(self.source.clone(), self.func.clone()) }
}

impl<Item, B, Err, O, S, F> Observable<B, Err, O> for TryMapOp<S, F, Item>
where
  O: Observer<B, Err>,
  S: Observable<Item, Err, TryMapObserver<O, F>>,
  F: FnMut(Item) -> Result<B, Err>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(TryMapObserver { observer: Some(observer), func: self.func })
  }
}

impl<Item, B, Err, S, F> ObservableExt<B, Err> for TryMapOp<S, F, Item>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(Item) -> Result<B, Err>,
{
  type Scope = S::Scope;
}

pub struct TryMapObserver<O, F> {
  observer: Option<O>,
  func: F,
}

impl<Item, B, Err, O, F> Observer<Item, Err> for TryMapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> Result<B, Err>,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    match (self.func)(value) {
      Ok(mapped) => {
        if let Some(observer) = self.observer.as_mut() {
          observer.next(mapped);
        }
      }
      Err(err) => {
        if let Some(observer) = self.observer.take() {
          observer.error(err);
        }
      }
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
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  fn parse(s: &'static str) -> Result<i32, String> { s.parse().map_err(|_| format!("bad input: {s}")) }

  #[rxclock_macro::test]
  fn error_isolated_to_subscriber() {
    let subject = LocalSubject::<&'static str, String>::new();
    let values = Rc::new(RefCell::new(vec![]));
    let errors = Rc::new(RefCell::new(vec![]));
    let (c_values, c_errors) = (values.clone(), errors.clone());
    let handle = subject.clone().try_map(parse).subscribe_err(
      move |v| c_values.borrow_mut().push(v),
      move |e| c_errors.borrow_mut().push(e),
    );

    subject.next("1");
    subject.next("x");
    subject.next("2");

    assert_eq!(*values.borrow(), vec![1]);
    assert_eq!(*errors.borrow(), vec!["bad input: x".to_string()]);
    assert!(handle.is_closed());
    assert!(!subject.is_closed());
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[rxclock_macro::test]
  fn synchronous_source_stops_after_failure() {
    let mut calls = 0;
    let mut errors = vec![];
    observable::from_iter(["3", "oops", "4"])
      .map_err(|never| match never {})
      .try_map(|s: &str| {
        calls += 1;
        s.parse::<i32>().map_err(|e| e.to_string())
      })
      .subscribe_err(|_| {}, |e| errors.push(e));
    assert_eq!(calls, 2);
    assert_eq!(errors.len(), 1);
  }
}
