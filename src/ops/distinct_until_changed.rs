//! DistinctUntilChanged operator implementation
//!
//! Filters consecutive duplicate items emitted by the source observable.

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

/// Emits items only if they differ from the previously forwarded item.
///
/// Requires the item type to implement `PartialEq` and `Clone`. Every
/// subscription gets its own memory of the last value.
#[derive(Clone)]
pub struct DistinctUntilChangedOp<S>(S);

impl<S> DistinctUntilChangedOp<S> {
  pub(crate) fn new(source: S) -> Self { Self(source) }
}

impl<Item, Err, O, S> Observable<Item, Err, O> for DistinctUntilChangedOp<S>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, DistinctUntilChangedObserver<O, Item>>,
  Item: PartialEq + Clone,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.0.actual_subscribe(DistinctUntilChangedObserver::new(observer))
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for DistinctUntilChangedOp<S>
where
  S: ObservableExt<Item, Err>,
  Item: PartialEq + Clone,
{
  type Scope = S::Scope;
}

pub struct DistinctUntilChangedObserver<O, Item> {
  observer: O,
  last: Option<Item>,
}

impl<O, Item> DistinctUntilChangedObserver<O, Item> {
  pub fn new(observer: O) -> Self { Self { observer, last: None } }
}

impl<O, Item, Err> Observer<Item, Err> for DistinctUntilChangedObserver<O, Item>
where
  O: Observer<Item, Err>,
  Item: PartialEq + Clone,
{
  fn next(&mut self, value: Item) {
    if self.last.as_ref() != Some(&value) {
      self.last = Some(value.clone());
      self.observer.next(value);
    }
  }

  fn error(self, err: Err) { self.observer.error(err); }

  fn complete(self) { self.observer.complete(); }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use crate::prelude::*;

  fn distinct(input: Vec<i32>) -> Vec<i32> {
    let mut out = vec![];
    observable::from_iter(input)
      .distinct_until_changed()
      .subscribe(|v| out.push(v));
    out
  }

  #[rxclock_macro::test]
  fn drops_consecutive_duplicates() {
    assert_eq!(distinct(vec![1, 1, 2, 2, 2, 3, 1]), vec![1, 2, 3, 1]);
  }

  #[rxclock_macro::test]
  fn empty_stays_empty() {
    assert_eq!(distinct(vec![]), Vec::<i32>::new());
  }

  #[rxclock_macro::test]
  fn state_is_per_subscription() {
    let subject = LocalSubject::<&'static str, Infallible>::new();
    let source = subject.clone().distinct_until_changed();
    let first = Rc::new(RefCell::new(vec![]));
    let second = Rc::new(RefCell::new(vec![]));
    let c_first = first.clone();
    source.clone().subscribe(move |v| c_first.borrow_mut().push(v));

    subject.next("a");
    subject.next("a");

    let c_second = second.clone();
    source.subscribe(move |v| c_second.borrow_mut().push(v));
    subject.next("a");
    subject.next("b");

    assert_eq!(*first.borrow(), vec!["a", "b"]);
    assert_eq!(*second.borrow(), vec!["a", "b"]);
  }
}
