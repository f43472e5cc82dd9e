use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

/// Forwards only the values accepted by a predicate.
#[derive(Clone)]
pub struct FilterOp<S, F> {
  source: S,
  predicate: F,
}

impl<S, F> FilterOp<S, F> {
  pub(crate) fn new(source: S, predicate: F) -> Self { Self { source, predicate } }
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for FilterOp<S, F>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, FilterObserver<O, F>>,
  F: FnMut(&Item) -> bool,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(FilterObserver { observer, predicate: self.predicate })
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for FilterOp<S, F>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  type Scope = S::Scope;
}

pub struct FilterObserver<O, F> {
  observer: O,
  predicate: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for FilterObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  #[inline]
  fn next(&mut self, value: Item) {
    if (self.predicate)(&value) {
      self.observer.next(value)
    }
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxclock_macro::test]
  fn keeps_matching_values() {
    let mut out = vec![];
    observable::from_iter(0..10)
      .filter(|v| v % 3 == 0)
      .subscribe(|v| out.push(v));
    assert_eq!(out, vec![0, 3, 6, 9]);
  }

  #[rxclock_macro::test]
  fn completion_passes_through() {
    let mut completed = false;
    observable::from_iter(0..3)
      .filter(|_| false)
      .subscribe_complete(|_| {}, || completed = true);
    assert!(completed);
  }
}
