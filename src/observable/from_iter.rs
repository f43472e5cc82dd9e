use std::convert::Infallible;

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  scope::SharedScope,
};

/// Creates an observable that emits every item of `iter` in order and then
/// completes.
///
/// Emission is synchronous; it stops early when the observer closes, for
/// example because a downstream `take_while` completed it.
///
/// ```rust
/// use rxclock::prelude::*;
///
/// let mut sum = 0;
/// observable::from_iter(0..10).subscribe(|v| sum += v);
/// assert_eq!(sum, 45);
/// ```
pub fn from_iter<I: IntoIterator>(iter: I) -> ObservableIter<I> { ObservableIter(iter) }

#[derive(Clone)]
pub struct ObservableIter<I>(I);

impl<I, O> Observable<I::Item, Infallible, O> for ObservableIter<I>
where
  I: IntoIterator,
  O: Observer<I::Item, Infallible>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    for v in self.0 {
      if observer.is_closed() {
        return;
      }
      observer.next(v);
    }
    if !observer.is_closed() {
      observer.complete();
    }
  }
}

impl<I: IntoIterator> ObservableExt<I::Item, Infallible> for ObservableIter<I> {
  type Scope = SharedScope;
}
