use std::convert::Infallible;

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  scope::SharedScope,
};

/// Creates an observable producing a single value.
///
/// Emits the value and completes synchronously during `subscribe`; the
/// returned handle is already closed.
///
/// ```rust
/// use rxclock::prelude::*;
///
/// let mut got = None;
/// let handle = observable::of(42).subscribe(|v| got = Some(v));
/// assert_eq!(got, Some(42));
/// assert!(handle.is_closed());
/// ```
pub fn of<Item>(v: Item) -> ObservableOf<Item> { ObservableOf(v) }

#[derive(Clone)]
pub struct ObservableOf<Item>(Item);

impl<Item, O> Observable<Item, Infallible, O> for ObservableOf<Item>
where
  O: Observer<Item, Infallible>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    if observer.is_closed() {
      return;
    }
    observer.next(self.0);
    observer.complete();
  }
}

impl<Item> ObservableExt<Item, Infallible> for ObservableOf<Item> {
  type Scope = SharedScope;
}
