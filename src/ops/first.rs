use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

/// Forwards the first value of the source and completes.
#[derive(Clone)]
pub struct FirstOp<S>(S);

impl<S> FirstOp<S> {
  pub(crate) fn new(source: S) -> Self { Self(source) }
}

impl<Item, Err, O, S> Observable<Item, Err, O> for FirstOp<S>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, FirstObserver<O>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.0.actual_subscribe(FirstObserver(Some(observer)))
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for FirstOp<S>
where
  S: ObservableExt<Item, Err>,
{
  type Scope = S::Scope;
}

pub struct FirstObserver<O>(Option<O>);

impl<Item, Err, O> Observer<Item, Err> for FirstObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(mut observer) = self.0.take() {
      observer.next(value);
      observer.complete();
    }
  }

  fn error(self, err: Err) {
    if let Some(observer) = self.0 {
      observer.error(err);
    }
  }

  fn complete(self) {
    if let Some(observer) = self.0 {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.0.as_ref().is_none_or(Observer::is_closed) }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxclock_macro::test]
  fn only_first_value() {
    let mut out = vec![];
    let mut completed = false;
    observable::from_iter(5..9)
      .first()
      .subscribe_complete(|v| out.push(v), || completed = true);
    assert_eq!(out, vec![5]);
    assert!(completed);
  }

  #[rxclock_macro::test]
  fn empty_source_just_completes() {
    let mut hits = 0;
    let mut completed = false;
    observable::from_iter(Vec::<u8>::new())
      .first()
      .subscribe_complete(|_| hits += 1, || completed = true);
    assert_eq!(hits, 0);
    assert!(completed);
  }
}
