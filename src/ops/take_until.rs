use crate::{
  observable::{Observable, ObservableExt, ScopeOf},
  observer::{Notification, Observer},
  ops::downstream::{Downstream, DownstreamSubscription},
  rc::{RcDeref, RcDerefMut},
  scope::{JoinScope, Joined, Scope, ScopeSubscription},
  subscription::{IntoBoxedSubscription, Subscription},
  type_hint::TypeHint,
};

/// Forwards source values until `notifier` emits its first value, then
/// completes. An error from either side is forwarded; completion of the
/// notifier alone changes nothing.
///
/// The notifier is subscribed before the source, so a notifier that fires
/// synchronously ends the stream before the source is subscribed at all.
/// Once the stream ends, both the source and the notifier are unsubscribed.
pub struct TakeUntilOp<S, N, NItem> {
  source: S,
  notifier: N,
  _hint: TypeHint<NItem>,
}

impl<S, N, NItem> TakeUntilOp<S, N, NItem> {
  pub(crate) fn new(source: S, notifier: N) -> Self {
    Self { source, notifier, _hint: TypeHint::new() }
  }
}

impl<S: Clone, N: Clone, NItem> Clone for TakeUntilOp<S, N, NItem> {
  fn clone(&self) -> Self {
    Self { source: self.source.clone(), notifier: self.notifier.clone(), _hint: TypeHint::new() }
  }
}

type UntilCell<Sc, O, Item, Err> =
  <Sc as Scope>::RcMut<Downstream<O, Item, Err, ScopeSubscription<Sc>, ()>>;

type CellOf<T, O, Item, Err> = UntilCell<ScopeOf<T, Item, Err>, O, Item, Err>;

impl<Item, Err, O, S, N, NItem> Observable<Item, Err, O> for TakeUntilOp<S, N, NItem>
where
  O: Observer<Item, Err>,
  Self: ObservableExt<Item, Err>,
  S: Observable<Item, Err, TakeUntilSource<CellOf<Self, O, Item, Err>>>,
  N: Observable<NItem, Err, TakeUntilNotifier<CellOf<Self, O, Item, Err>>>,
  S::Unsub: IntoBoxedSubscription<ScopeSubscription<ScopeOf<Self, Item, Err>>>,
  N::Unsub: IntoBoxedSubscription<ScopeSubscription<ScopeOf<Self, Item, Err>>>,
{
  type Unsub = DownstreamSubscription<CellOf<Self, O, Item, Err>>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let cell: CellOf<Self, O, Item, Err> = From::from(Downstream::new(observer, ()));
    let notifier = self.notifier.actual_subscribe(TakeUntilNotifier(cell.clone()));
    Downstream::add_upstream(&cell, notifier.into_boxed());
    if !cell.rc_deref().is_terminated() {
      let source = self.source.actual_subscribe(TakeUntilSource(cell.clone()));
      Downstream::add_upstream(&cell, source.into_boxed());
    }
    DownstreamSubscription::new(cell)
  }
}

impl<Item, Err, S, N, NItem> ObservableExt<Item, Err> for TakeUntilOp<S, N, NItem>
where
  S: ObservableExt<Item, Err>,
  N: ObservableExt<NItem, Err>,
  S::Scope: JoinScope<N::Scope>,
{
  type Scope = Joined<S::Scope, N::Scope>;
}

/// Forwards source events to the shared downstream.
pub struct TakeUntilSource<P>(P);

impl<P, O, Item, Err, U> Observer<Item, Err> for TakeUntilSource<P>
where
  P: RcDerefMut<Target = Downstream<O, Item, Err, U, ()>>,
  O: Observer<Item, Err>,
  U: Subscription,
{
  fn next(&mut self, value: Item) {
    Downstream::emit_with(&self.0, |_| Some(Notification::Next(value)));
  }

  fn error(self, err: Err) { Downstream::emit_with(&self.0, |_| Some(Notification::Error(err))); }

  fn complete(self) { Downstream::emit_with(&self.0, |_| Some(Notification::Complete)); }

  fn is_closed(&self) -> bool { self.0.rc_deref().is_closed() }
}

/// Ends the shared downstream when the notifier fires.
pub struct TakeUntilNotifier<P>(P);

impl<P, O, Item, NItem, Err, U> Observer<NItem, Err> for TakeUntilNotifier<P>
where
  P: RcDerefMut<Target = Downstream<O, Item, Err, U, ()>>,
  O: Observer<Item, Err>,
  U: Subscription,
{
  fn next(&mut self, _: NItem) { Downstream::emit_with(&self.0, |_| Some(Notification::Complete)); }

  fn error(self, err: Err) { Downstream::emit_with(&self.0, |_| Some(Notification::Error(err))); }

  fn complete(self) {}

  fn is_closed(&self) -> bool { self.0.rc_deref().is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use crate::prelude::*;

  #[rxclock_macro::test]
  fn stops_when_notifier_fires() {
    let source = LocalSubject::<i32, Infallible>::new();
    let stop = LocalSubject::<(), Infallible>::new();
    let out = Rc::new(RefCell::new(vec![]));
    let completed = Rc::new(RefCell::new(false));
    let (c_out, c_completed) = (out.clone(), completed.clone());

    let handle = source
      .clone()
      .take_until(stop.clone())
      .subscribe_complete(move |v| c_out.borrow_mut().push(v), move || *c_completed.borrow_mut() = true);

    source.next(1);
    source.next(2);
    stop.next(());
    source.next(3);

    assert_eq!(*out.borrow(), vec![1, 2]);
    assert!(*completed.borrow());
    assert!(handle.is_closed());
    assert_eq!(source.subscriber_count(), 0);
    assert_eq!(stop.subscriber_count(), 0);
  }

  #[rxclock_macro::test]
  fn notifier_completion_is_not_a_stop_signal() {
    let source = LocalSubject::<i32, Infallible>::new();
    let stop = LocalSubject::<(), Infallible>::new();
    let out = Rc::new(RefCell::new(vec![]));
    let c_out = out.clone();
    source
      .clone()
      .take_until(stop.clone())
      .subscribe(move |v| c_out.borrow_mut().push(v));

    stop.complete();
    source.next(7);
    assert_eq!(*out.borrow(), vec![7]);
  }

  #[rxclock_macro::test]
  fn synchronous_notifier_ends_before_source() {
    let mut out = vec![];
    let mut completed = false;
    observable::from_iter(0..3)
      .take_until(observable::of(()))
      .subscribe_complete(|v| out.push(v), || completed = true);
    assert!(out.is_empty());
    assert!(completed);
  }

  #[rxclock_macro::test]
  fn stop_fired_from_inside_the_callback() {
    let source = LocalSubject::<i32, Infallible>::new();
    let stop = LocalSubject::<(), Infallible>::new();
    let out = Rc::new(RefCell::new(vec![]));
    let (c_out, c_stop) = (out.clone(), stop.clone());
    let handle = source.clone().take_until(stop.clone()).subscribe(move |v| {
      c_out.borrow_mut().push(v);
      if v == 2 {
        c_stop.next(());
      }
    });

    source.next(1);
    source.next(2);
    source.next(3);

    assert_eq!(*out.borrow(), vec![1, 2]);
    assert!(handle.is_closed());
    assert_eq!(source.subscriber_count(), 0);
    assert_eq!(stop.subscriber_count(), 0);
  }

  #[rxclock_macro::test]
  fn shared_stop_fired_from_inside_the_callback() {
    let source = SharedSubject::<i32, Infallible>::new();
    let stop = SharedSubject::<(), Infallible>::new();
    let out = std::sync::Arc::new(std::sync::Mutex::new(vec![]));
    let (c_out, c_stop) = (out.clone(), stop.clone());
    source.clone().take_until(stop.clone()).subscribe(move |v| {
      c_out.lock().unwrap().push(v);
      if v == 2 {
        c_stop.next(());
      }
    });

    source.next(1);
    source.next(2);
    source.next(3);

    assert_eq!(*out.lock().unwrap(), vec![1, 2]);
    assert_eq!(source.subscriber_count(), 0);
  }

  #[rxclock_macro::test]
  fn closing_the_handle_detaches_both_sides() {
    let source = LocalSubject::<i32, Infallible>::new();
    let stop = LocalSubject::<(), Infallible>::new();
    let handle = source.clone().take_until(stop.clone()).subscribe(|_| {});
    assert_eq!((source.subscriber_count(), stop.subscriber_count()), (1, 1));

    handle.close();
    assert_eq!((source.subscriber_count(), stop.subscriber_count()), (0, 0));
  }

  #[rxclock_macro::test]
  fn source_error_detaches_the_notifier() {
    let source = LocalSubject::<i32, &'static str>::new();
    let stop = LocalSubject::<(), &'static str>::new();
    let errors = Rc::new(RefCell::new(vec![]));
    let c_errors = errors.clone();
    source
      .clone()
      .take_until(stop.clone())
      .subscribe_err(|_| {}, move |e| c_errors.borrow_mut().push(e));

    source.error("boom");
    assert_eq!(*errors.borrow(), vec!["boom"]);
    assert_eq!(stop.subscriber_count(), 0);
  }
}
