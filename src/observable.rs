//! Observable trait and the operator surface.
//!
//! An observable is a passive description of how to produce events. Nothing
//! happens until [`ObservableExt::subscribe_with`] (or one of its closure
//! shorthands) hands it an observer. Every operator wraps the downstream
//! observer in an adapter and subscribes its source with that adapter, so a
//! chain of operators subscribes upstream one stage at a time and returns the
//! source's subscription.

mod boxed;
mod create;
mod from_event;
mod from_future;
mod from_iter;
mod of;

pub use boxed::*;
pub use create::*;
pub use from_event::*;
pub use from_future::*;
pub use from_iter::*;
pub use of::*;

pub use crate::ops::combine_latest::{combine_latest, combine_latest_all};
use crate::{
  observer::{NextOnly, Observer, ObserverFns, ignore_complete, log_unhandled},
  ops::{
    combine_latest::CombineLatestOp,
    distinct_until_changed::DistinctUntilChangedOp,
    filter::FilterOp,
    first::FirstOp,
    into_future::{IntoFutureObserver, ObservableFuture},
    map::MapOp,
    map_err::MapErrOp,
    switch_map::SwitchMapOp,
    take_until::TakeUntilOp,
    take_while::TakeWhileOp,
    try_map::TryMapOp,
  },
  scope::Scope,
  subscriber::Subscriber,
  subscription::{ClosedFlag, Subscription, SubscriptionHandle},
};

/// A source of `Item`s that may fail with `Err`, subscribable by `O`.
///
/// The observer type is a trait parameter so each operator can demand
/// exactly the adapter type it builds for its source.
pub trait Observable<Item, Err, O> {
  type Unsub: Subscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub;
}

/// The [`Scope`] of observable `S`.
pub type ScopeOf<S, Item, Err> = <S as ObservableExt<Item, Err>>::Scope;

/// Handle returned by subscribing `O` to `S`.
pub type HandleOf<S, Item, Err, O> =
  SubscriptionHandle<<S as Observable<Item, Err, Subscriber<O>>>::Unsub>;

/// Operators and subscription entry points shared by every observable.
///
/// Each observable type implements this trait for exactly one `Item` / `Err`
/// pair, which is how those types flow from a source through the chain.
pub trait ObservableExt<Item, Err>: Sized {
  /// Whether the chain is single-threaded or may cross threads; operators
  /// that join sources build their shared state for this scope.
  type Scope: Scope;

  /// Forwards `f(v)` for every value.
  ///
  /// ```rust
  /// use std::{cell::RefCell, rc::Rc};
  ///
  /// use rxclock::prelude::*;
  ///
  /// let out = Rc::new(RefCell::new(vec![]));
  /// let c_out = out.clone();
  /// observable::from_iter([1, 2, 3, 4])
  ///   .map(|v| v * 2)
  ///   .filter(|v| *v > 4)
  ///   .subscribe(move |v| c_out.borrow_mut().push(v));
  /// assert_eq!(*out.borrow(), vec![6, 8]);
  /// ```
  #[inline]
  fn map<B, F>(self, f: F) -> MapOp<Self, F, Item>
  where
    F: FnMut(Item) -> B,
  {
    MapOp::new(self, f)
  }

  /// Fallible `map`: an `Err` returned by `f` is forwarded downstream as the
  /// stream's error and the adapter stops accepting values.
  #[inline]
  fn try_map<B, F>(self, f: F) -> TryMapOp<Self, F, Item>
  where
    F: FnMut(Item) -> Result<B, Err>,
  {
    TryMapOp::new(self, f)
  }

  /// Converts the error type.
  #[inline]
  fn map_err<E2, F>(self, f: F) -> MapErrOp<Self, F, Err>
  where
    F: FnOnce(Err) -> E2,
  {
    MapErrOp::new(self, f)
  }

  /// Forwards only the values for which `predicate` returns `true`.
  #[inline]
  fn filter<F>(self, predicate: F) -> FilterOp<Self, F>
  where
    F: FnMut(&Item) -> bool,
  {
    FilterOp::new(self, predicate)
  }

  /// Drops values equal to the last forwarded one.
  ///
  /// The memory of the last value is per subscription.
  #[inline]
  fn distinct_until_changed(self) -> DistinctUntilChangedOp<Self>
  where
    Item: PartialEq + Clone,
  {
    DistinctUntilChangedOp::new(self)
  }

  /// Forwards values while `predicate` holds, then completes.
  #[inline]
  fn take_while<F>(self, predicate: F) -> TakeWhileOp<Self, F>
  where
    F: FnMut(&Item) -> bool,
  {
    TakeWhileOp::new(self, predicate)
  }

  /// Forwards values until `notifier` emits, then completes.
  #[inline]
  fn take_until<N, NItem>(self, notifier: N) -> TakeUntilOp<Self, N, NItem>
  where
    N: ObservableExt<NItem, Err>,
  {
    TakeUntilOp::new(self, notifier)
  }

  /// Forwards the first value, then completes.
  #[inline]
  fn first(self) -> FirstOp<Self> { FirstOp::new(self) }

  /// Emits `binary_op(a, b)` with the latest value of each source once both
  /// have emitted, and again on every later value from either.
  #[inline]
  fn combine_latest<Other, OtherItem, F, Out>(
    self, other: Other, binary_op: F,
  ) -> CombineLatestOp<Self, Other, F, Item, OtherItem>
  where
    Other: ObservableExt<OtherItem, Err>,
    F: FnMut(Item, OtherItem) -> Out,
  {
    CombineLatestOp::new(self, other, binary_op)
  }

  /// Maps every value to an inner observable and forwards the values of the
  /// most recent one only.
  ///
  /// A new outer value unsubscribes the previous inner observable. The stream
  /// completes once the outer source and the current inner observable have
  /// both completed; an error from either ends it.
  ///
  /// ```rust
  /// use std::convert::Infallible;
  ///
  /// use rxclock::prelude::*;
  ///
  /// let outer = LocalSubject::<i32, Infallible>::new();
  /// let inner = LocalSubject::<i32, Infallible>::new();
  /// let out = std::rc::Rc::new(std::cell::RefCell::new(vec![]));
  /// let (c_out, c_inner) = (out.clone(), inner.clone());
  /// outer
  ///   .clone()
  ///   .switch_map(move |base| c_inner.clone().map(move |v| base + v))
  ///   .subscribe(move |v| c_out.borrow_mut().push(v));
  ///
  /// outer.next(10);
  /// inner.next(1);
  /// outer.next(20);
  /// inner.next(2);
  /// assert_eq!(*out.borrow(), vec![11, 22]);
  /// assert_eq!(inner.subscriber_count(), 1);
  /// ```
  #[inline]
  fn switch_map<Out, F>(self, f: F) -> SwitchMapOp<Self, F, Item>
  where
    F: FnMut(Item) -> Out,
  {
    SwitchMapOp::new(self, f)
  }

  /// Subscribes and resolves with the last value once the stream completes.
  ///
  /// The future yields `Ok(None)` for a stream that completed without a
  /// value and `Err` for one that errored. Dropping the future unsubscribes.
  fn into_future(
    self,
  ) -> ObservableFuture<Item, Err, HandleOf<Self, Item, Err, IntoFutureObserver<Item, Err>>>
  where
    Self: Observable<Item, Err, Subscriber<IntoFutureObserver<Item, Err>>>,
  {
    let observer = IntoFutureObserver::new();
    let state = observer.shared();
    ObservableFuture::new(state, self.subscribe_with(observer))
  }

  /// Applies a stage function to this observable.
  ///
  /// Stages are plain functions from one observable to another, so reusable
  /// pipelines can be named and chained:
  ///
  /// ```rust
  /// use std::{cell::RefCell, rc::Rc};
  ///
  /// use rxclock::prelude::*;
  ///
  /// let out = Rc::new(RefCell::new(vec![]));
  /// let c_out = out.clone();
  /// observable::from_iter([1, 1, 2, 2, 3])
  ///   .pipe(|s| s.distinct_until_changed())
  ///   .pipe(|s| s.map(|v: i32| v * 10))
  ///   .subscribe(move |v| c_out.borrow_mut().push(v));
  /// assert_eq!(*out.borrow(), vec![10, 20, 30]);
  /// ```
  #[inline]
  fn pipe<R>(self, stage: impl FnOnce(Self) -> R) -> R { stage(self) }

  /// Erases the concrete operator chain behind a boxed observable.
  fn box_it<'a>(self) -> BoxObservable<'a, Item, Err>
  where
    Self: DynObservable<'a, Item, Err> + 'a,
  {
    BoxObservable::new(self)
  }

  /// Subscribes an observer and returns the caller's handle.
  ///
  /// If the stream already terminated while subscribing (synchronous
  /// sources, finished subjects), the returned handle is closed and its
  /// teardown has run.
  fn subscribe_with<O>(self, observer: O) -> HandleOf<Self, Item, Err, O>
  where
    O: Observer<Item, Err>,
    Self: Observable<Item, Err, Subscriber<O>>,
  {
    let closed = ClosedFlag::default();
    let upstream = self.actual_subscribe(Subscriber::new(observer, closed.clone()));
    let handle = SubscriptionHandle::new(closed, upstream);
    if handle.is_closed() {
      handle.close();
    }
    handle
  }

  /// Subscribes with a `next` callback; errors are logged, completion is
  /// ignored.
  fn subscribe<N>(self, next: N) -> HandleOf<Self, Item, Err, NextOnly<N, Err>>
  where
    N: FnMut(Item),
    Self: Observable<Item, Err, Subscriber<NextOnly<N, Err>>>,
  {
    self.subscribe_with(NextOnly::<N, Err>::next_only(next))
  }

  fn subscribe_err<N, E>(self, next: N, error: E) -> HandleOf<Self, Item, Err, ObserverFns<N, E, fn()>>
  where
    N: FnMut(Item),
    E: FnOnce(Err),
    Self: Observable<Item, Err, Subscriber<ObserverFns<N, E, fn()>>>,
  {
    self.subscribe_with(ObserverFns::new(next, error, ignore_complete as fn()))
  }

  fn subscribe_complete<N, C>(
    self, next: N, complete: C,
  ) -> HandleOf<Self, Item, Err, ObserverFns<N, fn(Err), C>>
  where
    N: FnMut(Item),
    C: FnOnce(),
    Self: Observable<Item, Err, Subscriber<ObserverFns<N, fn(Err), C>>>,
  {
    self.subscribe_with(ObserverFns::new(next, log_unhandled::<Err> as fn(Err), complete))
  }

  fn subscribe_all<N, E, C>(
    self, next: N, error: E, complete: C,
  ) -> HandleOf<Self, Item, Err, ObserverFns<N, E, C>>
  where
    N: FnMut(Item),
    E: FnOnce(Err),
    C: FnOnce(),
    Self: Observable<Item, Err, Subscriber<ObserverFns<N, E, C>>>,
  {
    self.subscribe_with(ObserverFns::new(next, error, complete))
  }
}
