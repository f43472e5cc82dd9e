//! Awaiting the end of a stream.
//!
//! [`ObservableExt::into_future`] subscribes right away and returns an
//! [`ObservableFuture`] that resolves once the stream terminates:
//!
//! - completion after values resolves with `Ok(Some(last))`;
//! - completion without a value resolves with `Ok(None)`;
//! - an error resolves with `Err(err)`.
//!
//! Values pushed before the future is polled are not lost; the future only
//! keeps the last one. Dropping the future closes the subscription.
//!
//! ```rust
//! use rxclock::prelude::*;
//!
//! let last = futures::executor::block_on(observable::from_iter([1, 2, 3]).into_future());
//! assert_eq!(last, Ok(Some(3)));
//! ```
//!
//! [`ObservableExt::into_future`]: crate::observable::ObservableExt::into_future

use std::{
  future::Future,
  pin::Pin,
  task::{Context, Poll, Waker},
};

use tracing::trace;

use crate::{
  observer::Observer,
  rc::{MutArc, RcDeref, RcDerefMut},
  subscription::Subscription,
};

/// Outcome shared between the observer and the future.
pub(crate) struct FutureState<Item, Err> {
  last: Option<Item>,
  result: Option<Result<Option<Item>, Err>>,
  waker: Option<Waker>,
}

/// Records the last value and the terminal event for an [`ObservableFuture`].
pub struct IntoFutureObserver<Item, Err> {
  state: MutArc<FutureState<Item, Err>>,
}

impl<Item, Err> IntoFutureObserver<Item, Err> {
  pub(crate) fn new() -> Self {
    Self { state: MutArc::own(FutureState { last: None, result: None, waker: None }) }
  }

  pub(crate) fn shared(&self) -> MutArc<FutureState<Item, Err>> { self.state.clone() }

  fn finish(&self, result: Result<Option<Item>, Err>) {
    let waker = {
      let mut state = self.state.rc_deref_mut();
      state.result = Some(result);
      state.waker.take()
    };
    if let Some(waker) = waker {
      waker.wake();
    }
  }
}

impl<Item, Err> Observer<Item, Err> for IntoFutureObserver<Item, Err> {
  fn next(&mut self, value: Item) { self.state.rc_deref_mut().last = Some(value); }

  fn error(self, err: Err) { self.finish(Err(err)); }

  fn complete(self) {
    let last = self.state.rc_deref_mut().last.take();
    self.finish(Ok(last));
  }

  fn is_closed(&self) -> bool { self.state.rc_deref().result.is_some() }
}

/// Future returned by `into_future`; owns the subscription it waits on.
pub struct ObservableFuture<Item, Err, U: Subscription> {
  state: MutArc<FutureState<Item, Err>>,
  subscription: Option<U>,
}

impl<Item, Err, U: Subscription> ObservableFuture<Item, Err, U> {
  pub(crate) fn new(state: MutArc<FutureState<Item, Err>>, subscription: U) -> Self {
    Self { state, subscription: Some(subscription) }
  }
}

impl<Item, Err, U: Subscription> Future for ObservableFuture<Item, Err, U> {
  type Output = Result<Option<Item>, Err>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let mut state = self.state.rc_deref_mut();
    match state.result.take() {
      Some(result) => Poll::Ready(result),
      None => {
        state.waker = Some(cx.waker().clone());
        Poll::Pending
      }
    }
  }
}

impl<Item, Err, U: Subscription> Drop for ObservableFuture<Item, Err, U> {
  fn drop(&mut self) {
    if let Some(subscription) = self.subscription.take() {
      if !subscription.is_closed() {
        trace!("observable future dropped before the stream ended");
      }
      subscription.unsubscribe();
    }
  }
}

#[cfg(test)]
mod tests {
  use std::convert::Infallible;

  use futures::{executor::LocalPool, task::LocalSpawnExt, FutureExt};

  use crate::prelude::*;

  #[rxclock_macro::test]
  async fn resolves_with_the_last_value() {
    assert_eq!(observable::from_iter([1, 2, 3]).into_future().await, Ok(Some(3)));
    assert_eq!(observable::from_iter(Vec::<i32>::new()).into_future().await, Ok(None));
  }

  #[rxclock_macro::test]
  async fn resolves_with_the_error() {
    let source = LocalSubject::<i32, &'static str>::new();
    let future = source.clone().into_future();
    source.next(1);
    source.error("boom");
    assert_eq!(future.await, Err("boom"));
  }

  #[rxclock_macro::test]
  fn waits_for_completion() {
    let mut pool = LocalPool::new();
    let source = LocalSubject::<i32, Infallible>::new();
    let result = std::rc::Rc::new(std::cell::RefCell::new(None));
    let c_result = result.clone();
    pool
      .spawner()
      .spawn_local(source.clone().into_future().map(move |v| *c_result.borrow_mut() = Some(v)))
      .unwrap();

    source.next(4);
    pool.run_until_stalled();
    assert!(result.borrow().is_none());

    source.next(5);
    source.clone().complete();
    pool.run_until_stalled();
    assert_eq!(*result.borrow(), Some(Ok(Some(5))));
  }

  #[rxclock_macro::test]
  fn dropping_the_future_unsubscribes() {
    let source = LocalSubject::<i32, Infallible>::new();
    let future = source.clone().into_future();
    assert_eq!(source.subscriber_count(), 1);
    drop(future);
    assert_eq!(source.subscriber_count(), 0);
  }
}
