use std::{
  convert::Infallible,
  future::Future,
  pin::Pin,
  task::{Context, Poll},
};

use futures::ready;
use tracing::error;

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  scheduler::{FutureSpawner, TaskHandle},
  scope::SharedScope,
};

/// Creates an observable that emits the output of `future` once it resolves,
/// then completes.
///
/// Every subscription spawns the future on `spawner`; closing the
/// subscription before it resolves drops the future.
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use futures::executor::LocalPool;
/// use rxclock::prelude::*;
///
/// let mut pool = LocalPool::new();
/// let out = Rc::new(RefCell::new(vec![]));
/// let c_out = out.clone();
/// observable::from_future(async { 42 }, pool.spawner())
///   .subscribe(move |v| c_out.borrow_mut().push(v));
///
/// pool.run();
/// assert_eq!(*out.borrow(), vec![42]);
/// ```
pub fn from_future<F, Sp>(future: F, spawner: Sp) -> FromFuture<F, Sp>
where
  F: Future,
{
  FromFuture { future, spawner }
}

#[derive(Clone)]
pub struct FromFuture<F, Sp> {
  future: F,
  spawner: Sp,
}

impl<F, Sp, O> Observable<F::Output, Infallible, O> for FromFuture<F, Sp>
where
  F: Future,
  O: Observer<F::Output, Infallible>,
  Sp: FutureSpawner<EmitOutput<F, O>>,
{
  type Unsub = TaskHandle;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let emission = EmitOutput { future: Box::pin(self.future), observer: Some(observer) };
    match self.spawner.spawn_future(emission) {
      Ok(handle) => handle,
      Err(err) => {
        error!(error_type = err.as_label(), error = %err, "could not spawn future");
        TaskHandle::finished()
      }
    }
  }
}

impl<F: Future, Sp> ObservableExt<F::Output, Infallible> for FromFuture<F, Sp> {
  type Scope = SharedScope;
}

/// Drives `F` and hands its output to the observer.
pub struct EmitOutput<F, O> {
  future: Pin<Box<F>>,
  observer: Option<O>,
}

impl<F, O> Unpin for EmitOutput<F, O> {}

impl<F, O> Future for EmitOutput<F, O>
where
  F: Future,
  O: Observer<F::Output, Infallible>,
{
  type Output = ();

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
    if self.observer.as_ref().is_none_or(|o| o.is_closed()) {
      return Poll::Ready(());
    }
    let value = ready!(self.future.as_mut().poll(cx));
    if let Some(mut observer) = self.observer.take() {
      observer.next(value);
      observer.complete();
    }
    Poll::Ready(())
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use futures::executor::LocalPool;

  use crate::prelude::*;

  #[rxclock_macro::test]
  fn emits_the_output_then_completes() {
    let mut pool = LocalPool::new();
    let out = Rc::new(RefCell::new(vec![]));
    let completed = Rc::new(RefCell::new(false));
    let (c_out, c_completed) = (out.clone(), completed.clone());
    let handle = observable::from_future(async { "ready" }, pool.spawner())
      .subscribe_complete(move |v| c_out.borrow_mut().push(v), move || *c_completed.borrow_mut() = true);

    assert!(out.borrow().is_empty());
    pool.run();
    assert_eq!(*out.borrow(), vec!["ready"]);
    assert!(*completed.borrow());
    assert!(handle.is_closed());
  }

  #[rxclock_macro::test]
  fn closing_first_drops_the_future() {
    let mut pool = LocalPool::new();
    let out = Rc::new(RefCell::new(vec![]));
    let c_out = out.clone();
    let handle = observable::from_future(futures::future::pending::<i32>(), pool.spawner())
      .subscribe(move |v| c_out.borrow_mut().push(v));

    handle.close();
    pool.run();
    assert!(out.borrow().is_empty());
  }

  #[rxclock_macro::test]
  fn joins_other_operators() {
    let mut pool = LocalPool::new();
    let out = Rc::new(RefCell::new(vec![]));
    let c_out = out.clone();
    observable::from_future(async { 2 }, pool.spawner())
      .switch_map(|n| observable::from_iter(0..n))
      .map(|v| v * 10)
      .subscribe(move |v| c_out.borrow_mut().push(v));

    pool.run();
    assert_eq!(*out.borrow(), vec![0, 10]);
  }
}
