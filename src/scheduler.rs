//! Scheduling of time-driven tasks.
//!
//! A [`Task`] is a piece of state plus a step function. A scheduler runs the
//! step after an initial delay; the step reports whether the task is done or
//! wants to run again after some duration. Real-time schedulers are the
//! `futures` executors (behind the `timer` feature); [`TestScheduler`] runs
//! tasks against virtual time.

mod test_scheduler;

use std::{future::Future, time::Duration};

use futures::{
  executor::LocalSpawner,
  future::{AbortHandle, Abortable},
  task::LocalSpawnExt,
  FutureExt,
};
pub use test_scheduler::TestScheduler;

use crate::{
  error::SchedulerError,
  subscription::{ClosedFlag, Subscription},
};

/// What a task wants after one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
  Finished,
  /// Run the step again after the given duration.
  Sleeping(Duration),
}

/// State plus the step function that advances it.
pub struct Task<S> {
  state: S,
  step: fn(&mut S) -> TaskState,
}

impl<S> Task<S> {
  pub fn new(state: S, step: fn(&mut S) -> TaskState) -> Self { Self { state, step } }

  #[inline]
  pub fn step(&mut self) -> TaskState { (self.step)(&mut self.state) }

  pub fn state(&self) -> &S { &self.state }
}

/// Cancellation handle of a scheduled task.
///
/// Closed once the task finished or was cancelled. Cancelling aborts the
/// underlying future when the scheduler spawned one.
#[derive(Clone, Default)]
pub struct TaskHandle {
  closed: ClosedFlag,
  abort: Option<AbortHandle>,
}

impl TaskHandle {
  pub(crate) fn new() -> Self { Self::default() }

  pub(crate) fn with_abort(abort: AbortHandle) -> Self {
    Self { closed: ClosedFlag::default(), abort: Some(abort) }
  }

  /// A handle for a task that never ran.
  pub fn finished() -> Self {
    let handle = Self::new();
    handle.closed.close();
    handle
  }

  pub(crate) fn mark_finished(&self) { self.closed.close(); }

  pub fn cancel(&self) {
    self.closed.close();
    if let Some(abort) = &self.abort {
      abort.abort();
    }
  }

  #[inline]
  pub fn is_closed(&self) -> bool { self.closed.is_closed() }
}

impl Subscription for TaskHandle {
  #[inline]
  fn unsubscribe(self) { self.cancel() }

  #[inline]
  fn is_closed(&self) -> bool { self.closed.is_closed() }
}

/// Runs tasks of type `T` after a delay.
pub trait Scheduler<T> {
  fn schedule(&self, task: T, delay: Duration) -> Result<TaskHandle, SchedulerError>;
}

/// Runs a future to completion on an executor.
///
/// The returned handle closes when the future finished; cancelling it drops
/// the future at its next suspension point.
pub trait FutureSpawner<F> {
  fn spawn_future(&self, future: F) -> Result<TaskHandle, SchedulerError>;
}

fn abortable_future<F: Future<Output = ()>>(
  future: F,
) -> (TaskHandle, impl Future<Output = ()>) {
  let (abort, registration) = AbortHandle::new_pair();
  let handle = TaskHandle::with_abort(abort);
  let done = handle.clone();
  let future = Abortable::new(future, registration).map(move |_| done.mark_finished());
  (handle, future)
}

impl<F> FutureSpawner<F> for LocalSpawner
where
  F: Future<Output = ()> + 'static,
{
  fn spawn_future(&self, future: F) -> Result<TaskHandle, SchedulerError> {
    let (handle, future) = abortable_future(future);
    self.spawn_local(future)?;
    Ok(handle)
  }
}

#[cfg(feature = "futures-scheduler")]
impl<F> FutureSpawner<F> for futures::executor::ThreadPool
where
  F: Future<Output = ()> + Send + 'static,
{
  fn spawn_future(&self, future: F) -> Result<TaskHandle, SchedulerError> {
    use futures::task::SpawnExt;

    let (handle, future) = abortable_future(future);
    self.spawn(future)?;
    Ok(handle)
  }
}

#[cfg(feature = "timer")]
mod timer {
  use std::time::Duration;

  use futures::{
    executor::LocalSpawner,
    future::{AbortHandle, Abortable},
    task::LocalSpawnExt,
    FutureExt,
  };
  use tracing::trace;

  use super::{Scheduler, Task, TaskHandle, TaskState};
  use crate::error::SchedulerError;

  async fn run<S>(mut task: Task<S>, mut delay: Duration, handle: TaskHandle) {
    loop {
      if !delay.is_zero() {
        futures_time::task::sleep(delay.into()).await;
      }
      if handle.is_closed() {
        trace!("task cancelled while sleeping");
        break;
      }
      match task.step() {
        TaskState::Finished => break,
        TaskState::Sleeping(next) => delay = next,
      }
    }
    handle.mark_finished();
  }

  fn abortable<S>(task: Task<S>, delay: Duration) -> (TaskHandle, Abortable<impl std::future::Future<Output = ()>>) {
    let (abort, registration) = AbortHandle::new_pair();
    let handle = TaskHandle::with_abort(abort);
    let future = Abortable::new(run(task, delay, handle.clone()), registration);
    (handle, future)
  }

  impl<S: 'static> Scheduler<Task<S>> for LocalSpawner {
    fn schedule(&self, task: Task<S>, delay: Duration) -> Result<TaskHandle, SchedulerError> {
      let (handle, future) = abortable(task, delay);
      self.spawn_local(future.map(|_| ()))?;
      Ok(handle)
    }
  }

  #[cfg(feature = "futures-scheduler")]
  impl<S: Send + 'static> Scheduler<Task<S>> for futures::executor::ThreadPool {
    fn schedule(&self, task: Task<S>, delay: Duration) -> Result<TaskHandle, SchedulerError> {
      use futures::task::SpawnExt;

      let (handle, future) = abortable(task, delay);
      self.spawn(future.map(|_| ()))?;
      Ok(handle)
    }
  }
}
