//! Everything needed to build and consume streams.

pub use crate::{
  clock::{ClockHandle, ClockSource, SystemClock, TimeSource},
  error::SchedulerError,
  observable::{self, BoxObservable, Observable, ObservableExt},
  observer::{Callbacks, Emitter, Observer},
  ops::into_future::ObservableFuture,
  scheduler::{FutureSpawner, Scheduler, Task, TaskHandle, TaskState, TestScheduler},
  scope::{LocalScope, Scope, SharedScope},
  subject::{LocalSubject, SharedSubject, Subject, SubjectView, Terminal},
  subscription::{Subscription, SubscriptionHandle},
};
