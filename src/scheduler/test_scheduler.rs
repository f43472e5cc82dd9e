//! Virtual-time scheduler for deterministic tests.
//!
//! Time only moves when [`TestScheduler::advance_by`] or
//! [`TestScheduler::flush`] is called, and due tasks run synchronously inside
//! those calls. Clones share one clock and one queue.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use rxclock::prelude::*;
//!
//! let scheduler = TestScheduler::new();
//! let handle = scheduler
//!   .schedule(Task::new((), |_| TaskState::Finished), Duration::from_millis(100))
//!   .unwrap();
//!
//! scheduler.advance_by(Duration::from_millis(99));
//! assert!(!handle.is_closed());
//! scheduler.advance_by(Duration::from_millis(1));
//! assert!(handle.is_closed());
//! ```

use std::{
  cmp::Ordering,
  collections::BinaryHeap,
  time::{Duration, SystemTime, UNIX_EPOCH},
};

use super::{Scheduler, Task, TaskHandle, TaskState};
use crate::{
  clock::TimeSource,
  error::SchedulerError,
  rc::{MutRc, RcDeref, RcDerefMut},
};

struct TestSchedulerState {
  start: SystemTime,
  elapsed: Duration,
  task_queue: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
}

struct ScheduledTask {
  scheduled_time: Duration,
  task_id: usize,
  task: Box<dyn FnMut() -> TaskState>,
  handle: TaskHandle,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool {
    self.scheduled_time == other.scheduled_time && self.task_id == other.task_id
  }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by task_id
    other
      .scheduled_time
      .cmp(&self.scheduled_time)
      .then_with(|| other.task_id.cmp(&self.task_id))
  }
}

/// A scheduler and time source driven by virtual time.
#[derive(Clone)]
pub struct TestScheduler {
  state: MutRc<TestSchedulerState>,
}

impl Default for TestScheduler {
  fn default() -> Self { Self::new() }
}

impl TestScheduler {
  /// A scheduler whose clock starts at the Unix epoch.
  pub fn new() -> Self { Self::starting_at(UNIX_EPOCH) }

  pub fn starting_at(start: SystemTime) -> Self {
    Self {
      state: MutRc::own(TestSchedulerState {
        start,
        elapsed: Duration::ZERO,
        task_queue: BinaryHeap::new(),
        next_task_id: 0,
      }),
    }
  }

  /// Virtual time passed since the start.
  pub fn elapsed(&self) -> Duration { self.state.rc_deref().elapsed }

  pub fn pending_count(&self) -> usize { self.state.rc_deref().task_queue.len() }

  /// Advances virtual time by `duration`, running every task that falls due
  /// on the way in time order.
  pub fn advance_by(&self, duration: Duration) {
    let target_time = self.elapsed() + duration;
    self.execute_tasks_until(Some(target_time));
    self.state.rc_deref_mut().elapsed = target_time;
  }

  /// Runs tasks until the queue is empty, jumping time to each one.
  ///
  /// Does not return while a task keeps rescheduling itself.
  pub fn flush(&self) { self.execute_tasks_until(None); }

  fn execute_tasks_until(&self, target_time: Option<Duration>) {
    loop {
      let next = {
        let mut state = self.state.rc_deref_mut();
        let should_stop = state
          .task_queue
          .peek()
          .is_none_or(|peek| target_time.is_some_and(|limit| peek.scheduled_time > limit));
        if should_stop {
          None
        } else {
          let scheduled = state.task_queue.pop();
          if let Some(scheduled) = &scheduled {
            state.elapsed = scheduled.scheduled_time;
          }
          scheduled
        }
      };
      let Some(mut scheduled) = next else { break };
      if scheduled.handle.is_closed() {
        continue;
      }

      match (scheduled.task)() {
        TaskState::Finished => scheduled.handle.mark_finished(),
        TaskState::Sleeping(delay) => {
          let mut state = self.state.rc_deref_mut();
          scheduled.scheduled_time = state.elapsed + delay;
          scheduled.task_id = state.next_task_id;
          state.next_task_id += 1;
          state.task_queue.push(scheduled);
        }
      }
    }
  }
}

impl<S: 'static> Scheduler<Task<S>> for TestScheduler {
  fn schedule(&self, mut task: Task<S>, delay: Duration) -> Result<TaskHandle, SchedulerError> {
    let handle = TaskHandle::new();
    let mut state = self.state.rc_deref_mut();
    let task_id = state.next_task_id;
    state.next_task_id += 1;
    let scheduled_time = state.elapsed + delay;
    state.task_queue.push(ScheduledTask {
      scheduled_time,
      task_id,
      task: Box::new(move || task.step()),
      handle: handle.clone(),
    });
    Ok(handle)
  }
}

impl TimeSource for TestScheduler {
  fn now(&self) -> SystemTime { self.state.rc_deref().start + self.elapsed() }
}
