//! Infrastructure errors.
//!
//! Stream errors travel through the `Err` type parameter of each observable;
//! the types here only cover failures of the machinery that drives streams,
//! such as handing a task to an executor.

use futures::task::SpawnError;
use thiserror::Error;

/// Failure to schedule a task.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SchedulerError {
  /// The executor refused the task, usually because it is shutting down.
  #[error("executor refused task: {0}")]
  Spawn(#[from] SpawnError),
}

impl SchedulerError {
  /// Returns a short stable label (snake_case) for use in logs.
  pub fn as_label(&self) -> &'static str {
    match self {
      SchedulerError::Spawn(_) => "scheduler_spawn",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxclock_macro::test]
  fn spawn_error_label_and_message() {
    let err = SchedulerError::from(SpawnError::shutdown());
    assert_eq!(err.as_label(), "scheduler_spawn");
    assert!(err.to_string().starts_with("executor refused task"));
  }
}
