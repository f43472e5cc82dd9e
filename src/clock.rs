//! Wall-clock ticks and the clock-face pipeline built on them.
//!
//! [`ClockSource`] schedules a task that calls `next(())` on every period
//! boundary of the wall clock. It can drive a subject ([`ClockSource::start`],
//! one timer shared by all of the subject's observers) or act as a cold
//! observable ([`ClockSource::ticks`], one timer per subscription).
//!
//! [`clock_faces`] turns ticks into `HH:MM:SS` strings, emitting each second
//! once and `Midnight` at `00:00:00`.

use std::{
  convert::Infallible,
  fmt::Display,
  time::{Duration, SystemTime, UNIX_EPOCH},
};

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, error, trace, warn};

use crate::{
  error::SchedulerError,
  observable::{BoxObservable, Observable, ObservableExt},
  observer::Observer,
  scheduler::{Scheduler, Task, TaskHandle, TaskState},
  scope::SharedScope,
  subscription::Subscription,
};

/// Tick period used unless [`ClockSource::with_period`] says otherwise.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

/// Where the current wall-clock time comes from.
pub trait TimeSource {
  fn now(&self) -> SystemTime;
}

/// The operating system clock.
#[derive(Clone, Copy, Default, Debug)]
pub struct SystemClock;

impl TimeSource for SystemClock {
  #[inline]
  fn now(&self) -> SystemTime { SystemTime::now() }
}

/// Emits `()` on every period boundary of `time`, timed by `scheduler`.
#[derive(Clone)]
pub struct ClockSource<T, Sch> {
  time: T,
  scheduler: Sch,
  period: Duration,
}

impl<T, Sch> ClockSource<T, Sch> {
  pub fn new(time: T, scheduler: Sch) -> Self { Self { time, scheduler, period: DEFAULT_PERIOD } }

  /// Sets the tick period. A zero period is ignored.
  pub fn with_period(mut self, period: Duration) -> Self {
    if period.is_zero() {
      warn!(period_ms = millis(self.period), "zero clock period ignored");
    } else {
      self.period = period;
    }
    self
  }

  pub fn period(&self) -> Duration { self.period }
}

impl<T: TimeSource + Clone, Sch> ClockSource<T, Sch> {
  /// Starts ticking into `observer`, typically a subject.
  ///
  /// The task runs until the handle is stopped or the observer is closed.
  /// Dropping the handle does not stop it.
  pub fn start<O>(&self, observer: O) -> Result<ClockHandle, SchedulerError>
  where
    O: Observer<(), Infallible>,
    Sch: Scheduler<Task<Ticker<T, O>>>,
  {
    let delay = delay_to_boundary(self.time.now(), self.period);
    let ticker = Ticker { time: self.time.clone(), period: self.period, observer: Some(observer) };
    let task = self.scheduler.schedule(Task::new(ticker, tick::<T, O>), delay)?;
    debug!(
      period_ms = millis(self.period),
      first_tick_ms = millis(delay),
      "clock started"
    );
    Ok(ClockHandle { task })
  }

  /// A cold observable: every subscription starts its own timer.
  pub fn ticks(&self) -> Ticks<T, Sch>
  where
    Sch: Clone,
  {
    Ticks(self.clone())
  }
}

/// State of a running clock task.
pub struct Ticker<T, O> {
  time: T,
  period: Duration,
  observer: Option<O>,
}

fn tick<T, O>(ticker: &mut Ticker<T, O>) -> TaskState
where
  T: TimeSource,
  O: Observer<(), Infallible>,
{
  let Some(observer) = ticker.observer.as_mut() else {
    return TaskState::Finished;
  };
  if !observer.is_closed() {
    trace!("tick");
    observer.next(());
  }
  if observer.is_closed() {
    debug!("clock observer closed; stopping");
    ticker.observer = None;
    return TaskState::Finished;
  }
  TaskState::Sleeping(delay_to_boundary(ticker.time.now(), ticker.period))
}

/// Stops a clock started with [`ClockSource::start`].
#[derive(Clone)]
pub struct ClockHandle {
  task: TaskHandle,
}

impl ClockHandle {
  pub fn stop(&self) {
    if self.is_running() {
      debug!("clock stopped");
    }
    self.task.cancel();
  }

  pub fn is_running(&self) -> bool { !self.task.is_closed() }
}

impl Subscription for ClockHandle {
  fn unsubscribe(self) { self.stop() }

  fn is_closed(&self) -> bool { self.task.is_closed() }
}

/// Cold tick observable returned by [`ClockSource::ticks`].
#[derive(Clone)]
pub struct Ticks<T, Sch>(ClockSource<T, Sch>);

impl<T, Sch, O> Observable<(), Infallible, O> for Ticks<T, Sch>
where
  O: Observer<(), Infallible>,
  T: TimeSource + Clone,
  Sch: Scheduler<Task<Ticker<T, O>>>,
{
  type Unsub = TaskHandle;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    match self.0.start(observer) {
      Ok(handle) => handle.task,
      Err(err) => {
        error!(error_type = err.as_label(), error = %err, "could not schedule clock ticks");
        TaskHandle::finished()
      }
    }
  }
}

impl<T, Sch> ObservableExt<(), Infallible> for Ticks<T, Sch> {
  type Scope = SharedScope;
}

/// Whole milliseconds of `d`, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 { u64::try_from(d.as_millis()).unwrap_or(u64::MAX) }

/// Time left until the next multiple of `period` since the Unix epoch.
///
/// Exactly on a boundary this is a full period, so a tick never fires twice
/// for the same boundary.
pub fn delay_to_boundary(now: SystemTime, period: Duration) -> Duration {
  let period_nanos = period.as_nanos();
  if period_nanos == 0 {
    return Duration::ZERO;
  }
  let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
  let left = period_nanos - since_epoch % period_nanos;
  Duration::from_nanos(u64::try_from(left).unwrap_or(u64::MAX))
}

/// Rounds to the nearest tenth of a second, halves rounding up.
pub fn round_to_tenth(t: SystemTime) -> SystemTime {
  let millis = t.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
  let rounded = (millis + 50) / 100 * 100;
  UNIX_EPOCH + Duration::from_millis(u64::try_from(rounded).unwrap_or(u64::MAX))
}

pub fn is_whole_second(t: &SystemTime) -> bool {
  t.duration_since(UNIX_EPOCH).is_ok_and(|d| d.subsec_millis() == 0)
}

/// `HH:MM:SS`, or `Midnight` at `00:00:00`.
pub fn clock_face<Tz>(t: &DateTime<Tz>) -> String
where
  Tz: TimeZone,
  Tz::Offset: Display,
{
  let face = t.format("%H:%M:%S").to_string();
  if face == "00:00:00" { "Midnight".to_string() } else { face }
}

/// Clock faces for every distinct second seen on `ticks`, in zone `tz`.
///
/// Each tick samples `time`; samples that do not round to a whole second are
/// dropped and a face equal to the previous one is not repeated.
pub fn clock_faces<T, Tz>(
  ticks: BoxObservable<'static, (), Infallible>, time: T, tz: Tz,
) -> BoxObservable<'static, String, Infallible>
where
  T: TimeSource + 'static,
  Tz: TimeZone + 'static,
  Tz::Offset: Display,
{
  ticks
    .map(move |_| time.now())
    .map(round_to_tenth)
    .filter(is_whole_second)
    .map(move |t| clock_face(&DateTime::<Utc>::from(t).with_timezone(&tz)))
    .distinct_until_changed()
    .box_it()
}
