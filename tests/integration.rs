//! Integration tests for rxclock.
//!
//! Covers end-to-end subject behavior, operator chains and the clock-face
//! pipeline driven by virtual time.

use std::{
  cell::RefCell,
  convert::Infallible,
  rc::Rc,
  time::{Duration, UNIX_EPOCH},
};

use chrono::Utc;
use proptest::prelude::*;
use rxclock::{clock::clock_faces, prelude::*};

#[derive(Debug, PartialEq, Clone)]
enum Event<T, E> {
  Next(T),
  Error(E),
  Complete,
}

fn record<T: 'static, E: 'static>() -> (Rc<RefCell<Vec<Event<T, E>>>>, Callbacks<'static, T, E>) {
  let log = Rc::new(RefCell::new(Vec::new()));
  let (next, error, complete) = (log.clone(), log.clone(), log.clone());
  let callbacks = Callbacks::new()
    .on_next(move |v| next.borrow_mut().push(Event::Next(v)))
    .on_error(move |e| error.borrow_mut().push(Event::Error(e)))
    .on_complete(move || complete.borrow_mut().push(Event::Complete));
  (log, callbacks)
}

#[rxclock_macro::test]
fn subject_delivers_sequence_then_one_completion() {
  let subject = LocalSubject::<i32, String>::new();
  let (log, observer) = record();
  subject.clone().subscribe_with(observer);

  for v in [3, 1, 4] {
    subject.next(v);
  }
  subject.clone().complete();
  subject.clone().complete();
  subject.next(5);

  assert_eq!(
    *log.borrow(),
    vec![Event::Next(3), Event::Next(1), Event::Next(4), Event::Complete]
  );
}

#[rxclock_macro::test]
fn late_subscriber_gets_only_the_terminal_event() {
  let completed = LocalSubject::<i32, String>::new();
  completed.next(1);
  completed.clone().complete();
  let (log, observer) = record();
  let handle = completed.clone().subscribe_with(observer);
  assert_eq!(*log.borrow(), vec![Event::Complete]);
  assert!(handle.is_closed());

  let errored = LocalSubject::<i32, String>::new();
  errored.clone().error("lost".to_string());
  let (log, observer) = record();
  errored.as_observable().subscribe_with(observer);
  assert_eq!(*log.borrow(), vec![Event::Error("lost".to_string())]);
}

#[rxclock_macro::test]
fn map_then_filter() {
  let mut out = vec![];
  observable::from_iter([1, 2, 3, 4])
    .map(|x| x * 2)
    .filter(|x| *x > 4)
    .subscribe(|v| out.push(v));
  assert_eq!(out, vec![6, 8]);
}

#[rxclock_macro::test]
fn distinct_until_changed_examples() {
  let mut out = vec![];
  observable::from_iter([1, 1, 2, 2, 2, 3, 1])
    .distinct_until_changed()
    .subscribe(|v| out.push(v));
  assert_eq!(out, vec![1, 2, 3, 1]);
}

#[rxclock_macro::test]
fn self_close_during_fan_out_leaves_others_alone() {
  let subject = LocalSubject::<i32, Infallible>::new();
  let quitter = Rc::new(RefCell::new(vec![]));
  let stayer = Rc::new(RefCell::new(vec![]));
  let own_handle: Rc<RefCell<Option<Box<dyn Fn()>>>> = Rc::new(RefCell::new(None));

  let (c_quitter, c_own) = (quitter.clone(), own_handle.clone());
  let handle = subject.clone().subscribe(move |v| {
    c_quitter.borrow_mut().push(v);
    if let Some(close) = c_own.borrow().as_ref() {
      close();
    }
  });
  let c_handle = handle.clone();
  *own_handle.borrow_mut() = Some(Box::new(move || c_handle.close()));

  let c_stayer = stayer.clone();
  subject.clone().subscribe(move |v| c_stayer.borrow_mut().push(v));

  subject.next(1);
  subject.next(2);
  assert_eq!(*quitter.borrow(), vec![1]);
  assert_eq!(*stayer.borrow(), vec![1, 2]);
}

#[rxclock_macro::test]
fn combine_latest_pairs() {
  let a = LocalSubject::<i32, Infallible>::new();
  let b = LocalSubject::<char, Infallible>::new();
  let out = Rc::new(RefCell::new(vec![]));
  let c_out = out.clone();
  observable::combine_latest(a.clone(), b.clone()).subscribe(move |v| c_out.borrow_mut().push(v));

  a.next(1);
  a.next(2);
  b.next('x');
  a.next(3);
  assert_eq!(*out.borrow(), vec![(2, 'x'), (3, 'x')]);
}

#[rxclock_macro::test]
fn empty_subject_drops_values() {
  let subject = LocalSubject::<i32, Infallible>::new();
  subject.next(5);
  let (log, observer) = record::<i32, Infallible>();
  subject.clone().subscribe_with(observer);
  assert!(log.borrow().is_empty());
}

#[rxclock_macro::test]
fn error_reaches_the_error_callback_once() {
  let mut seen = vec![];
  let mut nexts = 0;
  observable::from_iter(["1", "2", "x", "4"])
    .map_err(|never: Infallible| match never {})
    .try_map(|s| s.parse::<i32>().map_err(|e| e.to_string()))
    .subscribe_err(|_| nexts += 1, |e| seen.push(e));
  assert_eq!(nexts, 2);
  assert_eq!(seen.len(), 1);
}

#[rxclock_macro::test]
fn from_event_with_take_until_timeout() {
  let scheduler = TestScheduler::new();
  let presses = observable::EventEmitter::<char>::new();
  let keys = Rc::new(RefCell::new(String::new()));
  let c_keys = keys.clone();
  let timeout = ClockSource::new(scheduler.clone(), scheduler.clone())
    .with_period(Duration::from_secs(5))
    .ticks();
  observable::from_event(presses.clone())
    .take_until(timeout)
    .subscribe(move |c| c_keys.borrow_mut().push(c));

  presses.emit('h');
  scheduler.advance_by(Duration::from_secs(2));
  presses.emit('i');
  scheduler.advance_by(Duration::from_secs(4));
  presses.emit('!');

  assert_eq!(*keys.borrow(), "hi");
  assert_eq!(presses.listener_count(), 0);
}

#[rxclock_macro::test]
fn clock_faces_unsubscribe_at_midnight() {
  let scheduler = TestScheduler::starting_at(UNIX_EPOCH + Duration::from_secs(86_400 * 3 - 3));
  let ticks = LocalSubject::<(), Infallible>::new();
  let clock = ClockSource::new(scheduler.clone(), scheduler.clone())
    .start(ticks.clone())
    .unwrap();

  let faces = Rc::new(RefCell::new(vec![]));
  let stop: Rc<RefCell<Option<Box<dyn Fn()>>>> = Rc::new(RefCell::new(None));
  let (c_faces, c_stop) = (faces.clone(), stop.clone());
  let handle = clock_faces(ticks.clone().box_it(), scheduler.clone(), Utc).subscribe(move |face| {
    let midnight = face == "Midnight";
    c_faces.borrow_mut().push(face);
    if midnight {
      if let Some(stop) = c_stop.borrow().as_ref() {
        stop();
      }
    }
  });
  let c_handle = handle.clone();
  *stop.borrow_mut() = Some(Box::new(move || c_handle.close()));

  scheduler.advance_by(Duration::from_secs(10));

  assert_eq!(*faces.borrow(), vec!["23:59:58", "23:59:59", "Midnight"]);
  assert!(handle.is_closed());
  assert!(ticks.is_empty());
  assert!(clock.is_running());
  clock.stop();
}

#[cfg(all(feature = "timer", feature = "futures-scheduler"))]
#[rxclock_macro::test]
async fn shared_subject_ticks_on_a_thread_pool() {
  use futures::{channel::mpsc, executor::ThreadPool, StreamExt};

  let subject = SharedSubject::<(), Infallible>::new();
  let (tx, rx) = mpsc::unbounded();
  subject.clone().subscribe(move |_| {
    let _ = tx.unbounded_send(());
  });

  let clock = ClockSource::new(SystemClock, ThreadPool::new().unwrap())
    .with_period(Duration::from_millis(20))
    .start(subject.clone())
    .unwrap();

  let ticks: Vec<()> = rx.take(3).collect().await;
  assert_eq!(ticks.len(), 3);
  clock.stop();
  assert!(!clock.is_running());
}

proptest! {
  #[test]
  fn subject_fans_out_identically(values in proptest::collection::vec(any::<i16>(), 0..32), observers in 1usize..5) {
    let subject = LocalSubject::<i16, Infallible>::new();
    let logs: Vec<_> = (0..observers)
      .map(|_| {
        let (log, observer) = record::<i16, Infallible>();
        subject.clone().subscribe_with(observer);
        log
      })
      .collect();

    for v in &values {
      subject.next(*v);
    }
    subject.clone().complete();

    let mut expected: Vec<_> = values.iter().copied().map(Event::Next).collect();
    expected.push(Event::Complete);
    for log in logs {
      prop_assert_eq!(&*log.borrow(), &expected);
    }
  }

  #[test]
  fn distinct_until_changed_is_dedup_and_idempotent(values in proptest::collection::vec(0u8..4, 0..48)) {
    let mut once = vec![];
    observable::from_iter(values.clone())
      .distinct_until_changed()
      .subscribe(|v| once.push(v));
    let mut twice = vec![];
    observable::from_iter(values.clone())
      .distinct_until_changed()
      .distinct_until_changed()
      .subscribe(|v| twice.push(v));

    let mut expected = values;
    expected.dedup();
    prop_assert_eq!(&once, &expected);
    prop_assert_eq!(&twice, &expected);
  }

  #[test]
  fn map_filter_matches_iterators(values in proptest::collection::vec(-100i32..100, 0..48)) {
    let mut out = vec![];
    observable::from_iter(values.clone())
      .map(|x| x * 3)
      .filter(|x| x % 2 == 0)
      .subscribe(|v| out.push(v));
    let expected: Vec<i32> = values.into_iter().map(|x| x * 3).filter(|x| x % 2 == 0).collect();
    prop_assert_eq!(out, expected);
  }
}
