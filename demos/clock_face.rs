//! Prints the local time once a second and stops at midnight.
//!
//! Run with `RUST_LOG=rxclock=debug` to see the clock's diagnostics.

use std::{cell::RefCell, convert::Infallible, rc::Rc};

use chrono::Local;
use futures::executor::LocalPool;
use rxclock::{clock::clock_faces, prelude::*};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), SchedulerError> {
  tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

  let mut pool = LocalPool::new();
  let ticks = LocalSubject::<(), Infallible>::new();
  let clock = ClockSource::new(SystemClock, pool.spawner()).start(ticks.clone())?;

  let teardown: Rc<RefCell<Option<Box<dyn Fn()>>>> = Rc::new(RefCell::new(None));
  let c_teardown = teardown.clone();
  let handle = clock_faces(ticks.clone().box_it(), SystemClock, Local).subscribe(move |face| {
    println!("{face}");
    if face == "Midnight" {
      if let Some(teardown) = c_teardown.borrow().as_ref() {
        teardown();
      }
    }
  });

  let c_clock = clock.clone();
  *teardown.borrow_mut() = Some(Box::new(move || {
    handle.close();
    c_clock.stop();
  }));

  pool.run();
  Ok(())
}
