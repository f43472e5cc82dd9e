//! # rxclock: push-based reactive streams
//!
//! Observables describe how to produce values; nothing runs until an
//! [`Observer`] subscribes. Operators such as `map`, `filter`,
//! `distinct_until_changed` and `combine_latest` wrap the downstream
//! observer and subscribe their source with it, so every value runs through
//! the whole pipeline synchronously on the caller's stack.
//!
//! Joining operators (`take_until`, `combine_latest`, `switch_map`) deliver
//! to their observer outside of any lock, so callbacks may push into the
//! inputs of the same chain; such events are queued and delivered in order.
//! `from_future` and `into_future` bridge between streams and futures.
//!
//! ```rust
//! use std::convert::Infallible;
//!
//! use rxclock::prelude::*;
//!
//! let subject = LocalSubject::<i32, Infallible>::new();
//! let out = std::rc::Rc::new(std::cell::RefCell::new(vec![]));
//! let c_out = out.clone();
//! let handle = subject
//!   .as_observable()
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 10)
//!   .subscribe(move |v| c_out.borrow_mut().push(v));
//!
//! subject.next(1);
//! subject.next(2);
//! handle.close();
//! subject.next(4);
//! assert_eq!(*out.borrow(), vec![20]);
//! ```
//!
//! A [`Subject`] multicasts to all of its observers. [`ClockSource`] drives
//! a subject (or any observer) from wall-clock period boundaries, and
//! [`clock_faces`](clock::clock_faces) turns those ticks into `HH:MM:SS`
//! strings.
//!
//! ## Feature Flags
//!
//! - **`timer`** (default): real-time scheduling on `futures` executors via
//!   `futures-time`.
//! - **`futures-scheduler`** (default): `ThreadPool` support.
//!
//! [`Observer`]: observer::Observer
//! [`Subject`]: subject::Subject
//! [`ClockSource`]: clock::ClockSource

pub mod clock;
pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod scope;
pub mod subject;
pub mod subscriber;
pub mod subscription;
pub mod type_hint;
