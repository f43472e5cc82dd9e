//! Operators.
//!
//! Each operator is a struct holding its source plus configuration, and an
//! adapter observer that the operator wraps around the downstream observer
//! when subscribed. The `ObservableExt` methods are the public way to build
//! them.

pub mod combine_latest;
pub mod distinct_until_changed;
pub mod downstream;
pub mod filter;
pub mod first;
pub mod into_future;
pub mod map;
pub mod map_err;
pub mod switch_map;
pub mod take_until;
pub mod take_while;
pub mod try_map;
