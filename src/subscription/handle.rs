use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use super::Subscription;
use crate::rc::{MutArc, RcDerefMut};

/// One-way `open -> closed` flag shared between a subscriber and its handle.
#[derive(Clone, Default, Debug)]
pub struct ClosedFlag(Arc<AtomicBool>);

impl ClosedFlag {
  /// Marks the flag closed. Returns `true` if this call closed it.
  #[inline]
  pub fn close(&self) -> bool { !self.0.swap(true, Ordering::AcqRel) }

  #[inline]
  pub fn is_closed(&self) -> bool { self.0.load(Ordering::Acquire) }
}

/// The caller-facing result of `subscribe`.
///
/// Cloning the handle shares it: closing any clone closes the attachment.
/// Closing is idempotent and may happen from inside the observer's own
/// callbacks. The handle also becomes closed when the stream terminates on
/// its own; dropping it does not close anything.
pub struct SubscriptionHandle<U> {
  closed: ClosedFlag,
  upstream: MutArc<Option<U>>,
}

impl<U> Clone for SubscriptionHandle<U> {
  fn clone(&self) -> Self { Self { closed: self.closed.clone(), upstream: self.upstream.clone() } }
}

impl<U: Subscription> SubscriptionHandle<U> {
  pub(crate) fn new(closed: ClosedFlag, upstream: U) -> Self {
    Self { closed, upstream: MutArc::own(Some(upstream)) }
  }

  /// Stops delivery to the observer and tears down everything upstream.
  pub fn close(&self) {
    self.closed.close();
    let upstream = self.upstream.rc_deref_mut().take();
    if let Some(upstream) = upstream {
      upstream.unsubscribe();
    }
  }

  #[inline]
  pub fn is_closed(&self) -> bool { self.closed.is_closed() }
}

impl<U: Subscription> Subscription for SubscriptionHandle<U> {
  #[inline]
  fn unsubscribe(self) { self.close() }

  #[inline]
  fn is_closed(&self) -> bool { self.closed.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::Cell, rc::Rc};

  use super::*;

  struct CountingSubscription(Rc<Cell<usize>>);

  impl Subscription for CountingSubscription {
    fn unsubscribe(self) { self.0.set(self.0.get() + 1) }

    fn is_closed(&self) -> bool { self.0.get() > 0 }
  }

  #[rxclock_macro::test]
  fn flag_closes_once() {
    let flag = ClosedFlag::default();
    assert!(!flag.is_closed());
    assert!(flag.close());
    assert!(!flag.close());
    assert!(flag.is_closed());
  }

  #[rxclock_macro::test]
  fn close_is_idempotent_across_clones() {
    let count = Rc::new(Cell::new(0));
    let handle = SubscriptionHandle::new(ClosedFlag::default(), CountingSubscription(count.clone()));
    let other = handle.clone();
    assert!(!other.is_closed());

    handle.close();
    handle.close();
    other.unsubscribe();

    assert!(handle.is_closed());
    assert_eq!(count.get(), 1);
  }

  #[rxclock_macro::test]
  fn shared_flag_reports_self_termination() {
    let flag = ClosedFlag::default();
    let handle = SubscriptionHandle::new(flag.clone(), ());
    flag.close();
    assert!(handle.is_closed());
  }
}
