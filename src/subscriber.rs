use tracing::{debug, trace};

use crate::{observer::Observer, subscription::ClosedFlag};

/// The outermost observer of every subscription.
///
/// Wraps the user's observer together with the [`ClosedFlag`] shared with the
/// caller's [`SubscriptionHandle`](crate::subscription::SubscriptionHandle).
/// It enforces the event protocol: nothing is delivered once the flag is
/// set, and a terminal event sets it.
pub struct Subscriber<O> {
  observer: O,
  closed: ClosedFlag,
}

impl<O> Subscriber<O> {
  pub(crate) fn new(observer: O, closed: ClosedFlag) -> Self { Self { observer, closed } }
}

impl<Item, Err, O> Observer<Item, Err> for Subscriber<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.closed.is_closed() {
      trace!("subscription closed; dropping value");
      return;
    }
    self.observer.next(value);
  }

  fn error(self, err: Err) {
    if self.closed.close() {
      self.observer.error(err);
    } else {
      debug!("error delivered to a closed subscription; ignored");
    }
  }

  fn complete(self) {
    if self.closed.close() {
      self.observer.complete();
    } else {
      debug!("completion delivered to a closed subscription; ignored");
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.closed.is_closed() || self.observer.is_closed() }
}
