//! Subscription handles.
//!
//! A [`Subscription`] is the teardown side of one attachment between an
//! observable and an observer. Operators return whatever concrete
//! subscription type their sources produce; `subscribe` wraps the result in
//! a [`SubscriptionHandle`] that the caller can clone, share and close.

mod boxed;
mod dynamic;
mod handle;

pub use boxed::*;
pub use dynamic::*;
pub use handle::*;

/// Teardown of one active attachment.
pub trait Subscription {
  /// Detach the observer and release the resources owned by the attachment.
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;
}

/// Unit subscription: nothing to tear down, always closed.
///
/// Returned by sources that finish synchronously, such as `of`.
impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<U: Subscription> Subscription for Option<U> {
  fn unsubscribe(self) {
    if let Some(inner) = self {
      inner.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(Subscription::is_closed) }
}

impl<U: Subscription> Subscription for Vec<U> {
  fn unsubscribe(self) {
    for inner in self {
      inner.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.iter().all(Subscription::is_closed) }
}
