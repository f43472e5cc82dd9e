use super::Subscription;

/// Helper trait for calling unsubscribe on boxed trait objects
///
/// `Subscription::unsubscribe(self)` requires `Sized`, so `Box<dyn ...>`
/// goes through this trait instead.
pub trait BoxedSubscriptionInner {
  fn boxed_unsubscribe(self: Box<Self>);
  fn boxed_is_closed(&self) -> bool;
}

impl<T: Subscription> BoxedSubscriptionInner for T {
  #[inline]
  fn boxed_unsubscribe(self: Box<Self>) { (*self).unsubscribe() }

  #[inline]
  fn boxed_is_closed(&self) -> bool { self.is_closed() }
}

/// Type-erased subscription, used by [`BoxObservable`] and anywhere
/// heterogeneous subscriptions are stored together.
///
/// Subscriptions are owned control handles, so the boxed value is `'static`
/// even when the observable it came from borrows data.
///
/// [`BoxObservable`]: crate::observable::BoxObservable
pub struct BoxedSubscription(Box<dyn BoxedSubscriptionInner>);

impl BoxedSubscription {
  #[inline]
  pub fn new(subscription: impl Subscription + 'static) -> Self { Self(Box::new(subscription)) }
}

/// Type-erased subscription that can be torn down from another thread.
pub struct BoxedSubscriptionSend(Box<dyn BoxedSubscriptionInner + Send>);

impl BoxedSubscriptionSend {
  #[inline]
  pub fn new(subscription: impl Subscription + Send + 'static) -> Self {
    Self(Box::new(subscription))
  }
}

/// Conversion into one of the boxed subscription types.
///
/// Generic code names the target through [`Scope::BoxedSubscription`] and
/// lets the bound decide whether the source subscription must be `Send`.
///
/// [`Scope::BoxedSubscription`]: crate::scope::Scope::BoxedSubscription
pub trait IntoBoxedSubscription<Target> {
  fn into_boxed(self) -> Target;
}

impl<T: Subscription + 'static> IntoBoxedSubscription<BoxedSubscription> for T {
  #[inline]
  fn into_boxed(self) -> BoxedSubscription { BoxedSubscription::new(self) }
}

impl<T: Subscription + Send + 'static> IntoBoxedSubscription<BoxedSubscriptionSend> for T {
  #[inline]
  fn into_boxed(self) -> BoxedSubscriptionSend { BoxedSubscriptionSend::new(self) }
}

impl Subscription for BoxedSubscription {
  #[inline]
  fn unsubscribe(self) { self.0.boxed_unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.boxed_is_closed() }
}

impl Subscription for BoxedSubscriptionSend {
  #[inline]
  fn unsubscribe(self) { self.0.boxed_unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.boxed_is_closed() }
}
