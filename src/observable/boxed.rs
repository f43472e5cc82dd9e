//! Boxed observable for type erasure.
//!
//! Operator chains have long concrete types. `box_it` hides them behind
//! [`BoxObservable`], which is what functions return when they build a
//! pipeline internally.

use crate::{
  observable::{Observable, ObservableExt},
  observer::{BoxedObserver, Observer},
  scope::LocalScope,
  subscription::BoxedSubscription,
};

/// Object-safe observable: subscribes a boxed observer and boxes the
/// resulting subscription.
pub trait DynObservable<'a, Item, Err> {
  fn dyn_subscribe(self: Box<Self>, observer: BoxedObserver<'a, Item, Err>) -> BoxedSubscription;
}

impl<'a, Item, Err, S> DynObservable<'a, Item, Err> for S
where
  S: Observable<Item, Err, BoxedObserver<'a, Item, Err>>,
  S::Unsub: 'static,
{
  fn dyn_subscribe(self: Box<Self>, observer: BoxedObserver<'a, Item, Err>) -> BoxedSubscription {
    BoxedSubscription::new((*self).actual_subscribe(observer))
  }
}

/// Type-erased observable of `Item`s failing with `Err`.
pub struct BoxObservable<'a, Item, Err>(Box<dyn DynObservable<'a, Item, Err> + 'a>);

impl<'a, Item, Err> BoxObservable<'a, Item, Err> {
  pub fn new(source: impl DynObservable<'a, Item, Err> + 'a) -> Self { Self(Box::new(source)) }
}

impl<'a, Item, Err, O> Observable<Item, Err, O> for BoxObservable<'a, Item, Err>
where
  O: Observer<Item, Err> + 'a,
{
  type Unsub = BoxedSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { self.0.dyn_subscribe(Box::new(observer)) }
}

impl<Item, Err> ObservableExt<Item, Err> for BoxObservable<'_, Item, Err> {
  type Scope = LocalScope;
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use crate::prelude::*;

  fn evens(limit: i32) -> BoxObservable<'static, i32, Infallible> {
    observable::from_iter(0..limit).filter(|v| v % 2 == 0).box_it()
  }

  #[rxclock_macro::test]
  fn boxed_chain_behaves_like_the_original() {
    let out = Rc::new(RefCell::new(vec![]));
    let c_out = out.clone();
    let handle = evens(7)
      .map(|v| v + 1)
      .subscribe(move |v| c_out.borrow_mut().push(v));
    assert_eq!(*out.borrow(), vec![1, 3, 5, 7]);
    assert!(handle.is_closed());
  }

  #[rxclock_macro::test]
  fn boxed_subject_keeps_subscription_alive() {
    let subject = LocalSubject::<i32, Infallible>::new();
    let out = Rc::new(RefCell::new(vec![]));
    let c_out = out.clone();
    let handle = subject.clone().box_it().subscribe(move |v| c_out.borrow_mut().push(v));

    subject.next(1);
    handle.close();
    subject.next(2);

    assert_eq!(*out.borrow(), vec![1]);
    assert_eq!(subject.subscriber_count(), 0);
  }
}
