//! Local and shared scopes.
//!
//! Operators that join several sources keep their state in one shared cell
//! and store the type-erased subscriptions of their inputs in it. A scope
//! picks both: [`LocalScope`] uses `MutRc` and [`BoxedSubscription`], so
//! non-`Send` sources such as [`LocalSubject`] can take part, while
//! [`SharedScope`] uses `MutArc` and [`BoxedSubscriptionSend`], so the
//! resulting adapters can be handed to a [`SharedSubject`].
//!
//! Every observable names its scope through [`ObservableExt::Scope`].
//! Joining two scopes yields the shared one only when both are shared.
//!
//! [`LocalSubject`]: crate::subject::LocalSubject
//! [`SharedSubject`]: crate::subject::SharedSubject
//! [`ObservableExt::Scope`]: crate::observable::ObservableExt::Scope

use crate::{
  rc::{MutArc, MutRc, RcDerefMut},
  subscription::{BoxedSubscription, BoxedSubscriptionSend, Subscription},
};

pub trait Scope {
  /// Shared mutable cell for operator state.
  type RcMut<T>: From<T> + Clone + RcDerefMut<Target = T>;

  /// Type-erased subscription stored inside operator state.
  type BoxedSubscription: Subscription;
}

/// Single-threaded scope.
pub struct LocalScope;

/// Thread-safe scope.
pub struct SharedScope;

impl Scope for LocalScope {
  type RcMut<T> = MutRc<T>;
  type BoxedSubscription = BoxedSubscription;
}

impl Scope for SharedScope {
  type RcMut<T> = MutArc<T>;
  type BoxedSubscription = BoxedSubscriptionSend;
}

/// The scope of a chain fed by sources of two scopes.
pub trait JoinScope<Other: Scope>: Scope {
  type Output: Scope;
}

impl<Other: Scope> JoinScope<Other> for LocalScope {
  type Output = LocalScope;
}

impl JoinScope<LocalScope> for SharedScope {
  type Output = LocalScope;
}

impl JoinScope<SharedScope> for SharedScope {
  type Output = SharedScope;
}

/// `A` joined with `B`.
pub type Joined<A, B> = <A as JoinScope<B>>::Output;

/// The erased subscription type of scope `Sc`.
pub type ScopeSubscription<Sc> = <Sc as Scope>::BoxedSubscription;

#[cfg(test)]
mod tests {
  use std::any::TypeId;

  use super::*;

  fn joined<A: JoinScope<B>, B: Scope>() -> TypeId
  where
    Joined<A, B>: 'static,
  {
    TypeId::of::<Joined<A, B>>()
  }

  #[rxclock_macro::test]
  fn shared_only_when_both_are_shared() {
    assert_eq!(joined::<SharedScope, SharedScope>(), TypeId::of::<SharedScope>());
    assert_eq!(joined::<SharedScope, LocalScope>(), TypeId::of::<LocalScope>());
    assert_eq!(joined::<LocalScope, SharedScope>(), TypeId::of::<LocalScope>());
    assert_eq!(joined::<LocalScope, LocalScope>(), TypeId::of::<LocalScope>());
  }

  #[rxclock_macro::test]
  fn scope_cell_is_shared_between_clones() {
    let cell: <LocalScope as Scope>::RcMut<i32> = From::from(1);
    let other = cell.clone();
    *other.rc_deref_mut() += 1;
    assert_eq!(*crate::rc::RcDeref::rc_deref(&cell), 2);
  }
}
