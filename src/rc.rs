//! Shared mutable cells used by subjects, combinators and schedulers.
//!
//! `MutRc` is the single-threaded flavour (`Rc<RefCell<T>>`), `MutArc` the
//! thread-safe one (`Arc<parking_lot::Mutex<T>>`). Both are accessed through
//! [`RcDeref`] / [`RcDerefMut`] so state machines can be written once and
//! instantiated for either flavour.

use std::{
  cell::{Ref, RefCell, RefMut},
  ops::{Deref, DerefMut},
  rc::Rc,
  sync::Arc,
};

use parking_lot::{Mutex, MutexGuard};

pub trait RcDeref {
  type Target;
  type Ref<'a>: Deref<Target = Self::Target>
  where
    Self: 'a;

  fn rc_deref(&self) -> Self::Ref<'_>;
}

pub trait RcDerefMut: RcDeref {
  type RefMut<'a>: DerefMut<Target = Self::Target>
  where
    Self: 'a;

  fn rc_deref_mut(&self) -> Self::RefMut<'_>;
}

#[derive(Default)]
pub struct MutRc<T>(Rc<RefCell<T>>);

#[derive(Default)]
pub struct MutArc<T>(Arc<Mutex<T>>);

impl<T> MutRc<T> {
  pub fn own(t: T) -> Self { Self(Rc::new(RefCell::new(t))) }

  /// Borrows mutably unless the cell is already borrowed, which happens when
  /// the caller re-enters from inside a callback holding the cell.
  pub fn try_rc_deref_mut(&self) -> Option<RefMut<'_, T>> { self.0.try_borrow_mut().ok() }

  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  pub fn try_rc_deref_mut(&self) -> Option<MutexGuard<'_, T>> { self.0.try_lock() }

  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl<T> RcDeref for MutRc<T> {
  type Target = T;
  type Ref<'a>
    = Ref<'a, T>
  where
    Self: 'a;

  #[inline]
  fn rc_deref(&self) -> Self::Ref<'_> { self.0.borrow() }
}

impl<T> RcDerefMut for MutRc<T> {
  type RefMut<'a>
    = RefMut<'a, T>
  where
    Self: 'a;

  #[inline]
  fn rc_deref_mut(&self) -> Self::RefMut<'_> { self.0.borrow_mut() }
}

impl<T> RcDeref for MutArc<T> {
  type Target = T;
  type Ref<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  fn rc_deref(&self) -> Self::Ref<'_> { self.0.lock() }
}

impl<T> RcDerefMut for MutArc<T> {
  type RefMut<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  fn rc_deref_mut(&self) -> Self::RefMut<'_> { self.0.lock() }
}

impl<T> Clone for MutRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> From<T> for MutRc<T> {
  fn from(t: T) -> Self { Self::own(t) }
}

impl<T> From<T> for MutArc<T> {
  fn from(t: T) -> Self { Self::own(t) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxclock_macro::test]
  fn clones_share_state() {
    let a = MutRc::own(1);
    let b = a.clone();
    *b.rc_deref_mut() += 1;
    assert_eq!(*a.rc_deref(), 2);
    assert!(a.ptr_eq(&b));

    let a = MutArc::own(vec![1]);
    let b = a.clone();
    b.rc_deref_mut().push(2);
    assert_eq!(*a.rc_deref(), vec![1, 2]);
  }

  #[rxclock_macro::test]
  fn try_borrow_reports_busy_cell() {
    let cell = MutRc::own(0);
    let held = cell.rc_deref_mut();
    assert!(cell.try_rc_deref_mut().is_none());
    drop(held);
    assert!(cell.try_rc_deref_mut().is_some());

    let cell = MutArc::own(0);
    let held = cell.rc_deref_mut();
    assert!(cell.try_rc_deref_mut().is_none());
    drop(held);
    assert!(cell.try_rc_deref_mut().is_some());
  }
}
