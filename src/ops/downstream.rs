//! Serialized delivery to an observer fed by several upstream sources.
//!
//! Operators that join sources (`take_until`, `combine_latest`,
//! `switch_map`) share one [`Downstream`] cell between their adapters. The
//! cell is locked only to update operator state and to queue events. The
//! downstream observer always runs with the cell unlocked, so it may push
//! into any of the inputs again. Events that arrive while a delivery is
//! running, from the observer's own callbacks or from another thread, are
//! queued and delivered in order by the running call.
//!
//! The cell also owns the subscriptions of the inputs. The first terminal
//! event, or closing the handle returned to the caller, unsubscribes every
//! one of them.

use std::{collections::VecDeque, mem};

use smallvec::SmallVec;
use tracing::trace;

use crate::{
  observer::{Notification, Observer, ResetOnPanic},
  rc::{RcDeref, RcDerefMut},
  subscription::Subscription,
};

/// Observer, operator state `St` and input subscriptions `U` of a joining
/// operator.
pub struct Downstream<O, Item, Err, U, St> {
  observer: Option<O>,
  state: St,
  upstream: SmallVec<[Option<U>; 2]>,
  emitting: bool,
  terminated: bool,
  pending: VecDeque<Notification<Item, Err>>,
}

impl<O, Item, Err, U, St> Downstream<O, Item, Err, U, St> {
  pub(crate) fn new(observer: O, state: St) -> Self {
    Self {
      observer: Some(observer),
      state,
      upstream: SmallVec::new(),
      emitting: false,
      terminated: false,
      pending: VecDeque::new(),
    }
  }

  /// Reserves `n` empty slots for [`Downstream::swap_upstream`].
  pub(crate) fn with_slots(mut self, n: usize) -> Self {
    self.upstream.extend((0..n).map(|_| None));
    self
  }

  pub(crate) fn state(&self) -> &St { &self.state }

  /// `true` once a terminal event was accepted or the caller unsubscribed.
  pub(crate) fn is_terminated(&self) -> bool { self.terminated }

  pub(crate) fn is_closed(&self) -> bool
  where
    O: Observer<Item, Err>,
  {
    self.terminated
      || self
        .observer
        .as_ref()
        .map_or(!self.emitting, Observer::<Item, Err>::is_closed)
  }
}

impl<O, Item, Err, U, St> Downstream<O, Item, Err, U, St>
where
  O: Observer<Item, Err>,
  U: Subscription,
{
  /// Runs `f` on the operator state and delivers the event it returns.
  ///
  /// `f` runs with the cell locked; the observer never does.
  pub(crate) fn emit_with<P, F>(cell: &P, f: F)
  where
    P: RcDerefMut<Target = Self>,
    F: FnOnce(&mut St) -> Option<Notification<Item, Err>>,
  {
    let (mut observer, mut current) = {
      let mut guard = cell.rc_deref_mut();
      let this = &mut *guard;
      if this.terminated {
        return;
      }
      let Some(notification) = f(&mut this.state) else { return };
      if notification.is_terminal() {
        this.terminated = true;
      }
      if this.emitting {
        trace!(queued = this.pending.len() + 1, "delivery in progress; event queued");
        this.pending.push_back(notification);
        return;
      }
      this.emitting = true;
      let observer = this.observer.take();
      (observer, notification)
    };

    let _reset = ResetOnPanic(|| {
      let mut this = cell.rc_deref_mut();
      this.emitting = false;
      this.terminated = true;
      this.pending.clear();
    });
    loop {
      let terminal = current.is_terminal();
      match current {
        Notification::Next(value) => {
          if let Some(observer) = observer.as_mut() {
            observer.next(value);
          }
        }
        Notification::Error(err) => {
          if let Some(observer) = observer.take() {
            observer.error(err);
          }
        }
        Notification::Complete => {
          if let Some(observer) = observer.take() {
            observer.complete();
          }
        }
      }
      if terminal {
        Self::release_upstream(cell);
      }

      let mut this = cell.rc_deref_mut();
      match this.pending.pop_front() {
        Some(next) => current = next,
        None => {
          this.emitting = false;
          if !this.terminated {
            this.observer = observer.take();
          }
          break;
        }
      }
    }
  }

  /// Runs `f` on the operator state unless the downstream terminated.
  pub(crate) fn update<P, R>(cell: &P, f: impl FnOnce(&mut St) -> R) -> Option<R>
  where
    P: RcDerefMut<Target = Self>,
  {
    let mut guard = cell.rc_deref_mut();
    let this = &mut *guard;
    if this.terminated { None } else { Some(f(&mut this.state)) }
  }

  /// Registers the subscription of an input. If the downstream already
  /// terminated the subscription is released at once.
  pub(crate) fn add_upstream<P>(cell: &P, subscription: U)
  where
    P: RcDerefMut<Target = Self>,
  {
    let rejected = {
      let mut this = cell.rc_deref_mut();
      if this.terminated {
        Some(subscription)
      } else {
        this.upstream.push(Some(subscription));
        None
      }
    };
    if let Some(subscription) = rejected {
      trace!("downstream already terminated; input released at once");
      subscription.unsubscribe();
    }
  }

  /// Puts `subscription` into the reserved slot `index` and releases the one
  /// it replaces. When `keep` rejects the current state, or the downstream
  /// terminated, `subscription` itself is released instead.
  pub(crate) fn swap_upstream<P>(
    cell: &P, index: usize, subscription: Option<U>, keep: impl FnOnce(&St) -> bool,
  ) where
    P: RcDerefMut<Target = Self>,
  {
    let released = {
      let mut guard = cell.rc_deref_mut();
      let this = &mut *guard;
      if this.terminated || !keep(&this.state) {
        subscription
      } else {
        mem::replace(&mut this.upstream[index], subscription)
      }
    };
    if let Some(subscription) = released {
      subscription.unsubscribe();
    }
  }

  fn release_upstream<P>(cell: &P)
  where
    P: RcDerefMut<Target = Self>,
  {
    let upstream = mem::take(&mut cell.rc_deref_mut().upstream);
    for subscription in upstream.into_iter().flatten() {
      subscription.unsubscribe();
    }
  }
}

/// Caller-side teardown of a joining operator: drops the observer and
/// unsubscribes every input.
pub struct DownstreamSubscription<P>(P);

impl<P> DownstreamSubscription<P> {
  pub(crate) fn new(cell: P) -> Self { Self(cell) }
}

impl<P, O, Item, Err, U, St> Subscription for DownstreamSubscription<P>
where
  P: RcDerefMut<Target = Downstream<O, Item, Err, U, St>>,
  U: Subscription,
{
  fn unsubscribe(self) {
    let (observer, pending, upstream) = {
      let mut guard = self.0.rc_deref_mut();
      let this = &mut *guard;
      this.terminated = true;
      (this.observer.take(), mem::take(&mut this.pending), mem::take(&mut this.upstream))
    };
    drop((observer, pending));
    for subscription in upstream.into_iter().flatten() {
      subscription.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool {
    let this = self.0.rc_deref();
    this.terminated && this.upstream.is_empty()
  }
}
