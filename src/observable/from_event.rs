//! Bridging external event targets into observables.
//!
//! An [`EventTarget`] is anything a listener can be attached to and later
//! detached from. [`from_event`] turns such a target into an observable that
//! emits every event as `next` and never completes; closing the subscription
//! detaches the listener. [`EventEmitter`] is a small in-process target.

use std::{collections::VecDeque, convert::Infallible};

use smallvec::SmallVec;
use tracing::trace;

use crate::{
  observable::{Observable, ObservableExt},
  observer::{Observer, ResetOnPanic},
  rc::{MutRc, RcDeref, RcDerefMut},
  scope::LocalScope,
  subscription::{DynamicSubscriptions, Subscription},
};

/// Receives events from an [`EventTarget`].
pub trait EventListener<E> {
  fn on_event(&mut self, event: E);

  /// A closed listener is dropped by its target on the next dispatch.
  fn is_closed(&self) -> bool { false }
}

/// Something that produces events of one type.
pub trait EventSource {
  type Event;
}

/// An [`EventSource`] listeners of type `L` can be attached to.
pub trait EventTarget<L>: EventSource {
  type Detach: Subscription;

  fn add_listener(&self, listener: L) -> Self::Detach;
}

/// Forwards target events to an observer as `next` calls.
pub struct EventForwarder<O>(O);

impl<E, O> EventListener<E> for EventForwarder<O>
where
  O: Observer<E, Infallible>,
{
  fn on_event(&mut self, event: E) { self.0.next(event) }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}

/// Creates an observable of the events of `target`.
pub fn from_event<T: EventSource>(target: T) -> FromEvent<T> { FromEvent(target) }

#[derive(Clone)]
pub struct FromEvent<T>(T);

impl<T, O> Observable<T::Event, Infallible, O> for FromEvent<T>
where
  O: Observer<T::Event, Infallible>,
  T: EventTarget<EventForwarder<O>>,
{
  type Unsub = T::Detach;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.0.add_listener(EventForwarder(observer))
  }
}

impl<T: EventSource> ObservableExt<T::Event, Infallible> for FromEvent<T> {
  type Scope = LocalScope;
}

type ListenerSlot<E> = MutRc<Box<dyn EventListener<E>>>;

struct EmitterState<E> {
  listeners: DynamicSubscriptions<ListenerSlot<E>>,
  emitting: bool,
  pending: VecDeque<E>,
}

/// Single-threaded event target.
///
/// `emit` calls listeners in registration order on a snapshot of the list,
/// so listeners may attach or detach others while an event is dispatched.
/// An event emitted from inside a listener is queued and dispatched to every
/// listener once the current event is done.
pub struct EventEmitter<E> {
  state: MutRc<EmitterState<E>>,
}

impl<E> Clone for EventEmitter<E> {
  fn clone(&self) -> Self { Self { state: self.state.clone() } }
}

impl<E> Default for EventEmitter<E> {
  fn default() -> Self {
    Self {
      state: MutRc::own(EmitterState {
        listeners: DynamicSubscriptions::new(),
        emitting: false,
        pending: VecDeque::new(),
      }),
    }
  }
}

impl<E: Clone> EventEmitter<E> {
  pub fn new() -> Self { Self::default() }

  pub fn emit(&self, event: E) {
    {
      let mut state = self.state.rc_deref_mut();
      if state.emitting {
        trace!(queued = state.pending.len() + 1, "dispatch in progress; event queued");
        state.pending.push_back(event);
        return;
      }
      state.emitting = true;
    }

    let _reset = ResetOnPanic(|| {
      let mut state = self.state.rc_deref_mut();
      state.emitting = false;
      state.pending.clear();
    });
    let mut current = Some(event);
    while let Some(event) = current.take() {
      self.dispatch(event);
      let mut state = self.state.rc_deref_mut();
      current = state.pending.pop_front();
      if current.is_none() {
        state.emitting = false;
      }
    }
  }

  fn dispatch(&self, event: E) {
    let snapshot: SmallVec<[(usize, ListenerSlot<E>); 2]> =
      self.state.rc_deref().listeners.snapshot();
    let mut closed: SmallVec<[usize; 2]> = SmallVec::new();
    for (id, slot) in snapshot {
      if !self.state.rc_deref().listeners.contains(id) {
        continue;
      }
      let mut listener = slot.rc_deref_mut();
      if !listener.is_closed() {
        listener.on_event(event.clone());
      }
      if listener.is_closed() {
        closed.push(id);
      }
    }
    if !closed.is_empty() {
      let removed: SmallVec<[ListenerSlot<E>; 2]> = {
        let mut state = self.state.rc_deref_mut();
        closed.into_iter().filter_map(|id| state.listeners.remove(id)).collect()
      };
      drop(removed);
    }
  }

  pub fn listener_count(&self) -> usize { self.state.rc_deref().listeners.len() }
}

impl<E> EventSource for EventEmitter<E> {
  type Event = E;
}

impl<E, L> EventTarget<L> for EventEmitter<E>
where
  L: EventListener<E> + 'static,
  E: 'static,
{
  type Detach = ListenerDetach<E>;

  fn add_listener(&self, listener: L) -> Self::Detach {
    let slot: ListenerSlot<E> = MutRc::own(Box::new(listener));
    let id = self.state.rc_deref_mut().listeners.add(slot);
    ListenerDetach { state: self.state.clone(), id }
  }
}

/// Removes one listener from an [`EventEmitter`].
pub struct ListenerDetach<E> {
  state: MutRc<EmitterState<E>>,
  id: usize,
}

impl<E> Subscription for ListenerDetach<E> {
  fn unsubscribe(self) {
    let removed = self.state.rc_deref_mut().listeners.remove(self.id);
    drop(removed);
  }

  fn is_closed(&self) -> bool { !self.state.rc_deref().listeners.contains(self.id) }
}
