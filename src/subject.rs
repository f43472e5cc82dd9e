//! Multicast subjects.
//!
//! A [`Subject`] is an observable that is also an observer: the producer
//! pushes events into it and every attached observer receives them in
//! attachment order. Subjects are hot and keep no replay buffer. A value
//! pushed while nobody is attached is dropped. After `error` or `complete`
//! the subject is terminated: later events are ignored and late observers
//! immediately receive the stored terminal event.
//!
//! Events pushed from inside an observer callback, or from another thread
//! while a fan-out pass is running, are queued and delivered by the running
//! pass once the current event is done. At most one pass runs per subject.

mod subject_subscription;
mod subscribers;

use std::collections::VecDeque;

use smallvec::SmallVec;
use tracing::{debug, trace};
pub use subject_subscription::*;
pub use subscribers::*;

use crate::{
  observable::{Observable, ObservableExt},
  observer::{BoxedObserver, BoxedObserverSend, Notification, Observer, ResetOnPanic},
  rc::{MutArc, MutRc, RcDeref, RcDerefMut},
  scope::{LocalScope, SharedScope},
};

/// How a subject terminated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Terminal<Err> {
  Errored(Err),
  Completed,
}

/// The shared state behind every clone of a subject.
pub struct SubjectState<Slot, Item, Err> {
  subscribers: Subscribers<Slot>,
  terminal: Option<Terminal<Err>>,
  emitting: bool,
  pending: VecDeque<Notification<Item, Err>>,
}

impl<Slot, Item, Err> Default for SubjectState<Slot, Item, Err> {
  fn default() -> Self {
    Self {
      subscribers: Subscribers::default(),
      terminal: None,
      emitting: false,
      pending: VecDeque::new(),
    }
  }
}

/// A multicast source that can be driven imperatively.
///
/// `P` is the shared pointer to the [`SubjectState`]; use the
/// [`LocalSubject`] and [`SharedSubject`] aliases. Clones share one state.
///
/// Besides its [`Observer`] impl a subject has inherent `next`, `error` and
/// `complete` methods taking `&self`, so the producer can keep pushing
/// through the same binding it subscribes from:
///
/// ```rust
/// use std::convert::Infallible;
///
/// use rxclock::prelude::*;
///
/// let subject = LocalSubject::<i32, Infallible>::new();
/// let seen = std::rc::Rc::new(std::cell::Cell::new(0));
/// let c_seen = seen.clone();
/// subject.clone().subscribe(move |v| c_seen.set(c_seen.get() + v));
/// subject.next(1);
/// subject.next(2);
/// assert_eq!(seen.get(), 3);
/// ```
///
/// A by-value `subject.complete()` resolves to the [`Observer`] method and
/// consumes that handle; the other clones see the completion all the same.
pub struct Subject<P> {
  state: P,
}

impl<P: Clone> Clone for Subject<P> {
  fn clone(&self) -> Self { Self { state: self.state.clone() } }
}

type LocalSlot<Item, Err> = MutRc<Option<BoxedObserver<'static, Item, Err>>>;
type SharedSlot<Item, Err> = MutArc<Option<BoxedObserverSend<'static, Item, Err>>>;

/// Single-threaded subject.
pub type LocalSubject<Item, Err> =
  Subject<MutRc<SubjectState<LocalSlot<Item, Err>, Item, Err>>>;

/// Thread-safe subject. Observers must be `Send`.
pub type SharedSubject<Item, Err> =
  Subject<MutArc<SubjectState<SharedSlot<Item, Err>, Item, Err>>>;

impl<Item, Err> LocalSubject<Item, Err> {
  pub fn new() -> Self { Self { state: MutRc::own(SubjectState::default()) } }
}

impl<Item, Err> Default for LocalSubject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> SharedSubject<Item, Err> {
  pub fn new() -> Self { Self { state: MutArc::own(SubjectState::default()) } }
}

impl<Item, Err> Default for SharedSubject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<P, Slot, Item, Err> Subject<P>
where
  P: RcDerefMut<Target = SubjectState<Slot, Item, Err>> + Clone,
{
  /// Number of attached observers.
  pub fn subscriber_count(&self) -> usize { self.state.rc_deref().subscribers.len() }

  pub fn is_empty(&self) -> bool { self.state.rc_deref().subscribers.is_empty() }

  /// The terminal event, once the subject has terminated.
  pub fn terminal(&self) -> Option<Terminal<Err>>
  where
    Err: Clone,
  {
    self.state.rc_deref().terminal.clone()
  }

  /// A view that can only be subscribed to, for handing to consumers.
  pub fn as_observable(&self) -> SubjectView<P> { SubjectView(self.clone()) }

  fn attach<O>(&self, observer: O, into_slot: impl FnOnce(O) -> Slot) -> SubjectSubscription<P>
  where
    O: Observer<Item, Err>,
    Err: Clone,
  {
    let terminal = self.state.rc_deref().terminal.clone();
    match terminal {
      Some(Terminal::Errored(err)) => {
        debug!("subscribed to an errored subject; replaying the error");
        observer.error(err);
        SubjectSubscription::new(self.state.clone(), None)
      }
      Some(Terminal::Completed) => {
        debug!("subscribed to a completed subject; replaying completion");
        observer.complete();
        SubjectSubscription::new(self.state.clone(), None)
      }
      None => {
        let id = self.state.rc_deref_mut().subscribers.add(into_slot(observer));
        SubjectSubscription::new(self.state.clone(), Some(id))
      }
    }
  }
}

impl<P, Slot, Item, Err> Subject<P>
where
  P: RcDerefMut<Target = SubjectState<Slot, Item, Err>> + Clone,
  Slot: Observer<Item, Err> + Clone,
  Item: Clone,
  Err: Clone,
{
  /// Pushes `value` to every attached observer.
  pub fn next(&self, value: Item) { self.emit(Notification::Next(value)) }

  /// Terminates the subject with `err`.
  pub fn error(&self, err: Err) { self.emit(Notification::Error(err)) }

  /// Terminates the subject with completion.
  pub fn complete(&self) { self.emit(Notification::Complete) }

  fn emit(&self, notification: Notification<Item, Err>) {
    {
      let mut state = self.state.rc_deref_mut();
      if state.terminal.is_some() {
        debug!("subject already terminated; event ignored");
        return;
      }
      match &notification {
        Notification::Error(err) => state.terminal = Some(Terminal::Errored(err.clone())),
        Notification::Complete => state.terminal = Some(Terminal::Completed),
        Notification::Next(_) => {}
      }
      if state.emitting {
        trace!(queued = state.pending.len() + 1, "fan-out in progress; event queued");
        state.pending.push_back(notification);
        return;
      }
      state.emitting = true;
    }

    let _reset = ResetOnPanic(|| {
      let mut state = self.state.rc_deref_mut();
      state.emitting = false;
      state.pending.clear();
    });
    let mut current = Some(notification);
    while let Some(notification) = current.take() {
      self.dispatch(notification);
      let mut state = self.state.rc_deref_mut();
      current = state.pending.pop_front();
      if current.is_none() {
        state.emitting = false;
      }
    }
  }

  fn dispatch(&self, notification: Notification<Item, Err>) {
    match notification {
      Notification::Next(value) => self.dispatch_next(value),
      Notification::Error(err) => {
        let slots = self.state.rc_deref_mut().subscribers.take_all();
        let mut err = Some(err);
        let mut iter = slots.into_iter().peekable();
        while let Some(slot) = iter.next() {
          let err = if iter.peek().is_some() { err.clone() } else { err.take() };
          if let Some(err) = err {
            slot.error(err);
          }
        }
      }
      Notification::Complete => {
        let slots = self.state.rc_deref_mut().subscribers.take_all();
        for slot in slots {
          slot.complete();
        }
      }
    }
  }

  fn dispatch_next(&self, value: Item) {
    let snapshot = self.state.rc_deref().subscribers.snapshot();
    if snapshot.is_empty() {
      trace!("no observers attached; value dropped");
      return;
    }
    let mut closed: SmallVec<[usize; 2]> = SmallVec::new();
    let mut value = Some(value);
    let mut iter = snapshot.into_iter().peekable();
    while let Some((id, mut slot)) = iter.next() {
      if !self.state.rc_deref().subscribers.contains(id) {
        continue;
      }
      let value = if iter.peek().is_some() { value.clone() } else { value.take() };
      if let Some(value) = value {
        slot.next(value);
      }
      if slot.is_closed() {
        closed.push(id);
      }
    }
    if !closed.is_empty() {
      let removed = self.state.rc_deref_mut().subscribers.remove_all(&closed);
      drop(removed);
    }
  }
}

impl<P, Slot, Item, Err> Observer<Item, Err> for Subject<P>
where
  P: RcDerefMut<Target = SubjectState<Slot, Item, Err>> + Clone,
  Slot: Observer<Item, Err> + Clone,
  Item: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) { self.emit(Notification::Next(value)) }

  fn error(self, err: Err) { self.emit(Notification::Error(err)) }

  fn complete(self) { self.emit(Notification::Complete) }

  fn is_closed(&self) -> bool { self.state.rc_deref().terminal.is_some() }
}

impl<Item, Err, O> Observable<Item, Err, O> for LocalSubject<Item, Err>
where
  O: Observer<Item, Err> + 'static,
  Err: Clone,
{
  type Unsub = SubjectSubscription<MutRc<SubjectState<LocalSlot<Item, Err>, Item, Err>>>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.attach(observer, |o| MutRc::own(Some(Box::new(o) as BoxedObserver<'static, Item, Err>)))
  }
}

impl<Item, Err, O> Observable<Item, Err, O> for SharedSubject<Item, Err>
where
  O: Observer<Item, Err> + Send + 'static,
  Err: Clone,
{
  type Unsub = SubjectSubscription<MutArc<SubjectState<SharedSlot<Item, Err>, Item, Err>>>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.attach(observer, |o| {
      MutArc::own(Some(Box::new(o) as BoxedObserverSend<'static, Item, Err>))
    })
  }
}

impl<Item, Err> ObservableExt<Item, Err> for LocalSubject<Item, Err> {
  type Scope = LocalScope;
}

impl<Item, Err> ObservableExt<Item, Err> for SharedSubject<Item, Err> {
  type Scope = SharedScope;
}

/// Subscription-only face of a subject.
pub struct SubjectView<P>(Subject<P>);

impl<P: Clone> Clone for SubjectView<P> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Item, Err, O, P> Observable<Item, Err, O> for SubjectView<P>
where
  Subject<P>: Observable<Item, Err, O>,
{
  type Unsub = <Subject<P> as Observable<Item, Err, O>>::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { self.0.actual_subscribe(observer) }
}

impl<Item, Err, P> ObservableExt<Item, Err> for SubjectView<P>
where
  Subject<P>: ObservableExt<Item, Err>,
{
  type Scope = <Subject<P> as ObservableExt<Item, Err>>::Scope;
}
