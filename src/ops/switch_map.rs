use crate::{
  observable::{Observable, ObservableExt, ScopeOf},
  observer::{Notification, Observer},
  ops::downstream::{Downstream, DownstreamSubscription},
  rc::{RcDeref, RcDerefMut},
  scope::{JoinScope, Joined, Scope, ScopeSubscription},
  subscription::{IntoBoxedSubscription, Subscription},
  type_hint::TypeHint,
};

/// Maps each source value to an inner observable and mirrors only the most
/// recent one.
pub struct SwitchMapOp<S, F, Item> {
  source: S,
  func: F,
  _hint: TypeHint<Item>,
}

impl<S, F, Item> SwitchMapOp<S, F, Item> {
  pub(crate) fn new(source: S, func: F) -> Self { Self { source, func, _hint: TypeHint::new() } }
}

impl<S: Clone, F: Clone, Item> Clone for SwitchMapOp<S, F, Item> {
  fn clone(&self) -> Self { Self::new(self.source.clone(), self.func.clone()) }
}

/// Upstream slot of the current inner subscription.
const INNER: usize = 0;

/// Which inner observable is current, and what has completed.
pub struct SwitchState {
  generation: u64,
  inner_active: bool,
  outer_done: bool,
}

impl SwitchState {
  fn switch(&mut self) -> u64 {
    self.generation += 1;
    self.inner_active = true;
    self.generation
  }
}

type SwitchCell<Sc, O, Item, Err> =
  <Sc as Scope>::RcMut<Downstream<O, Item, Err, ScopeSubscription<Sc>, SwitchState>>;

type SwitchCellOf<T, O, Item, Err> = SwitchCell<ScopeOf<T, Item, Err>, O, Item, Err>;

impl<S, F, Item, Out, OutItem, Err, O> Observable<OutItem, Err, O> for SwitchMapOp<S, F, Item>
where
  O: Observer<OutItem, Err>,
  Self: ObservableExt<OutItem, Err>,
  F: FnMut(Item) -> Out,
  S: Observable<Item, Err, SwitchOuter<SwitchCellOf<Self, O, OutItem, Err>, F>>,
  S::Unsub: IntoBoxedSubscription<ScopeSubscription<ScopeOf<Self, OutItem, Err>>>,
{
  type Unsub = DownstreamSubscription<SwitchCellOf<Self, O, OutItem, Err>>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let state = SwitchState { generation: 0, inner_active: false, outer_done: false };
    let cell: SwitchCellOf<Self, O, OutItem, Err> =
      From::from(Downstream::new(observer, state).with_slots(1));
    let outer = self
      .source
      .actual_subscribe(SwitchOuter { cell: cell.clone(), func: self.func });
    Downstream::add_upstream(&cell, outer.into_boxed());
    DownstreamSubscription::new(cell)
  }
}

impl<S, F, Item, Out, OutItem, Err> ObservableExt<OutItem, Err> for SwitchMapOp<S, F, Item>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(Item) -> Out,
  Out: ObservableExt<OutItem, Err>,
  S::Scope: JoinScope<Out::Scope>,
{
  type Scope = Joined<S::Scope, Out::Scope>;
}

/// Subscribed to the source; starts a new inner subscription per value.
pub struct SwitchOuter<P, F> {
  cell: P,
  func: F,
}

impl<P, F, Item, Out, O, OutItem, Err, U> Observer<Item, Err> for SwitchOuter<P, F>
where
  P: RcDerefMut<Target = Downstream<O, OutItem, Err, U, SwitchState>> + Clone,
  O: Observer<OutItem, Err>,
  U: Subscription,
  F: FnMut(Item) -> Out,
  Out: Observable<OutItem, Err, SwitchInner<P>>,
  Out::Unsub: IntoBoxedSubscription<U>,
{
  fn next(&mut self, value: Item) {
    let Some(generation) = Downstream::update(&self.cell, SwitchState::switch) else { return };
    Downstream::swap_upstream(&self.cell, INNER, None, |_| true);

    let inner = (self.func)(value);
    let subscription = inner.actual_subscribe(SwitchInner { cell: self.cell.clone(), generation });
    Downstream::swap_upstream(&self.cell, INNER, Some(subscription.into_boxed()), |state| {
      state.generation == generation
    });
  }

  fn error(self, err: Err) { Downstream::emit_with(&self.cell, |_| Some(Notification::Error(err))); }

  fn complete(self) {
    Downstream::emit_with(&self.cell, |state| {
      state.outer_done = true;
      (!state.inner_active).then_some(Notification::Complete)
    });
  }

  fn is_closed(&self) -> bool { self.cell.rc_deref().is_closed() }
}

/// Subscribed to one inner observable; ignored once a newer one started.
pub struct SwitchInner<P> {
  cell: P,
  generation: u64,
}

impl<P, O, Item, Err, U> Observer<Item, Err> for SwitchInner<P>
where
  P: RcDerefMut<Target = Downstream<O, Item, Err, U, SwitchState>>,
  O: Observer<Item, Err>,
  U: Subscription,
{
  fn next(&mut self, value: Item) {
    let generation = self.generation;
    Downstream::emit_with(&self.cell, |state| {
      (state.generation == generation).then_some(Notification::Next(value))
    });
  }

  fn error(self, err: Err) {
    let generation = self.generation;
    Downstream::emit_with(&self.cell, |state| {
      (state.generation == generation).then_some(Notification::Error(err))
    });
  }

  fn complete(self) {
    let generation = self.generation;
    Downstream::emit_with(&self.cell, |state| {
      if state.generation != generation {
        return None;
      }
      state.inner_active = false;
      state.outer_done.then_some(Notification::Complete)
    });
  }

  fn is_closed(&self) -> bool {
    let cell = self.cell.rc_deref();
    cell.is_closed() || cell.state().generation != self.generation
  }
}
