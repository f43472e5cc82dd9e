//! Latest-value combination of several sources.
//!
//! Every input has a slot holding its most recent value. Nothing is emitted
//! until all slots are filled; from then on each value from any input emits a
//! fresh snapshot. The combined stream errors as soon as one input errors and
//! completes once every input has completed.
//!
//! Snapshots are computed while the shared state is locked and delivered
//! after it is released, so the downstream observer may push into any of the
//! inputs from its callbacks. The snapshot such a push produces is delivered
//! right after the current one. When the combined stream ends, every input
//! is unsubscribed.

use crate::{
  observable::{Observable, ObservableExt, ScopeOf},
  observer::{Notification, Observer},
  ops::downstream::{Downstream, DownstreamSubscription},
  rc::{RcDeref, RcDerefMut},
  scope::{JoinScope, Joined, Scope, ScopeSubscription},
  subscription::{IntoBoxedSubscription, Subscription},
  type_hint::TypeHint,
};

/// `a.combine_latest(b, binary_op)`: emits `binary_op(a, b)` on the latest
/// pair.
pub struct CombineLatestOp<A, B, F, ItemA, ItemB> {
  a: A,
  b: B,
  binary_op: F,
  _hint: TypeHint<(ItemA, ItemB)>,
}

impl<A, B, F, ItemA, ItemB> CombineLatestOp<A, B, F, ItemA, ItemB> {
  pub(crate) fn new(a: A, b: B, binary_op: F) -> Self {
    Self { a, b, binary_op, _hint: TypeHint::new() }
  }
}

impl<A: Clone, B: Clone, F: Clone, ItemA, ItemB> Clone for CombineLatestOp<A, B, F, ItemA, ItemB> {
  fn clone(&self) -> Self {
    Self::new(self.a.clone(), self.b.clone(), self.binary_op.clone())
  }
}

/// Pairs the latest values of two sources.
///
/// ```rust
/// use std::convert::Infallible;
///
/// use rxclock::prelude::*;
///
/// let numbers = LocalSubject::<i32, Infallible>::new();
/// let letters = LocalSubject::<char, Infallible>::new();
/// let out = std::rc::Rc::new(std::cell::RefCell::new(vec![]));
/// let c_out = out.clone();
/// observable::combine_latest(numbers.clone(), letters.clone())
///   .subscribe(move |pair| c_out.borrow_mut().push(pair));
///
/// numbers.next(1);
/// numbers.next(2);
/// letters.next('x');
/// numbers.next(3);
/// assert_eq!(*out.borrow(), vec![(2, 'x'), (3, 'x')]);
/// ```
pub fn combine_latest<A, B, ItemA, ItemB, Err>(
  a: A, b: B,
) -> CombineLatestOp<A, B, fn(ItemA, ItemB) -> (ItemA, ItemB), ItemA, ItemB>
where
  A: ObservableExt<ItemA, Err>,
  B: ObservableExt<ItemB, Err>,
{
  CombineLatestOp::new(a, b, pair as fn(ItemA, ItemB) -> (ItemA, ItemB))
}

fn pair<A, B>(a: A, b: B) -> (A, B) { (a, b) }

type CombineCell<Sc, O, Out, Err, F, A, B> =
  <Sc as Scope>::RcMut<Downstream<O, Out, Err, ScopeSubscription<Sc>, CombineState<F, A, B>>>;

type PairCellOf<T, O, Out, Err, F, A, B> = CombineCell<ScopeOf<T, Out, Err>, O, Out, Err, F, A, B>;

impl<A, B, F, ItemA, ItemB, Out, Err, O> Observable<Out, Err, O>
  for CombineLatestOp<A, B, F, ItemA, ItemB>
where
  O: Observer<Out, Err>,
  Self: ObservableExt<Out, Err>,
  F: FnMut(ItemA, ItemB) -> Out,
  ItemA: Clone,
  ItemB: Clone,
  A: Observable<ItemA, Err, LeftObserver<PairCellOf<Self, O, Out, Err, F, ItemA, ItemB>>>,
  B: Observable<ItemB, Err, RightObserver<PairCellOf<Self, O, Out, Err, F, ItemA, ItemB>>>,
  A::Unsub: IntoBoxedSubscription<ScopeSubscription<ScopeOf<Self, Out, Err>>>,
  B::Unsub: IntoBoxedSubscription<ScopeSubscription<ScopeOf<Self, Out, Err>>>,
{
  type Unsub = DownstreamSubscription<PairCellOf<Self, O, Out, Err, F, ItemA, ItemB>>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let state = CombineState {
      binary_op: self.binary_op,
      a: None,
      b: None,
      a_done: false,
      b_done: false,
    };
    let cell: PairCellOf<Self, O, Out, Err, F, ItemA, ItemB> =
      From::from(Downstream::new(observer, state));
    let a = self.a.actual_subscribe(LeftObserver(cell.clone()));
    Downstream::add_upstream(&cell, a.into_boxed());
    if !cell.rc_deref().is_terminated() {
      let b = self.b.actual_subscribe(RightObserver(cell.clone()));
      Downstream::add_upstream(&cell, b.into_boxed());
    }
    DownstreamSubscription::new(cell)
  }
}

impl<A, B, F, ItemA, ItemB, Out, Err> ObservableExt<Out, Err>
  for CombineLatestOp<A, B, F, ItemA, ItemB>
where
  A: ObservableExt<ItemA, Err>,
  B: ObservableExt<ItemB, Err>,
  F: FnMut(ItemA, ItemB) -> Out,
  A::Scope: JoinScope<B::Scope>,
{
  type Scope = Joined<A::Scope, B::Scope>;
}

enum CombineItem<A, B> {
  ItemA(A),
  ItemB(B),
}

pub struct CombineState<F, A, B> {
  binary_op: F,
  a: Option<A>,
  b: Option<B>,
  a_done: bool,
  b_done: bool,
}

impl<F, A, B> CombineState<F, A, B> {
  fn next_by_type<Out, Err>(&mut self, item: CombineItem<A, B>) -> Option<Notification<Out, Err>>
  where
    F: FnMut(A, B) -> Out,
    A: Clone,
    B: Clone,
  {
    match item {
      CombineItem::ItemA(v) => self.a = Some(v),
      CombineItem::ItemB(v) => self.b = Some(v),
    }
    match (&self.a, &self.b) {
      (Some(a), Some(b)) => Some(Notification::Next((self.binary_op)(a.clone(), b.clone()))),
      _ => None,
    }
  }

  /// Marks one side done; completion once both are.
  fn complete_side<Out, Err>(&mut self, left: bool) -> Option<Notification<Out, Err>> {
    if left {
      self.a_done = true;
    } else {
      self.b_done = true;
    }
    (self.a_done && self.b_done).then_some(Notification::Complete)
  }
}

pub struct LeftObserver<P>(P);

pub struct RightObserver<P>(P);

macro_rules! impl_side_observer {
  ($side:ident, $item:ident, $variant:ident, $left:expr) => {
    impl<P, O, F, A, B, Out, Err, U> Observer<$item, Err> for $side<P>
    where
      P: RcDerefMut<Target = Downstream<O, Out, Err, U, CombineState<F, A, B>>>,
      O: Observer<Out, Err>,
      F: FnMut(A, B) -> Out,
      A: Clone,
      B: Clone,
      U: Subscription,
    {
      fn next(&mut self, value: $item) {
        Downstream::emit_with(&self.0, |state| state.next_by_type(CombineItem::$variant(value)));
      }

      fn error(self, err: Err) {
        Downstream::emit_with(&self.0, |_| Some(Notification::Error(err)));
      }

      fn complete(self) { Downstream::emit_with(&self.0, |state| state.complete_side($left)); }

      fn is_closed(&self) -> bool { self.0.rc_deref().is_closed() }
    }
  };
}

impl_side_observer!(LeftObserver, A, ItemA, true);
impl_side_observer!(RightObserver, B, ItemB, false);

/// Combines any number of sources of the same item type into snapshots of
/// their latest values, in input order.
///
/// An empty input completes immediately without emitting. The first error
/// from any input ends the stream and unsubscribes the others.
pub fn combine_latest_all<S, Item, Err>(sources: Vec<S>) -> CombineLatestAll<S, Item>
where
  S: ObservableExt<Item, Err>,
{
  CombineLatestAll { sources, _hint: TypeHint::new() }
}

pub struct CombineLatestAll<S, Item> {
  sources: Vec<S>,
  _hint: TypeHint<Item>,
}

impl<S: Clone, Item> Clone for CombineLatestAll<S, Item> {
  fn clone(&self) -> Self { Self { sources: self.sources.clone(), _hint: TypeHint::new() } }
}

type AllCell<Sc, O, Item, Err> =
  <Sc as Scope>::RcMut<Downstream<O, Vec<Item>, Err, ScopeSubscription<Sc>, AllState<Item>>>;

type AllCellOf<S, O, Item, Err> = AllCell<ScopeOf<S, Item, Err>, O, Item, Err>;

impl<S, Item, Err, O> Observable<Vec<Item>, Err, O> for CombineLatestAll<S, Item>
where
  O: Observer<Vec<Item>, Err>,
  Item: Clone,
  S: ObservableExt<Item, Err> + Observable<Item, Err, SlotObserver<AllCellOf<S, O, Item, Err>>>,
  <S as Observable<Item, Err, SlotObserver<AllCellOf<S, O, Item, Err>>>>::Unsub:
    IntoBoxedSubscription<ScopeSubscription<ScopeOf<S, Item, Err>>>,
{
  type Unsub = DownstreamSubscription<AllCellOf<S, O, Item, Err>>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let len = self.sources.len();
    let state = AllState { latest: vec![None; len], done: vec![false; len] };
    let cell: AllCellOf<S, O, Item, Err> = From::from(Downstream::new(observer, state));
    if len == 0 {
      Downstream::emit_with(&cell, |_| Some(Notification::Complete));
    }
    for (index, source) in self.sources.into_iter().enumerate() {
      if cell.rc_deref().is_terminated() {
        break;
      }
      let subscription = source.actual_subscribe(SlotObserver { cell: cell.clone(), index });
      Downstream::add_upstream(&cell, subscription.into_boxed());
    }
    DownstreamSubscription::new(cell)
  }
}

impl<S, Item, Err> ObservableExt<Vec<Item>, Err> for CombineLatestAll<S, Item>
where
  S: ObservableExt<Item, Err>,
{
  type Scope = S::Scope;
}

pub struct AllState<Item> {
  latest: Vec<Option<Item>>,
  done: Vec<bool>,
}

pub struct SlotObserver<P> {
  cell: P,
  index: usize,
}

impl<P, O, Item, Err, U> Observer<Item, Err> for SlotObserver<P>
where
  P: RcDerefMut<Target = Downstream<O, Vec<Item>, Err, U, AllState<Item>>>,
  O: Observer<Vec<Item>, Err>,
  Item: Clone,
  U: Subscription,
{
  fn next(&mut self, value: Item) {
    let index = self.index;
    Downstream::emit_with(&self.cell, |state| {
      state.latest[index] = Some(value);
      let snapshot: Option<Vec<Item>> = state.latest.iter().cloned().collect();
      snapshot.map(Notification::Next)
    });
  }

  fn error(self, err: Err) { Downstream::emit_with(&self.cell, |_| Some(Notification::Error(err))); }

  fn complete(self) {
    let index = self.index;
    Downstream::emit_with(&self.cell, |state| {
      state.done[index] = true;
      state.done.iter().all(|d| *d).then_some(Notification::Complete)
    });
  }

  fn is_closed(&self) -> bool { self.cell.rc_deref().is_closed() }
}
