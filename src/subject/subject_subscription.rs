use crate::{
  rc::{RcDeref, RcDerefMut},
  subject::SubjectState,
  subscription::Subscription,
};

/// Detaches one observer from a subject.
///
/// Holds the subject's shared state rather than the subject itself. A
/// subscription created after the subject terminated has no id and is
/// closed from the start.
pub struct SubjectSubscription<P> {
  state: P,
  id: Option<usize>,
}

impl<P> SubjectSubscription<P> {
  pub(crate) fn new(state: P, id: Option<usize>) -> Self { Self { state, id } }
}

impl<P, Slot, Item, Err> Subscription for SubjectSubscription<P>
where
  P: RcDerefMut<Target = SubjectState<Slot, Item, Err>>,
{
  fn unsubscribe(self) {
    let Some(id) = self.id else { return };
    let removed = self.state.rc_deref_mut().subscribers.remove(id);
    drop(removed);
  }

  fn is_closed(&self) -> bool {
    self.id.is_none_or(|id| !self.state.rc_deref().subscribers.contains(id))
  }
}
