use smallvec::SmallVec;

use crate::subscription::DynamicSubscriptions;

/// The observers attached to a subject, keyed by attachment id and kept in
/// attachment order.
pub struct Subscribers<Ob> {
  inner: DynamicSubscriptions<Ob>,
}

impl<Ob> Default for Subscribers<Ob> {
  fn default() -> Self { Self { inner: DynamicSubscriptions::default() } }
}

impl<Ob> Subscribers<Ob> {
  #[inline]
  pub fn add(&mut self, observer: Ob) -> usize { self.inner.add(observer) }

  #[inline]
  pub fn remove(&mut self, id: usize) -> Option<Ob> { self.inner.remove(id) }

  #[inline]
  pub fn contains(&self, id: usize) -> bool { self.inner.contains(id) }

  #[inline]
  pub fn len(&self) -> usize { self.inner.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.inner.is_empty() }

  /// Removes every observer, in attachment order.
  pub(crate) fn take_all(&mut self) -> SmallVec<[Ob; 2]> { self.inner.drain().collect() }

  /// Removes the given ids and hands the removed observers back so they can
  /// be dropped outside any lock.
  pub(crate) fn remove_all(&mut self, ids: &[usize]) -> SmallVec<[Ob; 2]> {
    ids.iter().filter_map(|id| self.inner.remove(*id)).collect()
  }
}

impl<Ob: Clone> Subscribers<Ob> {
  /// Copies the current attachments for one fan-out pass.
  #[inline]
  pub(crate) fn snapshot(&self) -> SmallVec<[(usize, Ob); 2]> { self.inner.snapshot() }
}
