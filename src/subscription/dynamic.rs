use smallvec::SmallVec;

/// A container for managing multiple items with ID-based tracking.
///
/// Ids are handed out in insertion order and never reused, so iteration
/// order is attachment order and a stale id can never match a newer item.
/// Uses `SmallVec<[_; 2]>` to avoid heap allocation for the common case of
/// one or two items.
///
/// ```rust
/// use rxclock::subscription::DynamicSubscriptions;
///
/// let mut subs: DynamicSubscriptions<&str> = DynamicSubscriptions::default();
/// let first = subs.add("a");
/// subs.add("b");
/// assert_eq!(subs.remove(first), Some("a"));
/// assert_eq!(subs.len(), 1);
/// ```
pub struct DynamicSubscriptions<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for DynamicSubscriptions<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> DynamicSubscriptions<U> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Add an item and return its unique ID.
  #[inline]
  pub fn add(&mut self, item: U) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.items.push((id, item));
    id
  }

  /// Remove an item by ID.
  pub fn remove(&mut self, id: usize) -> Option<U> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  #[inline]
  pub fn contains(&self, id: usize) -> bool { self.items.iter().any(|(i, _)| *i == id) }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Remove every item, in insertion order.
  #[inline]
  pub fn drain(&mut self) -> impl Iterator<Item = U> + '_ {
    self.items.drain(..).map(|(_, item)| item)
  }

  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = (usize, &U)> {
    self.items.iter().map(|(id, item)| (*id, item))
  }
}

impl<U: Clone> DynamicSubscriptions<U> {
  /// Copy of the current `(id, item)` pairs, for iterating while the
  /// container itself may change.
  pub fn snapshot(&self) -> SmallVec<[(usize, U); 2]> { self.items.clone() }
}
