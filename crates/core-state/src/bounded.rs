use std::collections::VecDeque;

/// LIFO stack with a fixed capacity. Pushing onto a full stack drops the
/// oldest (bottom) entry and hands it back to the caller.
#[derive(Debug, Clone)]
pub struct BoundedStack<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedStack<T> {
    /// `capacity` of zero is treated as one. Storage grows on demand.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::new(),
            capacity,
        }
    }

    /// Push `item`, returning the evicted oldest entry when over capacity.
    pub fn push(&mut self, item: T) -> Option<T> {
        self.items.push_back(item);
        if self.items.len() > self.capacity {
            self.items.pop_front()
        } else {
            None
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_back()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    /// Remove everything, returning how many entries were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.items.len();
        self.items.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_on_overflow() {
        let mut s = BoundedStack::new(3);
        assert_eq!(s.push(1), None);
        assert_eq!(s.push(2), None);
        assert_eq!(s.push(3), None);
        assert_eq!(s.push(4), Some(1));
        assert_eq!(s.len(), 3);
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(s.pop(), Some(4));
        assert_eq!(s.last(), Some(&3));
    }

    #[test]
    fn zero_capacity_holds_one() {
        let mut s = BoundedStack::new(0);
        assert_eq!(s.capacity(), 1);
        assert_eq!(s.push("a"), None);
        assert_eq!(s.push("b"), Some("a"));
        assert_eq!(s.clear(), 1);
        assert!(s.is_empty());
    }

    #[test]
    fn huge_capacity_does_not_preallocate() {
        let mut s = BoundedStack::new(usize::MAX);
        assert_eq!(s.capacity(), usize::MAX);
        assert_eq!(s.push(1u8), None);
        assert_eq!(s.len(), 1);
    }
}
