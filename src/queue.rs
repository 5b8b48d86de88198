//! FIFO work queue (spec.md §4.1).
//!
//! The Go source's `Queue` stores `interface{}` and downcasts at every
//! `Pop()`; a generic `VecDeque<T>` wrapper gets the same FIFO semantics
//! for free and needs no downcast, since Rust's queues are statically
//! typed per instantiation.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct Queue<T> {
    items: VecDeque<T>,
}

impl<T> Queue<T> {
    pub fn new() -> Queue<T> {
        Queue {
            items: VecDeque::new(),
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items.into_iter().collect()
    }

    /// Split into `n` round-robin sub-queues (spec.md §4.8, P6: sizes
    /// differ by at most 1).
    pub fn partition(self, n: usize) -> Vec<Queue<T>> {
        let n = n.max(1);
        let mut shards: Vec<Queue<T>> = (0..n).map(|_| Queue::new()).collect();
        for (i, item) in self.items.into_iter().enumerate() {
            shards[i % n].push(item);
        }
        shards
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Queue::new()
    }
}

impl<T> FromIterator<T> for Queue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Queue {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_preserved() {
        let mut q = Queue::new();
        q.push(1);
        q.push(2);
        q.push(3);
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn partition_sizes_differ_by_at_most_one_and_covers_all_items() {
        let q: Queue<i32> = (0..103).collect();
        let shards = q.partition(10);
        assert_eq!(shards.len(), 10);

        let mut all: Vec<i32> = shards.iter().flat_map(|s| s.items.iter().copied()).collect();
        all.sort();
        assert_eq!(all, (0..103).collect::<Vec<_>>());

        let sizes: Vec<usize> = shards.iter().map(|s| s.len()).collect();
        assert_eq!(*sizes.iter().max().unwrap() - *sizes.iter().min().unwrap() <= 1, true);
    }
}
