//! Binary min-heap over a `Vec`.
//!
//! Layout is the usual implicit tree: the parent of `i` is `(i - 1) / 2`, its
//! children are `2i + 1` and `2i + 2`. An empty heap reports `None` from
//! `pop_min`/`peek_min`, never a placeholder element.

use std::fmt;

/// A priority queue that yields its smallest element first.
#[derive(Clone)]
pub struct MinHeap<T> {
    items: Vec<T>,
}

impl<T> MinHeap<T> {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create an empty heap with room for `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Number of items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the heap is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// The smallest item, without removing it.
    #[inline]
    pub fn peek_min(&self) -> Option<&T> {
        self.items.first()
    }

    /// Items in heap (array) order.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: Ord> MinHeap<T> {
    /// Build a heap from arbitrary items in O(n).
    pub fn from_vec(items: Vec<T>) -> Self {
        let mut heap = Self { items };
        for i in (0..heap.items.len() / 2).rev() {
            heap.sift_down(i);
        }
        heap
    }

    /// Add an item.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.sift_up(self.items.len() - 1);
    }

    /// Remove and return the smallest item.
    pub fn pop_min(&mut self) -> Option<T> {
        let last = self.items.len().checked_sub(1)?;
        self.items.swap(0, last);
        let min = self.items.pop();
        if !self.items.is_empty() {
            self.sift_down(0);
        }
        min
    }

    /// Consume the heap, returning its items in ascending order.
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.items.len());
        while let Some(x) = self.pop_min() {
            out.push(x);
        }
        out
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.items[parent] <= self.items[i] {
                break;
            }
            self.items.swap(parent, i);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.items.len();
        loop {
            let left = 2 * i + 1;
            if left >= n {
                break;
            }
            let right = left + 1;
            let smaller = if right < n && self.items[right] < self.items[left] {
                right
            } else {
                left
            };
            if self.items[smaller] >= self.items[i] {
                break;
            }
            self.items.swap(smaller, i);
            i = smaller;
        }
    }
}

impl<T> Default for MinHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for MinHeap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

impl<T: Ord> Extend<T> for MinHeap<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T: Ord> FromIterator<T> for MinHeap<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}
