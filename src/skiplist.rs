//! Skip list ordered map.
//!
//! Level 0 is a sorted singly-linked list of every key; level `i > 0` is a
//! sorted sub-list of level `i - 1`. Tower heights are geometric with
//! `p = 1/2`, drawn from an injected [`RngCore`] so tests can be
//! deterministic, and capped at `MAX_LEVEL`. The header sentinel is the
//! `head` array: a `NULL` predecessor means "the header".
//!
//! Nodes are kept densely in a `Vec`; removing a node moves the last node into
//! its slot and re-points that node's predecessors.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use smallvec::{smallvec, SmallVec};

use crate::arena::Ptr;

/// Tower of forward pointers; most towers are one or two levels tall.
type Tower = SmallVec<[Ptr; 4]>;

#[derive(Clone)]
struct SkipNode<K, V> {
    key: K,
    value: V,
    forward: Tower,
}

/// A probabilistic sorted map.
///
/// ```
/// use algokit::SkipList;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut list: SkipList<u32, &str, StdRng, 8> = SkipList::with_rng(StdRng::seed_from_u64(7));
/// list.insert(2, "two");
/// list.insert(1, "one");
/// assert_eq!(list.get(&1), Some(&"one"));
/// assert!(list.delete(&2));
/// assert_eq!(list.len(), 1);
/// ```
#[derive(Clone)]
pub struct SkipList<K, V, R = StdRng, const MAX_LEVEL: usize = 16> {
    /// Header forward pointers, one per level.
    head: [Ptr; MAX_LEVEL],
    nodes: Vec<SkipNode<K, V>>,
    /// Number of levels currently in use (0 when empty).
    level: usize,
    rng: R,
}

impl<K: Ord, V> SkipList<K, V, StdRng, 16> {
    /// Create an empty skip list seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<K: Ord, V> Default for SkipList<K, V, StdRng, 16> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, R, const MAX_LEVEL: usize> SkipList<K, V, R, MAX_LEVEL> {
    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of levels currently in use.
    #[inline]
    pub fn current_level(&self) -> usize {
        self.level
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = [Ptr::NULL; MAX_LEVEL];
        self.level = 0;
    }

    /// Entries in ascending key order (a level-0 scan).
    pub fn iter(&self) -> Iter<'_, K, V, R, MAX_LEVEL> {
        Iter {
            list: self,
            cur: self.head[0],
        }
    }

    /// Keys linked at `level`, in list order.
    pub fn level_keys(&self, level: usize) -> Vec<&K> {
        let mut out = Vec::new();
        if level >= MAX_LEVEL {
            return out;
        }
        let mut cur = self.head[level];
        while !cur.is_null() {
            let node = &self.nodes[cur.idx()];
            out.push(&node.key);
            cur = node.forward[level];
        }
        out
    }

    /// Smallest entry.
    pub fn first(&self) -> Option<(&K, &V)> {
        let p = self.head[0];
        (!p.is_null()).then(|| {
            let n = &self.nodes[p.idx()];
            (&n.key, &n.value)
        })
    }

    #[inline]
    fn forward(&self, p: Ptr, level: usize) -> Ptr {
        if p.is_null() {
            self.head[level]
        } else {
            self.nodes[p.idx()].forward[level]
        }
    }

    #[inline]
    fn set_forward(&mut self, p: Ptr, level: usize, to: Ptr) {
        if p.is_null() {
            self.head[level] = to;
        } else {
            self.nodes[p.idx()].forward[level] = to;
        }
    }

    fn shrink_level(&mut self) {
        while self.level > 0 && self.head[self.level - 1].is_null() {
            self.level -= 1;
        }
    }
}

impl<K: Ord, V, R: RngCore, const MAX_LEVEL: usize> SkipList<K, V, R, MAX_LEVEL> {
    /// Create an empty skip list drawing tower heights from `rng`.
    pub fn with_rng(rng: R) -> Self {
        assert!(MAX_LEVEL > 0, "MAX_LEVEL must be at least 1");
        Self {
            head: [Ptr::NULL; MAX_LEVEL],
            nodes: Vec::new(),
            level: 0,
            rng,
        }
    }

    /// Geometric tower height in `1..=MAX_LEVEL`.
    #[inline]
    fn random_height(&mut self) -> usize {
        let r = self.rng.next_u32();
        (r.trailing_ones() as usize + 1).min(MAX_LEVEL)
    }

    /// Descend from the header, recording the last node before `key` on
    /// every level in use. Levels above `self.level` keep the header.
    fn predecessors<Q>(&self, key: &Q) -> [Ptr; MAX_LEVEL]
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut update = [Ptr::NULL; MAX_LEVEL];
        let mut x = Ptr::NULL;
        for level in (0..self.level).rev() {
            loop {
                let next = self.forward(x, level);
                if !next.is_null()
                    && key.cmp(self.nodes[next.idx()].key.borrow()) == Ordering::Greater
                {
                    x = next;
                } else {
                    break;
                }
            }
            update[level] = x;
        }
        update
    }

    fn find<Q>(&self, key: &Q) -> Ptr
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut x = Ptr::NULL;
        for level in (0..self.level).rev() {
            loop {
                let next = self.forward(x, level);
                if next.is_null() {
                    break;
                }
                match key.cmp(self.nodes[next.idx()].key.borrow()) {
                    Ordering::Greater => x = next,
                    Ordering::Equal => return next,
                    Ordering::Less => break,
                }
            }
        }
        Ptr::NULL
    }

    /// Insert `key`; an existing key has its value overwritten.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let update = self.predecessors(&key);
        let candidate = self.forward(update[0], 0);
        if !candidate.is_null() && self.nodes[candidate.idx()].key == key {
            return Some(std::mem::replace(
                &mut self.nodes[candidate.idx()].value,
                value,
            ));
        }

        let height = self.random_height();
        if height > self.level {
            // update[self.level..height] already holds the header.
            self.level = height;
        }

        let node = Ptr::new(self.nodes.len());
        let mut forward: Tower = smallvec![Ptr::NULL; height];
        for (level, slot) in forward.iter_mut().enumerate() {
            *slot = self.forward(update[level], level);
        }
        self.nodes.push(SkipNode {
            key,
            value,
            forward,
        });
        for (level, &pred) in update.iter().enumerate().take(height) {
            self.set_forward(pred, level, node);
        }
        None
    }

    /// Value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let p = self.find(key);
        (!p.is_null()).then(|| &self.nodes[p.idx()].value)
    }

    /// Whether `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        !self.find(key).is_null()
    }

    /// Remove `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let update = self.predecessors(key);
        let target = self.forward(update[0], 0);
        if target.is_null()
            || key.cmp(self.nodes[target.idx()].key.borrow()) != Ordering::Equal
        {
            return None;
        }
        self.unlink(target, &update);
        Some(self.free(target).1)
    }

    /// Remove `key`; `false` if it was absent.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove(key).is_some()
    }

    /// Remove and return the smallest entry.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let first = self.head[0];
        if first.is_null() {
            return None;
        }
        // The first node is first on every level it occupies.
        let update = [Ptr::NULL; MAX_LEVEL];
        self.unlink(first, &update);
        Some(self.free(first))
    }

    fn unlink(&mut self, target: Ptr, update: &[Ptr; MAX_LEVEL]) {
        let height = self.nodes[target.idx()].forward.len();
        for (level, &pred) in update.iter().enumerate().take(height) {
            if self.forward(pred, level) == target {
                let next = self.nodes[target.idx()].forward[level];
                self.set_forward(pred, level, next);
            }
        }
        self.shrink_level();
    }

    /// Drop an unlinked node from the vector, re-pointing the predecessors of
    /// whichever node moves into its slot.
    fn free(&mut self, target: Ptr) -> (K, V) {
        let last = Ptr::new(self.nodes.len() - 1);
        if target != last {
            let preds = self.predecessors(&self.nodes[last.idx()].key);
            let height = self.nodes[last.idx()].forward.len();
            for (level, &pred) in preds.iter().enumerate().take(height) {
                debug_assert_eq!(self.forward(pred, level), last);
                self.set_forward(pred, level, target);
            }
        }
        let node = self.nodes.swap_remove(target.idx());
        (node.key, node.value)
    }

    /// Panics if any level is out of order or not a sub-list of the level
    /// below it.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let base = self.level_keys(0);
        assert_eq!(base.len(), self.nodes.len(), "level 0 must hold every key");
        for level in 0..MAX_LEVEL {
            let keys = self.level_keys(level);
            assert!(
                keys.windows(2).all(|w| w[0] < w[1]),
                "level {level} must be strictly increasing"
            );
            if level > 0 {
                let below = self.level_keys(level - 1);
                let mut it = below.iter();
                for k in &keys {
                    assert!(
                        it.any(|b| b == k),
                        "level {level} must be a sub-list of level {}",
                        level - 1
                    );
                }
            }
            if level >= self.level {
                assert!(keys.is_empty(), "levels above current_level must be empty");
            }
        }
        if !self.nodes.is_empty() {
            assert!(!self.head[self.level - 1].is_null(), "top level must be occupied");
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, R, const MAX_LEVEL: usize> fmt::Debug
    for SkipList<K, V, R, MAX_LEVEL>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Ascending iterator over a [`SkipList`].
pub struct Iter<'a, K, V, R, const MAX_LEVEL: usize> {
    list: &'a SkipList<K, V, R, MAX_LEVEL>,
    cur: Ptr,
}

impl<'a, K, V, R, const MAX_LEVEL: usize> Iterator for Iter<'a, K, V, R, MAX_LEVEL> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur.is_null() {
            return None;
        }
        let node = &self.list.nodes[self.cur.idx()];
        self.cur = node.forward[0];
        Some((&node.key, &node.value))
    }
}
