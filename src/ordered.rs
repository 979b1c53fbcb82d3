//! Common interface over the ordered maps.
//!
//! - Keys are unique.
//! - `insert` overwrites the existing value and returns the old one.
//! - `get` takes `&mut self` because the splay tree restructures on reads.

use crate::avl::AvlTree;
use crate::skiplist::SkipList;
use crate::splay::SplayTree;

/// Ordered map interface implemented by [`AvlTree`], [`SplayTree`] and
/// [`SkipList`].
pub trait OrderedMap {
    /// Key type.
    type Key: Ord;
    /// Value type.
    type Value;

    /// Number of live entries.
    fn len(&self) -> usize;

    /// Whether the map has no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a key.
    fn get(&mut self, key: &Self::Key) -> Option<&Self::Value>;

    /// Insert or overwrite; returns the previous value.
    fn insert(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    /// Remove a key; returns its value.
    fn remove(&mut self, key: &Self::Key) -> Option<Self::Value>;

    /// Smallest entry, without restructuring.
    fn first(&self) -> Option<(&Self::Key, &Self::Value)>;

    /// Remove and return the smallest entry.
    fn pop_first(&mut self) -> Option<(Self::Key, Self::Value)>;

    /// Remove every entry.
    fn clear(&mut self);
}

impl<K: Ord, V> OrderedMap for AvlTree<K, V> {
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        AvlTree::len(self)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        AvlTree::get(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        AvlTree::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        AvlTree::remove(self, key)
    }

    fn first(&self) -> Option<(&K, &V)> {
        AvlTree::first(self)
    }

    fn pop_first(&mut self) -> Option<(K, V)> {
        AvlTree::pop_first(self)
    }

    fn clear(&mut self) {
        AvlTree::clear(self)
    }
}

impl<K: Ord, V> OrderedMap for SplayTree<K, V> {
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        SplayTree::len(self)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        SplayTree::get(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        SplayTree::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        SplayTree::remove(self, key)
    }

    fn first(&self) -> Option<(&K, &V)> {
        SplayTree::first(self)
    }

    fn pop_first(&mut self) -> Option<(K, V)> {
        SplayTree::pop_first(self)
    }

    fn clear(&mut self) {
        SplayTree::clear(self)
    }
}

impl<K: Ord, V, R: rand::RngCore, const MAX_LEVEL: usize> OrderedMap
    for SkipList<K, V, R, MAX_LEVEL>
{
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        SkipList::len(self)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        SkipList::get(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        SkipList::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        SkipList::remove(self, key)
    }

    fn first(&self) -> Option<(&K, &V)> {
        SkipList::first(self)
    }

    fn pop_first(&mut self) -> Option<(K, V)> {
        SkipList::pop_first(self)
    }

    fn clear(&mut self) {
        SkipList::clear(self)
    }
}
