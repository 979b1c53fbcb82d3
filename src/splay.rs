//! Bottom-up splay tree ordered map.
//!
//! Every access ends by splaying the touched node (or, for a miss, the last
//! node visited) to the root using parent pointers:
//!
//! - **zig**: parent is the root → one rotation.
//! - **zig-zig**: node and parent lean the same way → rotate the grandparent
//!   first, then the parent.
//! - **zig-zag**: they lean opposite ways → rotate the parent, then the
//!   grandparent.
//!
//! There is no height invariant; operations are amortised O(log n). Because
//! reads restructure the tree, `get` and `contains_key` take `&mut self`.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use crate::arena::{ArenaIter, Linked, Links, Ptr, TreeArena};

#[derive(Clone)]
struct SplayNode<K, V> {
    key: K,
    value: V,
    links: Links,
}

impl<K, V> Linked for SplayNode<K, V> {
    #[inline]
    fn links(&self) -> &Links {
        &self.links
    }

    #[inline]
    fn links_mut(&mut self) -> &mut Links {
        &mut self.links
    }
}

/// A self-adjusting binary search tree.
#[derive(Clone)]
pub struct SplayTree<K, V = ()> {
    tree: TreeArena<SplayNode<K, V>>,
}

impl<K, V> SplayTree<K, V> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            tree: TreeArena::new(),
        }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether the tree is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Key currently at the root, i.e. the most recently touched one.
    pub fn root_key(&self) -> Option<&K> {
        let root = self.tree.root;
        (!root.is_null()).then(|| &self.tree.node(root).key)
    }

    /// Smallest entry, without splaying.
    pub fn first(&self) -> Option<(&K, &V)> {
        let p = self.tree.first_in(self.tree.root);
        if p.is_null() {
            return None;
        }
        let node = self.tree.node(p);
        Some((&node.key, &node.value))
    }

    /// Entries in ascending key order. Iteration does not splay.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.tree.iter(),
        }
    }

    /// Remove and return the smallest entry.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let p = self.tree.first_in(self.tree.root);
        if p.is_null() {
            return None;
        }
        self.splay(p);
        Some(self.remove_root())
    }

    fn splay(&mut self, x: Ptr) {
        loop {
            let p = self.tree.parent(x);
            if p.is_null() {
                break;
            }
            let x_is_left = self.tree.left(p) == x;
            let g = self.tree.parent(p);

            if g.is_null() {
                // zig
                if x_is_left {
                    self.tree.rotate_right(p);
                } else {
                    self.tree.rotate_left(p);
                }
                continue;
            }

            let p_is_left = self.tree.left(g) == p;
            match (x_is_left, p_is_left) {
                // zig-zig
                (true, true) => {
                    self.tree.rotate_right(g);
                    self.tree.rotate_right(p);
                }
                (false, false) => {
                    self.tree.rotate_left(g);
                    self.tree.rotate_left(p);
                }
                // zig-zag
                (true, false) => {
                    self.tree.rotate_right(p);
                    self.tree.rotate_left(g);
                }
                (false, true) => {
                    self.tree.rotate_left(p);
                    self.tree.rotate_right(g);
                }
            }
        }
        debug_assert_eq!(self.tree.root, x);
    }

    /// Remove the root: splay the maximum of the left subtree to its top and
    /// hang the right subtree off it.
    fn remove_root(&mut self) -> (K, V) {
        let x = self.tree.root;
        let left = self.tree.left(x);
        let right = self.tree.right(x);

        if left.is_null() {
            self.tree.root = right;
            if !right.is_null() {
                self.tree.set_parent(right, Ptr::NULL);
            }
        } else {
            self.tree.set_parent(left, Ptr::NULL);
            self.tree.root = left;
            let max = self.tree.last_in(left);
            self.splay(max);
            self.tree.set_right(max, right);
        }

        // `x` is fully detached now, so the arena may move another node into
        // its slot.
        let (node, _) = self.tree.free(x);
        (node.key, node.value)
    }

    /// Panics if any structural invariant is broken.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self)
    where
        K: Ord,
    {
        self.tree.assert_links();
        let keys: Vec<&K> = self.iter().map(|(k, _)| k).collect();
        assert!(
            keys.windows(2).all(|w| w[0] < w[1]),
            "inorder keys must be strictly increasing"
        );
    }
}

impl<K: Ord, V> SplayTree<K, V> {
    /// Descend towards `key`, splay the last node visited and report whether
    /// it holds `key`.
    fn access<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.tree.root;
        let mut last = Ptr::NULL;
        let mut found = false;
        while !cur.is_null() {
            last = cur;
            match key.cmp(self.tree.node(cur).key.borrow()) {
                Ordering::Less => cur = self.tree.left(cur),
                Ordering::Greater => cur = self.tree.right(cur),
                Ordering::Equal => {
                    found = true;
                    break;
                }
            }
        }
        if !last.is_null() {
            self.splay(last);
        }
        found
    }

    /// Insert `key`; the new (or updated) node ends at the root.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut parent = Ptr::NULL;
        let mut cur = self.tree.root;
        let mut go_left = false;

        while !cur.is_null() {
            parent = cur;
            match key.cmp(&self.tree.node(cur).key) {
                Ordering::Less => {
                    cur = self.tree.left(cur);
                    go_left = true;
                }
                Ordering::Greater => {
                    cur = self.tree.right(cur);
                    go_left = false;
                }
                Ordering::Equal => {
                    let old = std::mem::replace(&mut self.tree.node_mut(cur).value, value);
                    self.splay(cur);
                    return Some(old);
                }
            }
        }

        let node = self.tree.alloc(SplayNode {
            key,
            value,
            links: Links::DETACHED,
        });
        if parent.is_null() {
            self.tree.root = node;
        } else if go_left {
            self.tree.set_left(parent, node);
        } else {
            self.tree.set_right(parent, node);
        }
        self.splay(node);
        None
    }

    /// Whether `key` is present. Splays the found (or last visited) node.
    pub fn contains_key<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.access(key)
    }

    /// Value stored under `key`. Splays the found (or last visited) node.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if self.access(key) {
            Some(&self.tree.node(self.tree.root).value)
        } else {
            None
        }
    }

    /// Remove `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if self.access(key) {
            Some(self.remove_root().1)
        } else {
            None
        }
    }

    /// Remove `key`; `false` if it was absent (the tree is only re-splayed).
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove(key).is_some()
    }
}

impl<K, V> Default for SplayTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for SplayTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Ascending iterator over a [`SplayTree`].
pub struct Iter<'a, K, V> {
    inner: ArenaIter<'a, SplayNode<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|n| (&n.key, &n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_moves_to_root() {
        let mut t: SplayTree<u32> = SplayTree::new();
        for k in [50, 30, 70, 20, 40, 60, 80] {
            t.insert(k, ());
            assert_eq!(t.root_key(), Some(&k));
            t.assert_invariants();
        }

        assert!(t.contains_key(&40));
        assert_eq!(t.root_key(), Some(&40));
        t.assert_invariants();

        assert!(t.contains_key(&20));
        assert_eq!(t.root_key(), Some(&20));
        t.assert_invariants();
    }

    #[test]
    fn test_miss_splays_last_visited() {
        let mut t: SplayTree<u32> = SplayTree::new();
        for k in [10, 20, 30] {
            t.insert(k, ());
        }
        // 25 is absent; the search ends at 20 or 30.
        assert!(!t.contains_key(&25));
        let root = *t.root_key().unwrap();
        assert!(root == 20 || root == 30);
        assert_eq!(t.len(), 3);
        t.assert_invariants();

        assert!(!t.delete(&25));
        assert_eq!(t.len(), 3);
        t.assert_invariants();
    }

    #[test]
    fn test_zig_zig_rotates_grandparent_first() {
        // Ascending inserts build a left-leaning path: 3 → 2 → 1.
        let mut t: SplayTree<u32> = SplayTree::new();
        for k in [1, 2, 3] {
            t.insert(k, ());
        }
        assert!(t.contains_key(&1));
        // Grandparent-first rotation leaves 1 at the root with 2 as its right
        // child and 3 below 2 (two independent zigs would put 3 under 1).
        let root = t.tree.root;
        let right = t.tree.right(root);
        assert_eq!(t.tree.node(right).key, 2);
        assert_eq!(t.tree.node(t.tree.right(right)).key, 3);
        t.assert_invariants();
    }

    #[test]
    fn test_delete_joins_subtrees() {
        let mut t: SplayTree<u32, u32> = SplayTree::new();
        for k in 0..64 {
            t.insert(k, k + 100);
        }
        assert_eq!(t.remove(&31), Some(131));
        assert!(!t.contains_key(&31));
        t.assert_invariants();

        assert!(t.delete(&0));
        assert!(t.delete(&63));
        assert_eq!(t.len(), 61);
        t.assert_invariants();

        let keys: Vec<u32> = t.iter().map(|(k, _)| *k).collect();
        let expected: Vec<u32> = (1..63).filter(|k| *k != 31).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_single_node_delete() {
        let mut t: SplayTree<&str, u8> = SplayTree::new();
        t.insert("only", 1);
        assert!(t.delete("only"));
        assert!(t.is_empty());
        assert_eq!(t.root_key(), None);
        assert!(!t.delete("only"));
    }

    #[test]
    fn test_randomized_against_btreemap() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        use std::collections::BTreeMap;

        let mut rng = StdRng::seed_from_u64(4);
        let mut t: SplayTree<u16, u64> = SplayTree::new();
        let mut m: BTreeMap<u16, u64> = BTreeMap::new();

        for i in 0..20_000 {
            let key: u16 = rng.gen_range(0..1024);
            match rng.gen_range(0..100) {
                0..=54 => {
                    let v: u64 = rng.gen();
                    assert_eq!(t.insert(key, v), m.insert(key, v));
                    assert_eq!(t.root_key(), Some(&key));
                }
                55..=84 => {
                    assert_eq!(t.remove(&key), m.remove(&key));
                }
                _ => {
                    let got = t.get(&key).copied();
                    assert_eq!(got, m.get(&key).copied());
                    if got.is_some() {
                        assert_eq!(t.root_key(), Some(&key));
                    }
                }
            }
            if i % 997 == 0 {
                t.assert_invariants();
            }
        }

        t.assert_invariants();
        let got: Vec<(u16, u64)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u16, u64)> = m.into_iter().collect();
        assert_eq!(got, expected);
    }
}
