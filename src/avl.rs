//! AVL tree ordered map.
//!
//! Every node caches the height of its subtree and every mutation walks back
//! up the parent chain, recomputing heights and applying one of the four
//! rotations (L-L, R-R, L-R, R-L) wherever the balance factor leaves
//! `[-1, 1]`. Deletion of a node with two children swaps in its in-order
//! successor first.
//!
//! Inserting an existing key overwrites the value and returns the old one.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use crate::arena::{Linked, Links, Ptr, TreeArena};

#[derive(Clone)]
struct AvlNode<K, V> {
    key: K,
    value: V,
    height: u8,
    links: Links,
}

impl<K, V> Linked for AvlNode<K, V> {
    #[inline]
    fn links(&self) -> &Links {
        &self.links
    }

    #[inline]
    fn links_mut(&mut self) -> &mut Links {
        &mut self.links
    }
}

/// A height-balanced binary search tree.
///
/// ```
/// use algokit::AvlTree;
///
/// let mut tree = AvlTree::new();
/// for k in [10, 20, 30, 40, 50, 25] {
///     tree.insert(k, ());
/// }
/// assert_eq!(tree.root_key(), Some(&30));
/// assert_eq!(tree.inorder(), vec![&10, &20, &25, &30, &40, &50]);
/// ```
#[derive(Clone)]
pub struct AvlTree<K, V = ()> {
    tree: TreeArena<AvlNode<K, V>>,
}

impl<K, V> AvlTree<K, V> {
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

    /// Height of the whole tree (0 when empty, 1 for a single leaf).
    pub fn height(&self) -> usize {
        self.h(self.tree.root) as usize
    }

    /// Key stored at the root.
    pub fn root_key(&self) -> Option<&K> {
        let root = self.tree.root;
        (!root.is_null()).then(|| &self.tree.node(root).key)
    }

    /// Smallest entry.
    pub fn first(&self) -> Option<(&K, &V)> {
        let p = self.tree.first_in(self.tree.root);
        (!p.is_null()).then(|| self.entry(p))
    }

    /// Largest entry.
    pub fn last(&self) -> Option<(&K, &V)> {
        let p = self.tree.last_in(self.tree.root);
        (!p.is_null()).then(|| self.entry(p))
    }

    /// Keys in ascending order.
    pub fn inorder(&self) -> Vec<&K> {
        self.iter().map(|(k, _)| k).collect()
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.tree.iter(),
        }
    }

    /// Remove and return the smallest entry.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let p = self.tree.first_in(self.tree.root);
        (!p.is_null()).then(|| self.remove_ptr(p))
    }

    #[inline]
    fn entry(&self, p: Ptr) -> (&K, &V) {
        let n = self.tree.node(p);
        (&n.key, &n.value)
    }

    #[inline]
    fn h(&self, p: Ptr) -> u8 {
        if p.is_null() {
            0
        } else {
            self.tree.node(p).height
        }
    }

    #[inline]
    fn balance(&self, p: Ptr) -> i16 {
        self.h(self.tree.left(p)) as i16 - self.h(self.tree.right(p)) as i16
    }

    #[inline]
    fn update_height(&mut self, p: Ptr) {
        let h = 1 + self.h(self.tree.left(p)).max(self.h(self.tree.right(p)));
        self.tree.node_mut(p).height = h;
    }

    fn rotate_left(&mut self, x: Ptr) -> Ptr {
        let y = self.tree.rotate_left(x);
        self.update_height(x);
        self.update_height(y);
        y
    }

    fn rotate_right(&mut self, x: Ptr) -> Ptr {
        let y = self.tree.rotate_right(x);
        self.update_height(x);
        self.update_height(y);
        y
    }

    /// Restore the balance invariant at `p`; returns the subtree's new root.
    fn rebalance(&mut self, p: Ptr) -> Ptr {
        let bf = self.balance(p);
        if bf > 1 {
            let l = self.tree.left(p);
            if self.balance(l) < 0 {
                // L-R
                self.rotate_left(l);
            }
            self.rotate_right(p)
        } else if bf < -1 {
            let r = self.tree.right(p);
            if self.balance(r) > 0 {
                // R-L
                self.rotate_right(r);
            }
            self.rotate_left(p)
        } else {
            p
        }
    }

    /// Walk from `p` to the root fixing heights and balance.
    fn retrace(&mut self, mut p: Ptr) {
        while !p.is_null() {
            self.update_height(p);
            let top = self.rebalance(p);
            p = self.tree.parent(top);
        }
    }

    /// Unlink `p` from the tree and return its entry.
    fn remove_ptr(&mut self, mut p: Ptr) -> (K, V) {
        let left = self.tree.left(p);
        let right = self.tree.right(p);

        if !left.is_null() && !right.is_null() {
            // Move the successor's entry into `p`, then delete the successor.
            let succ = self.tree.first_in(right);
            let (a, b) = self.tree.pair_mut(p, succ);
            std::mem::swap(&mut a.key, &mut b.key);
            std::mem::swap(&mut a.value, &mut b.value);
            p = succ;
        }

        // `p` now has at most one child.
        let child = if self.tree.left(p).is_null() {
            self.tree.right(p)
        } else {
            self.tree.left(p)
        };
        let mut parent = self.tree.parent(p);
        self.tree.replace_child(parent, p, child);

        let (node, moved) = self.tree.free(p);
        if parent == moved {
            parent = p;
        }
        self.retrace(parent);
        (node.key, node.value)
    }

    /// Panics if any structural invariant is broken.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self)
    where
        K: Ord,
    {
        self.tree.assert_links();
        self.check_subtree(self.tree.root);
        let keys = self.inorder();
        assert!(
            keys.windows(2).all(|w| w[0] < w[1]),
            "inorder keys must be strictly increasing"
        );
    }

    #[cfg(test)]
    fn check_subtree(&self, p: Ptr) -> u8 {
        if p.is_null() {
            return 0;
        }
        let lh = self.check_subtree(self.tree.left(p));
        let rh = self.check_subtree(self.tree.right(p));
        assert!(
            (lh as i16 - rh as i16).abs() <= 1,
            "balance factor out of range"
        );
        assert_eq!(self.tree.node(p).height, 1 + lh.max(rh), "stale cached height");
        1 + lh.max(rh)
    }
}

impl<K: Ord, V> AvlTree<K, V> {
    fn find<Q>(&self, key: &Q) -> Ptr
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.tree.root;
        while !cur.is_null() {
            match key.cmp(self.tree.node(cur).key.borrow()) {
                Ordering::Less => cur = self.tree.left(cur),
                Ordering::Greater => cur = self.tree.right(cur),
                Ordering::Equal => return cur,
            }
        }
        Ptr::NULL
    }

    /// Insert `key`, rebalancing on the way back up.
    ///
    /// Returns the previous value when the key was already present; the tree
    /// shape does not change in that case.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut parent = Ptr::NULL;
        let mut cur = self.tree.root;
        let mut go_left = false;

        while !cur.is_null() {
            match key.cmp(&self.tree.node(cur).key) {
                Ordering::Less => {
                    parent = cur;
                    cur = self.tree.left(cur);
                    go_left = true;
                }
                Ordering::Greater => {
                    parent = cur;
                    cur = self.tree.right(cur);
                    go_left = false;
                }
                Ordering::Equal => {
                    return Some(std::mem::replace(&mut self.tree.node_mut(cur).value, value));
                }
            }
        }

        let node = self.tree.alloc(AvlNode {
            key,
            value,
            height: 1,
            links: Links::DETACHED,
        });
        if parent.is_null() {
            self.tree.root = node;
        } else if go_left {
            self.tree.set_left(parent, node);
        } else {
            self.tree.set_right(parent, node);
        }
        self.retrace(parent);
        None
    }

    /// Whether `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        !self.find(key).is_null()
    }

    /// Value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let p = self.find(key);
        (!p.is_null()).then(|| &self.tree.node(p).value)
    }

    /// Mutable value stored under `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let p = self.find(key);
        if p.is_null() {
            None
        } else {
            Some(&mut self.tree.node_mut(p).value)
        }
    }

    /// Remove `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let p = self.find(key);
        (!p.is_null()).then(|| self.remove_ptr(p).1)
    }
}

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        for (k, v) in iter {
            tree.insert(k, v);
        }
        tree
    }
}

/// Ascending iterator over an [`AvlTree`].
pub struct Iter<'a, K, V> {
    inner: crate::arena::ArenaIter<'a, AvlNode<K, V>>,
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
