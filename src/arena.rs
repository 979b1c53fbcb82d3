//! Index arena for the binary search trees.
//!
//! Nodes live in one `Vec` and refer to each other through 32-bit [`Ptr`]s.
//! Ownership flows root → children; the `parent` field is a plain back-edge
//! that every rotation keeps in sync. Freeing a node swap-removes it from the
//! vector and patches every link that pointed at the moved node, so the arena
//! never has holes.

/// 32-bit node reference. `NULL` marks an absent child/parent.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Ptr(u32);

impl Ptr {
    pub(crate) const NULL: Ptr = Ptr(u32::MAX);

    #[inline]
    pub(crate) fn new(idx: usize) -> Self {
        debug_assert!(idx < u32::MAX as usize);
        Self(idx as u32)
    }

    #[inline]
    pub(crate) fn is_null(self) -> bool {
        self.0 == Self::NULL.0
    }

    #[inline]
    pub(crate) fn idx(self) -> usize {
        debug_assert!(!self.is_null());
        self.0 as usize
    }
}

/// Structural links of a tree node.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Links {
    pub(crate) left: Ptr,
    pub(crate) right: Ptr,
    pub(crate) parent: Ptr,
}

impl Links {
    pub(crate) const DETACHED: Links = Links {
        left: Ptr::NULL,
        right: Ptr::NULL,
        parent: Ptr::NULL,
    };
}

/// A node type that embeds [`Links`].
pub(crate) trait Linked {
    fn links(&self) -> &Links;
    fn links_mut(&mut self) -> &mut Links;
}

#[derive(Clone)]
pub(crate) struct TreeArena<N> {
    nodes: Vec<N>,
    pub(crate) root: Ptr,
}

impl<N: Linked> TreeArena<N> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: Ptr::NULL,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = Ptr::NULL;
    }

    pub(crate) fn alloc(&mut self, node: N) -> Ptr {
        let p = Ptr::new(self.nodes.len());
        self.nodes.push(node);
        p
    }

    #[inline]
    pub(crate) fn node(&self, p: Ptr) -> &N {
        &self.nodes[p.idx()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, p: Ptr) -> &mut N {
        &mut self.nodes[p.idx()]
    }

    /// Two distinct nodes mutably at once.
    pub(crate) fn pair_mut(&mut self, a: Ptr, b: Ptr) -> (&mut N, &mut N) {
        let (a, b) = (a.idx(), b.idx());
        assert_ne!(a, b, "pair_mut on a single node");
        if a < b {
            let (lo, hi) = self.nodes.split_at_mut(b);
            (&mut lo[a], &mut hi[0])
        } else {
            let (lo, hi) = self.nodes.split_at_mut(a);
            (&mut hi[0], &mut lo[b])
        }
    }

    #[inline]
    pub(crate) fn left(&self, p: Ptr) -> Ptr {
        self.node(p).links().left
    }

    #[inline]
    pub(crate) fn right(&self, p: Ptr) -> Ptr {
        self.node(p).links().right
    }

    #[inline]
    pub(crate) fn parent(&self, p: Ptr) -> Ptr {
        self.node(p).links().parent
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, p: Ptr, parent: Ptr) {
        self.node_mut(p).links_mut().parent = parent;
    }

    /// Set `p.left = c` and, if `c` is a node, `c.parent = p`.
    #[inline]
    pub(crate) fn set_left(&mut self, p: Ptr, c: Ptr) {
        self.node_mut(p).links_mut().left = c;
        if !c.is_null() {
            self.set_parent(c, p);
        }
    }

    /// Set `p.right = c` and, if `c` is a node, `c.parent = p`.
    #[inline]
    pub(crate) fn set_right(&mut self, p: Ptr, c: Ptr) {
        self.node_mut(p).links_mut().right = c;
        if !c.is_null() {
            self.set_parent(c, p);
        }
    }

    /// Make `new` take the slot `old` occupies under `parent` (or the root).
    pub(crate) fn replace_child(&mut self, parent: Ptr, old: Ptr, new: Ptr) {
        if parent.is_null() {
            self.root = new;
            if !new.is_null() {
                self.set_parent(new, Ptr::NULL);
            }
        } else if self.left(parent) == old {
            self.set_left(parent, new);
        } else {
            debug_assert_eq!(self.right(parent), old);
            self.set_right(parent, new);
        }
    }

    /// Rotate `x` down to the left; its right child takes its place.
    /// Returns the new subtree root.
    pub(crate) fn rotate_left(&mut self, x: Ptr) -> Ptr {
        let y = self.right(x);
        debug_assert!(!y.is_null());
        let parent = self.parent(x);
        let inner = self.left(y);
        self.set_right(x, inner);
        self.set_left(y, x);
        self.replace_child(parent, x, y);
        y
    }

    /// Rotate `x` down to the right; its left child takes its place.
    /// Returns the new subtree root.
    pub(crate) fn rotate_right(&mut self, x: Ptr) -> Ptr {
        let y = self.left(x);
        debug_assert!(!y.is_null());
        let parent = self.parent(x);
        let inner = self.right(y);
        self.set_left(x, inner);
        self.set_right(y, x);
        self.replace_child(parent, x, y);
        y
    }

    /// Leftmost node of the subtree at `p`.
    pub(crate) fn first_in(&self, mut p: Ptr) -> Ptr {
        if p.is_null() {
            return p;
        }
        while !self.left(p).is_null() {
            p = self.left(p);
        }
        p
    }

    /// Rightmost node of the subtree at `p`.
    pub(crate) fn last_in(&self, mut p: Ptr) -> Ptr {
        if p.is_null() {
            return p;
        }
        while !self.right(p).is_null() {
            p = self.right(p);
        }
        p
    }

    /// In-order successor of `p`.
    pub(crate) fn next(&self, p: Ptr) -> Ptr {
        let r = self.right(p);
        if !r.is_null() {
            return self.first_in(r);
        }
        let mut child = p;
        let mut up = self.parent(p);
        while !up.is_null() && self.right(up) == child {
            child = up;
            up = self.parent(up);
        }
        up
    }

    /// Remove a detached node from the arena.
    ///
    /// `p` must no longer be referenced by any live node or by `root`. The
    /// last node in the vector is moved into `p`'s slot; the returned `Ptr` is
    /// the index it moved from (`NULL` if nothing moved) so callers can fix up
    /// any cursors they hold.
    pub(crate) fn free(&mut self, p: Ptr) -> (N, Ptr) {
        let last = Ptr::new(self.nodes.len() - 1);
        if p == last {
            return (self.nodes.swap_remove(p.idx()), Ptr::NULL);
        }

        let Links {
            left,
            right,
            parent,
        } = *self.node(last).links();
        if parent.is_null() {
            if self.root == last {
                self.root = p;
            }
        } else if self.left(parent) == last {
            self.node_mut(parent).links_mut().left = p;
        } else if self.right(parent) == last {
            self.node_mut(parent).links_mut().right = p;
        }
        if !left.is_null() {
            self.set_parent(left, p);
        }
        if !right.is_null() {
            self.set_parent(right, p);
        }

        (self.nodes.swap_remove(p.idx()), last)
    }

    pub(crate) fn iter(&self) -> ArenaIter<'_, N> {
        ArenaIter {
            arena: self,
            cur: self.first_in(self.root),
            remaining: self.nodes.len(),
        }
    }

    /// Panics unless every child points back at its parent and the root has
    /// no parent. Returns the number of reachable nodes.
    #[cfg(test)]
    pub(crate) fn assert_links(&self) -> usize {
        if self.root.is_null() {
            return 0;
        }
        assert!(self.parent(self.root).is_null(), "root must not have a parent");
        let mut stack = vec![self.root];
        let mut seen = 0usize;
        while let Some(p) = stack.pop() {
            seen += 1;
            for c in [self.left(p), self.right(p)] {
                if !c.is_null() {
                    assert_eq!(self.parent(c), p, "parent(child) must equal node");
                    stack.push(c);
                }
            }
        }
        assert_eq!(seen, self.nodes.len(), "every arena node must be reachable");
        seen
    }
}

/// In-order traversal over the arena, yielding node pointers.
pub(crate) struct ArenaIter<'a, N> {
    arena: &'a TreeArena<N>,
    cur: Ptr,
    remaining: usize,
}

impl<'a, N: Linked> Iterator for ArenaIter<'a, N> {
    type Item = &'a N;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur.is_null() {
            return None;
        }
        let node = self.arena.node(self.cur);
        self.cur = self.arena.next(self.cur);
        self.remaining -= 1;
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, N: Linked> ExactSizeIterator for ArenaIter<'a, N> {}
