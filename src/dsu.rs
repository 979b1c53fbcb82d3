//! Disjoint-set union with full path compression and union by rank.
//!
//! `find` rewrites parent pointers as it goes, so every operation, lookups
//! included, needs `&mut self`. Share a `DisjointSet` across threads only
//! behind a lock that serialises *all* calls.

use crate::error::{check_index, Result};

/// A partition of `{0, …, n-1}` into equivalence classes.
#[derive(Clone, Debug)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
    size: Vec<usize>,
    components: usize,
}

impl DisjointSet {
    /// `n` singleton classes.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
            size: vec![1; n],
            components: n,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether the universe is empty.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Number of classes.
    pub fn count_components(&self) -> usize {
        self.components
    }

    /// Representative of `i`'s class.
    pub fn find(&mut self, i: usize) -> Result<usize> {
        check_index(i, self.parent.len())?;
        Ok(self.root(i))
    }

    fn root(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Second pass: point everything on the path straight at the root.
        let mut cur = i;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Merge the classes of `i` and `j`.
    ///
    /// `Ok(false)` means they were already joined; an out-of-range index is an
    /// error and leaves the structure untouched.
    pub fn union(&mut self, i: usize, j: usize) -> Result<bool> {
        let n = self.parent.len();
        check_index(i, n)?;
        check_index(j, n)?;

        let (a, b) = (self.root(i), self.root(j));
        if a == b {
            return Ok(false);
        }
        let (hi, lo) = if self.rank[a] >= self.rank[b] { (a, b) } else { (b, a) };
        self.parent[lo] = hi;
        self.size[hi] += self.size[lo];
        if self.rank[hi] == self.rank[lo] {
            self.rank[hi] += 1;
        }
        self.components -= 1;
        Ok(true)
    }

    /// Whether `i` and `j` share a class.
    pub fn connected(&mut self, i: usize, j: usize) -> Result<bool> {
        Ok(self.find(i)? == self.find(j)?)
    }

    /// Number of elements in `i`'s class.
    pub fn component_size(&mut self, i: usize) -> Result<usize> {
        let r = self.find(i)?;
        Ok(self.size[r])
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        let n = self.parent.len();
        let mut roots = 0;
        for i in 0..n {
            let p = self.parent[i];
            assert!(p < n, "parent out of range");
            if p == i {
                roots += 1;
            } else {
                assert!(self.rank[p] > self.rank[i], "rank must grow towards the root");
            }
        }
        assert_eq!(roots, self.components, "one self-loop per class");
    }
}
