//! Fenwick (binary indexed) tree over `i64` addition.
//!
//! The public API is 0-indexed; internally `tree[j]` (1-indexed) covers the
//! `lowbit(j)` elements ending at `j`.

use crate::error::{check_index, check_range, Result};

#[inline]
fn lowbit(j: usize) -> usize {
    j & j.wrapping_neg()
}

/// Prefix sums with point updates, both O(log n).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FenwickTree {
    tree: Vec<i64>,
}

impl Default for FenwickTree {
    fn default() -> Self {
        Self::new(0)
    }
}

impl FenwickTree {
    /// `n` zeros.
    pub fn new(n: usize) -> Self {
        Self {
            tree: vec![0; n + 1],
        }
    }

    /// Build over `values` in O(n).
    pub fn from_slice(values: &[i64]) -> Self {
        let n = values.len();
        let mut tree = vec![0; n + 1];
        tree[1..].copy_from_slice(values);
        for i in 1..=n {
            let j = i + lowbit(i);
            if j <= n {
                tree[j] += tree[i];
            }
        }
        Self { tree }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.tree.len() - 1
    }

    /// Whether there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add `delta` to element `i`.
    pub fn update(&mut self, i: usize, delta: i64) -> Result<()> {
        let n = self.len();
        check_index(i, n)?;
        let mut j = i + 1;
        while j <= n {
            self.tree[j] += delta;
            j += lowbit(j);
        }
        Ok(())
    }

    /// Sum of elements `0..=i`.
    pub fn prefix_sum(&self, i: usize) -> Result<i64> {
        check_index(i, self.len())?;
        Ok(self.prefix(i + 1))
    }

    /// Sum of the first `count` elements.
    fn prefix(&self, count: usize) -> i64 {
        let mut j = count;
        let mut s = 0;
        while j > 0 {
            s += self.tree[j];
            j -= lowbit(j);
        }
        s
    }

    /// Sum of elements `l..=r`.
    pub fn range_sum(&self, l: usize, r: usize) -> Result<i64> {
        check_range(l, r, self.len())?;
        Ok(self.prefix(r + 1) - self.prefix(l))
    }

    /// Current value of element `i`.
    pub fn get(&self, i: usize) -> Result<i64> {
        self.range_sum(i, i)
    }

    /// Overwrite element `i` with `value`.
    pub fn set(&mut self, i: usize, value: i64) -> Result<()> {
        let current = self.get(i)?;
        self.update(i, value - current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_range_sum_scenario() {
        let mut ft = FenwickTree::from_slice(&[1, 3, 5, 7, 9, 11]);
        assert_eq!(ft.range_sum(1, 3), Ok(15));
        ft.update(1, 7).unwrap();
        assert_eq!(ft.range_sum(1, 3), Ok(22));
        ft.set(1, 20).unwrap();
        assert_eq!(ft.range_sum(1, 1), Ok(20));
    }

    #[test]
    fn test_from_slice_matches_updates() {
        let values = [4, -2, 9, 0, 3, 3, -7, 12, 5];
        let built = FenwickTree::from_slice(&values);
        let mut incremental = FenwickTree::new(values.len());
        for (i, &v) in values.iter().enumerate() {
            incremental.update(i, v).unwrap();
        }
        assert_eq!(built, incremental);
        assert_eq!(built.prefix_sum(8), Ok(values.iter().sum()));
    }

    #[test]
    fn test_errors() {
        let mut ft = FenwickTree::new(4);
        assert_eq!(ft.update(4, 1), Err(Error::OutOfRange { index: 4, len: 4 }));
        assert_eq!(ft.range_sum(3, 1), Err(Error::InvalidRange { l: 3, r: 1, len: 4 }));
        assert!(ft.prefix_sum(4).is_err());

        let empty = FenwickTree::new(0);
        assert!(empty.is_empty());
        assert!(empty.get(0).is_err());
    }

    #[test]
    fn test_default_is_empty() {
        let mut ft = FenwickTree::default();
        assert_eq!(ft.len(), 0);
        assert!(ft.is_empty());
        assert_eq!(ft, FenwickTree::new(0));
        assert_eq!(ft.update(0, 1), Err(Error::OutOfRange { index: 0, len: 0 }));
        assert!(ft.range_sum(0, 0).is_err());
    }

    #[test]
    fn test_randomized_against_naive() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(10);
        let n = 50;
        let mut naive = vec![0i64; n];
        let mut ft = FenwickTree::new(n);
        for _ in 0..2_000 {
            let i = rng.gen_range(0..n);
            match rng.gen_range(0..3) {
                0 => {
                    let d = rng.gen_range(-100..100);
                    naive[i] += d;
                    ft.update(i, d).unwrap();
                }
                1 => {
                    let v = rng.gen_range(-100..100);
                    naive[i] = v;
                    ft.set(i, v).unwrap();
                }
                _ => {
                    let r = rng.gen_range(i..n);
                    assert_eq!(ft.range_sum(i, r), Ok(naive[i..=r].iter().sum()));
                }
            }
        }
    }
}
