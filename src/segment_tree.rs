//! Recursive segment tree over an associative operator.
//!
//! Nodes live in a heap-ordered `Vec` (children of `i` at `2i + 1` and
//! `2i + 2`), sized `4n` which always covers the recursion. Ranges are
//! inclusive on both ends.

use std::marker::PhantomData;
use std::ops::Add;

use crate::error::{check_index, check_range, Result};

/// An associative operator with an identity element.
pub trait Monoid {
    /// Element type.
    type Value: Clone;

    /// `combine(identity(), x) == x == combine(x, identity())`.
    fn identity() -> Self::Value;

    /// Must be associative.
    fn combine(a: &Self::Value, b: &Self::Value) -> Self::Value;
}

/// Addition, with `T::default()` as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum<T>(PhantomData<T>);

impl<T> Monoid for Sum<T>
where
    T: Copy + Default + Add<Output = T>,
{
    type Value = T;

    #[inline]
    fn identity() -> T {
        T::default()
    }

    #[inline]
    fn combine(a: &T, b: &T) -> T {
        *a + *b
    }
}

/// Minimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct Min<T>(PhantomData<T>);

/// Maximum.
#[derive(Debug, Clone, Copy, Default)]
pub struct Max<T>(PhantomData<T>);

macro_rules! impl_min_max {
    ($($t:ty),*) => {$(
        impl Monoid for Min<$t> {
            type Value = $t;
            #[inline]
            fn identity() -> $t { <$t>::MAX }
            #[inline]
            fn combine(a: &$t, b: &$t) -> $t { (*a).min(*b) }
        }

        impl Monoid for Max<$t> {
            type Value = $t;
            #[inline]
            fn identity() -> $t { <$t>::MIN }
            #[inline]
            fn combine(a: &$t, b: &$t) -> $t { (*a).max(*b) }
        }
    )*};
}

impl_min_max!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// Range aggregate queries with point updates, both O(log n).
pub struct SegmentTree<M: Monoid> {
    n: usize,
    tree: Vec<M::Value>,
}

impl<M: Monoid> SegmentTree<M> {
    /// Build over `values` in O(n).
    pub fn new(values: &[M::Value]) -> Self {
        let n = values.len();
        let mut st = Self {
            n,
            tree: vec![M::identity(); 4 * n.max(1)],
        };
        if n > 0 {
            st.build(values, 0, 0, n - 1);
        }
        st
    }

    fn build(&mut self, values: &[M::Value], node: usize, lo: usize, hi: usize) {
        if lo == hi {
            self.tree[node] = values[lo].clone();
            return;
        }
        let mid = lo + (hi - lo) / 2;
        self.build(values, 2 * node + 1, lo, mid);
        self.build(values, 2 * node + 2, mid + 1, hi);
        self.tree[node] = M::combine(&self.tree[2 * node + 1], &self.tree[2 * node + 2]);
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.n
    }

    /// Whether the tree covers no elements.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Fold of `values[l..=r]`.
    pub fn query(&self, l: usize, r: usize) -> Result<M::Value> {
        check_range(l, r, self.n)?;
        Ok(self.fold(0, 0, self.n - 1, l, r))
    }

    fn fold(&self, node: usize, lo: usize, hi: usize, l: usize, r: usize) -> M::Value {
        if r < lo || hi < l {
            return M::identity();
        }
        if l <= lo && hi <= r {
            return self.tree[node].clone();
        }
        let mid = lo + (hi - lo) / 2;
        let left = self.fold(2 * node + 1, lo, mid, l, r);
        let right = self.fold(2 * node + 2, mid + 1, hi, l, r);
        M::combine(&left, &right)
    }

    /// Current value at `i`.
    pub fn get(&self, i: usize) -> Result<M::Value> {
        check_index(i, self.n)?;
        Ok(self.fold(0, 0, self.n - 1, i, i))
    }

    /// Replace the value at `i`.
    pub fn update(&mut self, i: usize, value: M::Value) -> Result<()> {
        check_index(i, self.n)?;
        self.assign(0, 0, self.n - 1, i, value);
        Ok(())
    }

    fn assign(&mut self, node: usize, lo: usize, hi: usize, i: usize, value: M::Value) {
        if lo == hi {
            self.tree[node] = value;
            return;
        }
        let mid = lo + (hi - lo) / 2;
        if i <= mid {
            self.assign(2 * node + 1, lo, mid, i, value);
        } else {
            self.assign(2 * node + 2, mid + 1, hi, i, value);
        }
        self.tree[node] = M::combine(&self.tree[2 * node + 1], &self.tree[2 * node + 2]);
    }
}

impl<M: Monoid> Clone for SegmentTree<M> {
    fn clone(&self) -> Self {
        Self {
            n: self.n,
            tree: self.tree.clone(),
        }
    }
}

impl<M: Monoid> std::fmt::Debug for SegmentTree<M>
where
    M::Value: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentTree")
            .field("len", &self.n)
            .field("total", &self.tree.first())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_sum_query_update() {
        let mut st = SegmentTree::<Sum<i64>>::new(&[1, 3, 5, 7, 9, 11]);
        assert_eq!(st.query(1, 3), Ok(15));
        assert_eq!(st.query(0, 5), Ok(36));
        assert_eq!(st.query(4, 4), Ok(9));

        st.update(1, 10).unwrap();
        assert_eq!(st.query(1, 3), Ok(22));
        assert_eq!(st.get(1), Ok(10));
    }

    #[test]
    fn test_min_max() {
        let values = [5u32, 2, 8, 1, 9, 3];
        let min = SegmentTree::<Min<u32>>::new(&values);
        let mut max = SegmentTree::<Max<u32>>::new(&values);
        assert_eq!(min.query(0, 2), Ok(2));
        assert_eq!(min.query(2, 5), Ok(1));
        assert_eq!(max.query(0, 3), Ok(8));
        max.update(3, 100).unwrap();
        assert_eq!(max.query(2, 4), Ok(100));
    }

    #[test]
    fn test_range_errors() {
        let mut st = SegmentTree::<Sum<i64>>::new(&[1, 2, 3]);
        assert_eq!(st.query(2, 1), Err(Error::InvalidRange { l: 2, r: 1, len: 3 }));
        assert_eq!(st.query(0, 3), Err(Error::InvalidRange { l: 0, r: 3, len: 3 }));
        assert_eq!(st.update(3, 0), Err(Error::OutOfRange { index: 3, len: 3 }));

        let empty = SegmentTree::<Sum<i64>>::new(&[]);
        assert!(empty.is_empty());
        assert!(empty.query(0, 0).is_err());
    }

    #[test]
    fn test_randomized_against_naive() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(9);
        for n in [1usize, 2, 3, 7, 64, 100] {
            let mut naive: Vec<i64> = (0..n).map(|_| rng.gen_range(-50..50)).collect();
            let mut sum = SegmentTree::<Sum<i64>>::new(&naive);
            let mut min = SegmentTree::<Min<i64>>::new(&naive);

            for _ in 0..500 {
                if rng.gen_bool(0.3) {
                    let i = rng.gen_range(0..n);
                    let v = rng.gen_range(-50..50);
                    naive[i] = v;
                    sum.update(i, v).unwrap();
                    min.update(i, v).unwrap();
                } else {
                    let l = rng.gen_range(0..n);
                    let r = rng.gen_range(l..n);
                    assert_eq!(sum.query(l, r), Ok(naive[l..=r].iter().sum()));
                    assert_eq!(min.query(l, r).ok(), naive[l..=r].iter().copied().min());
                }
            }
        }
    }
}
