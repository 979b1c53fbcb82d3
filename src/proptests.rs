use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u64),
    Remove(u16),
    Get(u16),
    PopFirst,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    // A narrow key space so removes and overwrites actually hit.
    let key = 0u16..512;
    let op = prop_oneof![
        50 => (key.clone(), any::<u64>()).prop_map(|(k, v)| Op::Insert(k, v)),
        25 => key.clone().prop_map(Op::Remove),
        24 => key.prop_map(Op::Get),
        1 => Just(Op::PopFirst),
    ];
    prop::collection::vec(op, 0..=1000)
}

/// Replays `ops` against `map` and a `BTreeMap`, calling `validate` after
/// every mutation.
fn check_equivalence<M>(
    mut map: M,
    ops: Vec<Op>,
    validate: impl Fn(&M),
) -> std::result::Result<(), TestCaseError>
where
    M: OrderedMap<Key = u16, Value = u64>,
{
    let mut m: BTreeMap<u16, u64> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Insert(key, value) => {
                prop_assert_eq!(map.insert(key, value), m.insert(key, value));
            }
            Op::Remove(key) => {
                prop_assert_eq!(map.remove(&key), m.remove(&key));
            }
            Op::Get(key) => {
                prop_assert_eq!(map.get(&key).copied(), m.get(&key).copied());
            }
            Op::PopFirst => {
                prop_assert_eq!(map.pop_first(), m.pop_first());
            }
        }
        prop_assert_eq!(map.len(), m.len());
        validate(&map);
    }

    let mut drained = Vec::with_capacity(m.len());
    while let Some(kv) = map.pop_first() {
        drained.push(kv);
    }
    let expected: Vec<(u16, u64)> = m.into_iter().collect();
    prop_assert_eq!(drained, expected);
    Ok(())
}

/// Three-letter alphabet, small enough that palindromes are common.
#[derive(Clone, Copy, Debug, Arbitrary)]
enum Letter {
    A,
    B,
    C,
}

impl Letter {
    fn as_char(self) -> char {
        match self {
            Letter::A => 'a',
            Letter::B => 'b',
            Letter::C => 'c',
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_avl_equivalence(ops in ops_strategy()) {
        check_equivalence(AvlTree::new(), ops, |t| t.assert_invariants())?;
    }

    #[test]
    fn prop_splay_equivalence(ops in ops_strategy()) {
        check_equivalence(SplayTree::new(), ops, |t| t.assert_invariants())?;
    }

    #[test]
    fn prop_skiplist_equivalence(seed in any::<u64>(), ops in ops_strategy()) {
        let list = SkipList::<u16, u64, StdRng, 12>::with_rng(StdRng::seed_from_u64(seed));
        check_equivalence(list, ops, |s| s.assert_invariants())?;
    }

    #[test]
    fn prop_heap_pops_sorted(mut items in prop::collection::vec(any::<i32>(), 0..300)) {
        let mut h = MinHeap::new();
        h.extend(items.iter().copied());
        let mut out = Vec::with_capacity(items.len());
        while let Some(x) = h.pop_min() {
            out.push(x);
        }
        items.sort_unstable();
        prop_assert_eq!(out, items);
    }

    #[test]
    fn prop_range_sums_match(
        values in prop::collection::vec(-1_000i64..1_000, 1..64),
        updates in prop::collection::vec((any::<prop::sample::Index>(), -1_000i64..1_000), 0..32),
        l in any::<prop::sample::Index>(),
        r in any::<prop::sample::Index>(),
    ) {
        let mut a = values.clone();
        let mut seg = SegmentTree::<Sum<i64>>::new(&values);
        let mut fen = FenwickTree::from_slice(&values);

        for (idx, v) in updates {
            let i = idx.index(a.len());
            a[i] = v;
            seg.update(i, v).unwrap();
            fen.set(i, v).unwrap();
        }

        let (l, r) = (l.index(a.len()), r.index(a.len()));
        let (l, r) = (l.min(r), l.max(r));
        let expected: i64 = a[l..=r].iter().sum();
        prop_assert_eq!(seg.query(l, r), Ok(expected));
        prop_assert_eq!(fen.range_sum(l, r), Ok(expected));
    }

    #[test]
    fn prop_aho_corasick_reports_every_occurrence(
        patterns in prop::collection::vec("[ab]{1,4}", 1..6),
        text in "[abc]{0,48}",
    ) {
        let ac = AhoCorasick::new(patterns.iter().map(String::as_str)).unwrap();
        let mut got: Vec<(usize, usize)> = ac.find_iter(&text).map(|m| (m.pattern, m.start)).collect();
        got.sort_unstable();

        let mut expected = Vec::new();
        for (id, p) in patterns.iter().enumerate() {
            for start in 0..text.len() {
                if text[start..].starts_with(p.as_str()) {
                    expected.push((id, start));
                }
            }
        }
        expected.sort_unstable();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_eertree_counts_distinct_palindromes(letters in prop::collection::vec(any::<Letter>(), 0..40)) {
        let text: String = letters.iter().map(|l| l.as_char()).collect();
        let t = PalindromicTree::from(text.as_str());
        let bytes = text.as_bytes();
        let mut distinct = std::collections::BTreeSet::new();
        for i in 0..bytes.len() {
            for j in i + 1..=bytes.len() {
                let sub = &bytes[i..j];
                if sub.iter().eq(sub.iter().rev()) {
                    distinct.insert(sub);
                }
            }
        }
        prop_assert_eq!(t.node_count() - 2, distinct.len());
    }

    #[test]
    fn prop_suffix_array_is_sorted(text in "[ab]{0,64}") {
        let sa = SuffixArray::new(&text);
        let suffixes = sa.suffixes();
        prop_assert_eq!(suffixes.len(), text.len());
        for w in suffixes.windows(2) {
            prop_assert!(text[w[0]..] < text[w[1]..]);
        }
        for (i, w) in suffixes.windows(2).enumerate() {
            let common = text[w[0]..]
                .bytes()
                .zip(text[w[1]..].bytes())
                .take_while(|(a, b)| a == b)
                .count();
            prop_assert_eq!(sa.lcp()[i + 1], common);
        }
    }

    #[test]
    fn prop_dsu_matches_labels(
        n in 1usize..64,
        unions in prop::collection::vec((any::<prop::sample::Index>(), any::<prop::sample::Index>()), 0..128),
    ) {
        let mut d = DisjointSet::new(n);
        let mut label: Vec<usize> = (0..n).collect();
        for (a, b) in unions {
            let (i, j) = (a.index(n), b.index(n));
            d.union(i, j).unwrap();
            let (from, to) = (label[j], label[i]);
            for l in label.iter_mut() {
                if *l == from {
                    *l = to;
                }
            }
        }
        let classes: std::collections::BTreeSet<usize> = label.iter().copied().collect();
        prop_assert_eq!(d.count_components(), classes.len());
        for i in 0..n {
            for j in 0..n {
                prop_assert_eq!(d.connected(i, j).unwrap(), label[i] == label[j]);
            }
        }
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = [10u32, 20, 25, 30, 40, 50];

    for_each_permutation(&keys, |perm| {
        let mut avl: AvlTree<u32, usize> = AvlTree::new();
        let mut splay: SplayTree<u32, usize> = SplayTree::new();
        let mut m: BTreeMap<u32, usize> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            let old = m.insert(k, i);
            assert_eq!(avl.insert(k, i), old);
            assert_eq!(splay.insert(k, i), old);
            avl.assert_invariants();
        }

        splay.assert_invariants();
        let expected: Vec<(u32, usize)> = m.into_iter().collect();
        let got: Vec<(u32, usize)> = avl.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(got, expected);
        let got: Vec<(u32, usize)> = splay.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = [10u32, 20, 25, 30, 40, 50];

    // Insert in a fixed order, then remove in all permutations.
    let mut base_avl: AvlTree<u32, usize> = AvlTree::new();
    let mut base_splay: SplayTree<u32, usize> = SplayTree::new();
    for (i, &k) in keys.iter().enumerate() {
        base_avl.insert(k, i);
        base_splay.insert(k, i);
    }

    for_each_permutation(&keys, |perm| {
        let mut avl = base_avl.clone();
        let mut splay = base_splay.clone();
        let mut m: BTreeMap<u32, usize> = keys.iter().copied().zip(0..).collect();

        for k in perm {
            let old = m.remove(&k);
            assert_eq!(avl.remove(&k), old);
            assert_eq!(splay.remove(&k), old);
            assert_eq!(avl.len(), m.len());
            assert_eq!(splay.len(), m.len());
            avl.assert_invariants();
            splay.assert_invariants();
        }
        assert!(avl.is_empty());
        assert!(splay.is_empty());
    });
}
