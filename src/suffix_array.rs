//! Suffix array with LCP, over `char`s.
//!
//! Construction is prefix doubling: after round `k` suffixes are ranked by
//! their first `2^k` chars, so `⌈log2 n⌉` sorts of rank pairs finish the job.
//! The LCP array comes from Kasai's algorithm in linear time.

use std::cmp::Ordering;

/// Sorted suffixes of a text.
#[derive(Clone, Debug)]
pub struct SuffixArray {
    text: Vec<char>,
    sa: Vec<usize>,
    rank: Vec<usize>,
    lcp: Vec<usize>,
}

impl SuffixArray {
    /// Build for `text`.
    pub fn new(text: &str) -> Self {
        let text: Vec<char> = text.chars().collect();
        let n = text.len();

        let mut sa: Vec<usize> = (0..n).collect();
        let mut rank: Vec<usize> = text.iter().map(|&c| c as usize).collect();
        let mut next = vec![0; n];
        let mut k = 1;

        while n > 1 {
            let key = |i: usize| (rank[i], if i + k < n { rank[i + k] + 1 } else { 0 });
            sa.sort_unstable_by_key(|&i| key(i));

            next[sa[0]] = 0;
            for w in 1..n {
                let bump = usize::from(key(sa[w - 1]) != key(sa[w]));
                next[sa[w]] = next[sa[w - 1]] + bump;
            }
            std::mem::swap(&mut rank, &mut next);

            if rank[sa[n - 1]] == n - 1 || k >= n {
                break;
            }
            k *= 2;
        }

        for (pos, &i) in sa.iter().enumerate() {
            rank[i] = pos;
        }
        let lcp = kasai(&text, &sa, &rank);
        Self { text, sa, rank, lcp }
    }

    /// Length of the text in chars.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Suffix start positions in lexicographic order.
    pub fn suffixes(&self) -> &[usize] {
        &self.sa
    }

    /// Position of the suffix starting at `i` in [`suffixes`](Self::suffixes).
    pub fn rank_of(&self, i: usize) -> Option<usize> {
        self.rank.get(i).copied()
    }

    /// `lcp()[i]` is the longest common prefix of suffixes `sa[i - 1]` and
    /// `sa[i]`; `lcp()[0]` is 0.
    pub fn lcp(&self) -> &[usize] {
        &self.lcp
    }

    fn cmp_prefix(&self, start: usize, pattern: &[char]) -> Ordering {
        self.text[start..].iter().take(pattern.len()).cmp(pattern.iter())
    }

    /// Every start position of `pattern`, ascending. An empty pattern occurs
    /// at every position.
    pub fn find(&self, pattern: &str) -> Vec<usize> {
        let pattern: Vec<char> = pattern.chars().collect();
        let lo = self
            .sa
            .partition_point(|&s| self.cmp_prefix(s, &pattern) == Ordering::Less);
        let hi = self
            .sa
            .partition_point(|&s| self.cmp_prefix(s, &pattern) != Ordering::Greater);

        let mut hits = self.sa[lo..hi].to_vec();
        hits.sort_unstable();
        hits
    }

    /// Whether `pattern` occurs in the text.
    pub fn contains(&self, pattern: &str) -> bool {
        let pattern: Vec<char> = pattern.chars().collect();
        self.sa
            .binary_search_by(|&s| self.cmp_prefix(s, &pattern))
            .is_ok()
            || pattern.is_empty()
    }

    /// The longest substring occurring at least twice, if any.
    pub fn longest_repeated_substring(&self) -> Option<String> {
        let (i, &len) = self
            .lcp
            .iter()
            .enumerate()
            .rev()
            .max_by_key(|&(_, &l)| l)?;
        if len == 0 {
            return None;
        }
        let start = self.sa[i];
        Some(self.text[start..start + len].iter().collect())
    }

    /// Number of distinct non-empty substrings.
    pub fn distinct_substrings(&self) -> usize {
        let n = self.text.len();
        n * (n + 1) / 2 - self.lcp.iter().sum::<usize>()
    }
}

fn kasai(text: &[char], sa: &[usize], rank: &[usize]) -> Vec<usize> {
    let n = text.len();
    let mut lcp = vec![0; n];
    let mut h = 0;
    for i in 0..n {
        if rank[i] == 0 {
            h = 0;
            continue;
        }
        let j = sa[rank[i] - 1];
        while i + h < n && j + h < n && text[i + h] == text[j + h] {
            h += 1;
        }
        lcp[rank[i]] = h;
        h = h.saturating_sub(1);
    }
    lcp
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_banana() {
        let sa = SuffixArray::new("banana");
        assert_eq!(sa.suffixes(), &[5, 3, 1, 0, 4, 2]);
        assert_eq!(sa.lcp(), &[0, 1, 3, 0, 0, 2]);
        assert_eq!(sa.find("ana"), vec![1, 3]);
        assert_eq!(sa.find("nab"), Vec::<usize>::new());
        assert!(sa.contains("nan"));
        assert!(!sa.contains("bb"));
        assert_eq!(sa.longest_repeated_substring().as_deref(), Some("ana"));
        assert_eq!(sa.distinct_substrings(), 15);
        assert_eq!(sa.rank_of(0), Some(3));
    }

    #[test]
    fn test_degenerate_inputs() {
        let empty = SuffixArray::new("");
        assert!(empty.is_empty());
        assert_eq!(empty.distinct_substrings(), 0);
        assert_eq!(empty.longest_repeated_substring(), None);
        assert!(empty.find("a").is_empty());

        let one = SuffixArray::new("x");
        assert_eq!(one.suffixes(), &[0]);
        assert_eq!(one.find("x"), vec![0]);
        assert_eq!(one.longest_repeated_substring(), None);

        let same = SuffixArray::new("aaaa");
        assert_eq!(same.suffixes(), &[3, 2, 1, 0]);
        assert_eq!(same.longest_repeated_substring().as_deref(), Some("aaa"));
        assert_eq!(same.distinct_substrings(), 4);
    }

    #[test]
    fn test_unicode() {
        let sa = SuffixArray::new("über über");
        assert_eq!(sa.find("über"), vec![0, 5]);
        assert_eq!(sa.len(), 9);
    }

    #[test]
    fn test_randomized_against_naive() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(13);
        let alphabet = ['a', 'b', 'c'];
        for _ in 0..200 {
            let len = rng.gen_range(0..40);
            let s: String = (0..len).map(|_| alphabet[rng.gen_range(0..3)]).collect();
            let chars: Vec<char> = s.chars().collect();
            let sa = SuffixArray::new(&s);

            let mut naive: Vec<usize> = (0..len).collect();
            naive.sort_by(|&a, &b| chars[a..].cmp(&chars[b..]));
            assert_eq!(sa.suffixes(), &naive[..], "{s}");

            let mut distinct = BTreeSet::new();
            for i in 0..len {
                for j in i + 1..=len {
                    distinct.insert(&chars[i..j]);
                }
            }
            assert_eq!(sa.distinct_substrings(), distinct.len());

            let p: String = (0..rng.gen_range(1..4))
                .map(|_| alphabet[rng.gen_range(0..3)])
                .collect();
            let pc: Vec<char> = p.chars().collect();
            let expected: Vec<usize> = (0..len)
                .filter(|&i| chars[i..].starts_with(&pc))
                .collect();
            assert_eq!(sa.find(&p), expected);
        }
    }
}
