//! Palindromic tree (eertree).
//!
//! One node per distinct palindromic substring, plus two roots: an imaginary
//! one of length -1 and the empty palindrome of length 0. Each node's suffix
//! link points at its longest proper palindromic suffix. Appending a char
//! creates at most one node, so the non-root node count is exactly the number
//! of distinct palindromes seen so far.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::str::FromStr;

const IMAGINARY: usize = 0;
const EMPTY: usize = 1;

#[derive(Clone, Debug)]
struct Node {
    len: isize,
    link: usize,
    next: BTreeMap<char, usize>,
    /// Index of the last char of this palindrome's first occurrence.
    end: usize,
    /// Times this node was the longest palindromic suffix after an append.
    count: usize,
}

impl Node {
    fn root(len: isize) -> Self {
        Self {
            len,
            link: IMAGINARY,
            next: BTreeMap::new(),
            end: 0,
            count: 0,
        }
    }
}

/// Incrementally built index of the distinct palindromes of a string.
#[derive(Clone, Debug)]
pub struct PalindromicTree {
    nodes: Vec<Node>,
    text: Vec<char>,
    /// Node of the longest palindromic suffix of `text`.
    last: usize,
}

impl PalindromicTree {
    /// An empty tree holding only the two roots.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::root(-1), Node::root(0)],
            text: Vec::new(),
            last: EMPTY,
        }
    }

    /// Walk suffix links from `v` until `text[pos - len(v) - 1] == text[pos]`.
    fn fit(&self, mut v: usize, pos: usize) -> usize {
        let c = self.text[pos];
        loop {
            let before = pos as isize - self.nodes[v].len - 1;
            if before >= 0 && self.text[before as usize] == c {
                return v;
            }
            v = self.nodes[v].link;
        }
    }

    /// Append `c`. Returns `true` if it revealed a new distinct palindrome.
    pub fn add(&mut self, c: char) -> bool {
        let pos = self.text.len();
        self.text.push(c);

        let cur = self.fit(self.last, pos);
        if let Some(&existing) = self.nodes[cur].next.get(&c) {
            self.last = existing;
            self.nodes[existing].count += 1;
            return false;
        }

        let len = self.nodes[cur].len + 2;
        let link = if len == 1 {
            EMPTY
        } else {
            let w = self.fit(self.nodes[cur].link, pos);
            // `w` is a strictly shorter fit, so its edge on `c` already exists.
            self.nodes[w].next.get(&c).copied().unwrap_or(EMPTY)
        };

        let id = self.nodes.len();
        self.nodes.push(Node {
            len,
            link,
            next: BTreeMap::new(),
            end: pos,
            count: 1,
        });
        self.nodes[cur].next.insert(c, id);
        self.last = id;
        true
    }

    /// Number of chars appended so far.
    pub fn text_len(&self) -> usize {
        self.text.len()
    }

    /// Nodes including the two roots.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct non-empty palindromic substrings.
    pub fn distinct_count(&self) -> usize {
        self.nodes.len() - 2
    }

    fn spell(&self, node: &Node) -> String {
        let len = node.len as usize;
        self.text[node.end + 1 - len..=node.end].iter().collect()
    }

    /// Every distinct palindrome, in order of first appearance.
    pub fn palindromes(&self) -> Vec<String> {
        self.nodes[2..].iter().map(|n| self.spell(n)).collect()
    }

    /// The longest palindromic substring; the earliest one on ties.
    pub fn longest(&self) -> Option<String> {
        let mut best: Option<&Node> = None;
        for n in &self.nodes[2..] {
            if best.map_or(true, |b| n.len > b.len) {
                best = Some(n);
            }
        }
        best.map(|n| self.spell(n))
    }

    /// Each distinct palindrome with its number of occurrences in the text.
    pub fn occurrences(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<usize> = self.nodes.iter().map(|n| n.count).collect();
        // Links always point at earlier nodes, so one reverse pass suffices.
        for i in (2..self.nodes.len()).rev() {
            let link = self.nodes[i].link;
            counts[link] += counts[i];
        }
        self.nodes[2..]
            .iter()
            .zip(&counts[2..])
            .map(|(n, &c)| (self.spell(n), c))
            .collect()
    }
}

impl Default for PalindromicTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<char> for PalindromicTree {
    fn extend<I: IntoIterator<Item = char>>(&mut self, iter: I) {
        for c in iter {
            self.add(c);
        }
    }
}

impl From<&str> for PalindromicTree {
    fn from(s: &str) -> Self {
        let mut t = Self::new();
        t.extend(s.chars());
        t
    }
}

impl FromStr for PalindromicTree {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}
