//! Prefix dictionary over `char` edges.
//!
//! Children are kept in a `BTreeMap`, so prefix enumeration comes out in
//! lexicographic order. Every node also counts the words that pass through
//! it, which makes `count_with_prefix` O(|prefix|) and lets `remove` prune
//! branches that no longer lead to a word.

use std::collections::BTreeMap;

#[derive(Clone, Debug, Default)]
struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    terminal: bool,
    /// Words stored at or below this node.
    words: usize,
}

/// A set of strings supporting exact and prefix queries.
#[derive(Clone, Debug, Default)]
pub struct Trie {
    root: TrieNode,
}

impl Trie {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct words stored.
    pub fn len(&self) -> usize {
        self.root.words
    }

    /// Whether the trie holds no words.
    pub fn is_empty(&self) -> bool {
        self.root.words == 0
    }

    /// Add `word`. Returns `false` if it was already present.
    pub fn insert(&mut self, word: &str) -> bool {
        if self.contains(word) {
            return false;
        }
        let mut node = &mut self.root;
        node.words += 1;
        for c in word.chars() {
            node = node.children.entry(c).or_default();
            node.words += 1;
        }
        node.terminal = true;
        true
    }

    fn walk(&self, s: &str) -> Option<&TrieNode> {
        let mut node = &self.root;
        for c in s.chars() {
            node = node.children.get(&c)?;
        }
        Some(node)
    }

    /// Whether `word` was inserted (and not removed).
    pub fn contains(&self, word: &str) -> bool {
        self.walk(word).is_some_and(|n| n.terminal)
    }

    /// Whether any stored word starts with `prefix`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.walk(prefix).is_some_and(|n| n.words > 0)
    }

    /// Number of stored words starting with `prefix`.
    pub fn count_with_prefix(&self, prefix: &str) -> usize {
        self.walk(prefix).map_or(0, |n| n.words)
    }

    /// Every stored word starting with `prefix`, sorted.
    pub fn words_with_prefix(&self, prefix: &str) -> Vec<String> {
        let Some(start) = self.walk(prefix) else {
            return Vec::new();
        };

        let mut out = Vec::with_capacity(start.words);
        let mut buf = String::from(prefix);
        collect(start, &mut buf, &mut out);
        out
    }

    /// Remove `word`. Returns `false` if it was not present.
    pub fn remove(&mut self, word: &str) -> bool {
        if !self.contains(word) {
            return false;
        }
        prune(&mut self.root, &mut word.chars());
        true
    }
}

/// Unmark the word spelled by `rest` below `node`, dropping children that no
/// longer hold any word. The word must be present.
fn prune(node: &mut TrieNode, rest: &mut std::str::Chars<'_>) {
    node.words -= 1;
    let Some(c) = rest.next() else {
        node.terminal = false;
        return;
    };
    let emptied = match node.children.get_mut(&c) {
        Some(child) => {
            prune(child, rest);
            child.words == 0
        }
        None => false,
    };
    if emptied {
        node.children.remove(&c);
    }
}

fn collect(node: &TrieNode, buf: &mut String, out: &mut Vec<String>) {
    if node.terminal {
        out.push(buf.clone());
    }
    for (&c, child) in &node.children {
        buf.push(c);
        collect(child, buf, out);
        buf.pop();
    }
}

impl<'a> FromIterator<&'a str> for Trie {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut t = Trie::new();
        for w in iter {
            t.insert(w);
        }
        t
    }
}
