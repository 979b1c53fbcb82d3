//! Multi-pattern matching with an Aho–Corasick automaton.
//!
//! The automaton is a trie of the patterns plus failure links computed
//! breadth-first; every state's output set already includes the outputs of
//! its failure chain, so matching emits all hits at a position without
//! walking fail links a second time.
//!
//! A matcher can only be obtained from [`AhoCorasickBuilder::build`], so there
//! is no way to search an automaton whose links have not been computed.
//!
//! Positions are measured in `char`s.

use std::collections::{BTreeMap, VecDeque};
use std::iter::Enumerate;
use std::str::Chars;

use crate::error::{Error, Result};

const ROOT: u32 = 0;

#[derive(Clone, Debug, Default)]
struct State {
    goto: BTreeMap<char, u32>,
    fail: u32,
    /// Pattern ids ending here, own patterns first, then those inherited
    /// through the failure chain (longest first).
    output: Vec<usize>,
}

/// Collects patterns for an [`AhoCorasick`] matcher.
#[derive(Clone, Debug, Default)]
pub struct AhoCorasickBuilder {
    patterns: Vec<String>,
}

impl AhoCorasickBuilder {
    /// Start with no patterns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern. Its id is its position in insertion order.
    pub fn add(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Add several patterns.
    pub fn extend<I, P>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Compute the trie, failure links and output sets.
    ///
    /// Fails with [`Error::EmptyPattern`] if any pattern is empty.
    pub fn build(self) -> Result<AhoCorasick> {
        if let Some(id) = self.patterns.iter().position(String::is_empty) {
            return Err(Error::EmptyPattern { id });
        }

        let mut states = vec![State::default()];
        let mut lens = Vec::with_capacity(self.patterns.len());

        for (id, pattern) in self.patterns.iter().enumerate() {
            let mut cur = ROOT;
            let mut len = 0;
            for c in pattern.chars() {
                len += 1;
                cur = match states[cur as usize].goto.get(&c) {
                    Some(&next) => next,
                    None => {
                        let next = states.len() as u32;
                        states.push(State::default());
                        states[cur as usize].goto.insert(c, next);
                        next
                    }
                };
            }
            states[cur as usize].output.push(id);
            lens.push(len);
        }

        let mut queue = VecDeque::new();
        for &child in states[ROOT as usize].goto.values() {
            queue.push_back(child);
        }

        while let Some(u) = queue.pop_front() {
            let edges: Vec<(char, u32)> =
                states[u as usize].goto.iter().map(|(&c, &v)| (c, v)).collect();

            for (c, v) in edges {
                let fail = if u == ROOT {
                    ROOT
                } else {
                    let mut f = states[u as usize].fail;
                    loop {
                        if let Some(&t) = states[f as usize].goto.get(&c) {
                            break t;
                        }
                        if f == ROOT {
                            break ROOT;
                        }
                        f = states[f as usize].fail;
                    }
                };
                states[v as usize].fail = fail;

                let inherited = states[fail as usize].output.clone();
                states[v as usize].output.extend(inherited);
                queue.push_back(v);
            }
        }

        Ok(AhoCorasick {
            states,
            patterns: self.patterns,
            lens,
        })
    }
}

/// A single occurrence of a pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Match {
    /// Id of the matched pattern.
    pub pattern: usize,
    /// Char offset of the first matched char.
    pub start: usize,
    /// Char offset one past the last matched char.
    pub end: usize,
}

/// An immutable multi-pattern matcher.
#[derive(Clone, Debug)]
pub struct AhoCorasick {
    states: Vec<State>,
    patterns: Vec<String>,
    /// Pattern lengths in chars.
    lens: Vec<usize>,
}

impl AhoCorasick {
    /// Shorthand for building from a list of patterns.
    pub fn new<I, P>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        AhoCorasickBuilder::new().extend(patterns).build()
    }

    /// Patterns in id order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Number of automaton states, root included.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    #[inline]
    fn step(&self, mut state: u32, c: char) -> u32 {
        loop {
            if let Some(&next) = self.states[state as usize].goto.get(&c) {
                return next;
            }
            if state == ROOT {
                return ROOT;
            }
            state = self.states[state as usize].fail;
        }
    }

    /// Every occurrence of every pattern, ordered by end position.
    ///
    /// Overlapping occurrences are all reported.
    pub fn find_iter<'a, 't>(&'a self, text: &'t str) -> FindIter<'a, 't> {
        FindIter {
            ac: self,
            chars: text.chars().enumerate(),
            state: ROOT,
            end: 0,
            pending: 0,
        }
    }

    /// Whether any pattern occurs in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.find_iter(text).next().is_some()
    }

    /// Start positions of each pattern in `text`, indexed by pattern id.
    pub fn search(&self, text: &str) -> Vec<Vec<usize>> {
        let mut hits = vec![Vec::new(); self.patterns.len()];
        for m in self.find_iter(text) {
            hits[m.pattern].push(m.start);
        }
        hits
    }
}

/// Iterator returned by [`AhoCorasick::find_iter`].
pub struct FindIter<'a, 't> {
    ac: &'a AhoCorasick,
    chars: Enumerate<Chars<'t>>,
    state: u32,
    end: usize,
    pending: usize,
}

impl Iterator for FindIter<'_, '_> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        loop {
            let output = &self.ac.states[self.state as usize].output;
            if let Some(&pattern) = output.get(self.pending) {
                self.pending += 1;
                return Some(Match {
                    pattern,
                    start: self.end - self.ac.lens[pattern],
                    end: self.end,
                });
            }

            let (i, c) = self.chars.next()?;
            self.state = self.ac.step(self.state, c);
            self.end = i + 1;
            self.pending = 0;
        }
    }
}
