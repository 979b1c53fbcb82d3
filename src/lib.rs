//! # algokit
//!
//! Containers with non-trivial invariants: three ordered maps (AVL tree,
//! splay tree, skip list), a binary min-heap, disjoint-set union, range-sum
//! indexes (segment tree, Fenwick tree) and string machinery (trie,
//! Aho–Corasick, palindromic tree, suffix array).
//!
//! None of the containers lock internally. Lookups that restructure the
//! container (splaying, path compression) take `&mut self`.
//!
//! ## Example
//!
//! ```rust
//! use algokit::{AhoCorasickBuilder, AvlTree};
//!
//! let mut tree: AvlTree<u32, &str> = AvlTree::new();
//! for k in [10, 20, 30, 40, 50, 25] {
//!     tree.insert(k, "x");
//! }
//! assert_eq!(tree.root_key(), Some(&30));
//!
//! let ac = AhoCorasickBuilder::new()
//!     .add("he")
//!     .add("she")
//!     .add("hers")
//!     .build()
//!     .unwrap();
//! let hits: Vec<usize> = ac.find_iter("ushers").map(|m| m.start).collect();
//! assert_eq!(hits, vec![1, 2, 2]);
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

mod arena;

pub mod aho_corasick;
pub mod avl;
pub mod dsu;
pub mod eertree;
pub mod error;
pub mod fenwick;
pub mod heap;
pub mod ordered;
pub mod segment_tree;
pub mod skiplist;
pub mod splay;
pub mod suffix_array;
pub mod trie;

pub use aho_corasick::{AhoCorasick, AhoCorasickBuilder, Match};
pub use avl::AvlTree;
pub use dsu::DisjointSet;
pub use eertree::PalindromicTree;
pub use error::{Error, Result};
pub use fenwick::FenwickTree;
pub use heap::MinHeap;
pub use ordered::OrderedMap;
pub use segment_tree::{Max, Min, Monoid, SegmentTree, Sum};
pub use skiplist::SkipList;
pub use splay::SplayTree;
pub use suffix_array::SuffixArray;
pub use trie::Trie;

#[cfg(test)]
mod proptests;
