//! Code and text index types.
//!
//! The two indices are built together by the loader and then held
//! read-only for the lifetime of the process.

use std::collections::{BTreeMap, BTreeSet};

use crate::ClassificationNode;

/// Mapping from classification code to its node.
///
/// Ordered by code so iteration (and therefore code-prefix search) is
/// deterministic.
pub type CodeIndex = BTreeMap<String, ClassificationNode>;

/// Inverted index from normalized word token to the codes whose label
/// contains that token.
pub type TextIndex = BTreeMap<String, BTreeSet<String>>;

/// The pair of indices produced by one parse of a classification source.
///
/// Serializes to the JSON object `{"code_index": {...}, "text_index": {...}}`,
/// which is also the cache payload format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassificationIndex {
    /// Code to node mapping.
    pub code_index: CodeIndex,
    /// Normalized token to codes mapping.
    pub text_index: TextIndex,
}

impl ClassificationIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a node by exact code.
    pub fn get(&self, code: &str) -> Option<&ClassificationNode> {
        self.code_index.get(code)
    }

    /// Returns true if the code exists in the index.
    pub fn contains(&self, code: &str) -> bool {
        self.code_index.contains_key(code)
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.code_index.len()
    }

    /// Returns the number of distinct tokens in the text index.
    pub fn token_count(&self) -> usize {
        self.text_index.len()
    }

    /// Returns true if the index holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.code_index.is_empty()
    }
}
