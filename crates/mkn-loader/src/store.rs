//! In-memory MKN-10 query store.
//!
//! Wraps a committed [`ClassificationIndex`] and answers code-prefix,
//! full-text and hierarchy queries over it. The store never mutates the
//! index, so a shared reference can serve any number of concurrent readers.
//!
//! ```
//! use mkn_loader::{ClassificationStore, IndexBuilder, NodeRecord};
//! use mkn_types::NodeKind;
//!
//! let mut builder = IndexBuilder::new();
//! builder.push(NodeRecord::new("X", "Nemoci dýchací soustavy", NodeKind::Chapter));
//! builder.push(NodeRecord::new("J06", "Akutní infekce", NodeKind::Category).with_parent("X"));
//! let (index, _) = builder.build();
//!
//! let store = ClassificationStore::new(index);
//! assert_eq!(store.search("j06", 10)[0].code, "J06");
//! assert_eq!(store.search("dychaci", 10)[0].code, "X");
//! ```

use std::collections::{BTreeSet, HashSet, VecDeque};

use once_cell::sync::Lazy;
use regex::Regex;

use mkn_types::{well_known, ClassificationIndex, ClassificationNode, Hierarchy, NodeKind};

use crate::normalize::tokenize;
use crate::types::{MknError, MknResult};

/// Single code (`J06`, `J06.9`, `J06.91`) or code range (`A00-B99`).
static CODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z]\d{2}(?:\.\d{1,2})?$|^[A-Z]\d{2}-[A-Z]\d{2}$")
        .expect("Invalid MKN-10 code pattern")
});

/// Read-only query layer over a committed classification index.
#[derive(Debug, Clone, Default)]
pub struct ClassificationStore {
    index: ClassificationIndex,
}

impl ClassificationStore {
    /// Creates a store over a built index.
    pub fn new(index: ClassificationIndex) -> Self {
        Self { index }
    }

    /// Returns the underlying index.
    pub fn index(&self) -> &ClassificationIndex {
        &self.index
    }

    /// Consumes the store and returns the index.
    pub fn into_index(self) -> ClassificationIndex {
        self.index
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LOOKUP
    // ═══════════════════════════════════════════════════════════════════════════

    /// Looks up a node by code. Surrounding whitespace is ignored; the match
    /// itself is exact and case-sensitive.
    pub fn get(&self, code: &str) -> Option<&ClassificationNode> {
        self.index.get(code.trim())
    }

    /// Like [`get`](Self::get), but reports a missing code as
    /// [`MknError::NotFound`] carrying the code as supplied.
    pub fn require(&self, code: &str) -> MknResult<&ClassificationNode> {
        self.get(code).ok_or_else(|| MknError::not_found(code))
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.index.node_count()
    }

    /// Returns the number of distinct text tokens.
    pub fn token_count(&self) -> usize {
        self.index.token_count()
    }

    /// Returns true if the store holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SEARCH
    // ═══════════════════════════════════════════════════════════════════════════

    /// Returns true if the trimmed query looks like a code or code range.
    pub fn is_code_query(query: &str) -> bool {
        CODE_PATTERN.is_match(query.trim())
    }

    /// Finds codes starting with `query`, compared case-insensitively.
    ///
    /// Results come back in ascending code order, at most `max_results`.
    pub fn search_by_code(&self, query: &str, max_results: usize) -> Vec<&ClassificationNode> {
        let prefix = query.trim().to_uppercase();
        self.index
            .code_index
            .values()
            .filter(|node| node.code.to_uppercase().starts_with(&prefix))
            .take(max_results)
            .collect()
    }

    /// Finds nodes whose label matches every word of `query`.
    ///
    /// A query word matches an indexed token when either contains the
    /// other, so `infek` finds `infekce` and `infekcemi` finds `infekce`.
    /// Words shorter than two characters are ignored; a query with no
    /// remaining words returns nothing. Results are sorted by code.
    pub fn search_by_text(&self, query: &str, max_results: usize) -> Vec<&ClassificationNode> {
        let words = tokenize(query, well_known::MIN_TOKEN_LEN);
        if words.is_empty() {
            return Vec::new();
        }

        let mut candidates: Option<BTreeSet<&str>> = None;
        for word in &words {
            let matching = self.codes_matching_word(word);
            let narrowed = match candidates {
                None => matching,
                Some(previous) => previous.intersection(&matching).copied().collect(),
            };
            let exhausted = narrowed.is_empty();
            candidates = Some(narrowed);
            if exhausted {
                break;
            }
        }

        candidates
            .unwrap_or_default()
            .into_iter()
            .filter_map(|code| self.index.get(code))
            .take(max_results)
            .collect()
    }

    /// Union of codes under every indexed token related to `word` by
    /// substring containment in either direction.
    fn codes_matching_word(&self, word: &str) -> BTreeSet<&str> {
        self.index
            .text_index
            .iter()
            .filter(|(token, _)| token.contains(word) || word.contains(token.as_str()))
            .flat_map(|(_, codes)| codes.iter().map(String::as_str))
            .collect()
    }

    /// Searches by code prefix when the query looks like a code, otherwise
    /// by text.
    pub fn search(&self, query: &str, max_results: usize) -> Vec<&ClassificationNode> {
        let query = query.trim();
        if Self::is_code_query(query) {
            self.search_by_code(query, max_results)
        } else {
            self.search_by_text(query, max_results)
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // HIERARCHY
    // ═══════════════════════════════════════════════════════════════════════════

    /// Returns all chapter nodes in code order.
    pub fn chapters(&self) -> Vec<&ClassificationNode> {
        self.index
            .code_index
            .values()
            .filter(|node| node.is_chapter())
            .collect()
    }

    /// Returns the direct children of a node, or `None` if the code is
    /// unknown.
    pub fn children(&self, code: &str) -> Option<Vec<&ClassificationNode>> {
        self.get(code).map(|node| {
            node.children
                .iter()
                .filter_map(|child| self.index.get(child))
                .collect()
        })
    }

    /// Walks parent links upward, nearest ancestor first. The node itself
    /// is not included.
    pub fn ancestors(&self, code: &str) -> Vec<&ClassificationNode> {
        let mut ancestors = Vec::new();
        let Some(mut current) = self.get(code) else {
            return ancestors;
        };
        let mut visited = HashSet::from([current.code.as_str()]);

        while let Some(parent) = current
            .parent_code
            .as_deref()
            .and_then(|p| self.index.get(p))
        {
            if !visited.insert(parent.code.as_str()) {
                break;
            }
            ancestors.push(parent);
            current = parent;
        }

        ancestors
    }

    /// Collects every node below `code` breadth-first. Siblings keep the
    /// sorted order of their parent's `children`.
    pub fn descendants(&self, code: &str) -> Vec<&ClassificationNode> {
        let mut descendants = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        if let Some(node) = self.get(code) {
            visited.insert(node.code.as_str());
            queue.extend(node.children.iter());
        }

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.as_str()) {
                continue;
            }
            if let Some(node) = self.index.get(current) {
                queue.extend(node.children.iter());
                descendants.push(node);
            }
        }

        descendants
    }

    /// Resolves the chapter, block and category slots of a node.
    ///
    /// The chain is walked from the chapter root downward and the first
    /// node of each kind fills its slot. When no category is passed the
    /// slot falls back to the node's own code. Returns `None` for an
    /// unknown code and for a node with no chapter above (or at) it.
    pub fn resolve_hierarchy(&self, code: &str) -> Option<Hierarchy> {
        let node = self.get(code)?;

        let mut chain = self.ancestors(&node.code);
        chain.reverse();
        chain.push(node);

        let mut hierarchy = Hierarchy::default();
        for link in chain {
            match link.kind {
                NodeKind::Chapter if hierarchy.chapter.is_empty() => {
                    hierarchy.chapter = link.code.clone();
                    hierarchy.chapter_name = link.display_name.clone();
                }
                NodeKind::Block if hierarchy.block.is_empty() => {
                    hierarchy.block = link.code.clone();
                    hierarchy.block_name = link.display_name.clone();
                }
                NodeKind::Category if hierarchy.category.is_empty() => {
                    hierarchy.category = link.code.clone();
                    hierarchy.category_name = link.display_name.clone();
                }
                _ => {}
            }
        }

        if hierarchy.chapter.is_empty() {
            return None;
        }
        if hierarchy.category.is_empty() {
            hierarchy.category = node.code.clone();
            hierarchy.category_name = node.display_name.clone();
        }
        Some(hierarchy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{IndexBuilder, NodeRecord};

    /// Chapter X -> block J00-J06 -> category J06 -> leaf J06.9, plus a
    /// second chapter and a node disconnected from any chapter.
    fn make_test_store() -> ClassificationStore {
        let mut builder = IndexBuilder::new();
        builder.push(NodeRecord::new("X", "Nemoci dýchací soustavy", NodeKind::Chapter));
        builder.push(
            NodeRecord::new("J00-J06", "Akutní infekce horních cest dýchacích", NodeKind::Block)
                .with_parent("X"),
        );
        builder.push(
            NodeRecord::new(
                "J06",
                "Akutní infekce horních cest dýchacích na více a neurčených místech",
                NodeKind::Category,
            )
            .with_parent("J00-J06"),
        );
        builder.push(
            NodeRecord::new("J06.9", "Akutní infekce horních cest dýchacích NS", NodeKind::Category)
                .with_parent("J06"),
        );
        builder.push(
            NodeRecord::new("J06.0", "Akutní laryngofaryngitida", NodeKind::Category)
                .with_parent("J06"),
        );
        builder.push(NodeRecord::new("I", "Některé infekční a parazitární nemoci", NodeKind::Chapter));
        builder.push(NodeRecord::new("A00", "Cholera", NodeKind::Category).with_parent("I"));
        builder.push(NodeRecord::new("U07", "Nouzové kódy", NodeKind::Block));
        ClassificationStore::new(builder.build().0)
    }

    fn codes(nodes: Vec<&ClassificationNode>) -> Vec<&str> {
        nodes.into_iter().map(|n| n.code.as_str()).collect()
    }

    #[test]
    fn test_get_trims_but_is_exact() {
        let store = make_test_store();
        assert_eq!(store.get("  J06.9 ").unwrap().code, "J06.9");
        assert!(store.get("j06.9").is_none());
        assert!(store.get("Z99").is_none());
    }

    #[test]
    fn test_require_reports_code() {
        let store = make_test_store();
        let err = store.require("Z99.9").unwrap_err();
        assert_eq!(err.to_string(), "Code not found: Z99.9");
    }

    #[test]
    fn test_is_code_query() {
        assert!(ClassificationStore::is_code_query("J06"));
        assert!(ClassificationStore::is_code_query("j06.9"));
        assert!(ClassificationStore::is_code_query(" A00.01 "));
        assert!(ClassificationStore::is_code_query("A00-B99"));
        assert!(!ClassificationStore::is_code_query("J06.123"));
        assert!(!ClassificationStore::is_code_query("J6"));
        assert!(!ClassificationStore::is_code_query("infekce"));
        assert!(!ClassificationStore::is_code_query("abc"));
    }

    #[test]
    fn test_search_by_code_prefix_sorted() {
        let store = make_test_store();
        assert_eq!(codes(store.search_by_code("J06", 10)), vec!["J06", "J06.0", "J06.9"]);
        assert_eq!(codes(store.search_by_code("j06", 2)), vec!["J06", "J06.0"]);
        assert!(store.search_by_code("J06", 0).is_empty());
    }

    #[test]
    fn test_search_by_text_diacritics_transparent() {
        let store = make_test_store();
        let with = codes(store.search_by_text("dýchací", 10));
        let without = codes(store.search_by_text("dychaci", 10));
        assert_eq!(with, without);
        assert!(with.contains(&"X"));
    }

    #[test]
    fn test_search_by_text_and_semantics() {
        let store = make_test_store();
        let results = codes(store.search_by_text("akutni infekce", 10));
        assert_eq!(results, vec!["J00-J06", "J06", "J06.9"]);
        // J06.0 is "akutní" but not "infekce"; A00 neither
        assert!(!results.contains(&"J06.0"));
    }

    #[test]
    fn test_search_by_text_bidirectional_substring() {
        let store = make_test_store();
        // Query word shorter than the indexed token
        assert!(codes(store.search_by_text("laryngo", 10)).contains(&"J06.0"));
        // Query word longer than the indexed token "ns"
        assert!(codes(store.search_by_text("nsx", 10)).contains(&"J06.9"));
    }

    #[test]
    fn test_search_by_text_short_or_empty_query() {
        let store = make_test_store();
        assert!(store.search_by_text("", 10).is_empty());
        assert!(store.search_by_text("a v", 10).is_empty());
        assert!(store.search_by_text("neexistujici slovo", 10).is_empty());
    }

    #[test]
    fn test_search_by_text_truncates_sorted() {
        let store = make_test_store();
        assert_eq!(codes(store.search_by_text("infekce", 2)), vec!["J00-J06", "J06"]);
    }

    #[test]
    fn test_search_dispatch() {
        let store = make_test_store();
        assert_eq!(codes(store.search(" J06.9 ", 10)), vec!["J06.9"]);
        assert!(codes(store.search("infekce", 10)).contains(&"J06.9"));
        // Looks like neither: text search over the label tokens
        assert_eq!(codes(store.search("cholera", 10)), vec!["A00"]);
    }

    #[test]
    fn test_chapters_sorted() {
        let store = make_test_store();
        assert_eq!(codes(store.chapters()), vec!["I", "X"]);
    }

    #[test]
    fn test_children() {
        let store = make_test_store();
        assert_eq!(codes(store.children("J06").unwrap()), vec!["J06.0", "J06.9"]);
        assert!(store.children("J06.9").unwrap().is_empty());
        assert!(store.children("Z99").is_none());
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let store = make_test_store();
        assert_eq!(codes(store.ancestors("J06.9")), vec!["J06", "J00-J06", "X"]);
        assert!(store.ancestors("X").is_empty());
        assert!(store.ancestors("Z99").is_empty());
    }

    #[test]
    fn test_descendants_breadth_first() {
        let store = make_test_store();
        assert_eq!(
            codes(store.descendants("X")),
            vec!["J00-J06", "J06", "J06.0", "J06.9"]
        );
        assert!(store.descendants("J06.9").is_empty());
    }

    #[test]
    fn test_hierarchy_walks_to_chapter() {
        let store = make_test_store();
        let hierarchy = store.resolve_hierarchy("J06.9").unwrap();
        assert_eq!(hierarchy.chapter, "X");
        assert_eq!(hierarchy.chapter_name, "Nemoci dýchací soustavy");
        assert_eq!(hierarchy.block, "J00-J06");
        assert_eq!(hierarchy.category, "J06");
        assert_eq!(
            hierarchy.category_name,
            "Akutní infekce horních cest dýchacích na více a neurčených místech"
        );
    }

    #[test]
    fn test_hierarchy_category_falls_back_to_self() {
        let store = make_test_store();
        let hierarchy = store.resolve_hierarchy("A00").unwrap();
        assert_eq!(hierarchy.chapter, "I");
        assert_eq!(hierarchy.block, "");
        assert_eq!(hierarchy.category, "A00");
        assert_eq!(hierarchy.category_name, "Cholera");

        // Chapter itself: no category on the chain, so the slot is the code
        assert_eq!(store.resolve_hierarchy("X").unwrap().category, "X");
    }

    #[test]
    fn test_hierarchy_none_without_chapter() {
        let store = make_test_store();
        // The node exists but has no chapter above it
        assert!(store.get("U07").is_some());
        assert!(store.resolve_hierarchy("U07").is_none());
        assert!(store.resolve_hierarchy("Z99").is_none());
    }
}
