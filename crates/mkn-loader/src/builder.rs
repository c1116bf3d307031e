//! Shape-independent index builder.
//!
//! Both source parsers reduce their input to a stream of [`NodeRecord`]s and
//! hand it to an [`IndexBuilder`], which owns the tree-building invariants:
//!
//! 1. one node per code (later records overwrite earlier ones),
//! 2. every committed `parent_code` resolves and the parent chain is acyclic,
//! 3. `children` is exactly the set of nodes naming this node as parent,
//!    sorted and free of duplicates,
//! 4. every token (length >= 2) of a normalized display name maps back to
//!    the node's code in the text index.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use mkn_types::{well_known, ClassificationIndex, ClassificationNode, CodeIndex, NodeKind, TextIndex};
use tracing::debug;

use crate::normalize::tokenize;
use crate::types::ParseStats;

/// One classification record, normalized away from its source shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    /// Classification code.
    pub code: String,
    /// Preferred label; may be empty.
    pub display_name: String,
    /// Taxonomy level.
    pub kind: NodeKind,
    /// Declared parent code, if any.
    pub parent_code: Option<String>,
    /// Roman chapter number, for chapter nodes that carry one.
    pub chapter_number: Option<String>,
}

impl NodeRecord {
    /// Creates a record without parent or chapter number.
    pub fn new(code: impl Into<String>, display_name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
            kind,
            parent_code: None,
            chapter_number: None,
        }
    }

    /// Sets the parent code.
    pub fn with_parent(mut self, parent_code: impl Into<String>) -> Self {
        self.parent_code = Some(parent_code.into());
        self
    }
}

/// Accumulates records and builds the code and text indices.
///
/// # Example
///
/// ```
/// use mkn_loader::{IndexBuilder, NodeRecord};
/// use mkn_types::NodeKind;
///
/// let mut builder = IndexBuilder::new();
/// builder.push(NodeRecord::new("X", "Nemoci dýchací soustavy", NodeKind::Chapter));
/// builder.push(NodeRecord::new("J06", "Akutní infekce", NodeKind::Category).with_parent("X"));
///
/// let (index, stats) = builder.build();
/// assert_eq!(index.get("X").unwrap().children, vec!["J06"]);
/// assert_eq!(stats.node_count, 2);
/// ```
#[derive(Debug)]
pub struct IndexBuilder {
    records: BTreeMap<String, NodeRecord>,
    declared_children: Vec<(String, String)>,
    stats: ParseStats,
    started: Instant,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            declared_children: Vec::new(),
            stats: ParseStats::default(),
            started: Instant::now(),
        }
    }
}

impl IndexBuilder {
    /// Creates an empty builder. Parse timing starts here.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or overwrites a record.
    ///
    /// Records whose code is empty or whitespace-only are skipped.
    pub fn push(&mut self, mut record: NodeRecord) {
        let code = record.code.trim();
        if code.is_empty() {
            self.stats.empty_code_skipped += 1;
            return;
        }
        record.code = code.to_string();
        record.parent_code = record
            .parent_code
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        self.records.insert(record.code.clone(), record);
    }

    /// Records an explicit child reference (`parent` lists `child`).
    ///
    /// Used as the parent of `child` only when `child` declares none itself.
    pub fn declare_child(&mut self, parent: impl Into<String>, child: impl Into<String>) {
        self.declared_children.push((parent.into(), child.into()));
    }

    /// Counts source records as read.
    pub fn note_read(&mut self, count: usize) {
        self.stats.records_read += count;
    }

    /// Counts source records dropped for being expired.
    pub fn note_expired(&mut self, count: usize) {
        self.stats.expired_skipped += count;
    }

    /// Returns the number of distinct codes pushed so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no record has been pushed.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Builds the indices.
    pub fn build(self) -> (ClassificationIndex, ParseStats) {
        let IndexBuilder {
            records,
            declared_children,
            mut stats,
            started,
        } = self;

        let mut code_index: CodeIndex = records
            .into_values()
            .map(|r| {
                let mut node = ClassificationNode::new(r.code, r.display_name, r.kind);
                node.parent_code = r.parent_code;
                node.chapter_number = r.chapter_number;
                (node.code.clone(), node)
            })
            .collect();

        adopt_declared_children(&mut code_index, &declared_children);
        stats.dangling_parents = clear_dangling_parents(&mut code_index);
        stats.cycles_broken = break_cycles(&mut code_index);
        link_children(&mut code_index);

        let text_index = build_text_index(&code_index);

        stats.node_count = code_index.len();
        stats.token_count = text_index.len();
        stats.parse_time_ms = started.elapsed().as_millis() as u64;

        debug!(
            nodes = stats.node_count,
            tokens = stats.token_count,
            dangling = stats.dangling_parents,
            cycles = stats.cycles_broken,
            "Built MKN-10 index"
        );

        (
            ClassificationIndex {
                code_index,
                text_index,
            },
            stats,
        )
    }
}

/// Gives parentless children the parent that lists them.
fn adopt_declared_children(code_index: &mut CodeIndex, declared: &[(String, String)]) {
    for (parent, child) in declared {
        if parent == child || !code_index.contains_key(parent) {
            continue;
        }
        if let Some(node) = code_index.get_mut(child) {
            if node.parent_code.is_none() {
                node.parent_code = Some(parent.clone());
            }
        }
    }
}

/// Clears parent references that do not resolve (or point at the node
/// itself). Returns how many were cleared.
fn clear_dangling_parents(code_index: &mut CodeIndex) -> usize {
    let dangling: Vec<String> = code_index
        .values()
        .filter(|node| match &node.parent_code {
            Some(parent) => parent == &node.code || !code_index.contains_key(parent),
            None => false,
        })
        .map(|node| node.code.clone())
        .collect();

    for code in &dangling {
        if let Some(node) = code_index.get_mut(code) {
            node.parent_code = None;
        }
    }
    dangling.len()
}

/// Cuts one parent link per cycle in the parent chains. Returns how many
/// links were cut. Assumes every parent reference resolves.
fn break_cycles(code_index: &mut CodeIndex) -> usize {
    let mut broken = 0;
    let mut settled: HashSet<String> = HashSet::new();
    let codes: Vec<String> = code_index.keys().cloned().collect();

    for start in codes {
        let mut path: Vec<String> = Vec::new();
        let mut on_path: HashSet<String> = HashSet::new();
        let mut current = start;

        loop {
            if settled.contains(&current) {
                break;
            }
            if !on_path.insert(current.clone()) {
                if let Some(node) = path.last().and_then(|last| code_index.get_mut(last)) {
                    node.parent_code = None;
                    broken += 1;
                }
                break;
            }
            path.push(current.clone());
            match code_index.get(&current).and_then(|n| n.parent_code.clone()) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        settled.extend(path);
    }

    broken
}

/// Rebuilds every `children` list from the parent links.
fn link_children(code_index: &mut CodeIndex) {
    let links: Vec<(String, String)> = code_index
        .values()
        .filter_map(|node| {
            node.parent_code
                .as_ref()
                .map(|parent| (parent.clone(), node.code.clone()))
        })
        .collect();

    for node in code_index.values_mut() {
        node.children.clear();
    }
    for (parent, child) in links {
        if let Some(node) = code_index.get_mut(&parent) {
            node.children.push(child);
        }
    }
    for node in code_index.values_mut() {
        node.children.sort();
        node.children.dedup();
    }
}

fn build_text_index(code_index: &CodeIndex) -> TextIndex {
    let mut text_index = TextIndex::new();
    for (code, tokens) in tokenize_labels(code_index) {
        for token in tokens {
            text_index.entry(token).or_default().insert(code.clone());
        }
    }
    text_index
}

#[cfg(feature = "parallel")]
fn tokenize_labels(code_index: &CodeIndex) -> Vec<(String, Vec<String>)> {
    code_index
        .par_iter()
        .filter(|(_, node)| !node.display_name.is_empty())
        .map(|(code, node)| {
            (
                code.clone(),
                tokenize(&node.display_name, well_known::MIN_TOKEN_LEN),
            )
        })
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn tokenize_labels(code_index: &CodeIndex) -> Vec<(String, Vec<String>)> {
    code_index
        .iter()
        .filter(|(_, node)| !node.display_name.is_empty())
        .map(|(code, node)| {
            (
                code.clone(),
                tokenize(&node.display_name, well_known::MIN_TOKEN_LEN),
            )
        })
        .collect()
}
