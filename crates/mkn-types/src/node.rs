//! Classification node type.
//!
//! This module provides the `ClassificationNode` struct, the unit of the
//! code index, and the `NodeKind` taxonomy level it belongs to.

/// Taxonomy level of a node in the classification tree.
///
/// MKN-10 is a three-tier classification: chapters group blocks, blocks
/// group categories, and categories may be subdivided into further
/// (dotted) categories.
///
/// # Examples
///
/// ```
/// use mkn_types::NodeKind;
///
/// assert_eq!(NodeKind::from_label("chapter"), NodeKind::Chapter);
/// assert_eq!(NodeKind::from_label("modifiedcategory"), NodeKind::Unspecified);
/// assert_eq!(NodeKind::Block.as_str(), "block");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NodeKind {
    /// Top-level grouping (e.g. chapter X, "Nemoci dýchací soustavy").
    Chapter,
    /// Mid-level grouping, usually a code range such as `J00-J06`.
    Block,
    /// Leaf-bearing grouping such as `J06` or `J06.9`.
    Category,
    /// The source declared no kind, or one this crate does not model. The
    /// source's own label (e.g. ClaML `modifiedcategory`) is not kept, so
    /// such nodes serialize as `"unspecified"`.
    #[default]
    #[cfg_attr(feature = "serde", serde(other))]
    Unspecified,
}

impl NodeKind {
    /// Parses a kind label as it appears in source data.
    ///
    /// Matching is case-insensitive. Unknown or empty labels map to
    /// [`NodeKind::Unspecified`] since kind is best-effort metadata.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "chapter" => Self::Chapter,
            "block" => Self::Block,
            "category" => Self::Category,
            _ => Self::Unspecified,
        }
    }

    /// Returns the lowercase label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chapter => "chapter",
            Self::Block => "block",
            Self::Category => "category",
            Self::Unspecified => "unspecified",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry of the code index.
///
/// Nodes are created by the loader and never mutated once the index is
/// committed.
///
/// # Examples
///
/// ```
/// use mkn_types::{ClassificationNode, NodeKind};
///
/// let mut node = ClassificationNode::new("J06.9", "Akutní infekce horních cest dýchacích NS", NodeKind::Category);
/// node.parent_code = Some("J06".to_string());
///
/// assert!(!node.is_root());
/// assert!(node.is_leaf());
/// assert_eq!(node.children_count(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassificationNode {
    /// Unique, case-sensitive code (e.g. `J06.9`, `A00-B99`).
    pub code: String,
    /// Preferred label in the source language. Empty when the source has none.
    pub display_name: String,
    /// Taxonomy level.
    pub kind: NodeKind,
    /// Code of the containing node; `None` for chapter roots.
    pub parent_code: Option<String>,
    /// Codes of direct descendants, sorted and free of duplicates.
    pub children: Vec<String>,
    /// Roman chapter number (e.g. `X`) when the source carries one.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub chapter_number: Option<String>,
}

impl ClassificationNode {
    /// Creates a node with no parent and no children.
    pub fn new(code: impl Into<String>, display_name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
            kind,
            parent_code: None,
            children: Vec::new(),
            chapter_number: None,
        }
    }

    /// Returns true if this node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_code.is_none()
    }

    /// Returns true if this node is a chapter.
    pub fn is_chapter(&self) -> bool {
        self.kind == NodeKind::Chapter
    }

    /// Returns true if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the number of direct children.
    pub fn children_count(&self) -> usize {
        self.children.len()
    }
}
