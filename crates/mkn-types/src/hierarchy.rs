//! Resolved hierarchy chain of a node.

/// Chapter, block and category slots resolved by walking a node's parent
/// links up to its chapter root.
///
/// Slots that the chain does not pass through are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hierarchy {
    /// Chapter code (e.g. `X` or `J00-J99`).
    pub chapter: String,
    /// Chapter display name.
    pub chapter_name: String,
    /// Block code (e.g. `J00-J06`).
    pub block: String,
    /// Block display name.
    pub block_name: String,
    /// Category code (e.g. `J06`).
    pub category: String,
    /// Category display name.
    pub category_name: String,
}
