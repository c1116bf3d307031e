//! # mkn-types
//!
//! Type definitions for the MKN-10 classification (the Czech edition of
//! ICD-10).
//!
//! This crate provides the node and index types shared by the loader and the
//! query service: a code-keyed tree of [`ClassificationNode`]s and an
//! inverted text index from normalized word tokens to codes.
//!
//! ## Features
//!
//! - `serde` (default): Enables serialization/deserialization support via serde.
//!   Built indices are cached as JSON, so the loader always enables it.
//!
//! ## Usage
//!
//! ```rust
//! use mkn_types::{ClassificationIndex, ClassificationNode, NodeKind};
//!
//! let mut index = ClassificationIndex::new();
//! let chapter = ClassificationNode::new("X", "Nemoci dýchací soustavy", NodeKind::Chapter);
//! index.code_index.insert(chapter.code.clone(), chapter);
//!
//! assert!(index.get("X").unwrap().is_chapter());
//! ```

#![warn(missing_docs)]

mod hierarchy;
mod index;
mod node;
pub mod well_known;

// Re-export all public types at crate root
pub use hierarchy::Hierarchy;
pub use index::{ClassificationIndex, CodeIndex, TextIndex};
pub use node::{ClassificationNode, NodeKind};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_are_exported() {
        let _kind = NodeKind::Category;
        let _index = ClassificationIndex::default();
        let _hierarchy = Hierarchy::default();
        let _node = ClassificationNode::new("J06.9", "", NodeKind::Category);
    }

    #[test]
    fn test_well_known_accessible() {
        assert_eq!(well_known::SOURCE_ATTRIBUTION, "UZIS/MKN-10");
        assert_eq!(well_known::MIN_TOKEN_LEN, 2);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let mut index = ClassificationIndex::new();
        let mut block = ClassificationNode::new("J06", "Akutní infekce", NodeKind::Block);
        block.parent_code = Some("J00-J99".to_string());
        block.children.push("J06.9".to_string());
        index.code_index.insert(block.code.clone(), block);
        index
            .text_index
            .entry("akutni".to_string())
            .or_default()
            .insert("J06".to_string());

        let json = serde_json::to_string(&index).unwrap();
        let parsed: ClassificationIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(index, parsed);
    }
}
