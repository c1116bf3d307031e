//! JSON response shapes.
//!
//! Every public operation answers with one of these records, or with
//! [`ErrorPayload`] when anything fails. An error payload never carries
//! result fields next to `error`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use mkn_loader::{MknError, MknResult};
use mkn_types::{well_known, ClassificationNode, Hierarchy, NodeKind};

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Classification code.
    pub code: String,
    /// Czech display name.
    pub name: String,
    /// Taxonomy level.
    pub kind: NodeKind,
}

impl From<&ClassificationNode> for SearchHit {
    fn from(node: &ClassificationNode) -> Self {
        Self {
            code: node.code.clone(),
            name: node.display_name.clone(),
            kind: node.kind,
        }
    }
}

/// Result of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The trimmed query.
    pub query: String,
    /// Number of results returned.
    pub total: usize,
    /// Matches, in code order.
    pub results: Vec<SearchHit>,
}

impl SearchResponse {
    /// Builds a response from matched nodes.
    pub fn new(query: impl Into<String>, nodes: &[&ClassificationNode]) -> Self {
        let results: Vec<SearchHit> = nodes.iter().map(|n| SearchHit::from(*n)).collect();
        Self {
            query: query.into(),
            total: results.len(),
            results,
        }
    }
}

/// Full diagnosis record returned by `get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResponse {
    /// Classification code.
    pub code: String,
    /// Czech display name.
    pub name: String,
    /// Taxonomy level.
    pub kind: NodeKind,
    /// Containing node.
    pub parent_code: Option<String>,
    /// Direct child codes.
    pub children: Vec<String>,
    /// Roman chapter number, when the source carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_number: Option<String>,
    /// English name; the Czech sources carry none.
    pub name_en: Option<String>,
    /// Definition text; the Czech sources carry none.
    pub definition: Option<String>,
    /// Resolved chapter/block/category, or `None` when no chapter is
    /// reachable from the node.
    pub hierarchy: Option<Hierarchy>,
    /// Inclusion terms.
    pub includes: Vec<String>,
    /// Exclusion terms.
    pub excludes: Vec<String>,
    /// Modifier codes.
    pub modifiers: Vec<String>,
    /// Data attribution.
    pub source: String,
}

impl DiagnosisResponse {
    /// Builds the record for a node and its resolved hierarchy.
    pub fn new(node: &ClassificationNode, hierarchy: Option<Hierarchy>) -> Self {
        Self {
            code: node.code.clone(),
            name: node.display_name.clone(),
            kind: node.kind,
            parent_code: node.parent_code.clone(),
            children: node.children.clone(),
            chapter_number: node.chapter_number.clone(),
            name_en: None,
            definition: None,
            hierarchy,
            includes: Vec::new(),
            excludes: Vec::new(),
            modifiers: Vec::new(),
            source: well_known::SOURCE_ATTRIBUTION.to_string(),
        }
    }
}

/// Lightweight node summary used in browse listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    /// Classification code.
    pub code: String,
    /// Czech display name.
    pub name: String,
    /// Taxonomy level.
    pub kind: NodeKind,
    /// Number of direct children.
    pub children_count: usize,
}

impl From<&ClassificationNode> for NodeSummary {
    fn from(node: &ClassificationNode) -> Self {
        Self {
            code: node.code.clone(),
            name: node.display_name.clone(),
            kind: node.kind,
            children_count: node.children_count(),
        }
    }
}

/// Root browse result: every chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterListing {
    /// Always `"chapters"`.
    #[serde(rename = "type")]
    pub listing_type: String,
    /// Chapters in code order.
    pub items: Vec<NodeSummary>,
}

impl ChapterListing {
    /// Builds the listing from chapter nodes.
    pub fn new(chapters: &[&ClassificationNode]) -> Self {
        Self {
            listing_type: "chapters".to_string(),
            items: chapters.iter().map(|n| NodeSummary::from(*n)).collect(),
        }
    }
}

/// Browse result for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseNodeResponse {
    /// Classification code.
    pub code: String,
    /// Czech display name.
    pub name: String,
    /// Taxonomy level.
    pub kind: NodeKind,
    /// Containing node.
    pub parent_code: Option<String>,
    /// Direct children.
    pub children: Vec<NodeSummary>,
}

impl BrowseNodeResponse {
    /// Builds the record for a node and its resolved children.
    pub fn new(node: &ClassificationNode, children: &[&ClassificationNode]) -> Self {
        Self {
            code: node.code.clone(),
            name: node.display_name.clone(),
            kind: node.kind,
            parent_code: node.parent_code.clone(),
            children: children.iter().map(|n| NodeSummary::from(*n)).collect(),
        }
    }
}

/// Either browse result shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BrowseResponse {
    /// Root listing.
    Chapters(ChapterListing),
    /// One node and its children.
    Node(BrowseNodeResponse),
}

/// Uniform failure payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable message.
    pub error: String,
}

impl ErrorPayload {
    /// Creates a payload with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// Returns the payload as JSON.
    pub fn to_value(&self) -> Value {
        json!({ "error": self.error })
    }
}

impl From<&MknError> for ErrorPayload {
    fn from(err: &MknError) -> Self {
        Self::new(err.to_string())
    }
}

/// Converts an operation result into its JSON payload.
pub fn to_payload<T: Serialize>(result: MknResult<T>) -> Value {
    match result {
        Ok(response) => serde_json::to_value(response)
            .unwrap_or_else(|e| ErrorPayload::new(format!("cannot encode response: {e}")).to_value()),
        Err(err) => ErrorPayload::from(&err).to_value(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_node() -> ClassificationNode {
        let mut node = ClassificationNode::new(
            "J06",
            "Akutní infekce horních cest dýchacích",
            NodeKind::Category,
        );
        node.parent_code = Some("J00-J06".to_string());
        node.children = vec!["J06.0".to_string(), "J06.9".to_string()];
        node
    }

    #[test]
    fn test_search_response_shape() {
        let node = make_test_node();
        let value = serde_json::to_value(SearchResponse::new("J06", &[&node])).unwrap();
        assert_eq!(value["query"], "J06");
        assert_eq!(value["total"], 1);
        assert_eq!(value["results"][0]["code"], "J06");
        assert_eq!(value["results"][0]["kind"], "category");
        assert_eq!(value["results"][0]["name"], "Akutní infekce horních cest dýchacích");
    }

    #[test]
    fn test_diagnosis_placeholders() {
        let node = make_test_node();
        let value = serde_json::to_value(DiagnosisResponse::new(&node, None)).unwrap();
        assert_eq!(value["source"], "UZIS/MKN-10");
        assert!(value["hierarchy"].is_null());
        assert_eq!(value["name"], "Akutní infekce horních cest dýchacích");
        assert_eq!(value["kind"], "category");
        assert_eq!(value["children"], json!(["J06.0", "J06.9"]));
        assert!(value["name_en"].is_null());
        assert!(value["definition"].is_null());
        assert_eq!(value["includes"], json!([]));
        assert_eq!(value["excludes"], json!([]));
        assert_eq!(value["modifiers"], json!([]));
    }

    #[test]
    fn test_chapter_listing_type_tag() {
        let chapter = ClassificationNode::new("X", "Nemoci dýchací soustavy", NodeKind::Chapter);
        let value = serde_json::to_value(ChapterListing::new(&[&chapter])).unwrap();
        assert_eq!(value["type"], "chapters");
        assert_eq!(value["items"][0]["children_count"], 0);
    }

    #[test]
    fn test_browse_node_children_counts() {
        let node = make_test_node();
        let mut leaf = ClassificationNode::new("J06.9", "NS", NodeKind::Category);
        leaf.parent_code = Some("J06".to_string());
        let value = serde_json::to_value(BrowseNodeResponse::new(&node, &[&leaf])).unwrap();
        assert_eq!(value["parent_code"], "J00-J06");
        assert_eq!(value["children"][0]["code"], "J06.9");
        assert_eq!(value["children"][0]["children_count"], 0);
    }

    #[test]
    fn test_browse_response_is_untagged() {
        let node = make_test_node();
        let value = serde_json::to_value(BrowseResponse::Node(BrowseNodeResponse::new(&node, &[])))
            .unwrap();
        assert_eq!(value["code"], "J06");
        assert!(value.get("Node").is_none());

        let value = serde_json::to_value(BrowseResponse::Chapters(ChapterListing::new(&[]))).unwrap();
        assert_eq!(value, json!({ "type": "chapters", "items": [] }));
    }

    #[test]
    fn test_error_payload_has_only_error_key() {
        let value = to_payload::<SearchResponse>(Err(MknError::not_found("Z99")));
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object["error"], "Code not found: Z99");
    }
}
