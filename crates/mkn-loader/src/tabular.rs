//! MZ ČR open data CSV parser.
//!
//! Each row carries one diagnosis code plus the columns of the chapter it
//! belongs to. Chapters are not rows of their own; a chapter node is
//! materialized once per distinct chapter range.
//!
//! | Row code | Kind       | Parent                    |
//! |----------|------------|---------------------------|
//! | `J06`    | `block`    | chapter range (`J00-J99`) |
//! | `J06.9`  | `category` | prefix before `.` (`J06`) |

use std::collections::BTreeMap;

use csv::StringRecord;
use mkn_types::well_known::{self, columns};
use mkn_types::{ClassificationIndex, NodeKind};

use crate::builder::{IndexBuilder, NodeRecord};
use crate::parser::{ColumnMap, TabularParser, TabularRecord};
use crate::types::{MknResult, ParseConfig, ParseStats};

/// One row of the MKN-10 CSV export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MknRow {
    /// Dotted code (`kod_tecka`).
    pub code: String,
    /// Czech name (`nazev`).
    pub name: String,
    /// Chapter code range (`kod_kapitola_rozsah`).
    pub chapter_range: String,
    /// Roman chapter number (`kod_kapitola_cislo`).
    pub chapter_number: String,
    /// Chapter name (`nazev_kapitola`).
    pub chapter_name: String,
    /// Validity end (`platnost_do`); empty for live rows.
    pub valid_until: String,
}

impl MknRow {
    /// Returns true if the row carries a validity-end value.
    pub fn is_expired(&self) -> bool {
        !self.valid_until.is_empty()
    }

    /// Converts the row into a node record.
    ///
    /// Dotted codes become categories under their prefix; undotted codes
    /// become blocks under the row's chapter range.
    pub fn to_node_record(&self) -> NodeRecord {
        match self.code.split_once(well_known::CODE_DELIMITER) {
            Some((prefix, _)) => {
                NodeRecord::new(&self.code, &self.name, NodeKind::Category).with_parent(prefix)
            }
            None => {
                let record = NodeRecord::new(&self.code, &self.name, NodeKind::Block);
                if self.chapter_range.is_empty() {
                    record
                } else {
                    record.with_parent(&self.chapter_range)
                }
            }
        }
    }
}

impl TabularRecord for MknRow {
    const REQUIRED_COLUMNS: &'static [&'static str] = columns::MANDATORY;

    fn from_record(record: &StringRecord, column_map: &ColumnMap) -> MknResult<Self> {
        let field = |column: &str| column_map.get(record, column).to_string();
        Ok(MknRow {
            code: field(columns::CODE),
            name: field(columns::NAME),
            chapter_range: field(columns::CHAPTER_RANGE),
            chapter_number: field(columns::CHAPTER_NUMBER),
            chapter_name: field(columns::CHAPTER_NAME),
            valid_until: field(columns::VALID_UNTIL),
        })
    }

    fn passes_filter(&self, config: &ParseConfig) -> bool {
        config.include_expired || !self.is_expired()
    }
}

/// Chapter columns collected from the first row that mentions a range.
#[derive(Debug)]
struct ChapterInfo {
    number: String,
    name: String,
}

/// Parses MKN-10 CSV content into code and text indices.
///
/// # Errors
/// Returns [`MknError::MissingColumn`](crate::MknError::MissingColumn) when
/// the header lacks `kod_tecka` or `nazev`, or a CSV error for unreadable
/// content.
pub fn parse_flat_tabular(
    content: &str,
    config: &ParseConfig,
) -> MknResult<(ClassificationIndex, ParseStats)> {
    let mut parser = TabularParser::<_, MknRow>::from_content(content, config.clone())?;
    let mut builder = IndexBuilder::new();
    let mut chapters: BTreeMap<String, ChapterInfo> = BTreeMap::new();

    for row in parser.by_ref() {
        let row = row?;
        if !row.chapter_range.is_empty() {
            chapters
                .entry(row.chapter_range.clone())
                .or_insert_with(|| ChapterInfo {
                    number: row.chapter_number.clone(),
                    name: row.chapter_name.clone(),
                });
        }
        builder.push(row.to_node_record());
    }

    for (range, info) in chapters {
        let mut record = NodeRecord::new(range, info.name, NodeKind::Chapter);
        if !info.number.is_empty() {
            record.chapter_number = Some(info.number);
        }
        builder.push(record);
    }

    builder.note_read(parser.records_read());
    builder.note_expired(parser.records_filtered());

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MknError;

    const SAMPLE_CSV: &str = "\
kod_tecka,nazev,kod_kapitola_rozsah,kod_kapitola_cislo,nazev_kapitola,platnost_do
J06,\"Akutní infekce horních cest dýchacích na více a neurčených místech\",J00-J99,X,\"Nemoci dýchací soustavy\",
J06.9,\"Akutní infekce horních cest dýchacích NS\",J00-J99,X,\"Nemoci dýchací soustavy\",
A00,\"Cholera\",A00-B99,I,\"Některé infekční a parazitární nemoci\",
A00.0,\"Cholera vyvolaná Vibrio cholerae 01 biotypem cholerae\",A00-B99,I,\"Některé infekční a parazitární nemoci\",
Z99,\"Závislost na pomůckách\",Z00-Z99,XXI,\"Faktory ovlivňující zdravotní stav\",2020-01-01
";

    fn parse_sample() -> (ClassificationIndex, ParseStats) {
        parse_flat_tabular(SAMPLE_CSV, &ParseConfig::default()).unwrap()
    }

    #[test]
    fn test_chapter_parsed() {
        let (index, _) = parse_sample();
        let chapter = index.get("J00-J99").unwrap();
        assert_eq!(chapter.kind, NodeKind::Chapter);
        assert_eq!(chapter.parent_code, None);
        assert_eq!(chapter.chapter_number.as_deref(), Some("X"));
        assert!(chapter.display_name.contains("dýchací"));
    }

    #[test]
    fn test_block_parsed() {
        let (index, _) = parse_sample();
        let block = index.get("J06").unwrap();
        assert_eq!(block.kind, NodeKind::Block);
        assert_eq!(block.parent_code.as_deref(), Some("J00-J99"));
        assert!(block.display_name.contains("Akutní"));
    }

    #[test]
    fn test_subcategory_parsed() {
        let (index, _) = parse_sample();
        let category = index.get("J06.9").unwrap();
        assert_eq!(category.kind, NodeKind::Category);
        assert_eq!(category.parent_code.as_deref(), Some("J06"));
        assert!(category.display_name.contains("NS"));
        assert!(category.children.is_empty());
    }

    #[test]
    fn test_hierarchy_children() {
        let (index, _) = parse_sample();
        assert_eq!(index.get("J00-J99").unwrap().children, vec!["J06"]);
        assert_eq!(index.get("J06").unwrap().children, vec!["J06.9"]);
        assert_eq!(index.get("A00").unwrap().children, vec!["A00.0"]);
    }

    #[test]
    fn test_multiple_chapters_materialized_once() {
        let (index, _) = parse_sample();
        let chapters: Vec<&str> = index
            .code_index
            .values()
            .filter(|n| n.kind == NodeKind::Chapter)
            .map(|n| n.code.as_str())
            .collect();
        assert_eq!(chapters, vec!["A00-B99", "J00-J99"]);
    }

    #[test]
    fn test_expired_codes_excluded() {
        let (index, stats) = parse_sample();
        assert!(!index.contains("Z99"));
        // The expired row's chapter is never materialized either
        assert!(!index.contains("Z00-Z99"));
        assert_eq!(stats.expired_skipped, 1);
        assert_eq!(stats.records_read, 5);
        assert!(!index
            .text_index
            .values()
            .any(|codes| codes.contains("Z99")));
    }

    #[test]
    fn test_expired_codes_kept_when_configured() {
        let config = ParseConfig {
            include_expired: true,
            ..Default::default()
        };
        let (index, stats) = parse_flat_tabular(SAMPLE_CSV, &config).unwrap();
        assert!(index.contains("Z99"));
        assert!(index.contains("Z00-Z99"));
        assert_eq!(stats.expired_skipped, 0);
    }

    #[test]
    fn test_text_index_maps_to_codes() {
        let (index, _) = parse_sample();
        let infekce = index.text_index.get("infekce").unwrap();
        assert!(infekce.contains("J06"));
        assert!(infekce.contains("J06.9"));
        assert!(index.text_index.contains_key("akutni"));
        assert!(index.text_index.contains_key("dychaci"));
    }

    #[test]
    fn test_missing_mandatory_column_is_malformed() {
        let content = "kod_tecka,kod_kapitola_rozsah\nJ06,J00-J99\n";
        let err = parse_flat_tabular(content, &ParseConfig::default()).unwrap_err();
        assert!(matches!(err, MknError::MissingColumn { ref column } if column == "nazev"));
        assert!(err.is_malformed());
    }

    #[test]
    fn test_rows_without_chapter_columns() {
        let content = "kod_tecka,nazev\nJ06,Akutní infekce\nJ06.9,Akutní infekce NS\n";
        let (index, _) = parse_flat_tabular(content, &ParseConfig::default()).unwrap();
        assert_eq!(index.get("J06").unwrap().parent_code, None);
        assert_eq!(index.get("J06").unwrap().children, vec!["J06.9"]);
    }

    #[test]
    fn test_row_to_node_record() {
        let row = MknRow {
            code: "A00.0".to_string(),
            name: "Cholera".to_string(),
            chapter_range: "A00-B99".to_string(),
            chapter_number: "I".to_string(),
            chapter_name: "Infekce".to_string(),
            valid_until: String::new(),
        };
        let record = row.to_node_record();
        assert_eq!(record.kind, NodeKind::Category);
        assert_eq!(record.parent_code.as_deref(), Some("A00"));
        assert!(!row.is_expired());
    }
}
