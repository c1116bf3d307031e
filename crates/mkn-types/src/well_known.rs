//! Well-known MKN-10 dataset constants.
//!
//! Identifiers, column names and defaults for the MKN-10 sources published
//! by ÚZIS (ClaML XML) and MZ ČR (open data CSV).
//!
//! # Examples
//!
//! ```
//! use mkn_types::well_known;
//!
//! assert_eq!(well_known::DATASET_ID, "mkn10");
//! assert_eq!(well_known::CODE_DELIMITER, '.');
//! ```

// =============================================================================
// Dataset
// =============================================================================

/// Logical dataset identifier, used as the cache key prefix.
pub const DATASET_ID: &str = "mkn10";

/// Attribution string attached to every diagnosis response.
pub const SOURCE_ATTRIBUTION: &str = "UZIS/MKN-10";

/// Preferred label language.
pub const DEFAULT_LANGUAGE: &str = "cs";

/// Separates a category code from its parent prefix (`J06.9` -> `J06`).
pub const CODE_DELIMITER: char = '.';

/// Tokens shorter than this are not indexed and are ignored in queries.
pub const MIN_TOKEN_LEN: usize = 2;

/// Default cache TTL for built indices (30 days).
///
/// The classification is republished on a monthly to quarterly cadence.
pub const CACHE_TTL_MONTH_SECS: u64 = 30 * 24 * 60 * 60;

// =============================================================================
// Flat tabular (MZ ČR open data CSV) columns
// =============================================================================

/// Column names of the MZ ČR MKN-10 CSV export.
pub mod columns {
    /// Dotted code (mandatory).
    pub const CODE: &str = "kod_tecka";
    /// Czech name (mandatory).
    pub const NAME: &str = "nazev";
    /// Chapter code range (e.g. `J00-J99`).
    pub const CHAPTER_RANGE: &str = "kod_kapitola_rozsah";
    /// Roman chapter number (e.g. `X`).
    pub const CHAPTER_NUMBER: &str = "kod_kapitola_cislo";
    /// Chapter name.
    pub const CHAPTER_NAME: &str = "nazev_kapitola";
    /// Validity end; a row with any value here is expired.
    pub const VALID_UNTIL: &str = "platnost_do";

    /// Columns that must be present in the header.
    pub const MANDATORY: &[&str] = &[CODE, NAME];
}

// =============================================================================
// Tree markup (ClaML) vocabulary
// =============================================================================

/// Element and attribute names of the ClaML format.
pub mod claml {
    /// A classification record.
    pub const CLASS: &str = "Class";
    /// Explicit parent reference.
    pub const SUPER_CLASS: &str = "SuperClass";
    /// Explicit child reference.
    pub const SUB_CLASS: &str = "SubClass";
    /// Container of labels; only `kind="preferred"` rubrics are read.
    pub const RUBRIC: &str = "Rubric";
    /// Localized label text.
    pub const LABEL: &str = "Label";
    /// Rubric kind holding the display name.
    pub const PREFERRED_RUBRIC: &str = "preferred";
    /// Language attribute on labels.
    pub const LANG_ATTR: &str = "xml:lang";
    /// Code attribute on classes and class references.
    pub const CODE_ATTR: &str = "code";
    /// Kind attribute on classes and rubrics.
    pub const KIND_ATTR: &str = "kind";
}
