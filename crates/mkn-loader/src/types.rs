//! Loader-specific types: errors, parse configuration and statistics.

use thiserror::Error;

use mkn_types::well_known;

/// Errors that can occur while loading, parsing or querying MKN-10 data.
#[derive(Error, Debug)]
pub enum MknError {
    /// The raw source could not be obtained (network, file or cache failure).
    #[error("MKN-10 data unavailable: {reason}")]
    SourceUnavailable {
        /// What went wrong.
        reason: String,
    },

    /// The raw source does not match the expected schema.
    #[error("Malformed MKN-10 source: {reason}")]
    MalformedSource {
        /// What went wrong.
        reason: String,
    },

    /// A well-formed request named a code that is not in the index.
    #[error("Code not found: {code}")]
    NotFound {
        /// The code as supplied by the caller.
        code: String,
    },

    /// Invalid loader or service configuration.
    #[error("Invalid configuration: {reason}")]
    Config {
        /// What went wrong.
        reason: String,
    },

    /// Missing required column in a tabular source.
    #[error("Missing required column: {column}")]
    MissingColumn {
        /// The name of the missing column.
        column: String,
    },

    /// I/O error reading a source file.
    #[error("IO error reading MKN-10 source: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error.
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed XML attribute.
    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// JSON (de)serialization error for cached payloads.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The three failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, file or cache failure.
    SourceUnavailable,
    /// Schema violation in the raw payload.
    MalformedSource,
    /// Well-formed query, no matching code.
    NotFound,
}

impl MknError {
    /// Creates a `SourceUnavailable` error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            reason: reason.into(),
        }
    }

    /// Creates a `MalformedSource` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedSource {
            reason: reason.into(),
        }
    }

    /// Creates a `NotFound` error.
    pub fn not_found(code: impl Into<String>) -> Self {
        Self::NotFound { code: code.into() }
    }

    /// Classifies this error into the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceUnavailable { .. } | Self::Config { .. } | Self::Io(_) | Self::Json(_) => {
                ErrorKind::SourceUnavailable
            }
            Self::MalformedSource { .. }
            | Self::MissingColumn { .. }
            | Self::Csv(_)
            | Self::Xml(_)
            | Self::XmlAttr(_) => ErrorKind::MalformedSource,
            Self::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    /// Returns true if the raw payload itself was unparseable.
    pub fn is_malformed(&self) -> bool {
        self.kind() == ErrorKind::MalformedSource
    }
}

/// Result type for MKN-10 operations.
pub type MknResult<T> = Result<T, MknError>;

/// Configuration for parsing a classification source.
#[derive(Debug, Clone)]
pub struct ParseConfig {
    /// Preferred `xml:lang` of display labels (tree markup only).
    pub language: String,
    /// Keep rows that carry a validity-end value (flat tabular only).
    pub include_expired: bool,
    /// Field delimiter of the tabular source.
    pub delimiter: u8,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            language: well_known::DEFAULT_LANGUAGE.to_string(),
            include_expired: false,
            delimiter: b',',
        }
    }
}

/// Statistics from building one index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Source records read (rows or `<Class>` elements).
    pub records_read: usize,
    /// Rows dropped because they carry a validity-end value.
    pub expired_skipped: usize,
    /// Records dropped because their code is empty.
    pub empty_code_skipped: usize,
    /// Nodes in the committed code index.
    pub node_count: usize,
    /// Distinct tokens in the committed text index.
    pub token_count: usize,
    /// Parent references cleared because the parent never appeared.
    pub dangling_parents: usize,
    /// Parent references cleared to break a cycle.
    pub cycles_broken: usize,
    /// Time taken to parse and build in milliseconds.
    pub parse_time_ms: u64,
}

impl ParseStats {
    /// Returns the percentage of records that made it into the index.
    pub fn keep_rate(&self) -> f64 {
        if self.records_read == 0 {
            0.0
        } else {
            let kept = self
                .records_read
                .saturating_sub(self.expired_skipped + self.empty_code_skipped);
            (kept as f64 / self.records_read as f64) * 100.0
        }
    }
}
