//! Source format selection.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use mkn_types::ClassificationIndex;

use crate::claml::parse_tree_markup;
use crate::tabular::parse_flat_tabular;
use crate::types::{MknError, MknResult, ParseConfig, ParseStats};

/// The two supported shapes of raw classification data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceFormat {
    /// Delimited rows, one code per row (`csv`).
    #[default]
    FlatTabular,
    /// Nested ClaML markup (`claml`).
    TreeMarkup,
}

impl SourceFormat {
    /// Returns the short label used in configuration and cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FlatTabular => "csv",
            Self::TreeMarkup => "claml",
        }
    }

    /// Guesses the format from a file extension.
    ///
    /// `.xml` and `.claml` map to tree markup; everything else to flat
    /// tabular.
    pub fn detect(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("xml") | Some("claml") => Self::TreeMarkup,
            _ => Self::FlatTabular,
        }
    }

    /// Parses raw content in this format.
    pub fn parse(
        self,
        content: &str,
        config: &ParseConfig,
    ) -> MknResult<(ClassificationIndex, ParseStats)> {
        match self {
            Self::FlatTabular => parse_flat_tabular(content, config),
            Self::TreeMarkup => parse_tree_markup(content, config),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceFormat {
    type Err = MknError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" | "tabular" => Ok(Self::FlatTabular),
            "claml" | "xml" => Ok(Self::TreeMarkup),
            other => Err(MknError::Config {
                reason: format!("unknown source format '{}' (expected csv or claml)", other),
            }),
        }
    }
}
