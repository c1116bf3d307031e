//! Environment configuration for the service binary.

use std::path::PathBuf;
use std::time::Duration;

use mkn_loader::{MknError, MknResult, ParseConfig, SourceFormat};
use mkn_types::well_known;

/// Local file holding the raw classification source.
pub const ENV_SOURCE_PATH: &str = "MKN_SOURCE_PATH";
/// Remote URL of the raw source, used when no path is set.
pub const ENV_SOURCE_URL: &str = "MKN_SOURCE_URL";
/// `csv` or `claml`.
pub const ENV_SOURCE_FORMAT: &str = "MKN_SOURCE_FORMAT";
/// Directory of the file-backed cache.
pub const ENV_CACHE_DIR: &str = "MKN_CACHE_DIR";
/// Cache TTL in seconds.
pub const ENV_CACHE_TTL_SECS: &str = "MKN_CACHE_TTL_SECS";
/// Default search page size.
pub const ENV_DEFAULT_MAX_RESULTS: &str = "MKN_DEFAULT_MAX_RESULTS";
/// Load the index before serving.
pub const ENV_PRELOAD: &str = "MKN_PRELOAD";

/// Default search page size.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Where the raw classification data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Local file.
    Path(PathBuf),
    /// Remote URL fetched once per cache lifetime.
    Url(String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Raw source location.
    pub source: SourceLocation,
    /// Source format; detected from the location when not set.
    pub format: Option<SourceFormat>,
    /// File cache directory; an in-memory cache is used when `None`.
    pub cache_dir: Option<PathBuf>,
    /// TTL for cached indices.
    pub cache_ttl: Duration,
    /// Page size for searches that do not ask for one.
    pub default_max_results: usize,
    /// Load the index at startup rather than on the first request.
    pub preload: bool,
    /// Parser settings.
    pub parse: ParseConfig,
}

impl ServiceConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> MknResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns [`MknError::Config`] when neither a source path nor a URL is
    /// set, or when a numeric or format variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> MknResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let source = match (var(ENV_SOURCE_PATH), var(ENV_SOURCE_URL)) {
            (Some(path), _) => SourceLocation::Path(PathBuf::from(path)),
            (None, Some(url)) => SourceLocation::Url(url),
            (None, None) => {
                return Err(MknError::Config {
                    reason: format!("set {} or {}", ENV_SOURCE_PATH, ENV_SOURCE_URL),
                })
            }
        };

        let format = var(ENV_SOURCE_FORMAT)
            .map(|f| f.parse::<SourceFormat>())
            .transpose()?;

        let cache_ttl = match var(ENV_CACHE_TTL_SECS) {
            Some(secs) => Duration::from_secs(parse_number(ENV_CACHE_TTL_SECS, &secs)?),
            None => Duration::from_secs(well_known::CACHE_TTL_MONTH_SECS),
        };

        let default_max_results = match var(ENV_DEFAULT_MAX_RESULTS) {
            Some(n) => parse_number(ENV_DEFAULT_MAX_RESULTS, &n)? as usize,
            None => DEFAULT_MAX_RESULTS,
        };

        let preload = var(ENV_PRELOAD)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            source,
            format,
            cache_dir: var(ENV_CACHE_DIR).map(PathBuf::from),
            cache_ttl,
            default_max_results,
            preload,
            parse: ParseConfig::default(),
        })
    }

    /// Returns the configured format, or the one implied by the source
    /// location's extension.
    pub fn source_format(&self) -> SourceFormat {
        self.format.unwrap_or_else(|| match &self.source {
            SourceLocation::Path(path) => SourceFormat::detect(path),
            SourceLocation::Url(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                SourceFormat::detect(std::path::Path::new(path))
            }
        })
    }
}

fn parse_number(key: &str, value: &str) -> MknResult<u64> {
    value.parse().map_err(|_| MknError::Config {
        reason: format!("{} must be a non-negative integer, got '{}'", key, value),
    })
}
