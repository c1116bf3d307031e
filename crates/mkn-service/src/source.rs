//! Index sources: where the service gets its parsed classification from.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use mkn_loader::{
    load_from_content, load_from_path, location_cache_key, parse_and_cache, read_cached,
    IndexCache, MknError, MknResult, ParseConfig, SourceFormat,
};
use mkn_types::{well_known, ClassificationIndex};

use crate::config::{ServiceConfig, SourceLocation};
use crate::fetch::Fetcher;

/// Produces a parsed classification index.
#[async_trait]
pub trait IndexSource: Send + Sync {
    /// Loads the index, from cache when possible.
    async fn load(&self) -> MknResult<ClassificationIndex>;
}

/// Origin of the raw source content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSource {
    /// Downloaded through a [`Fetcher`], cached under a key derived from
    /// the URL.
    Remote {
        /// Source URL.
        url: String,
    },
    /// Content supplied by the caller, cached under its hash.
    Inline(String),
    /// Local file, cached under the hash of its content.
    File(PathBuf),
}

impl From<SourceLocation> for RawSource {
    fn from(location: SourceLocation) -> Self {
        match location {
            SourceLocation::Path(path) => RawSource::File(path),
            SourceLocation::Url(url) => RawSource::Remote { url },
        }
    }
}

/// Cache-backed loader over a [`RawSource`].
pub struct SourceLoader {
    origin: RawSource,
    format: SourceFormat,
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<dyn IndexCache>,
    parse_config: ParseConfig,
    ttl: Duration,
}

impl SourceLoader {
    /// Creates a loader with default parse settings and the monthly TTL.
    pub fn new(
        origin: RawSource,
        format: SourceFormat,
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<dyn IndexCache>,
    ) -> Self {
        Self {
            origin,
            format,
            fetcher,
            cache,
            parse_config: ParseConfig::default(),
            ttl: Duration::from_secs(well_known::CACHE_TTL_MONTH_SECS),
        }
    }

    /// Builds a loader from service configuration.
    pub fn from_config(
        config: &ServiceConfig,
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<dyn IndexCache>,
    ) -> Self {
        Self::new(
            config.source.clone().into(),
            config.source_format(),
            fetcher,
            cache,
        )
        .with_parse_config(config.parse.clone())
        .with_ttl(config.cache_ttl)
    }

    /// Sets the parser settings.
    pub fn with_parse_config(mut self, config: ParseConfig) -> Self {
        self.parse_config = config;
        self
    }

    /// Sets the TTL for cache writes.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Source format.
    pub fn format(&self) -> SourceFormat {
        self.format
    }

    async fn load_remote(&self, url: &str) -> MknResult<ClassificationIndex> {
        let key = location_cache_key(self.format, &self.parse_config, url);

        let cache = Arc::clone(&self.cache);
        let lookup_key = key.clone();
        if let Some(index) = run_blocking(move || Ok(read_cached(cache.as_ref(), &lookup_key))).await? {
            return Ok(index);
        }

        info!(url, format = %self.format, "Fetching MKN-10 source");
        let content = self.fetcher.fetch(url).await?;

        let cache = Arc::clone(&self.cache);
        let format = self.format;
        let config = self.parse_config.clone();
        let ttl = self.ttl;
        run_blocking(move || parse_and_cache(cache.as_ref(), &key, &content, format, &config, ttl))
            .await
    }
}

#[async_trait]
impl IndexSource for SourceLoader {
    async fn load(&self) -> MknResult<ClassificationIndex> {
        let cache = Arc::clone(&self.cache);
        let format = self.format;
        let config = self.parse_config.clone();
        let ttl = self.ttl;

        match &self.origin {
            RawSource::Remote { url } => self.load_remote(url).await,
            RawSource::Inline(content) => {
                debug!(format = %format, "Loading inline MKN-10 source");
                let content = content.clone();
                run_blocking(move || load_from_content(cache.as_ref(), &content, format, &config, ttl))
                    .await
            }
            RawSource::File(path) => {
                debug!(path = %path.display(), format = %format, "Loading MKN-10 source file");
                let path = path.clone();
                run_blocking(move || {
                    load_from_path(cache.as_ref(), &path, Some(format), &config, ttl)
                })
                .await
            }
        }
    }
}

/// Runs CPU-bound parse and cache work off the async executor.
async fn run_blocking<T, F>(work: F) -> MknResult<T>
where
    F: FnOnce() -> MknResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| MknError::unavailable(format!("loader task failed: {e}")))?
}
