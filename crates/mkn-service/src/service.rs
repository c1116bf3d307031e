//! MKN-10 query service.
//!
//! The service owns a lazily built [`ClassificationStore`]. The first
//! request triggers the load; concurrent first requests wait on the same
//! load instead of starting their own. Every public operation returns a
//! JSON payload and never an error: failures become `{"error": ...}`.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use mkn_loader::{ClassificationStore, ErrorKind, MknError, MknResult};

use crate::config::DEFAULT_MAX_RESULTS;
use crate::response::{
    to_payload, BrowseNodeResponse, BrowseResponse, ChapterListing, DiagnosisResponse,
    SearchResponse,
};
use crate::source::IndexSource;

/// Search, lookup and browse over one MKN-10 classification.
pub struct MknService {
    source: Option<Arc<dyn IndexSource>>,
    store: OnceCell<Arc<ClassificationStore>>,
    default_max_results: usize,
}

impl MknService {
    /// Creates a service that loads its index from `source` on first use.
    pub fn new(source: Arc<dyn IndexSource>) -> Self {
        Self {
            source: Some(source),
            store: OnceCell::new(),
            default_max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Creates a service over an already built store.
    pub fn from_store(store: ClassificationStore) -> Self {
        Self {
            source: None,
            store: OnceCell::new_with(Some(Arc::new(store))),
            default_max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Sets the page size used when a search does not ask for one.
    pub fn with_default_max_results(mut self, max_results: usize) -> Self {
        self.default_max_results = max_results;
        self
    }

    /// Returns true once the index has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.store.initialized()
    }

    /// Drops the loaded index so the next request loads it again.
    pub fn clear(&mut self) {
        if self.source.is_some() {
            self.store.take();
        }
    }

    /// Loads the index now rather than on the first request.
    pub async fn warm_up(&self) -> MknResult<()> {
        let store = self.store().await?;
        info!(
            nodes = store.node_count(),
            tokens = store.token_count(),
            "MKN-10 index ready"
        );
        Ok(())
    }

    async fn store(&self) -> MknResult<Arc<ClassificationStore>> {
        let store = self
            .store
            .get_or_try_init(|| async {
                let Some(source) = self.source.clone() else {
                    return Err(MknError::unavailable("no index source configured"));
                };

                // Detached so a dropped caller cannot abandon a load midway
                let loaded = tokio::spawn(async move { source.load().await })
                    .await
                    .map_err(|e| MknError::unavailable(format!("index load task failed: {e}")))?;

                match loaded {
                    Ok(index) => Ok(Arc::new(ClassificationStore::new(index))),
                    Err(err) => {
                        error!("Failed to load MKN-10 index: {err}");
                        Err(err)
                    }
                }
            })
            .await?;
        Ok(Arc::clone(store))
    }

    /// Loads the store, mapping every load failure to "data unavailable".
    async fn loaded_store(&self) -> MknResult<Arc<ClassificationStore>> {
        self.store().await.map_err(|err| match err.kind() {
            ErrorKind::SourceUnavailable => err,
            _ => MknError::unavailable(err.to_string()),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TYPED OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Searches by code prefix or by text.
    pub async fn search_results(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> MknResult<SearchResponse> {
        let store = self.loaded_store().await?;
        let query = query.trim();
        let max_results = max_results.unwrap_or(self.default_max_results);
        let hits = store.search(query, max_results);
        debug!(query, hits = hits.len(), "MKN-10 search");
        Ok(SearchResponse::new(query, &hits))
    }

    /// Looks up one code with its resolved hierarchy.
    pub async fn diagnosis(&self, code: &str) -> MknResult<DiagnosisResponse> {
        let store = self.loaded_store().await?;
        let node = store
            .get(code)
            .ok_or_else(|| MknError::not_found(code))?;
        Ok(DiagnosisResponse::new(node, store.resolve_hierarchy(&node.code)))
    }

    /// Lists the chapters, or one node and its direct children.
    pub async fn browse_results(&self, code: Option<&str>) -> MknResult<BrowseResponse> {
        let store = self.loaded_store().await?;
        match code.map(str::trim).filter(|c| !c.is_empty()) {
            None => Ok(BrowseResponse::Chapters(ChapterListing::new(
                &store.chapters(),
            ))),
            Some(code) => {
                let node = store.require(code)?;
                let children = store.children(code).unwrap_or_default();
                Ok(BrowseResponse::Node(BrowseNodeResponse::new(node, &children)))
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // JSON OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// `search` as a JSON payload.
    pub async fn search(&self, query: &str, max_results: Option<usize>) -> Value {
        to_payload(self.search_results(query, max_results).await)
    }

    /// `get` as a JSON payload.
    pub async fn get(&self, code: &str) -> Value {
        to_payload(self.diagnosis(code).await)
    }

    /// `browse` as a JSON payload.
    pub async fn browse(&self, code: Option<&str>) -> Value {
        to_payload(self.browse_results(code).await)
    }
}
