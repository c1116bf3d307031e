//! MKN-10 query server binary.
//!
//! Reads line-delimited JSON requests on stdin and answers on stdout.
//! Logs go to stderr.

use std::sync::Arc;

use mkn_loader::{FileCache, IndexCache, MemoryCache};
use mkn_service::{protocol, HttpFetcher, MknService, ServiceConfig, SourceLoader};
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries responses, so logs must not
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServiceConfig::from_env()?;
    tracing::info!(
        source = ?config.source,
        format = %config.source_format(),
        "Starting MKN-10 server"
    );

    let cache: Arc<dyn IndexCache> = match &config.cache_dir {
        Some(dir) => {
            tracing::info!("Caching parsed index in {}", dir.display());
            Arc::new(FileCache::new(dir.clone()))
        }
        None => Arc::new(MemoryCache::new()),
    };
    let fetcher = Arc::new(HttpFetcher::new()?);

    let loader = SourceLoader::from_config(&config, fetcher, cache);
    let service =
        MknService::new(Arc::new(loader)).with_default_max_results(config.default_max_results);

    if config.preload {
        if let Err(e) = service.warm_up().await {
            tracing::warn!("Preload failed, will retry on first request: {}", e);
        }
    }

    tracing::info!("Tools available: search, get, browse");
    protocol::serve(
        &service,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    tracing::info!("Input closed, shutting down");
    Ok(())
}
