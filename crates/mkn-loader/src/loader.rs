//! Cache-aware loading of classification sources.
//!
//! A parsed index is cached as the JSON form of [`ClassificationIndex`]
//! under a deterministic key:
//!
//! | Key                                           | Used when                             |
//! |-----------------------------------------------|---------------------------------------|
//! | `mkn10:<format>:<sha256/16>:<config>`         | the raw content is already in hand    |
//! | `mkn10:<format>:index:<location/16>:<config>` | the raw content must first be fetched |
//!
//! `<config>` is [`config_fingerprint`], so an index built under one
//! [`ParseConfig`] is never served for another.

use std::fs;
use std::path::Path;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use mkn_types::{well_known, ClassificationIndex};

use crate::cache::IndexCache;
use crate::format::SourceFormat;
use crate::types::{MknError, MknResult, ParseConfig};

/// Returns the first 16 hex digits of the SHA-256 of `content`.
pub fn content_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(16);
    hex
}

/// Short form of the parse settings that shape the built index, e.g.
/// `cs:e0:d2c` for Czech labels, expired rows dropped, comma delimiter.
pub fn config_fingerprint(config: &ParseConfig) -> String {
    format!(
        "{}:e{}:d{:02x}",
        config.language,
        u8::from(config.include_expired),
        config.delimiter
    )
}

/// Cache key derived from the raw content.
pub fn content_cache_key(format: SourceFormat, config: &ParseConfig, content: &str) -> String {
    format!(
        "{}:{}:{}:{}",
        well_known::DATASET_ID,
        format,
        content_hash(content),
        config_fingerprint(config)
    )
}

/// Cache key for a source identified by its location (a URL) rather than
/// its content.
pub fn location_cache_key(format: SourceFormat, config: &ParseConfig, location: &str) -> String {
    format!(
        "{}:{}:index:{}:{}",
        well_known::DATASET_ID,
        format,
        content_hash(location),
        config_fingerprint(config)
    )
}

/// Reads and deserializes a cached index.
///
/// Unreadable payloads are logged and treated as a miss.
pub fn read_cached(cache: &dyn IndexCache, key: &str) -> Option<ClassificationIndex> {
    let payload = cache.get(key)?;
    match serde_json::from_str::<ClassificationIndex>(&payload) {
        Ok(index) => {
            debug!(key, nodes = index.node_count(), "MKN-10 index cache hit");
            Some(index)
        }
        Err(err) => {
            warn!(key, "Discarding unreadable MKN-10 cache payload: {err}");
            None
        }
    }
}

/// Parses raw content and writes the result to the cache under `key`.
///
/// A failed cache write is logged; the parsed index is still returned.
pub fn parse_and_cache(
    cache: &dyn IndexCache,
    key: &str,
    content: &str,
    format: SourceFormat,
    config: &ParseConfig,
    ttl: Duration,
) -> MknResult<ClassificationIndex> {
    let (index, stats) = format.parse(content, config)?;

    info!(
        format = %format,
        source_size = %format_bytes(content.len()),
        nodes = stats.node_count,
        tokens = stats.token_count,
        expired = stats.expired_skipped,
        dangling = stats.dangling_parents,
        keep_rate = stats.keep_rate(),
        parse_ms = stats.parse_time_ms,
        "Parsed MKN-10 source"
    );

    match serde_json::to_string(&index) {
        Ok(payload) => {
            if let Err(err) = cache.set(key, &payload, ttl) {
                warn!(key, "Failed to cache MKN-10 index: {err}");
            }
        }
        Err(err) => warn!(key, "Failed to serialize MKN-10 index: {err}"),
    }

    Ok(index)
}

/// Loads an index from caller-supplied raw content, keyed by its hash.
pub fn load_from_content(
    cache: &dyn IndexCache,
    content: &str,
    format: SourceFormat,
    config: &ParseConfig,
    ttl: Duration,
) -> MknResult<ClassificationIndex> {
    let key = content_cache_key(format, config, content);
    if let Some(index) = read_cached(cache, &key) {
        return Ok(index);
    }
    parse_and_cache(cache, &key, content, format, config, ttl)
}

/// Loads an index from a local file.
///
/// The format is detected from the extension unless given.
///
/// # Errors
/// Returns [`MknError::SourceUnavailable`] if the file cannot be read, or
/// the parse error for malformed content.
pub fn load_from_path<P: AsRef<Path>>(
    cache: &dyn IndexCache,
    path: P,
    format: Option<SourceFormat>,
    config: &ParseConfig,
    ttl: Duration,
) -> MknResult<ClassificationIndex> {
    let path = path.as_ref();
    let format = format.unwrap_or_else(|| SourceFormat::detect(path));
    let content = fs::read_to_string(path)
        .map_err(|e| MknError::unavailable(format!("cannot read {}: {e}", path.display())))?;

    load_from_content(cache, &content, format, config, ttl)
}

/// Formats a byte count as a human-readable string.
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
