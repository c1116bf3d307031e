//! # mkn-loader
//!
//! Parser, index builder and query store for the MKN-10 classification.
//!
//! Raw classification data arrives in one of two shapes, the MZ ČR open
//! data CSV export or UZIS ClaML markup. Both are reduced to the same
//! [`ClassificationIndex`](mkn_types::ClassificationIndex): a code-keyed
//! tree plus an inverted index of diacritics-free word tokens.
//!
//! ## Features
//!
//! - `parallel` (default): Tokenizes labels with rayon while building the
//!   text index.
//!
//! ## Example
//!
//! ```
//! use mkn_loader::{ClassificationStore, ParseConfig, SourceFormat};
//!
//! let csv = "kod_tecka,nazev,kod_kapitola_rozsah,kod_kapitola_cislo,nazev_kapitola,platnost_do\n\
//!            J06,Akutní infekce,J00-J99,X,Nemoci dýchací soustavy,\n\
//!            J06.9,Akutní infekce NS,J00-J99,X,Nemoci dýchací soustavy,\n";
//!
//! let (index, stats) = SourceFormat::FlatTabular.parse(csv, &ParseConfig::default())?;
//! assert_eq!(stats.node_count, 3);
//!
//! let store = ClassificationStore::new(index);
//! let hits = store.search("infekce", 10);
//! assert_eq!(hits.len(), 2);
//! assert_eq!(store.resolve_hierarchy("J06.9").unwrap().chapter, "J00-J99");
//! # Ok::<(), mkn_loader::MknError>(())
//! ```

#![warn(missing_docs)]

pub mod builder;
pub mod cache;
pub mod claml;
pub mod format;
pub mod loader;
pub mod normalize;
pub mod parser;
pub mod store;
pub mod tabular;
pub mod types;

pub use builder::{IndexBuilder, NodeRecord};
pub use cache::{FileCache, IndexCache, MemoryCache};
pub use claml::parse_tree_markup;
pub use format::SourceFormat;
pub use loader::{
    config_fingerprint, content_cache_key, content_hash, load_from_content, load_from_path,
    location_cache_key, parse_and_cache, read_cached,
};
pub use normalize::{normalize, strip_diacritics, tokenize};
pub use store::ClassificationStore;
pub use tabular::{parse_flat_tabular, MknRow};
pub use types::{ErrorKind, MknError, MknResult, ParseConfig, ParseStats};

// Re-export mkn-types for convenience
pub use mkn_types;
