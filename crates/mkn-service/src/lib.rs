//! # mkn-service
//!
//! Query service over the MKN-10 classification.
//!
//! [`MknService`] answers `search`, `get` and `browse` with JSON payloads.
//! It loads its index lazily through an [`IndexSource`], normally a
//! [`SourceLoader`] that reads a local file or downloads the source once and
//! keeps the parsed index in an [`IndexCache`](mkn_loader::IndexCache).
//!
//! The `mkn-server` binary exposes the service over line-delimited JSON on
//! stdio (see [`protocol`]).

#![warn(missing_docs)]

pub mod config;
pub mod fetch;
pub mod protocol;
pub mod response;
pub mod service;
pub mod source;

pub use config::{ServiceConfig, SourceLocation};
pub use fetch::{Fetcher, HttpFetcher, StaticFetcher};
pub use protocol::ToolRequest;
pub use response::{
    BrowseNodeResponse, BrowseResponse, ChapterListing, DiagnosisResponse, ErrorPayload,
    NodeSummary, SearchHit, SearchResponse,
};
pub use service::MknService;
pub use source::{IndexSource, RawSource, SourceLoader};
