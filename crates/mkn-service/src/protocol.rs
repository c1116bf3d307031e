//! Line-delimited JSON request protocol.
//!
//! Each input line is one request object naming a tool:
//!
//! ```json
//! {"tool": "search", "query": "akutni infekce", "max_results": 5}
//! {"tool": "get", "code": "J06.9"}
//! {"tool": "browse"}
//! ```
//!
//! Each request produces exactly one output line with the operation's JSON
//! payload.

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::service::MknService;

/// One request to the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolRequest {
    /// Code-prefix or text search.
    #[serde(alias = "mkn_diagnosis_searcher")]
    Search {
        /// Code prefix or free text.
        query: String,
        /// Page size; the service default when absent.
        #[serde(default)]
        max_results: Option<usize>,
    },
    /// Single code lookup.
    #[serde(alias = "mkn_diagnosis_getter")]
    Get {
        /// Exact code.
        code: String,
    },
    /// Chapter listing or node children.
    #[serde(alias = "mkn_category_browser")]
    Browse {
        /// Node to open; chapters when absent.
        #[serde(default)]
        code: Option<String>,
    },
}

/// Runs one request against the service.
pub async fn dispatch(service: &MknService, request: &ToolRequest) -> Value {
    match request {
        ToolRequest::Search { query, max_results } => service.search(query, *max_results).await,
        ToolRequest::Get { code } => service.get(code).await,
        ToolRequest::Browse { code } => service.browse(code.as_deref()).await,
    }
}

/// Parses and runs one request line.
pub async fn handle_line(service: &MknService, line: &str) -> Value {
    match serde_json::from_str::<ToolRequest>(line) {
        Ok(request) => {
            debug!(?request, "Handling request");
            dispatch(service, &request).await
        }
        Err(err) => {
            warn!("Rejected request: {err}");
            json!({ "error": format!("Invalid request: {err}") })
        }
    }
}

/// Serves requests from `reader` until end of input, writing one response
/// line per non-blank request line.
pub async fn serve<R, W>(service: &MknService, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = handle_line(service, line).await;
        writer.write_all(response.to_string().as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
