//! cache_get tool implementation.
//!
//! Retrieves a stored entry by request URL, without touching the network.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::cache::key::normalize;
use shellcache_core::{CacheStorage, Error, Network};

use crate::error::ToolError;
use crate::tools::{AppState, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Request URL, absolute or relative to the configured origin.
    pub url: String,

    /// Restrict the lookup to one cache; otherwise every cache is searched, oldest first.
    #[serde(default)]
    pub cache: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub key: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
    pub body_len: usize,
}

/// Implementation of the cache_get tool.
pub async fn get_impl<S, N>(state: &AppState<S, N>, params: CacheGetParams) -> Result<CallToolResult, McpError>
where
    S: CacheStorage + 'static,
    N: Network + 'static,
{
    let origin = state.config.origin_url().map_err(ToolError::from)?;
    let key = normalize(&params.url, &origin)?;

    let entry = match &params.cache {
        Some(cache) => state.storage.match_in(cache, &key).await?,
        None => state.storage.match_any(&key).await?,
    }
    .ok_or_else(|| Error::CacheMiss(key.clone()))?;

    let output = CacheGetOutput {
        key,
        status: entry.status,
        content_type: entry.content_type().map(str::to_string),
        body: entry.text(),
        body_len: entry.body.len(),
    };
    Ok(json_result(&output)?)
}
