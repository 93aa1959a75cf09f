//! sw_message tool implementation.
//!
//! Posts a control message (`SKIP_WAITING`, `CACHE_URLS`) to the registration.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheStorage, ControlMessage, Network};

use super::{AppState, json_result};

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageParams {
    /// Structured payload with a `type` field, e.g. `{"type": "CACHE_URLS", "urls": ["/extra.js"]}`.
    pub message: ControlMessage,
}

/// Implementation of the sw_message tool.
pub async fn message_impl<S, N>(state: &AppState<S, N>, params: MessageParams) -> Result<CallToolResult, McpError>
where
    S: CacheStorage + 'static,
    N: Network + 'static,
{
    let outcome = state.registration.post_message(params.message).await?;
    Ok(json_result(&outcome)?)
}
