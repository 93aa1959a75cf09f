//! cache_list tool implementation.
//!
//! Lists cache names, or the keys stored in one cache.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheStorage, Error, Network};

use crate::tools::{AppState, json_result};

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// List the keys in this cache instead of the cache names.
    #[serde(default)]
    pub cache: Option<String>,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CacheListOutput {
    Caches { caches: Vec<String> },
    Entries { cache: String, keys: Vec<String> },
}

/// Implementation of the cache_list tool.
pub async fn list_impl<S, N>(state: &AppState<S, N>, params: CacheListParams) -> Result<CallToolResult, McpError>
where
    S: CacheStorage + 'static,
    N: Network + 'static,
{
    let output = match params.cache {
        None => CacheListOutput::Caches { caches: state.storage.keys().await? },
        Some(cache) => {
            if !state.storage.has(&cache).await? {
                return Err(Error::CacheMiss(format!("no cache named {cache}")).into());
            }
            let keys = state.storage.entries(&cache).await?;
            CacheListOutput::Entries { cache, keys }
        }
    };
    Ok(json_result(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::result_json;
    use crate::tools::test_support::state;
    use shellcache_core::Response;

    #[tokio::test]
    async fn test_list_caches_and_entries() {
        let (state, _net) = state(&[]);
        let page = Response::html(200, "x");
        state.storage.put("5am-club-v6.1.1", "/", &page).await.unwrap();
        state.storage.put("5am-club-runtime", "/b", &page).await.unwrap();
        state.storage.put("5am-club-runtime", "/a", &page).await.unwrap();

        let json = result_json(&list_impl(&state, CacheListParams::default()).await.unwrap());
        assert_eq!(json["caches"], serde_json::json!(["5am-club-v6.1.1", "5am-club-runtime"]));

        let params = CacheListParams { cache: Some("5am-club-runtime".into()) };
        let json = result_json(&list_impl(&state, params).await.unwrap());
        assert_eq!(json["keys"], serde_json::json!(["/a", "/b"]));
    }

    #[tokio::test]
    async fn test_list_unknown_cache() {
        let (state, _net) = state(&[]);
        let params = CacheListParams { cache: Some("nope".into()) };
        assert!(list_impl(&state, params).await.is_err());
    }
}
