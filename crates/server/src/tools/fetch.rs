//! sw_fetch tool implementation.
//!
//! Feeds one intercepted request through the registration, exactly as a
//! page request would reach the active worker.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheStorage, Error, Method, Network, Policy, Request, ResponseSource};

use super::{AppState, json_result};

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchParams {
    /// Request URL, absolute or relative to the configured origin.
    pub url: String,

    /// Accept header; include `text/html` to fetch as a page navigation.
    #[serde(default)]
    pub accept: Option<String>,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Method,
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchOutput {
    pub url: String,
    pub status: u16,
    /// Where the response came from: network, cache, or fallback.
    pub source: ResponseSource,
    /// Routing decision; `live_no_store` when no worker is active.
    pub policy: Policy,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_len: usize,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<S, N>(state: &AppState<S, N>, params: FetchParams) -> Result<CallToolResult, McpError>
where
    S: CacheStorage + 'static,
    N: Network + 'static,
{
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let mut request = Request::get(params.url.clone()).with_method(params.method);
    if let Some(accept) = params.accept {
        request = request.with_accept(accept);
    }

    let outcome = state.registration.handle_fetch(&request).await?;
    let response = outcome.response;

    tracing::debug!(url = %params.url, source = ?outcome.source, status = response.status, "sw_fetch");

    let output = FetchOutput {
        url: params.url,
        status: response.status,
        source: outcome.source,
        policy: outcome.policy,
        content_type: response.content_type().map(str::to_string),
        body: response.text(),
        body_len: response.body.len(),
        headers: response.headers,
    };
    Ok(json_result(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::lifecycle::{InstallParams, install_impl};
    use crate::tools::result_json;
    use crate::tools::test_support::state;

    fn params(url: &str) -> FetchParams {
        FetchParams { url: url.to_string(), accept: None, method: Method::Get }
    }

    #[tokio::test]
    async fn test_fetch_served_from_cache_after_install() {
        let (state, net) = state(&["/"]);
        net.serve("https://study.example/", "<html>home</html>");
        install_impl(&state, InstallParams::default()).await.unwrap();
        net.clear();

        let json = result_json(&fetch_impl(&state, params("/")).await.unwrap());
        assert_eq!(json["source"], "cache");
        assert_eq!(json["policy"], "cache_first");
        assert_eq!(json["body"], "<html>home</html>");
    }

    #[tokio::test]
    async fn test_fetch_version_fallback_when_offline() {
        let (state, _net) = state(&[]);
        install_impl(&state, InstallParams::default()).await.unwrap();

        let json = result_json(&fetch_impl(&state, params("/version.json")).await.unwrap());
        assert_eq!(json["source"], "fallback");
        assert_eq!(json["content_type"], "application/json");
        assert_eq!(json["body"], r#"{"version":"6.1.1"}"#);
    }

    #[tokio::test]
    async fn test_fetch_without_worker_is_passthrough() {
        let (state, net) = state(&[]);
        net.serve("https://study.example/dashboard", "dash");

        let json = result_json(&fetch_impl(&state, params("/dashboard")).await.unwrap());
        assert_eq!(json["source"], "network");
        assert_eq!(json["policy"], "live_no_store");
    }

    #[tokio::test]
    async fn test_fetch_cross_origin_offline_errors() {
        let (state, _net) = state(&[]);
        install_impl(&state, InstallParams::default()).await.unwrap();

        let result = fetch_impl(&state, params("https://cdn.jsdelivr.net/npm/chart.js")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let (state, _net) = state(&[]);
        assert!(fetch_impl(&state, params("  ")).await.is_err());
    }
}
