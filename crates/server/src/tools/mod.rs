//! MCP tool implementations.
//!
//! Each tool maps onto one worker event: install, activate, fetch, or
//! message, plus read-only views of the registration and cache storage.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod message;

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use shellcache_core::{AppConfig, CacheStorage, ConfigError, Error, Network, OfflineCacheWorker, Registration};

use crate::error::ToolError;

/// Everything a tool call can reach.
pub struct AppState<S, N> {
    pub config: AppConfig,
    pub storage: Arc<S>,
    pub network: Arc<N>,
    pub registration: Registration<S, N>,
}

impl<S, N> AppState<S, N>
where
    S: CacheStorage + 'static,
    N: Network + 'static,
{
    pub fn new(config: AppConfig, storage: Arc<S>, network: Arc<N>) -> Result<Self, ConfigError> {
        let registration = Registration::new(config.origin_url()?, network.clone());
        Ok(Self { config, storage, network, registration })
    }

    /// Build a worker generation from the loaded config, optionally under a different release.
    pub fn generation(&self, release: Option<&str>) -> Result<Arc<OfflineCacheWorker<S, N>>, ToolError> {
        let mut config = self.config.clone();
        if let Some(release) = release {
            config.release = release.to_string();
        }
        config.validate()?;
        let settings = config.worker_settings()?;
        Ok(Arc::new(OfflineCacheWorker::new(settings, self.storage.clone(), self.network.clone())))
    }
}

/// Serialize tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, ToolError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::Output(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Pull the JSON text back out of a tool result.
#[cfg(test)]
pub(crate) fn result_json(result: &CallToolResult) -> serde_json::Value {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use shellcache_core::{FetchMode, MemoryStorage, Request, Response};
    use url::Url;

    use super::*;

    /// Canned responses by absolute URL; unknown URLs are unreachable.
    #[derive(Default)]
    pub struct StubNetwork {
        responses: Mutex<HashMap<String, Response>>,
    }

    impl StubNetwork {
        pub fn serve(&self, url: &str, body: &str) {
            let url = Url::parse(url).unwrap().to_string();
            self.responses
                .lock()
                .unwrap()
                .insert(url, Response::html(200, body.to_string()));
        }

        pub fn clear(&self) {
            self.responses.lock().unwrap().clear();
        }
    }

    #[async_trait::async_trait]
    impl Network for StubNetwork {
        async fn fetch(&self, url: &Url, _request: &Request, _mode: FetchMode) -> Result<Response, Error> {
            self.responses
                .lock()
                .unwrap()
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| Error::Network(format!("unreachable: {url}")))
        }
    }

    pub fn state(manifest: &[&str]) -> (AppState<MemoryStorage, StubNetwork>, Arc<StubNetwork>) {
        let config = AppConfig {
            origin: "https://study.example".into(),
            manifest: manifest.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        let network = Arc::new(StubNetwork::default());
        let state = AppState::new(config, Arc::new(MemoryStorage::new()), network.clone()).unwrap();
        (state, network)
    }
}
