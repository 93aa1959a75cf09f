//! sw_install, sw_activate and sw_status tool implementations.

use std::sync::Arc;

use chrono::Utc;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheStorage, Error, Network, OfflineCacheWorker, WorkerState};

use super::{AppState, json_result};

/// Parameters for the sw_install tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct InstallParams {
    /// Release label for the new generation (defaults to the configured release).
    #[serde(default)]
    pub release: Option<String>,
}

/// Snapshot of one worker generation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatus {
    pub cache: String,
    pub state: WorkerState,
    pub controls_clients: bool,
}

/// A named cache and how many entries it holds.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheSummary {
    pub name: String,
    pub entries: usize,
}

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusOutput {
    pub active: Option<WorkerStatus>,
    pub waiting: Option<WorkerStatus>,
    pub caches: Vec<CacheSummary>,
    pub checked_at: String,
}

/// Implementation of the sw_install tool.
///
/// Registers a fresh generation; it takes over immediately when skip-waiting
/// is configured or nothing is active yet.
pub async fn install_impl<S, N>(state: &AppState<S, N>, params: InstallParams) -> Result<CallToolResult, McpError>
where
    S: CacheStorage + 'static,
    N: Network + 'static,
{
    let worker = state.generation(params.release.as_deref())?;
    let outcome = state.registration.register(worker).await?;
    Ok(json_result(&outcome)?)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl<S, N>(state: &AppState<S, N>) -> Result<CallToolResult, McpError>
where
    S: CacheStorage + 'static,
    N: Network + 'static,
{
    let report = state
        .registration
        .skip_waiting()
        .await?
        .ok_or_else(|| Error::InvalidState("no waiting worker to activate".into()))?;
    Ok(json_result(&report)?)
}

async fn describe<S, N>(worker: Option<Arc<OfflineCacheWorker<S, N>>>) -> Option<WorkerStatus>
where
    S: CacheStorage + 'static,
    N: Network + 'static,
{
    let worker = worker?;
    Some(WorkerStatus {
        cache: worker.settings().current_cache_name.clone(),
        state: worker.state().await,
        controls_clients: worker.controls_clients().await,
    })
}

/// Implementation of the sw_status tool.
pub async fn status_impl<S, N>(state: &AppState<S, N>) -> Result<CallToolResult, McpError>
where
    S: CacheStorage + 'static,
    N: Network + 'static,
{
    let mut caches = Vec::new();
    for name in state.storage.keys().await? {
        let entries = state.storage.entries(&name).await?.len();
        caches.push(CacheSummary { name, entries });
    }

    let output = StatusOutput {
        active: describe(state.registration.active().await).await,
        waiting: describe(state.registration.waiting().await).await,
        caches,
        checked_at: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    };
    Ok(json_result(&output)?)
}
