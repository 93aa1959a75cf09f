//! Offline cache worker.
//!
//! Answers intercepted requests from named caches, the network, or both,
//! and rolls cache generations over on install/activate.
//!
//! ### Lifecycle
//! - `install` opens the current-generation cache and populates it from the
//!   manifest, best effort. A failed asset is reported, never fatal.
//! - `activate` deletes every cache except the current and runtime ones and
//!   claims open pages.
//!
//! ### Fetch policies (see [`policy`])
//! - version check: live, uncached, JSON fallback when offline
//! - worker script and non-GET requests: live, uncached
//! - same origin: cache first, runtime cache populated on 200
//! - cross origin: network first, cached copy on failure

pub mod lifecycle;
pub mod message;
pub mod policy;
pub mod registration;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;
use url::Url;

use crate::Error;
use crate::cache::CacheStorage;
use crate::cache::key::{normalize, request_key, resolve};
use crate::http::{FetchMode, Request, Response};
use crate::network::Network;

pub use lifecycle::{Lifecycle, WorkerState};
pub use message::{ControlMessage, MessageOutcome};
pub use policy::{Policy, RouteTable};
pub use registration::{RegisterOutcome, Registration};
pub use report::{ActivateReport, AssetFailure, InstallReport, PopulateReport};

/// Served on an offline navigation when no cached document is available.
const OFFLINE_PAGE: &str = "<!doctype html>\
<html><head><meta charset=\"utf-8\"><title>Offline</title></head>\
<body><h1>You're offline</h1><p>This page isn't cached yet. Reconnect and try again.</p></body></html>";

/// Failure reason for manifest or `CACHE_URLS` entries that must stay live.
const LIVE_ONLY: &str = "live-only resource, not cached";

/// Explicit deployment settings for one worker generation.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Versioned cache holding this generation's app shell.
    pub current_cache_name: String,
    /// Generation-independent cache for resources fetched at runtime.
    pub runtime_cache_name: String,
    /// App shell URLs, stored at install.
    pub manifest: Vec<String>,
    pub origin: Url,
    /// Substring identifying the version-check resource.
    pub version_marker: String,
    /// Path of the worker's own script.
    pub worker_script: String,
    /// Document served for offline navigations.
    pub offline_document: String,
    /// Reported by the version-check fallback.
    pub fallback_version: String,
    pub install_concurrency: usize,
    /// Become eligible for activation as soon as install finishes.
    pub skip_waiting_on_install: bool,
}

impl WorkerSettings {
    pub fn new(
        current_cache_name: impl Into<String>, runtime_cache_name: impl Into<String>, manifest: Vec<String>,
        origin: Url,
    ) -> Self {
        Self {
            current_cache_name: current_cache_name.into(),
            runtime_cache_name: runtime_cache_name.into(),
            manifest,
            origin,
            version_marker: "version.json".into(),
            worker_script: "/sw.js".into(),
            offline_document: "/index.html".into(),
            fallback_version: "6.1.1".into(),
            install_concurrency: 4,
            skip_waiting_on_install: true,
        }
    }

    pub fn route_table(&self) -> RouteTable {
        RouteTable {
            origin: self.origin.clone(),
            version_marker: self.version_marker.clone(),
            worker_script: self.worker_script.clone(),
        }
    }
}

/// Where a fetch response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// Synthesized by the worker (version fallback or offline document).
    Fallback,
}

/// Result of handling one intercepted request.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub response: Response,
    pub source: ResponseSource,
    pub policy: Policy,
}

/// One worker generation bound to a storage backend and a network.
pub struct OfflineCacheWorker<S, N> {
    settings: WorkerSettings,
    routes: RouteTable,
    storage: Arc<S>,
    network: Arc<N>,
    lifecycle: RwLock<Lifecycle>,
}

impl<S, N> OfflineCacheWorker<S, N>
where
    S: CacheStorage + 'static,
    N: Network + 'static,
{
    pub fn new(settings: WorkerSettings, storage: Arc<S>, network: Arc<N>) -> Self {
        let routes = settings.route_table();
        Self { settings, routes, storage, network, lifecycle: RwLock::new(Lifecycle::default()) }
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.read().await.state()
    }

    pub async fn controls_clients(&self) -> bool {
        self.lifecycle.read().await.clients_claimed()
    }

    pub async fn skip_waiting_requested(&self) -> bool {
        self.lifecycle.read().await.skip_waiting()
    }

    /// Populate the current-generation cache from the manifest.
    ///
    /// Only failing to open the cache is an error; every per-asset failure
    /// lands in the report.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.lifecycle.write().await.transition(WorkerState::Installing)?;

        let cache = &self.settings.current_cache_name;
        self.storage.open(cache).await?;

        let report = self.populate(cache, &self.settings.manifest).await;

        let mut lifecycle = self.lifecycle.write().await;
        if self.settings.skip_waiting_on_install {
            lifecycle.set_skip_waiting();
        }
        lifecycle.transition(WorkerState::Waiting)?;

        tracing::info!(
            cache = %cache,
            cached = report.cached.len(),
            failed = report.failed.len(),
            "install complete"
        );
        Ok(report)
    }

    /// Drop superseded generations and take control of open pages.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.lifecycle.write().await.transition(WorkerState::Activating)?;

        let current = &self.settings.current_cache_name;
        let runtime = &self.settings.runtime_cache_name;

        let mut deleted = Vec::new();
        for name in self.storage.keys().await? {
            if &name == current || &name == runtime {
                continue;
            }
            if self.storage.delete(&name).await? {
                tracing::info!(cache = %name, "deleted superseded cache");
                deleted.push(name);
            }
        }

        let mut lifecycle = self.lifecycle.write().await;
        lifecycle.claim_clients()?;
        lifecycle.transition(WorkerState::Active)?;

        Ok(ActivateReport {
            current: current.clone(),
            runtime: runtime.clone(),
            deleted,
            clients_claimed: lifecycle.clients_claimed(),
        })
    }

    /// Mark this worker as superseded. It refuses fetches afterwards.
    pub async fn mark_redundant(&self) -> Result<(), Error> {
        self.lifecycle.write().await.transition(WorkerState::Redundant)?;
        tracing::info!(cache = %self.settings.current_cache_name, "worker is redundant");
        Ok(())
    }

    /// Answer an intercepted request.
    ///
    /// Errors only where a page without any worker would also see one: a
    /// non-HTML same-origin miss while offline, a cross-origin miss while
    /// offline, or a live-only request while offline.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        if self.state().await == WorkerState::Redundant {
            return Err(Error::InvalidState("redundant worker cannot handle fetches".into()));
        }

        let url = resolve(&request.url, &self.settings.origin)?;
        let policy = self.routes.route(&url, request);
        tracing::debug!(url = %url, policy = ?policy, "routing fetch");

        match policy {
            Policy::FallbackJson => self.fetch_version(&url, request).await,
            Policy::LiveNoStore => {
                let response = self.network.fetch(&url, request, FetchMode::NoStore).await?;
                Ok(FetchOutcome { response, source: ResponseSource::Network, policy })
            }
            Policy::CacheFirst => self.cache_first(&url, request).await,
            Policy::NetworkFirst => self.network_first(&url, request).await,
        }
    }

    /// Handle a control message.
    pub async fn handle_message(&self, message: ControlMessage) -> Result<MessageOutcome, Error> {
        match message {
            ControlMessage::SkipWaiting => {
                let waiting = {
                    let mut lifecycle = self.lifecycle.write().await;
                    lifecycle.set_skip_waiting();
                    lifecycle.state() == WorkerState::Waiting
                };
                if waiting {
                    Ok(MessageOutcome::Activated(self.activate().await?))
                } else {
                    Ok(MessageOutcome::SkipWaitingArmed)
                }
            }
            ControlMessage::CacheUrls { urls } => {
                let cache = &self.settings.runtime_cache_name;
                self.storage.open(cache).await?;
                let report = self.populate(cache, &urls).await;
                tracing::info!(
                    cache = %cache,
                    cached = report.cached.len(),
                    failed = report.failed.len(),
                    "cached requested urls"
                );
                Ok(MessageOutcome::Cached(report))
            }
        }
    }

    /// Parse a JSON control payload and handle it.
    pub async fn handle_message_json(&self, payload: &str) -> Result<MessageOutcome, Error> {
        self.handle_message(ControlMessage::from_json(payload)?).await
    }

    async fn fetch_version(&self, url: &Url, request: &Request) -> Result<FetchOutcome, Error> {
        let policy = Policy::FallbackJson;
        match self.network.fetch(url, request, FetchMode::NoStore).await {
            Ok(response) => Ok(FetchOutcome { response, source: ResponseSource::Network, policy }),
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "version check failed, serving fallback");
                let body = serde_json::json!({ "version": self.settings.fallback_version });
                Ok(FetchOutcome { response: Response::json(200, &body)?, source: ResponseSource::Fallback, policy })
            }
        }
    }

    async fn cache_first(&self, url: &Url, request: &Request) -> Result<FetchOutcome, Error> {
        let policy = Policy::CacheFirst;
        let key = request_key(url, &self.settings.origin);

        if let Some(response) = self.lookup(&key).await {
            tracing::debug!(key = %key, "cache hit");
            return Ok(FetchOutcome { response, source: ResponseSource::Cache, policy });
        }

        match self.network.fetch(url, request, FetchMode::Default).await {
            Ok(response) => {
                self.store_runtime(&key, &response).await;
                Ok(FetchOutcome { response, source: ResponseSource::Network, policy })
            }
            Err(err) if err.is_network() && request.accepts_html() => {
                tracing::warn!(url = %url, error = %err, "offline navigation, serving fallback document");
                let response = self.offline_document().await;
                Ok(FetchOutcome { response, source: ResponseSource::Fallback, policy })
            }
            Err(err) => Err(err),
        }
    }

    async fn network_first(&self, url: &Url, request: &Request) -> Result<FetchOutcome, Error> {
        let policy = Policy::NetworkFirst;
        let key = request_key(url, &self.settings.origin);

        match self.network.fetch(url, request, FetchMode::Default).await {
            Ok(response) => {
                self.store_runtime(&key, &response).await;
                Ok(FetchOutcome { response, source: ResponseSource::Network, policy })
            }
            Err(err) => match self.lookup(&key).await {
                Some(response) => {
                    tracing::debug!(url = %url, error = %err, "network failed, serving cached copy");
                    Ok(FetchOutcome { response, source: ResponseSource::Cache, policy })
                }
                None => Err(err),
            },
        }
    }

    /// Storage read errors degrade to a miss.
    async fn lookup(&self, key: &str) -> Option<Response> {
        match self.storage.match_any(key).await {
            Ok(hit) => hit,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "cache lookup failed");
                None
            }
        }
    }

    /// Storage write errors are logged; the response still reaches the page.
    async fn store_runtime(&self, key: &str, response: &Response) {
        if !response.is_ok_200() {
            return;
        }
        let cache = &self.settings.runtime_cache_name;
        if let Err(err) = self.storage.put(cache, key, response).await {
            tracing::warn!(cache = %cache, key = %key, error = %err, "failed to write runtime cache");
        }
    }

    async fn offline_document(&self) -> Response {
        for candidate in [self.settings.offline_document.as_str(), "/"] {
            let Ok(key) = normalize(candidate, &self.settings.origin) else {
                continue;
            };
            if let Some(response) = self.lookup(&key).await {
                return response;
            }
        }
        Response::html(503, OFFLINE_PAGE)
    }

    /// Fetch and store every URL concurrently; results keep input order.
    ///
    /// Live-only resources (version check, worker script) are never fetched
    /// into a cache and are reported as failures.
    async fn populate(&self, cache: &str, urls: &[String]) -> PopulateReport {
        let semaphore = Arc::new(Semaphore::new(self.settings.install_concurrency.max(1)));
        let mut join_set = JoinSet::new();
        let mut slots: Vec<Option<Result<String, String>>> = vec![None; urls.len()];

        for (index, raw) in urls.iter().cloned().enumerate() {
            let url = match resolve(&raw, &self.settings.origin) {
                Ok(url) => url,
                Err(err) => {
                    slots[index] = Some(Err(err.to_string()));
                    continue;
                }
            };
            let request = Request::get(raw.clone());
            if matches!(self.routes.route(&url, &request), Policy::LiveNoStore | Policy::FallbackJson) {
                tracing::debug!(url = %url, cache = %cache, "skipping live-only resource");
                slots[index] = Some(Err(LIVE_ONLY.to_string()));
                continue;
            }

            let semaphore = semaphore.clone();
            let storage = self.storage.clone();
            let network = self.network.clone();
            let key = request_key(&url, &self.settings.origin);
            let cache = cache.to_string();

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = fetch_and_store(storage.as_ref(), network.as_ref(), &cache, &url, &request, key).await;
                (index, raw, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, raw, result)) => {
                    if let Err(reason) = &result {
                        tracing::warn!(url = %raw, cache = %cache, reason = %reason, "failed to cache asset");
                    }
                    slots[index] = Some(result);
                }
                Err(err) => tracing::error!(error = %err, "asset task aborted"),
            }
        }

        let mut report = PopulateReport { cache: cache.to_string(), ..Default::default() };
        for (raw, slot) in urls.iter().zip(slots) {
            match slot {
                Some(Ok(key)) => report.cached.push(key),
                Some(Err(reason)) => report.failed.push(AssetFailure { url: raw.clone(), reason }),
                None => report.failed.push(AssetFailure { url: raw.clone(), reason: "task aborted".into() }),
            }
        }
        report
    }
}

async fn fetch_and_store<S, N>(
    storage: &S, network: &N, cache: &str, url: &Url, request: &Request, key: String,
) -> Result<String, String>
where
    S: CacheStorage + ?Sized,
    N: Network + ?Sized,
{
    let response = network
        .fetch(url, request, FetchMode::Default)
        .await
        .map_err(|e| e.to_string())?;

    if !response.is_ok_200() {
        return Err(format!("unexpected status {}", response.status));
    }

    storage.put(cache, &key, &response).await.map_err(|e| e.to_string())?;
    Ok(key)
}
