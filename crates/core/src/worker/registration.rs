//! Per-origin registration: which worker generation is active and which is waiting.
//!
//! Registering a new generation installs it; it takes over immediately when
//! nothing is active or when it asked to skip waiting. The generation it
//! replaces becomes redundant.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

use super::{
    ActivateReport, ControlMessage, FetchOutcome, InstallReport, MessageOutcome, OfflineCacheWorker, Policy,
    ResponseSource,
};
use crate::Error;
use crate::cache::CacheStorage;
use crate::cache::key::resolve;
use crate::http::{FetchMode, Request};
use crate::network::Network;

/// Result of registering a worker generation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RegisterOutcome {
    pub install: InstallReport,
    /// Present when the new worker took over immediately.
    pub activated: Option<ActivateReport>,
}

type Slot<S, N> = RwLock<Option<Arc<OfflineCacheWorker<S, N>>>>;

pub struct Registration<S, N> {
    origin: Url,
    network: Arc<N>,
    active: Slot<S, N>,
    waiting: Slot<S, N>,
}

impl<S, N> Registration<S, N>
where
    S: CacheStorage + 'static,
    N: Network + 'static,
{
    pub fn new(origin: Url, network: Arc<N>) -> Self {
        Self { origin, network, active: RwLock::new(None), waiting: RwLock::new(None) }
    }

    pub async fn active(&self) -> Option<Arc<OfflineCacheWorker<S, N>>> {
        self.active.read().await.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<OfflineCacheWorker<S, N>>> {
        self.waiting.read().await.clone()
    }

    /// Install a new generation and activate it if nothing blocks it.
    pub async fn register(&self, worker: Arc<OfflineCacheWorker<S, N>>) -> Result<RegisterOutcome, Error> {
        let install = worker.install().await?;

        let replaced = self.waiting.write().await.replace(worker.clone());
        if let Some(old) = replaced {
            old.mark_redundant().await?;
        }

        let takes_over = self.active.read().await.is_none() || worker.skip_waiting_requested().await;
        let activated = if takes_over { self.promote().await? } else { None };

        Ok(RegisterOutcome { install, activated })
    }

    /// Activate the waiting worker now, if there is one.
    pub async fn skip_waiting(&self) -> Result<Option<ActivateReport>, Error> {
        self.promote().await
    }

    /// Deliver a control message the way a page posting to the registration would.
    ///
    /// Skip-waiting targets the waiting worker and is a no-op without one;
    /// everything else goes to the active worker, or the waiting one before
    /// anything is active.
    pub async fn post_message(&self, message: ControlMessage) -> Result<MessageOutcome, Error> {
        if message == ControlMessage::SkipWaiting {
            return Ok(match self.promote().await? {
                Some(report) => MessageOutcome::Activated(report),
                None => MessageOutcome::NothingWaiting,
            });
        }

        let target = match self.active().await {
            Some(worker) => worker,
            None => self
                .waiting()
                .await
                .ok_or_else(|| Error::InvalidState("no worker registered".into()))?,
        };
        target.handle_message(message).await
    }

    /// Route a request through the active worker, or straight to the
    /// network when no worker controls the origin.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        if let Some(worker) = self.active().await {
            return worker.handle_fetch(request).await;
        }

        let url = resolve(&request.url, &self.origin)?;
        let response = self.network.fetch(&url, request, FetchMode::Default).await?;
        Ok(FetchOutcome { response, source: ResponseSource::Network, policy: Policy::LiveNoStore })
    }

    async fn promote(&self) -> Result<Option<ActivateReport>, Error> {
        let Some(next) = self.waiting.write().await.take() else {
            return Ok(None);
        };

        let report = next.activate().await?;

        let previous = self.active.write().await.replace(next);
        if let Some(previous) = previous {
            previous.mark_redundant().await?;
        }

        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStorage;
    use crate::http::Response;
    use crate::worker::WorkerState;
    use crate::worker::testing::{ORIGIN, ScriptedNetwork, settings};

    fn generation(
        name: &str, storage: &Arc<MemoryStorage>, net: &Arc<ScriptedNetwork>, skip_waiting: bool,
    ) -> Arc<OfflineCacheWorker<MemoryStorage, ScriptedNetwork>> {
        let mut cfg = settings(&["/"]);
        cfg.current_cache_name = name.to_string();
        cfg.skip_waiting_on_install = skip_waiting;
        Arc::new(OfflineCacheWorker::new(cfg, storage.clone(), net.clone()))
    }

    fn registration(net: &Arc<ScriptedNetwork>) -> Registration<MemoryStorage, ScriptedNetwork> {
        Registration::new(Url::parse(ORIGIN).unwrap(), net.clone())
    }

    #[tokio::test]
    async fn test_first_registration_activates() {
        let net = ScriptedNetwork::new();
        net.serve("/", "home");
        let storage = Arc::new(MemoryStorage::new());
        let reg = registration(&net);

        let v1 = generation("app-v1", &storage, &net, false);
        let outcome = reg.register(v1.clone()).await.unwrap();

        assert!(outcome.activated.is_some());
        assert_eq!(v1.state().await, WorkerState::Active);
        assert!(reg.waiting().await.is_none());
    }

    #[tokio::test]
    async fn test_rollover_makes_previous_redundant() {
        let net = ScriptedNetwork::new();
        net.serve("/", "home");
        let storage = Arc::new(MemoryStorage::new());
        let reg = registration(&net);

        let v1 = generation("app-v1", &storage, &net, true);
        reg.register(v1.clone()).await.unwrap();
        let v2 = generation("app-v2", &storage, &net, true);
        let outcome = reg.register(v2.clone()).await.unwrap();

        let activated = outcome.activated.unwrap();
        assert_eq!(activated.deleted, vec!["app-v1"]);
        assert_eq!(v1.state().await, WorkerState::Redundant);
        assert_eq!(v2.state().await, WorkerState::Active);
        assert_eq!(storage.keys().await.unwrap(), vec!["app-v2"]);
    }

    #[tokio::test]
    async fn test_new_generation_waits_without_skip_waiting() {
        let net = ScriptedNetwork::new();
        net.serve("/", "home");
        let storage = Arc::new(MemoryStorage::new());
        let reg = registration(&net);

        reg.register(generation("app-v1", &storage, &net, false)).await.unwrap();
        let v2 = generation("app-v2", &storage, &net, false);
        let outcome = reg.register(v2.clone()).await.unwrap();

        assert!(outcome.activated.is_none());
        assert_eq!(v2.state().await, WorkerState::Waiting);

        let message = reg.post_message(ControlMessage::SkipWaiting).await.unwrap();
        assert!(matches!(message, MessageOutcome::Activated(_)));
        assert_eq!(v2.state().await, WorkerState::Active);
    }

    #[tokio::test]
    async fn test_fetch_without_worker_goes_to_network() {
        let net = ScriptedNetwork::new();
        net.serve("/dashboard", "dash");
        let reg = registration(&net);

        let outcome = reg.handle_fetch(&Request::get("/dashboard")).await.unwrap();
        assert_eq!(outcome.source, ResponseSource::Network);
        assert_eq!(outcome.response.text(), "dash");
    }

    #[tokio::test]
    async fn test_fetch_with_active_worker_uses_cache() {
        let net = ScriptedNetwork::new();
        net.serve("/", "home");
        let storage = Arc::new(MemoryStorage::new());
        let reg = registration(&net);
        reg.register(generation("app-v1", &storage, &net, true)).await.unwrap();

        net.respond("/", Response::html(500, "broken"));
        let outcome = reg.handle_fetch(&Request::navigate("/")).await.unwrap();
        assert_eq!(outcome.source, ResponseSource::Cache);
        assert_eq!(outcome.response.text(), "home");
    }

    #[tokio::test]
    async fn test_skip_waiting_without_waiting_worker_changes_nothing() {
        let net = ScriptedNetwork::new();
        net.serve("/", "home");
        let storage = Arc::new(MemoryStorage::new());
        let reg = registration(&net);
        let v1 = generation("app-v1", &storage, &net, false);
        reg.register(v1.clone()).await.unwrap();

        let message = reg.post_message(ControlMessage::SkipWaiting).await.unwrap();
        assert!(matches!(message, MessageOutcome::NothingWaiting));
        assert!(!v1.skip_waiting_requested().await);

        let v2 = generation("app-v2", &storage, &net, false);
        let outcome = reg.register(v2.clone()).await.unwrap();
        assert!(outcome.activated.is_none());
        assert_eq!(v2.state().await, WorkerState::Waiting);
    }

    #[tokio::test]
    async fn test_message_without_worker_fails() {
        let reg = registration(&ScriptedNetwork::new());
        let result = reg.post_message(ControlMessage::CacheUrls { urls: vec!["/a.js".into()] }).await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }
}
