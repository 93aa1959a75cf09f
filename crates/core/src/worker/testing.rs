//! Test doubles for worker tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use url::Url;

use super::{OfflineCacheWorker, WorkerSettings};
use crate::Error;
use crate::cache::MemoryStorage;
use crate::http::{FetchMode, Request, Response};
use crate::network::Network;

pub const ORIGIN: &str = "https://study.example";

fn absolute(raw: &str) -> String {
    Url::parse(ORIGIN).unwrap().join(raw).unwrap().to_string()
}

/// Settings for generation `test-v2` with runtime cache `test-runtime`.
pub fn settings(manifest: &[&str]) -> WorkerSettings {
    WorkerSettings::new(
        "test-v2",
        "test-runtime",
        manifest.iter().map(|s| s.to_string()).collect(),
        Url::parse(ORIGIN).unwrap(),
    )
}

pub fn worker(settings: WorkerSettings, net: Arc<ScriptedNetwork>) -> OfflineCacheWorker<MemoryStorage, ScriptedNetwork> {
    OfflineCacheWorker::new(settings, Arc::new(MemoryStorage::new()), net)
}

/// In-memory network: canned responses per URL, a global offline switch,
/// and a log of every call.
#[derive(Default)]
pub struct ScriptedNetwork {
    responses: Mutex<HashMap<String, Response>>,
    unreachable: Mutex<HashSet<String>>,
    oversized: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: Mutex<Vec<(String, FetchMode)>>,
}

impl ScriptedNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve(&self, raw: &str, body: &str) {
        self.respond(raw, Response::html(200, body.to_string()));
    }

    pub fn respond(&self, raw: &str, response: Response) {
        self.responses.lock().unwrap().insert(absolute(raw), response);
    }

    pub fn unreachable(&self, raw: &str) {
        self.unreachable.lock().unwrap().insert(absolute(raw));
    }

    /// Reachable, but the body exceeds the size limit.
    pub fn oversized(&self, raw: &str) {
        self.oversized.lock().unwrap().insert(absolute(raw));
    }

    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, raw: &str) -> usize {
        self.modes_for(raw).len()
    }

    pub fn modes_for(&self, raw: &str) -> Vec<FetchMode> {
        let url = absolute(raw);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| *u == url)
            .map(|(_, mode)| *mode)
            .collect()
    }
}

#[async_trait::async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, url: &Url, _request: &Request, mode: FetchMode) -> Result<Response, Error> {
        let key = url.to_string();
        self.calls.lock().unwrap().push((key.clone(), mode));

        if self.offline.load(Ordering::SeqCst) || self.unreachable.lock().unwrap().contains(&key) {
            return Err(Error::Network(format!("unreachable: {key}")));
        }
        if self.oversized.lock().unwrap().contains(&key) {
            return Err(Error::FetchTooLarge(format!("body of {key} exceeds limit")));
        }

        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Response::html(404, "not found")))
    }
}
