//! In-process cache storage.
//!
//! Uses an ordered list of named caches behind a tokio RwLock so creation
//! order is preserved for `match_any`.

use std::collections::HashMap;
use tokio::sync::RwLock;

use super::CacheStorage;
use crate::Error;
use crate::http::Response;

#[derive(Debug, Default)]
struct NamedCache {
    name: String,
    entries: HashMap<String, Response>,
}

/// Cache storage held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    caches: RwLock<Vec<NamedCache>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let mut caches = self.caches.write().await;
        if !caches.iter().any(|c| c.name == name) {
            caches.push(NamedCache { name: name.to_string(), entries: HashMap::new() });
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let caches = self.caches.read().await;
        Ok(caches.iter().map(|c| c.name.clone()).collect())
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        let caches = self.caches.read().await;
        Ok(caches.iter().any(|c| c.name == name))
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let mut caches = self.caches.write().await;
        let before = caches.len();
        caches.retain(|c| c.name != name);
        Ok(caches.len() != before)
    }

    async fn put(&self, name: &str, key: &str, response: &Response) -> Result<(), Error> {
        let mut caches = self.caches.write().await;
        match caches.iter_mut().find(|c| c.name == name) {
            Some(cache) => {
                cache.entries.insert(key.to_string(), response.clone());
            }
            None => {
                let mut entries = HashMap::new();
                entries.insert(key.to_string(), response.clone());
                caches.push(NamedCache { name: name.to_string(), entries });
            }
        }
        Ok(())
    }

    async fn match_in(&self, name: &str, key: &str) -> Result<Option<Response>, Error> {
        let caches = self.caches.read().await;
        Ok(caches
            .iter()
            .find(|c| c.name == name)
            .and_then(|c| c.entries.get(key).cloned()))
    }

    async fn match_any(&self, key: &str) -> Result<Option<Response>, Error> {
        let caches = self.caches.read().await;
        Ok(caches.iter().find_map(|c| c.entries.get(key).cloned()))
    }

    async fn entries(&self, name: &str) -> Result<Vec<String>, Error> {
        let caches = self.caches.read().await;
        let mut keys: Vec<String> = caches
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> Response {
        Response::html(200, body.to_string())
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let storage = MemoryStorage::new();
        storage.open("shell-v1").await.unwrap();
        storage.open("shell-v1").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["shell-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_put_overwrites_whole_entry() {
        let storage = MemoryStorage::new();
        storage.put("runtime", "/", &page("old")).await.unwrap();
        storage.put("runtime", "/", &page("new")).await.unwrap();
        let hit = storage.match_in("runtime", "/").await.unwrap().unwrap();
        assert_eq!(hit.text(), "new");
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_cache() {
        let storage = MemoryStorage::new();
        storage.put("shell-v1", "/", &page("shell")).await.unwrap();
        storage.put("runtime", "/", &page("runtime")).await.unwrap();
        let hit = storage.match_any("/").await.unwrap().unwrap();
        assert_eq!(hit.text(), "shell");
    }

    #[tokio::test]
    async fn test_delete_removes_entries() {
        let storage = MemoryStorage::new();
        storage.put("shell-v1", "/", &page("shell")).await.unwrap();
        assert!(storage.delete("shell-v1").await.unwrap());
        assert!(!storage.delete("shell-v1").await.unwrap());
        assert!(storage.match_any("/").await.unwrap().is_none());
        assert!(!storage.has("shell-v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_entries_sorted() {
        let storage = MemoryStorage::new();
        storage.put("runtime", "/b", &page("b")).await.unwrap();
        storage.put("runtime", "/a", &page("a")).await.unwrap();
        assert_eq!(storage.entries("runtime").await.unwrap(), vec!["/a", "/b"]);
        assert!(storage.entries("missing").await.unwrap().is_empty());
    }
}
