//! Per-request routing.
//!
//! `route` only decides *what* to do with a request; it never touches the
//! network or storage, so the decision table can be tested on its own.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::key::is_same_origin;
use crate::http::{Method, Request};

/// How a single request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Always hit the network; never read or write a cache.
    LiveNoStore,
    /// Serve from cache when present, otherwise fetch and populate the runtime cache.
    CacheFirst,
    /// Fetch first and populate the runtime cache; fall back to a cached copy.
    NetworkFirst,
    /// Live and uncached like `LiveNoStore`, but a network failure yields a
    /// synthesized `{ "version": ... }` document instead of an error.
    FallbackJson,
}

/// What `route` needs to know about the worker's deployment.
#[derive(Debug, Clone)]
pub struct RouteTable {
    pub origin: Url,
    /// Substring identifying the version-check resource.
    pub version_marker: String,
    /// Path of the worker's own script on the origin.
    pub worker_script: String,
}

impl RouteTable {
    /// Pick the policy for a resolved request URL.
    pub fn route(&self, url: &Url, request: &Request) -> Policy {
        if url.path().contains(&self.version_marker) {
            return Policy::FallbackJson;
        }

        if request.method != Method::Get {
            return Policy::LiveNoStore;
        }

        let same_origin = is_same_origin(url, &self.origin);

        if same_origin && url.path() == self.worker_script {
            return Policy::LiveNoStore;
        }

        if same_origin { Policy::CacheFirst } else { Policy::NetworkFirst }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable {
            origin: Url::parse("https://study.example").unwrap(),
            version_marker: "version.json".into(),
            worker_script: "/sw.js".into(),
        }
    }

    fn route(raw: &str) -> Policy {
        let table = table();
        let url = table.origin.join(raw).unwrap();
        table.route(&url, &Request::get(raw))
    }

    #[test]
    fn test_version_check_is_fallback_json() {
        assert_eq!(route("/version.json"), Policy::FallbackJson);
        assert_eq!(route("/version.json?t=1700000000"), Policy::FallbackJson);
        assert_eq!(route("/releases/version.json"), Policy::FallbackJson);
    }

    #[test]
    fn test_version_check_matches_cross_origin_too() {
        assert_eq!(route("https://releases.example/app/version.json"), Policy::FallbackJson);
    }

    #[test]
    fn test_worker_script_is_live() {
        assert_eq!(route("/sw.js"), Policy::LiveNoStore);
        assert_eq!(route("/sw.js?v=2"), Policy::LiveNoStore);
    }

    #[test]
    fn test_same_origin_is_cache_first() {
        assert_eq!(route("/"), Policy::CacheFirst);
        assert_eq!(route("/dashboard"), Policy::CacheFirst);
        assert_eq!(route("/static/sw.js"), Policy::CacheFirst);
    }

    #[test]
    fn test_cross_origin_is_network_first() {
        assert_eq!(route("https://cdn.tailwindcss.com"), Policy::NetworkFirst);
        assert_eq!(route("https://unpkg.com/lucide@latest"), Policy::NetworkFirst);
    }

    #[test]
    fn test_other_worker_script_on_cdn_is_network_first() {
        assert_eq!(route("https://cdn.example/sw.js"), Policy::NetworkFirst);
    }

    #[test]
    fn test_non_get_is_live() {
        let table = table();
        let url = table.origin.join("/api/tasks").unwrap();
        let request = Request::get("/api/tasks").with_method(Method::Post);
        assert_eq!(table.route(&url, &request), Policy::LiveNoStore);
    }
}
