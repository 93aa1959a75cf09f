//! Request and response values exchanged between pages, the worker,
//! the network, and cache storage.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Accept header sent for page navigations.
pub const NAVIGATE_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            other => Err(Error::InvalidInput(format!("unsupported method: {other}"))),
        }
    }
}

/// An intercepted request.
///
/// `url` may be absolute or relative to the worker's origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub method: Method,
    pub accept: Option<String>,
}

impl Request {
    /// A plain GET with no declared accept type.
    pub fn get(url: impl Into<String>) -> Self {
        Self { url: url.into(), method: Method::Get, accept: None }
    }

    /// A page navigation: GET accepting HTML.
    pub fn navigate(url: impl Into<String>) -> Self {
        Self::get(url).with_accept(NAVIGATE_ACCEPT)
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// True when the request declares an HTML accept type.
    pub fn accepts_html(&self) -> bool {
        self.accept
            .as_deref()
            .is_some_and(|accept| accept.to_ascii_lowercase().contains("text/html"))
    }
}

/// How a request may interact with HTTP caches between the worker and the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Ordinary request.
    Default,
    /// Ask every intermediary to neither serve nor keep a cached copy.
    NoStore,
}

/// A response as returned by the network and as stored in a cache entry.
///
/// Entries are immutable: a put replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// Build a JSON response from any serializable value.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Result<Self, Error> {
        let body = serde_json::to_vec(value).map_err(|e| Error::InvalidInput(format!("failed to encode JSON: {e}")))?;
        Ok(Self::new(status, vec![("content-type".into(), "application/json".into())], body))
    }

    pub fn html(status: u16, body: impl Into<Bytes>) -> Self {
        Self::new(status, vec![("content-type".into(), "text/html; charset=utf-8".into())], body)
    }

    /// Only plain 200 responses are eligible for caching.
    pub fn is_ok_200(&self) -> bool {
        self.status == 200
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigate_accepts_html() {
        assert!(Request::navigate("/").accepts_html());
        assert!(!Request::get("/app.js").accepts_html());
        assert!(!Request::get("/data").with_accept("application/json").accepts_html());
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("post".parse::<Method>().unwrap(), Method::Post);
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let resp = Response::new(200, vec![("Content-Type".into(), "text/css".into())], "body{}");
        assert_eq!(resp.content_type(), Some("text/css"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("text/css"));
        assert_eq!(resp.header("etag"), None);
    }

    #[test]
    fn test_json_response() {
        let resp = Response::json(200, &serde_json::json!({ "version": "6.1.1" })).unwrap();
        assert_eq!(resp.content_type(), Some("application/json"));
        let value: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
        assert_eq!(value["version"], "6.1.1");
    }

    #[test]
    fn test_only_200_is_cacheable() {
        assert!(Response::html(200, "ok").is_ok_200());
        assert!(!Response::html(204, "").is_ok_200());
        assert!(!Response::html(404, "missing").is_ok_200());
    }
}
