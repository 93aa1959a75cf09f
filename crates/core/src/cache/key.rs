//! Request-key normalization.
//!
//! Same-origin requests are keyed by `path[?query]` so that `/dashboard` and
//! `https://app.example/dashboard#top` share an entry. Cross-origin requests
//! keep their full URL.

use url::Url;

use crate::Error;

/// Resolve a request URL (absolute or origin-relative) against the origin.
pub fn resolve(raw: &str, origin: &Url) -> Result<Url, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty URL".into()));
    }

    let mut url = origin.join(trimmed)?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(Error::InvalidUrl(format!("unsupported scheme: {scheme}"))),
    }
    url.set_fragment(None);
    Ok(url)
}

/// Whether two URLs share scheme, host and port.
pub fn is_same_origin(url: &Url, origin: &Url) -> bool {
    url.origin() == origin.origin()
}

/// Cache key for an already-resolved URL.
pub fn request_key(url: &Url, origin: &Url) -> String {
    if !is_same_origin(url, origin) {
        return url.to_string();
    }
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

/// Resolve and key in one step.
pub fn normalize(raw: &str, origin: &Url) -> Result<String, Error> {
    Ok(request_key(&resolve(raw, origin)?, origin))
}
