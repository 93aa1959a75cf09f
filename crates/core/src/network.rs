//! The network seam the worker fetches through.

use url::Url;

use crate::Error;
use crate::http::{FetchMode, Request, Response};

/// Outbound fetches on behalf of the worker.
///
/// Any HTTP status is a successful fetch. Only transport failures (DNS,
/// connect, reset, timeout) are errors, and they map to `Error::Network`.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    /// Fetch `url` (already resolved against the origin) for `request`.
    async fn fetch(&self, url: &Url, request: &Request, mode: FetchMode) -> Result<Response, Error>;
}
