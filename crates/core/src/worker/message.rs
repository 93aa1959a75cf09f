//! Out-of-band control messages posted to the worker by a page.

use serde::{Deserialize, Serialize};

use super::report::{ActivateReport, PopulateReport};
use crate::Error;

/// A structured control payload, discriminated by its `type` field.
///
/// ```json
/// { "type": "SKIP_WAITING" }
/// { "type": "CACHE_URLS", "urls": ["/extra.js"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    SkipWaiting,
    CacheUrls { urls: Vec<String> },
}

impl ControlMessage {
    /// Parse a JSON payload.
    pub fn from_json(payload: &str) -> Result<Self, Error> {
        serde_json::from_str(payload).map_err(|e| Error::InvalidMessage(e.to_string()))
    }
}

/// What handling a control message did.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// The waiting worker was activated immediately.
    Activated(ActivateReport),
    /// Skip-waiting recorded; the worker isn't waiting, so it applies on the next install.
    SkipWaitingArmed,
    /// Skip-waiting posted to a registration with no waiting worker; nothing changed.
    NothingWaiting,
    /// Runtime cache population result.
    Cached(PopulateReport),
}
