//! Outcome reports for lifecycle operations.

use serde::{Deserialize, Serialize};

/// A single asset that could not be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AssetFailure {
    pub url: String,
    pub reason: String,
}

/// Result of a best-effort population pass over a list of URLs.
///
/// Both lists keep the order of the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PopulateReport {
    /// Cache the entries were written to.
    pub cache: String,
    /// Request keys that were stored.
    pub cached: Vec<String>,
    pub failed: Vec<AssetFailure>,
}

impl PopulateReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Install always succeeds; partial failures are reported, not raised.
pub type InstallReport = PopulateReport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivateReport {
    pub current: String,
    pub runtime: String,
    /// Superseded caches removed during activation.
    pub deleted: Vec<String>,
    pub clients_claimed: bool,
}
