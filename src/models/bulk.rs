//! Decoded bulk response and per-document failures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default per-item status above which a bulk item counts as failed.
/// `200` (updated) and `201` (created) are successes.
pub const DEFAULT_FAILURE_STATUS_THRESHOLD: u16 = 201;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub took: u64,
    /// True if any item failed
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<BulkItem>,
}

/// One bulk item, keyed by its action (`index`, `create`, `update`, `delete`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct BulkItem(BTreeMap<String, BulkItemResult>);

impl BulkItem {
    /// The action name and its result.
    pub fn outcome(&self) -> Option<(&str, &BulkItemResult)> {
        self.0.iter().next().map(|(action, result)| (action.as_str(), result))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkItemResult {
    #[serde(rename = "_index", default)]
    pub index: Option<String>,
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    /// Engine result string, e.g. `created` or `updated`
    #[serde(default)]
    pub result: Option<String>,
    pub status: u16,
    #[serde(default)]
    pub error: Option<BulkItemError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkItemError {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub caused_by: Option<Box<BulkItemError>>,
}

/// A document the engine refused during a bulk import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkItemFailure {
    pub action: String,
    pub id: Option<String>,
    pub status: u16,
    pub error_type: Option<String>,
    pub reason: Option<String>,
    pub cause_type: Option<String>,
    pub cause_reason: Option<String>,
}

impl BulkItemFailure {
    fn new(action: &str, result: &BulkItemResult) -> Self {
        let error = result.error.as_ref();
        let cause = error.and_then(|e| e.caused_by.as_deref());
        Self {
            action: action.to_string(),
            id: result.id.clone(),
            status: result.status,
            error_type: error.and_then(|e| e.error_type.clone()),
            reason: error.and_then(|e| e.reason.clone()),
            cause_type: cause.and_then(|c| c.error_type.clone()),
            cause_reason: cause.and_then(|c| c.reason.clone()),
        }
    }
}

impl std::fmt::Display for BulkItemFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}: {}: {}: {}",
            self.status,
            self.action,
            self.id.as_deref().unwrap_or("-"),
            self.error_type.as_deref().unwrap_or_default(),
            self.reason.as_deref().unwrap_or_default(),
            self.cause_type.as_deref().unwrap_or_default(),
            self.cause_reason.as_deref().unwrap_or_default(),
        )
    }
}

impl BulkResponse {
    /// Split the items into a success count and the failed items.
    ///
    /// An item fails when its status is above `threshold`. The top-level
    /// `errors` flag is not consulted.
    pub fn partition(&self, threshold: u16) -> (usize, Vec<BulkItemFailure>) {
        let mut indexed = 0;
        let mut failures = Vec::new();

        for (action, result) in self.items.iter().filter_map(BulkItem::outcome) {
            if result.status > threshold {
                failures.push(BulkItemFailure::new(action, result));
            } else {
                indexed += 1;
            }
        }

        (indexed, failures)
    }
}
