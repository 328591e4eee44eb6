//! Decoded search response.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of a search or aggregation request.
///
/// This is a structural decode of the engine's JSON. Nothing is filtered or
/// re-ranked, and the shard counts are passed through without checking that
/// they add up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Time the engine spent on the request, in milliseconds
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(rename = "_shards", default)]
    pub shards: ShardStats,
    #[serde(default)]
    pub hits: Hits,
    /// Aggregation results keyed by aggregation name
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub aggregations: Map<String, Value>,
}

impl SearchResponse {
    /// Total hit count reported by the engine, if it was tracked.
    pub fn total_hits(&self) -> Option<u64> {
        self.hits.total.as_ref().map(|t| t.value)
    }

    /// Decode every hit's `_source` into `T`.
    pub fn sources<T: DeserializeOwned>(&self) -> serde_json::Result<Vec<T>> {
        self.hits.hits.iter().map(|hit| hit.deserialize_source()).collect()
    }
}

/// Per-shard execution counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub successful: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub failed: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hits {
    /// Absent when hit tracking was disabled for the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// Total hit count and whether it is exact or a lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TotalHitsRepr")]
pub struct TotalHits {
    pub value: u64,
    pub relation: TotalHitsRelation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalHitsRelation {
    /// The count is exact
    #[default]
    Eq,
    /// The count is a lower bound
    Gte,
}

impl std::fmt::Display for TotalHitsRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TotalHitsRelation::Eq => write!(f, "eq"),
            TotalHitsRelation::Gte => write!(f, "gte"),
        }
    }
}

// Engines before 7.0 report the total as a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum TotalHitsRepr {
    Object {
        value: u64,
        #[serde(default)]
        relation: TotalHitsRelation,
    },
    Count(u64),
}

impl From<TotalHitsRepr> for TotalHits {
    fn from(repr: TotalHitsRepr) -> Self {
        match repr {
            TotalHitsRepr::Object { value, relation } => TotalHits { value, relation },
            TotalHitsRepr::Count(value) => TotalHits {
                value,
                relation: TotalHitsRelation::Eq,
            },
        }
    }
}

/// One matched document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index")]
    pub index: String,
    /// Mapping type, only reported by older engines
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    /// The original document body
    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
}

impl Hit {
    pub fn deserialize_source<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(Value::Object(self.source.clone()))
    }
}
