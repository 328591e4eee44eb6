//! Decoded response bodies.

pub mod bulk;
pub mod search;

pub use bulk::{
    BulkItem, BulkItemError, BulkItemFailure, BulkItemResult, BulkResponse,
    DEFAULT_FAILURE_STATUS_THRESHOLD,
};
pub use search::{Hit, Hits, SearchResponse, ShardStats, TotalHits, TotalHitsRelation};
