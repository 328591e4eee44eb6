//! Elasticsearch client and operations.

mod bulk;
mod client;
pub mod holder;
mod indices;
mod response;
mod search;

#[cfg(test)]
pub(crate) mod mock;

pub use bulk::{import_test_data, import_test_file, BulkOptions, BulkSummary, RefreshPolicy};
pub use client::EsClient;
pub use indices::{clear_test_data, refresh_indices};
pub use search::{search, HitTracking, SearchOptions};
