//! esdemo - a small harness for exercising an Elasticsearch cluster
//!
//! Bulk-loads test documents, searches them, and deletes the index afterward.
//! The `esdemo` binary drives these operations from the command line.

pub mod config;
pub mod elasticsearch;
pub mod error;
pub mod models;

pub use config::{BulkConfig, Config, EsConfig};
pub use self::elasticsearch::{
    clear_test_data, import_test_data, import_test_file, search, BulkOptions, EsClient,
    SearchOptions,
};
pub use error::EsError;
pub use models::{Hit, SearchResponse};
