//! Search execution with a uniform error contract.

use std::time::Duration;

use elasticsearch::params::TrackTotalHits;
use elasticsearch::SearchParts;
use serde::Serialize;
use tracing::{debug, error};

use super::response::read_json;
use super::EsClient;
use crate::error::{EsError, Result};
use crate::models::SearchResponse;

/// How the engine should count total hits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HitTracking {
    /// Count every match exactly
    #[default]
    Exact,
    /// Skip counting; `hits.total` is omitted
    Disabled,
    /// Count exactly up to the given number, then report a lower bound
    UpTo(i64),
}

impl From<HitTracking> for TrackTotalHits {
    fn from(tracking: HitTracking) -> Self {
        match tracking {
            HitTracking::Exact => TrackTotalHits::Track(true),
            HitTracking::Disabled => TrackTotalHits::Track(false),
            HitTracking::UpTo(limit) => TrackTotalHits::Count(limit),
        }
    }
}

/// Per-call search parameters.
///
/// Each setter replaces any earlier value for the same parameter.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub indices: Vec<String>,
    pub routing: Vec<String>,
    /// Engine-side timeout, e.g. `"5s"`
    pub timeout: Option<String>,
    pub size: Option<i64>,
    pub from: Option<i64>,
    pub track_total_hits: HitTracking,
    /// Client-side deadline for the whole round trip
    pub request_timeout: Option<Duration>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the search to a single index.
    pub fn with_index(self, index: impl Into<String>) -> Self {
        self.with_indices([index])
    }

    pub fn with_indices<I, S>(mut self, indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indices = indices.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_routing<I, S>(mut self, routing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routing = routing.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_from(mut self, from: i64) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_track_total_hits(mut self, tracking: HitTracking) -> Self {
        self.track_total_hits = tracking;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// Run `query` as a search request and decode the result.
///
/// `query` is sent as-is; its shape is not checked. Failures map to
/// [`EsError::Encoding`] (before any request is made),
/// [`EsError::Transport`], [`EsError::Engine`] or [`EsError::Decode`].
pub async fn search<Q>(
    client: &EsClient,
    query: &Q,
    options: &SearchOptions,
) -> Result<SearchResponse>
where
    Q: Serialize + ?Sized,
{
    let body = serde_json::to_value(query).map_err(|e| {
        error!("Error encoding query: {}", e);
        EsError::Encoding(e)
    })?;

    let indices: Vec<&str> = options.indices.iter().map(String::as_str).collect();
    let routing: Vec<&str> = options.routing.iter().map(String::as_str).collect();

    let parts = if indices.is_empty() {
        SearchParts::None
    } else {
        SearchParts::Index(&indices)
    };

    debug!("Search query: {}", body);

    let mut request = client
        .client()
        .search(parts)
        .body(body)
        .track_total_hits(TrackTotalHits::from(options.track_total_hits));

    if !routing.is_empty() {
        request = request.routing(&routing);
    }
    if let Some(timeout) = options.timeout.as_deref() {
        request = request.timeout(timeout);
    }
    if let Some(size) = options.size {
        request = request.size(size);
    }
    if let Some(from) = options.from {
        request = request.from(from);
    }
    if let Some(deadline) = options.request_timeout {
        request = request.request_timeout(deadline);
    }

    let response = request.send().await.map_err(|e| {
        error!("Error getting response: {}", e);
        EsError::Transport(e)
    })?;

    let resp: SearchResponse = read_json(response).await?;

    debug!(
        "Search took {}ms, {} hits returned",
        resp.took,
        resp.hits.hits.len()
    );

    Ok(resp)
}
