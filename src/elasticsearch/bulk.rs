//! Bulk import of pre-formatted NDJSON payloads.

use std::path::Path;
use std::time::Duration;

use elasticsearch::params::Refresh;
use elasticsearch::BulkParts;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error, info, warn};

use super::response::read_json;
use super::EsClient;
use crate::config::BulkConfig;
use crate::error::{EsError, Result};
use crate::models::{BulkResponse, DEFAULT_FAILURE_STATUS_THRESHOLD};

/// When imported documents become visible to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Refresh the affected shards immediately
    True,
    /// Leave it to the periodic refresh
    False,
    /// Block until the next refresh makes the documents visible
    WaitFor,
}

impl From<RefreshPolicy> for Refresh {
    fn from(policy: RefreshPolicy) -> Self {
        match policy {
            RefreshPolicy::True => Refresh::True,
            RefreshPolicy::False => Refresh::False,
            RefreshPolicy::WaitFor => Refresh::WaitFor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkOptions {
    /// Item status above which a document counts as failed
    pub failure_status_threshold: u16,
    pub refresh: Option<RefreshPolicy>,
    pub request_timeout: Option<Duration>,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            failure_status_threshold: DEFAULT_FAILURE_STATUS_THRESHOLD,
            refresh: None,
            request_timeout: None,
        }
    }
}

impl From<BulkConfig> for BulkOptions {
    fn from(config: BulkConfig) -> Self {
        Self {
            failure_status_threshold: config.failure_status_threshold,
            refresh: config.refresh,
            request_timeout: None,
        }
    }
}

impl BulkOptions {
    pub fn with_refresh(mut self, refresh: RefreshPolicy) -> Self {
        self.refresh = Some(refresh);
        self
    }
}

/// Outcome of a fully successful import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSummary {
    pub index: String,
    pub indexed: usize,
    pub took: u64,
}

/// Send a bulk payload to `index` and check every item's status.
///
/// `body` must already be in bulk syntax (action line, then document line);
/// it is forwarded line by line without validation. If any item fails the
/// whole call returns [`EsError::PartialFailure`] listing the failed items.
/// Nothing is retried.
pub async fn import_test_data<R>(
    client: &EsClient,
    index: &str,
    mut body: R,
    options: &BulkOptions,
) -> Result<BulkSummary>
where
    R: AsyncRead + Unpin,
{
    if index.is_empty() {
        return Err(EsError::invalid_argument("index name must not be empty"));
    }

    let mut payload = Vec::new();
    body.read_to_end(&mut payload).await?;

    let lines = ndjson_lines(&payload);
    if lines.is_empty() {
        return Err(EsError::invalid_argument("bulk payload is empty"));
    }

    debug!("Sending {} bulk lines to [{}]", lines.len(), index);

    let mut request = client.client().bulk(BulkParts::Index(index)).body(lines);
    if let Some(refresh) = options.refresh {
        request = request.refresh(refresh.into());
    }
    if let Some(deadline) = options.request_timeout {
        request = request.request_timeout(deadline);
    }

    let response = request.send().await.map_err(|e| {
        error!("Failed to index test data: {}", e);
        EsError::Transport(e)
    })?;

    let bulk: BulkResponse = read_json(response).await?;
    let (indexed, failures) = bulk.partition(options.failure_status_threshold);

    if !failures.is_empty() {
        for failure in &failures {
            warn!("  Error: {}", failure);
        }
        warn!(
            "Bulk request had {} errors out of {} documents",
            failures.len(),
            indexed + failures.len()
        );
        return Err(EsError::PartialFailure { indexed, failures });
    }

    info!("total indexed {} documents in [{}]", indexed, index);

    Ok(BulkSummary {
        index: index.to_string(),
        indexed,
        took: bulk.took,
    })
}

/// Open `path` and import it with [`import_test_data`].
pub async fn import_test_file<P: AsRef<Path>>(
    client: &EsClient,
    index: &str,
    path: P,
    options: &BulkOptions,
) -> Result<BulkSummary> {
    let file = tokio::fs::File::open(path.as_ref()).await?;
    import_test_data(client, index, file, options).await
}

/// Split a payload into its non-blank lines, dropping `\r` line endings.
fn ndjson_lines(payload: &[u8]) -> Vec<Vec<u8>> {
    payload
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r".as_slice()).unwrap_or(line))
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .map(<[u8]>::to_vec)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elasticsearch::mock::MockCluster;

    const PAYLOAD: &str = "{\"index\":{\"_id\":\"1\"}}\n{\"title\":\"one\"}\r\n\n{\"index\":{\"_id\":\"2\"}}\n{\"title\":\"two\"}\n";

    const BULK_OK: &str = r#"{
        "took": 12,
        "errors": false,
        "items": [
            { "index": { "_index": "test", "_id": "1", "result": "created", "status": 201 } },
            { "index": { "_index": "test", "_id": "2", "result": "created", "status": 201 } }
        ]
    }"#;

    const BULK_PARTIAL: &str = r#"{
        "took": 12,
        "errors": true,
        "items": [
            { "index": { "_index": "test", "_id": "1", "result": "created", "status": 201 } },
            {
                "index": {
                    "_index": "test",
                    "_id": "2",
                    "status": 400,
                    "error": {
                        "type": "mapper_parsing_exception",
                        "reason": "failed to parse field [title] of type [long]",
                        "caused_by": { "type": "illegal_argument_exception", "reason": "For input string: \"two\"" }
                    }
                }
            }
        ]
    }"#;

    #[test]
    fn test_ndjson_lines() {
        let lines = ndjson_lines(PAYLOAD.as_bytes());
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], b"{\"title\":\"one\"}".to_vec());
        assert!(ndjson_lines(b"\n  \n").is_empty());
    }

    #[tokio::test]
    async fn test_import_success() {
        let cluster = MockCluster::start(200, BULK_OK).await;
        let options = BulkOptions::default().with_refresh(RefreshPolicy::WaitFor);

        let summary = import_test_data(&cluster.client(), "test", PAYLOAD.as_bytes(), &options)
            .await
            .unwrap();

        assert_eq!(
            summary,
            BulkSummary {
                index: "test".to_string(),
                indexed: 2,
                took: 12,
            }
        );

        let requests = cluster.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/test/_bulk");
        assert!(requests[0].query_has("refresh=wait_for"));
        assert_eq!(
            requests[0].body_text(),
            "{\"index\":{\"_id\":\"1\"}}\n{\"title\":\"one\"}\n{\"index\":{\"_id\":\"2\"}}\n{\"title\":\"two\"}\n"
        );
    }

    #[tokio::test]
    async fn test_import_partial_failure() {
        let cluster = MockCluster::start(200, BULK_PARTIAL).await;

        let err = import_test_data(
            &cluster.client(),
            "test",
            PAYLOAD.as_bytes(),
            &BulkOptions::default(),
        )
        .await
        .unwrap_err();

        match err {
            EsError::PartialFailure { indexed, failures } => {
                assert_eq!(indexed, 1);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].id.as_deref(), Some("2"));
                assert_eq!(failures[0].status, 400);
                assert_eq!(
                    failures[0].cause_reason.as_deref(),
                    Some("For input string: \"two\"")
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_import_threshold_is_configurable() {
        let cluster = MockCluster::start(200, BULK_PARTIAL).await;
        let options = BulkOptions {
            failure_status_threshold: 400,
            ..Default::default()
        };

        let summary = import_test_data(&cluster.client(), "test", PAYLOAD.as_bytes(), &options)
            .await
            .unwrap();
        assert_eq!(summary.indexed, 2);
    }

    #[tokio::test]
    async fn test_import_request_level_failure() {
        let cluster = MockCluster::start(
            400,
            r#"{"error": {"type": "illegal_argument_exception", "reason": "Malformed action/metadata line [1]"}, "status": 400}"#,
        )
        .await;

        let err = import_test_data(
            &cluster.client(),
            "test",
            PAYLOAD.as_bytes(),
            &BulkOptions::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.engine_reason(), Some("Malformed action/metadata line [1]"));
    }

    #[tokio::test]
    async fn test_import_rejects_bad_arguments() {
        let cluster = MockCluster::start(200, BULK_OK).await;
        let client = cluster.client();

        let err = import_test_data(&client, "", PAYLOAD.as_bytes(), &BulkOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EsError::InvalidArgument(_)));

        let err = import_test_data(&client, "test", "\n\n".as_bytes(), &BulkOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EsError::InvalidArgument(_)));

        assert!(cluster.requests().is_empty());
    }

    #[tokio::test]
    async fn test_import_transport_error_is_returned() {
        let client = MockCluster::unreachable_client().await;
        let err = import_test_data(&client, "test", PAYLOAD.as_bytes(), &BulkOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EsError::Transport(_)));
    }

    #[tokio::test]
    async fn test_import_missing_file() {
        let client = MockCluster::unreachable_client().await;
        let err = import_test_file(
            &client,
            "test",
            "/nonexistent/data.bulk.json",
            &BulkOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EsError::Io(_)));
    }

    const FIXTURE_DOCS: usize = 5;

    #[tokio::test]
    async fn test_import_fixture() {
        let cluster = MockCluster::start(200, BULK_OK).await;
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/data.bulk.json");

        import_test_file(&cluster.client(), "test", path, &BulkOptions::default())
            .await
            .unwrap();

        let body = cluster.requests()[0].body_text();
        let actions = body.lines().filter(|l| l.starts_with("{\"index\"")).count();
        assert_eq!(actions, FIXTURE_DOCS);
    }
}
