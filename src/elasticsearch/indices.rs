//! Index deletion and refresh.

use elasticsearch::indices::{IndicesDeleteParts, IndicesRefreshParts};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use super::response::read_json;
use super::EsClient;
use crate::error::{EsError, Result};

#[derive(Deserialize)]
struct Acknowledged {
    #[serde(default)]
    acknowledged: bool,
}

fn index_names<S: AsRef<str>>(indices: &[S]) -> Result<Vec<&str>> {
    if indices.is_empty() {
        return Err(EsError::invalid_argument("at least one index name is required"));
    }
    let names: Vec<&str> = indices.iter().map(|name| name.as_ref()).collect();
    if names.iter().any(|name| name.is_empty()) {
        return Err(EsError::invalid_argument("index name must not be empty"));
    }
    Ok(names)
}

/// Delete the given indices, used to reset state between test runs.
pub async fn clear_test_data<S: AsRef<str>>(client: &EsClient, indices: &[S]) -> Result<()> {
    let names = index_names(indices)?;

    let response = client
        .client()
        .indices()
        .delete(IndicesDeleteParts::Index(&names))
        .send()
        .await
        .map_err(|e| {
            error!("Failed to delete test data: {}", e);
            EsError::Transport(e)
        })?;

    let ack: Acknowledged = read_json(response).await?;
    if !ack.acknowledged {
        warn!("Delete of [{}] was not acknowledged", names.join(","));
    }

    info!("Index: [{}] deleted", names.join(","));
    Ok(())
}

/// Make recently indexed documents in `indices` visible to search.
pub async fn refresh_indices<S: AsRef<str>>(client: &EsClient, indices: &[S]) -> Result<()> {
    let names = index_names(indices)?;

    let response = client
        .client()
        .indices()
        .refresh(IndicesRefreshParts::Index(&names))
        .send()
        .await?;

    let _: Value = read_json(response).await?;
    info!("Index: [{}] refreshed", names.join(","));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elasticsearch::mock::MockCluster;

    #[tokio::test]
    async fn test_clear_test_data() {
        let cluster = MockCluster::start(200, r#"{"acknowledged": true}"#).await;

        clear_test_data(&cluster.client(), &["test", "test-2"])
            .await
            .unwrap();

        let requests = cluster.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "DELETE");
        assert_eq!(requests[0].decoded_path(), "/test,test-2");
    }

    #[tokio::test]
    async fn test_clear_missing_index() {
        let cluster = MockCluster::start(
            404,
            r#"{"error": {"type": "index_not_found_exception", "reason": "no such index [gone]"}, "status": 404}"#,
        )
        .await;

        let err = clear_test_data(&cluster.client(), &[String::from("gone")])
            .await
            .unwrap_err();

        assert!(err.is_index_not_found());
        assert_eq!(err.engine_reason(), Some("no such index [gone]"));
    }

    #[tokio::test]
    async fn test_clear_rejects_empty_names() {
        let cluster = MockCluster::start(200, r#"{"acknowledged": true}"#).await;
        let client = cluster.client();

        let none: [&str; 0] = [];
        assert!(matches!(
            clear_test_data(&client, &none).await,
            Err(EsError::InvalidArgument(_))
        ));
        assert!(matches!(
            clear_test_data(&client, &["test", ""]).await,
            Err(EsError::InvalidArgument(_))
        ));
        assert!(cluster.requests().is_empty());
    }

    #[tokio::test]
    async fn test_clear_transport_error_is_returned() {
        let client = MockCluster::unreachable_client().await;
        let err = clear_test_data(&client, &["test"]).await.unwrap_err();
        assert!(matches!(err, EsError::Transport(_)));
    }

    #[tokio::test]
    async fn test_refresh_indices() {
        let cluster = MockCluster::start(
            200,
            r#"{"_shards": {"total": 2, "successful": 1, "failed": 0}}"#,
        )
        .await;

        refresh_indices(&cluster.client(), &["test"]).await.unwrap();

        assert_eq!(cluster.requests()[0].path, "/test/_refresh");
    }
}
