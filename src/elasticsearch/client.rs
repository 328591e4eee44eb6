//! Elasticsearch client wrapper.

use elasticsearch::{
    auth::Credentials,
    cert::CertificateValidation,
    cluster::ClusterHealthParts,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    CountParts, Elasticsearch,
};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::response::read_json;
use crate::config::EsConfig;
use crate::error::{EsError, Result};

/// Elasticsearch client wrapper with connection configuration.
///
/// Cloning is cheap; clones share the same connection pool.
#[derive(Clone)]
pub struct EsClient {
    client: Elasticsearch,
    url: Url,
}

impl std::fmt::Debug for EsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EsClient").field("url", &self.url.as_str()).finish()
    }
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

impl EsClient {
    /// Create a new Elasticsearch client. No request is made.
    pub fn new(config: &EsConfig) -> Result<Self> {
        let url = config
            .parsed_url()
            .map_err(|e| EsError::construction(e.to_string()))?;
        let conn_pool = SingleNodeConnectionPool::new(url.clone());
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();

        if let Some((username, password)) = config.basic_auth() {
            builder = builder.auth(Credentials::Basic(username, password));
        }
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if config.insecure {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        let transport = builder
            .build()
            .map_err(|e| EsError::construction(e.to_string()))?;

        debug!("Created Elasticsearch client for {}", url);

        Ok(Self {
            client: Elasticsearch::new(transport),
            url,
        })
    }

    /// Create a client from `ELASTICSEARCH_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let config = EsConfig::from_env().map_err(|e| EsError::construction(e.to_string()))?;
        Self::new(&config)
    }

    /// Get the underlying Elasticsearch client
    pub fn client(&self) -> &Elasticsearch {
        &self.client
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Check if cluster is healthy
    pub async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await?;

        let healthy = response.status_code().is_success();
        info!("Cluster health check at {}: {}", self.url, healthy);
        Ok(healthy)
    }

    /// Get document count in index
    pub async fn doc_count(&self, index: &str) -> Result<u64> {
        let response = self
            .client
            .count(CountParts::Index(&[index]))
            .send()
            .await?;

        let body: CountResponse = read_json(response).await?;
        Ok(body.count)
    }
}
