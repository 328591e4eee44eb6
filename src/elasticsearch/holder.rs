//! Process-wide client handle.
//!
//! Library code takes an explicit `&EsClient`; this holder exists for
//! drivers that want one shared client built from the environment.

use std::sync::OnceLock;

use tracing::info;

use super::EsClient;
use crate::error::Result;

static CLIENT: OnceLock<EsClient> = OnceLock::new();

/// Build the shared client from the environment, or return the one already
/// built.
pub fn try_init() -> Result<&'static EsClient> {
    if let Some(client) = CLIENT.get() {
        return Ok(client);
    }

    let client = EsClient::from_env()?;
    info!("Initialized shared Elasticsearch client for {}", client.url());
    Ok(CLIENT.get_or_init(|| client))
}

/// Like [`try_init`], but aborts if the client cannot be built: nothing else
/// can run without it.
pub fn init() -> &'static EsClient {
    match try_init() {
        Ok(client) => client,
        Err(e) => panic!("{}", e),
    }
}

/// The shared client, or `None` before [`init`] has run.
pub fn get_client() -> Option<&'static EsClient> {
    CLIENT.get()
}
