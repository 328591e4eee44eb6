//! In-process stand-in for a cluster, used by the wrapper tests.
//!
//! Every request is recorded and answered with one canned status and body.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;

use super::EsClient;
use crate::config::EsConfig;

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn query_has(&self, pair: &str) -> bool {
        self.query.split('&').any(|p| p == pair)
    }

    pub fn decoded_path(&self) -> String {
        self.path.replace("%2C", ",").replace("%2c", ",")
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    status: StatusCode,
    body: Arc<str>,
}

pub(crate) struct MockCluster {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockCluster {
    /// Serve `body` with `status` for every request.
    pub async fn start(status: u16, body: &str) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            requests: requests.clone(),
            status: StatusCode::from_u16(status).unwrap(),
            body: Arc::from(body),
        };

        let app = Router::new().fallback(record).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, requests }
    }

    pub fn client(&self) -> EsClient {
        EsClient::new(&EsConfig::new(format!("http://{}", self.addr))).unwrap()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// A client pointed at a port nothing listens on.
    pub async fn unreachable_client() -> EsClient {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        EsClient::new(&EsConfig::new(format!("http://{}", addr))).unwrap()
    }
}

async fn record(State(state): State<MockState>, method: Method, uri: Uri, body: Bytes) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        body: body.to_vec(),
    });

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.to_string(),
    )
        .into_response()
}
