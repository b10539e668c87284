//! Shared test fixtures: a recording mock upstream and stub collaborators.

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::AUTHORIZATION;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioExecutor;
use registry::{Application, ApplicationStore, ClientError};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

use crate::enrich::EnrichedRecord;
use crate::errors::GatewayError;
use crate::forward::AnalyticsSink;

/// One request captured by [`RecordingUpstream`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub body: Bytes,
    pub authorization: Option<String>,
}

/// Mock upstream on an ephemeral port that records every request and
/// answers with a fixed status.
pub struct RecordingUpstream {
    port: u16,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl RecordingUpstream {
    pub async fn start(status: StatusCode) -> Self {
        Self::start_with_body(status, Bytes::from_static(b"{}")).await
    }

    /// Variant answering every request with a fixed body, for collaborators
    /// whose responses the client deserializes.
    pub async fn start_with_body(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let response_body = body.into();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests: Arc<Mutex<Vec<CapturedRequest>>> = Arc::new(Mutex::new(Vec::new()));
        let requests_handle = requests.clone();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = hyper_util::rt::TokioIo::new(stream);
                let requests = requests_handle.clone();
                let response_body = response_body.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                        let requests = requests.clone();
                        let response_body = response_body.clone();
                        async move {
                            let authorization = req
                                .headers()
                                .get(AUTHORIZATION)
                                .and_then(|value| value.to_str().ok())
                                .map(|value| value.to_string());
                            let body = req
                                .into_body()
                                .collect()
                                .await
                                .map(|collected| collected.to_bytes())
                                .unwrap_or_default();

                            requests
                                .lock()
                                .unwrap()
                                .push(CapturedRequest {
                                    body,
                                    authorization,
                                });

                            let mut response = Response::new(Full::new(response_body));
                            *response.status_mut() = status;
                            Ok::<_, Infallible>(response)
                        }
                    });

                    let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service)
                        .await;
                });
            }
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        Self { port, requests }
    }

    pub fn url(&self) -> Url {
        Url::parse(&format!("http://127.0.0.1:{}/ingest", self.port)).unwrap()
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_bodies(&self) -> Vec<Bytes> {
        self.requests()
            .into_iter()
            .map(|request| request.body)
            .collect()
    }
}

/// In-memory stand-in for the system of record.
pub struct StubApplicationStore {
    known_dsn: Option<String>,
    fail: bool,
    lookups: AtomicUsize,
}

impl StubApplicationStore {
    pub fn with_application(dsn: &str) -> Self {
        Self {
            known_dsn: Some(dsn.to_string()),
            fail: false,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self {
            known_dsn: None,
            fail: false,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            known_dsn: None,
            fail: true,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApplicationStore for StubApplicationStore {
    async fn get_by_dsn(&self, dsn: &str) -> Result<Option<Application>, ClientError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(ClientError::UnexpectedStatus(
                StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }

        Ok(self
            .known_dsn
            .as_deref()
            .filter(|known| *known == dsn)
            .map(|known| Application {
                id: 1,
                dsn: known.to_string(),
                name: "stub".to_string(),
            }))
    }
}

/// Recording analytics sink for asserting ingestion calls.
pub struct RecordingSink {
    batches: Mutex<Vec<Vec<EnrichedRecord>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn batches(&self) -> Vec<Vec<EnrichedRecord>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalyticsSink for RecordingSink {
    async fn ingest_batch(&self, records: &[EnrichedRecord]) -> Result<(), GatewayError> {
        self.batches.lock().unwrap().push(records.to_vec());
        Ok(())
    }
}
