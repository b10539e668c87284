//! Outbound delivery to the analytics backend.
//!
//! Two delivery strategies share one HTTP client shape:
//!
//! - the legacy path fans out one call per enriched record and waits only
//!   for the whole set to settle, ignoring individual outcomes;
//! - the v1 path resolves the batch tenant first and then delivers the
//!   whole batch in a single ingestion call.
//!
//! Neither strategy retries or inspects response bodies. Both run inside a
//! background task, after the caller has been acknowledged, so failures are
//! reported to the observability sink only.

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Request, StatusCode};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use registry::ApplicationStore;
use tokio::task::JoinSet;
use url::Url;

use crate::enrich::EnrichedRecord;
use crate::errors::GatewayError;
use crate::{guard, metrics_defs};

/// Per-record fan-out delivery for the legacy path.
pub struct Forwarder {
    client: Client<HttpConnector, Full<Bytes>>,
    endpoint: Url,
}

impl Forwarder {
    pub fn new(endpoint: Url) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, endpoint }
    }

    /// Issues one delivery call per record, all concurrently, and waits for
    /// the whole set to settle. Per-call outcomes are not surfaced beyond a
    /// failure counter; ordering between calls is not guaranteed.
    pub async fn fan_out(&self, records: Vec<EnrichedRecord>) {
        let total = records.len();
        let mut join_set = JoinSet::new();

        for record in records {
            let client = self.client.clone();
            let endpoint = self.endpoint.clone();

            join_set.spawn(async move {
                let body = match serde_json::to_vec(&record) {
                    Ok(body) => Bytes::from(body),
                    Err(_) => return false,
                };
                post_bytes(&client, &endpoint, body, "application/json", None)
                    .await
                    .is_ok()
            });
        }

        let mut failed = 0usize;
        while let Some(join_result) = join_set.join_next().await {
            match join_result {
                Ok(true) => {}
                Ok(false) => failed += 1,
                Err(e) => {
                    tracing::error!("delivery task panicked: {e}");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            shared::counter!(metrics_defs::FORWARD_FAILED, "path" => "legacy")
                .increment(failed as u64);
        }
        shared::counter!(metrics_defs::RECORDS_FORWARDED, "path" => "legacy")
            .increment((total - failed) as u64);
        tracing::debug!(records = total, "inserted");
    }
}

/// Batch ingestion seam for the v1 path.
///
/// Kept narrow so a stricter variant (bounded retry, failure counting) can
/// be substituted without touching validation or enrichment.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn ingest_batch(&self, records: &[EnrichedRecord]) -> Result<(), GatewayError>;
}

/// Analytics backend client delivering one newline-delimited JSON call per
/// batch, authenticated with a bearer token.
pub struct HttpAnalyticsSink {
    client: Client<HttpConnector, Full<Bytes>>,
    url: Url,
    token: String,
}

impl HttpAnalyticsSink {
    pub fn new(url: Url, token: String) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, url, token }
    }
}

#[async_trait]
impl AnalyticsSink for HttpAnalyticsSink {
    async fn ingest_batch(&self, records: &[EnrichedRecord]) -> Result<(), GatewayError> {
        let mut body = Vec::new();
        for record in records {
            serde_json::to_writer(&mut body, record)
                .map_err(|e| GatewayError::InternalError(format!("serialize record: {e}")))?;
            body.push(b'\n');
        }

        post_bytes(
            &self.client,
            &self.url,
            Bytes::from(body),
            "application/x-ndjson",
            Some(&self.token),
        )
        .await?;
        Ok(())
    }
}

/// Resolves the batch tenant and delivers the batch in one ingestion call.
///
/// Runs inside the background task. Guard drops and delivery failures end
/// here; the caller was acknowledged before this started.
pub async fn forward_v1_batch(
    records: Vec<EnrichedRecord>,
    store: &dyn ApplicationStore,
    sink: &dyn AnalyticsSink,
) {
    let Some(application) = guard::resolve_tenant(&records, store).await else {
        return;
    };

    match sink.ingest_batch(&records).await {
        Ok(()) => {
            shared::counter!(metrics_defs::RECORDS_FORWARDED, "path" => "v1")
                .increment(records.len() as u64);
            tracing::debug!(
                application = application.id,
                records = records.len(),
                "inserted"
            );
        }
        Err(error) => {
            shared::counter!(metrics_defs::FORWARD_FAILED, "path" => "v1").increment(1);
            tracing::error!(
                application = application.id,
                error = %error,
                "batch ingestion failed"
            );
        }
    }
}

/// Sends a complete body to a single upstream and drains the response.
///
/// The response body is collected only to release the connection; it is
/// never inspected. Not suitable for streaming upstreams.
async fn post_bytes(
    client: &Client<HttpConnector, Full<Bytes>>,
    url: &Url,
    body: Bytes,
    content_type: &str,
    bearer_token: Option<&str>,
) -> Result<StatusCode, GatewayError> {
    let upstream_identifier = url.host_str().unwrap_or(url.as_str()).to_string();

    let mut req_builder = Request::builder()
        .method(hyper::Method::POST)
        .uri(url.as_str())
        .header(CONTENT_TYPE, content_type);

    if let Some(token) = bearer_token {
        req_builder = req_builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = req_builder
        .body(Full::new(body))
        .map_err(|e| GatewayError::InternalError(format!("Failed to build request: {e}")))?;

    let response = client.request(request).await.map_err(|e| {
        GatewayError::UpstreamRequestFailed(upstream_identifier.clone(), e.to_string())
    })?;

    let status = response.status();
    let _ = response.into_body().collect().await;

    if !status.is_success() {
        return Err(GatewayError::UpstreamRejected(upstream_identifier, status));
    }

    Ok(status)
}
