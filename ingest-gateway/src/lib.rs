//! Edge gateway for client-side web-vitals telemetry.
//!
//! Accepts batches of performance metric samples over HTTP, validates their
//! shape, enriches every record with request-derived context, and forwards
//! the enriched batch to the analytics backend from a detached background
//! task. The caller is acknowledged as soon as the batch is validated and
//! scheduled; forwarding outcomes never reach the caller.
//!
//! Two wire versions are accepted:
//! - `POST /` takes the legacy flat shape and fans out one delivery call
//!   per record;
//! - `POST /v1` takes the nested shape, resolves the batch's single tenant
//!   against the application registry, and delivers one batch call.

pub mod config;
pub mod enrich;
pub mod errors;
pub mod forward;
pub mod guard;
pub mod metrics_defs;
pub mod protocol;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testutils;

use http_body_util::{BodyExt, combinators::BoxBody};
use hyper::body::{Body, Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use shared::http::{full_body, make_error_response, make_json_response, run_http_service};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::enrich::{EnrichedRecord, EnrichmentContext};
use crate::errors::GatewayError;
use crate::forward::{Forwarder, HttpAnalyticsSink, forward_v1_batch};
use crate::protocol::{parse_legacy_batch, parse_v1_batch};
use crate::scheduler::BackgroundTasks;

const GREETING: &str = "Hello from vitals-edge!\n";

/// Starts the gateway and serves until the listener fails.
pub async fn run(config: Config) -> Result<(), GatewayError> {
    config.validate()?;

    let listener = config.listener.clone();
    let background = BackgroundTasks::new();
    let gateway = Arc::new(Gateway::new(config, background.clone()));

    tracing::info!(
        host = %listener.host,
        port = listener.port,
        "starting web-vitals gateway"
    );

    let service = GatewayService {
        gateway: gateway.clone(),
    };
    let result = run_http_service(&listener.host, listener.port, service).await;

    // The listener is gone; give in-flight forwarding tasks a chance to settle.
    background.close();
    background.wait().await;

    result
}

struct GatewayService {
    gateway: Arc<Gateway>,
}

impl Service<Request<Incoming>> for GatewayService {
    type Response = Response<BoxBody<Bytes, GatewayError>>;
    type Error = GatewayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let gateway = self.gateway.clone();
        Box::pin(async move { gateway.handle(req).await })
    }
}

/// The request pipeline: validation, enrichment, tenant guard, forwarding.
pub struct Gateway {
    config: Config,
    background: BackgroundTasks,
}

impl Gateway {
    /// The background capability is handed in by the hosting boundary, which
    /// stays responsible for draining it once the listener stops.
    pub fn new(config: Config, background: BackgroundTasks) -> Self {
        Self { config, background }
    }

    pub fn background(&self) -> &BackgroundTasks {
        &self.background
    }

    pub async fn handle<B>(
        &self,
        request: Request<B>,
    ) -> Result<Response<BoxBody<Bytes, GatewayError>>, GatewayError>
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: std::error::Error + Send + Sync + 'static,
    {
        let started = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let (endpoint, result) = match (method, path.as_str()) {
            (Method::GET, "/") => ("health", Ok(greeting_response())),
            (Method::POST, "/") => ("legacy", self.handle_legacy(request).await),
            (Method::POST, "/v1") => ("v1", self.handle_v1(request).await),
            _ => ("unmatched", Ok(not_found_response())),
        };

        shared::histogram!(metrics_defs::REQUEST_DURATION, "endpoint" => endpoint)
            .record(started.elapsed().as_secs_f64());

        match result {
            Ok(response) => Ok(response),
            // Malformed input is the only caller-visible error class.
            Err(error) if error.is_validation() => {
                tracing::debug!(endpoint, error = %error, "rejecting malformed batch");
                Ok(make_error_response(
                    StatusCode::BAD_REQUEST,
                    &error.to_string(),
                ))
            }
            Err(error) => Err(error),
        }
    }

    async fn handle_legacy<B>(
        &self,
        request: Request<B>,
    ) -> Result<Response<BoxBody<Bytes, GatewayError>>, GatewayError>
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: std::error::Error + Send + Sync + 'static,
    {
        let (parts, body) = request.into_parts();
        let body_bytes = collect_body(body).await?;

        let records = parse_legacy_batch(&body_bytes)?;
        let context = EnrichmentContext::from_headers(&parts.headers);
        let payload: Vec<EnrichedRecord> = records
            .into_iter()
            .map(|record| EnrichedRecord::from_legacy(record, &context))
            .collect();

        shared::counter!(metrics_defs::BATCHES_ACCEPTED, "version" => "legacy").increment(1);

        // Built per request; request isolation over connection reuse.
        let forwarder = Forwarder::new(self.config.ingest.endpoint.clone());
        self.background.spawn(async move {
            forwarder.fan_out(payload).await;
        });

        Ok(ok_response())
    }

    async fn handle_v1<B>(
        &self,
        request: Request<B>,
    ) -> Result<Response<BoxBody<Bytes, GatewayError>>, GatewayError>
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: std::error::Error + Send + Sync + 'static,
    {
        let (parts, body) = request.into_parts();
        let body_bytes = collect_body(body).await?;

        let records = parse_v1_batch(&body_bytes)?;
        let context = EnrichmentContext::from_headers(&parts.headers);
        let payload: Vec<EnrichedRecord> = records
            .into_iter()
            .map(|record| EnrichedRecord::from_v1(record, &context))
            .collect();

        shared::counter!(metrics_defs::BATCHES_ACCEPTED, "version" => "v1").increment(1);

        let store = registry::HttpClient::new(
            self.config.registry.url.clone(),
            self.config.registry.auth_token.clone(),
        );
        let sink = HttpAnalyticsSink::new(
            self.config.analytics.url.clone(),
            self.config.analytics.token.clone(),
        );
        self.background.spawn(async move {
            forward_v1_batch(payload, &store, &sink).await;
        });

        Ok(ok_response())
    }
}

async fn collect_body<B>(body: B) -> Result<Bytes, GatewayError>
where
    B: Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    body.collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| GatewayError::RequestBodyError(e.to_string()))
}

fn greeting_response() -> Response<BoxBody<Bytes, GatewayError>> {
    Response::new(full_body(GREETING))
}

fn ok_response() -> Response<BoxBody<Bytes, GatewayError>> {
    make_json_response(StatusCode::OK, &serde_json::json!({ "status": "ok" }))
}

fn not_found_response() -> Response<BoxBody<Bytes, GatewayError>> {
    make_error_response(StatusCode::NOT_FOUND, "no route matched")
}
