//! Wire types for the two telemetry batch versions.
//!
//! Both versions carry the same semantic content: one performance metric
//! sample per page view, batched into a JSON array. The legacy shape is
//! flat; the v1 shape nests the metric fields under `data` and carries a
//! literal `event_name` discriminator.
//!
//! # Legacy element
//! ```json
//! {"dsn": "d1", "name": "CLS", "href": "https://x.io", "id": "1",
//!  "speed": "4g", "path": "/", "value": 0.02, "screen": "1920x1080",
//!  "session_id": "s1"}
//! ```
//!
//! # v1 element
//! ```json
//! {"event_name": "web-vitals", "dsn": "d1", "href": "https://x.io",
//!  "speed": "4g", "path": "/", "screen": "1920x1080", "session_id": "s1",
//!  "data": {"name": "CLS", "value": 0.02, "id": "1"}}
//! ```

use crate::errors::GatewayError;
use hyper::body::Bytes;
use serde::{Deserialize, Serialize};

/// One performance metric sample in the legacy flat shape.
///
/// Unknown extra fields are ignored; missing required fields or a
/// non-numeric `value` reject the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyRecord {
    pub dsn: String,
    pub name: String,
    pub href: String,
    pub id: String,
    pub speed: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    pub value: f64,
    pub screen: String,
    pub session_id: String,
}

/// Literal discriminator carried by every v1 element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventName {
    #[serde(rename = "web-vitals")]
    WebVitals,
}

impl EventName {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventName::WebVitals => "web-vitals",
        }
    }
}

/// Metric fields nested under `data` in the v1 shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    pub value: f64,
    pub id: String,
}

/// One performance metric sample in the versioned nested shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct V1Record {
    pub event_name: EventName,
    pub dsn: String,
    pub href: String,
    pub speed: String,
    pub path: String,
    pub screen: String,
    pub session_id: String,
    pub data: MetricData,
}

/// Parses a legacy batch, preserving array order (it is the forwarding order).
pub fn parse_legacy_batch(bytes: &Bytes) -> Result<Vec<LegacyRecord>, GatewayError> {
    parse_batch(bytes)
}

/// Parses a v1 batch, preserving array order.
pub fn parse_v1_batch(bytes: &Bytes) -> Result<Vec<V1Record>, GatewayError> {
    parse_batch(bytes)
}

fn parse_batch<T: serde::de::DeserializeOwned>(bytes: &Bytes) -> Result<Vec<T>, GatewayError> {
    let records: Vec<T> =
        serde_json::from_slice(bytes).map_err(|e| GatewayError::InvalidBatch(e.to_string()))?;

    if records.is_empty() {
        return Err(GatewayError::EmptyBatch);
    }

    Ok(records)
}
