//! Per-request context derivation and record enrichment.
//!
//! The context is derived exactly once per request from ambient signals
//! (edge geo headers and the user agent) and then merged into every record
//! of the batch. Missing or unrecognized signals degrade to empty strings;
//! derivation never fails.

use hyper::header::{HeaderMap, USER_AGENT};
use serde::{Deserialize, Serialize};
use woothee::parser::Parser;

use crate::protocol::{LegacyRecord, V1Record};

/// Geo headers set by the network edge in front of the gateway.
const COUNTRY_HEADER: &str = "cf-ipcountry";
const CITY_HEADER: &str = "cf-ipcity";
const REGION_CODE_HEADER: &str = "cf-region-code";
const TIMEZONE_HEADER: &str = "cf-timezone";
const CONTINENT_HEADER: &str = "cf-ipcontinent";

/// Ambient request context merged into every record of a batch.
///
/// Derived once per request; the fields never vary between records of the
/// same batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentContext {
    pub browser: String,
    pub os: String,
    pub country: String,
    pub city: String,
    pub continent: String,
    pub region_code: String,
    pub timezone: String,
}

impl EnrichmentContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };

        let user_agent = headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let (browser, os) = parse_user_agent(user_agent);

        Self {
            browser,
            os,
            country: header(COUNTRY_HEADER),
            city: header(CITY_HEADER),
            continent: header(CONTINENT_HEADER),
            region_code: header(REGION_CODE_HEADER),
            timezone: header(TIMEZONE_HEADER),
        }
    }
}

/// Maps a user agent to (browser, os) via signature matching.
///
/// Woothee reports unmatched families as the "UNKNOWN" sentinel; both that
/// and a failed parse degrade to empty strings.
fn parse_user_agent(user_agent: &str) -> (String, String) {
    if user_agent.trim().is_empty() {
        return (String::new(), String::new());
    }

    match Parser::new().parse(user_agent) {
        Some(result) => (clean_family(result.name), clean_family(result.os)),
        None => (String::new(), String::new()),
    }
}

fn clean_family(family: &str) -> String {
    if family == "UNKNOWN" {
        String::new()
    } else {
        family.to_string()
    }
}

/// One record in the flat output shape shared by both protocol versions.
///
/// The union of the telemetry fields and the enrichment context, plus a
/// normalized `event_name` (the metric's own `name` in the legacy case, the
/// literal discriminator in the v1 case).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedRecord {
    pub event_name: String,
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
    pub browser: String,
    pub os: String,
    pub country: String,
    pub city: String,
    pub continent: String,
    pub region_code: String,
    pub timezone: String,
}

impl EnrichedRecord {
    pub fn from_legacy(record: LegacyRecord, context: &EnrichmentContext) -> Self {
        Self {
            event_name: record.name.clone(),
            dsn: record.dsn,
            name: record.name,
            href: record.href,
            id: record.id,
            speed: record.speed,
            path: record.path,
            rating: record.rating,
            value: record.value,
            screen: record.screen,
            session_id: record.session_id,
            browser: context.browser.clone(),
            os: context.os.clone(),
            country: context.country.clone(),
            city: context.city.clone(),
            continent: context.continent.clone(),
            region_code: context.region_code.clone(),
            timezone: context.timezone.clone(),
        }
    }

    pub fn from_v1(record: V1Record, context: &EnrichmentContext) -> Self {
        Self {
            event_name: record.event_name.as_str().to_string(),
            dsn: record.dsn,
            name: record.data.name,
            href: record.href,
            id: record.data.id,
            speed: record.speed,
            path: record.path,
            rating: record.data.rating,
            value: record.data.value,
            screen: record.screen,
            session_id: record.session_id,
            browser: context.browser.clone(),
            os: context.os.clone(),
            country: context.country.clone(),
            city: context.city.clone(),
            continent: context.continent.clone(),
            region_code: context.region_code.clone(),
            timezone: context.timezone.clone(),
        }
    }
}
