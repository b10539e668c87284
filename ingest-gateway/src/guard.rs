//! Tenant consistency guard for the v1 path.
//!
//! A forwarded batch must address exactly one known application. Batches
//! mixing destinations and batches for unknown DSNs are dropped after the
//! caller has already been acknowledged, so the drop is reported to the
//! observability sink (log + counter) rather than to the caller.

use indexmap::IndexSet;
use registry::{Application, ApplicationStore};

use crate::enrich::EnrichedRecord;
use crate::metrics_defs;

/// Resolves the single tenant a batch may be forwarded for.
///
/// Returns `None` when the batch must be dropped: more than one distinct
/// `dsn`, a `dsn` unknown to the system of record, or a registry failure
/// (treated as absence for forwarding purposes).
pub async fn resolve_tenant(
    records: &[EnrichedRecord],
    store: &dyn ApplicationStore,
) -> Option<Application> {
    let dsns: IndexSet<&str> = records.iter().map(|record| record.dsn.as_str()).collect();

    if dsns.len() > 1 {
        tracing::warn!(
            distinct_dsns = dsns.len(),
            records = records.len(),
            "dropping batch spanning multiple destinations"
        );
        shared::counter!(metrics_defs::BATCHES_DROPPED, "reason" => "mixed_dsn").increment(1);
        return None;
    }

    // Batches are validated non-empty before enrichment.
    let dsn = dsns.first()?;

    match store.get_by_dsn(dsn).await {
        Ok(Some(application)) => Some(application),
        Ok(None) => {
            tracing::warn!(dsn, "dropping batch for unknown application");
            shared::counter!(metrics_defs::BATCHES_DROPPED, "reason" => "unknown_dsn").increment(1);
            None
        }
        Err(error) => {
            tracing::error!(dsn, error = %error, "registry lookup failed, dropping batch");
            shared::counter!(metrics_defs::BATCHES_DROPPED, "reason" => "registry_error")
                .increment(1);
            None
        }
    }
}
