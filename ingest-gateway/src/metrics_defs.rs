use shared::metrics_defs::{MetricDef, MetricType};

pub const BATCHES_ACCEPTED: MetricDef = MetricDef {
    name: "batches.accepted",
    metric_type: MetricType::Counter,
    description: "Well-formed batches acknowledged to callers. Tagged with version.",
};

pub const BATCHES_DROPPED: MetricDef = MetricDef {
    name: "batches.dropped",
    metric_type: MetricType::Counter,
    description: "v1 batches dropped before forwarding. Tagged with reason.",
};

pub const RECORDS_FORWARDED: MetricDef = MetricDef {
    name: "records.forwarded",
    metric_type: MetricType::Counter,
    description: "Enriched records handed to the analytics backend. Tagged with path.",
};

pub const FORWARD_FAILED: MetricDef = MetricDef {
    name: "forward.failed",
    metric_type: MetricType::Counter,
    description: "Delivery calls that failed to settle successfully. Tagged with path.",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Synchronous request duration in seconds. Tagged with endpoint.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    BATCHES_ACCEPTED,
    BATCHES_DROPPED,
    RECORDS_FORWARDED,
    FORWARD_FAILED,
    REQUEST_DURATION,
];
