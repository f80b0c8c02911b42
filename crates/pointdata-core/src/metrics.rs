//! Counters for the ingest path.
//!
//! Uses the `metrics` facade; the host process picks the exporter. Without an
//! installed recorder every call is a no-op.
//!
//! Names carry the `pointdata_update_` prefix, `_total` for counters and
//! `_seconds` for durations.

use std::time::Duration;

use metrics::{counter, histogram};

/// One inbound request, tagged with how it ended.
pub fn record_request(reply: &str) {
    counter!(
        "pointdata_update_requests_total",
        "reply" => reply.to_string()
    )
    .increment(1);
}

pub fn record_request_latency(duration: Duration) {
    histogram!("pointdata_update_request_seconds").record(duration.as_secs_f64());
}

/// Per-event outcome: `accepted`, `duplicate`, `store_error`, `cache_error`
/// or `timeout`.
pub fn record_event(status: &'static str) {
    counter!("pointdata_update_events_total", "status" => status).increment(1);
}

pub fn record_event_latency(duration: Duration) {
    histogram!("pointdata_update_event_seconds").record(duration.as_secs_f64());
}

pub fn record_alias_resolved() {
    counter!("pointdata_update_alias_resolved_total").increment(1);
}

pub fn record_ip_enqueued() {
    counter!("pointdata_update_ip_enqueued_total").increment(1);
}
