use std::sync::Arc;
use std::time::Instant;

use axum::extract::{RawQuery, State};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::StatusCode;
use http::header::CONTENT_TYPE;
use tracing::{info, warn};

use crate::core::CoreState;
use crate::hostname::is_valid_hostname;
use crate::metrics;
use crate::payload::IngestPayload;
use crate::session::{IngestSession, Outcome};

/// Plain-text reply bodies. Every reply is sent with status 200; callers tell
/// rejections apart by the body only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestReply {
    InvalidHostname,
    InvalidInput,
    InvalidDataType,
    Ok,
}

impl IngestReply {
    pub fn as_str(self) -> &'static str {
        match self {
            IngestReply::InvalidHostname => "Invalid hostname",
            IngestReply::InvalidInput => "Invalid input",
            IngestReply::InvalidDataType => "Invalid data type",
            IngestReply::Ok => "OK",
        }
    }

    fn label(self) -> &'static str {
        match self {
            IngestReply::InvalidHostname => "invalid_hostname",
            IngestReply::InvalidInput => "invalid_input",
            IngestReply::InvalidDataType => "invalid_data_type",
            IngestReply::Ok => "ok",
        }
    }
}

impl IntoResponse for IngestReply {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain")],
            self.as_str(),
        )
            .into_response()
    }
}

/// Event counts for one request, logged when the request ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub accepted: usize,
    pub duplicates: usize,
    pub failed: usize,
}

pub async fn ingest_handler(
    State(state): State<Arc<CoreState>>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> IngestReply {
    let started_at = Instant::now();
    let reply = ingest(&state, query.as_deref(), &body).await;
    metrics::record_request(reply.label());
    metrics::record_request_latency(started_at.elapsed());
    reply
}

/// Request-level pipeline: hostname gate, body parse, shape dispatch, then
/// per-event processing. Parse and validation failures end the request;
/// per-event failures are isolated to their event.
pub async fn ingest(state: &CoreState, query: Option<&str>, body: &[u8]) -> IngestReply {
    let Some(server) = server_from_query(query) else {
        return IngestReply::InvalidHostname;
    };

    let session = IngestSession::new(
        server,
        state.cache.clone(),
        state.store.clone(),
        state.event_timeout,
    );

    let payload = match IngestPayload::parse(body) {
        Ok(payload) => payload,
        Err(err) => {
            info!(
                event = "pointdata_rejected",
                server = %session.server(),
                reason = "invalid_input",
                error = %err
            );
            return IngestReply::InvalidInput;
        }
    };

    let events = match payload {
        IngestPayload::Batch(events) => events,
        IngestPayload::Single(event) => vec![event],
        IngestPayload::Invalid => {
            info!(
                event = "pointdata_rejected",
                server = %session.server(),
                reason = "invalid_data_type"
            );
            return IngestReply::InvalidDataType;
        }
    };

    let mut summary = IngestSummary::default();
    for event in events {
        match session.process(event).await {
            Ok(Outcome::Accepted) => summary.accepted += 1,
            Ok(Outcome::Duplicate) => summary.duplicates += 1,
            Err(err) => {
                summary.failed += 1;
                warn!(
                    event = "pointdata_event_failed",
                    server = %session.server(),
                    kind = err.kind(),
                    error = %err
                );
            }
        }
    }

    info!(
        event = "pointdata_ingested",
        server = %session.server(),
        accepted = summary.accepted,
        duplicates = summary.duplicates,
        failed = summary.failed
    );
    IngestReply::Ok
}

/// Last valid `server=` value in the raw query string. Items that are not a
/// single `key=value` pair are skipped and values are not percent-decoded, so
/// a later invalid `server` does not override an earlier valid one.
pub fn server_from_query(query: Option<&str>) -> Option<String> {
    query?
        .split('&')
        .filter_map(|item| {
            let mut parts = item.split('=');
            match (parts.next(), parts.next(), parts.next()) {
                (Some("server"), Some(value), None) => Some(value),
                _ => None,
            }
        })
        .rfind(|value| is_valid_hostname(value))
        .map(str::to_string)
}
