//! Work-order ingestion handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use contracts::{WorkOrderEvent, ACK_MESSAGE};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{error::IngressError, AppState};

/// Acknowledgment body: `{"workrequest": "WO received."}`
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub workrequest: &'static str,
}

impl AckResponse {
    fn received() -> Self {
        Self {
            workrequest: ACK_MESSAGE,
        }
    }
}

/// `POST /workrequest/{id}`
///
/// Parses the body, acknowledges, and schedules the fan-out. The response
/// never depends on what happens downstream.
///
/// # Errors
///
/// Returns 400 when the body is not a JSON object.
#[instrument(
    name = "receive_work_request",
    skip(state, body),
    fields(work_order_id = %id, content_length = body.len())
)]
pub async fn receive_work_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<AckResponse>, IngressError> {
    let event = WorkOrderEvent::from_slice(id, &body).map_err(|e| {
        observability::record_malformed_event();
        warn!(error = %e, "Rejected work order body");
        IngressError::from(e)
    })?;

    let ack = state.dispatcher.accept(event);
    info!(
        work_order_id = %ack.work_order_id,
        delay_ms = ack.delay_ms,
        "Work order acknowledged"
    );

    Ok(Json(AckResponse::received()))
}

/// `GET /workrequest/{id}`, acknowledgment without dispatch
pub async fn work_request_probe(Path(id): Path<String>) -> Json<AckResponse> {
    tracing::debug!(work_order_id = %id, "Work order probe");
    Json(AckResponse::received())
}

/// `OPTIONS /workrequest/{id}`; CORS headers come from the gate middleware
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}
