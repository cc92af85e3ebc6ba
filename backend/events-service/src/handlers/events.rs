use crate::error::{AppError, Result};
use crate::models::EventType;
use crate::services::normalize;
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde::Serialize;
use tracing::{debug, error, warn};

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
}

/// Ingest one event of `event_type`
///
/// Exactly one append attempt per well-formed body. The append runs inside
/// the request future, so a client disconnect abandons it.
pub async fn ingest(
    event_type: EventType,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let event = normalize(&body, event_type, state.clock.as_ref()).map_err(|e| {
        warn!(event_type = %event_type, error = %e, "Rejected malformed event");
        AppError::from(e)
    })?;

    let payload = event.to_bytes().map_err(|e| {
        error!(event_type = %event_type, error = %e, "Failed to serialize event");
        AppError::Internal(e.to_string())
    })?;

    state
        .log
        .append(&state.topic, &payload)
        .await
        .map_err(|e| {
            error!(
                topic = %state.topic,
                event_type = %event_type,
                error = %e,
                "kafka write failed"
            );
            AppError::from(e)
        })?;

    debug!(
        topic = %state.topic,
        event_type = %event_type,
        bytes = payload.len(),
        "Event appended"
    );

    Ok(HttpResponse::Created().json(IngestResponse { status: "success" }))
}
