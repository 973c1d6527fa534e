use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::debug;
use uuid::Uuid;

use atelier_types::api::{Claims, MarkReadResponse, SendMessageRequest, UnreadResponse};
use atelier_types::lifecycle::authorize_message;

use crate::convert;
use crate::error::ApiError;
use crate::requests::{load_participant_request, load_request};
use crate::state::AppState;

const MAX_BODY: usize = 4000;

/// The whole thread, oldest first. No pagination.
pub async fn get_messages(
    State(state): State<AppState>,
    WithRejection(Path(request_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    load_participant_request(&state, request_id, claims.sub).await?;

    let rid = request_id.to_string();
    let rows = state.with_db(move |db| db.get_messages(&rid)).await?;

    Ok(Json(convert::messages(rows)?))
}

/// Append to the thread as the authenticated participant.
pub async fn send_message(
    State(state): State<AppState>,
    WithRejection(Path(request_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<SendMessageRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let body = req.body.trim().to_string();
    if body.is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }
    if body.chars().count() > MAX_BODY {
        return Err(ApiError::bad_request(format!(
            "message must be at most {MAX_BODY} characters"
        )));
    }

    let request = load_request(&state, request_id).await?;
    authorize_message(&request, claims.sub)?;

    let message_id = Uuid::new_v4().to_string();
    let rid = request_id.to_string();
    let sender = claims.sub.to_string();
    let row = state
        .with_db(move |db| db.insert_message(&message_id, &rid, &sender, &body))
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("request no longer accepts messages; reload and retry".into())
        })?;

    let message = convert::message(row)?;
    debug!("Message {} on request {} from {}", message.id, request_id, claims.sub);

    Ok((StatusCode::CREATED, Json(message)))
}

/// Mark what the other party sent on this request as read.
pub async fn mark_read(
    State(state): State<AppState>,
    WithRejection(Path(request_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    load_participant_request(&state, request_id, claims.sub).await?;

    let rid = request_id.to_string();
    let reader = claims.sub.to_string();
    let updated = state
        .with_db(move |db| db.mark_messages_read(&rid, &reader))
        .await?;

    Ok(Json(MarkReadResponse { updated }))
}

/// Unread messages addressed to the caller across all their requests.
/// Recomputed on every call.
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let count = state.with_db(move |db| db.unread_count(&uid)).await?;

    Ok(Json(UnreadResponse { count }))
}
