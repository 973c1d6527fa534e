use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};
use uuid::Uuid;

use atelier_db::models::NewRequest;
use atelier_types::api::{
    Claims, CreateRequestRequest, RequestDetailResponse, RequestResponse, UpdateStatusRequest,
};
use atelier_types::lifecycle::{Party, authorize_transition, available_actions};
use atelier_types::{Request, Role};

use crate::convert;
use crate::error::ApiError;
use crate::state::AppState;
use crate::works::load_visible_work;

const MAX_TITLE: usize = 120;

/// Create a pending request together with its opening message. Either both
/// rows are stored or neither is.
pub async fn create_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<CreateRequestRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != Role::Client {
        return Err(ApiError::Forbidden);
    }

    let title = req.title.trim().to_string();
    let message = req.message.trim().to_string();
    if title.is_empty() || title.chars().count() > MAX_TITLE {
        return Err(ApiError::bad_request(format!(
            "title must be 1-{MAX_TITLE} characters"
        )));
    }
    if message.is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }

    let cid = req.creator_id.to_string();
    let creator = state
        .with_db(move |db| db.get_profile(&cid))
        .await?
        .ok_or(ApiError::NotFound)?;
    if creator.role != Role::Creator.as_str() {
        return Err(ApiError::bad_request("requests can only be sent to creators"));
    }

    if let Some(work_id) = req.work_id {
        let work = load_visible_work(&state, work_id, claims.sub).await?;
        if work.creator_id != req.creator_id {
            return Err(ApiError::bad_request("work does not belong to this creator"));
        }
    }

    let request_id = Uuid::new_v4().to_string();
    let message_id = Uuid::new_v4().to_string();
    let creator_id = req.creator_id.to_string();
    let client_id = claims.sub.to_string();
    let work_id = req.work_id.map(|id| id.to_string());

    let (request_row, message_row) = state
        .with_db(move |db| {
            db.create_request_with_message(&NewRequest {
                id: &request_id,
                creator_id: &creator_id,
                client_id: &client_id,
                work_id: work_id.as_deref(),
                title: &title,
                message: &message,
                message_id: &message_id,
            })
        })
        .await?;

    let request = convert::request(request_row)?;
    let opening = convert::message(message_row)?;
    info!(
        "Client {} opened request {} with creator {}",
        request.client_id, request.id, request.creator_id
    );

    let actions = available_actions(&request, claims.sub);
    Ok((
        StatusCode::CREATED,
        Json(RequestDetailResponse {
            request,
            messages: vec![opening],
            actions,
        }),
    ))
}

/// Requests where the caller is either party, most recently updated first.
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let rows = state.with_db(move |db| db.list_requests_for(&uid)).await?;

    let requests = rows
        .into_iter()
        .map(|row| -> Result<_, ApiError> {
            let request = convert::request(row)?;
            let actions = available_actions(&request, claims.sub);
            Ok(RequestResponse { request, actions })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(Json(requests))
}

pub async fn get_request(
    State(state): State<AppState>,
    WithRejection(Path(request_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let request = load_participant_request(&state, request_id, claims.sub).await?;

    let rid = request_id.to_string();
    let rows = state.with_db(move |db| db.get_messages(&rid)).await?;
    let messages = convert::messages(rows)?;

    let actions = available_actions(&request, claims.sub);
    Ok(Json(RequestDetailResponse {
        request,
        messages,
        actions,
    }))
}

/// Move a request along its lifecycle. The response carries the row as
/// stored after the write, not a locally patched copy.
pub async fn update_status(
    State(state): State<AppState>,
    WithRejection(Path(request_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateStatusRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let request = load_request(&state, request_id).await?;
    authorize_transition(&request, claims.sub, req.status)?;

    let rid = request_id.to_string();
    let expected = request.status;
    let next = req.status;
    let row = state
        .with_db(move |db| db.update_request_status(&rid, expected.as_str(), next.as_str()))
        .await?;

    let Some(row) = row else {
        warn!(
            "Request {} changed while moving {} -> {}",
            request_id, expected, next
        );
        return Err(ApiError::Conflict(
            "request was modified concurrently; reload and retry".into(),
        ));
    };

    let request = convert::request(row)?;
    info!(
        "Request {} moved {} -> {} by {}",
        request.id, expected, request.status, claims.sub
    );

    let actions = available_actions(&request, claims.sub);
    Ok(Json(RequestResponse { request, actions }))
}

pub(crate) async fn load_request(state: &AppState, request_id: Uuid) -> Result<Request, ApiError> {
    let rid = request_id.to_string();
    let row = state
        .with_db(move |db| db.get_request(&rid))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(convert::request(row)?)
}

/// Load a request the caller takes part in; outsiders get `Forbidden` and
/// no data.
pub(crate) async fn load_participant_request(
    state: &AppState,
    request_id: Uuid,
    user_id: Uuid,
) -> Result<Request, ApiError> {
    let request = load_request(state, request_id).await?;
    if !Party::of(&request, user_id).is_participant() {
        return Err(ApiError::Forbidden);
    }
    Ok(request)
}
