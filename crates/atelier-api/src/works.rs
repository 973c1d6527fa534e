use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use atelier_db::models::NewWork;
use atelier_types::api::{Claims, CreateWorkRequest, LikeResponse, WorkResponse};
use atelier_types::{Role, Work};

use crate::convert;
use crate::error::ApiError;
use crate::state::{AppState, AppStateInner};
use crate::storage::{ImageStore, public_url};

const MAX_TAGS: usize = 16;

#[derive(Debug, Deserialize)]
pub struct WorkQuery {
    pub tag: Option<String>,
    pub creator_id: Option<Uuid>,
}

/// Trimmed, lowercased, de-duplicated; blanks dropped. Order of first
/// appearance is kept.
pub fn normalize_tags(raw: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

pub async fn create_work(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<CreateWorkRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != Role::Creator {
        return Err(ApiError::Forbidden);
    }

    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }
    if let Some(path) = &req.image_path {
        if !ImageStore::is_valid_name(path) {
            return Err(ApiError::bad_request("unknown image path"));
        }
    }
    let tags = normalize_tags(&req.tags);
    if tags.len() > MAX_TAGS {
        return Err(ApiError::bad_request(format!("at most {MAX_TAGS} tags")));
    }

    let work_id = Uuid::new_v4().to_string();
    let creator_id = claims.sub.to_string();
    let description = req
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    let image_path = req.image_path;
    let is_public = req.is_public;

    let row = state
        .with_db(move |db| {
            db.insert_work(&NewWork {
                id: &work_id,
                creator_id: &creator_id,
                title: &title,
                description: description.as_deref(),
                image_path: image_path.as_deref(),
                tags: &tags,
                is_public,
            })
        })
        .await?;

    let work = convert::work(row)?;
    info!("Creator {} posted work {}", claims.sub, work.id);

    Ok((StatusCode::CREATED, Json(respond(&state, work, 0, false))))
}

pub async fn list_works(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<WorkQuery>, ApiError>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = claims.sub.to_string();
    let creator = query.creator_id.map(|id| id.to_string());
    let tag = query
        .tag
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());

    let rows = state
        .with_db(move |db| {
            let works = db.list_works(&viewer, creator.as_deref(), tag.as_deref())?;
            works
                .into_iter()
                .map(|row| -> anyhow::Result<_> {
                    let (count, liked) = db.like_summary(&row.id, &viewer)?;
                    Ok((row, count, liked))
                })
                .collect::<anyhow::Result<Vec<_>>>()
        })
        .await?;

    let works = rows
        .into_iter()
        .map(|(row, count, liked)| -> Result<_, ApiError> {
            Ok(respond(&state, convert::work(row)?, count, liked))
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(Json(works))
}

pub async fn get_work(
    State(state): State<AppState>,
    WithRejection(Path(work_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let work = load_visible_work(&state, work_id, claims.sub).await?;

    let wid = work_id.to_string();
    let uid = claims.sub.to_string();
    let (count, liked) = state.with_db(move |db| db.like_summary(&wid, &uid)).await?;

    Ok(Json(respond(&state, work, count, liked)))
}

/// Flip `is_public`; owner only. Returns the stored work.
pub async fn toggle_visibility(
    State(state): State<AppState>,
    WithRejection(Path(work_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let work = load_work(&state, work_id).await?;
    if work.creator_id != claims.sub {
        return Err(ApiError::Forbidden);
    }

    let wid = work_id.to_string();
    let row = state
        .with_db(move |db| db.toggle_work_visibility(&wid))
        .await?
        .ok_or(ApiError::NotFound)?;
    let work = convert::work(row)?;
    info!("Work {} is now {}", work.id, if work.is_public { "public" } else { "private" });

    let wid = work_id.to_string();
    let uid = claims.sub.to_string();
    let (count, liked) = state.with_db(move |db| db.like_summary(&wid, &uid)).await?;

    Ok(Json(respond(&state, work, count, liked)))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    WithRejection(Path(work_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    load_visible_work(&state, work_id, claims.sub).await?;

    let wid = work_id.to_string();
    let uid = claims.sub.to_string();
    let (liked, like_count) = state.with_db(move |db| db.toggle_like(&wid, &uid)).await?;

    Ok(Json(LikeResponse { liked, like_count }))
}

async fn load_work(state: &AppState, work_id: Uuid) -> Result<Work, ApiError> {
    let wid = work_id.to_string();
    let row = state
        .with_db(move |db| db.get_work(&wid))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(convert::work(row)?)
}

pub(crate) async fn load_visible_work(
    state: &AppState,
    work_id: Uuid,
    viewer: Uuid,
) -> Result<Work, ApiError> {
    let work = load_work(state, work_id).await?;
    if !work.is_visible_to(viewer) {
        return Err(ApiError::Forbidden);
    }
    Ok(work)
}

fn respond(state: &AppStateInner, work: Work, like_count: u64, liked: bool) -> WorkResponse {
    let image_url = work
        .image_path
        .as_deref()
        .map(|path| public_url(&state.public_base_url, path));
    WorkResponse {
        work,
        image_url,
        like_count,
        liked,
    }
}
