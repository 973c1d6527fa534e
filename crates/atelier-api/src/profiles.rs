use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use atelier_db::models::ProfileUpdate;
use atelier_types::api::{Claims, UpdateProfileRequest};

use crate::auth::validate_display_name;
use crate::convert;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    WithRejection(Path(profile_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let pid = profile_id.to_string();
    let row = state
        .with_db(move |db| db.get_profile(&pid))
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(convert::profile(row)?))
}

/// PATCH /profiles/me. Blank optional fields are stored as given; role is
/// not part of the payload and never changes.
pub async fn update_my_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateProfileRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let display_name = req
        .display_name
        .as_deref()
        .map(validate_display_name)
        .transpose()?;
    let bio = req.bio.map(|s| s.trim().to_string());
    let genre = req.genre.map(|s| s.trim().to_string());
    let area = req.area.map(|s| s.trim().to_string());
    let link = req.link.map(|s| s.trim().to_string());

    let uid = claims.sub.to_string();
    let row = state
        .with_db(move |db| {
            db.update_profile(
                &uid,
                &ProfileUpdate {
                    display_name: display_name.as_deref(),
                    bio: bio.as_deref(),
                    genre: genre.as_deref(),
                    area: area.as_deref(),
                    link: link.as_deref(),
                },
            )
        })
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(convert::profile(row)?))
}
