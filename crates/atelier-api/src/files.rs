use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use axum_extra::{TypedHeader, extract::WithRejection, headers::ContentType};
use tracing::info;

use atelier_types::api::{Claims, UploadResponse};

use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{ImageStore, public_url};

/// POST /storage/images. Body is raw image bytes; the `Content-Type` picks the
/// stored extension. Returns the storage path and its public URL.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(content_type, _): WithRejection<Option<TypedHeader<ContentType>>, ApiError>,
    WithRejection(bytes, _): WithRejection<Bytes, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let TypedHeader(content_type) = content_type.ok_or(ApiError::UnsupportedMedia)?;
    let ext = ImageStore::extension_for(&content_type.to_string())
        .ok_or(ApiError::UnsupportedMedia)?;

    if bytes.is_empty() {
        return Err(ApiError::bad_request("empty upload"));
    }
    if bytes.len() > state.max_upload_bytes {
        return Err(ApiError::PayloadTooLarge);
    }

    let path = state.images.save(&bytes, ext).await?;
    info!("User {} uploaded {} ({} bytes)", claims.sub, path, bytes.len());

    let public_url = public_url(&state.public_base_url, &path);
    Ok((StatusCode::CREATED, Json(UploadResponse { path, public_url })))
}

/// GET /storage/images/{name}. Public, no auth.
pub async fn serve_image(
    State(state): State<AppState>,
    WithRejection(Path(name), _): WithRejection<Path<String>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if !ImageStore::is_valid_name(&name) {
        return Err(ApiError::bad_request("invalid image name"));
    }

    let (bytes, content_type) = state.images.read(&name).await?.ok_or(ApiError::NotFound)?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    ))
}
