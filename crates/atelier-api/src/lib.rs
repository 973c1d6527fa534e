pub mod auth;
pub mod convert;
pub mod error;
pub mod files;
pub mod messages;
pub mod middleware;
pub mod profiles;
pub mod requests;
pub mod state;
pub mod storage;
pub mod works;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

/// Every route the service exposes. Layers such as tracing and CORS are
/// added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/storage/images/{name}", get(files::serve_image));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/session", get(auth::session))
        .route("/profiles/me", patch(profiles::update_my_profile))
        .route("/profiles/{profile_id}", get(profiles::get_profile))
        .route("/works", get(works::list_works).post(works::create_work))
        .route("/works/{work_id}", get(works::get_work))
        .route("/works/{work_id}/visibility", post(works::toggle_visibility))
        .route("/works/{work_id}/like", post(works::toggle_like))
        .route(
            "/requests",
            get(requests::list_requests).post(requests::create_request),
        )
        .route("/requests/{request_id}", get(requests::get_request))
        .route("/requests/{request_id}/status", patch(requests::update_status))
        .route(
            "/requests/{request_id}/messages",
            get(messages::get_messages).post(messages::send_message),
        )
        .route("/requests/{request_id}/messages/read", post(messages::mark_read))
        .route("/me/unread", get(messages::unread_count))
        .route(
            "/storage/images",
            post(files::upload_image).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
