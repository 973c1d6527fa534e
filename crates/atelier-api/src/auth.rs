use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use atelier_types::Role;
use atelier_types::api::{
    Claims, LoginRequest, LoginResponse, SessionResponse, SignupRequest, SignupResponse,
};

use crate::convert;
use crate::error::ApiError;
use crate::state::AppState;

const TOKEN_TTL_DAYS: i64 = 30;
pub const MAX_DISPLAY_NAME: usize = 50;

pub async fn signup(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<SignupRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&req.email)?;
    if req.password.len() < 8 {
        return Err(ApiError::bad_request("password must be at least 8 characters"));
    }
    let display_name = validate_display_name(&req.display_name)?;

    // Check if the email is taken
    let lookup = email.clone();
    if state
        .with_db(move |db| db.get_account_by_email(&lookup))
        .await?
        .is_some()
    {
        return Err(email_taken());
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let user_id = Uuid::new_v4();
    let role = req.role;
    let uid = user_id.to_string();
    let addr = email.clone();
    state
        .with_db(move |db| {
            db.create_account(&uid, &addr, &password_hash, role.as_str(), &display_name)
        })
        .await
        .map_err(email_taken_on_conflict)?;

    info!("New {} account {} ({})", role, user_id, email);

    let (token, _) = create_token(&state.jwt_secret, user_id, role)?;

    Ok((StatusCode::CREATED, Json(SignupResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();
    let account = state
        .with_db(move |db| db.get_account_by_email(&email))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&account.password_hash)
        .map_err(|e| anyhow::anyhow!("stored hash for {} unreadable: {}", account.id, e))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = account
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt account id '{}': {}", account.id, e))?;
    let role: Role = account.role.parse().map_err(anyhow::Error::from)?;

    let (token, _) = create_token(&state.jwt_secret, user_id, role)?;

    Ok(Json(LoginResponse {
        user_id,
        role,
        token,
    }))
}

/// Revoke the presented token until it would have expired.
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let jti = claims.jti.to_string();
    let exp = claims.exp as i64;
    state.with_db(move |db| db.revoke_token(&jti, exp)).await?;

    info!("Signed out {} (token {})", claims.sub, claims.jti);
    Ok(StatusCode::NO_CONTENT)
}

/// Current profile for the bearer token.
pub async fn session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let row = state
        .with_db(move |db| db.get_profile(&uid))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(SessionResponse {
        profile: convert::profile(row)?,
    }))
}

pub fn create_token(secret: &str, user_id: Uuid, role: Role) -> anyhow::Result<(String, Claims)> {
    let claims = Claims {
        sub: user_id,
        role,
        jti: Uuid::new_v4(),
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

fn email_taken() -> ApiError {
    ApiError::Conflict("email already registered".into())
}

/// A signup that lost the race for its email hits the UNIQUE index after the
/// lookup above passed.
fn email_taken_on_conflict(err: ApiError) -> ApiError {
    match err {
        ApiError::Internal(e) if atelier_db::is_unique_violation(&e) => email_taken(),
        other => other,
    }
}

fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(ApiError::bad_request("invalid email address")),
    }
}

pub fn validate_display_name(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    let len = name.chars().count();
    if len == 0 || len > MAX_DISPLAY_NAME {
        return Err(ApiError::bad_request(format!(
            "display name must be 1-{MAX_DISPLAY_NAME} characters"
        )));
    }
    Ok(name.to_string())
}
