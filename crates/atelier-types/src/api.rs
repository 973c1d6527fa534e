use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::RequestActions;
use crate::models::{Message, Profile, Request, RequestStatus, Role, Work};

// -- JWT Claims --

/// Bearer token claims. `jti` identifies the token for sign-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub jti: Uuid,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub display_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub role: Role,
    pub token: String,
}

// -- Profiles --

/// Role is deliberately absent: it cannot change after signup.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub genre: Option<String>,
    pub area: Option<String>,
    pub link: Option<String>,
}

// -- Works --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateWorkRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkResponse {
    #[serde(flatten)]
    pub work: Work,
    pub image_url: Option<String>,
    pub like_count: u64,
    pub liked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: u64,
}

// -- Requests --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRequestRequest {
    pub creator_id: Uuid,
    #[serde(default)]
    pub work_id: Option<Uuid>,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatusRequest {
    pub status: RequestStatus,
}

#[derive(Debug, Serialize)]
pub struct RequestResponse {
    pub request: Request,
    pub actions: RequestActions,
}

#[derive(Debug, Serialize)]
pub struct RequestDetailResponse {
    pub request: Request,
    pub messages: Vec<Message>,
    pub actions: RequestActions,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadResponse {
    pub count: u64,
}

// -- Storage --

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub path: String,
    pub public_url: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub profile: Profile,
}
