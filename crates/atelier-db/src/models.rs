//! Database row types. These map directly to SQLite rows and stay
//! independent of the atelier-types domain models.

#[derive(Debug, Clone)]
pub struct AccountRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ProfileRow {
    pub id: String,
    pub role: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub genre: Option<String>,
    pub area: Option<String>,
    pub link: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct WorkRow {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct RequestRow {
    pub id: String,
    pub creator_id: String,
    pub client_id: String,
    pub work_id: Option<String>,
    pub title: String,
    pub message: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub request_id: String,
    pub sender_id: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: String,
}

// -- Insert payloads --

pub struct NewWork<'a> {
    pub id: &'a str,
    pub creator_id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub image_path: Option<&'a str>,
    pub tags: &'a [String],
    pub is_public: bool,
}

pub struct NewRequest<'a> {
    pub id: &'a str,
    pub creator_id: &'a str,
    pub client_id: &'a str,
    pub work_id: Option<&'a str>,
    pub title: &'a str,
    pub message: &'a str,
    pub message_id: &'a str,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Default)]
pub struct ProfileUpdate<'a> {
    pub display_name: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub genre: Option<&'a str>,
    pub area: Option<&'a str>,
    pub link: Option<&'a str>,
}
