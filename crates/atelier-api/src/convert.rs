//! Row -> domain model conversion. A row that fails to convert is corrupt
//! and surfaces as an internal error.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use atelier_db::models::{MessageRow, ProfileRow, RequestRow, WorkRow};
use atelier_types::{Message, Profile, Request, Work};

fn uuid(value: &str, what: &str) -> Result<Uuid> {
    value
        .parse()
        .with_context(|| format!("corrupt {what} '{value}'"))
}

fn timestamp(value: &str) -> Result<DateTime<Utc>> {
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through the sqlite shell use datetime('now').
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .with_context(|| format!("corrupt timestamp '{value}'"))
}

pub fn profile(row: ProfileRow) -> Result<Profile> {
    Ok(Profile {
        id: uuid(&row.id, "profile id")?,
        role: row.role.parse()?,
        display_name: row.display_name,
        bio: row.bio,
        genre: row.genre,
        area: row.area,
        link: row.link,
        created_at: timestamp(&row.created_at)?,
    })
}

pub fn work(row: WorkRow) -> Result<Work> {
    Ok(Work {
        id: uuid(&row.id, "work id")?,
        creator_id: uuid(&row.creator_id, "work creator_id")?,
        title: row.title,
        description: row.description,
        image_path: row.image_path,
        tags: row.tags,
        is_public: row.is_public,
        created_at: timestamp(&row.created_at)?,
    })
}

pub fn request(row: RequestRow) -> Result<Request> {
    Ok(Request {
        id: uuid(&row.id, "request id")?,
        creator_id: uuid(&row.creator_id, "request creator_id")?,
        client_id: uuid(&row.client_id, "request client_id")?,
        work_id: row
            .work_id
            .as_deref()
            .map(|id| uuid(id, "request work_id"))
            .transpose()?,
        title: row.title,
        message: row.message,
        status: row.status.parse()?,
        created_at: timestamp(&row.created_at)?,
        updated_at: timestamp(&row.updated_at)?,
    })
}

pub fn message(row: MessageRow) -> Result<Message> {
    Ok(Message {
        id: uuid(&row.id, "message id")?,
        request_id: uuid(&row.request_id, "message request_id")?,
        sender_id: uuid(&row.sender_id, "message sender_id")?,
        body: row.body,
        is_read: row.is_read,
        created_at: timestamp(&row.created_at)?,
    })
}

pub fn messages(rows: Vec<MessageRow>) -> Result<Vec<Message>> {
    rows.into_iter().map(message).collect()
}
