pub mod api;
pub mod lifecycle;
pub mod models;

pub use models::{Like, Message, Profile, Request, RequestStatus, Role, Work};
