use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

pub const DEFAULT_ROLE: &str = "user";

/// User record in the `user` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String, // bcrypt hash, not exposed in JSON
    pub department: Option<String>,
    pub category: Option<String>,
    pub role: String,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "updatedAt", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Values for a fresh `user` row; `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub department: Option<String>,
    pub category: Option<String>,
    pub role: String,
}

/// Column patch for an existing user; `None` leaves the column untouched.
/// `password` is already hashed.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub department: Option<String>,
    pub category: Option<String>,
}
