use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// An API user allowed to create, change and delete authors and books.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
