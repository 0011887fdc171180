use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use super::{Book, Entity};
use crate::filter::{FieldValue, Filter};

/// An author as stored in the `authors` table and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    /// Unique across all authors, stored trimmed and lowercased.
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present only when the `books` relation was requested.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub books: Option<Vec<Book>>,
}

impl Entity for Author {
    const RESOURCE: &'static str = "Author";
    const TABLE: &'static str = "authors";
    const SORTABLE: &'static [(&'static str, &'static str)] = &[
        ("id", "id"),
        ("firstName", "first_name"),
        ("first_name", "first_name"),
        ("lastName", "last_name"),
        ("last_name", "last_name"),
        ("email", "email"),
        ("createdAt", "created_at"),
        ("created_at", "created_at"),
        ("updatedAt", "updated_at"),
        ("updated_at", "updated_at"),
    ];
    const RELATIONS: &'static [&'static str] = &["books"];

    fn id(&self) -> i32 {
        self.id
    }

    fn value_of(&self, column: &str) -> Option<FieldValue> {
        match column {
            "id" => Some(self.id.into()),
            "first_name" => Some(self.first_name.clone().into()),
            "last_name" => Some(self.last_name.clone().into()),
            "email" => Some(self.email.clone().into()),
            "created_at" => Some(self.created_at.into()),
            "updated_at" => Some(self.updated_at.into()),
            _ => None,
        }
    }
}

/// Payload for `POST /api/authors`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAuthorInput {
    #[validate(length(min = 2, max = 50))]
    pub first_name: String,
    #[validate(length(min = 2, max = 50))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
}

impl CreateAuthorInput {
    pub fn normalized(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = normalize_email(&self.email);
        self
    }
}

/// Payload for `PUT /api/authors/{id}`. Absent fields keep their current value,
/// but at least one field must be supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_author_changes"))]
pub struct UpdateAuthorInput {
    #[validate(length(min = 2, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 2, max = 50))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

impl UpdateAuthorInput {
    pub fn normalized(mut self) -> Self {
        self.first_name = self.first_name.map(|name| name.trim().to_string());
        self.last_name = self.last_name.map(|name| name.trim().to_string());
        self.email = self.email.as_deref().map(normalize_email);
        self
    }
}

fn validate_author_changes(input: &UpdateAuthorInput) -> Result<(), ValidationError> {
    if input.first_name.is_none() && input.last_name.is_none() && input.email.is_none() {
        return Err(ValidationError::new("at_least_one_field"));
    }
    Ok(())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Query-string fields `GET /api/authors` may filter on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl From<AuthorFilter> for Filter {
    fn from(query: AuthorFilter) -> Self {
        Filter::new()
            .eq_opt("first_name", query.first_name)
            .eq_opt("last_name", query.last_name)
            .eq_opt("email", query.email.as_deref().map(normalize_email))
    }
}
