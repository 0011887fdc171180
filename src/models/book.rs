use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use super::{Author, Entity};
use crate::filter::{FieldValue, Filter};

lazy_static! {
    // ISBN-10 or ISBN-13, with or without hyphens.
    static ref ISBN_REGEX: Regex = Regex::new(r"^[0-9X-]{10,17}$").unwrap();
}

/// A book as stored in the `books` table and returned by the API.
///
/// `author_id` is not a foreign key: deleting an author leaves its books in
/// place, and such orphaned books are returned without an `author`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub pages: Option<i32>,
    pub genre: String,
    pub isbn: String,
    pub author_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present only when the `author` relation was requested and the author exists.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
}

impl Entity for Book {
    const RESOURCE: &'static str = "Book";
    const TABLE: &'static str = "books";
    const SORTABLE: &'static [(&'static str, &'static str)] = &[
        ("id", "id"),
        ("title", "title"),
        ("pages", "pages"),
        ("genre", "genre"),
        ("isbn", "isbn"),
        ("authorId", "author_id"),
        ("author_id", "author_id"),
        ("createdAt", "created_at"),
        ("created_at", "created_at"),
        ("updatedAt", "updated_at"),
        ("updated_at", "updated_at"),
    ];
    const RELATIONS: &'static [&'static str] = &["author"];

    fn id(&self) -> i32 {
        self.id
    }

    fn value_of(&self, column: &str) -> Option<FieldValue> {
        match column {
            "id" => Some(self.id.into()),
            "title" => Some(self.title.clone().into()),
            "description" => Some(self.description.clone().into()),
            "pages" => self.pages.map(FieldValue::from),
            "genre" => Some(self.genre.clone().into()),
            "isbn" => Some(self.isbn.clone().into()),
            "author_id" => Some(self.author_id.into()),
            "created_at" => Some(self.created_at.into()),
            "updated_at" => Some(self.updated_at.into()),
            _ => None,
        }
    }
}

/// Payload for `POST /api/books`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBookInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 10, max = 250))]
    pub description: String,
    #[validate(range(min = 1))]
    pub pages: Option<i32>,
    #[validate(length(min = 1, max = 100))]
    pub genre: String,
    #[validate(regex(path = "ISBN_REGEX", message = "ISBN must be 10 to 17 digits, X or hyphens"))]
    pub isbn: String,
    #[validate(range(min = 1))]
    pub author_id: i32,
}

impl CreateBookInput {
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.genre = self.genre.trim().to_string();
        self
    }
}

/// Payload for `PATCH /api/books/{id}`. Absent fields keep their current value,
/// but at least one field must be supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_book_changes"))]
pub struct UpdateBookInput {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 10, max = 250))]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub pages: Option<i32>,
    #[validate(length(min = 1, max = 100))]
    pub genre: Option<String>,
    #[validate(regex(path = "ISBN_REGEX", message = "ISBN must be 10 to 17 digits, X or hyphens"))]
    pub isbn: Option<String>,
    #[validate(range(min = 1))]
    pub author_id: Option<i32>,
}

impl UpdateBookInput {
    pub fn normalized(mut self) -> Self {
        self.title = self.title.map(|title| title.trim().to_string());
        self.genre = self.genre.map(|genre| genre.trim().to_string());
        self
    }
}

fn validate_book_changes(input: &UpdateBookInput) -> Result<(), ValidationError> {
    let untouched = input.title.is_none()
        && input.description.is_none()
        && input.pages.is_none()
        && input.genre.is_none()
        && input.isbn.is_none()
        && input.author_id.is_none();
    if untouched {
        return Err(ValidationError::new("at_least_one_field"));
    }
    Ok(())
}

/// Query-string fields `GET /api/books` may filter on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFilter {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub isbn: Option<String>,
    pub author_id: Option<i32>,
}

impl From<BookFilter> for Filter {
    fn from(query: BookFilter) -> Self {
        Filter::new()
            .eq_opt("title", query.title)
            .eq_opt("genre", query.genre)
            .eq_opt("isbn", query.isbn)
            .eq_opt("author_id", query.author_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> CreateBookInput {
        CreateBookInput {
            title: "The Dispossessed".to_string(),
            description: "An ambiguous utopia on Anarres".to_string(),
            pages: Some(387),
            genre: "science fiction".to_string(),
            isbn: "978-0-06-051275-3".to_string(),
            author_id: 1,
        }
    }

    #[test]
    fn test_create_book_validation() {
        assert!(valid_input().validate().is_ok());

        let mut no_pages = valid_input();
        no_pages.pages = None;
        assert!(no_pages.validate().is_ok());

        let mut empty_title = valid_input();
        empty_title.title = String::new();
        assert!(empty_title.validate().is_err());

        let mut short_description = valid_input();
        short_description.description = "Too short".to_string();
        assert!(short_description.validate().is_err());

        let mut bad_isbn = valid_input();
        bad_isbn.isbn = "ISBN 12".to_string();
        assert!(bad_isbn.validate().is_err());

        let mut zero_pages = valid_input();
        zero_pages.pages = Some(0);
        assert!(zero_pages.validate().is_err());
    }

    #[test]
    fn test_update_book_validation() {
        assert!(UpdateBookInput::default().validate().is_err());

        let new_isbn = UpdateBookInput {
            isbn: Some("9783161484100".to_string()),
            ..Default::default()
        };
        assert!(new_isbn.validate().is_ok());

        let bad_isbn = UpdateBookInput {
            isbn: Some("12".to_string()),
            ..Default::default()
        };
        assert!(bad_isbn.validate().is_err());
    }

    #[test]
    fn test_orphaned_pages_value_is_null() {
        let book = Book {
            id: 1,
            title: "Untitled".to_string(),
            description: "A draft without a page count".to_string(),
            pages: None,
            genre: "drama".to_string(),
            isbn: "9783161484100".to_string(),
            author_id: 42,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            author: None,
        };
        assert_eq!(book.value_of("pages"), None);
        assert_eq!(book.value_of("author_id"), Some(FieldValue::Int(42)));

        let json = serde_json::to_value(&book).unwrap();
        assert!(json.get("author").is_none());
    }

    #[test]
    fn test_book_filter() {
        let filter: Filter = BookFilter {
            genre: Some("drama".to_string()),
            author_id: Some(3),
            ..Default::default()
        }
        .into();
        assert_eq!(
            filter.conditions(),
            &[
                ("genre", FieldValue::Text("drama".into())),
                ("author_id", FieldValue::Int(3)),
            ]
        );
    }
}
