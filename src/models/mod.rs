pub mod author;
pub mod book;
pub mod user;

pub use author::{Author, AuthorFilter, CreateAuthorInput, UpdateAuthorInput};
pub use book::{Book, BookFilter, CreateBookInput, UpdateBookInput};
pub use user::User;

use crate::error::AppError;
use crate::filter::FieldValue;

/// A persisted row type that can be listed through a collection accessor.
pub trait Entity {
    /// Singular name used in error messages, e.g. `"Author"`.
    const RESOURCE: &'static str;
    const TABLE: &'static str;
    /// Client-facing sort field names mapped to their columns.
    const SORTABLE: &'static [(&'static str, &'static str)];
    /// Relations that can be requested through `populate`.
    const RELATIONS: &'static [&'static str];

    fn id(&self) -> i32;

    /// Current value of `column`, or `None` for unknown or null columns.
    fn value_of(&self, column: &str) -> Option<FieldValue>;
}

/// Maps a client-facing sort field to its column.
pub fn sort_column<E: Entity>(field: &str) -> Result<&'static str, AppError> {
    E::SORTABLE
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, column)| *column)
        .ok_or_else(|| {
            AppError::BadRequest(format!("Unknown sort field '{}' for {}", field, E::RESOURCE))
        })
}

/// Rejects relation names the entity does not declare.
pub fn check_relations<E: Entity>(relations: &[String]) -> Result<(), AppError> {
    match relations
        .iter()
        .find(|relation| !E::RELATIONS.contains(&relation.as_str()))
    {
        Some(unknown) => Err(AppError::BadRequest(format!(
            "Unknown relation '{}' for {}",
            unknown,
            E::RESOURCE
        ))),
        None => Ok(()),
    }
}
