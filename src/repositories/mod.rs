//! Data access for authors, books and users.
//!
//! Each entity has its own repository trait. The author and book traits
//! extend `CollectionAccessor`, so the same value serves both the list
//! endpoints (through `paginate`) and the single-row operations.
//! `postgres` holds the production implementations over a `PgPool`;
//! `memory` keeps everything in process and backs the test suites.

pub mod memory;
pub mod postgres;

use std::future::Future;

pub use memory::InMemoryDatabase;
pub use postgres::{PgAuthorRepository, PgBookRepository, PgUserRepository};

use crate::error::AppError;
use crate::models::{Author, Book, CreateAuthorInput, CreateBookInput, UpdateAuthorInput, UpdateBookInput, User};
use crate::pagination::CollectionAccessor;

pub trait AuthorRepository: CollectionAccessor<Author> + Send + Sync + 'static {
    fn find_by_id(&self, id: i32) -> impl Future<Output = Result<Option<Author>, AppError>> + Send;

    /// Whether an author other than `exclude_id` already uses `email`.
    fn email_taken(
        &self,
        email: &str,
        exclude_id: Option<i32>,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn insert(&self, input: &CreateAuthorInput) -> impl Future<Output = Result<Author, AppError>> + Send;

    /// Applies the supplied fields; `None` when the row no longer exists.
    fn update(
        &self,
        id: i32,
        changes: &UpdateAuthorInput,
    ) -> impl Future<Output = Result<Option<Author>, AppError>> + Send;

    /// Returns whether a row was removed.
    fn delete(&self, id: i32) -> impl Future<Output = Result<bool, AppError>> + Send;
}

pub trait BookRepository: CollectionAccessor<Book> + Send + Sync + 'static {
    fn find_by_id(&self, id: i32) -> impl Future<Output = Result<Option<Book>, AppError>> + Send;

    /// Whether a book other than `exclude_id` already uses `isbn`.
    fn isbn_taken(
        &self,
        isbn: &str,
        exclude_id: Option<i32>,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn insert(&self, input: &CreateBookInput) -> impl Future<Output = Result<Book, AppError>> + Send;

    fn update(
        &self,
        id: i32,
        changes: &UpdateBookInput,
    ) -> impl Future<Output = Result<Option<Book>, AppError>> + Send;

    fn delete(&self, id: i32) -> impl Future<Output = Result<bool, AppError>> + Send;
}

pub trait UserRepository: Send + Sync + 'static {
    fn find_by_email(&self, email: &str) -> impl Future<Output = Result<Option<User>, AppError>> + Send;

    fn insert(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> impl Future<Output = Result<User, AppError>> + Send;
}
