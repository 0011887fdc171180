//! Business rules on top of the repositories.
//!
//! Functions are generic over the repository traits and take the repository
//! explicitly, so handlers and tests choose the storage backend.

pub mod authors;
pub mod books;
pub mod users;

pub use authors::{create_author, delete_author_by_id, get_author_by_id, query_authors, update_author_by_id};
pub use books::{create_book, delete_book_by_id, get_book_by_id, query_books, update_book_by_id};
pub use users::{login, register};
