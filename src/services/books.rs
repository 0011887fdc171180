use log::info;
use validator::Validate;

use crate::error::AppError;
use crate::filter::Filter;
use crate::models::{Book, CreateBookInput, UpdateBookInput};
use crate::pagination::{paginate, PageResult, PaginationOptions};
use crate::repositories::BookRepository;

/// Creates a book. The author is not looked up, so a book may reference a
/// missing author.
pub async fn create_book<R: BookRepository>(repo: &R, input: CreateBookInput) -> Result<Book, AppError> {
    let input = input.normalized();
    input.validate()?;

    if repo.isbn_taken(&input.isbn, None).await? {
        return Err(AppError::Conflict("Book already exists".into()));
    }

    let book = repo.insert(&input).await?;
    info!("Created book {} for author {}", book.id, book.author_id);
    Ok(book)
}

pub async fn query_books<R: BookRepository>(
    repo: &R,
    filter: &Filter,
    options: &PaginationOptions,
) -> Result<PageResult<Book>, AppError> {
    paginate(repo, filter, options).await
}

pub async fn get_book_by_id<R: BookRepository>(repo: &R, id: i32) -> Result<Book, AppError> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".into()))
}

pub async fn update_book_by_id<R: BookRepository>(
    repo: &R,
    id: i32,
    changes: UpdateBookInput,
) -> Result<Book, AppError> {
    let changes = changes.normalized();
    changes.validate()?;

    get_book_by_id(repo, id).await?;
    if let Some(isbn) = &changes.isbn {
        if repo.isbn_taken(isbn, Some(id)).await? {
            return Err(AppError::Conflict("ISBN already exists".into()));
        }
    }

    let book = repo
        .update(id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".into()))?;
    info!("Updated book {}", book.id);
    Ok(book)
}

pub async fn delete_book_by_id<R: BookRepository>(repo: &R, id: i32) -> Result<(), AppError> {
    if !repo.delete(id).await? {
        return Err(AppError::NotFound("Book not found".into()));
    }
    info!("Deleted book {}", id);
    Ok(())
}
