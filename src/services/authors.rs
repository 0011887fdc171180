use log::info;
use validator::Validate;

use crate::error::AppError;
use crate::filter::Filter;
use crate::models::{Author, CreateAuthorInput, UpdateAuthorInput};
use crate::pagination::{paginate, PageResult, PaginationOptions};
use crate::repositories::AuthorRepository;

/// Creates an author. Fails with `Conflict` when the email is already used.
pub async fn create_author<R: AuthorRepository>(repo: &R, input: CreateAuthorInput) -> Result<Author, AppError> {
    let input = input.normalized();
    input.validate()?;

    if repo.email_taken(&input.email, None).await? {
        return Err(AppError::Conflict("Email already exists".into()));
    }

    let author = repo.insert(&input).await?;
    info!("Created author {}", author.id);
    Ok(author)
}

pub async fn query_authors<R: AuthorRepository>(
    repo: &R,
    filter: &Filter,
    options: &PaginationOptions,
) -> Result<PageResult<Author>, AppError> {
    paginate(repo, filter, options).await
}

pub async fn get_author_by_id<R: AuthorRepository>(repo: &R, id: i32) -> Result<Author, AppError> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Author not found".into()))
}

/// Applies a partial update. The email may stay the same but must not belong
/// to another author.
pub async fn update_author_by_id<R: AuthorRepository>(
    repo: &R,
    id: i32,
    changes: UpdateAuthorInput,
) -> Result<Author, AppError> {
    let changes = changes.normalized();
    changes.validate()?;

    get_author_by_id(repo, id).await?;
    if let Some(email) = &changes.email {
        if repo.email_taken(email, Some(id)).await? {
            return Err(AppError::Conflict("Email already taken".into()));
        }
    }

    let author = repo
        .update(id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Author not found".into()))?;
    info!("Updated author {}", author.id);
    Ok(author)
}

/// Deletes an author. Its books are left in place.
pub async fn delete_author_by_id<R: AuthorRepository>(repo: &R, id: i32) -> Result<(), AppError> {
    if !repo.delete(id).await? {
        return Err(AppError::NotFound("Author not found".into()));
    }
    info!("Deleted author {}", id);
    Ok(())
}
