use actix_web::{web, HttpRequest, HttpResponse};
use log::debug;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::filter::Filter;
use crate::models::{AuthorFilter, CreateAuthorInput, UpdateAuthorInput};
use crate::repositories::AuthorRepository;
use crate::services;

use super::pagination_options;

/// Lists authors, one page at a time.
///
/// ## Query Parameters:
/// - `first_name`, `last_name`, `email` (optional): exact-match filters.
/// - `sortBy` (optional): `field:asc|desc[,...]`, default `createdAt:desc`.
/// - `limit`, `page` (optional): page size and 1-based page number.
/// - `populate` (optional): `books` to include each author's books.
///
/// ## Responses:
/// - `200 OK`: a page envelope with `results`, `page`, `limit`, `totalPages`, `totalResults`.
/// - `400 Bad Request`: unknown sort field or relation.
pub async fn list_authors<A: AuthorRepository>(
    authors: web::Data<A>,
    filter: web::Query<AuthorFilter>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let filter = Filter::from(filter.into_inner());
    let options = pagination_options(&req);
    let page = services::query_authors(authors.get_ref(), &filter, &options).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_author<A: AuthorRepository>(
    authors: web::Data<A>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let author = services::get_author_by_id(authors.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(author))
}

/// Creates an author. `201` with the stored row, `400` on a duplicate email.
pub async fn create_author<A: AuthorRepository>(
    authors: web::Data<A>,
    user: AuthenticatedUser,
    input: web::Json<CreateAuthorInput>,
) -> Result<HttpResponse, AppError> {
    debug!("User {} creating an author", user.user_id);
    let author = services::create_author(authors.get_ref(), input.into_inner()).await?;
    Ok(HttpResponse::Created().json(author))
}

pub async fn update_author<A: AuthorRepository>(
    authors: web::Data<A>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    input: web::Json<UpdateAuthorInput>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    debug!("User {} updating author {}", user.user_id, id);
    let author = services::update_author_by_id(authors.get_ref(), id, input.into_inner()).await?;
    Ok(HttpResponse::Ok().json(author))
}

/// Deletes an author and answers `204`. Books by the author are kept.
pub async fn delete_author<A: AuthorRepository>(
    authors: web::Data<A>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    debug!("User {} deleting author {}", user.user_id, id);
    services::delete_author_by_id(authors.get_ref(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}
