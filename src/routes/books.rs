use actix_web::{web, HttpRequest, HttpResponse};
use log::debug;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::filter::Filter;
use crate::models::{BookFilter, CreateBookInput, UpdateBookInput};
use crate::repositories::BookRepository;
use crate::services;

use super::pagination_options;

/// Lists books. Filters on `title`, `genre`, `isbn` and `author_id`; takes the
/// same `sortBy`/`limit`/`page` parameters as authors, and `populate=author`.
pub async fn list_books<B: BookRepository>(
    books: web::Data<B>,
    filter: web::Query<BookFilter>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let filter = Filter::from(filter.into_inner());
    let options = pagination_options(&req);
    let page = services::query_books(books.get_ref(), &filter, &options).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_book<B: BookRepository>(
    books: web::Data<B>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let book = services::get_book_by_id(books.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(book))
}

pub async fn create_book<B: BookRepository>(
    books: web::Data<B>,
    user: AuthenticatedUser,
    input: web::Json<CreateBookInput>,
) -> Result<HttpResponse, AppError> {
    debug!("User {} creating a book", user.user_id);
    let book = services::create_book(books.get_ref(), input.into_inner()).await?;
    Ok(HttpResponse::Created().json(book))
}

pub async fn update_book<B: BookRepository>(
    books: web::Data<B>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    input: web::Json<UpdateBookInput>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    debug!("User {} updating book {}", user.user_id, id);
    let book = services::update_book_by_id(books.get_ref(), id, input.into_inner()).await?;
    Ok(HttpResponse::Ok().json(book))
}

pub async fn delete_book<B: BookRepository>(
    books: web::Data<B>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    debug!("User {} deleting book {}", user.user_id, id);
    services::delete_book_by_id(books.get_ref(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}
