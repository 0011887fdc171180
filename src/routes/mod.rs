pub mod auth;
pub mod authors;
pub mod books;

use actix_web::{web, HttpRequest};

use crate::error::AppError;
use crate::pagination::PaginationOptions;
use crate::repositories::{AuthorRepository, BookRepository, UserRepository};

/// Registers the API routes. Mount inside the `/api` scope wrapped with
/// `AuthMiddleware`; the repositories and `AuthConfig` are expected as
/// `web::Data` on the app.
pub fn config<A, B, U>(cfg: &mut web::ServiceConfig)
where
    A: AuthorRepository,
    B: BookRepository,
    U: UserRepository,
{
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/auth")
            .route("/register", web::post().to(auth::register::<U>))
            .route("/login", web::post().to(auth::login::<U>)),
    )
    .service(
        web::scope("/authors")
            .route("", web::get().to(authors::list_authors::<A>))
            .route("", web::post().to(authors::create_author::<A>))
            .route("/{id}", web::get().to(authors::get_author::<A>))
            .route("/{id}", web::put().to(authors::update_author::<A>))
            .route("/{id}", web::delete().to(authors::delete_author::<A>)),
    )
    .service(
        web::scope("/books")
            .route("", web::get().to(books::list_books::<B>))
            .route("", web::post().to(books::create_book::<B>))
            .route("/{id}", web::get().to(books::get_book::<B>))
            .route("/{id}", web::patch().to(books::update_book::<B>))
            .route("/{id}", web::delete().to(books::delete_book::<B>)),
    );
}

// Decoded leniently: repeated or unparsable pagination keys never fail the request.
fn pagination_options(req: &HttpRequest) -> PaginationOptions {
    let pairs = web::Query::<Vec<(String, String)>>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_default();
    PaginationOptions::from_pairs(pairs)
}
