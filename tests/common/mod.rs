#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use bookshelf::auth::{AuthMiddleware, AuthResponse};
use bookshelf::config::AuthConfig;
use bookshelf::repositories::memory::{InMemoryAuthors, InMemoryBooks, InMemoryUsers};
use bookshelf::repositories::InMemoryDatabase;
use bookshelf::routes;
use serde_json::{json, Value};

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration_test_secret".to_string(),
        jwt_expiration_hours: 1,
        bcrypt_cost: 4,
    }
}

/// Builds the API over `db`, the way `main` builds it over Postgres.
pub async fn init_app(
    db: &InMemoryDatabase,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(db.authors()))
            .app_data(web::Data::new(db.books()))
            .app_data(web::Data::new(db.users()))
            .app_data(web::Data::new(auth_config()))
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config::<InMemoryAuthors, InMemoryBooks, InMemoryUsers>),
            ),
    )
    .await
}

/// Registers a user and returns its bearer token.
pub async fn register_user(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    email: &str,
) -> String {
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "librarian",
            "email": email,
            "password": "Password123!"
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let auth: AuthResponse = test::read_body_json(resp).await;
    auth.token
}

/// Sends a JSON request with a bearer token and returns status and body.
pub async fn send_json(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    req: test::TestRequest,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let req = match token {
        Some(token) => req.insert_header((header::AUTHORIZATION, format!("Bearer {}", token))),
        None => req,
    };
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub fn author_payload(first_name: &str, email: &str) -> Value {
    json!({
        "first_name": first_name,
        "last_name": "Jemisin",
        "email": email
    })
}

pub fn book_payload(title: &str, isbn: &str, author_id: i64) -> Value {
    json!({
        "title": title,
        "description": "A story about a broken earth",
        "pages": 468,
        "genre": "fantasy",
        "isbn": isbn,
        "author_id": author_id
    })
}
