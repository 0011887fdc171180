use actix_web::{web, HttpResponse};

use crate::auth::{LoginRequest, RegisterRequest};
use crate::config::AuthConfig;
use crate::error::AppError;
use crate::repositories::UserRepository;
use crate::services;

/// Register a new user
///
/// Creates the account and answers `201` with a token for it.
pub async fn register<U: UserRepository>(
    users: web::Data<U>,
    auth: web::Data<AuthConfig>,
    register_data: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let response = services::register(users.get_ref(), auth.get_ref(), register_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

/// Login user
pub async fn login<U: UserRepository>(
    users: web::Data<U>,
    auth: web::Data<AuthConfig>,
    login_data: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let response = services::login(users.get_ref(), auth.get_ref(), login_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}
