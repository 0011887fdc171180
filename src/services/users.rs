use log::info;
use validator::Validate;

use crate::auth::{generate_token, hash_password, verify_password, AuthResponse, LoginRequest, RegisterRequest};
use crate::config::AuthConfig;
use crate::error::AppError;
use crate::repositories::UserRepository;

/// Creates an API user and returns a token for it.
pub async fn register<R: UserRepository>(
    repo: &R,
    auth: &AuthConfig,
    request: RegisterRequest,
) -> Result<AuthResponse, AppError> {
    request.validate()?;
    let email = request.email.trim().to_lowercase();

    if repo.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&request.password, auth.bcrypt_cost)?;
    let user = repo.insert(&request.username, &email, &password_hash).await?;
    info!("Registered user {}", user.id);

    Ok(AuthResponse {
        token: generate_token(user.id, auth)?,
        user_id: user.id,
    })
}

/// Checks credentials. Unknown emails and wrong passwords fail the same way.
pub async fn login<R: UserRepository>(
    repo: &R,
    auth: &AuthConfig,
    request: LoginRequest,
) -> Result<AuthResponse, AppError> {
    request.validate()?;
    let email = request.email.trim().to_lowercase();

    let user = repo
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;
    if !verify_password(&request.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    Ok(AuthResponse {
        token: generate_token(user.id, auth)?,
        user_id: user.id,
    })
}
