use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::AppError;

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// The user's id.
    pub sub: i32,
    /// Issued-at, seconds since epoch.
    pub iat: usize,
    /// Expiration, seconds since epoch.
    pub exp: usize,
}

/// Signs an HS256 token for `user_id`, valid for `jwt_expiration_hours`.
pub fn generate_token(user_id: i32, config: &AuthConfig) -> Result<String, AppError> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(config.jwt_expiration_hours))
        .ok_or_else(|| AppError::InternalServerError("Token expiration is out of range".into()))?;

    let claims = Claims {
        sub: user_id,
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Checks signature and expiry. Any failure is `Unauthorized`.
pub fn verify_token(token: &str, config: &AuthConfig) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
