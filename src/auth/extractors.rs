use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};

use crate::auth::token::Claims;
use crate::error::AppError;

/// The caller of a request that passed `AuthMiddleware`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i32,
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user: Result<Self, Self::Error> = req
            .extensions()
            .get::<Claims>()
            .map(|claims| AuthenticatedUser { user_id: claims.sub })
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()).into());
        ready(user)
    }
}
