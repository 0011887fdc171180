//! Bearer-token guard for the `/api` scope.
//!
//! Reads (`GET`, `HEAD`, `OPTIONS`) and everything under `/api/auth/` pass
//! through. Any other request needs `Authorization: Bearer <token>` signed
//! with the configured secret; on success the `Claims` are stored in the
//! request extensions, otherwise a 401 JSON response is returned without
//! reaching the handler.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, Method},
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use log::debug;

use crate::auth::token::{verify_token, Claims};
use crate::config::AuthConfig;
use crate::error::AppError;

const PUBLIC_PREFIX: &str = "/api/auth/";

pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_public(&req) {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        }

        match authenticate(&req) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
            Err(err) => {
                debug!("Rejected {} {}: {}", req.method(), req.path(), err);
                let response = err.error_response();
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
        }
    }
}

fn is_public(req: &ServiceRequest) -> bool {
    let method = req.method();
    method == Method::GET
        || method == Method::HEAD
        || method == Method::OPTIONS
        || req.path().starts_with(PUBLIC_PREFIX)
}

fn authenticate(req: &ServiceRequest) -> Result<Claims, AppError> {
    let config = req
        .app_data::<web::Data<AuthConfig>>()
        .ok_or_else(|| AppError::InternalServerError("Authentication is not configured".into()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

    verify_token(token, config.get_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::extractors::AuthenticatedUser;
    use crate::auth::token::generate_token;
    use actix_web::{http::StatusCode, test, App, HttpResponse};

    fn auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "middleware_secret".to_string(),
            jwt_expiration_hours: 1,
            bcrypt_cost: 4,
        }
    }

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.user_id.to_string())
    }

    async fn open() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_rt::test]
    async fn test_guards_mutations_only() {
        let config = auth_config();
        let app = test::init_service(
            App::new().app_data(web::Data::new(config.clone())).service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .route("/things", web::get().to(open))
                    .route("/things", web::post().to(whoami))
                    .route("/auth/login", web::post().to(open)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/things").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post().uri("/api/auth/login").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post().uri("/api/things").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Missing token");

        let req = test::TestRequest::post()
            .uri("/api/things")
            .insert_header((header::AUTHORIZATION, "Bearer garbage"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let token = generate_token(42, &config).unwrap();
        let req = test::TestRequest::post()
            .uri("/api/things")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "42");
    }
}
