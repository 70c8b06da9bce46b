use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::policy;
use crate::auth::token::Claims;
use crate::error::AppError;
use crate::models::Role;

/// The caller identified by `AuthMiddleware`.
///
/// Identity and role come straight from the verified token claims; no user lookup
/// happens per request. Missing claims (middleware not applied) produce
/// `AppError::Unauthorized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&Claims> for AuthenticatedUser {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
        }
    }
}

fn authenticated(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    req.extensions()
        .get::<Claims>()
        .map(AuthenticatedUser::from)
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".into()))
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticated(req).map_err(Into::into))
    }
}

/// An authenticated caller holding the `admin` role; anyone else gets 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = authenticated(req).and_then(|user| {
            policy::authorize_admin(&user)?;
            Ok(AdminUser(user))
        });
        ready(result.map_err(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;

    fn request_with(role: Option<Role>) -> (HttpRequest, Uuid) {
        let req = test::TestRequest::default().to_http_request();
        let id = Uuid::new_v4();
        if let Some(role) = role {
            req.extensions_mut().insert(Claims {
                sub: id,
                role,
                iat: 0,
                exp: i64::MAX,
            });
        }
        (req, id)
    }

    #[actix_rt::test]
    async fn test_authenticated_user_extractor_success() {
        let (req, id) = request_with(Some(Role::Member));

        let user = AuthenticatedUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap();

        assert_eq!(user.id, id);
        assert!(!user.is_admin());
    }

    #[actix_rt::test]
    async fn test_authenticated_user_extractor_failure() {
        let (req, _) = request_with(None);

        let err = AuthenticatedUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap_err();

        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_admin_extractor_by_role() {
        let (admin_req, admin_id) = request_with(Some(Role::Admin));
        let admin = AdminUser::from_request(&admin_req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(admin.0.id, admin_id);

        let (member_req, _) = request_with(Some(Role::Member));
        let err = AdminUser::from_request(&member_req, &mut Payload::None)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);

        let (anonymous_req, _) = request_with(None);
        let err = AdminUser::from_request(&anonymous_req, &mut Payload::None)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
