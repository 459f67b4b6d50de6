//! Caller identity extraction.
//!
//! Credential verification is an upstream concern: by the time a request reaches this service, the gateway has
//! already validated whoever is calling and stamped the request with an `fl_auth_token` header of the form
//! `user_id:role`. The extractor here parses that identity and rejects malformed or missing tokens; it does not,
//! and must not, re-verify credentials.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use freshlink_engine::db_types::{Actor, Role};
use log::debug;

use crate::errors::{AuthError, ServerError};

pub const AUTH_HEADER: &str = "fl_auth_token";

/// The authenticated caller, available to any handler that lists it as a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(Actor);

impl AuthenticatedUser {
    pub fn actor(&self) -> &Actor {
        &self.0
    }

    pub fn into_actor(self) -> Actor {
        self.0
    }

    pub fn is_supplier(&self) -> bool {
        self.0.role == Role::Supplier
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(parse_identity(req))
    }
}

fn parse_identity(req: &HttpRequest) -> Result<AuthenticatedUser, ServerError> {
    let header = req.headers().get(AUTH_HEADER).ok_or(AuthError::MissingToken)?;
    let token = header.to_str().map_err(|e| {
        debug!("💻️ Could not read auth token. {e}");
        AuthError::PoorlyFormattedToken("token is not valid UTF-8".to_string())
    })?;
    let (id, role) = token
        .split_once(':')
        .ok_or_else(|| AuthError::PoorlyFormattedToken("expected user_id:role".to_string()))?;
    if id.trim().is_empty() {
        return Err(AuthError::PoorlyFormattedToken("user id is empty".to_string()).into());
    }
    let role = role.parse::<Role>().map_err(|e| AuthError::UnknownRole(e.to_string()))?;
    Ok(AuthenticatedUser(Actor::new(id.trim(), role)))
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;

    use super::*;

    #[actix_web::test]
    async fn well_formed_tokens_parse() {
        let req = TestRequest::get().insert_header((AUTH_HEADER, "v-42:vendor")).to_http_request();
        let user = AuthenticatedUser::extract(&req).await.unwrap();
        assert_eq!(user.actor().id.as_str(), "v-42");
        assert_eq!(user.actor().role, Role::Vendor);
        assert!(!user.is_supplier());
    }

    #[actix_web::test]
    async fn missing_and_malformed_tokens_are_rejected() {
        let req = TestRequest::get().to_http_request();
        assert!(AuthenticatedUser::extract(&req).await.is_err());

        let req = TestRequest::get().insert_header((AUTH_HEADER, "no-separator")).to_http_request();
        assert!(AuthenticatedUser::extract(&req).await.is_err());

        let req = TestRequest::get().insert_header((AUTH_HEADER, "u-1:admiral")).to_http_request();
        assert!(AuthenticatedUser::extract(&req).await.is_err());
    }
}
