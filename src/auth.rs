//! Request authentication.
//!
//! Tokens are issued by the external auth service. They reach us either as
//! the identity stored in the session cookie or as an `Authorization: Bearer`
//! header, and are verified as HS256 JWTs with the shared secret.

use std::future::{Ready, ready};

use actix_identity::IdentityExt;
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{Error, FromRequest, HttpRequest, HttpResponse, error, web};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::domain::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;

pub fn decode_token(token: &str, secret: &str) -> jsonwebtoken::errors::Result<AuthenticatedUser> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<AuthenticatedUser>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

/// Signs claims the same way the auth service does.
pub fn encode_token(user: &AuthenticatedUser, secret: &str) -> jsonwebtoken::errors::Result<String> {
    encode(
        &Header::new(Algorithm::HS256),
        user,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

/// 401 pointing the client at the sign-in page.
fn unauthorized(config: &ServerConfig, reason: &'static str) -> Error {
    let response = HttpResponse::Unauthorized().json(serde_json::json!({
        "error": reason,
        "login_url": config.auth_service_url,
    }));
    error::InternalError::from_response(reason, response).into()
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, Error> {
    let config = req
        .app_data::<web::Data<ServerConfig>>()
        .ok_or_else(|| error::ErrorInternalServerError("server config is not registered"))?;

    // Bearer first; reading the identity requires `IdentityMiddleware`.
    let token = bearer_token(req)
        .or_else(|| match req.get_identity() {
            Ok(identity) => identity.id().ok(),
            Err(_) => None,
        })
        .ok_or_else(|| unauthorized(config, "missing session"))?;

    decode_token(&token, &config.secret).map_err(|err| {
        log::info!("Rejected session token: {err}");
        unauthorized(config, "invalid session")
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::Role;

    #[test]
    fn token_round_trips_through_secret() {
        let user = AuthenticatedUser {
            sub: "7".to_string(),
            email: "agent@example.com".to_string(),
            name: "Agent".to_string(),
            role: Role::Retention,
            exp: 4_102_444_800,
        };
        let token = encode_token(&user, "secret").unwrap();
        assert_eq!(decode_token(&token, "secret").unwrap(), user);
        assert!(decode_token(&token, "other").is_err());
    }
}
