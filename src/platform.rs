//! Bridge to the trading platform's identity service.

use std::future::Future;

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::types::{Balance, EmailAddress, PlatformUserId, TypeConstraintError};
use crate::models::config::ServerConfig;

const PASSWORD_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";
pub const GENERATED_PASSWORD_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("platform rejected the signup ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("platform response carried no user id")]
    MissingUserId,
}

/// Identity to create on the trading platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSignup {
    pub email: EmailAddress,
    pub password: String,
    pub full_name: String,
}

pub trait PlatformIdentityProvider {
    fn sign_up(
        &self,
        signup: &PlatformSignup,
    ) -> impl Future<Output = Result<PlatformUserId, PlatformError>>;
}

/// Random password drawn from letters, digits and `!@#$%`.
pub fn generate_password() -> String {
    let mut rng = rand::rng();
    (0..GENERATED_PASSWORD_LEN)
        .filter_map(|_| PASSWORD_ALPHABET.choose(&mut rng).copied())
        .map(char::from)
        .collect()
}

#[derive(Serialize)]
struct SignupMetadata<'a> {
    role: &'a str,
    source: &'a str,
    full_name: &'a str,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignupMetadata<'a>,
}

#[derive(Deserialize)]
struct SignupUser {
    id: String,
}

/// The endpoint answers with the user itself, or with a session wrapping it
/// when email confirmation is disabled.
#[derive(Deserialize)]
struct SignupResponse {
    id: Option<String>,
    user: Option<SignupUser>,
}

impl SignupResponse {
    fn user_id(self) -> Option<String> {
        self.user.map(|user| user.id).or(self.id)
    }
}

/// Calls `POST {base_url}/auth/v1/signup` with the service api key.
#[derive(Clone)]
pub struct HttpPlatformIdentity {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpPlatformIdentity {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

impl PlatformIdentityProvider for HttpPlatformIdentity {
    async fn sign_up(&self, signup: &PlatformSignup) -> Result<PlatformUserId, PlatformError> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        let body = SignupRequest {
            email: signup.email.as_str(),
            password: &signup.password,
            data: SignupMetadata {
                role: "user",
                source: "crm",
                full_name: &signup.full_name,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            log::error!("Platform signup failed with {status}: {message}");
            return Err(PlatformError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = response.json::<SignupResponse>().await?;
        let id = parsed.user_id().ok_or(PlatformError::MissingUserId)?;
        PlatformUserId::new(id).map_err(|_| PlatformError::MissingUserId)
    }
}

/// Platform client and registration defaults, resolved once at startup.
#[derive(Clone)]
pub struct PlatformBridge {
    pub identity: HttpPlatformIdentity,
    /// Main-wallet balance of a freshly registered lead.
    pub initial_balance: Balance,
}

impl PlatformBridge {
    pub fn from_config(config: &ServerConfig) -> Result<Self, TypeConstraintError> {
        Ok(Self {
            identity: HttpPlatformIdentity::new(
                config.platform_auth_url.as_str(),
                config.platform_api_key.as_str(),
            ),
            initial_balance: config.platform_initial_balance.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_password_uses_allowed_alphabet() {
        let password = generate_password();
        assert_eq!(password.len(), GENERATED_PASSWORD_LEN);
        assert!(password.bytes().all(|b| PASSWORD_ALPHABET.contains(&b)));
    }

    #[test]
    fn signup_response_accepts_both_shapes() {
        let bare: SignupResponse = serde_json::from_str(r#"{"id":"u-1","email":"a@b.c"}"#).unwrap();
        assert_eq!(bare.user_id().as_deref(), Some("u-1"));

        let session: SignupResponse =
            serde_json::from_str(r#"{"access_token":"t","user":{"id":"u-2"}}"#).unwrap();
        assert_eq!(session.user_id().as_deref(), Some("u-2"));

        let empty: SignupResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.user_id(), None);
    }
}
