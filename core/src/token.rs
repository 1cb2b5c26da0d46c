//! Signed identity tokens.
//!
//! Tokens are HS256 JWTs. The account's custom claims are flattened into the
//! top level of the payload next to the registered claims, so a token for an
//! administrator carries `"isAdmin": true` directly. A token is a snapshot:
//! changing an account's claims does nothing to tokens already minted.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::claims::ClaimSet;
use crate::directory::Account;

/// Registered claim names. Custom claims with these names are dropped when a
/// token is signed so the payload never carries a key twice.
pub const RESERVED_CLAIMS: [&str; 7] = ["sub", "email", "iat", "exp", "iss", "aud", "nbf"];

/// Payload of a verified token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedToken {
    /// Account id.
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
    #[serde(flatten)]
    pub claims: ClaimSet,
}

impl DecodedToken {
    pub fn is_admin(&self) -> bool {
        self.claims.is_admin()
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            JwtErrorKind::ExpiredSignature => TokenError::Expired,
            JwtErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Shared-secret keys used to mint and verify tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Mints a token carrying the account's current claims.
    pub fn issue(&self, account: &Account, ttl: Duration) -> Result<String, TokenError> {
        let iat = Utc::now().timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let payload = DecodedToken {
            sub: account.uid.clone(),
            email: Some(account.email.clone()),
            iat,
            exp: iat.saturating_add(ttl_secs),
            claims: account.custom_claims.clone(),
        };
        self.sign(&payload)
    }

    /// Signs an arbitrary payload. Entries of `payload.claims` named in
    /// [`RESERVED_CLAIMS`] are left out.
    pub fn sign(&self, payload: &DecodedToken) -> Result<String, TokenError> {
        let mut payload = payload.clone();
        payload
            .claims
            .retain(|name, _| !RESERVED_CLAIMS.contains(&name));
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &payload, &self.encoding)
            .map_err(|err| TokenError::Signing(err.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<DecodedToken, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        let data = jsonwebtoken::decode::<DecodedToken>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys").finish_non_exhaustive()
    }
}
