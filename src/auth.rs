//! Bearer-token authentication.
//!
//! Tokens are issued elsewhere; this module only validates them.

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Issuer claim carried by access tokens.
pub const ACCESS_TOKEN_ISSUER: &str = "tubely-access";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,
    #[error("Malformed Authorization header")]
    MalformedHeader,
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid user ID in token")]
    InvalidSubject,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn get_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::MalformedHeader)?;

    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

/// Validate an HS256 access token and return the user it was issued to.
pub fn validate_jwt(token: &str, secret: &str) -> Result<Uuid, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ACCESS_TOKEN_ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidSubject)
}
