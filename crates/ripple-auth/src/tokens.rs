use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use ripple_types::api::{AccessClaims, RefreshClaims};

/// Access tokens prove recent authentication and expire quickly.
pub const ACCESS_TOKEN_MINUTES: i64 = 15;

/// Refresh tokens exist only to mint new access tokens and define the
/// window within which silent renewal works.
pub const REFRESH_TOKEN_DAYS: i64 = 7;

/// Verification failure. Expiry, bad signature and malformed payloads are
/// deliberately indistinguishable to callers: the session middleware treats
/// all of them as "start over via the refresh token or re-login".
#[derive(Debug, Error)]
#[error("invalid or expired token")]
pub struct TokenError(#[from] jsonwebtoken::errors::Error);

pub fn issue_access_token(
    secret: &str,
    user_id: &str,
    username: &str,
    name: &str,
) -> Result<String, TokenError> {
    let claims = AccessClaims {
        sub: user_id.to_string(),
        username: username.to_string(),
        name: name.to_string(),
        exp: (Utc::now() + Duration::minutes(ACCESS_TOKEN_MINUTES)).timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

pub fn issue_refresh_token(
    secret: &str,
    user_id: &str,
    username: &str,
) -> Result<String, TokenError> {
    let claims = RefreshClaims {
        sub: user_id.to_string(),
        username: username.to_string(),
        exp: (Utc::now() + Duration::days(REFRESH_TOKEN_DAYS)).timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

pub fn verify_access(token: &str, secret: &str) -> Result<AccessClaims, TokenError> {
    let data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

pub fn verify_refresh(token: &str, secret: &str) -> Result<RefreshClaims, TokenError> {
    let data = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
