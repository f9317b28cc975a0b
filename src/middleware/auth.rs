//! Bearer-token verification for user-facing routes
//!
//! Tokens are HS256 JWTs issued by the user service. Only verification
//! happens here; the raw `Authorization` value is kept so it can be forwarded
//! to collaborators acting on the user's behalf.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::UserId};

/// Token subject, issued either as a string or a number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    Id(UserId),
    Text(String),
}

impl Subject {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Subject::Id(id) => Some(*id),
            Subject::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Claims read from an access token; any others are ignored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Subject,
    pub exp: i64,
}

/// Verifies access tokens against the shared HMAC secret
#[derive(Clone)]
pub struct JwtVerifier {
    key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(Validation::new(Algorithm::HS256)),
        }
    }

    /// Validates signature and expiry, returning the token's user id
    pub fn verify(&self, token: &str) -> Result<UserId, AppError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::Unauthorized("Token has expired".to_string()),
                _ => AppError::Unauthorized("Invalid token".to_string()),
            }
        })?;

        data.claims
            .sub
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("Invalid token subject".to_string()))
    }
}

/// Authenticated caller of a route
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    /// Verbatim `Authorization` header value
    pub authorization: String,
}

/// Extracts the token from a `Bearer <token>` header value
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    JwtVerifier: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authorization = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization Header".to_string()))?;

        let token = bearer_token(authorization).ok_or_else(|| {
            AppError::Unauthorized("Authorization header must be 'Bearer <token>'".to_string())
        })?;

        let user_id = JwtVerifier::from_ref(state).verify(token)?;

        Ok(AuthUser {
            user_id,
            authorization: authorization.to_string(),
        })
    }
}
