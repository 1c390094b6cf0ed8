//! Session tokens and the authenticated-employee extractor.
//!
//! Tokens are HS256 JWTs signed with the configured shared secret. The
//! claims carry the employee id (`sub`), the username and the expiry.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use perk_core::{Employee, EmployeeId};

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims for session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the employee id, as a string.
    pub sub: String,
    /// The employee's username.
    pub username: String,
    /// Expiration time (unix seconds).
    pub exp: i64,
}

/// Issues and verifies session tokens.
pub struct TokenProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenProvider {
    /// Create a provider from the shared secret.
    #[must_use]
    pub fn new(secret: &str, lifetime_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::hours(lifetime_hours),
        }
    }

    /// Issue a token for an authenticated employee.
    ///
    /// # Errors
    ///
    /// Returns an internal error if signing fails.
    pub fn issue(&self, employee: &Employee) -> Result<String, ApiError> {
        let claims = Claims {
            sub: employee.id.to_string(),
            username: employee.username.clone(),
            exp: (Utc::now() + self.lifetime).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
    }

    /// Verify a bearer token and extract the identity claims.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for an invalid or expired token.
    pub fn verify(&self, token: &str) -> Result<AuthEmployee, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                tracing::debug!(error = %e, "JWT validation failed");
                ApiError::Unauthorized
            })?;

        let employee_id = data
            .claims
            .sub
            .parse::<EmployeeId>()
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthEmployee {
            employee_id,
            username: data.claims.username,
        })
    }
}

/// An authenticated employee extracted from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthEmployee {
    /// The employee id from the token subject.
    pub employee_id: EmployeeId,
    /// The username claim.
    pub username: String,
}

impl FromRequestParts<Arc<AppState>> for AuthEmployee {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            // Extract the Authorization header
            let auth_header = parts
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthorized)?;

            // Extract the Bearer token
            let token = auth_header
                .strip_prefix("Bearer ")
                .ok_or(ApiError::Unauthorized)?;

            state.tokens.verify(token)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee() -> Employee {
        Employee {
            id: EmployeeId::new(7),
            username: "alice".into(),
            password_hash: "hash".into(),
            balance: 1000,
        }
    }

    #[test]
    fn issue_then_verify_roundtrip() {
        let provider = TokenProvider::new("secret", 72);
        let token = provider.issue(&employee()).unwrap();

        let auth = provider.verify(&token).unwrap();
        assert_eq!(auth.employee_id, EmployeeId::new(7));
        assert_eq!(auth.username, "alice");
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let provider = TokenProvider::new("secret", 72);
        let token = provider.issue(&employee()).unwrap();

        let other = TokenProvider::new("other-secret", 72);
        assert!(matches!(
            other.verify(&token),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let provider = TokenProvider::new("secret", -1);
        let token = provider.issue(&employee()).unwrap();

        assert!(matches!(
            provider.verify(&token),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn verify_rejects_garbage() {
        let provider = TokenProvider::new("secret", 72);
        assert!(matches!(
            provider.verify("not-a-token"),
            Err(ApiError::Unauthorized)
        ));
    }
}
