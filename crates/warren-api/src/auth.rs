//! Dashboard session authentication.
//!
//! Sessions are short-lived HS256 JWTs minted by the login flow and
//! presented as `Authorization: Bearer` on dashboard endpoints. They
//! are unrelated to license keys, which are ES256 tokens verified by
//! the licensing crate.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// Verified session claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id.
    pub sub: Uuid,
    /// Organization the user belongs to.
    pub org_id: Uuid,
    /// User email.
    pub email: String,
    /// Role within the organization, "owner" or "member".
    pub role: String,
    /// Expiry (Unix timestamp).
    pub exp: usize,
}

/// Signs and verifies session tokens.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    /// Keys derived from a shared HMAC secret.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Mint an 8-hour session token.
    pub fn create_token(
        &self,
        user_id: Uuid,
        org_id: Uuid,
        email: &str,
        role: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let expiration = (chrono::Utc::now() + chrono::Duration::hours(8)).timestamp() as usize;

        let claims = SessionClaims {
            sub: user_id,
            org_id,
            email: email.to_string(),
            role: role.to_string(),
            exp: expiration,
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Verify a session token.
    pub fn verify_token(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let data = decode::<SessionClaims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

/// Extractor for an authenticated dashboard session.
pub struct Session(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
        let claims = state
            .sessions
            .verify_token(token)
            .map_err(|_| ApiError::Unauthorized)?;
        Ok(Session(claims))
    }
}

impl Session {
    /// Require that the session belongs to the given organization.
    pub fn require_org(&self, org_id: Uuid) -> Result<(), ApiError> {
        if self.0.org_id == org_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    /// Require organization membership plus the owner role.
    pub fn require_owner(&self, org_id: Uuid) -> Result<(), ApiError> {
        self.require_org(org_id)?;
        if self.0.role == "owner" {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> SessionKeys {
        SessionKeys::from_secret(b"test-session-secret")
    }

    #[test]
    fn token_round_trips() {
        let keys = keys();
        let user = Uuid::new_v4();
        let org = Uuid::new_v4();
        let token = keys.create_token(user, org, "owner@acme.test", "owner").unwrap();

        let claims = keys.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.org_id, org);
        assert_eq!(claims.role, "owner");
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = keys()
            .create_token(Uuid::new_v4(), Uuid::new_v4(), "a@b.test", "member")
            .unwrap();
        let other = SessionKeys::from_secret(b"some-other-secret");
        assert!(other.verify_token(&token).is_err());
    }

    #[test]
    fn role_checks() {
        let org = Uuid::new_v4();
        let member = Session(SessionClaims {
            sub: Uuid::new_v4(),
            org_id: org,
            email: "m@acme.test".into(),
            role: "member".into(),
            exp: 0,
        });

        assert!(member.require_org(org).is_ok());
        assert!(matches!(
            member.require_org(Uuid::new_v4()),
            Err(ApiError::Forbidden)
        ));
        assert!(matches!(member.require_owner(org), Err(ApiError::Forbidden)));
    }
}
