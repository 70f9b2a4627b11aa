use chrono::{DateTime, Utc};
use examprep_api::ApiError;
use examprep_model::Role;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::error;

use crate::error::ApiFailure;

/// Identity carried by every bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signer and verifier sharing one secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(
        &self,
        id: &str,
        role: Role,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, ApiFailure> {
        let iat = now.timestamp();
        let claims = Claims {
            id: id.to_string(),
            role,
            iat,
            exp: iat.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            error!("token signing failed: {e}");
            ApiFailure(ApiError::internal())
        })
    }

    /// Signature and expiry are both checked.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let issuer = TokenIssuer::new("unit-test-secret");
        let token = issuer
            .issue("abc", Role::Admin, Duration::from_secs(60), Utc::now())
            .expect("issue");
        let claims = issuer.verify(&token).expect("verify");
        assert_eq!(claims.id, "abc");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn foreign_secret_and_expired_tokens_are_rejected() {
        let issuer = TokenIssuer::new("unit-test-secret");
        let other = TokenIssuer::new("other-secret");
        let token = other
            .issue("abc", Role::Student, Duration::from_secs(60), Utc::now())
            .expect("issue");
        assert!(issuer.verify(&token).is_err());

        let stale = issuer
            .issue(
                "abc",
                Role::Student,
                Duration::from_secs(60),
                Utc::now() - chrono::Duration::hours(2),
            )
            .expect("issue");
        assert!(issuer.verify(&stale).is_err());
        assert!(issuer.verify("not-a-jwt").is_err());
    }
}
