//! Credential minting and verification
//!
//! Credentials are stateless HS256 JWTs binding a client id. Verification
//! proves the signature (and expiry, when present); whether the client is
//! allowed in is decided by the authorization list, not here.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::error::{ApiError, ApiResult};
use crate::models::Claims;

/// Issues and verifies client credentials
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// Credential lifetime; `None` issues credentials without expiry
    ttl: Option<Duration>,
}

impl TokenService {
    /// Create a token service for the given signing secret
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: None,
        }
    }

    /// Issue credentials that expire after `ttl`
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Mint a credential for a client id
    pub fn issue(&self, client_id: &str) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            id: client_id.to_string(),
            iat: now.timestamp(),
            exp: self.ttl.map(|ttl| (now + ttl).timestamp()),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify a credential and return its claims
    ///
    /// Only HS256 is accepted. `exp` is optional but enforced when present.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Credential verification failed");
            ApiError::InvalidToken(e.to_string())
        })?;

        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_issue_and_verify() {
        let service = TokenService::new("s");
        let token = service.issue("alice").unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.id, "alice");
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = TokenService::new("s").issue("alice").unwrap();
        let result = TokenService::new("other").verify(&token);
        assert_matches!(result, Err(ApiError::InvalidToken(_)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = TokenService::new("s").with_ttl(Duration::seconds(-120));
        let token = service.issue("alice").unwrap();
        assert_matches!(service.verify(&token), Err(ApiError::InvalidToken(_)));
    }

    #[test]
    fn test_ttl_sets_expiry() {
        let service = TokenService::new("s").with_ttl(Duration::minutes(10));
        let token = service.issue("alice").unwrap();
        let claims = service.verify(&token).unwrap();
        assert!(claims.exp.unwrap() > claims.iat);
    }

    #[test]
    fn test_other_algorithm_is_rejected() {
        let claims = Claims::new("alice");
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"s"),
        )
        .unwrap();
        assert_matches!(
            TokenService::new("s").verify(&token),
            Err(ApiError::InvalidToken(_))
        );
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_matches!(
            TokenService::new("s").verify("not-a-jwt"),
            Err(ApiError::InvalidToken(_))
        );
    }
}
