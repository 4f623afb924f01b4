//! Auth Gate
//!
//! Two middlewares guard every privileged route, in this order:
//!
//! 1. [`authenticate`] verifies a bearer credential (from the `Authorization`
//!    header or a `token` query parameter) and stores the outcome as an
//!    [`Authentication`] request extension. It never rejects.
//! 2. [`authorize`] lets the request through iff [`is_authorized`] holds,
//!    otherwise answers 401 without running the handler.
//!
//! Both read the current configuration on every request, so strategy, secret
//! and authorization list changes apply without a listener restart.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, Request, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::config::{AuthSettings, AuthStrategy};
use crate::error::ApiError;
use crate::models::Claims;
use crate::services::TokenService;
use crate::state::AppState;

/// Why a request carries no verified identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialFailure {
    /// No bearer credential was presented
    Missing,
    /// A credential was presented but did not verify
    Invalid(String),
}

/// Outcome of the authentication step, stored in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// Authentication is disabled
    Anonymous,
    /// Credential verified
    Verified(Claims),
    /// Credential missing or invalid
    Unauthenticated(CredentialFailure),
}

impl Authentication {
    /// Client id of a verified credential
    pub fn client_id(&self) -> Option<&str> {
        match self {
            Self::Verified(claims) => Some(&claims.id),
            _ => None,
        }
    }
}

/// Authorization law
///
/// Admitted iff authentication is disabled, or the credential verified and
/// its client id is on the authorization list.
pub fn is_authorized(settings: &AuthSettings, authentication: &Authentication) -> bool {
    if settings.strategy == AuthStrategy::NoAuth {
        return true;
    }
    match authentication {
        Authentication::Verified(claims) => settings.is_client_authorized(&claims.id),
        Authentication::Anonymous | Authentication::Unauthenticated(_) => false,
    }
}

/// Verify the request's credential against the given settings
pub fn authenticate_credential(settings: &AuthSettings, token: Option<&str>) -> Authentication {
    if settings.strategy == AuthStrategy::NoAuth {
        return Authentication::Anonymous;
    }

    let Some(token) = token else {
        return Authentication::Unauthenticated(CredentialFailure::Missing);
    };

    match TokenService::new(&settings.secret).verify(token) {
        Ok(claims) => Authentication::Verified(claims),
        Err(e) => Authentication::Unauthenticated(CredentialFailure::Invalid(e.to_string())),
    }
}

/// Authentication middleware
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let config = state.config.current();

    let token = extract_credential(request.headers(), request.uri());
    let authentication = authenticate_credential(&config.auth, token.as_deref());

    if let Authentication::Unauthenticated(failure) = &authentication {
        tracing::debug!(failure = ?failure, path = %request.uri().path(), "No verified identity");
    }

    request.extensions_mut().insert(authentication);
    next.run(request).await
}

/// Authorization middleware
///
/// Must run after [`authenticate`]; a request without an authentication
/// outcome is treated as carrying no credential.
pub async fn authorize(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let config = state.config.current();

    let authorized = match request.extensions().get::<Authentication>() {
        Some(authentication) => is_authorized(&config.auth, authentication),
        None => is_authorized(
            &config.auth,
            &Authentication::Unauthenticated(CredentialFailure::Missing),
        ),
    };

    if authorized {
        next.run(request).await
    } else {
        // Missing and invalid credentials look the same to the caller
        ApiError::Unauthorized.into_response()
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Bearer credential from the `Authorization` header, falling back to the
/// `token` query parameter
fn extract_credential(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token.to_string());
    }

    Query::<TokenQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(query)| query.token)
        .filter(|token| !token.is_empty())
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())?;

    // Split on whitespace and validate scheme case-insensitively
    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;

    // Reject malformed values like "Bearer <token> <extra>"
    if parts.next().is_some() {
        return None;
    }

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;
    use rstest::rstest;

    fn settings() -> AuthSettings {
        AuthSettings::token("s", ["alice"])
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[rstest]
    #[case("Bearer abc", Some("abc"))]
    #[case("bearer abc", Some("abc"))]
    #[case("BEARER abc", Some("abc"))]
    #[case("Basic abc", None)]
    #[case("Bearer", None)]
    #[case("Bearer abc extra", None)]
    fn test_extract_bearer_token(#[case] value: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract_bearer_token(&headers(value)), expected);
    }

    #[test]
    fn test_query_token_fallback() {
        let uri: Uri = "/api/v1/ws?token=abc".parse().unwrap();
        assert_eq!(
            extract_credential(&HeaderMap::new(), &uri),
            Some("abc".to_string())
        );

        let uri: Uri = "/api/v1/ws?token=".parse().unwrap();
        assert_eq!(extract_credential(&HeaderMap::new(), &uri), None);

        let uri: Uri = "/api/v1/ws?token=from-query".parse().unwrap();
        assert_eq!(
            extract_credential(&headers("Bearer from-header"), &uri),
            Some("from-header".to_string())
        );
    }

    #[test]
    fn test_no_auth_is_anonymous() {
        let settings = AuthSettings::disabled();
        let authentication = authenticate_credential(&settings, None);
        assert_eq!(authentication, Authentication::Anonymous);
        assert!(is_authorized(&settings, &authentication));
    }

    #[test]
    fn test_missing_credential_is_rejected() {
        let authentication = authenticate_credential(&settings(), None);
        assert_matches!(
            authentication,
            Authentication::Unauthenticated(CredentialFailure::Missing)
        );
        assert!(!is_authorized(&settings(), &authentication));
    }

    #[test]
    fn test_invalid_credential_is_rejected() {
        let authentication = authenticate_credential(&settings(), Some("garbage"));
        assert_matches!(
            authentication,
            Authentication::Unauthenticated(CredentialFailure::Invalid(_))
        );
        assert!(!is_authorized(&settings(), &authentication));
    }

    #[rstest]
    #[case("alice", true)]
    #[case("bob", false)]
    fn test_authorization_list(#[case] client: &str, #[case] expected: bool) {
        let token = TokenService::new("s").issue(client).unwrap();
        let authentication = authenticate_credential(&settings(), Some(&token));
        assert_eq!(authentication.client_id(), Some(client));
        assert_eq!(is_authorized(&settings(), &authentication), expected);
    }

    #[test]
    fn test_wrong_secret_fails_even_for_listed_client() {
        let token = TokenService::new("other").issue("alice").unwrap();
        let authentication = authenticate_credential(&settings(), Some(&token));
        assert!(!is_authorized(&settings(), &authentication));
    }

    #[test]
    fn test_law_holds_for_all_combinations() {
        let strategies = [AuthStrategy::NoAuth, AuthStrategy::Token];
        let outcomes = [
            Authentication::Anonymous,
            Authentication::Verified(Claims::new("alice")),
            Authentication::Verified(Claims::new("bob")),
            Authentication::Unauthenticated(CredentialFailure::Missing),
            Authentication::Unauthenticated(CredentialFailure::Invalid("x".into())),
        ];

        for strategy in strategies {
            let settings = AuthSettings {
                strategy,
                ..settings()
            };
            for outcome in &outcomes {
                let expected = strategy == AuthStrategy::NoAuth
                    || outcome
                        .client_id()
                        .is_some_and(|id| settings.authorized_clients.contains(id));
                assert_eq!(is_authorized(&settings, outcome), expected);
            }
        }
    }
}
