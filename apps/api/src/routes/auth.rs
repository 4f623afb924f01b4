//! Credential endpoint
//!
//! - `POST /auth/:id` - Mint a bearer credential for a client id
//!
//! Clients already on the authorization list get a credential straight away.
//! Others are put to the user through the player (an approval prompt); an
//! approved client is added to the live authorization list. With the `none`
//! strategy no credential is needed and the endpoint answers 403.

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use crate::config::AuthStrategy;
use crate::error::{ApiError, ApiResult};
use crate::services::player::APPROVAL_TIMEOUT;
use crate::services::{PlayerCommand, TokenService};
use crate::state::AppState;

/// Credential response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Create the credential router
pub fn auth_router() -> Router<AppState> {
    Router::new().route("/:id", post(request_token))
}

/// Validate client id format
fn validate_client_id(client_id: &str) -> Result<(), &'static str> {
    if client_id.is_empty() {
        return Err("client id cannot be empty");
    }
    if client_id.len() > 128 {
        return Err("client id must be at most 128 characters");
    }
    if !client_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err("client id contains invalid characters");
    }
    Ok(())
}

/// Mint a credential for a client
///
/// # Response
/// - 200 OK: `{accessToken}`
/// - 400 Bad Request: malformed client id
/// - 403 Forbidden: strategy is `none`, or the user declined the client
/// - 503/504: the player could not be asked
async fn request_token(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> ApiResult<Json<AccessTokenResponse>> {
    validate_client_id(&client_id).map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let config = state.config.current();
    if config.auth.strategy == AuthStrategy::NoAuth {
        return Err(ApiError::Forbidden(
            "authentication is disabled, no credential is needed".to_string(),
        ));
    }

    if !config.auth.is_client_authorized(&client_id) {
        let answer = state
            .player
            .request_with_timeout(
                PlayerCommand::AuthorizeClient {
                    client_id: client_id.clone(),
                },
                APPROVAL_TIMEOUT,
            )
            .await?;

        if answer != Value::Bool(true) {
            tracing::info!(client_id = %client_id, "Client authorization declined");
            return Err(ApiError::Forbidden("client was not approved".to_string()));
        }

        state.config.update(|config| {
            config.auth.authorized_clients.insert(client_id.clone());
        });
        tracing::info!(client_id = %client_id, "Client authorized");
    }

    // Sign with the secret current at issue time
    let secret = state.config.current().auth.secret.clone();
    let access_token = TokenService::new(&secret).issue(&client_id)?;

    Ok(Json(AccessTokenResponse { access_token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_client_id_valid() {
        assert!(validate_client_id("phone-123").is_ok());
        assert!(validate_client_id("web_ui.v2").is_ok());
        assert!(validate_client_id("a").is_ok());
    }

    #[test]
    fn test_validate_client_id_empty() {
        assert!(validate_client_id("").is_err());
    }

    #[test]
    fn test_validate_client_id_too_long() {
        assert!(validate_client_id(&"a".repeat(129)).is_err());
        assert!(validate_client_id(&"a".repeat(128)).is_ok());
    }

    #[test]
    fn test_validate_client_id_invalid_chars() {
        assert!(validate_client_id("client<script>").is_err());
        assert!(validate_client_id("client/path").is_err());
        assert!(validate_client_id("client id").is_err());
        assert!(validate_client_id("café").is_err());
        assert!(validate_client_id("客户端").is_err());
    }
}
