//! Bearer credential claims

use serde::{Deserialize, Serialize};

/// Claims carried by a client credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Client identifier checked against the authorization list
    pub id: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Optional expiry (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    /// Claims for a client issued now
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            iat: chrono::Utc::now().timestamp(),
            exp: None,
        }
    }
}
