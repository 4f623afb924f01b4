//! API server configuration
//!
//! `Config` is loaded from environment variables. At runtime it lives inside
//! a [`ConfigHandle`], which the lifecycle manager updates and every request
//! reads, so authorization changes apply without rebinding the listener.

use std::collections::HashSet;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use pear_remote_shared_config::{CommonConfig, Environment, ListenerConfig};
use tokio::sync::watch;

/// Minimum required length for API_SECRET to be considered secure
const MIN_SECRET_LENGTH: usize = 32;

/// Secret used outside production when none is configured
const DEVELOPMENT_SECRET: &str = "development-secret-change-in-production";

/// How callers of privileged endpoints are authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStrategy {
    /// Every caller is admitted without a credential
    NoAuth,
    /// Callers present a bearer token for an authorized client id
    #[default]
    Token,
}

impl FromStr for AuthStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::NoAuth),
            "token" | "auth_at_first" | "auth-at-first" => Ok(Self::Token),
            other => Err(format!("unknown auth strategy '{}'", other)),
        }
    }
}

impl std::fmt::Display for AuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAuth => write!(f, "none"),
            Self::Token => write!(f, "token"),
        }
    }
}

/// Authentication and authorization settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// Active strategy
    pub strategy: AuthStrategy,

    /// HS256 signing secret
    pub secret: String,

    /// Client ids allowed through the gate
    pub authorized_clients: HashSet<String>,
}

impl AuthSettings {
    /// Settings that admit every caller
    pub fn disabled() -> Self {
        Self {
            strategy: AuthStrategy::NoAuth,
            secret: DEVELOPMENT_SECRET.to_string(),
            authorized_clients: HashSet::new(),
        }
    }

    /// Token settings with the given secret and authorized client ids
    pub fn token<I, S>(secret: impl Into<String>, clients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            strategy: AuthStrategy::Token,
            secret: secret.into(),
            authorized_clients: clients.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether a client id is on the authorization list
    pub fn is_client_authorized(&self, client_id: &str) -> bool {
        self.authorized_clients.contains(client_id)
    }
}

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration (listener, environment, log level)
    pub common: CommonConfig,

    /// Authentication settings
    pub auth: AuthSettings,

    /// CORS allowed origins (optional)
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// In production with the token strategy, `API_SECRET` must be set and at
    /// least 32 characters long. Elsewhere an insecure default is used.
    pub fn from_env() -> Result<Self> {
        let environment = Environment::from_str(
            &env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        )
        .unwrap_or_default();

        let strategy = match env::var("API_AUTH_STRATEGY") {
            Ok(value) if !value.is_empty() => value
                .parse::<AuthStrategy>()
                .map_err(anyhow::Error::msg)
                .context("Invalid API_AUTH_STRATEGY value")?,
            _ => AuthStrategy::default(),
        };

        let secret = Self::load_secret(environment.is_production(), strategy)?;

        let common = CommonConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        Ok(Self {
            common,
            auth: AuthSettings {
                strategy,
                secret,
                authorized_clients: env::var("API_AUTHORIZED_CLIENTS")
                    .map(|s| parse_list(&s).into_iter().collect())
                    .unwrap_or_default(),
            },
            cors_allowed_origins: env::var("CORS_ORIGINS").ok().map(|s| parse_list(&s)),
        })
    }

    /// Build a configuration from parts (used by tests and embedders)
    pub fn new(listener: ListenerConfig, auth: AuthSettings) -> Self {
        Self {
            common: CommonConfig {
                listener,
                ..CommonConfig::default()
            },
            auth,
            cors_allowed_origins: None,
        }
    }

    /// Load and validate API_SECRET
    fn load_secret(is_production: bool, strategy: AuthStrategy) -> Result<String> {
        let needs_secret = is_production && strategy == AuthStrategy::Token;

        match env::var("API_SECRET") {
            Ok(secret) if !secret.is_empty() => {
                if needs_secret && secret.len() < MIN_SECRET_LENGTH {
                    bail!(
                        "API_SECRET must be at least {} characters in production (got {})",
                        MIN_SECRET_LENGTH,
                        secret.len()
                    );
                }
                Ok(secret)
            }
            _ if needs_secret => {
                bail!(
                    "API_SECRET environment variable is required in production. \
                     Please set a secure secret of at least {} characters.",
                    MIN_SECRET_LENGTH
                );
            }
            _ => {
                if strategy == AuthStrategy::Token {
                    tracing::warn!(
                        "API_SECRET not set, using insecure default. \
                         This is only acceptable in development mode."
                    );
                }
                Ok(DEVELOPMENT_SECRET.to_string())
            }
        }
    }

    /// Listener settings; equality of these decides whether a restart is needed
    pub fn listener(&self) -> &ListenerConfig {
        &self.common.listener
    }

    /// Get environment mode
    pub fn environment(&self) -> Environment {
        self.common.environment
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Shared, swappable view of the current configuration
///
/// Cloning is cheap; all clones observe the same value.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    tx: Arc<watch::Sender<Arc<Config>>>,
}

impl ConfigHandle {
    /// Create a handle holding the initial configuration
    pub fn new(config: Config) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(config));
        Self { tx: Arc::new(tx) }
    }

    /// Current configuration
    pub fn current(&self) -> Arc<Config> {
        self.tx.borrow().clone()
    }

    /// Replace the configuration, returning the previous one
    pub fn replace(&self, config: Config) -> Arc<Config> {
        self.tx.send_replace(Arc::new(config))
    }

    /// Modify the current configuration in place
    pub fn update(&self, f: impl FnOnce(&mut Config)) {
        self.tx.send_modify(|current| {
            let mut next = Config::clone(current);
            f(&mut next);
            *current = Arc::new(next);
        });
    }

    /// Subscribe to configuration changes
    pub fn subscribe(&self) -> watch::Receiver<Arc<Config>> {
        self.tx.subscribe()
    }
}
