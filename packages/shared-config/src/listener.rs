//! Listener configuration types
//!
//! `ListenerConfig` is the part of the configuration that decides how the
//! network listener is bound. Two configs comparing equal means an already
//! running listener can be kept as is.

use std::fmt;
use std::path::PathBuf;

use crate::{get_env_or_default, parse_env, ConfigError, ConfigResult};

/// Default port for the remote control API
pub const DEFAULT_PORT: u16 = 26538;

/// Default bind address
pub const DEFAULT_HOSTNAME: &str = "0.0.0.0";

/// Transport used by the listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportMode {
    /// Plain HTTP
    Plain,
    /// HTTPS with a PEM certificate chain and private key
    Tls { cert_path: PathBuf, key_path: PathBuf },
}

impl TransportMode {
    /// Check if this transport is encrypted
    pub fn is_tls(&self) -> bool {
        matches!(self, Self::Tls { .. })
    }

    /// URL scheme served by this transport
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Plain => "http",
            Self::Tls { .. } => "https",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Tls { .. } => write!(f, "tls"),
        }
    }
}

/// Network listener configuration
///
/// Equality covers exactly hostname, port, transport mode and the certificate
/// and key paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Hostname or IP address to bind
    pub hostname: String,

    /// TCP port to bind (0 picks an ephemeral port)
    pub port: u16,

    /// Plain or TLS transport
    pub transport: TransportMode,
}

impl ListenerConfig {
    /// Load listener configuration from environment variables
    ///
    /// TLS is only selected when `API_USE_HTTPS` is true and both
    /// `API_CERT_PATH` and `API_KEY_PATH` are set. HTTPS requested without
    /// both paths falls back to plain HTTP.
    pub fn from_env() -> ConfigResult<Self> {
        let hostname = get_env_or_default("API_HOSTNAME", DEFAULT_HOSTNAME);
        if hostname.trim().is_empty() {
            return Err(ConfigError::invalid(
                "API_HOSTNAME",
                "hostname cannot be empty",
            ));
        }

        let use_https: bool = parse_env("API_USE_HTTPS", false)?;
        let cert_path = std::env::var("API_CERT_PATH").ok().filter(|s| !s.is_empty());
        let key_path = std::env::var("API_KEY_PATH").ok().filter(|s| !s.is_empty());

        Ok(Self {
            hostname,
            port: parse_env("API_PORT", DEFAULT_PORT)?,
            transport: Self::transport_from_parts(use_https, cert_path, key_path),
        })
    }

    /// Build a plain HTTP listener configuration
    pub fn plain(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            transport: TransportMode::Plain,
        }
    }

    /// Build a TLS listener configuration
    pub fn tls(
        hostname: impl Into<String>,
        port: u16,
        cert_path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            transport: TransportMode::Tls {
                cert_path: cert_path.into(),
                key_path: key_path.into(),
            },
        }
    }

    fn transport_from_parts(
        use_https: bool,
        cert_path: Option<String>,
        key_path: Option<String>,
    ) -> TransportMode {
        match (use_https, cert_path, key_path) {
            (true, Some(cert), Some(key)) => TransportMode::Tls {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            },
            _ => TransportMode::Plain,
        }
    }

    /// `host:port` string suitable for binding
    pub fn bind_address(&self) -> String {
        if self.hostname.contains(':') && !self.hostname.starts_with('[') {
            format!("[{}]:{}", self.hostname, self.port)
        } else {
            format!("{}:{}", self.hostname, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self::plain(DEFAULT_HOSTNAME, DEFAULT_PORT)
    }
}

impl fmt::Display for ListenerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.transport.scheme(), self.bind_address())
    }
}
