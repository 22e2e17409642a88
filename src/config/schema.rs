//! Configuration schema definitions.
//!
//! This module defines the persisted configuration of a node repository.
//! All types derive Serde traits for deserialization from `config.toml`.

use serde::{Deserialize, Serialize};

use crate::http::ServerConfig;

/// Root configuration stored in the node repository.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct DaemonConfig {
    /// Administrative API settings.
    pub api: ApiConfig,

    /// Peer-to-peer networking settings.
    pub swarm: SwarmConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Administrative API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address (e.g., "127.0.0.1:3453").
    pub address: String,

    /// URL prefix every administrative route is mounted under.
    pub path_prefix: String,

    /// Origins allowed to issue cross-origin requests. `*` allows any.
    pub access_control_allow_origin: Vec<String>,

    /// HTTP methods allowed for cross-origin requests.
    pub access_control_allow_methods: Vec<String>,

    /// Whether cross-origin requests may carry credentials.
    pub access_control_allow_credentials: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3453".to_string(),
            path_prefix: "/api".to_string(),
            access_control_allow_origin: vec![
                "http://localhost".to_string(),
                "http://127.0.0.1".to_string(),
            ],
            access_control_allow_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
            ],
            access_control_allow_credentials: false,
        }
    }
}

impl ApiConfig {
    /// Freeze the API section into the server configuration.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            address: self.address.clone(),
            path_prefix: self.path_prefix.clone(),
            allowed_origins: self.access_control_allow_origin.clone(),
            allowed_methods: self.access_control_allow_methods.clone(),
            allow_credentials: self.access_control_allow_credentials,
        }
    }
}

/// Peer-to-peer networking configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SwarmConfig {
    /// Multiaddr the swarm listens on.
    pub address: String,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            address: "/ip4/0.0.0.0/tcp/6000".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
