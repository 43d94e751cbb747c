//! Server configuration types
//!
//! Defines the main configuration structures for the proxy server.

use super::TcpConfig;
use crate::socks::consts::{DEFAULT_CONNECT_TIMEOUT_MS, MAX_FIELD_LEN};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Listener and outbound settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Authentication settings
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.auth.validate()
    }
}

/// Default listen address
fn default_listen() -> String {
    "127.0.0.1:1080".to_string()
}

/// Default outbound connect timeout in milliseconds
fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Listener and outbound connection configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address to accept SOCKS5 clients on (e.g., "127.0.0.1:1080")
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Outbound connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Outbound socket options
    #[serde(default)]
    pub tcp: TcpConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            connect_timeout_ms: default_connect_timeout_ms(),
            tcp: TcpConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Outbound connect timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.connect_timeout_ms == 0 {
            return Err("connect_timeout_ms must be greater than 0".to_string());
        }
        if self.listen.trim().is_empty() {
            return Err("listen address must not be empty".to_string());
        }
        Ok(())
    }
}

fn default_allow_no_auth() -> bool {
    true
}

/// A username/password pair accepted by the server
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UserConfig {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl std::fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authentication configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    /// Offer the no-authentication method
    #[serde(default = "default_allow_no_auth")]
    pub allow_no_auth: bool,

    /// Users for username/password authentication; empty disables the method
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            allow_no_auth: default_allow_no_auth(),
            users: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Check if any username/password credentials are configured
    pub fn has_credentials(&self) -> bool {
        !self.users.is_empty()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.allow_no_auth && !self.has_credentials() {
            return Err(
                "No authentication method enabled: allow no-auth or configure users".to_string(),
            );
        }
        for user in &self.users {
            if user.username.is_empty() || user.username.len() > MAX_FIELD_LEN {
                return Err(format!(
                    "Username must be 1 to {} bytes: {:?}",
                    MAX_FIELD_LEN, user.username
                ));
            }
            if user.password.is_empty() || user.password.len() > MAX_FIELD_LEN {
                return Err(format!(
                    "Password for {:?} must be 1 to {} bytes",
                    user.username, MAX_FIELD_LEN
                ));
            }
        }
        Ok(())
    }
}
