//! Username/password authentication handler
//!
//! Implements RFC 1929 username/password authentication for SOCKS5.

use super::CredentialVerifier;
use crate::error::ProxyError;
use crate::socks::codec::{decode_user_pass_auth, encode_auth_result, Credentials};
use crate::socks::consts::SOCKS5_AUTH_VERSION;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Username/password authentication handler
#[derive(Debug, Clone)]
pub struct PasswordAuth {
    verifier: Arc<dyn CredentialVerifier>,
}

impl PasswordAuth {
    /// Create a handler that checks credentials with `verifier`
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        PasswordAuth { verifier }
    }

    /// Perform username/password authentication
    ///
    /// Reads the credential message, asks the verifier, and answers with
    /// `01 00` on success or `01 01` on failure. A malformed credential
    /// message is answered with `01 01` too.
    pub async fn negotiate<S>(&self, stream: &mut S) -> Result<(), ProxyError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let credentials = match decode_user_pass_auth(stream).await {
            Ok(credentials) => credentials,
            Err(ProxyError::Malformed(reason)) => {
                send_auth_result(stream, false).await?;
                return Err(ProxyError::Authentication(reason));
            }
            Err(e) => return Err(e),
        };

        if self.verifier.verify(&credentials).await {
            send_auth_result(stream, true).await?;
            debug!(
                "Authentication successful for user: {}",
                credentials.username_lossy()
            );
            Ok(())
        } else {
            send_auth_result(stream, false).await?;
            Err(ProxyError::Authentication(format!(
                "invalid credentials for user: {}",
                credentials.username_lossy()
            )))
        }
    }
}

/// Send authentication result to client
async fn send_auth_result<S: AsyncWrite + Unpin>(
    stream: &mut S,
    success: bool,
) -> Result<(), ProxyError> {
    stream
        .write_all(&encode_auth_result(SOCKS5_AUTH_VERSION, success))
        .await?;
    stream.flush().await?;
    Ok(())
}

/// In-memory user table
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    users: HashMap<Vec<u8>, Vec<u8>>,
}

impl StaticCredentials {
    /// Create an empty user table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user
    pub fn with_user(mut self, username: impl Into<Vec<u8>>, password: impl Into<Vec<u8>>) -> Self {
        self.users.insert(username.into(), password.into());
        self
    }

    /// Number of configured users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// True if no user is configured
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentials {
    async fn verify(&self, credentials: &Credentials) -> bool {
        self.users
            .get(&credentials.username)
            .is_some_and(|password| *password == credentials.password)
    }
}
