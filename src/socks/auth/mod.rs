//! SOCKS5 authentication module
//!
//! Each supported method is an [`AuthStrategy`] variant. The server builds
//! one immutable [`AuthTable`] at startup and every session picks its
//! strategy from it once, after method negotiation.

mod none;
mod password;

pub use none::NoAuth;
pub use password::{PasswordAuth, StaticCredentials};

use super::codec::Credentials;
use super::types::AuthMethod;
use crate::error::ProxyError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// External check for username/password pairs
#[async_trait]
pub trait CredentialVerifier: Send + Sync + Debug {
    /// Return true if the credentials are accepted
    async fn verify(&self, credentials: &Credentials) -> bool;
}

/// A runnable authentication method
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// No authentication
    NoAuth(NoAuth),
    /// RFC 1929 username/password
    UserPass(PasswordAuth),
}

impl AuthStrategy {
    /// Method identifier this strategy answers to
    pub fn method(&self) -> AuthMethod {
        match self {
            AuthStrategy::NoAuth(_) => AuthMethod::NoAuth,
            AuthStrategy::UserPass(_) => AuthMethod::UserPass,
        }
    }

    /// Run the method-specific sub-negotiation
    pub async fn negotiate<S>(&self, stream: &mut S) -> Result<(), ProxyError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        match self {
            AuthStrategy::NoAuth(auth) => auth.negotiate(stream).await,
            AuthStrategy::UserPass(auth) => auth.negotiate(stream).await,
        }
    }
}

/// Method id to strategy mapping, read-only once built
#[derive(Debug, Clone, Default)]
pub struct AuthTable {
    strategies: BTreeMap<AuthMethod, AuthStrategy>,
}

impl AuthTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the no-authentication method
    pub fn with_no_auth(mut self) -> Self {
        self.strategies
            .insert(AuthMethod::NoAuth, AuthStrategy::NoAuth(NoAuth));
        self
    }

    /// Enable username/password authentication backed by `verifier`
    pub fn with_user_pass(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.strategies.insert(
            AuthMethod::UserPass,
            AuthStrategy::UserPass(PasswordAuth::new(verifier)),
        );
        self
    }

    /// Methods this table supports, in ascending id order
    pub fn methods(&self) -> Vec<AuthMethod> {
        self.strategies.keys().copied().collect()
    }

    /// Pick the strategy with the lowest method id among those offered
    pub fn select(&self, offered: &[u8]) -> Option<&AuthStrategy> {
        self.strategies
            .values()
            .filter(|strategy| offered.contains(&strategy.method().to_byte()))
            .min_by_key(|strategy| strategy.method().to_byte())
    }
}
