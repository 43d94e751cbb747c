//! No authentication handler

use crate::error::ProxyError;
use tokio::io::{AsyncRead, AsyncWrite};

/// No authentication handler
///
/// The `05 00` method selection sent by the negotiator is the whole
/// exchange, so there is nothing left to read or write.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl NoAuth {
    /// Perform "authentication" (which does nothing)
    pub async fn negotiate<S>(&self, _stream: &mut S) -> Result<(), ProxyError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        Ok(())
    }
}
