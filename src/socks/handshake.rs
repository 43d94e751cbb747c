//! Method negotiation
//!
//! Reads the client greeting, picks an authentication strategy from the
//! server's table and runs its sub-negotiation.

use super::auth::AuthTable;
use super::codec::{decode_greeting, encode_method_selection};
use super::consts::SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE;
use super::types::AuthMethod;
use crate::error::ProxyError;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Negotiate and run authentication on a fresh client stream
///
/// When no offered method is supported the client receives `05 FF` and
/// [`ProxyError::UnsupportedAuthorizationType`] is returned.
pub async fn negotiate<S>(stream: &mut S, table: &AuthTable) -> Result<AuthMethod, ProxyError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let greeting = decode_greeting(stream).await?;
    debug!("Client offered auth methods: {:?}", greeting.methods);

    let Some(strategy) = table.select(&greeting.methods) else {
        if let Err(e) = send_selection(stream, SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE).await {
            debug!("Failed to send method rejection: {}", e);
        }
        return Err(ProxyError::UnsupportedAuthorizationType);
    };

    let method = strategy.method();
    send_selection(stream, method.to_byte()).await?;

    strategy.negotiate(stream).await?;
    debug!("Authentication completed with method: {}", method);

    Ok(method)
}

async fn send_selection<S>(stream: &mut S, method: u8) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(&encode_method_selection(method)).await?;
    stream.flush().await
}
