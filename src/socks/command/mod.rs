//! SOCKS5 command dispatch
//!
//! Decodes the connection request and runs the matching command handler.
//! Only CONNECT is implemented; failure replies are left to the caller,
//! which maps the returned [`ProxyError`] to its reply code.

mod reply;

pub use reply::{send_failure, send_reply, send_success};

use crate::error::ProxyError;
use crate::socks::codec::{decode_connection_request, ConnectionRequest};
use crate::socks::types::{AddressType, SocksCommand, TargetAddr};
use crate::transport::Dialer;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

/// Outbound side of a successful CONNECT
#[derive(Debug)]
pub struct Upstream<T> {
    /// Connected upstream stream
    pub stream: T,
    /// Requested destination
    pub target: TargetAddr,
    /// Address type of the request
    pub address_type: AddressType,
    /// Local endpoint of the outbound socket, echoed to the client
    pub bound: SocketAddr,
}

/// Read the connection request and execute it
///
/// On success the Success reply has already been written to `stream`.
pub async fn dispatch<S, D>(
    stream: &mut S,
    dialer: &D,
    connect_timeout: Duration,
) -> Result<Upstream<D::Stream>, ProxyError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    D: Dialer,
{
    let request = decode_connection_request(stream).await?;
    info!("SOCKS5 {} request to {}", request.command, request.target);

    match request.command {
        SocksCommand::Connect => handle_connect(stream, request, dialer, connect_timeout).await,
        SocksCommand::Bind | SocksCommand::UdpAssociate => {
            Err(ProxyError::UnsupportedCommand(request.command.to_byte()))
        }
    }
}

/// Handle TCP CONNECT
///
/// Dials the destination once within `connect_timeout` and reports the
/// outbound socket's local endpoint in the Success reply.
async fn handle_connect<S, D>(
    stream: &mut S,
    request: ConnectionRequest,
    dialer: &D,
    connect_timeout: Duration,
) -> Result<Upstream<D::Stream>, ProxyError>
where
    S: AsyncWrite + Unpin,
    D: Dialer,
{
    let target = request.target;
    debug!("Connecting to target: {}", target);

    let upstream = match tokio::time::timeout(connect_timeout, dialer.dial(&target)).await {
        Ok(Ok(upstream)) => upstream,
        Ok(Err(source)) => {
            return Err(ProxyError::DialFailure {
                target: target.to_string(),
                source,
            })
        }
        Err(_) => {
            return Err(ProxyError::DialTimeout {
                target: target.to_string(),
                timeout: connect_timeout,
            })
        }
    };

    let bound = D::local_addr(&upstream).map_err(|source| ProxyError::DialFailure {
        target: target.to_string(),
        source,
    })?;

    send_success(stream, bound).await?;
    info!("SOCKS5 tunnel established to {} via {}", target, bound);

    Ok(Upstream {
        stream: upstream,
        target,
        address_type: request.address_type,
        bound,
    })
}
