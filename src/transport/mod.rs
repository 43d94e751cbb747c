//! Outbound transport
//!
//! [`Dialer`] is the capability a session uses to open the upstream
//! connection for CONNECT. [`TcpDialer`] is the production implementation.

mod tcp;

pub use tcp::TcpDialer;

use crate::config::TcpConfig;
use crate::socks::TargetAddr;
use async_trait::async_trait;
use std::fmt::Debug;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Socket options for outbound connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOpts {
    /// Enable TCP_NODELAY
    pub nodelay: bool,
    /// TCP keepalive timeout
    pub keepalive_secs: Option<u64>,
    /// TCP keepalive interval
    pub keepalive_interval: Option<u64>,
}

impl Default for SocketOpts {
    fn default() -> Self {
        SocketOpts {
            nodelay: true,
            keepalive_secs: Some(20),
            keepalive_interval: Some(8),
        }
    }
}

impl SocketOpts {
    /// Create socket options from TCP config
    pub fn from_tcp_config(config: &TcpConfig) -> Self {
        let keepalive = (config.keepalive_secs > 0).then_some(config.keepalive_secs);
        SocketOpts {
            nodelay: config.nodelay,
            keepalive_secs: keepalive,
            keepalive_interval: keepalive.map(|_| config.keepalive_interval),
        }
    }

    /// Apply socket options to a TCP stream
    pub fn apply(&self, stream: &TcpStream) -> io::Result<()> {
        stream.set_nodelay(self.nodelay)?;

        if let (Some(timeout), Some(interval)) = (self.keepalive_secs, self.keepalive_interval) {
            let socket = socket2::SockRef::from(stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(Duration::from_secs(timeout))
                .with_interval(Duration::from_secs(interval));
            socket.set_tcp_keepalive(&keepalive)?;
        }

        Ok(())
    }
}

/// Opens outbound connections on behalf of clients
///
/// The connect timeout is enforced by the caller, so `dial` may take as
/// long as the underlying connect does.
#[async_trait]
pub trait Dialer: Debug + Send + Sync + 'static {
    /// The stream type produced by this dialer
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + Debug + 'static;

    /// Connect to `target`
    async fn dial(&self, target: &TargetAddr) -> io::Result<Self::Stream>;

    /// Local endpoint of an established connection
    fn local_addr(stream: &Self::Stream) -> io::Result<SocketAddr>;
}
