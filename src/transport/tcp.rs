//! TCP dialer
//!
//! Plain TCP connections to the requested destination.

use super::{Dialer, SocketOpts};
use crate::config::TcpConfig;
use crate::socks::TargetAddr;
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// TCP dialer for CONNECT requests
#[derive(Debug, Clone, Default)]
pub struct TcpDialer {
    /// Socket options to apply to connections
    socket_opts: SocketOpts,
}

impl TcpDialer {
    /// Create a dialer from TCP configuration
    pub fn new(config: &TcpConfig) -> Self {
        TcpDialer {
            socket_opts: SocketOpts::from_tcp_config(config),
        }
    }

    /// Socket options applied to new connections
    pub fn socket_opts(&self) -> &SocketOpts {
        &self.socket_opts
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    type Stream = TcpStream;

    async fn dial(&self, target: &TargetAddr) -> io::Result<TcpStream> {
        let resolved = target.resolve().await?;
        let stream = TcpStream::connect(resolved).await?;

        // Socket options are best effort, the connection is usable without them
        if let Err(e) = self.socket_opts.apply(&stream) {
            warn!("Failed to apply socket options: {}", e);
        }

        debug!("TCP connection established to {}", resolved);
        Ok(stream)
    }

    fn local_addr(stream: &TcpStream) -> io::Result<SocketAddr> {
        stream.local_addr()
    }
}
