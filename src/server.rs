//! Listening server
//!
//! Binds the configured address and runs one session task per accepted
//! connection until a shutdown signal arrives.

use crate::config::{AuthConfig, Config};
use crate::socks::{handle_connection, AuthTable, SessionContext, StaticCredentials};
use crate::transport::{Dialer, TcpDialer};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, info_span, Instrument};

/// SOCKS5 proxy server
#[derive(Debug)]
pub struct Server<D: Dialer = TcpDialer> {
    /// Address to bind in [`Server::run`]
    listen: String,
    /// State shared by every session
    context: SessionContext<D>,
}

impl Server<TcpDialer> {
    /// Create a server that dials upstream over plain TCP
    pub fn new(config: Config) -> Self {
        let dialer = TcpDialer::new(&config.server.tcp);
        Server::with_dialer(config, dialer)
    }
}

impl<D: Dialer> Server<D> {
    /// Create a server with a custom outbound dialer
    pub fn with_dialer(config: Config, dialer: D) -> Self {
        let context = SessionContext::new(
            Arc::new(build_auth_table(&config.auth)),
            Arc::new(dialer),
            config.server.connect_timeout(),
        );
        Server {
            listen: config.server.listen,
            context,
        }
    }

    /// Bind the listen address and serve until shutdown
    pub async fn run(self, shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
        let listener = TcpListener::bind(&self.listen)
            .await
            .with_context(|| format!("Failed to bind {}", self.listen))?;
        self.serve(listener, shutdown_rx).await
    }

    /// Serve connections from an already bound listener until shutdown
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<bool>,
    ) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!("Listening on {}", local_addr);
        info!("Authentication methods: {:?}", self.context.auth().methods());

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.spawn_session(stream, peer),
                        Err(e) => error!("Failed to accept connection: {}", e),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        info!("Server stopped");
        Ok(())
    }

    fn spawn_session(&self, stream: tokio::net::TcpStream, peer: SocketAddr) {
        debug!("Accepted connection from {}", peer);
        let context = self.context.clone();
        tokio::spawn(
            async move {
                let _ = handle_connection(stream, &context).await;
            }
            .instrument(info_span!("session", peer = %peer)),
        );
    }
}

/// Build the method table from the auth configuration
pub fn build_auth_table(config: &AuthConfig) -> AuthTable {
    let mut table = AuthTable::new();
    if config.allow_no_auth {
        table = table.with_no_auth();
    }
    if config.has_credentials() {
        let credentials = config
            .users
            .iter()
            .fold(StaticCredentials::new(), |creds, user| {
                creds.with_user(user.username.as_str(), user.password.as_str())
            });
        table = table.with_user_pass(Arc::new(credentials));
    }
    table
}
