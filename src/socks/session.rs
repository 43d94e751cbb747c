//! Per-connection session controller
//!
//! A [`Session`] owns the client stream and, once CONNECT succeeds, the
//! upstream stream. It drives the connection through
//! `Accepted → Authenticating → Dispatching → Relaying → Closed` and
//! closes both streams on every exit path. Dropping a session (for example
//! when its task is cancelled) closes them as well.

use super::auth::AuthTable;
use super::command::{self, send_failure, Upstream};
use super::handshake;
use super::tcp_relay::{relay_tcp, RelayStats};
use crate::error::ProxyError;
use crate::transport::Dialer;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connection accepted, nothing read yet
    Accepted,
    /// Method negotiation and sub-negotiation in progress
    Authenticating,
    /// Reading and executing the connection request
    Dispatching,
    /// Copying bytes between client and upstream
    Relaying,
    /// Both streams released
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Accepted => "accepted",
            SessionState::Authenticating => "authenticating",
            SessionState::Dispatching => "dispatching",
            SessionState::Relaying => "relaying",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Shared, read-only inputs of every session
pub struct SessionContext<D> {
    auth: Arc<AuthTable>,
    dialer: Arc<D>,
    connect_timeout: Duration,
}

impl<D> SessionContext<D> {
    /// Create a context
    pub fn new(auth: Arc<AuthTable>, dialer: Arc<D>, connect_timeout: Duration) -> Self {
        SessionContext {
            auth,
            dialer,
            connect_timeout,
        }
    }

    /// Authentication table
    pub fn auth(&self) -> &AuthTable {
        &self.auth
    }

    /// Outbound dialer
    pub fn dialer(&self) -> &D {
        &self.dialer
    }

    /// Outbound connect timeout
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl<D> Clone for SessionContext<D> {
    fn clone(&self) -> Self {
        SessionContext {
            auth: Arc::clone(&self.auth),
            dialer: Arc::clone(&self.dialer),
            connect_timeout: self.connect_timeout,
        }
    }
}

impl<D: fmt::Debug> fmt::Debug for SessionContext<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("methods", &self.auth.methods())
            .field("dialer", &self.dialer)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// One client connection
pub struct Session<S, D: Dialer> {
    client: S,
    upstream: Option<Upstream<D::Stream>>,
    state: SessionState,
}

impl<S, D> Session<S, D>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    D: Dialer,
{
    /// Wrap a freshly accepted client stream
    pub fn new(client: S) -> Self {
        Session {
            client,
            upstream: None,
            state: SessionState::Accepted,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Upstream connection, present only after a successful CONNECT
    pub fn upstream(&self) -> Option<&Upstream<D::Stream>> {
        self.upstream.as_ref()
    }

    /// Run the session to completion
    ///
    /// Errors that carry a reply code are answered before the session is
    /// closed. The session is always [`SessionState::Closed`] on return.
    pub async fn run(&mut self, ctx: &SessionContext<D>) -> Result<RelayStats, ProxyError> {
        let result = self.drive(ctx).await;

        if let Err(err) = &result {
            if self.state != SessionState::Relaying {
                if let Some(code) = err.reply_code() {
                    if let Err(e) = send_failure(&mut self.client, code).await {
                        debug!("Failed to send {:?} reply: {}", code, e);
                    }
                }
            }
        }

        self.close().await;
        result
    }

    async fn drive(&mut self, ctx: &SessionContext<D>) -> Result<RelayStats, ProxyError> {
        self.state = SessionState::Authenticating;
        handshake::negotiate(&mut self.client, ctx.auth()).await?;

        self.state = SessionState::Dispatching;
        let upstream =
            command::dispatch(&mut self.client, ctx.dialer(), ctx.connect_timeout()).await?;
        let upstream = self.upstream.insert(upstream);

        self.state = SessionState::Relaying;
        relay_tcp(&mut self.client, &mut upstream.stream).await
    }

    /// Shut down and release both streams
    ///
    /// Safe to call more than once.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        let _ = self.client.shutdown().await;
        if let Some(mut upstream) = self.upstream.take() {
            let _ = upstream.stream.shutdown().await;
        }
        self.state = SessionState::Closed;
    }
}

/// Serve one accepted client connection
///
/// This is the entry point the listener calls once per socket.
pub async fn handle_connection<S, D>(
    client: S,
    ctx: &SessionContext<D>,
) -> Result<RelayStats, ProxyError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    D: Dialer,
{
    let mut session: Session<S, D> = Session::new(client);
    let result = session.run(ctx).await;

    match &result {
        Ok(stats) => info!(
            "Session closed: {} bytes from client, {} bytes from upstream",
            stats.client_to_upstream, stats.upstream_to_client
        ),
        Err(e @ ProxyError::Authentication(_)) => warn!("Client failed authentication: {}", e),
        Err(e @ ProxyError::UnsupportedAuthorizationType) => {
            warn!("Rejected client: {}", e)
        }
        Err(e @ ProxyError::UnsupportedCommand(_)) => warn!("Rejected request: {}", e),
        Err(e) => info!("Session ended with error: {}", e),
    }

    result
}
