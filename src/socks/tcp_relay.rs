//! Bidirectional relay for established CONNECT sessions
//!
//! Two copy loops run concurrently, one per direction. Whichever loop ends
//! first (EOF or error) ends the relay: the other loop is cancelled and
//! both streams are shut down and dropped, so no direction is left
//! half-open.

use super::consts::RELAY_CHUNK_SIZE;
use crate::error::ProxyError;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Bytes moved in each direction
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Bytes read from the client and written upstream
    pub client_to_upstream: u64,
    /// Bytes read from upstream and written to the client
    pub upstream_to_client: u64,
}

/// Relay data between the client and upstream until either side ends
///
/// The client stream is only written by the upstream→client loop and the
/// upstream stream only by the client→upstream loop.
pub async fn relay_tcp<A, B>(client: A, upstream: B) -> Result<RelayStats, ProxyError>
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (mut client_read, mut client_write) = tokio::io::split(client);
    let (mut upstream_read, mut upstream_write) = tokio::io::split(upstream);

    let mut stats = RelayStats::default();

    let result = {
        let client_to_upstream = copy_chunks(
            &mut client_read,
            &mut upstream_write,
            &mut stats.client_to_upstream,
        );
        let upstream_to_client = copy_chunks(
            &mut upstream_read,
            &mut client_write,
            &mut stats.upstream_to_client,
        );

        tokio::select! {
            result = client_to_upstream => {
                debug!("client->upstream finished: {:?}", result);
                result
            }
            result = upstream_to_client => {
                debug!("upstream->client finished: {:?}", result);
                result
            }
        }
    };

    // Teardown is best effort; a peer that is already gone is not an error
    let _ = client_write.shutdown().await;
    let _ = upstream_write.shutdown().await;

    debug!(
        "Relay closed: {} bytes from client, {} bytes from upstream",
        stats.client_to_upstream, stats.upstream_to_client
    );

    result.map(|()| stats).map_err(ProxyError::RelayIo)
}

/// Forward chunks from `reader` to `writer` until EOF or error
async fn copy_chunks<R, W>(reader: &mut R, writer: &mut W, copied: &mut u64) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; RELAY_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        writer.write_all(&buf[..n]).await?;
        writer.flush().await?;
        *copied += n as u64;
    }
}
