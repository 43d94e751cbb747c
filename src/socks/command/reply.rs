//! SOCKS5 reply sender

use crate::error::{ProxyError, ReplyCode};
use crate::socks::codec::encode_reply;
use crate::socks::consts::SOCKS5_VERSION;
use crate::socks::types::TargetAddr;
use std::net::SocketAddr;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Encode and send a SOCKS5 reply
pub async fn send_reply<S>(
    stream: &mut S,
    reply_code: ReplyCode,
    bound: &TargetAddr,
) -> Result<(), ProxyError>
where
    S: AsyncWrite + Unpin,
{
    stream
        .write_all(&encode_reply(SOCKS5_VERSION, reply_code, bound))
        .await?;
    stream.flush().await?;
    Ok(())
}

/// Send a success reply carrying the outbound socket's local endpoint
pub async fn send_success<S>(stream: &mut S, bound: SocketAddr) -> Result<(), ProxyError>
where
    S: AsyncWrite + Unpin,
{
    send_reply(stream, ReplyCode::Succeeded, &TargetAddr::Ip(bound)).await
}

/// Send a failure reply with the unspecified bound address `0.0.0.0:0`
pub async fn send_failure<S>(stream: &mut S, reply_code: ReplyCode) -> Result<(), ProxyError>
where
    S: AsyncWrite + Unpin,
{
    send_reply(stream, reply_code, &TargetAddr::unspecified()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socks::consts::*;

    #[tokio::test]
    async fn test_send_success() {
        let mut buffer = Vec::new();
        let addr: SocketAddr = "10.0.0.1:9090".parse().unwrap();

        send_success(&mut buffer, addr).await.unwrap();

        assert_eq!(buffer[0], SOCKS5_VERSION);
        assert_eq!(buffer[1], u8::from(ReplyCode::Succeeded));
        assert_eq!(buffer[3], SOCKS5_ADDR_TYPE_IPV4);
        assert_eq!(&buffer[4..8], &[10, 0, 0, 1]);
        assert_eq!(&buffer[8..10], &9090u16.to_be_bytes());
    }

    #[tokio::test]
    async fn test_send_command_not_supported() {
        let mut buffer = Vec::new();

        send_failure(&mut buffer, ReplyCode::CommandNotSupported)
            .await
            .unwrap();

        assert_eq!(buffer, vec![0x05, 0x07, 0x00, 0x01, 0, 0, 0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_send_general_failure() {
        let mut buffer = Vec::new();

        send_failure(&mut buffer, ReplyCode::GeneralFailure)
            .await
            .unwrap();

        assert_eq!(buffer, vec![0x05, 0x01, 0x00, 0x01, 0, 0, 0, 0, 0, 0]);
    }
}
