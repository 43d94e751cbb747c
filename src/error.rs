//! Error types for Socksio
//!
//! Every failure a session can hit is a [`ProxyError`]. Each variant knows
//! whether the protocol still allows a reply to be sent for it.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Session-level SOCKS5 errors
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Version byte was not 0x05
    #[error("Unsupported SOCKS version: {0}")]
    ProtocolVersionMismatch(u8),

    /// No authentication method is supported by both sides
    #[error("No acceptable authentication method")]
    UnsupportedAuthorizationType,

    /// Credential check or sub-negotiation failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Command other than CONNECT
    #[error("Command not supported: {0:#04x}")]
    UnsupportedCommand(u8),

    /// ATYP byte is not IPv4, domain name or IPv6
    #[error("Address type not supported: {0:#04x}")]
    UnsupportedAddressType(u8),

    /// Outbound connect failed
    #[error("Failed to connect to {target}: {source}")]
    DialFailure {
        /// Requested destination
        target: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Outbound connect did not finish in time
    #[error("Connection to {target} timed out after {timeout:?}")]
    DialTimeout {
        /// Requested destination
        target: String,
        /// Configured bound
        timeout: Duration,
    },

    /// Message violated the wire format
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// Read/write failure after the relay started
    #[error("Relay IO error: {0}")]
    RelayIo(#[source] io::Error),

    /// Any other IO error before the relay
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ProxyError {
    /// Reply code to send for this error, if the protocol defines one
    ///
    /// Errors raised before a method was chosen, during authentication, or
    /// after the relay started have no reply.
    pub fn reply_code(&self) -> Option<ReplyCode> {
        match self {
            ProxyError::UnsupportedCommand(_) => Some(ReplyCode::CommandNotSupported),
            ProxyError::UnsupportedAddressType(_) => Some(ReplyCode::AddressTypeNotSupported),
            ProxyError::DialFailure { .. } | ProxyError::DialTimeout { .. } => {
                Some(ReplyCode::GeneralFailure)
            }
            ProxyError::ProtocolVersionMismatch(_)
            | ProxyError::UnsupportedAuthorizationType
            | ProxyError::Authentication(_)
            | ProxyError::Malformed(_)
            | ProxyError::RelayIo(_)
            | ProxyError::Io(_) => None,
        }
    }

    /// Map a read error while decoding into a protocol error
    ///
    /// A stream ending before the declared length is a malformed message.
    pub(crate) fn from_read(err: io::Error, what: &str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ProxyError::Malformed(format!("short read in {}", what))
        } else {
            ProxyError::Io(err)
        }
    }
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<ReplyCode> for u8 {
    fn from(code: ReplyCode) -> Self {
        code as u8
    }
}
