//! SOCKS5 protocol engine
//!
//! Wire codec, method negotiation, CONNECT dispatch and the byte relay,
//! tied together by the per-connection [`Session`].

pub mod auth;
pub mod codec;
pub mod command;
pub mod consts;
pub mod handshake;
mod session;
mod tcp_relay;
mod types;

pub use auth::{AuthStrategy, AuthTable, CredentialVerifier, StaticCredentials};
pub use codec::{ConnectionRequest, Credentials, Greeting};
pub use command::Upstream;
pub use handshake::negotiate;
pub use session::{handle_connection, Session, SessionContext, SessionState};
pub use tcp_relay::{relay_tcp, RelayStats};
pub use types::{AddressType, AuthMethod, SocksCommand, TargetAddr};
