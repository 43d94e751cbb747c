//! # Socksio - Asynchronous SOCKS5 Proxy
//!
//! Socksio accepts SOCKS5 clients, negotiates an authentication method,
//! opens the requested outbound TCP connection and relays bytes in both
//! directions until either side closes.
//!
//! ## Features
//!
//! - **RFC 1928 CONNECT**: IPv4, IPv6 and domain-name destinations
//! - **RFC 1929 Authentication**: username/password with a pluggable verifier
//! - **Bounded Dialing**: outbound connects are cut off after a timeout
//! - **Clean Teardown**: when one direction ends, both streams are closed
//!
//! ## Usage
//!
//! ```rust,ignore
//! use socksio::config::load_config;
//! use socksio::Server;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     Server::new(config).run(shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! Each accepted socket becomes a [`socks::Session`]:
//!
//! ```text
//! Client -> Handshake -> Dispatch (CONNECT) -> Relay <-> Target
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod server;
pub mod socks;
pub mod transport;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::{ProxyError, ReplyCode};
pub use server::Server;
pub use socks::{handle_connection, SessionContext};

/// Version of the Socksio library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
