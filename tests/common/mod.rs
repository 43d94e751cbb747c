//! Test utilities shared by the integration tests
//!
//! Loopback listeners, an echo target and small SOCKS5 client helpers.

#![allow(dead_code)]

use socksio::config::Config;
use socksio::transport::Dialer;
use socksio::Server;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Address of a port that nothing listens on
pub async fn closed_port() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    drop(listener);
    addr
}

/// Spawn a target that echoes every connection back to itself
pub async fn spawn_echo_server() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = stream.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });
    addr
}

/// Running proxy plus the handle that stops it
pub struct TestProxy {
    /// Address clients connect to
    pub addr: SocketAddr,
    shutdown_tx: broadcast::Sender<bool>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestProxy {
    /// Stop the accept loop and wait for it
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        self.handle.await.unwrap().unwrap();
    }
}

/// Start a proxy dialing over plain TCP
pub async fn start_proxy(config: Config) -> TestProxy {
    start(Server::new(config)).await
}

/// Start a proxy with a custom dialer
pub async fn start_proxy_with_dialer<D: Dialer>(config: Config, dialer: D) -> TestProxy {
    start(Server::with_dialer(config, dialer)).await
}

async fn start<D: Dialer>(server: Server<D>) -> TestProxy {
    let (listener, addr) = create_test_listener().await;
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(server.serve(listener, shutdown_rx));
    TestProxy {
        addr,
        shutdown_tx,
        handle,
    }
}

/// Send a greeting offering `methods` and return the selected method
pub async fn greet(stream: &mut TcpStream, methods: &[u8]) -> u8 {
    let mut greeting = vec![0x05, methods.len() as u8];
    greeting.extend_from_slice(methods);
    stream.write_all(&greeting).await.unwrap();

    let mut selection = [0u8; 2];
    stream.read_exact(&mut selection).await.unwrap();
    assert_eq!(selection[0], 0x05);
    selection[1]
}

/// Encode a CONNECT request for an IPv4 destination
pub fn connect_request(target: SocketAddr) -> Vec<u8> {
    request(0x01, target)
}

/// Encode a request with an arbitrary command for an IPv4 destination
pub fn request(command: u8, target: SocketAddr) -> Vec<u8> {
    let SocketAddr::V4(v4) = target else {
        panic!("test helpers only encode IPv4 destinations");
    };
    let mut request = vec![0x05, command, 0x00, 0x01];
    request.extend_from_slice(&v4.ip().octets());
    request.extend_from_slice(&v4.port().to_be_bytes());
    request
}

/// Encode a CONNECT request for a domain-name destination
pub fn domain_connect_request(domain: &str, port: u16) -> Vec<u8> {
    let mut request = vec![0x05, 0x01, 0x00, 0x03, domain.len() as u8];
    request.extend_from_slice(domain.as_bytes());
    request.extend_from_slice(&port.to_be_bytes());
    request
}

/// Read a reply of any address type, returning the reply code
pub async fn read_reply_code(stream: &mut TcpStream) -> u8 {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await.unwrap();
    assert_eq!(header[0], 0x05);
    let addr_len = match header[3] {
        0x01 => 4,
        0x04 => 16,
        0x03 => stream.read_u8().await.unwrap() as usize,
        other => panic!("unexpected address type {:#04x}", other),
    };
    let mut rest = vec![0u8; addr_len + 2];
    stream.read_exact(&mut rest).await.unwrap();
    header[1]
}

/// Read a reply carrying an IPv4 bound address
pub async fn read_ipv4_reply(stream: &mut TcpStream) -> [u8; 10] {
    let mut reply = [0u8; 10];
    stream.read_exact(&mut reply).await.unwrap();
    reply
}

/// Read until the proxy closes the connection
pub async fn read_until_close(stream: &mut TcpStream) -> Vec<u8> {
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();
    rest
}
