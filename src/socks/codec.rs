//! SOCKS5 wire codec
//!
//! Decoders pull exactly the number of bytes each field declares from an
//! async reader, so a length prefix is always read before its payload.
//! Encoders are pure and return the message bytes.

use super::consts::*;
use super::types::{AddressType, SocksCommand, TargetAddr};
use crate::error::{ProxyError, ReplyCode};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Client greeting
///
/// ```text
/// +----+----------+----------+
/// |VER | NMETHODS | METHODS  |
/// +----+----------+----------+
/// | 1  |    1     | 1 to 255 |
/// +----+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    /// Protocol version, always 0x05 once decoded
    pub version: u8,
    /// Raw method identifiers offered by the client
    pub methods: Vec<u8>,
}

/// Username/password pair from an RFC 1929 sub-negotiation
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username bytes (1 to 255)
    pub username: Vec<u8>,
    /// Password bytes (1 to 255)
    pub password: Vec<u8>,
}

impl Credentials {
    /// Create a credential pair
    pub fn new(username: impl Into<Vec<u8>>, password: impl Into<Vec<u8>>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Username rendered for logs
    pub fn username_lossy(&self) -> String {
        String::from_utf8_lossy(&self.username).into_owned()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username_lossy())
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Decoded connection request
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    /// Protocol version, always 0x05 once decoded
    pub version: u8,
    /// Requested command
    pub command: SocksCommand,
    /// Encoding of the destination address
    pub address_type: AddressType,
    /// Destination address and port
    pub target: TargetAddr,
}

/// Decode the client greeting
pub async fn decode_greeting<R>(reader: &mut R) -> Result<Greeting, ProxyError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 2];
    reader
        .read_exact(&mut header)
        .await
        .map_err(|e| ProxyError::from_read(e, "greeting"))?;

    let version = header[0];
    let num_methods = header[1] as usize;

    if version != SOCKS5_VERSION {
        return Err(ProxyError::ProtocolVersionMismatch(version));
    }

    let mut methods = vec![0u8; num_methods];
    reader
        .read_exact(&mut methods)
        .await
        .map_err(|e| ProxyError::from_read(e, "greeting methods"))?;

    Ok(Greeting { version, methods })
}

/// Decode a username/password sub-negotiation message
///
/// ```text
/// +----+------+----------+------+----------+
/// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
/// +----+------+----------+------+----------+
/// | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
/// +----+------+----------+------+----------+
/// ```
pub async fn decode_user_pass_auth<R>(reader: &mut R) -> Result<Credentials, ProxyError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 2];
    reader
        .read_exact(&mut header)
        .await
        .map_err(|e| ProxyError::from_read(e, "auth header"))?;

    if header[0] != SOCKS5_AUTH_VERSION {
        return Err(ProxyError::Malformed(format!(
            "invalid auth version: {}",
            header[0]
        )));
    }

    let username = read_length_prefixed_body(reader, header[1], "username").await?;

    let mut len = [0u8; 1];
    reader
        .read_exact(&mut len)
        .await
        .map_err(|e| ProxyError::from_read(e, "password length"))?;
    let password = read_length_prefixed_body(reader, len[0], "password").await?;

    Ok(Credentials { username, password })
}

/// Encode a username/password sub-negotiation message (client side)
pub fn encode_user_pass_auth(credentials: &Credentials) -> Result<Bytes, ProxyError> {
    check_field_len(credentials.username.len(), "username")?;
    check_field_len(credentials.password.len(), "password")?;

    let mut buf =
        BytesMut::with_capacity(3 + credentials.username.len() + credentials.password.len());
    buf.put_u8(SOCKS5_AUTH_VERSION);
    buf.put_u8(credentials.username.len() as u8);
    buf.put_slice(&credentials.username);
    buf.put_u8(credentials.password.len() as u8);
    buf.put_slice(&credentials.password);
    Ok(buf.freeze())
}

/// Decode a connection request
pub async fn decode_connection_request<R>(reader: &mut R) -> Result<ConnectionRequest, ProxyError>
where
    R: AsyncRead + Unpin,
{
    // VER CMD RSV ATYP
    let mut header = [0u8; 4];
    reader
        .read_exact(&mut header)
        .await
        .map_err(|e| ProxyError::from_read(e, "request header"))?;

    let version = header[0];
    let cmd_byte = header[1];
    let addr_byte = header[3];

    if version != SOCKS5_VERSION {
        return Err(ProxyError::ProtocolVersionMismatch(version));
    }

    let command =
        SocksCommand::from_byte(cmd_byte).ok_or(ProxyError::UnsupportedCommand(cmd_byte))?;
    let address_type =
        AddressType::from_byte(addr_byte).ok_or(ProxyError::UnsupportedAddressType(addr_byte))?;

    let target = decode_address(reader, address_type).await?;

    Ok(ConnectionRequest {
        version,
        command,
        address_type,
        target,
    })
}

/// Read the DST.ADDR and DST.PORT fields for the given address type
async fn decode_address<R>(
    reader: &mut R,
    address_type: AddressType,
) -> Result<TargetAddr, ProxyError>
where
    R: AsyncRead + Unpin,
{
    let read_err = |e| ProxyError::from_read(e, "destination address");

    match address_type {
        AddressType::IPv4 => {
            let mut addr = [0u8; 4];
            reader.read_exact(&mut addr).await.map_err(read_err)?;
            let port = reader.read_u16().await.map_err(read_err)?;
            Ok(TargetAddr::ipv4(Ipv4Addr::from(addr), port))
        }
        AddressType::DomainName => {
            let len = reader.read_u8().await.map_err(read_err)?;
            let domain = read_length_prefixed_body(reader, len, "domain name").await?;
            let domain = String::from_utf8(domain)
                .map_err(|_| ProxyError::Malformed("invalid UTF-8 in domain name".to_string()))?;
            let port = reader.read_u16().await.map_err(read_err)?;
            Ok(TargetAddr::Domain(domain, port))
        }
        AddressType::IPv6 => {
            let mut addr = [0u8; 16];
            reader.read_exact(&mut addr).await.map_err(read_err)?;
            let port = reader.read_u16().await.map_err(read_err)?;
            Ok(TargetAddr::ipv6(Ipv6Addr::from(addr), port))
        }
    }
}

/// Encode the server's method selection
///
/// ```text
/// +----+--------+
/// |VER | METHOD |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
/// ```
pub fn encode_method_selection(method: u8) -> [u8; 2] {
    [SOCKS5_VERSION, method]
}

/// Encode a reply
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
pub fn encode_reply(version: u8, reply_code: ReplyCode, bound: &TargetAddr) -> Bytes {
    let mut buf = BytesMut::with_capacity(22);
    buf.put_u8(version);
    buf.put_u8(reply_code.into());
    buf.put_u8(SOCKS5_RESERVED);
    buf.put_u8(bound.addr_type().to_byte());

    match bound {
        TargetAddr::Ip(SocketAddr::V4(addr)) => buf.put_slice(&addr.ip().octets()),
        TargetAddr::Ip(SocketAddr::V6(addr)) => buf.put_slice(&addr.ip().octets()),
        TargetAddr::Domain(domain, _) => {
            // Names longer than 255 bytes are truncated
            let name = &domain.as_bytes()[..domain.len().min(MAX_FIELD_LEN)];
            buf.put_u8(name.len() as u8);
            buf.put_slice(name);
        }
    }
    buf.put_u16(bound.port());

    buf.freeze()
}

/// Encode a sub-negotiation result
///
/// ```text
/// +----+--------+
/// |VER | STATUS |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
/// ```
pub fn encode_auth_result(version: u8, success: bool) -> [u8; 2] {
    let status = if success {
        SOCKS5_AUTH_SUCCESS
    } else {
        SOCKS5_AUTH_FAILURE
    };
    [version, status]
}

async fn read_length_prefixed_body<R>(
    reader: &mut R,
    len: u8,
    what: &str,
) -> Result<Vec<u8>, ProxyError>
where
    R: AsyncRead + Unpin,
{
    check_field_len(len as usize, what)?;
    let mut body = vec![0u8; len as usize];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|e| ProxyError::from_read(e, what))?;
    Ok(body)
}

fn check_field_len(len: usize, what: &str) -> Result<(), ProxyError> {
    if len == 0 || len > MAX_FIELD_LEN {
        return Err(ProxyError::Malformed(format!(
            "invalid {} length: {}",
            what, len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn create_connect_request_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut request = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
        ];
        request.extend_from_slice(&ip);
        request.extend_from_slice(&port.to_be_bytes());
        request
    }

    #[tokio::test]
    async fn test_decode_greeting() {
        let mut cursor = Cursor::new(vec![0x05, 0x02, 0x00, 0x02]);
        let greeting = decode_greeting(&mut cursor).await.unwrap();
        assert_eq!(greeting.version, SOCKS5_VERSION);
        assert_eq!(greeting.methods, vec![0x00, 0x02]);
    }

    #[tokio::test]
    async fn test_decode_greeting_does_not_over_read() {
        let mut cursor = Cursor::new(vec![0x05, 0x01, 0x00, 0xAA, 0xBB]);
        decode_greeting(&mut cursor).await.unwrap();
        assert_eq!(cursor.position(), 3);
    }

    #[tokio::test]
    async fn test_decode_greeting_wrong_version() {
        let mut cursor = Cursor::new(vec![0x04, 0x01, 0x00]);
        let err = decode_greeting(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProxyError::ProtocolVersionMismatch(4)));
    }

    #[tokio::test]
    async fn test_decode_greeting_short_read() {
        let mut cursor = Cursor::new(vec![0x05, 0x03, 0x00]);
        let err = decode_greeting(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProxyError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_decode_greeting_zero_methods() {
        let mut cursor = Cursor::new(vec![0x05, 0x00]);
        let greeting = decode_greeting(&mut cursor).await.unwrap();
        assert!(greeting.methods.is_empty());
    }

    #[tokio::test]
    async fn test_decode_user_pass_auth() {
        let bytes = encode_user_pass_auth(&Credentials::new("admin", "secret123")).unwrap();
        assert_eq!(bytes[0], SOCKS5_AUTH_VERSION);
        assert_eq!(bytes[1], 5);
        assert_eq!(&bytes[2..7], b"admin");
        assert_eq!(bytes[7], 9);
        assert_eq!(&bytes[8..17], b"secret123");

        let mut cursor = Cursor::new(bytes.to_vec());
        let creds = decode_user_pass_auth(&mut cursor).await.unwrap();
        assert_eq!(creds.username, b"admin");
        assert_eq!(creds.password, b"secret123");
    }

    #[tokio::test]
    async fn test_decode_user_pass_auth_zero_username_length() {
        let mut cursor = Cursor::new(vec![SOCKS5_AUTH_VERSION, 0, 4, b'p', b'a', b's', b's']);
        let err = decode_user_pass_auth(&mut cursor).await.unwrap_err();
        assert!(err.to_string().contains("invalid username length"));
    }

    #[tokio::test]
    async fn test_decode_user_pass_auth_invalid_version() {
        let mut cursor = Cursor::new(vec![0xFF, 1, b'u', 1, b'p']);
        let err = decode_user_pass_auth(&mut cursor).await.unwrap_err();
        assert!(err.to_string().contains("invalid auth version"));
    }

    #[tokio::test]
    async fn test_decode_user_pass_auth_truncated_password() {
        let mut cursor = Cursor::new(vec![SOCKS5_AUTH_VERSION, 1, b'u', 4, b'p']);
        let err = decode_user_pass_auth(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProxyError::Malformed(_)));
    }

    #[test]
    fn test_encode_user_pass_auth_rejects_bad_lengths() {
        assert!(encode_user_pass_auth(&Credentials::new("", "pass")).is_err());
        assert!(encode_user_pass_auth(&Credentials::new("user", vec![b'x'; 256])).is_err());
        assert!(encode_user_pass_auth(&Credentials::new(vec![b'x'; 255], "p")).is_ok());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let debug = format!("{:?}", Credentials::new("alice", "hunter2"));
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_decode_connection_request_ipv4() {
        let mut cursor = Cursor::new(create_connect_request_ipv4([127, 0, 0, 1], 80));
        let request = decode_connection_request(&mut cursor).await.unwrap();
        assert_eq!(request.command, SocksCommand::Connect);
        assert_eq!(request.address_type, AddressType::IPv4);
        assert_eq!(request.target, TargetAddr::ipv4(Ipv4Addr::LOCALHOST, 80));
    }

    #[tokio::test]
    async fn test_decode_connection_request_domain() {
        let mut request = vec![0x05, 0x01, 0x00, SOCKS5_ADDR_TYPE_DOMAIN, 11];
        request.extend_from_slice(b"example.com");
        request.extend_from_slice(&443u16.to_be_bytes());

        let mut cursor = Cursor::new(request);
        let request = decode_connection_request(&mut cursor).await.unwrap();
        assert_eq!(request.address_type, AddressType::DomainName);
        assert_eq!(request.target, TargetAddr::domain("example.com", 443));
    }

    #[tokio::test]
    async fn test_decode_connection_request_ipv6() {
        let mut request = vec![0x05, 0x01, 0x00, SOCKS5_ADDR_TYPE_IPV6];
        request.extend_from_slice(&Ipv6Addr::LOCALHOST.octets());
        request.extend_from_slice(&8080u16.to_be_bytes());

        let mut cursor = Cursor::new(request);
        let request = decode_connection_request(&mut cursor).await.unwrap();
        assert_eq!(request.address_type, AddressType::IPv6);
        assert_eq!(request.target, TargetAddr::ipv6(Ipv6Addr::LOCALHOST, 8080));
    }

    #[tokio::test]
    async fn test_decode_connection_request_empty_domain() {
        let mut cursor = Cursor::new(vec![0x05, 0x01, 0x00, SOCKS5_ADDR_TYPE_DOMAIN, 0, 0, 80]);
        let err = decode_connection_request(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProxyError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_decode_connection_request_unknown_command() {
        let mut request = create_connect_request_ipv4([127, 0, 0, 1], 80);
        request[1] = 0x99;
        let mut cursor = Cursor::new(request);
        let err = decode_connection_request(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProxyError::UnsupportedCommand(0x99)));
    }

    #[tokio::test]
    async fn test_decode_connection_request_unknown_address_type() {
        let mut request = create_connect_request_ipv4([127, 0, 0, 1], 80);
        request[3] = 0x05;
        let mut cursor = Cursor::new(request);
        let err = decode_connection_request(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProxyError::UnsupportedAddressType(0x05)));
    }

    #[tokio::test]
    async fn test_decode_connection_request_invalid_version() {
        let mut request = create_connect_request_ipv4([127, 0, 0, 1], 80);
        request[0] = 4;
        let mut cursor = Cursor::new(request);
        let err = decode_connection_request(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProxyError::ProtocolVersionMismatch(4)));
    }

    #[tokio::test]
    async fn test_decode_connection_request_truncated_port() {
        let mut request = create_connect_request_ipv4([127, 0, 0, 1], 80);
        request.pop();
        let mut cursor = Cursor::new(request);
        let err = decode_connection_request(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProxyError::Malformed(_)));
    }

    #[test]
    fn test_encode_reply_ipv4() {
        let bound = TargetAddr::ipv4(Ipv4Addr::new(192, 168, 1, 1), 8080);
        let reply = encode_reply(SOCKS5_VERSION, ReplyCode::Succeeded, &bound);
        assert_eq!(
            &reply[..],
            &[0x05, 0x00, 0x00, 0x01, 192, 168, 1, 1, 0x1F, 0x90]
        );
    }

    #[test]
    fn test_encode_reply_ipv6() {
        let bound = TargetAddr::ipv6(Ipv6Addr::LOCALHOST, 443);
        let reply = encode_reply(SOCKS5_VERSION, ReplyCode::Succeeded, &bound);
        assert_eq!(reply[3], SOCKS5_ADDR_TYPE_IPV6);
        assert_eq!(reply.len(), 3 + 1 + 16 + 2);
    }

    #[test]
    fn test_encode_reply_domain() {
        let bound = TargetAddr::domain("proxy.local", 1080);
        let reply = encode_reply(SOCKS5_VERSION, ReplyCode::Succeeded, &bound);
        assert_eq!(reply[3], SOCKS5_ADDR_TYPE_DOMAIN);
        assert_eq!(reply[4], 11);
        assert_eq!(&reply[5..16], b"proxy.local");
        assert_eq!(&reply[16..18], &1080u16.to_be_bytes());
    }

    #[test]
    fn test_encode_general_failure_reply() {
        let reply = encode_reply(
            SOCKS5_VERSION,
            ReplyCode::GeneralFailure,
            &TargetAddr::unspecified(),
        );
        assert_eq!(&reply[..], &[0x05, 0x01, 0x00, 0x01, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_method_selection_and_auth_result() {
        assert_eq!(encode_method_selection(SOCKS5_AUTH_METHOD_NONE), [0x05, 0x00]);
        assert_eq!(
            encode_method_selection(SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE),
            [0x05, 0xFF]
        );
        assert_eq!(encode_auth_result(SOCKS5_AUTH_VERSION, true), [0x01, 0x00]);
        assert_eq!(encode_auth_result(SOCKS5_AUTH_VERSION, false), [0x01, 0x01]);
    }
}
