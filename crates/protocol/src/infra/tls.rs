//! TLS Connection
//!
//! Opens the TCP connection and runs the rustls handshake, both bounded by
//! one connect timeout.

use crate::error::{SessionError, SessionResult};
use rustls::ClientConfig;
use rustls::pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

/// Default bound on TCP connect plus handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how to connect
#[derive(Debug, Clone)]
pub struct ConnectTarget {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
}

impl ConnectTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Connect and complete the TLS handshake
pub async fn connect_tls(
    target: &ConnectTarget,
    config: Arc<ClientConfig>,
) -> SessionResult<TlsStream<TcpStream>> {
    let addr = target.addr();
    let server_name = ServerName::try_from(target.host.as_str())
        .map_err(|_| SessionError::InvalidServerName(target.host.clone()))?
        .to_owned();

    let handshake = async {
        let tcp = TcpStream::connect((target.host.as_str(), target.port))
            .await
            .map_err(|source| SessionError::Connect {
                addr: addr.clone(),
                source,
            })?;
        tcp.set_nodelay(true).map_err(|source| SessionError::Connect {
            addr: addr.clone(),
            source,
        })?;

        TlsConnector::from(config)
            .connect(server_name, tcp)
            .await
            .map_err(|source| SessionError::Handshake {
                addr: addr.clone(),
                source,
            })
    };

    let stream = tokio::time::timeout(target.connect_timeout, handshake)
        .await
        .map_err(|_| SessionError::ConnectTimeout {
            addr: addr.clone(),
            timeout: target.connect_timeout,
        })??;

    let (_, connection) = stream.get_ref();
    tracing::info!(
        addr = %addr,
        tls_version = ?connection.protocol_version(),
        cipher_suite = ?connection.negotiated_cipher_suite().map(|s| s.suite()),
        "TLS connection established"
    );
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::tls::{TlsSettings, build_client_config};

    #[test]
    fn test_target_addr() {
        let target = ConnectTarget::new("localhost", 3336);
        assert_eq!(target.addr(), "localhost:3336");
        assert_eq!(target.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[tokio::test]
    async fn test_refused_connection_is_connection_error() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = build_client_config(&TlsSettings::default()).unwrap();
        let target = ConnectTarget::new("127.0.0.1", port);
        let err = connect_tls(&target, config).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::SessionErrorKind::Connection);
    }

    #[tokio::test]
    async fn test_handshake_failure_against_plain_tcp() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                use tokio::io::AsyncWriteExt;
                let _ = socket.write_all(b"HELO\n").await;
            }
        });

        let config = build_client_config(&TlsSettings::default()).unwrap();
        let target = ConnectTarget::new("127.0.0.1", port);
        let err = connect_tls(&target, config).await.unwrap_err();
        assert!(matches!(err, SessionError::Handshake { .. }), "{err:?}");
    }
}
