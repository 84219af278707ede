//! TLS Client Configuration
//!
//! Builds the rustls client configuration used for the protocol connection.
//! The client presents a certificate/key pair when one is configured. Server
//! verification is a policy choice: peers in this protocol commonly run with
//! self-signed certificates, so `ServerVerification::Insecure` is available
//! and must be selected explicitly by the caller.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// TLS result type alias
pub type TlsResult<T> = Result<T, TlsError>;

/// Errors raised while building the TLS client configuration
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No certificate found in {0}")]
    NoCertificate(PathBuf),

    #[error("No private key found in {0}")]
    NoPrivateKey(PathBuf),

    #[error("A client key was configured without a client certificate")]
    KeyWithoutCertificate,

    #[error("TLS configuration error: {0}")]
    Rustls(#[from] rustls::Error),
}

/// How the server certificate is checked
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServerVerification {
    /// Accept any server certificate and hostname. Handshake signatures are still checked.
    #[default]
    Insecure,
    /// Verify the server chain and hostname against the CA certificates in this PEM file
    CaFile(PathBuf),
}

/// TLS settings for the client connection
#[derive(Debug, Clone, Default)]
pub struct TlsSettings {
    /// PEM file with the client certificate chain (may also contain the key)
    pub client_cert: Option<PathBuf>,
    /// PEM file with the client private key; falls back to `client_cert` when absent
    pub client_key: Option<PathBuf>,
    /// Server certificate policy
    pub verification: ServerVerification,
}

/// Build a rustls client configuration from settings
pub fn build_client_config(settings: &TlsSettings) -> TlsResult<Arc<ClientConfig>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder =
        ClientConfig::builder_with_provider(Arc::clone(&provider)).with_safe_default_protocol_versions()?;

    let builder = match &settings.verification {
        ServerVerification::Insecure => {
            tracing::warn!("Server certificate verification is disabled");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert::new(provider)))
        }
        ServerVerification::CaFile(path) => {
            let mut roots = RootCertStore::empty();
            for cert in load_certificates(path)? {
                roots.add(cert)?;
            }
            builder.with_root_certificates(roots)
        }
    };

    let config = match (&settings.client_cert, &settings.client_key) {
        (Some(cert_path), key_path) => {
            let certs = load_certificates(cert_path)?;
            let key = load_private_key(key_path.as_deref().unwrap_or(cert_path))?;
            tracing::info!(
                certificate = %cert_path.display(),
                chain_len = certs.len(),
                "Loaded client certificate"
            );
            builder.with_client_auth_cert(certs, key)?
        }
        (None, Some(_)) => return Err(TlsError::KeyWithoutCertificate),
        (None, None) => builder.with_no_client_auth(),
    };

    Ok(Arc::new(config))
}

/// Load every certificate from a PEM file
pub fn load_certificates(path: &Path) -> TlsResult<Vec<CertificateDer<'static>>> {
    let mut reader = open(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificate(path.to_path_buf()));
    }
    Ok(certs)
}

/// Load the first private key (PKCS#1, PKCS#8 or SEC1) from a PEM file
pub fn load_private_key(path: &Path) -> TlsResult<PrivateKeyDer<'static>> {
    let mut reader = open(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey(path.to_path_buf()))
}

fn open(path: &Path) -> TlsResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Server certificate verifier that accepts any chain and hostname
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl AcceptAnyServerCert {
    fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustls::client::ResolvesClientCert;
    use std::io::Write;

    #[test]
    fn test_insecure_config_without_client_auth() {
        let config = build_client_config(&TlsSettings::default()).unwrap();
        assert!(!config.client_auth_cert_resolver.has_certs());
    }

    #[test]
    fn test_key_without_certificate_is_rejected() {
        let settings = TlsSettings {
            client_key: Some(PathBuf::from("client.key")),
            ..Default::default()
        };
        let err = build_client_config(&settings).unwrap_err();
        assert!(matches!(err, TlsError::KeyWithoutCertificate));
    }

    #[test]
    fn test_missing_certificate_file() {
        let settings = TlsSettings {
            client_cert: Some(PathBuf::from("/nonexistent/client.crt")),
            ..Default::default()
        };
        let err = build_client_config(&settings).unwrap_err();
        assert!(matches!(err, TlsError::Read { .. }));
    }

    #[test]
    fn test_pem_without_certificate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not a pem file").unwrap();

        let err = load_certificates(file.path()).unwrap_err();
        assert!(matches!(err, TlsError::NoCertificate(_)));

        let err = load_private_key(file.path()).unwrap_err();
        assert!(matches!(err, TlsError::NoPrivateKey(_)));
    }
}
