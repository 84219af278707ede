//! PEM Bundle Utilities
//!
//! Credential bundles are often shipped as one PEM file holding the client
//! certificate and its private key. This module lists what a bundle contains
//! and splits it into separate `.crt` / `.key` files.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zeroize::Zeroizing;

/// PEM result type alias
pub type PemResult<T> = Result<T, PemError>;

#[derive(Debug, Error)]
pub enum PemError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Classification of a PEM block by its label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PemKind {
    Certificate,
    PrivateKey,
    RsaPrivateKey,
    EcPrivateKey,
    EncryptedPrivateKey,
    PublicKey,
    CertificateRequest,
    Other,
}

impl PemKind {
    fn from_label(label: &str) -> Self {
        match label {
            "CERTIFICATE" => PemKind::Certificate,
            "PRIVATE KEY" => PemKind::PrivateKey,
            "RSA PRIVATE KEY" => PemKind::RsaPrivateKey,
            "EC PRIVATE KEY" => PemKind::EcPrivateKey,
            "ENCRYPTED PRIVATE KEY" => PemKind::EncryptedPrivateKey,
            "PUBLIC KEY" => PemKind::PublicKey,
            "CERTIFICATE REQUEST" => PemKind::CertificateRequest,
            _ => PemKind::Other,
        }
    }

    /// Whether this block holds private key material
    pub fn is_private_key(&self) -> bool {
        matches!(
            self,
            PemKind::PrivateKey
                | PemKind::RsaPrivateKey
                | PemKind::EcPrivateKey
                | PemKind::EncryptedPrivateKey
        )
    }

    /// Human readable description
    pub fn describe(&self) -> &'static str {
        match self {
            PemKind::Certificate => "Certificate",
            PemKind::PrivateKey => "Private Key (PKCS#8)",
            PemKind::RsaPrivateKey => "RSA Private Key",
            PemKind::EcPrivateKey => "EC Private Key",
            PemKind::EncryptedPrivateKey => "Encrypted Private Key",
            PemKind::PublicKey => "Public Key",
            PemKind::CertificateRequest => "Certificate Request (CSR)",
            PemKind::Other => "Unrecognized block",
        }
    }
}

/// One `-----BEGIN ...-----` / `-----END ...-----` section, verbatim
#[derive(Clone, PartialEq, Eq)]
pub struct PemBlock {
    pub kind: PemKind,
    pub label: String,
    text: Zeroizing<String>,
}

impl PemBlock {
    /// Block text including the BEGIN and END lines
    pub fn text(&self) -> &str {
        &self.text
    }
}

// Key material stays out of logs.
impl std::fmt::Debug for PemBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PemBlock")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Scan `content` for complete PEM blocks, in order of appearance
pub fn parse_blocks(content: &str) -> Vec<PemBlock> {
    const BEGIN: &str = "-----BEGIN ";
    const DASHES: &str = "-----";

    let mut blocks = Vec::new();
    let mut rest = content;

    while let Some(start) = rest.find(BEGIN) {
        let after_begin = &rest[start + BEGIN.len()..];
        let Some(label_len) = after_begin.find(DASHES) else {
            break;
        };
        let label = &after_begin[..label_len];
        let end_marker = format!("-----END {label}-----");

        let Some(end) = rest[start..].find(&end_marker) else {
            // Unterminated block; skip past this BEGIN marker.
            rest = after_begin;
            continue;
        };
        let block_end = start + end + end_marker.len();

        blocks.push(PemBlock {
            kind: PemKind::from_label(label),
            label: label.to_string(),
            text: Zeroizing::new(rest[start..block_end].to_string()),
        });
        rest = &rest[block_end..];
    }

    blocks
}

/// Counts of each block kind found in a bundle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleSummary {
    pub entries: Vec<(PemKind, usize)>,
}

impl BundleSummary {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: PemKind) -> usize {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, n)| *n)
    }
}

/// Summarize the contents of a PEM bundle
pub fn analyze(content: &str) -> BundleSummary {
    let mut summary = BundleSummary::default();
    for block in parse_blocks(content) {
        match summary.entries.iter_mut().find(|(k, _)| *k == block.kind) {
            Some((_, n)) => *n += 1,
            None => summary.entries.push((block.kind, 1)),
        }
    }
    summary
}

/// Files written by [`extract_bundle`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub certificate: Option<PathBuf>,
    pub private_key: Option<PathBuf>,
}

impl ExtractReport {
    /// Both a certificate and a private key were extracted
    pub fn is_complete(&self) -> bool {
        self.certificate.is_some() && self.private_key.is_some()
    }
}

/// Read a PEM bundle from disk
pub fn read_bundle(path: &Path) -> PemResult<Zeroizing<String>> {
    fs::read_to_string(path)
        .map(Zeroizing::new)
        .map_err(|source| PemError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Split a PEM bundle into `<prefix>.crt` and `<prefix>.key`
///
/// Every certificate goes to the `.crt` file and every private key to the
/// `.key` file, each block followed by a newline. The key file is created
/// with mode `0600` on Unix. Missing kinds are reported as `None` rather
/// than an error so callers can decide how strict to be.
pub fn extract_bundle(bundle_path: &Path, output_prefix: &Path) -> PemResult<ExtractReport> {
    let content = read_bundle(bundle_path)?;
    let blocks = parse_blocks(&content);

    let certificates: Vec<&PemBlock> = blocks
        .iter()
        .filter(|b| b.kind == PemKind::Certificate)
        .collect();
    let keys: Vec<&PemBlock> = blocks.iter().filter(|b| b.kind.is_private_key()).collect();

    let mut report = ExtractReport::default();

    if !certificates.is_empty() {
        let path = with_extension(output_prefix, "crt");
        write_blocks(&path, &certificates, false)?;
        tracing::info!(path = %path.display(), count = certificates.len(), "Certificate saved");
        report.certificate = Some(path);
    } else {
        tracing::warn!(bundle = %bundle_path.display(), "No certificate found in PEM file");
    }

    if !keys.is_empty() {
        let path = with_extension(output_prefix, "key");
        write_blocks(&path, &keys, true)?;
        tracing::info!(path = %path.display(), "Private key saved");
        report.private_key = Some(path);
    } else {
        tracing::warn!(bundle = %bundle_path.display(), "No private key found in PEM file");
    }

    Ok(report)
}

fn with_extension(prefix: &Path, extension: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn write_blocks(path: &Path, blocks: &[&PemBlock], secret: bool) -> PemResult<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    if secret {
        restrict_to_owner(&mut options);
    }

    let to_write_error = |source| PemError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = options.open(path).map_err(to_write_error)?;
    for block in blocks {
        file.write_all(block.text().as_bytes())
            .and_then(|()| file.write_all(b"\n"))
            .map_err(to_write_error)?;
    }
    Ok(())
}

#[cfg(unix)]
fn restrict_to_owner(options: &mut OpenOptions) {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(0o600);
}

#[cfg(not(unix))]
fn restrict_to_owner(_options: &mut OpenOptions) {}
