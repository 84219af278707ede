//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-1 digests, hex encoding)
//! - TLS client configuration (rustls, client certificates, server verification policy)
//! - PEM bundle inspection and splitting

pub mod crypto;
pub mod pem;
pub mod tls;
