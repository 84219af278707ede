//! Cryptographic Utilities

use sha1::{Digest, Sha1};

/// Length of a SHA-1 digest in bytes
pub const SHA1_LEN: usize = 20;

/// Length of a SHA-1 digest in lowercase hex characters
pub const SHA1_HEX_LEN: usize = SHA1_LEN * 2;

/// Compute SHA-1 hash
pub fn sha1(data: &[u8]) -> [u8; SHA1_LEN] {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-1 over the concatenation of `parts` without allocating the joined input
pub fn sha1_concat(parts: &[&[u8]]) -> [u8; SHA1_LEN] {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Lowercase hex SHA-1 digest of `data`
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(sha1(data))
}

/// Encode bytes as lowercase hex
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
