//! Domain Value Objects
//!
//! Immutable value types for the PoW domain.

use crate::error::PowError;
use derive_more::Display;
use platform::crypto::SHA1_HEX_LEN;
use std::str::FromStr;

/// Required number of leading `'0'` hex digits in the digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub struct Difficulty(u8);

impl Difficulty {
    pub const ZERO: Difficulty = Difficulty(0);
    /// A SHA-1 hex digest has 40 digits; anything above can never be satisfied
    pub const MAX: u8 = SHA1_HEX_LEN as u8;

    pub fn new(zeros: u8) -> Option<Self> {
        if zeros <= Self::MAX {
            Some(Self(zeros))
        } else {
            None
        }
    }

    pub fn zeros(&self) -> u8 {
        self.0
    }

    /// Expected attempts for a uniformly distributed digest: 16^d
    pub fn expected_attempts(&self) -> f64 {
        16f64.powi(i32::from(self.0))
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

impl FromStr for Difficulty {
    type Err = PowError;

    /// Parse a decimal difficulty as sent on the wire (`POW <challenge> <difficulty>`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PowError::InvalidDifficulty(s.to_string()));
        }
        s.parse::<u8>()
            .ok()
            .and_then(Difficulty::new)
            .ok_or_else(|| PowError::InvalidDifficulty(s.to_string()))
    }
}

/// Concurrency model used for one solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Strategy {
    #[display("sequential")]
    Sequential,
    #[display("threaded")]
    Threaded,
    #[display("multi-process")]
    MultiProcess,
}

/// Inclusive bounds for sampled suffix lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuffixLength {
    min: usize,
    max: usize,
}

impl SuffixLength {
    pub fn new(min: usize, max: usize) -> Option<Self> {
        if min >= 1 && min <= max {
            Some(Self { min, max })
        } else {
            None
        }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

impl Default for SuffixLength {
    fn default() -> Self {
        Self { min: 4, max: 16 }
    }
}
