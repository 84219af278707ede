//! Domain Services
//!
//! Pure domain logic for PoW search and verification.

use crate::domain::value_objects::{Difficulty, SuffixLength};
use platform::crypto::{SHA1_LEN, sha1_concat};
use rand::Rng;
use sha1::{Digest, Sha1};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

/// Suffix alphabet: printable ASCII without whitespace (`0x21..=0x7E`)
pub const SUFFIX_ALPHABET: [u8; 94] = {
    let mut table = [0u8; 94];
    let mut i = 0;
    while i < table.len() {
        table[i] = 0x21 + i as u8;
        i += 1;
    }
    table
};

/// Whether `c` may appear in a suffix
pub fn is_suffix_char(c: char) -> bool {
    c.is_ascii_graphic()
}

/// Compute SHA-1 of the challenge followed by the suffix
pub fn compute_pow_digest(challenge: &[u8], suffix: &[u8]) -> [u8; SHA1_LEN] {
    sha1_concat(&[challenge, suffix])
}

/// Count leading zero hex digits (nibbles) in a digest
pub fn count_leading_zero_nibbles(digest: &[u8]) -> u32 {
    let mut count = 0u32;
    for &byte in digest {
        if byte == 0 {
            count += 2;
        } else {
            if byte >> 4 == 0 {
                count += 1;
            }
            break;
        }
    }
    count
}

/// Verify that a digest meets the difficulty requirement
pub fn verify_difficulty(digest: &[u8], difficulty: Difficulty) -> bool {
    count_leading_zero_nibbles(digest) >= u32::from(difficulty.zeros())
}

/// Verify a PoW solution, including the suffix alphabet
pub fn verify_pow(challenge: &str, suffix: &str, difficulty: Difficulty) -> bool {
    if !suffix.chars().all(is_suffix_char) {
        return false;
    }
    let digest = compute_pow_digest(challenge.as_bytes(), suffix.as_bytes());
    verify_difficulty(&digest, difficulty)
}

/// Random suffix sampler with the challenge hash prefix precomputed
///
/// One instance per worker; it is not shared between threads.
#[derive(Clone)]
pub struct SuffixSearch {
    prefix: Sha1,
    difficulty: Difficulty,
    lengths: SuffixLength,
    candidate: Vec<u8>,
}

impl SuffixSearch {
    pub fn new(challenge: &str, difficulty: Difficulty, lengths: SuffixLength) -> Self {
        Self {
            prefix: Sha1::new_with_prefix(challenge.as_bytes()),
            difficulty,
            lengths,
            candidate: Vec::with_capacity(lengths.max()),
        }
    }

    /// Sample one candidate and test it; on `true` the candidate is in [`Self::suffix`]
    pub fn attempt<R: Rng>(&mut self, rng: &mut R) -> bool {
        let len = rng.random_range(self.lengths.min()..=self.lengths.max());
        self.candidate.clear();
        self.candidate.extend(
            (0..len).map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())]),
        );

        let mut hasher = self.prefix.clone();
        hasher.update(&self.candidate);
        let digest: [u8; SHA1_LEN] = hasher.finalize().into();
        verify_difficulty(&digest, self.difficulty)
    }

    /// Last sampled candidate
    pub fn suffix(&self) -> &str {
        // The alphabet is ASCII, so this never falls back.
        std::str::from_utf8(&self.candidate).unwrap_or_default()
    }
}

/// Result of a bounded search loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found { suffix: String, attempts: u64 },
    /// Attempt budget used up
    Exhausted { attempts: u64 },
    /// Stop flag raised or deadline reached
    Stopped { attempts: u64 },
}

/// Limits for one search loop
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    /// Maximum attempts, `None` for unbounded
    pub budget: Option<u64>,
    /// Attempts between checks of the stop flag and deadline
    pub check_interval: u64,
    /// Wall-clock deadline
    pub deadline: Option<Instant>,
}

/// Shared cooperative stop signal for concurrent workers
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Guard that raises the flag when dropped
    pub fn raise_on_drop(&self) -> StopGuard {
        StopGuard(self.clone())
    }
}

/// Raises its [`StopFlag`] on drop
#[derive(Debug)]
pub struct StopGuard(StopFlag);

impl Drop for StopGuard {
    fn drop(&mut self) {
        self.0.raise();
    }
}

/// Run attempts until a solution, the budget, the deadline or the stop flag
///
/// `progress` receives attempt counts in `check_interval` sized chunks so
/// concurrent workers can publish a shared total.
pub fn run_search<R: Rng>(
    search: &mut SuffixSearch,
    rng: &mut R,
    limits: SearchLimits,
    stop: Option<&StopFlag>,
    progress: Option<&AtomicU64>,
) -> SearchOutcome {
    let interval = limits.check_interval.max(1);
    let mut attempts = 0u64;
    let mut unreported = 0u64;

    loop {
        if limits.budget.is_some_and(|budget| attempts >= budget) {
            publish(progress, unreported);
            return SearchOutcome::Exhausted { attempts };
        }

        attempts += 1;
        unreported += 1;
        if search.attempt(rng) {
            publish(progress, unreported);
            return SearchOutcome::Found {
                suffix: search.suffix().to_string(),
                attempts,
            };
        }

        if attempts % interval == 0 {
            publish(progress, unreported);
            unreported = 0;
            let stopped = stop.is_some_and(StopFlag::is_raised);
            let expired = limits.deadline.is_some_and(|d| Instant::now() >= d);
            if stopped || expired {
                return SearchOutcome::Stopped { attempts };
            }
        }
    }
}

fn publish(progress: Option<&AtomicU64>, attempts: u64) {
    if let Some(counter) = progress {
        counter.fetch_add(attempts, Ordering::Relaxed);
    }
}
