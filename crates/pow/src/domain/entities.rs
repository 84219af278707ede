//! Domain Entities
//!
//! Core entities for the PoW domain.

use crate::domain::value_objects::{Difficulty, Strategy};
use std::time::Duration;
use tokio::time::Instant;

/// Deadline used when `now + timeout` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// PowTask entity - one `POW` request to solve
#[derive(Debug, Clone)]
pub struct PowTask {
    pub challenge: String,
    pub difficulty: Difficulty,
    pub deadline: Instant,
}

impl PowTask {
    /// Create a task whose deadline is `timeout` from now
    pub fn new(challenge: impl Into<String>, difficulty: Difficulty, timeout: Duration) -> Self {
        let now = Instant::now();
        Self {
            challenge: challenge.into(),
            difficulty,
            deadline: now
                .checked_add(timeout)
                .unwrap_or_else(|| now + FAR_FUTURE),
        }
    }

    /// Check if the deadline has passed
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Time left before the deadline
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// PowSolution entity - a suffix satisfying the task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowSolution {
    pub suffix: String,
    /// Telemetry only: attempts made across all workers when the winner was seen
    pub attempts: u64,
    /// Telemetry only
    pub strategy: Strategy,
}
