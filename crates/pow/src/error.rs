//! PoW Error Types

use std::time::Duration;
use thiserror::Error;

/// PoW-specific result type alias
pub type PowResult<T> = Result<T, PowError>;

/// PoW solver errors
///
/// Every variant is fatal to the `POW` command that triggered the solve.
#[derive(Debug, Error)]
pub enum PowError {
    /// Difficulty is not a non-negative integer within the digest length
    #[error("Invalid difficulty: {0}")]
    InvalidDifficulty(String),

    /// Solver configuration cannot be used
    #[error("Invalid solver configuration: {0}")]
    InvalidConfig(String),

    /// Attempt cap reached without a solution
    #[error("Proof of work exhausted after {attempts} attempts")]
    Exhausted { attempts: u64 },

    /// Deadline passed without a solution
    #[error("Proof of work timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    /// Worker thread or process could not be started
    #[error("Failed to start proof-of-work worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    /// Worker crashed or reported something unusable
    #[error("Proof-of-work worker failed: {0}")]
    WorkerFailed(String),
}

impl PowError {
    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            PowError::WorkerSpawn(e) => {
                tracing::error!(error = %e, "PoW worker spawn error");
            }
            PowError::WorkerFailed(msg) => {
                tracing::error!(message = %msg, "PoW worker failure");
            }
            PowError::Exhausted { attempts } => {
                tracing::warn!(attempts, "PoW search exhausted");
            }
            PowError::Timeout { elapsed } => {
                tracing::warn!(elapsed_ms = elapsed.as_millis() as u64, "PoW search timed out");
            }
            _ => {
                tracing::debug!(error = %self, "PoW error");
            }
        }
    }
}
