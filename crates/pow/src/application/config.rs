//! Solver Configuration

use crate::domain::value_objects::{Difficulty, Strategy, SuffixLength};
use crate::error::{PowError, PowResult};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

/// PoW solver configuration
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Highest difficulty solved by the sequential strategy
    pub sequential_max_difficulty: u8,
    /// Highest difficulty solved by the threaded strategy; above this, processes
    pub threaded_max_difficulty: u8,
    /// Attempt cap for the sequential strategy
    pub sequential_attempt_cap: u64,
    /// Upper bound on threaded workers
    pub max_threads: usize,
    /// Threaded worker count override (default: min(2 x logical CPUs, `max_threads`))
    pub thread_count: Option<usize>,
    /// Process worker count override (default: logical CPUs)
    pub process_count: Option<usize>,
    /// Attempt budget per worker process and round
    pub process_attempt_budget: u64,
    /// Worker process rounds before giving up (`None`: until the deadline)
    pub process_rounds: Option<u64>,
    /// Attempts between stop flag / deadline checks
    pub stop_check_interval: u64,
    /// Sampled suffix lengths
    pub suffix_length: SuffixLength,
    /// Upper bound on one solve; tightens any later task deadline
    pub timeout: Duration,
    /// Executable started for process workers (default: the current executable)
    pub worker_program: Option<PathBuf>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            sequential_max_difficulty: 3,
            threaded_max_difficulty: 5,
            sequential_attempt_cap: 1_000_000,
            max_threads: 32,
            thread_count: None,
            process_count: None,
            process_attempt_budget: 1_000_000,
            process_rounds: Some(1),
            stop_check_interval: 1_000,
            suffix_length: SuffixLength::default(),
            timeout: Duration::from_secs(4 * 60 * 60),
            worker_program: None,
        }
    }
}

impl SolverConfig {
    /// Reject settings the strategies cannot run with
    pub fn validate(&self) -> PowResult<()> {
        if self.sequential_max_difficulty > self.threaded_max_difficulty {
            return Err(PowError::InvalidConfig(format!(
                "sequential_max_difficulty ({}) exceeds threaded_max_difficulty ({})",
                self.sequential_max_difficulty, self.threaded_max_difficulty
            )));
        }
        if self.sequential_attempt_cap == 0 || self.process_attempt_budget == 0 {
            return Err(PowError::InvalidConfig(
                "attempt budgets must be positive".to_string(),
            ));
        }
        if self.process_rounds == Some(0) {
            return Err(PowError::InvalidConfig(
                "process_rounds must be positive".to_string(),
            ));
        }
        if self.max_threads == 0 || self.thread_count == Some(0) || self.process_count == Some(0)
        {
            return Err(PowError::InvalidConfig(
                "worker counts must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Strategy tier for a difficulty
    pub fn strategy_for(&self, difficulty: Difficulty) -> Strategy {
        let zeros = difficulty.zeros();
        if zeros <= self.sequential_max_difficulty {
            Strategy::Sequential
        } else if zeros <= self.threaded_max_difficulty {
            Strategy::Threaded
        } else {
            Strategy::MultiProcess
        }
    }

    /// Number of threaded workers
    pub fn threaded_workers(&self) -> usize {
        self.thread_count
            .unwrap_or_else(|| (logical_cpus() * 2).min(self.max_threads))
            .max(1)
    }

    /// Number of process workers
    pub fn process_workers(&self) -> usize {
        self.process_count.unwrap_or_else(logical_cpus).max(1)
    }
}

/// Logical CPU count, 1 when unknown
pub fn logical_cpus() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}
