//! Sequential Strategy
//!
//! One search loop on the blocking pool, bounded by an attempt cap.

use crate::application::config::SolverConfig;
use crate::domain::entities::{PowSolution, PowTask};
use crate::domain::services::{SearchLimits, SearchOutcome, SuffixSearch, run_search};
use crate::domain::solver::Solver;
use crate::domain::value_objects::Strategy;
use crate::error::{PowError, PowResult};
use std::sync::Arc;
use std::time::Instant;

/// Single-threaded solver for low difficulties
#[derive(Debug, Clone)]
pub struct SequentialSolver {
    config: Arc<SolverConfig>,
}

impl SequentialSolver {
    pub fn new(config: Arc<SolverConfig>) -> Self {
        Self { config }
    }
}

impl Solver for SequentialSolver {
    async fn solve(&self, task: &PowTask) -> PowResult<PowSolution> {
        let config = Arc::clone(&self.config);
        let task = task.clone();
        tokio::task::spawn_blocking(move || solve_blocking(&config, &task))
            .await
            .map_err(|e| PowError::WorkerFailed(e.to_string()))?
    }
}

/// Run the sequential search on the calling thread
pub fn solve_blocking(config: &SolverConfig, task: &PowTask) -> PowResult<PowSolution> {
    let started = Instant::now();
    let mut search = SuffixSearch::new(&task.challenge, task.difficulty, config.suffix_length);
    let limits = SearchLimits {
        budget: Some(config.sequential_attempt_cap),
        check_interval: config.stop_check_interval,
        deadline: Some(task.deadline.into_std()),
    };

    match run_search(&mut search, &mut rand::rng(), limits, None, None) {
        SearchOutcome::Found { suffix, attempts } => {
            tracing::debug!(attempts, "Sequential search found a suffix");
            Ok(PowSolution {
                suffix,
                attempts,
                strategy: Strategy::Sequential,
            })
        }
        SearchOutcome::Exhausted { attempts } => Err(PowError::Exhausted { attempts }),
        SearchOutcome::Stopped { .. } => Err(PowError::Timeout {
            elapsed: started.elapsed(),
        }),
    }
}
