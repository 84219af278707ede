//! Adaptive Solver
//!
//! Picks the strategy tier from the task difficulty. Expected work grows as
//! 16^difficulty, so each tier trades startup cost for parallelism.

use crate::application::config::SolverConfig;
use crate::application::multiprocess::MultiProcessSolver;
use crate::application::sequential::SequentialSolver;
use crate::application::threaded::ThreadedSolver;
use crate::domain::entities::{PowSolution, PowTask};
use crate::domain::solver::Solver;
use crate::domain::value_objects::{Difficulty, Strategy};
use crate::error::{PowError, PowResult};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Difficulty-keyed dispatch over the three strategies
#[derive(Debug, Clone)]
pub struct AdaptiveSolver {
    config: Arc<SolverConfig>,
    sequential: SequentialSolver,
    threaded: ThreadedSolver,
    multiprocess: MultiProcessSolver,
}

impl AdaptiveSolver {
    /// Build all tiers from one configuration
    pub fn new(config: SolverConfig) -> PowResult<Self> {
        config.validate()?;
        let config = Arc::new(config);
        Ok(Self {
            sequential: SequentialSolver::new(Arc::clone(&config)),
            threaded: ThreadedSolver::new(Arc::clone(&config)),
            multiprocess: MultiProcessSolver::new(Arc::clone(&config))?,
            config,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn strategy_for(&self, difficulty: Difficulty) -> Strategy {
        self.config.strategy_for(difficulty)
    }

    /// Copy of `task` whose deadline is at most `config.timeout` away
    fn bounded(&self, task: &PowTask) -> PowTask {
        let mut bounded = task.clone();
        if let Some(limit) = tokio::time::Instant::now().checked_add(self.config.timeout) {
            bounded.deadline = bounded.deadline.min(limit);
        }
        bounded
    }
}

impl Solver for AdaptiveSolver {
    async fn solve(&self, task: &PowTask) -> PowResult<PowSolution> {
        let task = &self.bounded(task);
        if task.is_expired() {
            let err = PowError::Timeout {
                elapsed: Duration::ZERO,
            };
            err.log();
            return Err(err);
        }

        let strategy = self.strategy_for(task.difficulty);
        let workers = match strategy {
            Strategy::Sequential => 1,
            Strategy::Threaded => self.threaded.worker_count(),
            Strategy::MultiProcess => self.multiprocess.worker_count(),
        };
        tracing::info!(
            difficulty = %task.difficulty,
            strategy = %strategy,
            workers,
            timeout_secs = task.remaining().as_secs(),
            "Solving proof of work"
        );

        let started = Instant::now();
        let result = match strategy {
            Strategy::Sequential => self.sequential.solve(task).await,
            Strategy::Threaded => self.threaded.solve(task).await,
            Strategy::MultiProcess => self.multiprocess.solve(task).await,
        };

        match &result {
            Ok(solution) => tracing::info!(
                strategy = %solution.strategy,
                attempts = solution.attempts,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Proof of work solved"
            ),
            Err(e) => e.log(),
        }
        result
    }
}
