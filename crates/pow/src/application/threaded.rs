//! Threaded Strategy
//!
//! N OS threads search independently and share one stop flag. The first
//! thread to find a suffix sends it on a channel and raises the flag; the
//! caller waits on the channel until the task deadline.

use crate::application::config::SolverConfig;
use crate::domain::entities::{PowSolution, PowTask};
use crate::domain::services::{
    SearchLimits, SearchOutcome, StopFlag, SuffixSearch, run_search,
};
use crate::domain::solver::Solver;
use crate::domain::value_objects::Strategy;
use crate::error::{PowError, PowResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Instant;
use tokio::sync::mpsc;

/// Multi-threaded solver sharing one stop flag
#[derive(Debug, Clone)]
pub struct ThreadedSolver {
    config: Arc<SolverConfig>,
}

impl ThreadedSolver {
    pub fn new(config: Arc<SolverConfig>) -> Self {
        Self { config }
    }

    pub fn worker_count(&self) -> usize {
        self.config.threaded_workers()
    }
}

impl Solver for ThreadedSolver {
    async fn solve(&self, task: &PowTask) -> PowResult<PowSolution> {
        let started = Instant::now();
        let workers = self.worker_count();
        let stop = StopFlag::new();
        // Raised on every exit path, including when this future is dropped.
        let _guard = stop.raise_on_drop();
        let attempts = Arc::new(AtomicU64::new(0));
        let (found_tx, mut found_rx) = mpsc::unbounded_channel::<String>();

        tracing::debug!(workers, difficulty = %task.difficulty, "Starting threaded search");

        for id in 0..workers {
            let found_tx = found_tx.clone();
            let stop = stop.clone();
            let attempts = Arc::clone(&attempts);
            let mut search =
                SuffixSearch::new(&task.challenge, task.difficulty, self.config.suffix_length);
            let limits = SearchLimits {
                budget: None,
                check_interval: self.config.stop_check_interval,
                deadline: Some(task.deadline.into_std()),
            };

            thread::Builder::new()
                .name(format!("pow-worker-{id}"))
                .spawn(move || {
                    let outcome =
                        run_search(&mut search, &mut rand::rng(), limits, Some(&stop), Some(&attempts));
                    if let SearchOutcome::Found { suffix, .. } = outcome {
                        stop.raise();
                        // The receiver keeps only the first suffix.
                        let _ = found_tx.send(suffix);
                    }
                })?;
        }
        // Workers hold the remaining senders; the channel closes when all have exited.
        drop(found_tx);

        match tokio::time::timeout_at(task.deadline, found_rx.recv()).await {
            Ok(Some(suffix)) => {
                stop.raise();
                Ok(PowSolution {
                    suffix,
                    attempts: attempts.load(Ordering::Relaxed),
                    strategy: Strategy::Threaded,
                })
            }
            Ok(None) | Err(_) => Err(PowError::Timeout {
                elapsed: started.elapsed(),
            }),
        }
    }
}
