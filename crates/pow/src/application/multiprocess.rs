//! Multi-Process Strategy
//!
//! Starts one worker process per logical CPU (see [`crate::application::worker`]).
//! Each process is bounded by its own attempt budget. A round in which every
//! process exhausts its budget fails the solve, unless more rounds are
//! configured. The first verified suffix wins. Remaining children get
//! their stdin closed (cooperative stop) and are killed when dropped.

use crate::application::config::SolverConfig;
use crate::application::worker::{EXIT_EXHAUSTED, EXIT_FOUND, EXIT_STOPPED, WorkerArgs};
use crate::domain::entities::{PowSolution, PowTask};
use crate::domain::services::verify_pow;
use crate::domain::solver::Solver;
use crate::domain::value_objects::Strategy;
use crate::error::{PowError, PowResult};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinSet;

/// What a finished worker process reported
#[derive(Debug, Clone, PartialEq, Eq)]
enum WorkerReport {
    Found(String),
    Exhausted,
}

/// Solver that fans out to child processes
#[derive(Debug, Clone)]
pub struct MultiProcessSolver {
    config: Arc<SolverConfig>,
    program: PathBuf,
}

impl MultiProcessSolver {
    /// Use `config.worker_program`, or the current executable
    pub fn new(config: Arc<SolverConfig>) -> PowResult<Self> {
        let program = match &config.worker_program {
            Some(program) => program.clone(),
            None => std::env::current_exe()?,
        };
        Ok(Self::with_program(config, program))
    }

    pub fn with_program(config: Arc<SolverConfig>, program: impl Into<PathBuf>) -> Self {
        Self {
            config,
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn worker_count(&self) -> usize {
        self.config.process_workers()
    }

    async fn run_rounds(&self, task: &PowTask) -> PowResult<PowSolution> {
        let workers = self.worker_count();
        let args = WorkerArgs {
            challenge: task.challenge.clone(),
            difficulty: task.difficulty,
            budget: self.config.process_attempt_budget,
            suffix_length: self.config.suffix_length,
            check_interval: self.config.stop_check_interval,
        };

        let per_round = workers as u64 * args.budget;
        let mut round = 0u64;
        loop {
            round += 1;
            tracing::debug!(
                round,
                workers,
                budget = args.budget,
                program = %self.program.display(),
                "Starting worker process round"
            );

            if let Some(suffix) = self.run_round(&args, workers).await? {
                if !verify_pow(&task.challenge, &suffix, task.difficulty) {
                    return Err(PowError::WorkerFailed(format!(
                        "worker returned a suffix that does not verify: {suffix:?}"
                    )));
                }
                // Workers do not report counts; the winning round counts as spent
                return Ok(PowSolution {
                    suffix,
                    attempts: round * per_round,
                    strategy: Strategy::MultiProcess,
                });
            }

            tracing::info!(round, "All worker processes exhausted their budget");
            if self.config.process_rounds.is_some_and(|limit| round >= limit) {
                return Err(PowError::Exhausted {
                    attempts: round * per_round,
                });
            }
        }
    }

    /// One round: first `Found` wins, `None` when every worker exhausted
    async fn run_round(&self, args: &WorkerArgs, workers: usize) -> PowResult<Option<String>> {
        let mut running = JoinSet::new();
        for _ in 0..workers {
            let child = self.spawn_worker(args)?;
            running.spawn(wait_for_worker(child));
        }

        while let Some(joined) = running.join_next().await {
            let report = joined.map_err(|e| PowError::WorkerFailed(e.to_string()))??;
            if let WorkerReport::Found(suffix) = report {
                // Dropping the set aborts the other waits, which closes their
                // stdin and kills the processes.
                return Ok(Some(suffix));
            }
        }
        Ok(None)
    }

    fn spawn_worker(&self, args: &WorkerArgs) -> PowResult<Child> {
        let child = Command::new(&self.program)
            .args(args.to_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;
        Ok(child)
    }
}

impl Solver for MultiProcessSolver {
    async fn solve(&self, task: &PowTask) -> PowResult<PowSolution> {
        let started = Instant::now();
        match tokio::time::timeout_at(task.deadline, self.run_rounds(task)).await {
            Ok(result) => result,
            Err(_) => Err(PowError::Timeout {
                elapsed: started.elapsed(),
            }),
        }
    }
}

async fn wait_for_worker(mut child: Child) -> PowResult<WorkerReport> {
    // Held open for the child's lifetime; dropping it is the stop signal.
    let _stdin = child.stdin.take();
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| PowError::WorkerFailed("worker stdout not captured".to_string()))?;

    let mut output = String::new();
    stdout.read_to_string(&mut output).await?;
    let status = child.wait().await?;

    match status.code() {
        Some(EXIT_FOUND) => {
            let suffix = output.trim_end_matches(['\r', '\n']);
            if suffix.is_empty() {
                return Err(PowError::WorkerFailed(
                    "worker exited successfully without a suffix".to_string(),
                ));
            }
            Ok(WorkerReport::Found(suffix.to_string()))
        }
        Some(EXIT_EXHAUSTED) => Ok(WorkerReport::Exhausted),
        Some(EXIT_STOPPED) => Err(PowError::WorkerFailed(
            "worker stopped before its budget was used".to_string(),
        )),
        _ => Err(PowError::WorkerFailed(format!("worker exited with {status}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Difficulty;
    use std::time::Duration;

    #[test]
    fn test_worker_program_override() {
        let config = SolverConfig {
            worker_program: Some(PathBuf::from("/opt/bin/worker")),
            process_count: Some(3),
            ..Default::default()
        };
        let solver = MultiProcessSolver::new(Arc::new(config)).unwrap();
        assert_eq!(solver.program(), Path::new("/opt/bin/worker"));
        assert_eq!(solver.worker_count(), 3);
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_spawn() {
        let config = Arc::new(SolverConfig {
            process_count: Some(1),
            ..Default::default()
        });
        let solver = MultiProcessSolver::with_program(config, "/nonexistent/pow-worker");
        let task = PowTask::new("abc", Difficulty::new(6).unwrap(), Duration::from_secs(5));
        let err = solver.solve(&task).await.unwrap_err();
        assert!(matches!(err, PowError::WorkerSpawn(_)));
    }
}
