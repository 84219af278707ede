//! Process Worker
//!
//! Child side of the multi-process strategy. The parent starts the client
//! executable with the `pow-worker` subcommand and the arguments built by
//! [`WorkerArgs::to_args`]. The child searches up to its budget, prints the
//! suffix on stdout and exits with [`EXIT_FOUND`], or exits with
//! [`EXIT_EXHAUSTED`]. Closing the child's stdin asks it to stop early.

use crate::domain::services::{SearchLimits, SearchOutcome, StopFlag, SuffixSearch, run_search};
use crate::domain::value_objects::{Difficulty, SuffixLength};
use std::io::{self, Read, Write};
use std::thread;

/// Subcommand name the parent passes first
pub const WORKER_SUBCOMMAND: &str = "pow-worker";

pub const EXIT_FOUND: i32 = 0;
pub const EXIT_EXHAUSTED: i32 = 1;
/// Stopped by the parent before finding anything
pub const EXIT_STOPPED: i32 = 3;

/// Parameters for one worker process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerArgs {
    pub challenge: String,
    pub difficulty: Difficulty,
    pub budget: u64,
    pub suffix_length: SuffixLength,
    pub check_interval: u64,
}

impl WorkerArgs {
    /// Command-line arguments after the executable name
    pub fn to_args(&self) -> Vec<String> {
        vec![
            WORKER_SUBCOMMAND.to_string(),
            // `=` keeps a challenge that starts with `-` from reading as a flag.
            format!("--challenge={}", self.challenge),
            format!("--difficulty={}", self.difficulty),
            format!("--budget={}", self.budget),
            format!("--min-len={}", self.suffix_length.min()),
            format!("--max-len={}", self.suffix_length.max()),
            format!("--check-interval={}", self.check_interval),
        ]
    }
}

/// Search within the worker's budget until found, exhausted or stopped
pub fn run_worker(args: &WorkerArgs, stop: &StopFlag) -> SearchOutcome {
    let mut search = SuffixSearch::new(&args.challenge, args.difficulty, args.suffix_length);
    let limits = SearchLimits {
        budget: Some(args.budget),
        check_interval: args.check_interval,
        deadline: None,
    };
    run_search(&mut search, &mut rand::rng(), limits, Some(stop), None)
}

/// Run as a child process: watch stdin for the stop signal, report on stdout
///
/// Returns the process exit code.
pub fn serve_stdio(args: &WorkerArgs) -> i32 {
    let stop = StopFlag::new();
    watch_stdin(stop.clone());

    match run_worker(args, &stop) {
        SearchOutcome::Found { suffix, attempts } => {
            tracing::debug!(attempts, "Worker found a suffix");
            let mut stdout = io::stdout().lock();
            match writeln!(stdout, "{suffix}").and_then(|()| stdout.flush()) {
                Ok(()) => EXIT_FOUND,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to report suffix to parent");
                    EXIT_STOPPED
                }
            }
        }
        SearchOutcome::Exhausted { attempts } => {
            tracing::debug!(attempts, "Worker budget exhausted");
            EXIT_EXHAUSTED
        }
        SearchOutcome::Stopped { attempts } => {
            tracing::debug!(attempts, "Worker stopped by parent");
            EXIT_STOPPED
        }
    }
}

/// Raise `stop` once stdin reaches end of file or fails
fn watch_stdin(stop: StopFlag) {
    let spawned = thread::Builder::new()
        .name("pow-worker-stdin".to_string())
        .spawn(move || {
            let mut stdin = io::stdin().lock();
            let mut buf = [0u8; 64];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => continue,
                }
            }
            stop.raise();
        });

    if let Err(e) = spawned {
        // Still bounded by the attempt budget.
        tracing::warn!(error = %e, "Could not watch stdin for stop signal");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::verify_pow;

    fn args(difficulty: u8, budget: u64) -> WorkerArgs {
        WorkerArgs {
            challenge: "-abc".to_string(),
            difficulty: Difficulty::new(difficulty).unwrap(),
            budget,
            suffix_length: SuffixLength::default(),
            check_interval: 100,
        }
    }

    #[test]
    fn test_to_args_layout() {
        let argv = args(6, 1_000_000).to_args();
        assert_eq!(argv[0], WORKER_SUBCOMMAND);
        assert_eq!(argv[1], "--challenge=-abc");
        assert_eq!(argv[2], "--difficulty=6");
        assert_eq!(argv[3], "--budget=1000000");
        assert_eq!(argv[4], "--min-len=4");
        assert_eq!(argv[5], "--max-len=16");
    }

    #[test]
    fn test_run_worker_finds_low_difficulty() {
        let args = args(1, 100_000);
        match run_worker(&args, &StopFlag::new()) {
            SearchOutcome::Found { suffix, .. } => {
                assert!(verify_pow(&args.challenge, &suffix, args.difficulty));
            }
            other => panic!("expected a suffix, got {other:?}"),
        }
    }

    #[test]
    fn test_run_worker_respects_budget() {
        let args = args(Difficulty::MAX, 500);
        assert_eq!(
            run_worker(&args, &StopFlag::new()),
            SearchOutcome::Exhausted { attempts: 500 }
        );
    }
}
