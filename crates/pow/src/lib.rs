//! PoW (Proof of Work) Solver Module
//!
//! Finds a suffix such that the lowercase hex SHA-1 of `challenge ++ suffix`
//! starts with `difficulty` zeros.
//!
//! Clean Architecture structure:
//! - `domain/` - Predicate, suffix sampling, entities, solver trait
//! - `application/` - Sequential, threaded, multi-process and adaptive strategies
//!
//! ## Strategy tiers
//! - difficulty <= 3: sequential, capped at 1,000,000 attempts
//! - difficulty 4..=5: threads sharing a stop flag, bounded by the deadline
//! - difficulty > 5: worker processes with per-process budgets, bounded by the deadline

pub mod application;
pub mod domain;
pub mod error;

// Re-exports for convenience
pub use application::adaptive::AdaptiveSolver;
pub use application::config::SolverConfig;
pub use application::multiprocess::MultiProcessSolver;
pub use application::sequential::SequentialSolver;
pub use application::threaded::ThreadedSolver;
pub use application::worker::{WORKER_SUBCOMMAND, WorkerArgs};
pub use domain::entities::{PowSolution, PowTask};
pub use domain::services::verify_pow;
pub use domain::solver::Solver;
pub use domain::value_objects::{Difficulty, Strategy, SuffixLength};
pub use error::{PowError, PowResult};
