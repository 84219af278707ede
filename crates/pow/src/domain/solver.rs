//! Solver Trait
//!
//! Interface for proof-of-work strategies. Implementations are in the application layer.

use crate::domain::entities::{PowSolution, PowTask};
use crate::error::PowResult;

/// Proof-of-work solver
///
/// Returns any suffix such that the hex SHA-1 of `challenge ++ suffix` has
/// `difficulty` leading zeros. No minimality: different calls may return
/// different valid suffixes.
#[trait_variant::make(Solver: Send)]
pub trait LocalSolver {
    async fn solve(&self, task: &PowTask) -> PowResult<PowSolution>;
}
