//! Domain Layer - Proof-of-work vocabulary and search logic
//!
//! This layer contains:
//! - Domain entities (PowTask, PowSolution)
//! - Domain value objects (Difficulty, Strategy, SuffixLength)
//! - Domain services (digest predicate, suffix sampling, search loop)
//! - Solver trait (interface implemented by the strategies)

pub mod entities;
pub mod services;
pub mod solver;
pub mod value_objects;
