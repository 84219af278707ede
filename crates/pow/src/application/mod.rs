//! Application Layer - Solver strategies
//!
//! This layer runs the domain search loop under a concurrency model.
//! Contains the strategy implementations and the process worker entry point.

pub mod adaptive;
pub mod config;
pub mod multiprocess;
pub mod sequential;
pub mod threaded;
pub mod worker;
