//! Application Layer - Session driver
//!
//! The protocol engine and its configuration.

pub mod config;
pub mod engine;
