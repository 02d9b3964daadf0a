//! sim-regress - Regression-test driver for simulation executables
//!
//! Runs a simulation once per scenario, scrapes a numeric result from
//! its log output, and compares it against a known-good reference within
//! a tolerance.

pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::{Criterion, Failure, Suite, SuiteReport};
