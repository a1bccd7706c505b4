//! # gradegate
//!
//! A tamper-resistant autograder. It verifies fingerprints on protected test
//! suites, scores test and static-analysis reports against a points manifest,
//! refuses to bank uncommitted score increases, and ships the result as JSON,
//! a console table, and an HTTP upload.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Grader configuration, loaded once and passed down by reference
pub mod config;
/// Error taxonomy for a grading run
pub mod error;
/// Content fingerprints for protected test files
pub mod fingerprint;
/// The anti-regression gate tying score increases to commits
pub mod gate;
/// Scoring of test and static-analysis results
pub mod grade;
/// Contributor identification checks
pub mod identification;
/// Points declarations for graded test cases
pub mod manifest;
/// For all parsers used
pub mod parsers;
/// The ordered grading pipeline
pub mod pipeline;
/// Subprocess helpers
pub mod process;
/// JSON, console, and remote report emission
pub mod report;
/// Upload collection server
pub mod server;
/// Persisted per-checkpoint score state
pub mod state;
/// Utility functions for convenience
pub mod util;
/// Version-control inspection
pub mod vcs;

pub use config::{ConfigError, GraderConfig};
pub use error::GradeError;
pub use pipeline::{GradeRun, Grader};
