#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::{config::ConfigError, gate::BlockReason};

/// Everything that can stop a grading run before a report is produced.
///
/// Test, compile, and lint failures are not in here: those turn into
/// zero-point entries so the student still gets a report.
#[derive(thiserror::Error, Debug)]
pub enum GradeError {
    /// A protected test file is missing its fingerprint or was edited.
    #[error("{0}")]
    Integrity(String),
    /// The grading setup itself is wrong.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The gate refused to grade until the student acts.
    #[error(transparent)]
    Blocked(#[from] BlockReason),
    /// The contributor identification file is missing or invalid.
    #[error("{0}")]
    Identification(String),
    /// I/O and subprocess plumbing failures.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GradeError {
    /// Process exit code the CLI uses for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            GradeError::Integrity(_) => 3,
            GradeError::Config(_) => 2,
            GradeError::Blocked(_) => 4,
            GradeError::Identification(_) => 5,
            GradeError::Other(_) => 1,
        }
    }
}
