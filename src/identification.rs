#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::Path;

use glob::Pattern;

use crate::{config::IdentificationPolicy, error::GradeError};

/// Reads and validates the contributors file.
///
/// * `policy`: identification settings
/// * `root`: grading root the contributors file is relative to
///
/// Returns the non-blank lines of the file. Every failure carries the
/// policy's custom message when one is set.
pub fn check_contributors(
    policy: &IdentificationPolicy,
    root: &Path,
) -> Result<Vec<String>, GradeError> {
    let path = root.join(&policy.file);
    let fail =
        |default: String| GradeError::Identification(policy.message.clone().unwrap_or(default));

    let text = std::fs::read_to_string(&path).map_err(|_| {
        GradeError::Identification(format!(
            "Missing contributor identification file: {}",
            path.display()
        ))
    })?;
    let contributors: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if !(policy.min_count..=policy.max_count).contains(&contributors.len()) {
        return Err(if contributors.is_empty() {
            fail(format!("Identification file is empty: {}", path.display()))
        } else {
            fail(format!(
                "Invalid number of contributors ({}) in identification file: {}",
                contributors.len(),
                path.display()
            ))
        });
    }

    if let Some(pattern) = &policy.pattern {
        let pattern = Pattern::new(pattern).map_err(|e| {
            GradeError::Identification(format!("Invalid identification pattern {pattern}: {e}"))
        })?;
        if let Some(bad) = contributors.iter().find(|c| !pattern.matches(c)) {
            return Err(fail(format!("Invalid contributor format: {bad}")));
        }
    }

    tracing::debug!("{} contributors identified", contributors.len());
    Ok(contributors)
}
