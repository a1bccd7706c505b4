#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use md5::{Digest, Md5};

use crate::util::find_matching;

/// Prefix of the marker line carrying a file's fingerprint.
pub const MD5_PREFIX: &str = "// md5:";

/// Commentary appended after the digest when stamping.
const STAMP_SUFFIX: &str = "// DO NOT REMOVE THIS LINE";

/// Errors raised while reading or stamping fingerprints.
#[derive(thiserror::Error, Debug)]
pub enum FingerprintError {
    /// A marker line exists but is not the last non-blank line.
    #[error("Fingerprint should be on the final non-blank line of {0}")]
    MisplacedMarker(String),
    /// The file could not be read or written.
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// Outcome of checking a file's stored fingerprint against its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Stored and computed digests agree.
    Valid,
    /// The content changed since it was stamped.
    Mismatch {
        /// Digest found on the marker line.
        stored:   String,
        /// Digest of the current content.
        computed: String,
    },
    /// No marker line was found.
    Missing,
}

/// Splits on `\r\n`, `\n`, or a lone `\r`.
fn split_lines(content: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = content.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&content[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&content[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    lines.push(&content[start..]);
    lines
}

/// Returns the lines covered by the fingerprint.
///
/// * `content`: full file content
/// * `name`: file name used in the error message
fn lines_to_fingerprint<'a>(
    content: &'a str,
    name: &str,
) -> Result<Vec<&'a str>, FingerprintError> {
    let lines = split_lines(content.trim_end());
    let has_marker = lines.iter().any(|line| line.starts_with(MD5_PREFIX));
    if has_marker && !lines.last().is_some_and(|line| line.starts_with(MD5_PREFIX)) {
        return Err(FingerprintError::MisplacedMarker(name.to_string()));
    }

    Ok(lines
        .into_iter()
        .filter(|line| !line.starts_with(MD5_PREFIX))
        .collect())
}

/// Lower-hex MD5 of the given lines joined with `\n`.
fn digest_lines(lines: &[&str]) -> String {
    let mut hasher = Md5::new();
    hasher.update(lines.join("\n").as_bytes());
    hex::encode(hasher.finalize())
}

/// Computes the fingerprint of `content`, ignoring any marker lines.
pub fn compute_fingerprint(content: &str) -> Result<String, FingerprintError> {
    Ok(digest_lines(&lines_to_fingerprint(content, "<content>")?))
}

/// Returns the digest stored on the first marker line, if any.
pub fn retrieve_fingerprint(content: &str) -> Option<String> {
    split_lines(content.trim_end())
        .into_iter()
        .find_map(|line| line.strip_prefix(MD5_PREFIX))
        .map(|rest| rest.split_whitespace().next().unwrap_or_default().to_string())
}

/// Checks the stored fingerprint of `content` against its current lines.
pub fn verify(content: &str) -> Result<Verification, FingerprintError> {
    let Some(stored) = retrieve_fingerprint(content) else {
        return Ok(Verification::Missing);
    };
    let computed = compute_fingerprint(content)?;

    if stored == computed {
        Ok(Verification::Valid)
    } else {
        Ok(Verification::Mismatch { stored, computed })
    }
}

/// Returns `content` with a fresh marker line in place of any old one.
pub fn stamp(content: &str) -> Result<String, FingerprintError> {
    let lines = lines_to_fingerprint(content, "<content>")?;
    let digest = digest_lines(&lines);
    let mut stamped = lines.join("\n");
    stamped.push_str(&format!("\n{MD5_PREFIX} {digest} {STAMP_SUFFIX}\n"));
    Ok(stamped)
}

/// Rewrites the file at `path` with a fresh marker line.
pub fn stamp_file(path: &Path) -> Result<(), FingerprintError> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let stamped = stamp(&content).map_err(|e| match e {
        FingerprintError::MisplacedMarker(_) => {
            FingerprintError::MisplacedMarker(path.display().to_string())
        }
        other => other,
    })?;
    std::fs::write(path, stamped)
        .with_context(|| format!("Could not write {}", path.display()))?;
    Ok(())
}

/// Checks a single protected file, naming it relative to `root` on failure.
///
/// Returns the student-facing message for a missing, edited, or malformed
/// fingerprint.
pub fn check_file(path: &Path, root: &Path) -> Result<(), String> {
    let name = path
        .strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string();
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Could not read test file {name}: {e}"))?;

    match verify(&content) {
        Ok(Verification::Valid) => Ok(()),
        Ok(Verification::Missing) => Err(format!("Could not find fingerprint for file {name}")),
        Ok(Verification::Mismatch { .. }) => Err(format!(
            "Fingerprint mismatch for test file {name}. Undo your changes, restore from Git, or \
             download again."
        )),
        Err(FingerprintError::MisplacedMarker(_)) => {
            Err(FingerprintError::MisplacedMarker(name).to_string())
        }
        Err(e) => Err(format!("{e:#}")),
    }
}

/// Checks every protected file under `root` matching `patterns`.
///
/// Returns an empty string when all files are intact, otherwise the message
/// for the first offending file.
pub fn check_protected_files(root: &Path, patterns: &[String]) -> String {
    let files = match find_matching(root, patterns) {
        Ok(files) => files,
        Err(e) => return format!("{e:#}"),
    };

    for file in &files {
        if let Err(message) = check_file(file, root) {
            tracing::warn!("{message}");
            return message;
        }
    }

    tracing::debug!("{} protected files verified", files.len());
    String::new()
}

/// Stamps every protected file under `root` matching `patterns`, returning the
/// files touched in the order they were stamped.
pub fn fingerprint_files(
    root: &Path,
    patterns: &[String],
) -> Result<Vec<PathBuf>, FingerprintError> {
    let mut files = find_matching(root, patterns)?;
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    for file in &files {
        stamp_file(file)?;
        tracing::info!("Fingerprinted {}", file.display());
    }
    Ok(files)
}
