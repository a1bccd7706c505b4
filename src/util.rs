#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glob::glob;
use itertools::Itertools;
use which::which;

/// Finds and returns the path to the git binary
pub fn git_path() -> Result<OsString> {
    which("git")
        .map(PathBuf::into_os_string)
        .context("Cannot find git on path")
}

/// A glob utility function to find files under `root_dir` matching any of
/// `patterns`
///
/// * `root_dir`: the root directory patterns are relative to
/// * `patterns`: glob patterns such as `src/test/**/*Test.java`
///
/// Paths are returned sorted and without duplicates.
pub fn find_matching(root_dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for pattern in patterns {
        let full = root_dir.join(pattern);
        let full = full
            .to_str()
            .context("Could not convert root_dir to string")?
            .to_string();

        found.extend(
            glob(&full)
                .with_context(|| format!("Could not create glob from {pattern}"))?
                .filter_map(Result::ok)
                .filter(|p| p.is_file()),
        );
    }

    Ok(found.into_iter().sorted().dedup().collect())
}

/// Finds report files with the given extension directly inside or below
/// `dir`, in sorted order. A missing directory yields no files.
pub fn find_reports(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    find_matching(dir, &[format!("**/*.{extension}")])
}

/// Takes at most `width` characters of `text`.
pub fn truncate_chars(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Greedy word wrap at `width` columns.
///
/// Words longer than the width are left on a line of their own. Existing line
/// breaks are kept.
pub fn wrap_words(text: &str, width: usize) -> String {
    text.split('\n')
        .map(|paragraph| {
            let mut lines: Vec<String> = Vec::new();
            let mut current = String::new();
            for word in paragraph.split_whitespace() {
                if current.is_empty() {
                    current.push_str(word);
                } else if current.chars().count() + 1 + word.chars().count() <= width {
                    current.push(' ');
                    current.push_str(word);
                } else {
                    lines.push(std::mem::take(&mut current));
                    current.push_str(word);
                }
            }
            lines.push(current);
            lines.join("\n")
        })
        .join("\n")
}
