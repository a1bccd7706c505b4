#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use super::results::{EntryKind, ScoreEntry};
use crate::{config::ConfigError, parsers::parse_document};

/// A static-analysis tool whose report is worth points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LintTool {
    /// Java style checker
    Checkstyle,
    /// Kotlin static analysis
    Detekt,
}

impl LintTool {
    /// Explanation when the report has no errors.
    fn passed_message(self) -> &'static str {
        match self {
            LintTool::Checkstyle => "No checkstyle errors were reported",
            LintTool::Detekt => "No detekt errors were reported",
        }
    }

    /// Explanation when the report lists errors.
    fn failed_message(self) -> &'static str {
        match self {
            LintTool::Checkstyle => "checkstyle found style issues",
            LintTool::Detekt => "detekt found issues",
        }
    }
}

impl Display for LintTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LintTool::Checkstyle => write!(f, "checkstyle"),
            LintTool::Detekt => write!(f, "detekt"),
        }
    }
}

impl From<LintTool> for EntryKind {
    fn from(tool: LintTool) -> Self {
        match tool {
            LintTool::Checkstyle => EntryKind::Checkstyle,
            LintTool::Detekt => EntryKind::Detekt,
        }
    }
}

/// Where one tool writes its report and what passing it is worth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintSource {
    /// The tool
    pub tool:   LintTool,
    /// XML report the tool writes
    pub report: PathBuf,
    /// Points for a clean report
    pub points: u32,
}

/// The set of scored tools, at most one source per tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintSources {
    /// Registered sources in registration order
    sources: Vec<LintSource>,
}

impl LintSources {
    /// Registers `source`, refusing a second source for the same tool.
    pub fn register(&mut self, source: LintSource) -> Result<(), ConfigError> {
        if self.sources.iter().any(|s| s.tool == source.tool) {
            return Err(ConfigError::DuplicateTool(source.tool));
        }
        self.sources.push(source);
        Ok(())
    }

    /// Registered sources in registration order.
    pub fn sources(&self) -> &[LintSource] {
        &self.sources
    }

    /// Scores every registered tool, one entry each.
    ///
    /// Report paths are resolved against `root`.
    pub fn score_all(&self, root: &Path) -> Vec<ScoreEntry> {
        self.sources
            .iter()
            .map(|s| score(s.tool, &root.join(&s.report), s.points))
            .collect()
    }
}

/// Scores one tool report.
///
/// * `tool`: the tool that wrote the report
/// * `output`: the report file
/// * `points`: points for a clean report
///
/// A missing or empty report means the tool crashed. The full point value is
/// possible either way.
pub fn score(tool: LintTool, output: &Path, points: u32) -> ScoreEntry {
    let ran = std::fs::metadata(output).is_ok_and(|m| m.is_file() && m.len() > 0);

    let (passed, explanation) = if !ran {
        tracing::warn!("{tool} produced no report at {}", output.display());
        (false, format!("{tool} crashed"))
    } else {
        match std::fs::read_to_string(output)
            .map_err(anyhow::Error::from)
            .and_then(|text| parse_document(&text))
        {
            Ok(report) => {
                let passed = report.count("error") == 0;
                let message = if passed {
                    tool.passed_message()
                } else {
                    tool.failed_message()
                };
                (passed, message.to_string())
            }
            Err(e) => {
                tracing::warn!("Could not read {tool} report {}: {e:#}", output.display());
                (false, format!("{tool} report could not be read"))
            }
        }
    };

    ScoreEntry::builder()
        .description(tool.to_string())
        .explanation(explanation)
        .passed(passed)
        .ran(ran)
        .points_possible(points)
        .points_earned(if passed { points } else { 0 })
        .kind(tool.into())
        .build()
}
