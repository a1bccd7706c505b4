#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// HTTP upload of the report.
pub mod post;
/// The fixed-width console report.
pub mod pretty;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use bon::Builder;
use serde::{Deserialize, Serialize};

pub use post::{FileAttachment, collect_attachments, upload};
pub use pretty::render;

use crate::{
    config::GraderConfig,
    gate::GateOutcome,
    grade::{ModuleSummary, ScoreEntry},
    manifest::TagValue,
    vcs::{GitUser, RepoSnapshot},
};

/// Repository metadata attached to the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    /// Remote name to URL
    pub remotes: BTreeMap<String, String>,
    /// Configured identity
    pub user:    GitUser,
    /// HEAD commit id
    pub head:    String,
}

impl From<&RepoSnapshot> for GitInfo {
    fn from(snapshot: &RepoSnapshot) -> Self {
        Self {
            remotes: snapshot.remotes.clone(),
            user:    snapshot.user.clone(),
            head:    snapshot.head.clone(),
        }
    }
}

/// Top-level keys of the report and its upload body. Report tags may not
/// reuse them.
pub const REPORT_KEYS: &[&str] = &[
    "modules",
    "scores",
    "pointsEarned",
    "pointsPossible",
    "assignment",
    "checkpoint",
    "contributors",
    "output",
    "git",
    "files",
];

#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// The graded result of one run
pub struct ScoreReport {
    /// * `modules`: which modules produced test reports
    #[builder(default)]
    pub modules:           Vec<ModuleSummary>,
    /// * `scores`: every score entry in discovery order
    #[builder(default)]
    pub scores:            Vec<ScoreEntry>,
    /// * `points_earned`: total after capping
    pub points_earned:     u32,
    /// * `points_possible`: total possible after capping
    pub points_possible:   u32,
    /// * `raw_points_earned`: total before capping, when capping lowered it
    #[serde(skip)]
    pub raw_points_earned: Option<u32>,
    /// * `assignment`: assignment identifier
    pub assignment:        Option<String>,
    /// * `checkpoint`: checkpoint identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint:        Option<String>,
    /// * `contributors`: identified contributors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributors:      Option<Vec<String>>,
    /// * `output`: captured build and test output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output:            Option<String>,
    /// * `git`: repository metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git:               Option<GitInfo>,
    /// * `tags`: custom top-level keys
    #[serde(flatten)]
    #[builder(default)]
    pub tags:              BTreeMap<String, TagValue>,
}

impl ScoreReport {
    /// Compact JSON, as written locally and uploaded.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Could not serialize score report")
    }
}

/// Sends the report to every configured destination.
///
/// * `config`: reporting settings and grading root
/// * `report`: the finalized report
/// * `gate`: what the gate recorded, for the commit reminder
///
/// Only the local JSON file can fail the run; the upload never does.
pub async fn emit(config: &GraderConfig, report: &ScoreReport, gate: GateOutcome) -> Result<()> {
    let reporting = &config.reporting;
    let json = report.to_json()?;

    if let Some(path) = &reporting.json_file {
        let path = config.resolve(path);
        std::fs::write(&path, &json)
            .with_context(|| format!("Could not write report to {}", path.display()))?;
        tracing::debug!("Report written to {}", path.display());
    }
    if reporting.print_json {
        println!("{json}");
    }
    if reporting.print_pretty.enabled {
        print!("{}", render(&reporting.print_pretty, report, gate));
    }
    if let Some(endpoint) = &reporting.post.endpoint {
        let files = if reporting.post.include_files.is_empty() {
            None
        } else {
            Some(collect_attachments(&config.root, &reporting.post.include_files))
        };
        upload(endpoint, report, files).await;
    }
    Ok(())
}
