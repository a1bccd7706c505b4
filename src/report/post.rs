#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use reqwest::{Client, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::ScoreReport;

/// A file uploaded alongside the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    /// File name without directories
    pub name: String,
    /// Absolute path on the grading machine
    pub path: String,
    /// File content
    pub data: String,
}

/// The upload body: the report plus any attachments.
#[derive(Serialize)]
struct UploadBody<'a> {
    /// The report's own keys
    #[serde(flatten)]
    report: &'a ScoreReport,
    /// Attachments, present only when configured
    #[serde(skip_serializing_if = "Option::is_none")]
    files:  Option<Vec<FileAttachment>>,
}

/// Reads the configured attachments, relative to `root`.
///
/// Files that do not exist or cannot be read as text are left out.
pub fn collect_attachments(root: &Path, files: &[PathBuf]) -> Vec<FileAttachment> {
    files
        .iter()
        .filter_map(|file| {
            let path = root.join(file);
            let data = match std::fs::read_to_string(&path) {
                Ok(data) => data,
                Err(e) => {
                    tracing::debug!("Not attaching {}: {e}", path.display());
                    return None;
                }
            };
            let absolute = std::path::absolute(&path).unwrap_or_else(|_| path.clone());
            Some(FileAttachment {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                path: absolute.display().to_string(),
                data,
            })
        })
        .collect()
}

/// Serializes the upload body.
pub fn upload_body(
    report: &ScoreReport,
    files: Option<Vec<FileAttachment>>,
) -> serde_json::Result<String> {
    serde_json::to_string(&UploadBody { report, files })
}

/// POSTs the report to `endpoint` once.
///
/// Delivery is best effort: every failure is logged and dropped.
pub async fn upload(endpoint: &str, report: &ScoreReport, files: Option<Vec<FileAttachment>>) {
    let body = match upload_body(report, files) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("Could not serialize report for upload: {e}");
            return;
        }
    };

    let client = match Client::builder().build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("Could not construct HTTP client: {e}");
            return;
        }
    };

    match client
        .post(endpoint)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => {
            tracing::debug!("Report uploaded to {endpoint}");
        }
        Ok(resp) => tracing::debug!("Report upload to {endpoint} answered {}", resp.status()),
        Err(e) => tracing::debug!("Report upload to {endpoint} failed: {e}"),
    }
}
