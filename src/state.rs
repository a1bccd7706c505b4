#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled, settings::Style};

/// Score history of one checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointScoreRecord {
    /// Checkpoint id; `null` when grading without checkpoints
    pub checkpoint:       Option<String>,
    /// HEAD commit when the record was written
    #[serde(default)]
    pub last_seen_commit: String,
    /// Best score seen so far; never decreases
    #[serde(default)]
    pub max_score:        u32,
    /// Whether the last run raised the score without a commit
    #[serde(default)]
    pub increased:        bool,
}

/// One row of the `status` table.
#[derive(Tabled)]
struct StatusRow {
    /// Checkpoint id or `(none)`
    #[tabled(rename = "Checkpoint")]
    checkpoint:   String,
    /// Last seen commit, shortened
    #[tabled(rename = "Last seen commit")]
    commit:       String,
    /// Best score
    #[tabled(rename = "Max score")]
    max_score:    u32,
    /// Whether grading is waiting on a commit
    #[tabled(rename = "Needs commit")]
    needs_commit: bool,
}

impl CheckpointScoreRecord {
    /// The implicit record for a checkpoint that has never been graded.
    pub fn empty(checkpoint: Option<String>) -> Self {
        Self {
            checkpoint,
            last_seen_commit: String::new(),
            max_score: 0,
            increased: false,
        }
    }
}

/// The persisted score-state document, one per repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreState {
    /// One record per checkpoint
    pub checkpoints: Vec<CheckpointScoreRecord>,
}

impl ScoreState {
    /// Reads the document at `path`.
    ///
    /// A missing, unreadable, or malformed document is the same as no history
    /// at all.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Ignoring unreadable score state {}: {e}", path.display());
                }
                return Self::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Ignoring malformed score state {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Writes the document to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string(self).context("Could not serialize score state")?;
        std::fs::write(path, text)
            .with_context(|| format!("Could not write score state to {}", path.display()))
    }

    /// Returns the record for `checkpoint`, if one exists.
    pub fn checkpoint(&self, checkpoint: Option<&str>) -> Option<&CheckpointScoreRecord> {
        self.checkpoints
            .iter()
            .find(|record| record.checkpoint.as_deref() == checkpoint)
    }

    /// Renders the records as a table for the console.
    pub fn table(&self) -> String {
        let rows = self.checkpoints.iter().map(|record| StatusRow {
            checkpoint:   record
                .checkpoint
                .clone()
                .unwrap_or_else(|| "(none)".to_string()),
            commit:       record.last_seen_commit.chars().take(10).collect(),
            max_score:    record.max_score,
            needs_commit: record.increased,
        });
        Table::new(rows).with(Style::modern()).to_string()
    }

    /// Replaces the record for the record's checkpoint, or appends it.
    pub fn set_checkpoint(&mut self, record: CheckpointScoreRecord) {
        match self
            .checkpoints
            .iter_mut()
            .find(|existing| existing.checkpoint == record.checkpoint)
        {
            Some(existing) => *existing = record,
            None => self.checkpoints.push(record),
        }
    }
}
