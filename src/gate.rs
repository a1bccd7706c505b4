#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The anti-regression gate.
//!
//! Each checkpoint is in one of three states, derived from its persisted
//! record and the current repository snapshot:
//!
//! * not increased: grading runs freely;
//! * increased and uncommitted (`increased`, same HEAD, dirty tree): blocked;
//! * increased and committed (HEAD moved or tree clean): released.
//!
//! A run that raises the best score with uncommitted changes moves the
//! checkpoint into the blocking state for the next run.

use crate::{
    state::{CheckpointScoreRecord, ScoreState},
    vcs::{RepoSnapshot, WorkTreeStatus},
};

/// Why the gate refused to grade.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// Files exist that were never added to the repository.
    #[error(
        "The autograder will not run until you add all files to your repository. Currently \
         missing: {}.",
        .0.join(", ")
    )]
    UntrackedFiles(Vec<String>),
    /// A previous run raised the score and the change is still uncommitted.
    #[error("The autograder will not run until you commit the changes that increased your score.")]
    UncommittedIncrease,
}

/// Blocks while any untracked file remains.
pub fn check_untracked(status: &WorkTreeStatus) -> Result<(), BlockReason> {
    if status.untracked.is_empty() {
        Ok(())
    } else {
        Err(BlockReason::UntrackedFiles(status.untracked.clone()))
    }
}

/// Permission to grade a checkpoint, carrying what the gate saw before
/// scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// The record as it was before this run
    prior: CheckpointScoreRecord,
    /// HEAD at admission time
    head:  String,
    /// Whether the tree was clean at admission time
    clean: bool,
}

/// What the gate recorded after scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateOutcome {
    /// The run raised the best score with uncommitted changes
    pub needs_commit: bool,
    /// Best score before this run
    pub prior_max:    u32,
}

/// Decides whether `checkpoint` may be graded.
///
/// * `state`: the persisted score state
/// * `checkpoint`: current checkpoint id
/// * `snapshot`: repository state read for this run
///
/// A checkpoint without a record is treated as never increased with a best
/// score of zero.
pub fn admit(
    state: &ScoreState,
    checkpoint: Option<&str>,
    snapshot: &RepoSnapshot,
) -> Result<Admission, BlockReason> {
    let prior = state
        .checkpoint(checkpoint)
        .cloned()
        .unwrap_or_else(|| CheckpointScoreRecord::empty(checkpoint.map(str::to_string)));
    let clean = snapshot.status.is_clean();

    if prior.increased && prior.last_seen_commit == snapshot.head && !clean {
        tracing::info!(
            "Checkpoint {:?} is waiting on a commit at {}",
            prior.checkpoint,
            snapshot.head
        );
        return Err(BlockReason::UncommittedIncrease);
    }

    Ok(Admission {
        prior,
        head: snapshot.head.clone(),
        clean,
    })
}

impl Admission {
    /// Best score before this run.
    pub fn prior_max(&self) -> u32 {
        self.prior.max_score
    }

    /// Records `earned` into `state` and reports whether the student now has
    /// to commit.
    ///
    /// Nothing is recorded before the repository's first commit.
    pub fn record(&self, state: &mut ScoreState, earned: u32) -> GateOutcome {
        let prior_max = self.prior.max_score;
        if self.head.is_empty() {
            return GateOutcome {
                needs_commit: false,
                prior_max,
            };
        }

        let needs_commit = earned > prior_max && !self.clean;
        state.set_checkpoint(CheckpointScoreRecord {
            checkpoint:       self.prior.checkpoint.clone(),
            last_seen_commit: self.head.clone(),
            max_score:        prior_max.max(earned),
            increased:        needs_commit,
        });

        GateOutcome {
            needs_commit,
            prior_max,
        }
    }
}
