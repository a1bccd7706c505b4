#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::BTreeMap,
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{
    config::ConfigError,
    error::GradeError,
    process::{CommandOutput, run_collect},
    util::git_path,
};

/// Working-tree changes relative to HEAD, counted the way the gate needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkTreeStatus {
    /// Files staged that HEAD does not have
    pub added:     usize,
    /// Files staged with changes against HEAD
    pub changed:   usize,
    /// Files staged for removal
    pub removed:   usize,
    /// Tracked files changed but not staged
    pub modified:  usize,
    /// Tracked files deleted but not staged
    pub missing:   usize,
    /// Files git does not know about, relative to the repository root
    pub untracked: Vec<String>,
}

impl WorkTreeStatus {
    /// True when nothing tracked differs from HEAD. Untracked files do not
    /// count.
    pub fn is_clean(&self) -> bool {
        self.added + self.changed + self.removed + self.modified + self.missing == 0
    }

    /// Parses `git status --porcelain=v1 -z` output.
    pub fn parse_porcelain(output: &str) -> Self {
        let mut status = WorkTreeStatus::default();
        let mut entries = output.split('\0').filter(|entry| !entry.is_empty());

        while let Some(entry) = entries.next() {
            let mut codes = entry.chars();
            let (Some(x), Some(y)) = (codes.next(), codes.next()) else {
                continue;
            };
            let path = entry.get(3..).unwrap_or_default();

            match (x, y) {
                ('?', '?') => {
                    status.untracked.push(path.to_string());
                    continue;
                }
                ('!', '!') => continue,
                ('U', _) | (_, 'U') | ('A', 'A') | ('D', 'D') => {
                    status.changed += 1;
                    continue;
                }
                _ => {}
            }

            match x {
                'A' | 'C' => status.added += 1,
                'M' | 'T' => status.changed += 1,
                'D' => status.removed += 1,
                'R' => {
                    status.added += 1;
                    status.removed += 1;
                }
                _ => {}
            }
            match y {
                'M' | 'T' => status.modified += 1,
                'D' => status.missing += 1,
                _ => {}
            }

            // renames and copies are followed by their source path
            if matches!(x, 'R' | 'C') {
                entries.next();
            }
        }
        status
    }
}

/// Configured Git identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitUser {
    /// `user.name`
    pub name:  Option<String>,
    /// `user.email`
    pub email: Option<String>,
}

/// Everything the grader reads from version control in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoSnapshot {
    /// HEAD commit id; empty before the first commit
    pub head:    String,
    /// Working-tree status
    pub status:  WorkTreeStatus,
    /// Remote name to URL
    pub remotes: BTreeMap<String, String>,
    /// Configured identity
    pub user:    GitUser,
}

/// Source of repository snapshots.
pub trait VersionControl {
    /// Inspects the repository containing `root`.
    ///
    /// Fails with [`ConfigError::NotARepository`] when `root` is not inside
    /// one.
    fn snapshot(&self, root: &Path) -> impl Future<Output = Result<RepoSnapshot, GradeError>>;
}

/// Reads repository state by running the `git` executable.
#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    /// Runs `git` with `args` in `dir`.
    async fn git(git: &OsString, dir: &Path, args: &[&str]) -> Result<CommandOutput> {
        let args: Vec<OsString> = args.iter().map(OsString::from).collect();
        run_collect(git, &args, Some(dir), None).await
    }

    /// Reads a single `git config` value, `None` when unset.
    async fn config_value(git: &OsString, dir: &Path, key: &str) -> Result<Option<String>> {
        let out = Self::git(git, dir, &["config", "--get", key]).await?;
        let value = out.stdout_text();
        Ok((out.status.success() && !value.is_empty()).then_some(value))
    }

    /// Reads `remote.<name>.url` for every remote.
    async fn remotes(git: &OsString, dir: &Path) -> Result<BTreeMap<String, String>> {
        let out = Self::git(git, dir, &["config", "--get-regexp", r"^remote\..*\.url$"]).await?;
        if !out.status.success() {
            return Ok(BTreeMap::new());
        }

        Ok(out
            .stdout_text()
            .lines()
            .filter_map(|line| {
                let (key, url) = line.split_once(' ')?;
                let name = key.strip_prefix("remote.")?.strip_suffix(".url")?;
                Some((name.to_string(), url.trim().to_string()))
            })
            .collect())
    }
}

impl VersionControl for GitCli {
    async fn snapshot(&self, root: &Path) -> Result<RepoSnapshot, GradeError> {
        let git = git_path().map_err(|e| ConfigError::Invalid(format!("{e:#}")))?;

        let toplevel = Self::git(&git, root, &["rev-parse", "--show-toplevel"]).await;
        let toplevel = match toplevel {
            Ok(out) if out.status.success() => PathBuf::from(out.stdout_text()),
            _ => return Err(ConfigError::NotARepository(root.to_path_buf()).into()),
        };

        let head = Self::git(&git, &toplevel, &["rev-parse", "--verify", "--quiet", "HEAD"]).await?;
        let head = if head.status.success() {
            head.stdout_text()
        } else {
            tracing::warn!("Repository at {} has no commits yet", toplevel.display());
            String::new()
        };

        let status = Self::git(
            &git,
            &toplevel,
            &["status", "--porcelain=v1", "-z", "--untracked-files=all"],
        )
        .await?;
        if !status.status.success() {
            return Err(anyhow::anyhow!(
                "git status failed: {}",
                String::from_utf8_lossy(&status.stderr)
            )
            .into());
        }
        let status = WorkTreeStatus::parse_porcelain(&String::from_utf8_lossy(&status.stdout));

        let snapshot = RepoSnapshot {
            head,
            status,
            remotes: Self::remotes(&git, &toplevel).await?,
            user: GitUser {
                name:  Self::config_value(&git, &toplevel, "user.name").await?,
                email: Self::config_value(&git, &toplevel, "user.email").await?,
            },
        };
        tracing::debug!(
            "HEAD {} clean={} untracked={}",
            snapshot.head,
            snapshot.status.is_clean(),
            snapshot.status.untracked.len()
        );
        Ok(snapshot)
    }
}
