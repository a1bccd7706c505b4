#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::BTreeMap,
    path::{Component, Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    grade::{LintSource, LintSources, LintTool},
    manifest::{PointsManifest, TagValue},
    report::REPORT_KEYS,
};

/// Default file name of the grader configuration.
pub const DEFAULT_CONFIG_FILE: &str = "gradegate.json";

/// Name of the persisted score-state document at the grading root.
pub const SCORE_STATE_FILE: &str = ".score.json";

/// Environment variable naming the current checkpoint.
pub const CHECKPOINT_ENV: &str = "GRADEGATE_CHECKPOINT";

/// Environment variable overriding the report upload endpoint.
pub const POST_ENDPOINT_ENV: &str = "GRADEGATE_POST_ENDPOINT";

/// Problems with the grading setup. All of them are fatal before any grading
/// work starts.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Could not read grader configuration {path}: {source}")]
    Read {
        /// Path of the configuration file
        path:   PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// The configuration file is not valid.
    #[error("Could not parse grader configuration {path}: {source}")]
    Parse {
        /// Path of the configuration file
        path:   PathBuf,
        /// Underlying parse error
        source: serde_json::Error,
    },
    /// A second report source was registered for a lint tool.
    #[error("{0} task already set: only one {0} report can be scored")]
    DuplicateTool(LintTool),
    /// Neither modules nor lint tools are configured.
    #[error("Nothing to grade: configure at least one module or lint tool")]
    NothingToGrade,
    /// Git integration is on but the root is not inside a repository.
    #[error("Grader Git integration is enabled but {} isn't a Git repository.", .0.display())]
    NotARepository(PathBuf),
    /// Any other invalid or missing setting.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which files carry fingerprints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FingerprintPolicy {
    /// Glob patterns relative to the grading root
    pub patterns: Vec<String>,
}

impl Default for FingerprintPolicy {
    fn default() -> Self {
        Self {
            patterns: vec!["src/test/**/*Test.java".into(), "src/test/**/*Test.kt".into()],
        }
    }
}

/// A module whose tests are graded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulePolicy {
    /// Module name shown in the report
    pub name:    String,
    /// Directory the test runner writes XML reports to
    pub reports: PathBuf,
}

/// The external command that compiles and runs tests and lint tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutePolicy {
    /// Program and arguments; nothing is run when empty
    pub command:      Vec<String>,
    /// Kill the command after this many seconds
    pub timeout_secs: Option<u64>,
}

impl ExecutePolicy {
    /// Returns the configured timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Where the current checkpoint is read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckpointPolicy {
    /// JSON file of the form `{"checkpoint": "..."}`
    pub file: Option<PathBuf>,
}

/// Contributor identification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationPolicy {
    /// Text file listing one contributor per line
    pub file:      PathBuf,
    /// Fewest contributors allowed
    #[serde(default = "one")]
    pub min_count: usize,
    /// Most contributors allowed
    #[serde(default = "one")]
    pub max_count: usize,
    /// Glob every contributor must match, e.g. `*@illinois.edu`
    #[serde(default)]
    pub pattern:   Option<String>,
    /// Message shown instead of the default one on failure
    #[serde(default)]
    pub message:   Option<String>,
}

/// Serde default for contributor bounds.
fn one() -> usize {
    1
}

/// Settings for the console report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrettyPolicy {
    /// Print the console report
    pub enabled:    bool,
    /// Title printed above the entries
    pub title:      Option<String>,
    /// Free-form notes printed below the total
    pub notes:      Option<String>,
    /// Print the total line
    pub show_total: bool,
}

impl Default for PrettyPolicy {
    fn default() -> Self {
        Self {
            enabled:    true,
            title:      None,
            notes:      None,
            show_total: true,
        }
    }
}

/// Settings for the HTTP upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostPolicy {
    /// Upload endpoint; nothing is sent when absent
    pub endpoint:      Option<String>,
    /// Files attached to the upload
    pub include_files: Vec<PathBuf>,
}

/// Report destinations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportingPolicy {
    /// Write the JSON report here
    pub json_file:    Option<PathBuf>,
    /// Print the JSON report to stdout
    pub print_json:   bool,
    /// Console report settings
    pub print_pretty: PrettyPolicy,
    /// Upload settings
    pub post:         PostPolicy,
    /// Custom top-level keys added to the report
    pub tags:         BTreeMap<String, TagValue>,
}

/// Version-control settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VcsPolicy {
    /// Inspect the Git repository and refuse to run with untracked files
    pub git:            bool,
    /// Refuse to run again until score increases are committed
    pub require_commit: bool,
}

/// Point settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PointsPolicy {
    /// Cap on points possible and earned
    pub max: Option<u32>,
}

/// Grader configuration, built once at startup and passed by reference into
/// every stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraderConfig {
    /// Grading root; other relative paths are resolved against it
    pub root:                        PathBuf,
    /// Assignment identifier
    pub assignment:                  Option<String>,
    /// Attach the executor's console output to the report
    pub capture_output:              bool,
    /// Remove stale reports before executing
    pub force_clean:                 bool,
    /// Grade even when protected files fail their fingerprint check
    pub ignore_fingerprint_mismatch: bool,
    /// Protected file patterns
    pub fingerprint:                 FingerprintPolicy,
    /// Points manifest file
    pub manifest:                    Option<PathBuf>,
    /// Modules whose tests are graded
    pub modules:                     Vec<ModulePolicy>,
    /// Scored lint tools
    pub lint:                        Vec<LintSource>,
    /// External build/test command
    pub execute:                     ExecutePolicy,
    /// Checkpoint source
    pub checkpoint:                  CheckpointPolicy,
    /// Contributor identification, off when absent
    pub identification:              Option<IdentificationPolicy>,
    /// Report destinations
    pub reporting:                   ReportingPolicy,
    /// Version-control settings
    pub vcs:                         VcsPolicy,
    /// Point settings
    pub points:                      PointsPolicy,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            root:                        PathBuf::from("."),
            assignment:                  None,
            capture_output:              false,
            force_clean:                 true,
            ignore_fingerprint_mismatch: false,
            fingerprint:                 FingerprintPolicy::default(),
            manifest:                    None,
            modules:                     Vec::new(),
            lint:                        Vec::new(),
            execute:                     ExecutePolicy::default(),
            checkpoint:                  CheckpointPolicy::default(),
            identification:              None,
            reporting:                   ReportingPolicy::default(),
            vcs:                         VcsPolicy::default(),
            points:                      PointsPolicy::default(),
        }
    }
}

/// Shape of the checkpoint file.
#[derive(Deserialize)]
struct CheckpointFile {
    /// Current checkpoint
    checkpoint: Option<String>,
}

/// Reads a non-blank environment variable.
fn read_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

impl GraderConfig {
    /// Loads the configuration from `path`, applies environment overrides, and
    /// validates it.
    ///
    /// A relative `root` is taken relative to the configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: GraderConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if config.root.is_relative()
            && let Some(parent) = path.parent()
        {
            config.root = parent.join(&config.root);
        }
        if let Some(endpoint) = read_env(POST_ENDPOINT_ENV) {
            config.reporting.post.endpoint = Some(endpoint);
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks settings that cannot be expressed in the file format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lint_sources()?;

        if self.modules.is_empty() && self.lint.is_empty() {
            return Err(ConfigError::NothingToGrade);
        }
        if let Some(id) = &self.identification {
            if id.min_count > id.max_count {
                return Err(ConfigError::Invalid(format!(
                    "identification minCount ({}) is larger than maxCount ({})",
                    id.min_count, id.max_count
                )));
            }
            if let Some(pattern) = &id.pattern {
                glob::Pattern::new(pattern).map_err(|e| {
                    ConfigError::Invalid(format!("identification pattern `{pattern}`: {e}"))
                })?;
            }
        }
        if self.vcs.require_commit && !self.vcs.git {
            return Err(ConfigError::Invalid(
                "vcs.requireCommit needs vcs.git to be enabled".into(),
            ));
        }
        for module in &self.modules {
            check_output_path(&format!("module `{}` reports", module.name), &module.reports)?;
        }
        for source in &self.lint {
            check_output_path(&format!("{} report", source.tool), &source.report)?;
        }
        if let Some(key) = self
            .reporting
            .tags
            .keys()
            .find(|key| REPORT_KEYS.contains(&key.as_str()))
        {
            return Err(ConfigError::Invalid(format!(
                "reporting tag `{key}` would replace a report field"
            )));
        }
        Ok(())
    }

    /// Registers every configured lint tool, rejecting duplicates.
    pub fn lint_sources(&self) -> Result<LintSources, ConfigError> {
        let mut sources = LintSources::default();
        for source in &self.lint {
            sources.register(source.clone())?;
        }
        Ok(sources)
    }

    /// Resolves `path` against the grading root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Location of the score-state document.
    pub fn score_state_path(&self) -> PathBuf {
        self.root.join(SCORE_STATE_FILE)
    }

    /// Loads the points manifest, or an empty one when none is configured.
    pub fn points_manifest(&self) -> Result<PointsManifest, ConfigError> {
        match &self.manifest {
            Some(path) => PointsManifest::load(&self.resolve(path))
                .map_err(|e| ConfigError::Invalid(format!("{e:#}"))),
            None => Ok(PointsManifest::new()),
        }
    }

    /// Determines the current checkpoint.
    ///
    /// * `requested`: checkpoint given on the command line
    ///
    /// Falls back to the environment and then to the checkpoint file.
    pub fn current_checkpoint(
        &self,
        requested: Option<String>,
    ) -> Result<Option<String>, ConfigError> {
        if requested.is_some() {
            return Ok(requested);
        }
        if let Some(checkpoint) = read_env(CHECKPOINT_ENV) {
            return Ok(Some(checkpoint));
        }
        let Some(file) = &self.checkpoint.file else {
            return Ok(None);
        };

        let path = self.resolve(file);
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let parsed: CheckpointFile =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path, source })?;
        Ok(parsed.checkpoint)
    }
}

/// Build outputs are deleted before each build, so they must name something
/// strictly inside the grading root.
fn check_output_path(what: &str, path: &Path) -> Result<(), ConfigError> {
    let mut inside = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => inside = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ConfigError::Invalid(format!(
                    "{what} `{}` must stay inside the grading root",
                    path.display()
                )));
            }
        }
    }
    if !inside {
        return Err(ConfigError::Invalid(format!(
            "{what} `{}` must name a path below the grading root",
            path.display()
        )));
    }
    Ok(())
}
