#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The grading run, stage by stage: verify protected files, consult the
//! repository, execute the external build, score, record, and emit.

use std::ffi::OsString;

use anyhow::{Context, Result};

use crate::{
    config::GraderConfig,
    error::GradeError,
    fingerprint::check_protected_files,
    gate::{self, Admission, GateOutcome},
    grade::{Totals, aggregate_module, finalize},
    identification::check_contributors,
    manifest::PointsManifest,
    process::run_collect,
    report::{GitInfo, ScoreReport, emit},
    state::ScoreState,
    vcs::{GitCli, RepoSnapshot, VersionControl},
};

/// What the external build produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Execution {
    /// Console output of the build, stdout followed by stderr
    pub output: String,
}

/// Compiles and runs the tests and lint tools.
///
/// Whatever the build leaves behind in the configured report locations is
/// what gets scored; a failing build is not an error here.
pub trait Executor {
    /// Runs the external build for `config`.
    fn execute(&self, config: &GraderConfig) -> impl Future<Output = Result<Execution>>;
}

/// Runs the configured command line in the grading root.
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor;

impl Executor for CommandExecutor {
    async fn execute(&self, config: &GraderConfig) -> Result<Execution> {
        let Some((program, args)) = config.execute.command.split_first() else {
            tracing::debug!("No execute command configured, scoring existing reports");
            return Ok(Execution::default());
        };

        tracing::info!("Running {}", config.execute.command.join(" "));
        let args: Vec<OsString> = args.iter().map(OsString::from).collect();
        let out = run_collect(program, &args, Some(&config.root), config.execute.timeout())
            .await
            .with_context(|| format!("Could not run {program}"));

        // whatever reports exist are still scored
        let output = match out {
            Ok(out) => {
                if !out.status.success() {
                    tracing::info!("{program} exited with {}", out.status);
                }
                out.combined()
            }
            Err(e) => {
                tracing::warn!("{e:#}");
                format!("{e:#}")
            }
        };
        Ok(Execution { output })
    }
}

/// Outcome of a completed grading run.
#[derive(Debug, Clone)]
pub struct GradeRun {
    /// The emitted report
    pub report:  ScoreReport,
    /// What the gate recorded
    pub outcome: GateOutcome,
}

/// Drives one grading run over a loaded configuration.
pub struct Grader<'a, E = CommandExecutor, V = GitCli> {
    /// The validated configuration
    config:   &'a GraderConfig,
    /// External build
    executor: E,
    /// Repository inspection
    vcs:      V,
    /// Points declarations
    manifest: PointsManifest,
}

impl<'a> Grader<'a> {
    /// Grader that runs the configured command and reads Git through the
    /// `git` executable.
    pub fn new(config: &'a GraderConfig) -> Result<Self, GradeError> {
        config.validate()?;
        Ok(Self::with_collaborators(
            config,
            config.points_manifest()?,
            CommandExecutor,
            GitCli,
        ))
    }
}

impl<'a, E: Executor, V: VersionControl> Grader<'a, E, V> {
    /// Grader with explicit collaborators.
    pub fn with_collaborators(
        config: &'a GraderConfig,
        manifest: PointsManifest,
        executor: E,
        vcs: V,
    ) -> Self {
        Self {
            config,
            executor,
            vcs,
            manifest,
        }
    }

    /// Grades `checkpoint` once and emits the report.
    pub async fn run(&self, checkpoint: Option<String>) -> Result<GradeRun, GradeError> {
        let config = self.config;

        let mismatch = check_protected_files(&config.root, &config.fingerprint.patterns);
        if !mismatch.is_empty() {
            if config.ignore_fingerprint_mismatch {
                tracing::warn!("Ignoring fingerprint problem: {mismatch}");
            } else {
                return Err(GradeError::Integrity(mismatch));
            }
        }

        let state_path = config.score_state_path();
        let mut state = ScoreState::load(&state_path);
        let (snapshot, admission) = self.consult_repository(&state, checkpoint.as_deref()).await?;

        let contributors = config
            .identification
            .as_ref()
            .map(|policy| check_contributors(policy, &config.root))
            .transpose()?;

        if config.force_clean {
            self.clean_outputs()?;
        }

        let execution = self.executor.execute(config).await?;

        let mut modules = Vec::new();
        let mut scores = Vec::new();
        for module in &config.modules {
            let aggregation =
                aggregate_module(&module.name, &config.resolve(&module.reports), &self.manifest)?;
            modules.push(aggregation.module);
            scores.extend(aggregation.entries);
        }
        scores.extend(config.lint_sources()?.score_all(&config.root));

        let summed = Totals::sum(&scores);
        let totals = finalize(summed.possible, summed.earned, config.points.max);
        tracing::info!("Scored {totals}");

        let outcome = match &admission {
            Some(admission) => {
                let outcome = admission.record(&mut state, totals.earned);
                state.save(&state_path)?;
                outcome
            }
            None => GateOutcome::default(),
        };

        let report = ScoreReport::builder()
            .modules(modules)
            .scores(scores)
            .points_earned(totals.earned)
            .points_possible(totals.possible)
            .maybe_raw_points_earned(totals.raw_earned)
            .maybe_assignment(config.assignment.clone())
            .maybe_checkpoint(checkpoint)
            .maybe_contributors(contributors)
            .maybe_output(config.capture_output.then_some(execution.output))
            .maybe_git(snapshot.as_ref().map(GitInfo::from))
            .tags(config.reporting.tags.clone())
            .build();

        emit(config, &report, outcome).await?;
        Ok(GradeRun { report, outcome })
    }

    /// Reads the repository and applies the gate when Git integration is on.
    async fn consult_repository(
        &self,
        state: &ScoreState,
        checkpoint: Option<&str>,
    ) -> Result<(Option<RepoSnapshot>, Option<Admission>), GradeError> {
        if !self.config.vcs.git {
            return Ok((None, None));
        }

        let snapshot = self.vcs.snapshot(&self.config.root).await?;
        gate::check_untracked(&snapshot.status)?;
        let admission = if self.config.vcs.require_commit {
            Some(gate::admit(state, checkpoint, &snapshot)?)
        } else {
            None
        };
        Ok((Some(snapshot), admission))
    }

    /// Removes reports left over from an earlier build.
    fn clean_outputs(&self) -> Result<()> {
        for module in &self.config.modules {
            let dir = self.config.resolve(&module.reports);
            if dir.is_dir() {
                std::fs::remove_dir_all(&dir)
                    .with_context(|| format!("Could not clean {}", dir.display()))?;
            }
        }
        for source in &self.config.lint {
            let report = self.config.resolve(&source.report);
            if report.is_file() {
                std::fs::remove_file(&report)
                    .with_context(|| format!("Could not clean {}", report.display()))?;
            }
        }
        Ok(())
    }
}
