#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # gradegate
//!
//! Grades a student submission: checks that the protected test files are
//! untouched, runs the configured build, scores the test and lint reports,
//! and refuses to grade again until score increases are committed.
//!
//! Run `gradegate grade` next to a `gradegate.json`, or point at one with
//! `--config`.

use std::path::PathBuf;

use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use gradegate::{
    GradeError, Grader, GraderConfig,
    config::DEFAULT_CONFIG_FILE,
    fingerprint::{check_protected_files, fingerprint_files},
    state::ScoreState,
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade the submission
    Grade {
        /// Configuration file
        config:     PathBuf,
        /// Checkpoint to grade
        checkpoint: Option<String>,
    },
    /// Stamp protected files with their fingerprints
    Fingerprint {
        /// Configuration file
        config: PathBuf,
    },
    /// Verify protected files without grading
    CheckFingerprints {
        /// Configuration file
        config: PathBuf,
    },
    /// Print the recorded checkpoint scores
    Status {
        /// Configuration file
        config: PathBuf,
    },
}

/// Parsed command line.
#[derive(Debug, Clone)]
struct Options {
    /// Log at debug level
    verbose: bool,
    /// Selected command
    cmd:     Cmd,
}

/// Parse the command line arguments and return the selected `Options`
fn options() -> Options {
    /// parses the configuration path
    fn c() -> impl Parser<PathBuf> {
        long("config")
            .short('c')
            .help("Path to the grader configuration")
            .argument::<PathBuf>("PATH")
            .fallback(PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    let config = c();
    let checkpoint = long("checkpoint")
        .help("Checkpoint to grade, overriding the environment and checkpoint file")
        .argument::<String>("NAME")
        .optional();
    let grade = construct!(Cmd::Grade { config, checkpoint })
        .to_options()
        .command("grade")
        .help("Grade your work");

    let config = c();
    let fingerprint = construct!(Cmd::Fingerprint { config })
        .to_options()
        .command("fingerprint")
        .help("Stamp protected test files with their fingerprints");

    let config = c();
    let check = construct!(Cmd::CheckFingerprints { config })
        .to_options()
        .command("check-fingerprints")
        .help("Verify protected test files without grading");

    let config = c();
    let status = construct!(Cmd::Status { config })
        .to_options()
        .command("status")
        .help("Print the best score recorded for each checkpoint");

    let verbose = short('v')
        .long("verbose")
        .help("Print debug logs")
        .switch();
    let cmd = construct!([grade, fingerprint, check, status]);

    construct!(Options { verbose, cmd })
        .to_options()
        .descr("Autograder with tamper and commit checks")
        .run()
}

/// Runs one command to completion.
async fn run(cmd: Cmd) -> Result<(), GradeError> {
    match cmd {
        Cmd::Grade { config, checkpoint } => {
            let config = GraderConfig::load(&config)?;
            let checkpoint = config.current_checkpoint(checkpoint)?;
            Grader::new(&config)?.run(checkpoint).await?;
        }
        Cmd::Fingerprint { config } => {
            let config = GraderConfig::load(&config)?;
            let stamped = fingerprint_files(&config.root, &config.fingerprint.patterns)
                .map_err(anyhow::Error::from)?;
            eprintln!("Fingerprinted {} files", stamped.len());
        }
        Cmd::CheckFingerprints { config } => {
            let config = GraderConfig::load(&config)?;
            let problem = check_protected_files(&config.root, &config.fingerprint.patterns);
            if !problem.is_empty() {
                return Err(GradeError::Integrity(problem));
            }
            eprintln!("{}", "All protected files match their fingerprints".green());
        }
        Cmd::Status { config } => {
            let config = GraderConfig::load(&config)?;
            let state = ScoreState::load(&config.score_state_path());
            println!("{}", state.table());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let options = options();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let level = if options.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter_layer = LevelFilter::from_level(level);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    if let Err(e) = run(options.cmd).await {
        eprintln!("{}", format!("{e:#}").red().bold());
        std::process::exit(e.exit_code());
    }
}
