#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::Path;

use anyhow::Result;

use super::results::{EntryKind, ModuleSummary, ScoreEntry};
use crate::{
    manifest::PointsManifest,
    parsers::{Element, parse_document},
    util::find_reports,
};

/// Case names test runners use for a failure outside any test method.
pub const INITIALIZATION_FAILURES: [&str; 2] = ["initializationError", "classMethod"];

/// Entries and module status produced from one module's test reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestAggregation {
    /// Whether the module produced any report
    pub module:  ModuleSummary,
    /// Score entries in report discovery order
    pub entries: Vec<ScoreEntry>,
}

/// Strips a parameterization suffix such as `[1]` or `(int)` from a raw case
/// name.
pub fn method_name(test_case: &str) -> &str {
    let name = test_case.split('[').next().unwrap_or(test_case);
    name.split('(').next().unwrap_or(name)
}

/// Text of the first `failure` element below `case`, if any.
fn failure_text(case: &Element) -> Option<String> {
    case.descendants("failure")
        .first()
        .map(|failure| failure.text_content())
}

/// Scores one parsed test report.
///
/// * `module`: module the report belongs to
/// * `report`: root element of the report
/// * `manifest`: points declarations
///
/// A class-level initialization failure replaces every other entry of the
/// report with a single zero-point `testInitializationError`.
pub fn score_report(module: &str, report: &Element, manifest: &PointsManifest) -> Vec<ScoreEntry> {
    let class_name = report.attr("name").unwrap_or_default();
    let cases = report.descendants("testcase");

    let init_failure = cases.iter().find(|case| {
        INITIALIZATION_FAILURES.contains(&method_name(case.attr("name").unwrap_or_default()))
    });
    if let Some(case) = init_failure {
        let simple_name = class_name.rsplit('.').next().unwrap_or(class_name);
        tracing::debug!("{class_name} failed to initialize");
        return vec![
            ScoreEntry::builder()
                .module(module)
                .class_name(class_name)
                .description(simple_name)
                .explanation("Initialization failed")
                .kind(EntryKind::TestInitializationError)
                .maybe_failure_stack_trace(failure_text(case))
                .build(),
        ];
    }

    let mut entries = Vec::new();
    for case in cases {
        let test_case = case.attr("name").unwrap_or_default();
        let method = method_name(test_case);
        let Some(marker) = manifest.lookup(class_name, method) else {
            continue;
        };

        let passed =
            case.descendants("failure").is_empty() && case.descendants("skipped").is_empty();
        let verdict = if passed { "passed" } else { "failed" };

        entries.push(
            ScoreEntry::builder()
                .module(module)
                .class_name(class_name)
                .test_case(test_case)
                .passed(passed)
                .points_possible(marker.points)
                .points_earned(if passed { marker.points } else { 0 })
                .description(marker.name.clone().unwrap_or_else(|| method.to_string()))
                .explanation(format!("{test_case} {verdict}"))
                .kind(EntryKind::Test)
                .maybe_failure_stack_trace(if passed { None } else { failure_text(case) })
                .tags(marker.tags.clone())
                .build(),
        );
    }
    entries
}

/// Reads and scores every report one module left in `report_dir`.
///
/// * `module`: module name
/// * `report_dir`: directory the test runner writes XML reports to
/// * `manifest`: points declarations
///
/// A module without reports did not compile and gets a zero-point
/// `compileError` entry.
pub fn aggregate_module(
    module: &str,
    report_dir: &Path,
    manifest: &PointsManifest,
) -> Result<TestAggregation> {
    let reports = find_reports(report_dir, "xml")?;
    let compiled = !reports.is_empty();
    let mut entries = Vec::new();

    for path in &reports {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Skipping unreadable test report {}: {e}", path.display());
                continue;
            }
        };
        // captured test output is not always valid UTF-8
        match parse_document(&String::from_utf8_lossy(&bytes)) {
            Ok(report) => entries.extend(score_report(module, &report, manifest)),
            Err(e) => tracing::warn!("Skipping test report {}: {e:#}", path.display()),
        }
    }

    if !compiled {
        tracing::info!("{module} produced no test reports");
        entries.push(
            ScoreEntry::builder()
                .module(module)
                .description("Compiler")
                .explanation(format!("{module} didn't compile"))
                .kind(EntryKind::CompileError)
                .build(),
        );
    }

    Ok(TestAggregation {
        module: ModuleSummary {
            name: module.to_string(),
            compiled,
        },
        entries,
    })
}
