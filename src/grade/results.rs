#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::BTreeMap, fmt::Display};

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::manifest::TagValue;

/// What produced a score entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    /// A graded test case
    Test,
    /// A test class that failed before any case could run
    TestInitializationError,
    /// A module that never produced a test report
    CompileError,
    /// The checkstyle tool
    Checkstyle,
    /// The detekt tool
    Detekt,
}

impl Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntryKind::Test => "test",
            EntryKind::TestInitializationError => "testInitializationError",
            EntryKind::CompileError => "compileError",
            EntryKind::Checkstyle => "checkstyle",
            EntryKind::Detekt => "detekt",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One line of the score report
pub struct ScoreEntry {
    /// * `module`: module the entry belongs to, absent for lint tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub module:              Option<String>,
    /// * `class_name`: qualified test class name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub class_name:          Option<String>,
    /// * `test_case`: raw test case name as reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub test_case:           Option<String>,
    /// * `passed`: whether the case or tool passed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed:              Option<bool>,
    /// * `ran`: whether a lint tool produced any output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ran:                 Option<bool>,
    /// * `points_possible`: points this entry is worth
    #[builder(default)]
    pub points_possible:     u32,
    /// * `points_earned`: points awarded
    #[builder(default)]
    pub points_earned:       u32,
    /// * `description`: short display name
    #[builder(into)]
    pub description:         String,
    /// * `explanation`: why the points were or were not awarded
    #[builder(into)]
    pub explanation:         String,
    /// * `kind`: what produced this entry
    #[serde(rename = "type")]
    pub kind:                EntryKind,
    /// * `failure_stack_trace`: failure text for the student's debugging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub failure_stack_trace: Option<String>,
    /// * `tags`: declared tags, flattened into the entry
    #[serde(flatten)]
    #[builder(default)]
    pub tags:                BTreeMap<String, TagValue>,
}

/// Keys a [`ScoreEntry`] writes itself. Declared tags may not reuse them.
pub const ENTRY_KEYS: &[&str] = &[
    "module",
    "className",
    "testCase",
    "passed",
    "ran",
    "pointsPossible",
    "pointsEarned",
    "description",
    "explanation",
    "type",
    "failureStackTrace",
];

/// Whether a graded module produced test reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    /// Module name
    pub name:     String,
    /// False when no report was produced
    pub compiled: bool,
}
