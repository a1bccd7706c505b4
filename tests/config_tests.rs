use std::{
    fs,
    path::{Path, PathBuf},
};

use gradegate::{
    ConfigError, GradeError, GraderConfig,
    config::IdentificationPolicy,
    grade::LintTool,
    identification::check_contributors,
};
use uuid::Uuid;

fn temp_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("gradegate-config-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

fn write_config(root: &Path, json: &str) -> PathBuf {
    let path = root.join("gradegate.json");
    fs::write(&path, json).unwrap();
    path
}

fn policy() -> IdentificationPolicy {
    IdentificationPolicy {
        file:      PathBuf::from("email.txt"),
        min_count: 1,
        max_count: 2,
        pattern:   Some("*@illinois.edu".to_string()),
        message:   None,
    }
}

#[test]
fn full_configuration_loads_with_defaults() {
    let root = temp_root();
    let path = write_config(
        &root,
        r#"{
            "assignment": "MP1",
            "modules": [{ "name": "app", "reports": "build/test-results/test" }],
            "lint": [{ "tool": "checkstyle", "report": "build/reports/checkstyle/main.xml", "points": 10 }],
            "execute": { "command": ["./gradlew", "test", "checkstyleMain"], "timeoutSecs": 600 },
            "reporting": { "jsonFile": "grade.json", "printPretty": { "title": "MP1 Grade" }, "tags": { "term": "fall", "year": 2026 } },
            "vcs": { "git": true, "requireCommit": true },
            "points": { "max": 100 }
        }"#,
    );

    let config = GraderConfig::load(&path).expect("valid configuration");
    assert_eq!(config.root, root.join("."));
    assert_eq!(config.assignment.as_deref(), Some("MP1"));
    assert!(config.force_clean);
    assert!(!config.capture_output);
    assert_eq!(config.fingerprint.patterns, vec![
        "src/test/**/*Test.java".to_string(),
        "src/test/**/*Test.kt".to_string()
    ]);
    assert_eq!(config.lint[0].tool, LintTool::Checkstyle);
    assert_eq!(config.execute.timeout().map(|t| t.as_secs()), Some(600));
    assert!(config.reporting.print_pretty.enabled);
    assert!(config.reporting.print_pretty.show_total);
    assert_eq!(config.reporting.tags.len(), 2);
    assert_eq!(config.points.max, Some(100));
    assert_eq!(config.score_state_path(), root.join(".").join(".score.json"));
    let _ = fs::remove_dir_all(root);
}

#[test]
fn duplicate_lint_tools_are_rejected() {
    let root = temp_root();
    let path = write_config(
        &root,
        r#"{ "lint": [
            { "tool": "detekt", "report": "a.xml", "points": 1 },
            { "tool": "detekt", "report": "b.xml", "points": 1 }
        ] }"#,
    );
    assert!(matches!(
        GraderConfig::load(&path),
        Err(ConfigError::DuplicateTool(LintTool::Detekt))
    ));
    let _ = fs::remove_dir_all(root);
}

#[test]
fn invalid_configurations_fail_before_grading() {
    let root = temp_root();

    let path = write_config(&root, "{}");
    assert!(matches!(GraderConfig::load(&path), Err(ConfigError::NothingToGrade)));

    let path = write_config(&root, "{ \"modules\": [ ");
    assert!(matches!(GraderConfig::load(&path), Err(ConfigError::Parse { .. })));

    let path = write_config(
        &root,
        r#"{ "modules": [{ "name": "app", "reports": "r" }], "vcs": { "requireCommit": true } }"#,
    );
    assert!(matches!(GraderConfig::load(&path), Err(ConfigError::Invalid(_))));

    let path = write_config(
        &root,
        r#"{ "modules": [{ "name": "app", "reports": "r" }],
             "identification": { "file": "email.txt", "minCount": 3, "maxCount": 1 } }"#,
    );
    assert!(matches!(GraderConfig::load(&path), Err(ConfigError::Invalid(_))));

    assert!(matches!(
        GraderConfig::load(&root.join("absent.json")),
        Err(ConfigError::Read { .. })
    ));

    let err: GradeError = ConfigError::NothingToGrade.into();
    assert_eq!(err.exit_code(), 2);
    let _ = fs::remove_dir_all(root);
}

#[test]
fn report_locations_must_stay_below_the_root() {
    let root = temp_root();

    for reports in ["", ".", "./", "..", "build/../..", "/tmp/results"] {
        let path = write_config(
            &root,
            &format!(r#"{{ "modules": [{{ "name": "app", "reports": "{reports}" }}] }}"#),
        );
        assert!(
            matches!(GraderConfig::load(&path), Err(ConfigError::Invalid(_))),
            "reports `{reports}` was accepted"
        );
    }

    let path = write_config(
        &root,
        r#"{ "lint": [{ "tool": "detekt", "report": "../detekt.xml", "points": 1 }] }"#,
    );
    assert!(matches!(GraderConfig::load(&path), Err(ConfigError::Invalid(_))));

    let path = write_config(
        &root,
        r#"{ "modules": [{ "name": "app", "reports": "./build/test-results" }] }"#,
    );
    assert!(GraderConfig::load(&path).is_ok());
    let _ = fs::remove_dir_all(root);
}

#[test]
fn report_tags_cannot_shadow_report_fields() {
    let root = temp_root();

    for key in ["pointsEarned", "scores", "files"] {
        let path = write_config(
            &root,
            &format!(
                r#"{{ "modules": [{{ "name": "app", "reports": "r" }}],
                     "reporting": {{ "tags": {{ "{key}": 100 }} }} }}"#
            ),
        );
        let err = GraderConfig::load(&path).expect_err("reserved tag key");
        assert!(err.to_string().contains(key), "{err}");
    }

    let path = write_config(
        &root,
        r#"{ "modules": [{ "name": "app", "reports": "r" }],
             "reporting": { "tags": { "earned": 100 } } }"#,
    );
    assert!(GraderConfig::load(&path).is_ok());
    let _ = fs::remove_dir_all(root);
}

#[test]
fn explicit_checkpoint_wins_over_the_file() {
    let root = temp_root();
    fs::write(root.join("checkpoint.json"), r#"{ "checkpoint": "hw2" }"#).unwrap();
    let mut config = GraderConfig {
        root: root.clone(),
        ..GraderConfig::default()
    };
    config.checkpoint.file = Some(PathBuf::from("checkpoint.json"));

    assert_eq!(
        config.current_checkpoint(Some("hw9".to_string())).unwrap().as_deref(),
        Some("hw9")
    );
    let _ = fs::remove_dir_all(root);
}

#[test]
fn no_checkpoint_source_means_no_checkpoint() {
    let config = GraderConfig::default();
    assert_eq!(config.current_checkpoint(Some("hw1".into())).unwrap().as_deref(), Some("hw1"));
    assert!(config.checkpoint.file.is_none());
}

#[test]
fn contributors_are_read_line_by_line() {
    let root = temp_root();
    fs::write(root.join("email.txt"), "\nstudent1@illinois.edu\n  student2@illinois.edu  \n\n")
        .unwrap();

    let contributors = check_contributors(&policy(), &root).unwrap();
    assert_eq!(contributors, vec![
        "student1@illinois.edu".to_string(),
        "student2@illinois.edu".to_string()
    ]);
    let _ = fs::remove_dir_all(root);
}

#[test]
fn contributor_problems_are_explained() {
    let root = temp_root();

    let err = check_contributors(&policy(), &root).unwrap_err();
    assert!(err.to_string().starts_with("Missing contributor identification file: "));
    assert_eq!(err.exit_code(), 5);

    fs::write(root.join("email.txt"), "\n\n").unwrap();
    let err = check_contributors(&policy(), &root).unwrap_err();
    assert!(err.to_string().starts_with("Identification file is empty: "));

    fs::write(root.join("email.txt"), "a@illinois.edu\nb@illinois.edu\nc@illinois.edu\n").unwrap();
    let err = check_contributors(&policy(), &root).unwrap_err();
    assert!(
        err.to_string()
            .starts_with("Invalid number of contributors (3) in identification file: ")
    );

    fs::write(root.join("email.txt"), "a@gmail.com\n").unwrap();
    let err = check_contributors(&policy(), &root).unwrap_err();
    assert_eq!(err.to_string(), "Invalid contributor format: a@gmail.com");
    let _ = fs::remove_dir_all(root);
}

#[test]
fn custom_identification_message_replaces_the_default() {
    let root = temp_root();
    let policy = IdentificationPolicy {
        message: Some("Put your NetID email in email.txt".to_string()),
        ..policy()
    };

    let err = check_contributors(&policy, &root).unwrap_err();
    assert!(matches!(err, GradeError::Identification(ref m) if m.starts_with("Missing")));

    fs::write(root.join("email.txt"), "someone@example.com\n").unwrap();
    let err = check_contributors(&policy, &root).unwrap_err();
    assert_eq!(err.to_string(), "Put your NetID email in email.txt");
    let _ = fs::remove_dir_all(root);
}
