use std::{fs, path::PathBuf};

use gradegate::fingerprint::{
    FingerprintError, Verification, check_protected_files, compute_fingerprint, fingerprint_files,
    retrieve_fingerprint, stamp, verify,
};
use uuid::Uuid;

const PROTECTED: &str = "src/test/java/edu/example/AdderTest.java";

fn fixture(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(rel)
}

fn temp_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("gradegate-fp-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

/// Copies the stamped fixture into a fresh grading root.
fn protected_root() -> PathBuf {
    let root = temp_root();
    let dest = root.join(PROTECTED);
    fs::create_dir_all(dest.parent().unwrap()).unwrap();
    fs::copy(fixture("protected").join(PROTECTED), &dest).expect("copy protected fixture");
    root
}

fn patterns() -> Vec<String> {
    vec!["src/test/**/*Test.java".to_string()]
}

#[test]
fn stamped_fixture_verifies() {
    let content = fs::read_to_string(fixture("protected").join(PROTECTED)).unwrap();
    assert_eq!(
        retrieve_fingerprint(&content).as_deref(),
        Some("2f46f103c025adf457c2cf4875089180")
    );
    assert_eq!(verify(&content).unwrap(), Verification::Valid);
}

#[test]
fn content_without_marker_is_missing() {
    let content = "class A {}\n// just a comment\n";
    assert_eq!(retrieve_fingerprint(content), None);
    assert_eq!(verify(content).unwrap(), Verification::Missing);
}

#[test]
fn any_edit_above_the_marker_is_a_mismatch() {
    let stamped = stamp("class A {\n  int x = 1;\n}").unwrap();
    let edited = stamped.replace("x = 1", "x = 2");
    match verify(&edited).unwrap() {
        Verification::Mismatch { stored, computed } => {
            assert_eq!(stored.len(), 32);
            assert_ne!(stored, computed);
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
}

#[test]
fn marker_must_be_the_last_line() {
    let content = "class A {}\n// md5: 00000000000000000000000000000000\nclass B {}\n";
    assert!(matches!(
        compute_fingerprint(content),
        Err(FingerprintError::MisplacedMarker(_))
    ));
    assert!(verify(content).is_err());
}

#[test]
fn trailing_blank_lines_after_the_marker_are_allowed() {
    let stamped = stamp("class A {}").unwrap();
    assert_eq!(verify(&format!("{stamped}\n\n  \n")).unwrap(), Verification::Valid);
}

#[test]
fn line_endings_do_not_change_the_digest() {
    let unix = compute_fingerprint("a\nb\nc").unwrap();
    assert_eq!(compute_fingerprint("a\r\nb\r\nc").unwrap(), unix);
    assert_eq!(compute_fingerprint("a\rb\rc").unwrap(), unix);
}

#[test]
fn stamping_is_idempotent_and_keeps_the_notice() {
    let once = stamp("package p;\n\nclass T {}\n").unwrap();
    assert_eq!(stamp(&once).unwrap(), once);

    let last = once.trim_end().lines().last().unwrap();
    assert!(last.starts_with("// md5: "));
    assert!(last.ends_with("// DO NOT REMOVE THIS LINE"));
}

#[test]
fn commentary_after_the_digest_is_ignored() {
    let digest = compute_fingerprint("x").unwrap();
    let content = format!("x\n// md5: {digest} anything at all");
    assert_eq!(retrieve_fingerprint(&content), Some(digest));
    assert_eq!(verify(&content).unwrap(), Verification::Valid);
}

#[test]
fn intact_tree_reports_no_problem() {
    let root = protected_root();
    assert_eq!(check_protected_files(&root, &patterns()), "");
    let _ = fs::remove_dir_all(root);
}

#[test]
fn edited_protected_file_is_named_in_the_message() {
    let root = protected_root();
    let path = root.join(PROTECTED);
    let edited = fs::read_to_string(&path)
        .unwrap()
        .replace("assertEquals(3,", "assertEquals(4,");
    fs::write(&path, edited).unwrap();

    let message = check_protected_files(&root, &patterns());
    assert_eq!(
        message,
        format!(
            "Fingerprint mismatch for test file {PROTECTED}. Undo your changes, restore from Git, \
             or download again."
        )
    );
    let _ = fs::remove_dir_all(root);
}

#[test]
fn unstamped_protected_file_is_reported_missing() {
    let root = temp_root();
    let path = root.join("src/test/java/FooTest.java");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "class FooTest {}\n").unwrap();

    assert_eq!(
        check_protected_files(&root, &patterns()),
        "Could not find fingerprint for file src/test/java/FooTest.java"
    );

    let stamped = fingerprint_files(&root, &patterns()).unwrap();
    assert_eq!(stamped, vec![path]);
    assert_eq!(check_protected_files(&root, &patterns()), "");
    let _ = fs::remove_dir_all(root);
}
