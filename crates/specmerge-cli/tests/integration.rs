#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn specmerge(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("specmerge").unwrap();
    cmd.current_dir(dir.path()).env("SPECMERGE_ROOT", dir.path());
    cmd
}

fn write(dir: &TempDir, rel: &str, text: &str) {
    let path = dir.path().join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

fn read(dir: &TempDir, rel: &str) -> String {
    std::fs::read_to_string(dir.path().join(rel)).unwrap()
}

const AUTH: &str = "\
# Auth Specification

## Purpose

Sign users in.

## Requirements

### Requirement: Login
The system SHALL accept a password.

#### Scenario: valid credentials
- **WHEN** the user submits a correct password
- **THEN** a session starts
";

const SEARCH: &str = "\
# Search Specification

## Purpose

Find things.

## Requirements

### Requirement: Query
The system SHALL match titles.

#### Scenario: hit
- **WHEN** a title matches
- **THEN** it is returned
";

const TWO_FACTOR_DELTA: &str = "\
## ADDED Requirements

### Requirement: Two Factor
The system SHALL ask for a one-time code.

#### Scenario: code requested
- **WHEN** the password is accepted
- **THEN** a code is requested
";

// ---------------------------------------------------------------------------
// specmerge init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_layout() {
    let dir = TempDir::new().unwrap();
    specmerge(&dir).arg("init").assert().success();

    assert!(dir.path().join("specmerge.yaml").exists());
    assert!(dir.path().join("specs").is_dir());
    assert!(dir.path().join("changes/archive").is_dir());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    specmerge(&dir).arg("init").assert().success();
    specmerge(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  specmerge.yaml"));
}

// ---------------------------------------------------------------------------
// specmerge validate
// ---------------------------------------------------------------------------

#[test]
fn validate_clean_spec() {
    let dir = TempDir::new().unwrap();
    write(&dir, "specs/auth/spec.md", AUTH);

    specmerge(&dir)
        .args(["validate", "specs/auth/spec.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok (1 requirements, 1 scenarios)"));
}

#[test]
fn validate_reports_missing_when_with_line() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "bad.md",
        "# Bad\n\n## Purpose\n\nx\n\n## Requirements\n\n### Requirement: R\n#### Scenario: s\n- **THEN** y\n",
    );

    specmerge(&dir)
        .args(["validate", "bad.md"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] MISSING_WHEN line 10"))
        .stderr(predicate::str::contains("validation failed"));
}

#[test]
fn validate_strict_fails_on_warnings() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "weak.md",
        "# Weak\n\n## Purpose\n\nx\n\n## Requirements\n\n### Requirement: R\nThe system should work.\n\n#### Scenario: s\n- **WHEN** x\n- **THEN** y\n",
    );

    specmerge(&dir).args(["validate", "weak.md"]).assert().success();
    specmerge(&dir)
        .args(["validate", "weak.md", "--strict"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("WEAK_LANGUAGE"));
}

#[test]
fn validate_weak_language_can_be_disabled() {
    let dir = TempDir::new().unwrap();
    write(&dir, "specmerge.yaml", "strict: true\nweak_language: false\n");
    write(
        &dir,
        "weak.md",
        "# Weak\n\n## Purpose\n\nx\n\n## Requirements\n\n### Requirement: R\nThe system should work.\n\n#### Scenario: s\n- **WHEN** x\n- **THEN** y\n",
    );

    specmerge(&dir).args(["validate", "weak.md"]).assert().success();
}

#[test]
fn validate_detects_delta_documents() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "delta.md",
        "## RENAMED Requirements\n\n- FROM: `### Requirement: Login`\n",
    );

    specmerge(&dir)
        .args(["validate", "delta.md"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("RENAMED_MISSING_TO"));
}

#[test]
fn validate_all_reports_cross_spec_duplicates() {
    let dir = TempDir::new().unwrap();
    write(&dir, "specs/auth/spec.md", AUTH);
    write(&dir, "specs/search/spec.md", &SEARCH.replace("Query", "Login"));

    specmerge(&dir)
        .args(["validate", "--all"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("CROSS_SPEC_DUPLICATE"))
        .stdout(predicate::str::contains("auth, search"));
}

#[test]
fn validate_all_json() {
    let dir = TempDir::new().unwrap();
    write(&dir, "specs/auth/spec.md", AUTH);
    write(&dir, "specs/search/spec.md", SEARCH);

    let output = specmerge(&dir)
        .args(["validate", "--all", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[2]["name"], "spec set");
    assert_eq!(results[2]["valid"], true);
}

#[test]
fn validate_requires_path_or_all() {
    let dir = TempDir::new().unwrap();
    specmerge(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PATH is required"));
}

// ---------------------------------------------------------------------------
// specmerge show / fmt
// ---------------------------------------------------------------------------

#[test]
fn show_spec_json() {
    let dir = TempDir::new().unwrap();
    write(&dir, "specs/auth/spec.md", AUTH);

    let output = specmerge(&dir)
        .args(["show", "specs/auth/spec.md", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let spec: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(spec["title"], "Auth");
    assert_eq!(spec["requirements"][0]["name"], "Login");
    assert_eq!(
        spec["requirements"][0]["scenarios"][0]["when"],
        "the user submits a correct password"
    );
}

#[test]
fn show_delta_summary() {
    let dir = TempDir::new().unwrap();
    write(&dir, "delta.md", TWO_FACTOR_DELTA);

    specmerge(&dir)
        .args(["show", "delta.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+ added"))
        .stdout(predicate::str::contains("'Two Factor' (1 scenarios)"));
}

#[test]
fn fmt_write_canonicalizes() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "specs/auth/spec.md",
        "# Auth\n## Requirements\n### Requirement: Login\n#### Scenario: ok\n- **WHEN** x\n- **THEN** y\n",
    );

    specmerge(&dir)
        .args(["fmt", "specs/auth/spec.md", "--write"])
        .assert()
        .success()
        .stdout(predicate::str::contains("formatted"));

    assert_eq!(
        read(&dir, "specs/auth/spec.md"),
        "# Auth Specification\n\n## Requirements\n\n### Requirement: Login\n#### Scenario: ok\n- **WHEN** x\n- **THEN** y\n"
    );

    specmerge(&dir)
        .args(["fmt", "specs/auth/spec.md", "--write"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already formatted"));
}

#[test]
fn fmt_write_refuses_to_drop_other_sections() {
    let dir = TempDir::new().unwrap();
    let original = "# Auth\n\n## Requirements\n### Requirement: Login\n#### Scenario: ok\n- **WHEN** x\n- **THEN** y\n\n## Design Notes\nKeep this.\n";
    write(&dir, "specs/auth/spec.md", original);

    specmerge(&dir)
        .args(["fmt", "specs/auth/spec.md", "--write"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to rewrite"))
        .stderr(predicate::str::contains("Keep this."));

    assert_eq!(read(&dir, "specs/auth/spec.md"), original);
}

#[test]
fn apply_keeps_delta_block_as_written() {
    let dir = TempDir::new().unwrap();
    write(&dir, "specs/auth/spec.md", AUTH);
    write(
        &dir,
        "delta.md",
        "## MODIFIED Requirements\n\n### Requirement: Login\nThe system SHALL accept a password.\n\nPasswords SHALL be hashed.\n\n#### Scenario: valid credentials\n- **WHEN** the user submits a correct password\n- **THEN** a session starts\n\n  Note: audit logged.\n",
    );

    specmerge(&dir)
        .args(["apply", "specs/auth/spec.md", "delta.md", "--write"])
        .assert()
        .success();

    let merged = read(&dir, "specs/auth/spec.md");
    assert!(merged.contains("a password.\n\nPasswords SHALL be hashed."));
    assert!(merged.ends_with("- **THEN** a session starts\n\n  Note: audit logged.\n"));
}

#[test]
fn archive_rejects_full_spec_for_existing_capability() {
    let dir = TempDir::new().unwrap();
    write(&dir, "specs/auth/spec.md", AUTH);
    write(&dir, "changes/rewrite/specs/auth/spec.md", AUTH);

    specmerge(&dir)
        .args(["archive", "rewrite"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("declares no ADDED"));

    assert!(dir.path().join("changes/rewrite").exists());
}

#[test]
fn fmt_refuses_delta() {
    let dir = TempDir::new().unwrap();
    write(&dir, "delta.md", TWO_FACTOR_DELTA);
    specmerge(&dir)
        .args(["fmt", "delta.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("delta document"));
}

// ---------------------------------------------------------------------------
// specmerge apply
// ---------------------------------------------------------------------------

#[test]
fn apply_prints_merged_text_and_log() {
    let dir = TempDir::new().unwrap();
    write(&dir, "specs/auth/spec.md", AUTH);
    write(&dir, "delta.md", TWO_FACTOR_DELTA);

    specmerge(&dir)
        .args(["apply", "specs/auth/spec.md", "delta.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("### Requirement: Two Factor"))
        .stderr(predicate::str::contains("+ added 'Two Factor'"));

    assert_eq!(read(&dir, "specs/auth/spec.md"), AUTH);
}

#[test]
fn apply_write_updates_baseline() {
    let dir = TempDir::new().unwrap();
    write(&dir, "specs/auth/spec.md", AUTH);
    write(
        &dir,
        "delta.md",
        "## RENAMED Requirements\n\n- FROM: `### Requirement: Login`\n- TO: `### Requirement: Sign In`\n",
    );

    specmerge(&dir)
        .args(["apply", "specs/auth/spec.md", "delta.md", "--write"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 applied, 0 skipped"));

    let merged = read(&dir, "specs/auth/spec.md");
    assert!(merged.contains("### Requirement: Sign In\nThe system SHALL accept a password."));
    assert!(!merged.contains("### Requirement: Login"));
}

#[test]
fn apply_conflicting_delta_fails() {
    let dir = TempDir::new().unwrap();
    write(&dir, "specs/auth/spec.md", AUTH);
    write(
        &dir,
        "delta.md",
        "## MODIFIED Requirements\n\n### Requirement: Login\n#### Scenario: a\n- **WHEN** x\n- **THEN** y\n\n## REMOVED Requirements\n\n### Requirement: Login\n",
    );

    specmerge(&dir)
        .args(["apply", "specs/auth/spec.md", "delta.md", "--write"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("conflicting delta operations"));

    assert_eq!(read(&dir, "specs/auth/spec.md"), AUTH);
}

// ---------------------------------------------------------------------------
// specmerge archive
// ---------------------------------------------------------------------------

fn archived_dirs(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(root.join("changes/archive"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn archive_merges_and_moves_change() {
    let dir = TempDir::new().unwrap();
    write(&dir, "specs/auth/spec.md", AUTH);
    write(&dir, "changes/add-2fa/specs/auth/spec.md", TWO_FACTOR_DELTA);

    specmerge(&dir)
        .args(["archive", "add-2fa"])
        .assert()
        .success()
        .stdout(predicate::str::contains("update auth"))
        .stdout(predicate::str::contains("+ added 'Two Factor'"));

    assert!(read(&dir, "specs/auth/spec.md").contains("### Requirement: Two Factor"));
    assert!(!dir.path().join("changes/add-2fa").exists());
    let archived = archived_dirs(dir.path());
    assert_eq!(archived.len(), 1);
    assert!(archived[0].ends_with("-add-2fa"));
}

#[test]
fn archive_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write(&dir, "specs/auth/spec.md", AUTH);
    write(&dir, "changes/add-2fa/specs/auth/spec.md", TWO_FACTOR_DELTA);

    specmerge(&dir)
        .args(["archive", "add-2fa", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing written"));

    assert_eq!(read(&dir, "specs/auth/spec.md"), AUTH);
    assert!(dir.path().join("changes/add-2fa").exists());
}

#[test]
fn archive_unknown_change_fails() {
    let dir = TempDir::new().unwrap();
    specmerge(&dir)
        .args(["archive", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("change not found: missing"));
}

// ---------------------------------------------------------------------------
// specmerge list / config
// ---------------------------------------------------------------------------

#[test]
fn list_shows_capabilities_and_changes() {
    let dir = TempDir::new().unwrap();
    write(&dir, "specs/auth/spec.md", AUTH);
    write(&dir, "specs/search/spec.md", SEARCH);
    write(&dir, "changes/add-2fa/specs/auth/spec.md", TWO_FACTOR_DELTA);

    specmerge(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("CAPABILITY"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("add-2fa"));
}

#[test]
fn config_show_defaults() {
    let dir = TempDir::new().unwrap();
    specmerge(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("specs_dir: specs"));
}

#[test]
fn config_validate_flags_errors() {
    let dir = TempDir::new().unwrap();
    write(&dir, "specmerge.yaml", "specs_dir: same\nchanges_dir: same\n");
    specmerge(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"));
}
