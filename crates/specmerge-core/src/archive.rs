use crate::config::Config;
use crate::error::{Result, SpecError};
use crate::merge::{merge_capability, MergeReport};
use crate::paths;
use crate::project;
use crate::validator::{validate_spec, ValidationResult};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    /// Move the change without touching the baseline specs.
    pub skip_specs: bool,
    /// Date used in the archive directory name. Defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

/// The merged result for one capability of a change.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityUpdate {
    pub capability: String,
    pub path: PathBuf,
    /// True when the capability had no baseline spec.
    pub created: bool,
    pub report: MergeReport,
    /// Validation of the merged document.
    pub validation: ValidationResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveReport {
    pub change: String,
    pub archived_to: PathBuf,
    pub updates: Vec<CapabilityUpdate>,
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

fn require_change(root: &Path, config: &Config, change: &str) -> Result<PathBuf> {
    paths::validate_name(change)?;
    let dir = paths::change_dir(root, config, change);
    if !dir.is_dir() {
        return Err(SpecError::ChangeNotFound(change.to_string()));
    }
    Ok(dir)
}

/// Compute the merged baseline for every capability a change touches,
/// without writing anything.
pub fn plan_change(root: &Path, config: &Config, change: &str) -> Result<Vec<CapabilityUpdate>> {
    require_change(root, config, change)?;

    let mut updates = Vec::new();
    for capability in project::list_change_capabilities(root, config, change)? {
        paths::validate_name(&capability)?;
        let delta_text =
            std::fs::read_to_string(paths::change_delta_path(root, config, change, &capability))?;
        let path = paths::spec_path(root, config, &capability);
        let baseline = crate::io::read_optional(&path)?;

        let report = merge_capability(baseline.as_deref(), &capability, &delta_text)?;
        let mut validation = validate_spec(&report.text, &capability, false);
        if !config.weak_language {
            validation.suppress(crate::types::IssueCode::WeakLanguage);
        }
        tracing::debug!(
            "planned '{capability}': {} applied, {} skipped",
            report.applied(),
            report.skipped().count()
        );
        updates.push(CapabilityUpdate {
            capability,
            path,
            created: baseline.is_none(),
            report,
            validation,
        });
    }
    Ok(updates)
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

/// Merge a change into the baseline specs and move it to the archive.
///
/// Every capability is merged before anything is written, so a conflicting,
/// unpaired or empty delta aborts with the baseline untouched. The writes and the
/// final move are not transactional.
pub fn archive_change(
    root: &Path,
    config: &Config,
    change: &str,
    options: &ArchiveOptions,
) -> Result<ArchiveReport> {
    let source = require_change(root, config, change)?;

    let date = options
        .date
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    let target = paths::archive_target(root, config, change, date);
    if target.exists() {
        return Err(SpecError::ArchiveExists(target.display().to_string()));
    }

    let updates = if options.skip_specs {
        Vec::new()
    } else {
        plan_change(root, config, change)?
    };

    for update in &updates {
        crate::io::atomic_write(&update.path, update.report.text.as_bytes())?;
        tracing::info!(
            "updated spec '{}' ({} operations{})",
            update.capability,
            update.report.operations.len(),
            if update.created { ", created" } else { "" }
        );
    }

    crate::io::ensure_dir(&paths::archive_dir(root, config))?;
    std::fs::rename(&source, &target)?;
    tracing::info!("archived change '{change}' to {}", target.display());

    Ok(ArchiveReport {
        change: change.to_string(),
        archived_to: target,
        updates,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::MergeOutcome;
    use tempfile::TempDir;

    const AUTH: &str = "# Auth Specification\n\n## Purpose\n\nSign users in.\n\n## Requirements\n\n### Requirement: Login\nThe system SHALL accept a password.\n\n#### Scenario: ok\n- **WHEN** valid credentials\n- **THEN** a session starts\n";

    const AUTH_DELTA: &str = "## ADDED Requirements\n\n### Requirement: Two Factor\nThe system SHALL ask for a code.\n\n#### Scenario: code\n- **WHEN** login succeeds\n- **THEN** a code is requested\n";

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    fn options() -> ArchiveOptions {
        ArchiveOptions {
            skip_specs: false,
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
        }
    }

    #[test]
    fn archive_merges_and_moves() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "specs/auth/spec.md", AUTH);
        write(dir.path(), "changes/add-2fa/specs/auth/spec.md", AUTH_DELTA);
        write(dir.path(), "changes/add-2fa/proposal.md", "why\n");

        let report = archive_change(dir.path(), &Config::default(), "add-2fa", &options()).unwrap();

        assert_eq!(report.updates.len(), 1);
        assert!(!report.updates[0].created);
        assert!(report.updates[0].validation.valid);

        let merged = std::fs::read_to_string(dir.path().join("specs/auth/spec.md")).unwrap();
        let spec = crate::parser::parse(&merged);
        let names: Vec<_> = spec.requirements.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Login", "Two Factor"]);

        assert!(!dir.path().join("changes/add-2fa").exists());
        let archived = dir.path().join("changes/archive/2024-05-01-add-2fa");
        assert_eq!(report.archived_to, archived);
        assert!(archived.join("proposal.md").exists());
    }

    #[test]
    fn new_capability_is_created() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "changes/search/specs/user-search/spec.md", AUTH_DELTA);

        let report = archive_change(dir.path(), &Config::default(), "search", &options()).unwrap();
        assert!(report.updates[0].created);

        let merged =
            std::fs::read_to_string(dir.path().join("specs/user-search/spec.md")).unwrap();
        assert!(merged.starts_with("# User Search Specification\n"));
        assert!(merged.contains("### Requirement: Two Factor"));
    }

    #[test]
    fn missing_change_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = archive_change(dir.path(), &Config::default(), "nope", &options()).unwrap_err();
        assert!(matches!(err, SpecError::ChangeNotFound(name) if name == "nope"));
    }

    #[test]
    fn existing_archive_target_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "changes/add-2fa/specs/auth/spec.md", AUTH_DELTA);
        std::fs::create_dir_all(dir.path().join("changes/archive/2024-05-01-add-2fa")).unwrap();

        let err =
            archive_change(dir.path(), &Config::default(), "add-2fa", &options()).unwrap_err();
        assert!(matches!(err, SpecError::ArchiveExists(_)));
        assert!(dir.path().join("changes/add-2fa").exists());
    }

    #[test]
    fn skip_specs_leaves_baseline_alone() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "specs/auth/spec.md", AUTH);
        write(dir.path(), "changes/add-2fa/specs/auth/spec.md", AUTH_DELTA);

        let opts = ArchiveOptions {
            skip_specs: true,
            ..options()
        };
        let report = archive_change(dir.path(), &Config::default(), "add-2fa", &opts).unwrap();
        assert!(report.updates.is_empty());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("specs/auth/spec.md")).unwrap(),
            AUTH
        );
        assert!(dir.path().join("changes/archive/2024-05-01-add-2fa").exists());
    }

    #[test]
    fn unpaired_rename_aborts_before_writing() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "specs/auth/spec.md", AUTH);
        write(
            dir.path(),
            "changes/bad/specs/auth/spec.md",
            "## RENAMED Requirements\n\n- FROM: `### Requirement: Login`\n",
        );

        let err = archive_change(dir.path(), &Config::default(), "bad", &options()).unwrap_err();
        assert!(matches!(err, SpecError::UnpairedRename(_)));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("specs/auth/spec.md")).unwrap(),
            AUTH
        );
        assert!(dir.path().join("changes/bad").exists());
    }

    #[test]
    fn full_spec_in_change_for_existing_capability_aborts() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "specs/auth/spec.md", AUTH);
        write(dir.path(), "changes/rewrite/specs/auth/spec.md", AUTH);

        let err =
            archive_change(dir.path(), &Config::default(), "rewrite", &options()).unwrap_err();
        assert!(matches!(err, SpecError::EmptyDelta(name) if name == "auth"));
        assert!(dir.path().join("changes/rewrite").exists());
        assert!(!dir.path().join("changes/archive").exists());
    }

    #[test]
    fn plan_reports_outcomes_without_writing() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "specs/auth/spec.md", AUTH);
        write(
            dir.path(),
            "changes/cleanup/specs/auth/spec.md",
            "## REMOVED Requirements\n\n### Requirement: Logout\n**Reason**: unused\n",
        );

        let updates = plan_change(dir.path(), &Config::default(), "cleanup").unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(
            updates[0].report.operations[0].outcome,
            MergeOutcome::TargetNotFound("Logout".to_string())
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("specs/auth/spec.md")).unwrap(),
            AUTH
        );
        assert!(dir.path().join("changes/cleanup").exists());
    }
}
