use crate::config::Config;
use crate::error::{Result, SpecError};
use chrono::NaiveDate;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File name constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "specmerge.yaml";
pub const SPEC_FILE: &str = "spec.md";
/// Directory inside a change that holds its per-capability deltas.
pub const CHANGE_SPECS_DIR: &str = "specs";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn specs_dir(root: &Path, config: &Config) -> PathBuf {
    root.join(&config.specs_dir)
}

pub fn spec_path(root: &Path, config: &Config, capability: &str) -> PathBuf {
    specs_dir(root, config).join(capability).join(SPEC_FILE)
}

pub fn changes_dir(root: &Path, config: &Config) -> PathBuf {
    root.join(&config.changes_dir)
}

pub fn change_dir(root: &Path, config: &Config, change: &str) -> PathBuf {
    changes_dir(root, config).join(change)
}

pub fn change_specs_dir(root: &Path, config: &Config, change: &str) -> PathBuf {
    change_dir(root, config, change).join(CHANGE_SPECS_DIR)
}

pub fn change_delta_path(root: &Path, config: &Config, change: &str, capability: &str) -> PathBuf {
    change_specs_dir(root, config, change)
        .join(capability)
        .join(SPEC_FILE)
}

pub fn archive_dir(root: &Path, config: &Config) -> PathBuf {
    changes_dir(root, config).join(&config.archive_dir)
}

/// `<changes>/<archive>/<YYYY-MM-DD>-<change>`
pub fn archive_target(root: &Path, config: &Config, change: &str, date: NaiveDate) -> PathBuf {
    archive_dir(root, config).join(format!("{}-{change}", date.format("%Y-%m-%d")))
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

/// Capability and change names are lowercase slugs.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !name_re().is_match(name) {
        return Err(SpecError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in ["auth", "a", "user-auth-2", "x1"] {
            validate_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_names() {
        for name in ["", "-auth", "auth-", "has space", "Auth", "a_b", "../etc"] {
            assert!(validate_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        let config = Config::default();
        assert_eq!(
            spec_path(root, &config, "auth"),
            PathBuf::from("/tmp/proj/specs/auth/spec.md")
        );
        assert_eq!(
            change_delta_path(root, &config, "add-2fa", "auth"),
            PathBuf::from("/tmp/proj/changes/add-2fa/specs/auth/spec.md")
        );
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            archive_target(root, &config, "add-2fa", date),
            PathBuf::from("/tmp/proj/changes/archive/2024-03-09-add-2fa")
        );
    }
}
