use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Project settings read from `specmerge.yaml`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Baseline specs, one `<capability>/spec.md` per capability.
    #[serde(default = "default_specs_dir")]
    pub specs_dir: String,
    /// Pending changes, one directory per change.
    #[serde(default = "default_changes_dir")]
    pub changes_dir: String,
    /// Archived changes, relative to `changes_dir`.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,
    /// Treat validation warnings as failures.
    #[serde(default)]
    pub strict: bool,
    /// Report lower-case "should" in requirement text.
    #[serde(default = "default_weak_language")]
    pub weak_language: bool,
}

fn default_specs_dir() -> String {
    "specs".to_string()
}

fn default_changes_dir() -> String {
    "changes".to_string()
}

fn default_archive_dir() -> String {
    "archive".to_string()
}

fn default_weak_language() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            specs_dir: default_specs_dir(),
            changes_dir: default_changes_dir(),
            archive_dir: default_archive_dir(),
            strict: false,
            weak_language: default_weak_language(),
        }
    }
}

impl Config {
    /// Load `specmerge.yaml`, falling back to defaults when it is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            tracing::debug!("no {} at {}, using defaults", paths::CONFIG_FILE, root.display());
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        for (key, value) in [
            ("specs_dir", &self.specs_dir),
            ("changes_dir", &self.changes_dir),
            ("archive_dir", &self.archive_dir),
        ] {
            if value.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("{key} is empty"),
                });
            } else if Path::new(value).is_absolute() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("{key} '{value}' is absolute; paths are resolved from the project root"),
                });
            }
        }

        if self.specs_dir == self.changes_dir {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "specs_dir and changes_dir are both '{}'",
                    self.specs_dir
                ),
            });
        }

        if Path::new(&self.changes_dir).join(&self.archive_dir) == Path::new(&self.specs_dir) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "archive directory resolves to specs_dir".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
