use crate::config::Config;
use crate::error::{Result, SpecError};
use crate::paths;
use std::collections::BTreeMap;
use std::path::Path;

/// Names of the subdirectories of `dir` that contain a `spec.md`, sorted.
/// A missing directory is an empty listing.
fn spec_dirs(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    if !dir.is_dir() {
        return Err(SpecError::NotADirectory(dir.display().to_string()));
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if !entry.path().join(paths::SPEC_FILE).is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Baseline capabilities under the specs directory.
pub fn list_capabilities(root: &Path, config: &Config) -> Result<Vec<String>> {
    spec_dirs(&paths::specs_dir(root, config))
}

/// Capabilities touched by a pending change.
pub fn list_change_capabilities(root: &Path, config: &Config, change: &str) -> Result<Vec<String>> {
    spec_dirs(&paths::change_specs_dir(root, config, change))
}

/// Pending changes: every directory under the changes directory except the
/// archive, sorted.
pub fn list_changes(root: &Path, config: &Config) -> Result<Vec<String>> {
    let dir = paths::changes_dir(root, config);
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name == config.archive_dir || name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// Read every baseline spec, keyed by capability.
pub fn load_spec_set(root: &Path, config: &Config) -> Result<BTreeMap<String, String>> {
    let mut set = BTreeMap::new();
    for capability in list_capabilities(root, config)? {
        let text = std::fs::read_to_string(paths::spec_path(root, config, &capability))?;
        set.insert(capability, text);
    }
    tracing::debug!("loaded {} baseline specs", set.len());
    Ok(set)
}
