pub mod apply;
pub mod archive;
pub mod config;
pub mod fmt;
pub mod init;
pub mod list;
pub mod show;
pub mod validate;

use anyhow::Context;
use std::path::Path;

/// Read a spec file, naming it in the error.
pub(crate) fn read_spec(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
