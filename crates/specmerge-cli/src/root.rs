use specmerge_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the project root directory.
///
/// Priority:
/// 1. `--root` flag / `SPECMERGE_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `specmerge.yaml`
/// 3. Walk upward from `cwd` looking for `specs/`
/// 4. Walk upward from `cwd` looking for `.git/`
/// 5. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_root_from(&cwd).unwrap_or(cwd)
}

fn find_root_from(start: &Path) -> Option<PathBuf> {
    let markers: [fn(&Path) -> bool; 3] = [
        |d| d.join(paths::CONFIG_FILE).is_file(),
        |d| d.join("specs").is_dir(),
        |d| d.join(".git").is_dir(),
    ];
    markers
        .iter()
        .find_map(|is_root| start.ancestors().find(|&d| is_root(d)))
        .map(Path::to_path_buf)
}
