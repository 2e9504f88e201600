use anyhow::Context;
use specmerge_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing specmerge in: {}", root.display());

    let config_path = paths::config_path(root);
    let config = if config_path.exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root).context("failed to load config")?
    } else {
        let cfg = Config::default();
        cfg.save(root)
            .with_context(|| format!("failed to write {}", paths::CONFIG_FILE))?;
        println!("  created: {}", paths::CONFIG_FILE);
        cfg
    };

    let dirs = [
        paths::specs_dir(root, &config),
        paths::changes_dir(root, &config),
        paths::archive_dir(root, &config),
    ];
    for dir in dirs {
        let rel = dir.strip_prefix(root).unwrap_or(&dir).display().to_string();
        if dir.is_dir() {
            println!("  exists:  {rel}/");
            continue;
        }
        io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
        println!("  created: {rel}/");
    }

    Ok(())
}
