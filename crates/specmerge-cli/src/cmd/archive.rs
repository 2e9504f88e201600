use crate::cmd::validate::format_issue;
use crate::output::print_json;
use anyhow::Context;
use specmerge_core::{
    archive::{archive_change, plan_change, ArchiveOptions, CapabilityUpdate},
    config::Config,
};
use std::path::Path;

pub fn run(
    root: &Path,
    change: &str,
    skip_specs: bool,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;

    if dry_run {
        let updates = plan_change(root, &config, change)
            .with_context(|| format!("failed to plan change '{change}'"))?;
        if json {
            return print_json(&updates);
        }
        println!("Dry run for '{change}' (nothing written):");
        print_updates(root, &updates);
        return Ok(());
    }

    let options = ArchiveOptions {
        skip_specs,
        date: None,
    };
    let report = archive_change(root, &config, change, &options)
        .with_context(|| format!("failed to archive change '{change}'"))?;

    if json {
        return print_json(&report);
    }
    print_updates(root, &report.updates);
    println!(
        "Archived '{change}' to {}",
        report
            .archived_to
            .strip_prefix(root)
            .unwrap_or(&report.archived_to)
            .display()
    );
    Ok(())
}

fn print_updates(root: &Path, updates: &[CapabilityUpdate]) {
    if updates.is_empty() {
        println!("No spec updates.");
        return;
    }
    for update in updates {
        let path = update.path.strip_prefix(root).unwrap_or(&update.path);
        let verb = if update.created { "create" } else { "update" };
        println!("{verb} {} ({})", update.capability, path.display());
        for line in update.report.log() {
            println!("  {line}");
        }
        for issue in update
            .validation
            .errors
            .iter()
            .chain(&update.validation.warnings)
        {
            println!("  {}", format_issue(issue));
        }
    }
}
