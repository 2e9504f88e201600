use crate::cmd::read_spec;
use crate::output::print_json;
use anyhow::Context;
use specmerge_core::{io, merge::merge_capability};
use std::path::Path;

pub fn run(baseline: &Path, delta: &Path, write: bool, json: bool) -> anyhow::Result<()> {
    let delta_text = read_spec(delta)?;
    let baseline_text = io::read_optional(baseline)
        .with_context(|| format!("failed to read {}", baseline.display()))?;
    let capability = baseline
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "spec".to_string());

    let report = merge_capability(baseline_text.as_deref(), &capability, &delta_text)
        .with_context(|| format!("failed to apply {}", delta.display()))?;

    if write {
        io::atomic_write(baseline, report.text.as_bytes())
            .with_context(|| format!("failed to write {}", baseline.display()))?;
    }

    if json {
        return print_json(&report);
    }

    // Change log to stderr so stdout carries only the merged document.
    for line in report.log() {
        eprintln!("{line}");
    }
    if write {
        println!(
            "{}: {} applied, {} skipped",
            baseline.display(),
            report.applied(),
            report.skipped().count()
        );
    } else {
        print!("{}", report.text);
    }
    Ok(())
}
