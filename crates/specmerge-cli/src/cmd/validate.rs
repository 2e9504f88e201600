use crate::cmd::read_spec;
use crate::output::print_json;
use anyhow::Context;
use specmerge_core::{
    config::Config,
    paths, project, syntax,
    types::IssueCode,
    validate_spec, validate_spec_set,
    validator::{ValidationIssue, ValidationResult},
};
use std::path::Path;

pub fn run(
    root: &Path,
    path: Option<&Path>,
    delta: bool,
    all: bool,
    strict: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let strict = strict || config.strict;

    let mut results = if all {
        validate_all(root, &config)?
    } else {
        let path = path.ok_or_else(|| anyhow::anyhow!("a PATH is required unless --all is given"))?;
        let text = read_spec(path)?;
        let is_delta = delta || syntax::has_delta_sections(&text);
        vec![validate_spec(&text, &path.display().to_string(), is_delta)]
    };

    if !config.weak_language {
        for result in &mut results {
            result.suppress(IssueCode::WeakLanguage);
        }
    }

    if json {
        print_json(&results)?;
    } else {
        for result in &results {
            print_result(result);
        }
    }

    let failed: Vec<&str> = results
        .iter()
        .filter(|r| !r.passes(strict))
        .map(|r| r.name.as_str())
        .collect();
    if !failed.is_empty() {
        let mode = if strict { " (strict)" } else { "" };
        anyhow::bail!("validation failed{mode}: {}", failed.join(", "));
    }
    Ok(())
}

/// Every baseline spec, then the cross-spec check.
fn validate_all(root: &Path, config: &Config) -> anyhow::Result<Vec<ValidationResult>> {
    let set = project::load_spec_set(root, config).with_context(|| {
        format!(
            "failed to load specs from {}",
            paths::specs_dir(root, config).display()
        )
    })?;
    if set.is_empty() {
        anyhow::bail!(
            "no specs found under {}",
            paths::specs_dir(root, config).display()
        );
    }

    let mut results: Vec<ValidationResult> = set
        .iter()
        .map(|(capability, text)| validate_spec(text, capability, false))
        .collect();
    results.push(validate_spec_set(&set));
    Ok(results)
}

fn print_result(result: &ValidationResult) {
    if result.errors.is_empty() && result.warnings.is_empty() {
        println!(
            "{}: ok ({} requirements, {} scenarios)",
            result.name, result.stats.requirement_count, result.stats.scenario_count
        );
        return;
    }
    println!(
        "{}: {} errors, {} warnings",
        result.name,
        result.errors.len(),
        result.warnings.len()
    );
    for issue in result.errors.iter().chain(&result.warnings) {
        println!("  {}", format_issue(issue));
    }
}

pub(crate) fn format_issue(issue: &ValidationIssue) -> String {
    match issue.line {
        Some(line) => format!(
            "[{}] {} line {line}: {}",
            issue.severity, issue.code, issue.message
        ),
        None => format!("[{}] {}: {}", issue.severity, issue.code, issue.message),
    }
}
