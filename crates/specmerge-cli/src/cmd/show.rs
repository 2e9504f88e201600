use crate::cmd::read_spec;
use crate::output::{print_json, print_table};
use specmerge_core::{model::DeltaOperation, parse, parse_delta, syntax};
use std::path::Path;

pub fn run(path: &Path, delta: bool, json: bool) -> anyhow::Result<()> {
    let text = read_spec(path)?;
    if delta || syntax::has_delta_sections(&text) {
        show_delta(&text, json)
    } else {
        show_spec(&text, json)
    }
}

fn show_spec(text: &str, json: bool) -> anyhow::Result<()> {
    let spec = parse(text);
    if json {
        return print_json(&spec);
    }

    let title = if spec.title.is_empty() {
        "(untitled)"
    } else {
        spec.title.as_str()
    };
    println!("Title:   {title}");
    println!(
        "Purpose: {}",
        spec.purpose
            .as_deref()
            .and_then(|p| p.lines().next())
            .unwrap_or("(none)")
    );
    for (key, value) in &spec.metadata {
        let value = serde_yaml::to_string(value).unwrap_or_default();
        println!("  {key}: {}", value.trim());
    }
    println!();

    if spec.requirements.is_empty() {
        println!("No requirements.");
        return Ok(());
    }
    let rows = spec
        .requirements
        .iter()
        .map(|r| {
            let incomplete = r.scenarios.iter().filter(|s| !s.is_complete()).count();
            vec![
                r.name.clone(),
                r.scenarios.len().to_string(),
                if incomplete == 0 {
                    String::new()
                } else {
                    format!("{incomplete} incomplete")
                },
            ]
        })
        .collect();
    print_table(&["REQUIREMENT", "SCENARIOS", "NOTES"], rows);
    Ok(())
}

fn show_delta(text: &str, json: bool) -> anyhow::Result<()> {
    let delta = parse_delta(text);
    if json {
        return print_json(&delta);
    }

    if delta.is_empty() && delta.unpaired_renames.is_empty() {
        println!("No delta operations.");
        return Ok(());
    }
    for op in delta.operations() {
        let detail = match &op {
            DeltaOperation::Renamed(r) => format!("'{}' -> '{}'", r.from, r.to),
            DeltaOperation::Removed(r) => match &r.reason {
                Some(reason) => format!("'{}' (reason: {reason})", r.name),
                None => format!("'{}'", r.name),
            },
            DeltaOperation::Modified(r) | DeltaOperation::Added(r) => {
                format!("'{}' ({} scenarios)", r.name, r.scenarios.len())
            }
        };
        println!("{} {:<9} {detail}", op.kind().symbol(), op.kind().as_str());
    }
    for from in &delta.unpaired_renames {
        println!("! unpaired rename from '{from}' (no TO line)");
    }
    Ok(())
}
