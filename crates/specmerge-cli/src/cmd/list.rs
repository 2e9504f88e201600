use crate::output::{print_json, print_table};
use anyhow::Context;
use serde::Serialize;
use specmerge_core::{config::Config, parse, paths, project};
use std::path::Path;

#[derive(Serialize)]
struct CapabilityRow {
    capability: String,
    title: String,
    requirements: usize,
    scenarios: usize,
}

#[derive(Serialize)]
struct ChangeRow {
    change: String,
    capabilities: Vec<String>,
}

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;

    let mut capabilities = Vec::new();
    for (capability, text) in
        project::load_spec_set(root, &config).context("failed to load specs")?
    {
        let spec = parse(&text);
        capabilities.push(CapabilityRow {
            capability,
            title: spec.title.clone(),
            requirements: spec.requirements.len(),
            scenarios: spec.scenario_count(),
        });
    }

    let mut changes = Vec::new();
    for change in project::list_changes(root, &config).context("failed to list changes")? {
        let caps = project::list_change_capabilities(root, &config, &change)?;
        changes.push(ChangeRow {
            change,
            capabilities: caps,
        });
    }

    if json {
        let value = serde_json::json!({
            "capabilities": capabilities,
            "changes": changes,
        });
        return print_json(&value);
    }

    if capabilities.is_empty() {
        println!(
            "No specs under {}.",
            paths::specs_dir(root, &config).display()
        );
    } else {
        let rows = capabilities
            .iter()
            .map(|c| {
                vec![
                    c.capability.clone(),
                    c.title.clone(),
                    c.requirements.to_string(),
                    c.scenarios.to_string(),
                ]
            })
            .collect();
        print_table(&["CAPABILITY", "TITLE", "REQUIREMENTS", "SCENARIOS"], rows);
    }

    if !changes.is_empty() {
        println!();
        let rows = changes
            .iter()
            .map(|c| vec![c.change.clone(), c.capabilities.join(", ")])
            .collect();
        print_table(&["CHANGE", "CAPABILITIES"], rows);
    }
    Ok(())
}
