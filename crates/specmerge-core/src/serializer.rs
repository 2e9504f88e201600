//! Canonical markdown rendering of the document model.

use crate::model::{Requirement, Scenario, Spec};
use crate::syntax::{self, Line, SectionKind};
use std::collections::HashSet;

/// Render a [`Spec`] as canonical markdown. Parsing the output yields a spec
/// structurally equal to the input.
pub fn serialize(spec: &Spec) -> String {
    let mut out = String::new();

    if !spec.metadata.is_empty() {
        match serde_yaml::to_string(&spec.metadata) {
            Ok(yaml) => {
                out.push_str("---\n");
                out.push_str(yaml.trim_end());
                out.push_str("\n---\n\n");
            }
            Err(e) => tracing::warn!("dropping metadata that failed to serialize: {e}"),
        }
    }

    if !spec.title.is_empty() {
        out.push_str(&format!("# {} Specification\n\n", spec.title));
    }

    if let Some(purpose) = spec.purpose.as_deref().filter(|p| !p.trim().is_empty()) {
        out.push_str("## Purpose\n\n");
        out.push_str(purpose.trim());
        out.push_str("\n\n");
    }

    out.push_str("## Requirements\n\n");
    for req in &spec.requirements {
        out.push_str(&render_requirement(req));
        out.push_str("\n\n");
    }

    let mut text = out.trim_end().to_string();
    text.push('\n');
    text
}

/// Render one requirement block, without a trailing newline.
///
/// The heading is followed by the description and a blank line when there is
/// a description, then the scenarios separated by blank lines.
pub fn render_requirement(req: &Requirement) -> String {
    let mut lines = vec![format!("### Requirement: {}", req.name)];
    let description = req.description.trim();
    if !description.is_empty() {
        lines.extend(description.lines().map(|l| l.trim().to_string()));
        lines.push(String::new());
    }
    for (i, scenario) in req.scenarios.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        render_scenario(scenario, &mut lines);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn render_scenario(scenario: &Scenario, lines: &mut Vec<String>) {
    lines.push(format!("#### Scenario: {}", scenario.name));
    if !scenario.when.is_empty() {
        lines.push(format!("- **WHEN** {}", scenario.when));
    }
    lines.extend(scenario.then.iter().map(|t| format!("- **THEN** {t}")));
    lines.extend(scenario.and.iter().map(|a| format!("- **AND** {a}")));
}

// ---------------------------------------------------------------------------
// Loss check
// ---------------------------------------------------------------------------

/// Identity of a line's content, independent of canonical layout. Lines the
/// serializer always regenerates have none.
fn content_key(raw: &str) -> Option<String> {
    match syntax::classify(raw) {
        Line::Blank => None,
        Line::Section(SectionKind::Purpose | SectionKind::Requirements) => None,
        Line::Title(text) => Some(format!("title:{}", syntax::normalize_title(text))),
        Line::Requirement(name) => Some(format!("requirement:{name}")),
        Line::Scenario(name) => Some(format!("scenario:{name}")),
        Line::When(text) => Some(format!("when:{text}")),
        Line::Then(text) => Some(format!("then:{text}")),
        Line::And(text) => Some(format!("and:{text}")),
        _ => Some(format!("text:{}", raw.trim())),
    }
}

/// Lines of `original` whose content is missing from `formatted`, as
/// 1-based line numbers with the raw line. Used to refuse rewrites that
/// would drop sections, notes or repeated clauses the model does not hold.
pub fn lost_lines(original: &str, formatted: &str) -> Vec<(usize, String)> {
    let source = syntax::split_front_matter(original);
    let output = syntax::split_front_matter(formatted);

    let kept: HashSet<String> = output.body.lines().filter_map(content_key).collect();
    let mut lost = Vec::new();

    let had_front_matter = source.front_matter.is_some_and(|fm| !fm.trim().is_empty());
    if had_front_matter && output.front_matter.is_none() {
        lost.push((1, "---".to_string()));
    }
    for (idx, raw) in source.body.lines().enumerate() {
        if let Some(key) = content_key(raw) {
            if !kept.contains(&key) {
                lost.push((source.body_line_offset + idx + 1, raw.to_string()));
            }
        }
    }
    lost
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
