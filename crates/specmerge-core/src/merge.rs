//! Apply delta operations to a baseline document.
//!
//! The baseline is split into segments: free text, and requirement blocks
//! running from a `### Requirement:` heading up to the next requirement
//! heading or `#`/`##` section heading. Operations edit that list and the
//! result is joined back together, so untouched blocks keep their exact
//! bytes and requirement names never pass through a regex.

use crate::delta::parse_delta;
use crate::error::{Result, SpecError};
use crate::model::{DeltaOperation, RemovedRequirement, RenamedRequirement, Requirement};
use crate::serializer::render_requirement;
use crate::syntax::{self, Line};
use crate::types::OperationKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "name", rename_all = "snake_case")]
pub enum MergeOutcome {
    Applied,
    /// The requirement the operation targets is not in the baseline.
    TargetNotFound(String),
    /// The operation would create a second requirement with this name.
    NameCollision(String),
}

impl MergeOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MergeOutcome::Applied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationReport {
    pub kind: OperationKind,
    pub target: String,
    pub outcome: MergeOutcome,
    /// Human-readable change-log line.
    pub log: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub text: String,
    /// One entry per operation, in the order they were applied.
    pub operations: Vec<OperationReport>,
}

impl MergeReport {
    pub fn log(&self) -> Vec<&str> {
        self.operations.iter().map(|o| o.log.as_str()).collect()
    }

    pub fn applied(&self) -> usize {
        self.operations
            .iter()
            .filter(|o| o.outcome.is_applied())
            .count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &OperationReport> {
        self.operations.iter().filter(|o| !o.outcome.is_applied())
    }

    pub fn is_clean(&self) -> bool {
        self.skipped().next().is_none()
    }
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Requirement { name: String, text: String },
}

impl Segment {
    fn text_mut(&mut self) -> &mut String {
        match self {
            Segment::Text(text) | Segment::Requirement { text, .. } => text,
        }
    }

    fn requirement_name(&self) -> Option<&str> {
        match self {
            Segment::Requirement { name, .. } => Some(name),
            Segment::Text(_) => None,
        }
    }
}

struct Blocks {
    segments: Vec<Segment>,
}

impl Blocks {
    fn split(text: &str) -> Self {
        let mut segments: Vec<Segment> = Vec::new();
        for line in text.split_inclusive('\n') {
            match syntax::classify(line.trim_end_matches('\n')) {
                Line::Requirement(name) => segments.push(Segment::Requirement {
                    name: name.to_string(),
                    text: line.to_string(),
                }),
                Line::Title(_) | Line::Section(_) => match segments.last_mut() {
                    Some(Segment::Text(text)) => text.push_str(line),
                    _ => segments.push(Segment::Text(line.to_string())),
                },
                _ => match segments.last_mut() {
                    Some(last) => last.text_mut().push_str(line),
                    None => segments.push(Segment::Text(line.to_string())),
                },
            }
        }
        Self { segments }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.segments
            .iter()
            .position(|s| s.requirement_name() == Some(name))
    }

    fn render(&self) -> String {
        let joined: String = self
            .segments
            .iter()
            .map(|s| match s {
                Segment::Text(text) | Segment::Requirement { text, .. } => text.as_str(),
            })
            .collect();
        let mut out = joined.trim().to_string();
        out.push('\n');
        out
    }

    fn rename(&mut self, op: &RenamedRequirement) -> MergeOutcome {
        let Some(idx) = self.position(&op.from) else {
            return MergeOutcome::TargetNotFound(op.from.clone());
        };
        if op.from != op.to && self.position(&op.to).is_some() {
            return MergeOutcome::NameCollision(op.to.clone());
        }
        if let Segment::Requirement { name, text } = &mut self.segments[idx] {
            let rest = text.find('\n').map(|i| &text[i..]).unwrap_or("");
            *text = format!("### Requirement: {}{rest}", op.to);
            *name = op.to.clone();
        }
        MergeOutcome::Applied
    }

    fn remove(&mut self, op: &RemovedRequirement) -> MergeOutcome {
        match self.position(&op.name) {
            Some(idx) => {
                self.segments.remove(idx);
                MergeOutcome::Applied
            }
            None => MergeOutcome::TargetNotFound(op.name.clone()),
        }
    }

    fn modify(&mut self, req: &Requirement) -> MergeOutcome {
        let Some(idx) = self.position(&req.name) else {
            return MergeOutcome::TargetNotFound(req.name.clone());
        };
        self.segments[idx] = Segment::Requirement {
            name: req.name.clone(),
            text: block_text(req),
        };
        MergeOutcome::Applied
    }

    fn add(&mut self, req: &Requirement) -> MergeOutcome {
        if self.position(&req.name).is_some() {
            return MergeOutcome::NameCollision(req.name.clone());
        }
        let at = self
            .segments
            .iter()
            .rposition(|s| s.requirement_name().is_some())
            .map(|i| i + 1)
            .unwrap_or(self.segments.len());
        if at > 0 {
            ensure_blank_line(self.segments[at - 1].text_mut());
        }
        self.segments.insert(
            at,
            Segment::Requirement {
                name: req.name.clone(),
                text: block_text(req),
            },
        );
        MergeOutcome::Applied
    }
}

/// Replacement block text: the block as written in the delta when known,
/// otherwise the canonical rendering; trimmed, plus a blank line.
fn block_text(req: &Requirement) -> String {
    match req.source.as_deref() {
        Some(source) => format!("{}\n\n", source.trim()),
        None => format!("{}\n\n", render_requirement(req).trim()),
    }
}

fn ensure_blank_line(text: &mut String) {
    if text.trim().is_empty() {
        return;
    }
    while !text.ends_with("\n\n") {
        text.push('\n');
    }
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

/// Reject operation sets that name the same requirement more than once.
/// RENAMED entries count by their old name.
fn check_conflicts(ops: &[DeltaOperation]) -> Result<()> {
    let mut seen: HashMap<&str, OperationKind> = HashMap::new();
    for op in ops {
        if let Some(prev) = seen.insert(op.target(), op.kind()) {
            let kinds = if prev == op.kind() {
                format!("{} twice", prev.as_str().to_uppercase())
            } else {
                format!(
                    "{} and {}",
                    prev.as_str().to_uppercase(),
                    op.kind().as_str().to_uppercase()
                )
            };
            return Err(SpecError::ConflictingOperations {
                name: op.target().to_string(),
                kinds,
            });
        }
    }
    Ok(())
}

fn log_line(op: &DeltaOperation, outcome: &MergeOutcome) -> String {
    let kind = op.kind();
    match outcome {
        MergeOutcome::Applied => match op {
            DeltaOperation::Renamed(r) => {
                format!("{} renamed '{}' to '{}'", kind.symbol(), r.from, r.to)
            }
            _ => format!("{} {} '{}'", kind.symbol(), kind, op.target()),
        },
        MergeOutcome::TargetNotFound(name) => {
            format!("! {kind} '{}' skipped: '{name}' not found", op.target())
        }
        MergeOutcome::NameCollision(name) => {
            format!("! {kind} '{}' skipped: '{name}' already exists", op.target())
        }
    }
}

/// Apply `ops` to `baseline` in RENAMED → REMOVED → MODIFIED → ADDED order,
/// keeping source order within each kind.
pub fn apply_delta(baseline: &str, ops: &[DeltaOperation]) -> Result<MergeReport> {
    check_conflicts(ops)?;

    let mut ordered: Vec<&DeltaOperation> = ops.iter().collect();
    ordered.sort_by_key(|op| op.kind().precedence());

    let mut blocks = Blocks::split(baseline);
    let mut operations = Vec::with_capacity(ordered.len());
    for op in ordered {
        let outcome = match op {
            DeltaOperation::Renamed(r) => blocks.rename(r),
            DeltaOperation::Removed(r) => blocks.remove(r),
            DeltaOperation::Modified(r) => blocks.modify(r),
            DeltaOperation::Added(r) => blocks.add(r),
        };
        let log = log_line(op, &outcome);
        if outcome.is_applied() {
            tracing::debug!("{log}");
        } else {
            tracing::warn!("{log}");
        }
        operations.push(OperationReport {
            kind: op.kind(),
            target: op.target().to_string(),
            outcome,
            log,
        });
    }

    Ok(MergeReport {
        text: blocks.render(),
        operations,
    })
}

/// Merge one capability's delta document into its baseline.
///
/// With no baseline, a document without any delta section is a brand-new
/// spec and is copied through verbatim; otherwise the operations are applied
/// to an empty skeleton for the capability. A delta with no operations is an
/// error, so a full spec dropped over an existing baseline is never a silent
/// no-op.
pub fn merge_capability(
    baseline: Option<&str>,
    capability: &str,
    delta_text: &str,
) -> Result<MergeReport> {
    if baseline.is_none() && !syntax::has_delta_sections(delta_text) {
        return Ok(MergeReport {
            text: delta_text.to_string(),
            operations: Vec::new(),
        });
    }

    let delta = parse_delta(delta_text);
    if let Some(from) = delta.unpaired_renames.first() {
        return Err(SpecError::UnpairedRename(from.clone()));
    }
    if delta.is_empty() {
        return Err(SpecError::EmptyDelta(capability.to_string()));
    }

    let skeleton;
    let base = match baseline {
        Some(text) => text,
        None => {
            skeleton = skeleton_for(capability);
            &skeleton
        }
    };
    apply_delta(base, &delta.operations())
}

/// Empty baseline for a capability that has no spec yet.
pub fn skeleton_for(capability: &str) -> String {
    let title = capability
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "# {title} Specification\n\n## Purpose\n\nTBD: describe the purpose of the {capability} capability.\n\n## Requirements\n"
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
