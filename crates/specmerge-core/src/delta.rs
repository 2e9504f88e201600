//! Delta-document parser: ADDED / MODIFIED / REMOVED / RENAMED sections.

use crate::model::{DeltaSpec, RemovedRequirement, RenamedRequirement};
use crate::parser::RequirementBlock;
use crate::syntax::{self, Line, SectionKind};
use crate::types::OperationKind;

struct DeltaParser {
    section: Option<OperationKind>,
    block: RequirementBlock,
    removed: Option<RemovedRequirement>,
    pending_from: Option<String>,
    delta: DeltaSpec,
}

impl DeltaParser {
    fn new() -> Self {
        Self {
            section: None,
            block: RequirementBlock::with_source(),
            removed: None,
            pending_from: None,
            delta: DeltaSpec::default(),
        }
    }

    fn step(&mut self, raw: &str) {
        let shape = syntax::classify(raw);
        match shape {
            Line::Section(kind) => {
                self.flush_section();
                self.section = match kind {
                    SectionKind::Delta(op) => Some(op),
                    _ => None,
                };
            }
            Line::Title(_) => {}
            _ => match self.section {
                Some(OperationKind::Added) | Some(OperationKind::Modified) => {
                    self.block.feed(shape, raw)
                }
                Some(OperationKind::Removed) => self.in_removed(shape),
                Some(OperationKind::Renamed) => self.in_renamed(shape),
                None => {}
            },
        }
    }

    fn in_removed(&mut self, shape: Line<'_>) {
        match shape {
            Line::Requirement(name) => {
                self.close_removed();
                self.removed = Some(RemovedRequirement {
                    name: name.to_string(),
                    ..RemovedRequirement::default()
                });
            }
            Line::Reason(text) => {
                if let Some(entry) = self.removed.as_mut() {
                    entry.reason.get_or_insert_with(|| text.to_string());
                }
            }
            Line::Migration(text) => {
                if let Some(entry) = self.removed.as_mut() {
                    entry.migration.get_or_insert_with(|| text.to_string());
                }
            }
            _ => {}
        }
    }

    fn close_removed(&mut self) {
        if let Some(entry) = self.removed.take() {
            self.delta.removed.push(entry);
        }
    }

    fn in_renamed(&mut self, shape: Line<'_>) {
        match shape {
            Line::RenameFrom(name) => {
                self.close_rename();
                self.pending_from = Some(name.to_string());
            }
            Line::RenameTo(to) => match self.pending_from.take() {
                Some(from) if !to.is_empty() => self.delta.renamed.push(RenamedRequirement {
                    from,
                    to: to.to_string(),
                }),
                Some(from) => self.delta.unpaired_renames.push(from),
                None => tracing::debug!("ignoring rename TO '{to}' with no FROM"),
            },
            _ => {}
        }
    }

    /// A FROM still waiting for its TO is unpaired.
    fn close_rename(&mut self) {
        if let Some(from) = self.pending_from.take() {
            tracing::debug!("rename FROM '{from}' has no TO");
            self.delta.unpaired_renames.push(from);
        }
    }

    /// Move whatever is open under the current section into its collection.
    fn flush_section(&mut self) {
        match self.section {
            Some(OperationKind::Added) => self.delta.added.extend(self.block.take()),
            Some(OperationKind::Modified) => self.delta.modified.extend(self.block.take()),
            Some(OperationKind::Removed) => self.close_removed(),
            Some(OperationKind::Renamed) => self.close_rename(),
            None => {}
        }
    }

    fn finish(mut self) -> DeltaSpec {
        self.flush_section();
        self.delta
    }
}

/// Parse a delta document into a [`DeltaSpec`]. Never fails.
pub fn parse_delta(text: &str) -> DeltaSpec {
    let doc = syntax::split_front_matter(text);
    let mut parser = DeltaParser::new();
    for line in doc.body.lines() {
        parser.step(line);
    }
    let delta = parser.finish();
    tracing::debug!(
        "parsed delta: {} added, {} modified, {} removed, {} renamed",
        delta.added.len(),
        delta.modified.len(),
        delta.removed.len(),
        delta.renamed.len()
    );
    delta
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
