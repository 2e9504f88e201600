//! Typed document model shared by the parsers, validator, merger and serializer.
//!
//! Values are built fresh per call and carry no behaviour beyond small
//! accessors. The parsers are lenient, so a model may hold content the
//! validator would reject (an empty `when`, duplicate names).

use crate::types::OperationKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub when: String,
    pub then: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub and: Vec<String>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A scenario is complete once it has a WHEN and at least one THEN.
    pub fn is_complete(&self) -> bool {
        !self.when.is_empty() && !self.then.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Requirement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    /// The block exactly as written, heading included. Only set for
    /// requirements read from a delta; the merger splices it in verbatim.
    #[serde(skip)]
    pub source: Option<String>,
}

impl Requirement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn scenario(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }
}

// ---------------------------------------------------------------------------
// Spec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    /// Front-matter key/value pairs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_yaml::Value>,
}

impl Spec {
    pub fn requirement(&self, name: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.name == name)
    }

    pub fn scenario_count(&self) -> usize {
        self.requirements.iter().map(|r| r.scenarios.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Delta
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemovedRequirement {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamedRequirement {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaSpec {
    #[serde(default)]
    pub added: Vec<Requirement>,
    #[serde(default)]
    pub modified: Vec<Requirement>,
    #[serde(default)]
    pub removed: Vec<RemovedRequirement>,
    #[serde(default)]
    pub renamed: Vec<RenamedRequirement>,
    /// `from` names of RENAMED entries that never saw a TO line. These are
    /// kept out of `renamed` so they can never reach the merger.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unpaired_renames: Vec<String>,
}

impl DeltaSpec {
    pub fn operation_count(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len() + self.renamed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operation_count() == 0
    }

    /// Flatten into tagged operations, each collection in source order.
    pub fn operations(&self) -> Vec<DeltaOperation> {
        let mut ops = Vec::with_capacity(self.operation_count());
        ops.extend(self.renamed.iter().cloned().map(DeltaOperation::Renamed));
        ops.extend(self.removed.iter().cloned().map(DeltaOperation::Removed));
        ops.extend(self.modified.iter().cloned().map(DeltaOperation::Modified));
        ops.extend(self.added.iter().cloned().map(DeltaOperation::Added));
        ops
    }
}

/// One parsed delta entry tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeltaOperation {
    Renamed(RenamedRequirement),
    Removed(RemovedRequirement),
    Modified(Requirement),
    Added(Requirement),
}

impl DeltaOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            DeltaOperation::Renamed(_) => OperationKind::Renamed,
            DeltaOperation::Removed(_) => OperationKind::Removed,
            DeltaOperation::Modified(_) => OperationKind::Modified,
            DeltaOperation::Added(_) => OperationKind::Added,
        }
    }

    /// The requirement name this operation acts on. For renames this is the
    /// old name.
    pub fn target(&self) -> &str {
        match self {
            DeltaOperation::Renamed(r) => &r.from,
            DeltaOperation::Removed(r) => &r.name,
            DeltaOperation::Modified(r) | DeltaOperation::Added(r) => &r.name,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
