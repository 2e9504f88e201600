use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// IssueCode
// ---------------------------------------------------------------------------

/// Stable identifiers for validation findings. Callers and tests match on
/// these rather than on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    MissingTitle,
    MissingPurpose,
    MissingWhen,
    MissingThen,
    MissingScenarios,
    DuplicateRequirement,
    DuplicateScenario,
    OrphanScenario,
    OrphanWhen,
    OrphanThen,
    WeakLanguage,
    RemovedNoReason,
    RenamedMissingTo,
    DeltaConflict,
    EmptyDelta,
    CrossSpecDuplicate,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::MissingTitle => "MISSING_TITLE",
            IssueCode::MissingPurpose => "MISSING_PURPOSE",
            IssueCode::MissingWhen => "MISSING_WHEN",
            IssueCode::MissingThen => "MISSING_THEN",
            IssueCode::MissingScenarios => "MISSING_SCENARIOS",
            IssueCode::DuplicateRequirement => "DUPLICATE_REQUIREMENT",
            IssueCode::DuplicateScenario => "DUPLICATE_SCENARIO",
            IssueCode::OrphanScenario => "ORPHAN_SCENARIO",
            IssueCode::OrphanWhen => "ORPHAN_WHEN",
            IssueCode::OrphanThen => "ORPHAN_THEN",
            IssueCode::WeakLanguage => "WEAK_LANGUAGE",
            IssueCode::RemovedNoReason => "REMOVED_NO_REASON",
            IssueCode::RenamedMissingTo => "RENAMED_MISSING_TO",
            IssueCode::DeltaConflict => "DELTA_CONFLICT",
            IssueCode::EmptyDelta => "EMPTY_DELTA",
            IssueCode::CrossSpecDuplicate => "CROSS_SPEC_DUPLICATE",
        }
    }

    /// Severity a finding with this code is reported at.
    pub fn severity(self) -> Severity {
        match self {
            IssueCode::MissingPurpose
            | IssueCode::WeakLanguage
            | IssueCode::RemovedNoReason
            | IssueCode::EmptyDelta => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OperationKind
// ---------------------------------------------------------------------------

/// The four delta operation kinds, declared in merge precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Renamed,
    Removed,
    Modified,
    Added,
}

impl OperationKind {
    pub fn all() -> &'static [OperationKind] {
        &[
            OperationKind::Renamed,
            OperationKind::Removed,
            OperationKind::Modified,
            OperationKind::Added,
        ]
    }

    pub fn precedence(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Renamed => "renamed",
            OperationKind::Removed => "removed",
            OperationKind::Modified => "modified",
            OperationKind::Added => "added",
        }
    }

    /// Marker used in merge log lines.
    pub fn symbol(self) -> &'static str {
        match self {
            OperationKind::Renamed => "→",
            OperationKind::Removed => "−",
            OperationKind::Modified => "~",
            OperationKind::Added => "+",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "renamed" => Ok(OperationKind::Renamed),
            "removed" => Ok(OperationKind::Removed),
            "modified" => Ok(OperationKind::Modified),
            "added" => Ok(OperationKind::Added),
            _ => Err(format!("unknown delta operation kind: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
