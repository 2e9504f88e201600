//! Structural validation over raw document lines.
//!
//! Validation works on the text rather than the parsed model so every finding
//! can carry a line number. It never fails; findings accumulate into a
//! [`ValidationResult`].

use crate::syntax::{self, Line, SectionKind};
use crate::types::{IssueCode, OperationKind, Severity};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    /// 1-based line in the validated text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl ValidationIssue {
    pub fn new(code: IssueCode, message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            severity: code.severity(),
            code,
            message: message.into(),
            line,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub requirement_count: usize,
    pub scenario_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub name: String,
    /// True iff `errors` is empty. Warnings never affect this.
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub stats: ValidationStats,
}

impl ValidationResult {
    pub fn from_issues(
        name: impl Into<String>,
        issues: Vec<ValidationIssue>,
        stats: ValidationStats,
    ) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = issues
            .into_iter()
            .partition(|i| i.severity == Severity::Error);
        Self {
            name: name.into(),
            valid: errors.is_empty(),
            errors,
            warnings,
            stats,
        }
    }

    /// Caller-level policy: strict mode also fails on warnings.
    pub fn passes(&self, strict: bool) -> bool {
        self.valid && (!strict || self.warnings.is_empty())
    }

    pub fn count(&self, code: IssueCode) -> usize {
        self.errors
            .iter()
            .chain(&self.warnings)
            .filter(|i| i.code == code)
            .count()
    }

    pub fn has(&self, code: IssueCode) -> bool {
        self.count(code) > 0
    }

    /// Drop every finding with the given code.
    pub fn suppress(&mut self, code: IssueCode) {
        self.errors.retain(|i| i.code != code);
        self.warnings.retain(|i| i.code != code);
        self.valid = self.errors.is_empty();
    }
}

// ---------------------------------------------------------------------------
// Single-document walker
// ---------------------------------------------------------------------------

static WEAK_RE: OnceLock<Regex> = OnceLock::new();

fn weak_re() -> &'static Regex {
    WEAK_RE.get_or_init(|| Regex::new(r"\bshould\b").unwrap())
}

struct OpenRequirement {
    name: String,
    line: usize,
    scenario_names: HashSet<String>,
    scenarios: usize,
}

struct OpenScenario {
    name: String,
    line: usize,
    has_when: bool,
    has_then: bool,
}

struct OpenRemoval {
    name: String,
    line: usize,
    has_reason: bool,
}

struct Walker {
    is_delta: bool,
    issues: Vec<ValidationIssue>,
    stats: ValidationStats,
    section: Option<SectionKind>,
    requirement: Option<OpenRequirement>,
    scenario: Option<OpenScenario>,
    removal: Option<OpenRemoval>,
    pending_from: Option<(String, usize)>,
    /// Requirement name -> (first line, delta section it appeared under).
    seen: HashMap<String, (usize, Option<OperationKind>)>,
    has_title: bool,
    has_purpose: bool,
    operations: usize,
}

impl Walker {
    fn new(is_delta: bool) -> Self {
        Self {
            is_delta,
            issues: Vec::new(),
            stats: ValidationStats::default(),
            section: None,
            requirement: None,
            scenario: None,
            removal: None,
            pending_from: None,
            seen: HashMap::new(),
            has_title: false,
            has_purpose: false,
            operations: 0,
        }
    }

    fn issue(&mut self, code: IssueCode, message: String, line: usize) {
        self.issues.push(ValidationIssue::new(code, message, Some(line)));
    }

    fn delta_kind(&self) -> Option<OperationKind> {
        match self.section {
            Some(SectionKind::Delta(kind)) if self.is_delta => Some(kind),
            _ => None,
        }
    }

    fn step(&mut self, raw: &str, line: usize) {
        match syntax::classify(raw) {
            Line::Title(_) => {
                self.close_requirement();
                self.has_title = true;
            }
            Line::Section(kind) => {
                self.close_requirement();
                self.close_removal();
                self.close_rename();
                if kind == SectionKind::Purpose {
                    self.has_purpose = true;
                }
                self.section = Some(kind);
            }
            Line::Requirement(name) => self.on_requirement(name, line),
            Line::Scenario(name) => self.on_scenario(name, line),
            Line::When(_) => match self.scenario.as_mut() {
                Some(s) => s.has_when = true,
                None => self.issue(
                    IssueCode::OrphanWhen,
                    "WHEN clause outside any scenario".to_string(),
                    line,
                ),
            },
            Line::Then(_) => match self.scenario.as_mut() {
                Some(s) => s.has_then = true,
                None => self.issue(
                    IssueCode::OrphanThen,
                    "THEN clause outside any scenario".to_string(),
                    line,
                ),
            },
            Line::Reason(_) if self.removal.is_some() => {
                if let Some(r) = self.removal.as_mut() {
                    r.has_reason = true;
                }
            }
            Line::RenameFrom(name) if self.delta_kind() == Some(OperationKind::Renamed) => {
                self.close_rename();
                self.operations += 1;
                self.record_name(name, line);
                self.pending_from = Some((name.to_string(), line));
            }
            Line::RenameTo(to) if self.delta_kind() == Some(OperationKind::Renamed) => {
                if let Some((from, from_line)) = self.pending_from.take() {
                    if to.is_empty() {
                        self.unpaired(&from, from_line);
                    }
                }
            }
            Line::Blank | Line::And(_) => {}
            _ => self.on_text(raw, line),
        }
    }

    fn on_requirement(&mut self, name: &str, line: usize) {
        self.close_requirement();
        self.stats.requirement_count += 1;
        if self.delta_kind().is_some() {
            self.operations += 1;
        }
        self.record_name(name, line);

        if self.delta_kind() == Some(OperationKind::Removed) {
            self.close_removal();
            self.removal = Some(OpenRemoval {
                name: name.to_string(),
                line,
                has_reason: false,
            });
            return;
        }
        self.requirement = Some(OpenRequirement {
            name: name.to_string(),
            line,
            scenario_names: HashSet::new(),
            scenarios: 0,
        });
    }

    /// Track requirement names for duplicate and conflict detection.
    fn record_name(&mut self, name: &str, line: usize) {
        let kind = self.delta_kind();
        match self.seen.get(name) {
            Some(&(first, first_kind)) if self.is_delta && first_kind != kind => {
                let describe = |k: Option<OperationKind>| {
                    k.map(|k| k.as_str().to_uppercase())
                        .unwrap_or_else(|| "no section".to_string())
                };
                self.issue(
                    IssueCode::DeltaConflict,
                    format!(
                        "requirement '{name}' appears under both {} (line {first}) and {}",
                        describe(first_kind),
                        describe(kind)
                    ),
                    line,
                );
            }
            Some(&(first, _)) => self.issue(
                IssueCode::DuplicateRequirement,
                format!("requirement '{name}' is already declared at line {first}"),
                line,
            ),
            None => {
                self.seen.insert(name.to_string(), (line, kind));
            }
        }
    }

    fn on_scenario(&mut self, name: &str, line: usize) {
        self.close_scenario();
        self.stats.scenario_count += 1;
        match self.requirement.as_mut() {
            Some(req) => {
                if !req.scenario_names.insert(name.to_string()) {
                    let req_name = req.name.clone();
                    self.issue(
                        IssueCode::DuplicateScenario,
                        format!("scenario '{name}' is declared twice in requirement '{req_name}'"),
                        line,
                    );
                }
            }
            None if !self.is_delta => self.issue(
                IssueCode::OrphanScenario,
                format!("scenario '{name}' is not inside a requirement"),
                line,
            ),
            None => {}
        }
        self.scenario = Some(OpenScenario {
            name: name.to_string(),
            line,
            has_when: false,
            has_then: false,
        });
    }

    fn on_text(&mut self, raw: &str, line: usize) {
        if self.requirement.is_none() || self.scenario.is_some() {
            return;
        }
        if weak_re().is_match(raw) {
            let req_name = self
                .requirement
                .as_ref()
                .map(|r| r.name.clone())
                .unwrap_or_default();
            self.issue(
                IssueCode::WeakLanguage,
                format!("requirement '{req_name}' uses 'should'; prefer SHALL or MUST"),
                line,
            );
        }
    }

    fn close_scenario(&mut self) {
        let Some(scenario) = self.scenario.take() else {
            return;
        };
        if !scenario.has_when {
            self.issue(
                IssueCode::MissingWhen,
                format!("scenario '{}' has no WHEN clause", scenario.name),
                scenario.line,
            );
        }
        if !scenario.has_then {
            self.issue(
                IssueCode::MissingThen,
                format!("scenario '{}' has no THEN clause", scenario.name),
                scenario.line,
            );
        }
        if let Some(req) = self.requirement.as_mut() {
            req.scenarios += 1;
        }
    }

    fn close_requirement(&mut self) {
        self.close_scenario();
        let Some(req) = self.requirement.take() else {
            return;
        };
        if req.scenarios == 0 {
            self.issue(
                IssueCode::MissingScenarios,
                format!("requirement '{}' has no scenarios", req.name),
                req.line,
            );
        }
    }

    fn close_removal(&mut self) {
        let Some(removal) = self.removal.take() else {
            return;
        };
        if !removal.has_reason {
            self.issue(
                IssueCode::RemovedNoReason,
                format!("removed requirement '{}' has no **Reason**", removal.name),
                removal.line,
            );
        }
    }

    fn close_rename(&mut self) {
        if let Some((from, line)) = self.pending_from.take() {
            self.unpaired(&from, line);
        }
    }

    fn unpaired(&mut self, from: &str, line: usize) {
        self.issue(
            IssueCode::RenamedMissingTo,
            format!("rename of '{from}' has no matching TO line"),
            line,
        );
    }

    fn finish(mut self, name: &str) -> ValidationResult {
        self.close_requirement();
        self.close_removal();
        self.close_rename();

        let mut document = Vec::new();
        if self.is_delta {
            if self.operations == 0 {
                document.push(ValidationIssue::new(
                    IssueCode::EmptyDelta,
                    "delta declares no ADDED, MODIFIED, REMOVED or RENAMED operations",
                    None,
                ));
            }
        } else {
            if !self.has_title {
                document.push(ValidationIssue::new(
                    IssueCode::MissingTitle,
                    "document has no '# Title' heading",
                    None,
                ));
            }
            if !self.has_purpose {
                document.push(ValidationIssue::new(
                    IssueCode::MissingPurpose,
                    "document has no '## Purpose' section",
                    None,
                ));
            }
        }
        document.append(&mut self.issues);
        ValidationResult::from_issues(name, document, self.stats)
    }
}

/// Validate one document. `is_delta` switches between baseline and delta
/// rules.
pub fn validate_spec(text: &str, name: &str, is_delta: bool) -> ValidationResult {
    let doc = syntax::split_front_matter(text);
    let mut walker = Walker::new(is_delta);
    for (idx, line) in doc.body.lines().enumerate() {
        walker.step(line, doc.body_line_offset + idx + 1);
    }
    let result = walker.finish(name);
    tracing::debug!(
        "validated '{name}': {} errors, {} warnings",
        result.errors.len(),
        result.warnings.len()
    );
    result
}

// ---------------------------------------------------------------------------
// Cross-document validation
// ---------------------------------------------------------------------------

/// Detect requirement names declared in more than one document. Documents are
/// visited in name order so output is deterministic.
pub fn validate_spec_set(docs: &BTreeMap<String, String>) -> ValidationResult {
    let mut stats = ValidationStats::default();
    let mut owners: BTreeMap<String, Vec<&str>> = BTreeMap::new();

    for (doc_name, text) in docs {
        let mut local = HashSet::new();
        for line in syntax::split_front_matter(text).body.lines() {
            match syntax::classify(line) {
                Line::Requirement(req) => {
                    stats.requirement_count += 1;
                    if local.insert(req) {
                        owners.entry(req.to_string()).or_default().push(doc_name);
                    }
                }
                Line::Scenario(_) => stats.scenario_count += 1,
                _ => {}
            }
        }
    }

    let issues = owners
        .into_iter()
        .filter(|(_, owners)| owners.len() > 1)
        .map(|(req, owners)| {
            ValidationIssue::new(
                IssueCode::CrossSpecDuplicate,
                format!(
                    "requirement '{req}' is declared in multiple specs: {}",
                    owners.join(", ")
                ),
                None,
            )
        })
        .collect();
    ValidationResult::from_issues("spec set", issues, stats)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
