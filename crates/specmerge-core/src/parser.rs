//! Lenient baseline-document parser.
//!
//! Parsing never fails. Malformed structure degrades to a partially
//! populated [`Spec`] and the validator reports the details.

use crate::model::{Requirement, Scenario, Spec};
use crate::syntax::{self, Line, SectionKind};

// ---------------------------------------------------------------------------
// Requirement block machine (shared with the delta parser)
// ---------------------------------------------------------------------------

/// Position inside a run of requirement blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum BlockState {
    /// No requirement open.
    #[default]
    Idle,
    /// After a requirement heading, before its first scenario.
    Description,
    /// Inside a scenario.
    Scenario,
}

/// Accumulates `### Requirement:` blocks and their scenarios line by line.
#[derive(Debug, Default)]
pub(crate) struct RequirementBlock {
    state: BlockState,
    current: Option<Requirement>,
    scenario: Option<Scenario>,
    description: Vec<String>,
    /// Record each requirement's raw lines in `Requirement::source`.
    keep_source: bool,
    source: Vec<String>,
    done: Vec<Requirement>,
}

impl RequirementBlock {
    /// A block that also keeps the raw text of every requirement.
    pub(crate) fn with_source() -> Self {
        Self {
            keep_source: true,
            ..Self::default()
        }
    }

    pub(crate) fn feed(&mut self, shape: Line<'_>, raw: &str) {
        self.state = match self.state {
            BlockState::Idle => self.idle(shape),
            BlockState::Description => self.in_description(shape, raw),
            BlockState::Scenario => self.in_scenario(shape),
        };
        if self.keep_source && self.current.is_some() {
            self.source.push(raw.trim_end().to_string());
        }
    }

    fn idle(&mut self, shape: Line<'_>) -> BlockState {
        match shape {
            Line::Requirement(name) => self.open_requirement(name),
            Line::Scenario(name) => {
                tracing::debug!("dropping scenario '{name}' outside any requirement");
                BlockState::Idle
            }
            _ => BlockState::Idle,
        }
    }

    fn in_description(&mut self, shape: Line<'_>, raw: &str) -> BlockState {
        match shape {
            Line::Requirement(name) => self.open_requirement(name),
            Line::Scenario(name) => self.open_scenario(name),
            Line::When(_) | Line::Then(_) | Line::And(_) => {
                tracing::debug!("dropping clause outside any scenario");
                BlockState::Description
            }
            // Blank lines separate paragraphs once the description has begun.
            Line::Blank => {
                if !self.description.is_empty() {
                    self.description.push(String::new());
                }
                BlockState::Description
            }
            _ => {
                self.description.push(raw.trim().to_string());
                BlockState::Description
            }
        }
    }

    fn in_scenario(&mut self, shape: Line<'_>) -> BlockState {
        match shape {
            Line::Requirement(name) => return self.open_requirement(name),
            Line::Scenario(name) => return self.open_scenario(name),
            _ => {}
        }
        let Some(scenario) = self.scenario.as_mut() else {
            return BlockState::Description;
        };
        match shape {
            // First WHEN wins.
            Line::When(text) if scenario.when.is_empty() => scenario.when = text.to_string(),
            Line::When(text) => {
                tracing::debug!("ignoring repeated WHEN in '{}': {text}", scenario.name);
            }
            Line::Then(text) => scenario.then.push(text.to_string()),
            Line::And(text) => scenario.and.push(text.to_string()),
            _ => {}
        }
        BlockState::Scenario
    }

    fn open_requirement(&mut self, name: &str) -> BlockState {
        self.close();
        self.current = Some(Requirement::new(name));
        BlockState::Description
    }

    fn open_scenario(&mut self, name: &str) -> BlockState {
        self.close_scenario();
        self.flush_description();
        self.scenario = Some(Scenario::new(name));
        BlockState::Scenario
    }

    fn flush_description(&mut self) {
        if self.description.is_empty() {
            return;
        }
        let text = paragraphs(&std::mem::take(&mut self.description));
        if let Some(req) = self.current.as_mut() {
            if req.description.is_empty() {
                req.description = text;
            }
        }
    }

    fn close_scenario(&mut self) {
        if let Some(scenario) = self.scenario.take() {
            if let Some(req) = self.current.as_mut() {
                req.scenarios.push(scenario);
            }
        }
    }

    /// Close any open scenario and requirement.
    pub(crate) fn close(&mut self) {
        self.close_scenario();
        self.flush_description();
        let source = std::mem::take(&mut self.source);
        if let Some(mut req) = self.current.take() {
            if self.keep_source {
                req.source = Some(source.join("\n").trim().to_string());
            }
            self.done.push(req);
        }
        self.state = BlockState::Idle;
    }

    /// Close everything and hand back the finished requirements in
    /// encounter order.
    pub(crate) fn take(&mut self) -> Vec<Requirement> {
        self.close();
        std::mem::take(&mut self.done)
    }
}

// ---------------------------------------------------------------------------
// Spec parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before any `## ` section.
    Preamble,
    Purpose,
    Requirements,
    /// Any other `## ` section; its content is skipped.
    OtherSection,
}

struct SpecParser {
    state: State,
    title: Option<String>,
    purpose: Vec<String>,
    block: RequirementBlock,
}

impl SpecParser {
    fn new() -> Self {
        Self {
            state: State::Preamble,
            title: None,
            purpose: Vec::new(),
            block: RequirementBlock::default(),
        }
    }

    fn step(&mut self, raw: &str) {
        let shape = syntax::classify(raw);
        if let Some(next) = self.heading(shape, raw) {
            self.state = next;
            return;
        }
        self.state = match self.state {
            State::Preamble => State::Preamble,
            State::Purpose => self.in_purpose(raw),
            State::Requirements => self.in_requirements(shape, raw),
            State::OtherSection => State::OtherSection,
        };
    }

    /// Transitions that apply in every state.
    fn heading(&mut self, shape: Line<'_>, raw: &str) -> Option<State> {
        match shape {
            Line::Title(text) => {
                self.block.close();
                if self.title.is_none() {
                    self.title = Some(syntax::normalize_title(text));
                }
                Some(State::Preamble)
            }
            Line::Section(kind) => {
                self.block.close();
                Some(match kind {
                    SectionKind::Purpose => State::Purpose,
                    SectionKind::Requirements => State::Requirements,
                    SectionKind::Delta(_) | SectionKind::Other => State::OtherSection,
                })
            }
            Line::Requirement(_) => {
                self.block.feed(shape, raw);
                Some(State::Requirements)
            }
            _ => None,
        }
    }

    fn in_purpose(&mut self, raw: &str) -> State {
        self.purpose.push(raw.to_string());
        State::Purpose
    }

    fn in_requirements(&mut self, shape: Line<'_>, raw: &str) -> State {
        self.block.feed(shape, raw);
        State::Requirements
    }

    fn finish(mut self) -> Spec {
        let purpose = paragraphs(&self.purpose);
        Spec {
            title: self.title.unwrap_or_default(),
            purpose: (!purpose.is_empty()).then_some(purpose),
            requirements: self.block.take(),
            metadata: Default::default(),
        }
    }
}

/// Parse a baseline document into a [`Spec`].
pub fn parse(text: &str) -> Spec {
    let doc = syntax::split_front_matter(text);
    let mut parser = SpecParser::new();
    for line in doc.body.lines() {
        parser.step(line);
    }
    let mut spec = parser.finish();
    if let Some(yaml) = doc.front_matter {
        spec.metadata = syntax::parse_metadata(yaml);
    }
    tracing::debug!(
        "parsed spec '{}': {} requirements, {} scenarios",
        spec.title,
        spec.requirements.len(),
        spec.scenario_count()
    );
    spec
}

/// Free text of a Purpose section or requirement description. Lines are
/// trimmed and each run of blank lines becomes a single paragraph break.
fn paragraphs(lines: &[String]) -> String {
    let mut out = String::new();
    let mut pending_break = false;
    for line in lines.iter().map(|l| l.trim()) {
        if line.is_empty() {
            pending_break = !out.is_empty();
            continue;
        }
        if pending_break {
            out.push_str("\n\n");
        } else if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
        pending_break = false;
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
