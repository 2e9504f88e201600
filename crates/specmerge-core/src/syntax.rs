//! Line-shape recognisers shared by the spec parser, delta parser, validator
//! and merger.
//!
//! Every consumer classifies a line exactly once through [`classify`], so the
//! priority order between shapes lives in one place.

use crate::types::OperationKind;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Line shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Purpose,
    Requirements,
    Delta(OperationKind),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// `# Title`
    Title(&'a str),
    /// Any `## ` heading.
    Section(SectionKind),
    /// `### Requirement: Name`
    Requirement(&'a str),
    /// `#### Scenario: Name`
    Scenario(&'a str),
    When(&'a str),
    Then(&'a str),
    And(&'a str),
    /// `**Reason**: text`
    Reason(&'a str),
    /// `**Migration**: text`
    Migration(&'a str),
    /// `- FROM: `### Requirement: Name``
    RenameFrom(&'a str),
    /// `- TO: `### Requirement: Name``
    RenameTo(&'a str),
    Blank,
    Text(&'a str),
}

static TITLE_RE: OnceLock<Regex> = OnceLock::new();
static SECTION_RE: OnceLock<Regex> = OnceLock::new();
static DELTA_SECTION_RE: OnceLock<Regex> = OnceLock::new();
static REQUIREMENT_RE: OnceLock<Regex> = OnceLock::new();
static SCENARIO_RE: OnceLock<Regex> = OnceLock::new();
static CLAUSE_RE: OnceLock<Regex> = OnceLock::new();
static REASON_RE: OnceLock<Regex> = OnceLock::new();
static MIGRATION_RE: OnceLock<Regex> = OnceLock::new();
static FROM_RE: OnceLock<Regex> = OnceLock::new();
static TO_RE: OnceLock<Regex> = OnceLock::new();

fn title_re() -> &'static Regex {
    TITLE_RE.get_or_init(|| Regex::new(r"^#\s+(.+?)\s*$").unwrap())
}

fn section_re() -> &'static Regex {
    SECTION_RE.get_or_init(|| Regex::new(r"^##\s+(.+?)\s*$").unwrap())
}

fn delta_section_re() -> &'static Regex {
    DELTA_SECTION_RE.get_or_init(|| {
        Regex::new(r"(?i)^(added|modified|removed|renamed)\s+requirements$").unwrap()
    })
}

fn requirement_re() -> &'static Regex {
    REQUIREMENT_RE.get_or_init(|| Regex::new(r"^###\s+Requirement:\s*(.*?)\s*$").unwrap())
}

fn scenario_re() -> &'static Regex {
    SCENARIO_RE.get_or_init(|| Regex::new(r"^####\s+Scenario:\s*(.*?)\s*$").unwrap())
}

fn clause_re() -> &'static Regex {
    CLAUSE_RE.get_or_init(|| {
        Regex::new(r"^\s*[-*]\s+\*\*(WHEN|THEN|AND)\*\*:?\s*(.*?)\s*$").unwrap()
    })
}

fn reason_re() -> &'static Regex {
    REASON_RE.get_or_init(|| {
        Regex::new(r"^\s*(?:[-*]\s+)?\*\*Reason:?\*\*:?\s*(.*?)\s*$").unwrap()
    })
}

fn migration_re() -> &'static Regex {
    MIGRATION_RE.get_or_init(|| {
        Regex::new(r"^\s*(?:[-*]\s+)?\*\*Migration:?\*\*:?\s*(.*?)\s*$").unwrap()
    })
}

fn from_re() -> &'static Regex {
    FROM_RE.get_or_init(|| {
        Regex::new(r"^\s*[-*]\s*(?i:FROM):\s*`?(?:###\s*Requirement:\s*)?(.*?)`?\s*$").unwrap()
    })
}

fn to_re() -> &'static Regex {
    TO_RE.get_or_init(|| {
        Regex::new(r"^\s*[-*]\s*(?i:TO):\s*`?(?:###\s*Requirement:\s*)?(.*?)`?\s*$").unwrap()
    })
}

fn capture<'a>(re: &Regex, line: &'a str, group: usize) -> Option<&'a str> {
    re.captures(line)
        .and_then(|c| c.get(group))
        .map(|m| m.as_str())
}

/// Classify one line. Shapes are tested in a fixed priority order: title,
/// section headings, requirement, scenario, clauses, removal fields, rename
/// pairs, then plain text.
pub fn classify(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    if let Some(title) = capture(title_re(), line, 1) {
        return Line::Title(title);
    }
    if let Some(heading) = capture(section_re(), line, 1) {
        return Line::Section(section_kind(heading));
    }
    if let Some(name) = capture(requirement_re(), line, 1) {
        return Line::Requirement(name);
    }
    if let Some(name) = capture(scenario_re(), line, 1) {
        return Line::Scenario(name);
    }
    if let Some(caps) = clause_re().captures(line) {
        let text = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        return match &caps[1] {
            "WHEN" => Line::When(text),
            "THEN" => Line::Then(text),
            _ => Line::And(text),
        };
    }
    if let Some(text) = capture(reason_re(), line, 1) {
        return Line::Reason(text);
    }
    if let Some(text) = capture(migration_re(), line, 1) {
        return Line::Migration(text);
    }
    if let Some(name) = capture(from_re(), line, 1) {
        return Line::RenameFrom(name);
    }
    if let Some(name) = capture(to_re(), line, 1) {
        return Line::RenameTo(name);
    }
    Line::Text(line)
}

fn section_kind(heading: &str) -> SectionKind {
    if heading.eq_ignore_ascii_case("purpose") {
        return SectionKind::Purpose;
    }
    if heading.eq_ignore_ascii_case("requirements") {
        return SectionKind::Requirements;
    }
    match capture(delta_section_re(), heading, 1).map(str::parse::<OperationKind>) {
        Some(Ok(kind)) => SectionKind::Delta(kind),
        _ => SectionKind::Other,
    }
}

/// True when the text contains at least one ADDED/MODIFIED/REMOVED/RENAMED
/// section heading.
pub fn has_delta_sections(text: &str) -> bool {
    text.lines()
        .any(|l| matches!(classify(l), Line::Section(SectionKind::Delta(_))))
}

/// Strip a trailing "Specification" (any case) from a title heading.
pub fn normalize_title(raw: &str) -> String {
    const SUFFIX: &str = "specification";
    let raw = raw.trim();
    if raw.len() >= SUFFIX.len() {
        let split = raw.len() - SUFFIX.len();
        if raw.is_char_boundary(split) && raw[split..].eq_ignore_ascii_case(SUFFIX) {
            return raw[..split].trim_end().to_string();
        }
    }
    raw.to_string()
}

// ---------------------------------------------------------------------------
// Front matter
// ---------------------------------------------------------------------------

/// A document split into its optional `---` front-matter block and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document<'a> {
    pub front_matter: Option<&'a str>,
    pub body: &'a str,
    /// Number of lines consumed by the front matter, including delimiters.
    pub body_line_offset: usize,
}

/// Split off the YAML content between a leading pair of `---` delimiters.
/// Text without a well-formed block is returned whole as the body.
pub fn split_front_matter(content: &str) -> Document<'_> {
    let whole = Document {
        front_matter: None,
        body: content,
        body_line_offset: 0,
    };
    let Some(rest) = content.strip_prefix("---") else {
        return whole;
    };
    let rest = if let Some(r) = rest.strip_prefix('\n') {
        r
    } else if let Some(r) = rest.strip_prefix("\r\n") {
        r
    } else {
        return whole;
    };
    let (yaml, after) = if let Some(after) = rest.strip_prefix("---") {
        ("", after)
    } else {
        let Some(end) = rest.find("\n---") else {
            return whole;
        };
        (&rest[..end], &rest[end + 4..])
    };
    // The closing delimiter owns the rest of its line.
    let body = match after.find('\n') {
        Some(i) => &after[i + 1..],
        None => "",
    };
    let consumed = &content[..content.len() - body.len()];
    Document {
        front_matter: Some(yaml),
        body,
        body_line_offset: consumed.matches('\n').count(),
    }
}

/// Parse front matter into metadata. Malformed YAML yields an empty map; the
/// body is still parsed.
pub fn parse_metadata(yaml: &str) -> BTreeMap<String, serde_yaml::Value> {
    if yaml.trim().is_empty() {
        return BTreeMap::new();
    }
    match serde_yaml::from_str::<BTreeMap<String, serde_yaml::Value>>(yaml) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!("ignoring unparsable front matter: {e}");
            BTreeMap::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_by_level() {
        assert_eq!(classify("# Auth Specification"), Line::Title("Auth Specification"));
        assert_eq!(classify("## Purpose"), Line::Section(SectionKind::Purpose));
        assert_eq!(
            classify("## Requirements"),
            Line::Section(SectionKind::Requirements)
        );
        assert_eq!(classify("## Notes"), Line::Section(SectionKind::Other));
        assert_eq!(
            classify("### Requirement: User Login"),
            Line::Requirement("User Login")
        );
        assert_eq!(
            classify("#### Scenario: Valid credentials  "),
            Line::Scenario("Valid credentials")
        );
    }

    #[test]
    fn delta_sections_are_case_insensitive() {
        assert_eq!(
            classify("## ADDED Requirements"),
            Line::Section(SectionKind::Delta(OperationKind::Added))
        );
        assert_eq!(
            classify("## removed requirements"),
            Line::Section(SectionKind::Delta(OperationKind::Removed))
        );
        assert!(has_delta_sections("# X\n\n## Renamed Requirements\n"));
        assert!(!has_delta_sections("# X\n\n## Requirements\n"));
    }

    #[test]
    fn clause_lines() {
        assert_eq!(classify("- **WHEN** a user logs in"), Line::When("a user logs in"));
        assert_eq!(classify("- **THEN** a token is issued"), Line::Then("a token is issued"));
        assert_eq!(classify("  * **AND** it expires"), Line::And("it expires"));
        assert_eq!(classify("WHEN nothing"), Line::Text("WHEN nothing"));
    }

    #[test]
    fn removal_and_rename_lines() {
        assert_eq!(
            classify("**Reason**: superseded by SSO"),
            Line::Reason("superseded by SSO")
        );
        assert_eq!(
            classify("**Migration**: use /sso"),
            Line::Migration("use /sso")
        );
        assert_eq!(
            classify("- FROM: `### Requirement: Login`"),
            Line::RenameFrom("Login")
        );
        assert_eq!(
            classify("- TO: `### Requirement: Sign In`"),
            Line::RenameTo("Sign In")
        );
    }

    #[test]
    fn title_suffix_is_stripped() {
        assert_eq!(normalize_title("Auth Specification"), "Auth");
        assert_eq!(normalize_title("Auth SPECIFICATION "), "Auth");
        assert_eq!(normalize_title("Specification"), "");
        assert_eq!(normalize_title("Billing"), "Billing");
    }

    #[test]
    fn front_matter_split() {
        let doc = split_front_matter("---\nowner: platform\nversion: 2\n---\n# Auth\n");
        assert_eq!(doc.front_matter, Some("owner: platform\nversion: 2"));
        assert_eq!(doc.body, "# Auth\n");
        assert_eq!(doc.body_line_offset, 4);

        let meta = parse_metadata(doc.front_matter.unwrap());
        assert_eq!(meta.get("owner").and_then(|v| v.as_str()), Some("platform"));
        assert_eq!(meta.get("version").and_then(|v| v.as_u64()), Some(2));
    }

    #[test]
    fn no_front_matter_keeps_whole_body() {
        let doc = split_front_matter("# Auth\n---\n");
        assert_eq!(doc.front_matter, None);
        assert_eq!(doc.body, "# Auth\n");
        assert_eq!(doc.body_line_offset, 0);

        let unterminated = split_front_matter("---\nowner: x\n");
        assert_eq!(unterminated.front_matter, None);
    }

    #[test]
    fn malformed_front_matter_yields_empty_metadata() {
        assert!(parse_metadata("key: [unclosed").is_empty());
    }
}
