use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

const MARKER_NAMESPACE: &str = "EVOLVE_SKILL";

/// Kinds of managed region this tool owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// Per-platform block in a platform target document.
    AutoSync,
    /// Traceability links inside a rule detail document.
    TraceLinks,
    /// Curated rule list inside the canonical `Rules` section.
    RuleSelection,
}

impl RegionKind {
    pub fn tag(&self) -> &'static str {
        match self {
            RegionKind::AutoSync => "AUTO_SYNC",
            RegionKind::TraceLinks => "TRACE_LINKS",
            RegionKind::RuleSelection => "RULE_SELECTION",
        }
    }

    /// Attribute carrying the region's identity, if it has one.
    pub fn key_attr(&self) -> Option<&'static str> {
        match self {
            RegionKind::AutoSync => Some("platform"),
            RegionKind::TraceLinks => Some("rule_id"),
            RegionKind::RuleSelection => None,
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_uppercase().as_str() {
            "AUTO_SYNC" => Some(RegionKind::AutoSync),
            "TRACE_LINKS" => Some(RegionKind::TraceLinks),
            "RULE_SELECTION" => Some(RegionKind::RuleSelection),
            _ => None,
        }
    }

    pub fn end_marker(&self) -> String {
        format!("<!-- {MARKER_NAMESPACE}:{}:END -->", self.tag())
    }
}

/// Marker line recognized while scanning a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Marker {
    Begin {
        kind: RegionKind,
        attrs: Vec<(String, String)>,
    },
    End(RegionKind),
}

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*<!--\s*EVOLVE_SKILL:([A-Z_]+):(BEGIN|END)\b([^>]*?)\s*-->\s*$")
        .expect("valid marker regex")
});

/// Classify a single line (terminator excluded) as a region marker.
pub(crate) fn parse_marker(line: &str) -> Option<Marker> {
    let caps = MARKER_RE.captures(line)?;
    let kind = RegionKind::from_tag(&caps[1])?;
    if caps[2].eq_ignore_ascii_case("END") {
        return Some(Marker::End(kind));
    }
    let attrs = caps
        .get(3)
        .map(|m| parse_attrs(m.as_str()))
        .unwrap_or_default();
    Some(Marker::Begin { kind, attrs })
}

fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    raw.split_whitespace()
        .filter_map(|token| token.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A marker-delimited span owned by this tool.
///
/// `begin` keeps its line terminator, `end` does not: the terminator after
/// the end marker belongs to the surrounding text, so replacing a region
/// never eats the line break that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    kind: RegionKind,
    attrs: Vec<(String, String)>,
    begin: String,
    body: String,
    end: String,
}

impl Region {
    /// Build a fresh region. `content` is the text between the markers.
    pub fn new(kind: RegionKind, attrs: Vec<(String, String)>, content: &str) -> Self {
        let mut begin = format!("<!-- {MARKER_NAMESPACE}:{}:BEGIN", kind.tag());
        for (key, value) in &attrs {
            begin.push(' ');
            begin.push_str(key);
            begin.push('=');
            begin.push_str(value);
        }
        begin.push_str(" -->\n");

        let mut body = content.to_string();
        if !body.is_empty() && !body.ends_with('\n') {
            body.push('\n');
        }

        Self {
            kind,
            attrs,
            begin,
            body,
            end: kind.end_marker(),
        }
    }

    pub(crate) fn parsed(
        kind: RegionKind,
        attrs: Vec<(String, String)>,
        begin: String,
        body: String,
        end: String,
    ) -> Self {
        Self {
            kind,
            attrs,
            begin,
            body,
            end,
        }
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Identity value (platform, rule id), if the kind has one.
    pub fn key(&self) -> Option<&str> {
        self.kind.key_attr().and_then(|name| self.attr(name))
    }

    pub fn matches(&self, kind: RegionKind, key: Option<&str>) -> bool {
        self.kind == kind && (key.is_none() || self.key() == key)
    }

    /// Text between the markers.
    pub fn content(&self) -> &str {
        &self.body
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.begin)?;
        f.write_str(&self.body)?;
        f.write_str(&self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_begin_marker_with_attrs() {
        let marker =
            parse_marker("<!-- EVOLVE_SKILL:AUTO_SYNC:BEGIN platform=codex digest=abc updated=2026-10-19 -->");
        assert_eq!(
            marker,
            Some(Marker::Begin {
                kind: RegionKind::AutoSync,
                attrs: vec![
                    ("platform".to_string(), "codex".to_string()),
                    ("digest".to_string(), "abc".to_string()),
                    ("updated".to_string(), "2026-10-19".to_string()),
                ],
            })
        );
    }

    #[test]
    fn test_parse_end_marker_is_lenient() {
        assert_eq!(
            parse_marker("  <!--EVOLVE_SKILL:trace_links:END-->  "),
            Some(Marker::End(RegionKind::TraceLinks))
        );
        assert_eq!(parse_marker("<!-- EVOLVE_SKILL:OTHER:END -->"), None);
        assert_eq!(parse_marker("text <!-- EVOLVE_SKILL:AUTO_SYNC:END -->"), None);
    }

    #[test]
    fn test_new_region_renders_markers() {
        let region = Region::new(
            RegionKind::TraceLinks,
            vec![("rule_id".to_string(), "R-001".to_string())],
            "## Traceability\n- History: (none)",
        );
        assert_eq!(
            region.to_string(),
            "<!-- EVOLVE_SKILL:TRACE_LINKS:BEGIN rule_id=R-001 -->\n\
             ## Traceability\n\
             - History: (none)\n\
             <!-- EVOLVE_SKILL:TRACE_LINKS:END -->"
        );
        assert_eq!(region.key(), Some("R-001"));
    }

    #[test]
    fn test_keyless_region() {
        let region = Region::new(RegionKind::RuleSelection, vec![], "x");
        assert_eq!(
            region.to_string(),
            "<!-- EVOLVE_SKILL:RULE_SELECTION:BEGIN -->\nx\n<!-- EVOLVE_SKILL:RULE_SELECTION:END -->"
        );
        assert!(region.matches(RegionKind::RuleSelection, None));
        assert!(!region.matches(RegionKind::AutoSync, None));
    }
}
