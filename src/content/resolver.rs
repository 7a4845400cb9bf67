use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::config::ProjectLayout;
use crate::document::Document;
use crate::store::RuleRecord;

/// Detail-document content longer than this is truncated with `...`.
const MAX_DETAIL_CHARS: usize = 220;

static RULE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[((?:R|S)-\d+)\]").expect("valid rule id regex"));
static LEADING_BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[>\-*+\d.\s]+").expect("valid bullet regex"));
static STATS_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*`\{hit:\d+\s+vio:\d+\s+err:\d+\}`").expect("valid stats tag regex")
});
static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid whitespace regex"));

/// Remove every inline `{hit:N vio:N err:N}` tag from a line.
pub fn strip_stats_tag(line: &str) -> String {
    STATS_TAG_RE.replace_all(line, "").into_owned()
}

/// Readable body of a canonical rule line: bullet, stats tag, leading
/// `[id]` and bold markers removed.
pub fn clean_rule_line(line: &str, rule_id: &str) -> String {
    let text = LEADING_BULLET_RE.replace(line.trim(), "");
    let text = strip_stats_tag(&text);
    let prefix = format!("[{rule_id}]");
    let text = match text.strip_prefix(&prefix) {
        Some(rest) => rest.trim_start(),
        None => text.as_str(),
    };
    let text = text.replace("**", "");
    MULTI_SPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Rule id → body text, taken from the unmanaged lines of the `Rules`
/// section. The first line that yields content wins.
pub fn extract_canonical_content(canonical: &Document) -> BTreeMap<String, String> {
    let mut content = BTreeMap::new();
    let Some(rules) = canonical.section("Rules") else {
        return content;
    };
    for line in rules.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("<!--") {
            continue;
        }
        let Some(caps) = RULE_ID_RE.captures(line) else {
            continue;
        };
        let rule_id = &caps[1];
        let body = clean_rule_line(line, rule_id);
        if !body.is_empty() {
            content.insert(rule_id.to_string(), body);
        }
    }
    content
}

/// Body of a per-rule detail document: the `## Rule` section (or the whole
/// text when it has none), minus headings, comments and metadata bullets.
pub fn extract_detail_content(text: &str) -> String {
    let doc = Document::parse(text);
    let source: Vec<String> = match doc.section("Rule") {
        Some(section) => section.lines().map(str::to_string).collect(),
        None => text.lines().map(str::to_string).collect(),
    };

    let mut parts = Vec::new();
    for raw in &source {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("<!--") || line.starts_with('#') {
            continue;
        }
        if line.starts_with("- ") && line.contains(':') {
            continue;
        }
        let line = LEADING_BULLET_RE.replace(line, "");
        let line = line.trim();
        if !line.is_empty() {
            parts.push(line.to_string());
        }
    }

    let joined = parts.join(" ");
    let text = joined.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() > MAX_DETAIL_CHARS {
        let head: String = text.chars().take(MAX_DETAIL_CHARS - 3).collect();
        return format!("{}...", head.trim_end());
    }
    text
}

/// Display content for rules, by priority: detail document, canonical
/// rule line, title.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleContentResolver {
    canonical: BTreeMap<String, String>,
    detail: BTreeMap<String, String>,
}

impl RuleContentResolver {
    pub fn new(canonical: BTreeMap<String, String>, detail: BTreeMap<String, String>) -> Self {
        Self { canonical, detail }
    }

    /// Read detail documents for every non-archived record. Unreadable
    /// documents are skipped with a warning.
    pub fn load(layout: &ProjectLayout, canonical: Option<&Document>, records: &[RuleRecord]) -> Self {
        let canonical = canonical.map(extract_canonical_content).unwrap_or_default();
        let mut detail = BTreeMap::new();
        if layout.rules_dir().is_dir() {
            for record in records.iter().filter(|r| !r.is_archived()) {
                let rule_id = record.rule_id.trim();
                if rule_id.is_empty() || detail.contains_key(rule_id) {
                    continue;
                }
                let path = layout.rule_detail_path(rule_id);
                if !path.exists() {
                    continue;
                }
                match std::fs::read_to_string(&path) {
                    Ok(text) => {
                        let body = extract_detail_content(&text);
                        if !body.is_empty() {
                            detail.insert(rule_id.to_string(), body);
                        }
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable rule detail"),
                }
            }
        }
        Self { canonical, detail }
    }

    /// Resolved body, without falling back to the title.
    pub fn content(&self, rule_id: &str) -> Option<&str> {
        self.detail
            .get(rule_id)
            .or_else(|| self.canonical.get(rule_id))
            .map(String::as_str)
    }

    /// Body from the canonical document only.
    pub fn canonical_content(&self, rule_id: &str) -> Option<&str> {
        self.canonical.get(rule_id).map(String::as_str)
    }

    /// Content, else title, else `(no content)`.
    pub fn display(&self, record: &RuleRecord) -> String {
        self.content(&record.rule_id)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .or_else(|| Some(record.title.trim()).filter(|t| !t.is_empty()))
            .unwrap_or("(no content)")
            .to_string()
    }
}
