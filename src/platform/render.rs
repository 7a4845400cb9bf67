use std::cmp::Reverse;

use crate::content::{format_links_inline, RuleContentResolver, TraceMap};
use crate::document::{Document, Region, RegionKind};
use crate::metrics::activity;
use crate::store::{canonical_platform, RuleRecord};

pub const AUTO_SYNC_HEADER: &str = "## Evolve-Skill Auto Sync";

const SNAPSHOT_MAX_LINES: usize = 8;
const SNAPSHOT_MAX_CHARS: usize = 900;
const PLATFORM_RULE_LIMIT: usize = 8;
const UNIVERSAL_RULE_LIMIT: usize = 6;

/// Non-blank lines of `text`, capped by line count and total characters.
///
/// A line that would cross the character cap is cut with ` ...` when more
/// than 20 characters remain, and `- ...` marks any dropped lines.
pub fn trim_multiline(text: &str, max_lines: usize, max_chars: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return vec!["- (no data)".to_string()];
    }

    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::trim_end)
        .collect();
    let mut trimmed = Vec::new();
    let mut total = 0;
    for line in &lines {
        if trimmed.len() >= max_lines {
            break;
        }
        let len = line.chars().count();
        if total + len > max_chars {
            let remain = max_chars - total;
            if remain > 20 {
                let cut: String = line.chars().take(remain).collect();
                trimmed.push(format!("{} ...", cut.trim_end()));
            }
            break;
        }
        trimmed.push(line.to_string());
        total += len;
    }

    if lines.len() > trimmed.len() {
        trimmed.push("- ...".to_string());
    }
    if trimmed.is_empty() {
        trimmed.push("- (no data)".to_string());
    }
    trimmed
}

/// Top `limit` rows by `(err, vio, activity, hit, rule_id)`, highest first.
pub fn rank_high_signal<'a>(mut rows: Vec<&'a RuleRecord>, limit: usize) -> Vec<&'a RuleRecord> {
    rows.sort_by_key(|r| Reverse((r.err, r.vio, activity(r), r.hit, r.rule_id.clone())));
    rows.truncate(limit);
    rows
}

/// One bullet of a platform block, with content and trace lines below it.
pub fn format_rule_line(record: &RuleRecord, resolver: &RuleContentResolver, traces: &TraceMap) -> String {
    let title = record.title.trim();
    let title_suffix = if title.is_empty() {
        String::new()
    } else {
        format!(" - {title}")
    };
    let mut line = format!(
        "- [{}] [{}]{title_suffix} {}",
        record.rule_id,
        record.scope,
        record.stats_tag()
    );
    if let Some(content) = resolver.content(&record.rule_id).map(str::trim).filter(|c| !c.is_empty()) {
        line.push_str("\n  Content: ");
        line.push_str(content);
    }
    let trace = traces.get(&record.rule_id).cloned().unwrap_or_default();
    line.push_str(&format!(
        "\n  Trace: History {}; Runbook {}",
        format_links_inline(&trace.history),
        format_links_inline(&trace.runbooks)
    ));
    line
}

/// Everything a platform block is rendered from
#[derive(Debug, Clone, Copy)]
pub struct BlockInputs<'a> {
    pub canonical: &'a Document,
    pub records: &'a [RuleRecord],
    pub resolver: &'a RuleContentResolver,
    pub traces: &'a TraceMap,
}

/// The text between a platform block's markers.
pub fn render_platform_block(platform: &str, inputs: BlockInputs<'_>, digest: &str, updated: &str) -> String {
    let in_force: Vec<&RuleRecord> = inputs
        .records
        .iter()
        .filter(|r| r.status.is_in_force())
        .collect();
    let platform_rows: Vec<&RuleRecord> = in_force
        .iter()
        .copied()
        .filter(|r| r.is_platform_lesson() && canonical_platform(&r.platform) == platform)
        .collect();
    let universal_rows: Vec<&RuleRecord> = in_force
        .iter()
        .copied()
        .filter(|r| !r.is_platform_lesson())
        .collect();

    let mut lines = vec![
        AUTO_SYNC_HEADER.to_string(),
        String::new(),
        "This block is auto-generated from `EVOLVE.md` and `evolve/audit.csv`.".to_string(),
        "Edit `EVOLVE.md` instead of editing this block.".to_string(),
        format!("- Platform: `{platform}`"),
        format!("- Updated: `{updated}`"),
        format!("- Digest: `{digest}`"),
        String::new(),
        "### TL;DR Snapshot".to_string(),
    ];
    lines.extend(trim_multiline(
        &inputs.canonical.section_body("TL;DR"),
        SNAPSHOT_MAX_LINES,
        SNAPSHOT_MAX_CHARS,
    ));

    lines.push(String::new());
    lines.push(format!("### Platform Rules ({platform})"));
    let ranked = rank_high_signal(platform_rows, PLATFORM_RULE_LIMIT);
    if ranked.is_empty() {
        lines.push("- (no platform-specific rules found)".to_string());
    }
    lines.extend(ranked.iter().map(|r| format_rule_line(r, inputs.resolver, inputs.traces)));

    lines.push(String::new());
    lines.push("### Universal High-Signal Rules".to_string());
    let ranked = rank_high_signal(universal_rows, UNIVERSAL_RULE_LIMIT);
    if ranked.is_empty() {
        lines.push("- (no universal rules found)".to_string());
    }
    lines.extend(ranked.iter().map(|r| format_rule_line(r, inputs.resolver, inputs.traces)));

    lines.push(String::new());
    lines.push("### Recent Changelog Snapshot".to_string());
    lines.extend(trim_multiline(
        &inputs.canonical.section_body("Changelog"),
        SNAPSHOT_MAX_LINES,
        SNAPSHOT_MAX_CHARS,
    ));
    lines.join("\n")
}

/// Wrap a rendered block in its `AUTO_SYNC` markers.
pub fn platform_region(platform: &str, digest: &str, updated: &str, block: &str) -> Region {
    let attrs = vec![
        ("platform".to_string(), platform.to_string()),
        ("digest".to_string(), digest.to_string()),
        ("updated".to_string(), updated.to_string()),
    ];
    Region::new(RegionKind::AutoSync, attrs, block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Status;
    use pretty_assertions::assert_eq;

    fn record(id: &str, hit: i64, vio: i64, err: i64) -> RuleRecord {
        RuleRecord {
            scope: "ops".to_string(),
            hit,
            vio,
            err,
            ..RuleRecord::new(id)
        }
    }

    #[test]
    fn test_trim_multiline_limits() {
        assert_eq!(trim_multiline("  \n", 8, 900), vec!["- (no data)"]);
        assert_eq!(trim_multiline("a\n\nb  \n", 8, 900), vec!["a", "b"]);

        let many: String = (0..10).map(|i| format!("line {i}\n")).collect();
        let trimmed = trim_multiline(&many, 3, 900);
        assert_eq!(trimmed, vec!["line 0", "line 1", "line 2", "- ..."]);

        let long = format!("{}\n{}\n", "x".repeat(10), "y".repeat(50));
        assert_eq!(
            trim_multiline(&long, 8, 40),
            vec!["x".repeat(10), format!("{} ...", "y".repeat(30))]
        );
        assert_eq!(trim_multiline(&long, 8, 25), vec!["x".repeat(10), "- ...".to_string()]);
    }

    #[test]
    fn test_rank_high_signal_order() {
        let rows = [
            record("R-001", 9, 0, 0),
            record("R-002", 0, 1, 1),
            record("R-003", 0, 3, 0),
            record("R-004", 0, 1, 1),
        ];
        let ranked: Vec<_> = rank_high_signal(rows.iter().collect(), 3)
            .into_iter()
            .map(|r| r.rule_id.as_str())
            .collect();
        assert_eq!(ranked, vec!["R-004", "R-002", "R-003"]);
    }

    #[test]
    fn test_format_rule_line() {
        let mut row = record("R-001", 1, 0, 0);
        row.title = "Run tests".to_string();
        let line = format_rule_line(&row, &RuleContentResolver::default(), &TraceMap::new());
        assert_eq!(
            line,
            "- [R-001] [ops] - Run tests `{hit:1 vio:0 err:0}`\n  Trace: History (none); Runbook (none)"
        );
    }

    #[test]
    fn test_render_block_sections() {
        let doc = Document::parse("## TL;DR\n- keep it short\n\n## Rules\n\n## Changelog\n- v1\n");
        let mut archived = record("R-009", 5, 5, 5);
        archived.status = Status::Archived;
        let rows = vec![
            record("R-001", 1, 0, 0),
            archived,
            RuleRecord {
                platform: "claude".to_string(),
                ..record("S-001", 2, 0, 0)
            },
        ];
        let resolver = RuleContentResolver::default();
        let traces = TraceMap::new();
        let inputs = BlockInputs {
            canonical: &doc,
            records: &rows,
            resolver: &resolver,
            traces: &traces,
        };

        let block = render_platform_block("codex", inputs, "abc123def456", "2026-01-02");
        let expected = "## Evolve-Skill Auto Sync\n\
            \n\
            This block is auto-generated from `EVOLVE.md` and `evolve/audit.csv`.\n\
            Edit `EVOLVE.md` instead of editing this block.\n\
            - Platform: `codex`\n\
            - Updated: `2026-01-02`\n\
            - Digest: `abc123def456`\n\
            \n\
            ### TL;DR Snapshot\n\
            - keep it short\n\
            \n\
            ### Platform Rules (codex)\n\
            - (no platform-specific rules found)\n\
            \n\
            ### Universal High-Signal Rules\n\
            - [R-001] [ops] `{hit:1 vio:0 err:0}`\n\
            \x20 Trace: History (none); Runbook (none)\n\
            \n\
            ### Recent Changelog Snapshot\n\
            - v1";
        assert_eq!(block, expected);

        let claude = render_platform_block("claude", inputs, "d", "u");
        assert!(claude.contains("### Platform Rules (claude)\n- [S-001] [ops]"));
    }

    #[test]
    fn test_platform_region_markers() {
        let region = platform_region("codex", "abc", "2026-01-02", "body");
        assert_eq!(
            region.to_string(),
            "<!-- EVOLVE_SKILL:AUTO_SYNC:BEGIN platform=codex digest=abc updated=2026-01-02 -->\nbody\n<!-- EVOLVE_SKILL:AUTO_SYNC:END -->"
        );
        assert_eq!(region.key(), Some("codex"));
    }
}
