use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use super::resolver::RuleContentResolver;
use super::trace::{file_name, TraceLinks, TraceMap};
use crate::config::ProjectLayout;
use crate::document::{Anchor, Document, Region, RegionKind};
use crate::error::{Error, Result};
use crate::store::RuleRecord;

/// Per-file result of a detail document pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetailSyncOutcome {
    pub targets: Vec<PathBuf>,
    pub created: Vec<PathBuf>,
    pub updated: Vec<PathBuf>,
    pub existing: Vec<PathBuf>,
    /// Documents that could not be read and were left alone.
    pub skipped: Vec<PathBuf>,
}

/// Fresh detail document for a rule.
pub fn render_detail_template(record: &RuleRecord, seed: &str, today: NaiveDate) -> String {
    let title = record.title.trim();
    let heading = if title.is_empty() {
        format!("# [{}]", record.rule_id.trim())
    } else {
        format!("# [{}] {title}", record.rule_id.trim())
    };
    let body = match (seed.trim(), title) {
        ("", "") => "TODO: add detailed rule content.",
        ("", title) => title,
        (seed, _) => seed,
    };

    let mut lines = vec![
        heading,
        String::new(),
        format!("- Scope: `{}`", record.scope.trim()),
        format!("- Platform: `{}`", record.platform),
        format!("- Origin: `{}`", record.origin),
        format!("- Status: `{}`", record.status),
        format!("- Last Synced: `{}`", today.format("%Y-%m-%d")),
        String::new(),
        "## Rule".to_string(),
        body.to_string(),
    ];
    for section in ["Trigger", "Must", "Verification", "Forbidden"] {
        lines.push(String::new());
        lines.push(format!("## {section}"));
        lines.push("- TODO".to_string());
    }
    lines.join("\n") + "\n"
}

/// Relative link from a directory to a root-relative target, both given
/// with `/` separators.
pub fn relative_link(from_dir: &str, to: &str) -> String {
    let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let target: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();
    let common = from
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<&str> = vec![".."; from.len() - common];
    parts.extend(&target[common..]);
    parts.join("/")
}

fn links_from(from_dir: &str, paths: &[String]) -> String {
    if paths.is_empty() {
        return "(none)".to_string();
    }
    paths
        .iter()
        .map(|p| format!("[{}]({})", file_name(p), relative_link(from_dir, p)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `TRACE_LINKS` region for a detail document at `detail_rel`.
pub fn render_trace_region(rule_id: &str, detail_rel: &str, links: &TraceLinks) -> Region {
    let from_dir = detail_rel.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    let content = [
        "## Traceability".to_string(),
        format!("- History: {}", links_from(from_dir, &links.history)),
        format!("- Runbook: {}", links_from(from_dir, &links.runbooks)),
    ]
    .join("\n");
    Region::new(
        RegionKind::TraceLinks,
        vec![("rule_id".to_string(), rule_id.to_string())],
        &content,
    )
}

/// Insert or refresh the traceability region, placed after `## Rule`.
pub fn upsert_trace_region(text: &str, region: Region) -> String {
    let mut doc = Document::parse(text);
    let anchor = if doc.section("Rule").is_some() {
        Anchor::SectionEnd("Rule")
    } else {
        Anchor::DocumentEnd
    };
    doc.upsert_region(region, anchor);
    doc.to_string()
}

/// Ensure every non-archived rule has a detail document carrying current
/// trace links. Seeds new documents from the canonical rule line, else the
/// title; a document without `## Rule` is regenerated from the template.
pub fn sync_rule_details(
    layout: &ProjectLayout,
    records: &[RuleRecord],
    resolver: &RuleContentResolver,
    traces: &TraceMap,
    today: NaiveDate,
) -> Result<DetailSyncOutcome> {
    let rules_dir = layout.rules_dir();
    std::fs::create_dir_all(&rules_dir).map_err(|e| Error::io(&rules_dir, e))?;

    let mut outcome = DetailSyncOutcome::default();
    for record in records.iter().filter(|r| !r.is_archived()) {
        let rule_id = record.rule_id.trim();
        if rule_id.is_empty() {
            continue;
        }
        let path = layout.rule_detail_path(rule_id);
        outcome.targets.push(path.clone());

        let seed = resolver
            .canonical_content(rule_id)
            .unwrap_or_else(|| record.title.trim());
        let links = traces.get(rule_id).cloned().unwrap_or_default();
        let region = render_trace_region(rule_id, &layout.relative_posix(&path), &links);

        let existed = path.exists();
        let on_disk = if existed {
            match std::fs::read_to_string(&path) {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable rule detail");
                    outcome.skipped.push(path);
                    continue;
                }
            }
        } else {
            None
        };
        let base = match &on_disk {
            Some(text) if text.contains("## Rule") => text.clone(),
            _ => render_detail_template(record, seed, today),
        };

        let new = upsert_trace_region(&base, region);
        if on_disk.as_deref() == Some(new.as_str()) {
            outcome.existing.push(path);
            continue;
        }
        write_detail(&path, &new)?;
        if existed {
            outcome.updated.push(path);
        } else {
            outcome.created.push(path);
        }
    }
    Ok(outcome)
}

fn write_detail(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).map_err(|e| Error::io(path, e))?;
    debug!(path = %path.display(), "rule detail written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Origin;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn record() -> RuleRecord {
        RuleRecord {
            scope: "frontend/react".to_string(),
            title: "Keep hooks pure".to_string(),
            origin: Origin::Preventive,
            ..RuleRecord::new("R-001")
        }
    }

    #[test]
    fn test_relative_link() {
        assert_eq!(relative_link("evolve/rules", "evolve/history/R-001.md"), "../history/R-001.md");
        assert_eq!(relative_link("evolve/rules", "evolve/rules/x.md"), "x.md");
        assert_eq!(relative_link("", "a/b.md"), "a/b.md");
        assert_eq!(relative_link("a/b", "c.md"), "../../c.md");
    }

    #[test]
    fn test_template() {
        let text = render_detail_template(&record(), "", today());
        assert!(text.starts_with("# [R-001] Keep hooks pure\n\n- Scope: `frontend/react`\n- Platform: `all`\n"));
        assert!(text.contains("- Origin: `preventive`\n- Status: `active`\n- Last Synced: `2026-10-19`\n"));
        assert!(text.contains("## Rule\nKeep hooks pure\n\n## Trigger\n- TODO\n"));
        assert!(text.ends_with("## Forbidden\n- TODO\n"));
    }

    #[test]
    fn test_trace_region_after_rule_section() {
        let template = render_detail_template(&record(), "Hooks stay pure.", today());
        let links = TraceLinks {
            history: vec!["evolve/history/R-001.md".to_string()],
            runbooks: vec![],
        };
        let region = render_trace_region("R-001", "evolve/rules/R-001.md", &links);
        let text = upsert_trace_region(&template, region.clone());
        assert!(text.contains(
            "## Rule\nHooks stay pure.\n\n\
             <!-- EVOLVE_SKILL:TRACE_LINKS:BEGIN rule_id=R-001 -->\n\
             ## Traceability\n\
             - History: [R-001.md](../history/R-001.md)\n\
             - Runbook: (none)\n\
             <!-- EVOLVE_SKILL:TRACE_LINKS:END -->\n\n\
             ## Trigger\n"
        ));
        assert_eq!(upsert_trace_region(&text, region), text);
    }

    #[test]
    fn test_sync_creates_then_reports_existing() {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path());
        let resolver = RuleContentResolver::new(
            BTreeMap::from([("R-001".to_string(), "[frontend] Keep hooks pure".to_string())]),
            BTreeMap::new(),
        );
        let records = vec![record()];
        let traces = TraceMap::new();

        let first = sync_rule_details(&layout, &records, &resolver, &traces, today()).unwrap();
        assert_eq!(first.created, vec![layout.rule_detail_path("R-001")]);
        let written = std::fs::read_to_string(layout.rule_detail_path("R-001")).unwrap();
        assert!(written.contains("## Rule\n[frontend] Keep hooks pure\n"));

        let later = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();
        let second = sync_rule_details(&layout, &records, &resolver, &traces, later).unwrap();
        assert!(second.created.is_empty());
        assert!(second.updated.is_empty());
        assert_eq!(second.existing, vec![layout.rule_detail_path("R-001")]);
    }

    #[test]
    fn test_sync_regenerates_document_without_rule_section() {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path());
        std::fs::create_dir_all(layout.rules_dir()).unwrap();
        std::fs::write(layout.rule_detail_path("R-001"), "scratch notes\n").unwrap();

        let outcome = sync_rule_details(
            &layout,
            &[record()],
            &RuleContentResolver::default(),
            &TraceMap::new(),
            today(),
        )
        .unwrap();
        assert_eq!(outcome.updated, vec![layout.rule_detail_path("R-001")]);
        let text = std::fs::read_to_string(layout.rule_detail_path("R-001")).unwrap();
        assert!(text.starts_with("# [R-001] Keep hooks pure\n"));
        assert!(text.contains("<!-- EVOLVE_SKILL:TRACE_LINKS:BEGIN rule_id=R-001 -->"));
    }
}
