use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::ProjectLayout;
use crate::error::{Error, Result};
use crate::store::RuleRecord;

/// Root-relative paths of the documents related to one rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraceLinks {
    pub history: Vec<String>,
    pub runbooks: Vec<String>,
}

pub type TraceMap = BTreeMap<String, TraceLinks>;

/// Inline link list: `[name](path), ...` or `(none)`.
pub fn format_links_inline(paths: &[String]) -> String {
    if paths.is_empty() {
        return "(none)".to_string();
    }
    paths
        .iter()
        .map(|p| format!("[{}]({p})", file_name(p)))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraceKind {
    History,
    Runbook,
}

impl TraceKind {
    fn heading(&self) -> &'static str {
        match self {
            TraceKind::History => "History",
            TraceKind::Runbook => "Runbook",
        }
    }

    fn todo(&self) -> &'static str {
        match self {
            TraceKind::History => "- TODO: add event background, failure symptoms, and lessons learned.",
            TraceKind::Runbook => "- TODO: add executable checklist and verification steps.",
        }
    }
}

#[derive(Debug)]
struct Candidate {
    path: PathBuf,
    stem: String,
    text: Option<String>,
}

impl Candidate {
    fn read(path: PathBuf) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable trace document");
                None
            }
        };
        Self { path, stem, text }
    }
}

fn collect_candidates(dir: &Path) -> Vec<Candidate> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "md"))
        .map(|entry| Candidate::read(entry.into_path()))
        .collect()
}

/// Whole-word, case-insensitive occurrence of a rule id.
fn reference_pattern(rule_id: &str) -> Option<Regex> {
    let pattern = format!(
        r"(?i)(?:^|[^A-Za-z0-9]){}(?:$|[^A-Za-z0-9])",
        regex::escape(rule_id)
    );
    Regex::new(&pattern).ok()
}

fn related<'a>(rule_id: &str, candidates: &'a [Candidate]) -> Vec<&'a Path> {
    let stem = rule_id.to_lowercase();
    let pattern = reference_pattern(rule_id);
    candidates
        .iter()
        .filter(|c| {
            c.stem == stem
                || match (&pattern, &c.text) {
                    (Some(p), Some(text)) => p.is_match(text),
                    _ => false,
                }
        })
        .map(|c| c.path.as_path())
        .collect()
}

/// Stubs written while resolving with defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceResolution {
    pub links: TraceMap,
    pub created: Vec<PathBuf>,
}

/// Finds history and runbook documents related to each rule
#[derive(Debug, Clone)]
pub struct TraceLinker<'a> {
    layout: &'a ProjectLayout,
}

impl<'a> TraceLinker<'a> {
    pub fn new(layout: &'a ProjectLayout) -> Self {
        Self { layout }
    }

    /// Read-only lookup for every non-archived rule.
    pub fn resolve(&self, records: &[RuleRecord]) -> TraceMap {
        let mut history = collect_candidates(&self.layout.history_dir());
        let mut runbooks = collect_candidates(&self.layout.runbooks_dir());
        let mut links = TraceMap::new();
        for record in records.iter().filter(|r| !r.is_archived()) {
            let rule_id = record.rule_id.trim();
            if rule_id.is_empty() {
                continue;
            }
            links.insert(
                rule_id.to_string(),
                self.links_for(rule_id, &mut history, &mut runbooks, None, record)
                    .unwrap_or_default(),
            );
        }
        links
    }

    /// Lookup that writes a stub for every rule missing a history or a
    /// runbook document.
    pub fn resolve_with_stubs(&self, records: &[RuleRecord], today: NaiveDate) -> Result<TraceResolution> {
        for dir in [self.layout.history_dir(), self.layout.runbooks_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        }
        let mut history = collect_candidates(&self.layout.history_dir());
        let mut runbooks = collect_candidates(&self.layout.runbooks_dir());
        let mut resolution = TraceResolution::default();
        for record in records.iter().filter(|r| !r.is_archived()) {
            let rule_id = record.rule_id.trim();
            if rule_id.is_empty() {
                continue;
            }
            let links = self.links_for(
                rule_id,
                &mut history,
                &mut runbooks,
                Some((today, &mut resolution.created)),
                record,
            )?;
            resolution.links.insert(rule_id.to_string(), links);
        }
        Ok(resolution)
    }

    fn links_for(
        &self,
        rule_id: &str,
        history: &mut Vec<Candidate>,
        runbooks: &mut Vec<Candidate>,
        mut stubs: Option<(NaiveDate, &mut Vec<PathBuf>)>,
        record: &RuleRecord,
    ) -> Result<TraceLinks> {
        let mut found = TraceLinks::default();
        for (kind, candidates) in [(TraceKind::History, history), (TraceKind::Runbook, runbooks)] {
            let mut paths: Vec<String> = related(rule_id, candidates)
                .into_iter()
                .map(|p| self.layout.relative_posix(p))
                .collect();
            if paths.is_empty() {
                if let Some((today, created)) = stubs.as_mut() {
                    let (path, written) = self.ensure_stub(record, kind, *today)?;
                    if written {
                        created.push(path.clone());
                    }
                    paths.push(self.layout.relative_posix(&path));
                    candidates.push(Candidate::read(path));
                }
            }
            paths.sort();
            paths.dedup();
            match kind {
                TraceKind::History => found.history = paths,
                TraceKind::Runbook => found.runbooks = paths,
            }
        }
        Ok(found)
    }

    fn stub_path(&self, rule_id: &str, kind: TraceKind) -> PathBuf {
        let dir = match kind {
            TraceKind::History => self.layout.history_dir(),
            TraceKind::Runbook => self.layout.runbooks_dir(),
        };
        let detail = self.layout.rule_detail_path(rule_id);
        let file = detail
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| format!("{rule_id}.md").into());
        dir.join(file)
    }

    fn ensure_stub(&self, record: &RuleRecord, kind: TraceKind, today: NaiveDate) -> Result<(PathBuf, bool)> {
        let path = self.stub_path(record.rule_id.trim(), kind);
        if path.exists() {
            return Ok((path, false));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        std::fs::write(&path, render_stub(record, kind, today)).map_err(|e| Error::io(&path, e))?;
        debug!(path = %path.display(), rule_id = %record.rule_id, "created trace stub");
        Ok((path, true))
    }
}

fn render_stub(record: &RuleRecord, kind: TraceKind, today: NaiveDate) -> String {
    let rule_id = record.rule_id.trim();
    let title = match record.title.trim() {
        "" => "TODO",
        title => title,
    };
    [
        format!("# [{rule_id}] {}", kind.heading()),
        String::new(),
        format!("- Related Rule: `[{rule_id}]`"),
        format!("- Scope: `{}`", record.scope.trim()),
        format!("- Title: {title}"),
        format!("- Created: `{}`", today.format("%Y-%m-%d")),
        String::new(),
        kind.todo().to_string(),
        String::new(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Status;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn project() -> (TempDir, ProjectLayout) {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path());
        (dir, layout)
    }

    fn write(path: PathBuf, text: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn test_format_links_inline() {
        assert_eq!(format_links_inline(&[]), "(none)");
        assert_eq!(
            format_links_inline(&["evolve/history/R-001.md".to_string(), "evolve/history/x/notes.md".to_string()]),
            "[R-001.md](evolve/history/R-001.md), [notes.md](evolve/history/x/notes.md)"
        );
    }

    #[test]
    fn test_resolve_by_stem_and_reference() {
        let (_dir, layout) = project();
        write(layout.history_dir().join("r-001.md"), "# incident\n");
        write(layout.history_dir().join("2026/outage.md"), "Caused by ignoring R-002, see also R-0010.\n");
        write(layout.runbooks_dir().join("deploy.md"), "Steps for r-001 rollback\n");
        write(layout.runbooks_dir().join("other.md"), "mentions XR-002 only\n");

        let records = vec![RuleRecord::new("R-001"), RuleRecord::new("R-002"), RuleRecord::new("R-003")];
        let links = TraceLinker::new(&layout).resolve(&records);

        assert_eq!(links["R-001"].history, vec!["evolve/history/r-001.md"]);
        assert_eq!(links["R-001"].runbooks, vec!["evolve/runbooks/deploy.md"]);
        assert_eq!(links["R-002"].history, vec!["evolve/history/2026/outage.md"]);
        assert!(links["R-002"].runbooks.is_empty(), "XR-002 is not a whole-word match");
        assert_eq!(links["R-003"], TraceLinks::default());
    }

    #[test]
    fn test_resolve_skips_archived_and_missing_dirs() {
        let (_dir, layout) = project();
        let mut archived = RuleRecord::new("R-009");
        archived.status = Status::Archived;
        let links = TraceLinker::new(&layout).resolve(&[archived, RuleRecord::new("R-001")]);
        assert_eq!(links.len(), 1);
        assert!(links.contains_key("R-001"));
    }

    #[test]
    fn test_resolve_with_stubs_creates_missing_documents() {
        let (_dir, layout) = project();
        write(layout.history_dir().join("R-001.md"), "# existing\n");
        let record = RuleRecord {
            scope: "frontend/react".to_string(),
            title: "Keep hooks pure".to_string(),
            ..RuleRecord::new("R-001")
        };

        let linker = TraceLinker::new(&layout);
        let resolution = linker.resolve_with_stubs(&[record.clone()], today()).unwrap();
        assert_eq!(resolution.created, vec![layout.runbooks_dir().join("R-001.md")]);
        assert_eq!(resolution.links["R-001"].runbooks, vec!["evolve/runbooks/R-001.md"]);

        let stub = std::fs::read_to_string(layout.runbooks_dir().join("R-001.md")).unwrap();
        assert_eq!(
            stub,
            "# [R-001] Runbook\n\n\
             - Related Rule: `[R-001]`\n\
             - Scope: `frontend/react`\n\
             - Title: Keep hooks pure\n\
             - Created: `2026-10-19`\n\n\
             - TODO: add executable checklist and verification steps.\n"
        );

        let again = linker.resolve_with_stubs(&[record], today()).unwrap();
        assert!(again.created.is_empty());
        assert_eq!(again.links, resolution.links);
    }
}
