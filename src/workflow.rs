//! Command-level operations. Each one reads the project, applies one pass of
//! the library, writes what changed, and returns a typed outcome for the
//! output layer to render.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{PlatformTargets, ProjectLayout};
use crate::content::{sync_rule_details, DetailSyncOutcome, RuleContentResolver, TraceLinker, TraceMap};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::health::{run_health, HealthReport};
use crate::metrics::{
    activity, apply_transitions, build_suggestions, compliance, danger, is_frequent_violation,
    is_good_practice, is_hard_to_follow, is_high_risk, is_low_value_candidate, percent,
    LifecyclePolicy, Suggestion, TransitionReport,
};
use crate::platform::{PlatformSyncEngine, PlatformSyncOptions, PlatformSyncOutcome};
use crate::reconcile::{
    annotate_summary, apply_inline_tags, apply_selection_block, canonical_scope, SummaryAnnotation,
};
use crate::store::{
    apply_scores, apply_selection, clear_selection, matches_platform, parse_selection_numbers,
    RuleFilter, RuleRecord, RuleStore, ScoreCard, ScoreOutcome, Status, PLATFORM_ALL,
};

const REPORT_SUGGESTIONS: usize = 20;
const SELECT_SUGGESTIONS: usize = 200;
const TOP_ACTIVITY: usize = 5;

/// A command either ran or had nothing to work on
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome<T> {
    Completed(T),
    /// Nothing was changed; the message says why.
    Skipped(String),
}

impl<T> CommandOutcome<T> {
    fn skipped(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!("{message}");
        CommandOutcome::Skipped(message)
    }
}

/// Non-empty record table, or `None` when it is missing or has no rows.
fn load_records(layout: &ProjectLayout) -> Result<Option<Vec<RuleRecord>>> {
    let table = RuleStore::new(layout.audit_table()).load()?;
    Ok((!table.is_empty()).then_some(table.records))
}

/// Canonical document text, or `None` when it is missing or empty.
fn read_canonical(layout: &ProjectLayout) -> Result<Option<String>> {
    let path = layout.canonical_doc();
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
    Ok((!text.is_empty()).then_some(text))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRun {
    pub card: ScoreCard,
    pub outcome: ScoreOutcome,
    pub filter: RuleFilter,
}

/// Apply a one-line score card and persist the table.
pub fn score(layout: &ProjectLayout, input: &str, filter: RuleFilter, today: NaiveDate) -> Result<CommandOutcome<ScoreRun>> {
    let card = ScoreCard::parse(input);
    if card.is_empty() {
        return Ok(CommandOutcome::skipped(format!(
            "cannot parse score string: {input} (format: R-001:+hit R-003:+vio+err)"
        )));
    }
    let Some(mut records) = load_records(layout)? else {
        return Ok(CommandOutcome::skipped("audit.csv is empty or missing"));
    };

    let outcome = apply_scores(&mut records, &card, &filter, today);
    RuleStore::new(layout.audit_table()).save(&records)?;
    if !outcome.unknown.is_empty() {
        warn!(unknown = ?outcome.unknown, "score card references unknown rules");
    }
    info!(
        updated = outcome.updated.len(),
        auto_skipped = outcome.auto_skipped.len(),
        "scores applied"
    );
    Ok(CommandOutcome::Completed(ScoreRun { card, outcome, filter }))
}

/// Options for a full sync pass
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Restrict the canonical document to universal rules plus this
    /// platform's lessons.
    pub evolve_platform: Option<String>,
    pub platform: PlatformSyncOptions,
    pub policy: LifecyclePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncRun {
    pub canonical_path: PathBuf,
    pub evolve_platform: Option<String>,
    /// Rules whose inline stats tag was written.
    pub tagged: Vec<String>,
    pub annotations: Vec<SummaryAnnotation>,
    pub transitions: TransitionReport,
    pub trace_stubs: Vec<PathBuf>,
    pub details: DetailSyncOutcome,
    pub platforms: PlatformSyncOutcome,
    pub warnings: Vec<String>,
}

/// Reconcile the canonical document, apply lifecycle transitions, refresh
/// rule details, then sync platform targets from the final state.
pub fn sync(layout: &ProjectLayout, options: &SyncOptions, today: NaiveDate) -> Result<CommandOutcome<SyncRun>> {
    let Some(mut records) = load_records(layout)? else {
        return Ok(CommandOutcome::skipped("audit.csv is empty or missing; nothing to sync"));
    };
    let canonical_path = layout.canonical_doc();
    let Some(original) = read_canonical(layout)? else {
        return Ok(CommandOutcome::skipped(format!(
            "{} is missing or empty; nothing to sync",
            canonical_path.display()
        )));
    };

    let evolve_platform = options
        .evolve_platform
        .as_deref()
        .filter(|p| *p != PLATFORM_ALL);
    let mut warnings = Vec::new();
    let mut doc = Document::parse(&original);

    let scoped = canonical_scope(&records, evolve_platform);
    let tagged = apply_inline_tags(&mut doc, &scoped);
    let annotations = annotate_summary(&mut doc, &scoped);
    let transitions = apply_transitions(&mut records, &options.policy);
    for (rule_id, reason) in &transitions.reviewed {
        info!(rule_id = %rule_id, reason = reason.as_str(), "rule moved to review");
    }

    let traces = TraceLinker::new(layout).resolve_with_stubs(&records, today)?;
    let seed = RuleContentResolver::load(layout, Some(&doc), &records);
    let details = sync_rule_details(layout, &records, &seed, &traces.links, today)?;

    // Detail documents written above now take priority over canonical lines.
    let resolver = RuleContentResolver::load(layout, Some(&doc), &records);
    let selection_scope = canonical_scope(&records, evolve_platform);
    if !apply_selection_block(&mut doc, &selection_scope, &resolver, &traces.links) {
        warnings.push("canonical document has no `## Rules` section; selection block skipped".to_string());
    }

    let text = doc.to_string();
    if text != original {
        std::fs::write(&canonical_path, &text).map_err(|e| Error::io(&canonical_path, e))?;
    }
    RuleStore::new(layout.audit_table()).save(&records)?;

    let platforms = sync_platforms(layout, &text, &doc, &records, &resolver, &traces.links, &options.platform, today)?;
    warnings.extend(platforms.warnings.iter().cloned());
    for message in &warnings {
        warn!("{message}");
    }

    Ok(CommandOutcome::Completed(SyncRun {
        canonical_path,
        evolve_platform: evolve_platform.map(str::to_string),
        tagged,
        annotations,
        transitions,
        trace_stubs: traces.created,
        details,
        platforms,
        warnings,
    }))
}

#[allow(clippy::too_many_arguments)]
fn sync_platforms(
    layout: &ProjectLayout,
    text: &str,
    doc: &Document,
    records: &[RuleRecord],
    resolver: &RuleContentResolver,
    traces: &TraceMap,
    options: &PlatformSyncOptions,
    today: NaiveDate,
) -> Result<PlatformSyncOutcome> {
    let config = PlatformTargets::load(layout);
    PlatformSyncEngine::new(layout, text, doc, records, resolver, traces).sync(&config, options, today)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformSyncRun {
    pub trace_stubs: Vec<PathBuf>,
    pub details: DetailSyncOutcome,
    pub platforms: PlatformSyncOutcome,
}

/// Refresh rule details and platform targets without touching the
/// canonical document or the record table.
pub fn sync_platform(layout: &ProjectLayout, options: &PlatformSyncOptions, today: NaiveDate) -> Result<CommandOutcome<PlatformSyncRun>> {
    let Some(records) = load_records(layout)? else {
        return Ok(CommandOutcome::skipped(
            "audit.csv is empty or missing; cannot sync platform files",
        ));
    };
    let Some(text) = read_canonical(layout)? else {
        return Ok(CommandOutcome::skipped(format!(
            "{} is missing or empty; cannot sync platform files",
            layout.canonical_doc().display()
        )));
    };
    let doc = Document::parse(&text);

    let traces = TraceLinker::new(layout).resolve_with_stubs(&records, today)?;
    let seed = RuleContentResolver::load(layout, Some(&doc), &records);
    let details = sync_rule_details(layout, &records, &seed, &traces.links, today)?;
    let resolver = RuleContentResolver::load(layout, Some(&doc), &records);
    let platforms = sync_platforms(layout, &text, &doc, &records, &resolver, &traces.links, options, today)?;
    for message in &platforms.warnings {
        warn!("{message}");
    }

    Ok(CommandOutcome::Completed(PlatformSyncRun {
        trace_stubs: traces.created,
        details,
        platforms,
    }))
}

/// Rule ids grouped by the signal that makes them worth a look
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub total: usize,
    pub active: usize,
    pub protected: usize,
    pub review: usize,
    pub archived: usize,
    pub frequent_violation: Vec<RuleRecord>,
    pub high_risk: Vec<RuleRecord>,
    pub hard_to_follow: Vec<RuleRecord>,
    pub low_value: Vec<RuleRecord>,
    pub good_practice: Vec<RuleRecord>,
    pub pending_review: Vec<RuleRecord>,
    pub top_activity: Vec<RuleRecord>,
    pub suggestions: Vec<Suggestion>,
}

fn suggestions(layout: &ProjectLayout, records: &[RuleRecord], limit: usize) -> Vec<Suggestion> {
    let resolver = RuleContentResolver::load(layout, None, records);
    let traces = TraceLinker::new(layout).resolve(records);
    build_suggestions(records, &resolver, &traces, limit)
}

/// Build the read-only curation report.
pub fn report(layout: &ProjectLayout) -> Result<CommandOutcome<AuditReport>> {
    let Some(records) = load_records(layout)? else {
        return Ok(CommandOutcome::skipped("audit.csv is empty or missing"));
    };
    let count = |status: Status| records.iter().filter(|r| r.status == status).count();
    let in_force: Vec<&RuleRecord> = records.iter().filter(|r| r.status.is_in_force()).collect();
    let pick = |predicate: fn(&RuleRecord) -> bool| -> Vec<RuleRecord> {
        in_force.iter().filter(|r| predicate(r)).map(|r| (*r).clone()).collect()
    };
    let policy = LifecyclePolicy::default();

    let mut by_activity = in_force.clone();
    by_activity.sort_by_key(|r| std::cmp::Reverse(activity(r)));
    let top_activity = by_activity
        .into_iter()
        .take(TOP_ACTIVITY)
        .filter(|r| activity(r) > 0)
        .cloned()
        .collect();

    Ok(CommandOutcome::Completed(AuditReport {
        total: records.len(),
        active: count(Status::Active),
        protected: count(Status::Protected),
        review: count(Status::Review),
        archived: count(Status::Archived),
        frequent_violation: pick(is_frequent_violation),
        high_risk: pick(is_high_risk),
        hard_to_follow: pick(is_hard_to_follow),
        low_value: records
            .iter()
            .filter(|r| r.status == Status::Active && is_low_value_candidate(r, policy.low_value_min_hit))
            .cloned()
            .collect(),
        good_practice: pick(is_good_practice),
        pending_review: records.iter().filter(|r| r.status == Status::Review).cloned().collect(),
        top_activity,
        suggestions: suggestions(layout, &records, REPORT_SUGGESTIONS),
    }))
}

/// Suggestions that were given a slot, in slot order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectRun {
    pub selected: Vec<Suggestion>,
}

/// Put the numbered report suggestions into the curated subset.
pub fn select(layout: &ProjectLayout, raw: &str) -> Result<CommandOutcome<SelectRun>> {
    let Some(mut records) = load_records(layout)? else {
        return Ok(CommandOutcome::skipped("audit.csv is empty or missing"));
    };
    let candidates = suggestions(layout, &records, SELECT_SUGGESTIONS);
    if candidates.is_empty() {
        return Ok(CommandOutcome::skipped("no evolve suggestions available"));
    }
    let numbers = parse_selection_numbers(raw);
    if numbers.is_empty() {
        return Ok(CommandOutcome::skipped(format!("cannot parse selection numbers: {raw}")));
    }

    let ids: Vec<String> = candidates.iter().map(|s| s.rule_id.clone()).collect();
    let chosen = apply_selection(&mut records, &ids, &numbers)?;
    RuleStore::new(layout.audit_table()).save(&records)?;

    let selected = chosen
        .iter()
        .filter_map(|id| candidates.iter().find(|s| &s.rule_id == id).cloned())
        .collect();
    Ok(CommandOutcome::Completed(SelectRun { selected }))
}

/// Reset every slot; returns how many rows had one.
pub fn clear(layout: &ProjectLayout) -> Result<CommandOutcome<usize>> {
    let Some(mut records) = load_records(layout)? else {
        return Ok(CommandOutcome::skipped("audit.csv is empty or missing"));
    };
    let changed = clear_selection(&mut records);
    RuleStore::new(layout.audit_table()).save(&records)?;
    Ok(CommandOutcome::Completed(changed))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeEntry {
    pub scope: String,
    pub rule_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeSummary {
    pub platform: Option<String>,
    /// Sorted by scope.
    pub scopes: Vec<ScopeEntry>,
    /// Scope segments with their rule counts, most used first.
    pub keywords: Vec<(String, usize)>,
}

impl ScopeSummary {
    pub fn rule_count(&self) -> usize {
        self.scopes.iter().map(|s| s.rule_ids.len()).sum()
    }
}

/// Per-scope and per-keyword counts of non-archived rules.
pub fn scopes(layout: &ProjectLayout, platform: Option<&str>) -> Result<CommandOutcome<ScopeSummary>> {
    let Some(records) = load_records(layout)? else {
        return Ok(CommandOutcome::skipped("audit.csv is empty or missing"));
    };
    let mut by_scope: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for r in records
        .iter()
        .filter(|r| !r.is_archived() && matches_platform(r, platform))
    {
        if !by_scope.contains_key(r.scope.as_str()) {
            first_seen.push(&r.scope);
        }
        by_scope.entry(&r.scope).or_default().push(r.rule_id.clone());
    }
    if by_scope.is_empty() {
        let hint = platform.map(|p| format!(" (platform filter: {p})")).unwrap_or_default();
        return Ok(CommandOutcome::skipped(format!("no valid scopes found{hint}")));
    }

    let mut keywords: Vec<(String, usize)> = Vec::new();
    for scope in first_seen {
        let count = by_scope[scope].len();
        for part in scope.split('/').map(str::trim).filter(|p| !p.is_empty()) {
            match keywords.iter_mut().find(|(k, _)| k == part) {
                Some((_, n)) => *n += count,
                None => keywords.push((part.to_string(), count)),
            }
        }
    }
    keywords.sort_by(|a, b| b.1.cmp(&a.1));

    Ok(CommandOutcome::Completed(ScopeSummary {
        platform: platform.map(str::to_string),
        scopes: by_scope
            .into_iter()
            .map(|(scope, rule_ids)| ScopeEntry {
                scope: scope.to_string(),
                rule_ids,
            })
            .collect(),
        keywords,
    }))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterView {
    pub keywords: Vec<String>,
    pub platform: Option<String>,
    /// Least compliant first.
    pub rules: Vec<RuleRecord>,
}

/// Rules matching a scope/platform filter, least compliant first.
pub fn filter(layout: &ProjectLayout, filter: &RuleFilter) -> Result<CommandOutcome<FilterView>> {
    if !filter.is_active() {
        return Ok(CommandOutcome::skipped(
            "filter needs scope keywords or --platform (run `scopes` to list keywords)",
        ));
    }
    let Some(records) = load_records(layout)? else {
        return Ok(CommandOutcome::skipped("audit.csv is empty or missing"));
    };
    let mut rules: Vec<RuleRecord> = records.into_iter().filter(|r| filter.matches(r)).collect();
    if rules.is_empty() {
        let keywords = if filter.keywords.is_empty() {
            "*".to_string()
        } else {
            filter.keywords.join(", ")
        };
        return Ok(CommandOutcome::skipped(format!(
            "no entries matched (keywords: {keywords}, platform: {})",
            filter.platform.as_deref().unwrap_or(PLATFORM_ALL)
        )));
    }
    rules.sort_by(|a, b| {
        let cr = |r: &RuleRecord| compliance(r).unwrap_or(1.0);
        cr(a).total_cmp(&cr(b))
    });
    Ok(CommandOutcome::Completed(FilterView {
        keywords: filter.keywords.clone(),
        platform: filter.platform.clone(),
        rules,
    }))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Promotion {
    pub rule: RuleRecord,
    pub reason: String,
}

/// Active platform lessons that keep failing and may deserve promotion to
/// user-level configuration.
pub fn promote(layout: &ProjectLayout, platform: Option<&str>) -> Result<CommandOutcome<Vec<Promotion>>> {
    let Some(records) = load_records(layout)? else {
        return Ok(CommandOutcome::skipped("audit.csv is empty or missing"));
    };
    let candidates: Vec<Promotion> = records
        .into_iter()
        .filter(|r| r.is_platform_lesson() && r.status == Status::Active)
        .filter(|r| platform.map_or(true, |p| r.platform == p))
        .filter_map(|rule| {
            let reason = if is_frequent_violation(&rule) {
                format!(
                    "Frequent violations (compliance {})",
                    percent(compliance(&rule).unwrap_or(0.0))
                )
            } else if is_high_risk(&rule) {
                format!("High risk (danger {})", percent(danger(&rule).unwrap_or(0.0)))
            } else {
                return None;
            };
            Some(Promotion { rule, reason })
        })
        .collect();
    if candidates.is_empty() {
        let suffix = platform.map(|p| format!(" (platform: {p})")).unwrap_or_default();
        return Ok(CommandOutcome::Skipped(format!("no promotion suggestions{suffix}")));
    }
    Ok(CommandOutcome::Completed(candidates))
}

/// Read-only health audit.
pub fn health(layout: &ProjectLayout, today: NaiveDate) -> HealthReport {
    run_health(layout, today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Origin;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn project(records: &[RuleRecord], canonical: Option<&str>) -> (TempDir, ProjectLayout) {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path());
        RuleStore::new(layout.audit_table()).save(records).unwrap();
        if let Some(text) = canonical {
            std::fs::write(layout.canonical_doc(), text).unwrap();
        }
        (dir, layout)
    }

    fn rule(id: &str, scope: &str, hit: i64, vio: i64, err: i64) -> RuleRecord {
        RuleRecord {
            scope: scope.to_string(),
            title: format!("title {id}"),
            hit,
            vio,
            err,
            ..RuleRecord::new(id)
        }
    }

    fn completed<T: std::fmt::Debug>(outcome: CommandOutcome<T>) -> T {
        match outcome {
            CommandOutcome::Completed(value) => value,
            CommandOutcome::Skipped(reason) => panic!("skipped: {reason}"),
        }
    }

    #[test]
    fn test_score_persists_and_reports_unknown() {
        let (_dir, layout) = project(&[rule("R-001", "ops", 0, 0, 0), rule("R-002", "db", 0, 0, 0)], None);
        let run = completed(score(&layout, "R-001:+hit R-009:+vio", RuleFilter::default(), today()).unwrap());
        assert_eq!(run.outcome.unknown, vec!["R-009"]);

        let table = RuleStore::new(layout.audit_table()).load().unwrap();
        assert_eq!(table.find("R-001").map(|r| r.hit), Some(1));
        assert_eq!(table.find("R-001").map(|r| r.last_reviewed.as_str()), Some("2026-10-19"));
    }

    #[test]
    fn test_score_without_table_is_skipped() {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path());
        let outcome = score(&layout, "R-001:+hit", RuleFilter::default(), today()).unwrap();
        assert!(matches!(outcome, CommandOutcome::Skipped(_)));
        let outcome = score(&layout, "garbage", RuleFilter::default(), today()).unwrap();
        assert!(matches!(outcome, CommandOutcome::Skipped(_)));
    }

    #[test]
    fn test_sync_without_canonical_is_noop() {
        let (_dir, layout) = project(&[rule("R-001", "ops", 0, 0, 0)], None);
        let outcome = sync(&layout, &SyncOptions::default(), today()).unwrap();
        assert!(matches!(outcome, CommandOutcome::Skipped(_)));
        assert!(!layout.canonical_doc().exists());
    }

    #[test]
    fn test_sync_moves_skipped_rule_to_review() {
        let mut skipped = rule("R-002", "ops", 0, 0, 0);
        skipped.skip = 5;
        let (_dir, layout) = project(
            &[rule("R-001", "ops", 2, 5, 3), skipped],
            Some("## TL;DR\n- note\n\n## Rules\n- [R-001] Always check\n- [R-002] Rarely used\n"),
        );
        let options = SyncOptions {
            platform: PlatformSyncOptions {
                skip: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let run = completed(sync(&layout, &options, today()).unwrap());
        assert_eq!(run.transitions.reviewed.len(), 1);
        assert_eq!(run.tagged, vec!["R-001", "R-002"]);
        assert_eq!(run.annotations.len(), 2);

        let table = RuleStore::new(layout.audit_table()).load().unwrap();
        assert_eq!(table.find("R-002").map(|r| r.status.clone()), Some(Status::Review));
        let text = std::fs::read_to_string(layout.canonical_doc()).unwrap();
        assert!(text.contains("- [R-001] Always check  `{hit:2 vio:5 err:3}`"));
        assert!(text.contains("RULE_SELECTION"));
        assert!(layout.rule_detail_path("R-001").exists());
    }

    #[test]
    fn test_report_categories() {
        let mut low = rule("R-003", "docs", 9, 0, 0);
        low.origin = Origin::Preventive;
        let (_dir, layout) = project(
            &[rule("R-001", "ops", 2, 5, 3), rule("R-002", "db", 4, 0, 0), low],
            None,
        );
        let report = completed(report(&layout).unwrap());
        let ids = |rows: &[RuleRecord]| rows.iter().map(|r| r.rule_id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&report.frequent_violation), vec!["R-001"]);
        assert_eq!(ids(&report.high_risk), vec!["R-001"]);
        assert_eq!(ids(&report.low_value), vec!["R-003"]);
        assert_eq!(ids(&report.good_practice), vec!["R-002"]);
        assert_eq!(ids(&report.top_activity), vec!["R-003", "R-001", "R-002"]);
        assert_eq!(report.suggestions[0].rule_id, "R-001");
    }

    #[test]
    fn test_select_and_clear() {
        let (_dir, layout) = project(&[rule("R-001", "ops", 2, 5, 3), rule("R-002", "db", 4, 0, 0)], None);
        let run = completed(select(&layout, "2,1").unwrap());
        assert_eq!(run.selected[0].rule_id, "R-002");

        let table = RuleStore::new(layout.audit_table()).load().unwrap();
        assert_eq!(table.find("R-002").map(|r| r.evolve_slot), Some(1));
        assert_eq!(table.find("R-001").map(|r| r.evolve_slot), Some(2));

        assert!(select(&layout, "7").is_err());
        assert_eq!(completed(clear(&layout).unwrap()), 2);
    }

    #[test]
    fn test_scopes_and_filter() {
        let (_dir, layout) = project(
            &[
                rule("R-001", "frontend/react", 5, 0, 0),
                rule("R-002", "frontend", 1, 3, 0),
                rule("R-003", "backend/db", 0, 0, 0),
            ],
            None,
        );
        let summary = completed(scopes(&layout, None).unwrap());
        assert_eq!(summary.rule_count(), 3);
        assert_eq!(summary.keywords[0], ("frontend".to_string(), 2));
        assert_eq!(summary.scopes[0].scope, "backend/db");

        let view = completed(filter(&layout, &RuleFilter::new(vec!["front".to_string()], None)).unwrap());
        let ids: Vec<&str> = view.rules.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["R-002", "R-001"]);
        assert!(matches!(
            filter(&layout, &RuleFilter::default()).unwrap(),
            CommandOutcome::Skipped(_)
        ));
    }

    #[test]
    fn test_promote_platform_lessons() {
        let lesson = RuleRecord {
            platform: "codex".to_string(),
            ..rule("S-001", "tools", 1, 4, 0)
        };
        let (_dir, layout) = project(&[rule("R-001", "ops", 0, 5, 3), lesson], None);
        let found = completed(promote(&layout, None).unwrap());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].reason, "Frequent violations (compliance 20%)");
        assert!(matches!(promote(&layout, Some("claude")).unwrap(), CommandOutcome::Skipped(_)));
    }
}
