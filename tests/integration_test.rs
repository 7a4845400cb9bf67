//! End-to-end workflow tests against a temporary project directory.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use walkdir::WalkDir;

use evolve_audit::config::ProjectLayout;
use evolve_audit::health::{CheckLevel, CheckResult, HealthReport};
use evolve_audit::store::{Origin, RuleRecord, RuleStore, RuleFilter, Status};
use evolve_audit::workflow::{self, CommandOutcome, SyncOptions};

const CANONICAL: &str = "\
# Project Rules

## TL;DR
- Keep changes small

## Rules
- [R-001] Run the test suite before committing
- [R-002] Prefer explicit error types
- [S-001] Use the task tool for long searches
";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn setup() -> (TempDir, ProjectLayout) {
    let dir = TempDir::new().unwrap();
    let layout = ProjectLayout::new(dir.path());
    std::fs::create_dir_all(dir.path().join("evolve")).unwrap();

    let records = vec![
        RuleRecord {
            scope: "testing/ci".to_string(),
            title: "Run the test suite before committing".to_string(),
            origin: Origin::Error,
            hit: 5,
            vio: 1,
            err: 1,
            last_reviewed: "2026-10-01".to_string(),
            ..RuleRecord::new("R-001")
        },
        RuleRecord {
            scope: "rust/errors".to_string(),
            title: "Prefer explicit error types".to_string(),
            hit: 3,
            last_reviewed: "2026-10-01".to_string(),
            ..RuleRecord::new("R-002")
        },
        RuleRecord {
            scope: "tools".to_string(),
            title: "Use the task tool for long searches".to_string(),
            platform: "claude".to_string(),
            hit: 2,
            last_reviewed: "2026-10-01".to_string(),
            ..RuleRecord::new("S-001")
        },
    ];
    RuleStore::new(layout.audit_table()).save(&records).unwrap();
    std::fs::write(layout.canonical_doc(), CANONICAL).unwrap();
    (dir, layout)
}

fn completed<T>(outcome: CommandOutcome<T>) -> T {
    match outcome {
        CommandOutcome::Completed(value) => value,
        CommandOutcome::Skipped(reason) => panic!("skipped: {reason}"),
    }
}

/// Every file under the project, keyed by relative path.
fn snapshot(root: &Path) -> BTreeMap<String, String> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_string_lossy().to_string();
            (rel, std::fs::read_to_string(e.path()).unwrap())
        })
        .collect()
}

fn check<'a>(report: &'a HealthReport, name: &str) -> &'a CheckResult {
    report
        .dimensions
        .iter()
        .flat_map(|d| d.checks.iter())
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("missing check {name}"))
}

#[test]
fn test_score_sync_is_idempotent() {
    let (dir, layout) = setup();

    let run = completed(workflow::score(&layout, "R-001:+hit R-002:+vio S-001:+hit", RuleFilter::default(), today()).unwrap());
    assert!(run.outcome.unknown.is_empty());

    let first = completed(workflow::sync(&layout, &SyncOptions::default(), today()).unwrap());
    assert_eq!(first.tagged, vec!["R-001", "R-002", "S-001"]);
    assert_eq!(first.platforms.created, vec![dir.path().join("CLAUDE.md")]);

    let canonical = std::fs::read_to_string(layout.canonical_doc()).unwrap();
    assert!(canonical.contains("- [R-001] Run the test suite before committing  `{hit:6 vio:1 err:1}`"));
    let claude = std::fs::read_to_string(dir.path().join("CLAUDE.md")).unwrap();
    assert!(claude.contains("S-001"));
    assert!(layout.rule_detail_path("R-002").exists());

    let before = snapshot(dir.path());
    let second = completed(workflow::sync(&layout, &SyncOptions::default(), today()).unwrap());
    assert_eq!(snapshot(dir.path()), before);
    assert!(second.platforms.created.is_empty());
    assert!(second.platforms.updated.is_empty());
    assert_eq!(second.platforms.unchanged, vec![dir.path().join("CLAUDE.md")]);
    assert!(second.details.created.is_empty());
    assert!(second.details.updated.is_empty());
}

#[test]
fn test_health_after_sync() {
    let (_dir, layout) = setup();
    completed(workflow::sync(&layout, &SyncOptions::default(), today()).unwrap());

    let report = workflow::health(&layout, today());
    assert_eq!(check(&report, "Platform Digest Freshness").level, CheckLevel::Pass);
    assert_eq!(check(&report, "Inline Tag Sync").level, CheckLevel::Pass);
    assert_eq!(check(&report, "err <= vio").level, CheckLevel::Pass);
    assert!(report.findings(CheckLevel::Fail).is_empty());
}

#[test]
fn test_health_flags_stale_platform_file() {
    let (dir, layout) = setup();
    completed(workflow::sync(&layout, &SyncOptions::default(), today()).unwrap());

    // Counters change without a sync, so the platform digest goes stale.
    completed(workflow::score(&layout, "S-001:+vio", RuleFilter::default(), today()).unwrap());
    let report = workflow::health(&layout, today());
    assert_ne!(check(&report, "Platform Digest Freshness").level, CheckLevel::Pass);

    completed(workflow::sync(&layout, &SyncOptions::default(), today()).unwrap());
    let report = workflow::health(&layout, today());
    assert_eq!(check(&report, "Platform Digest Freshness").level, CheckLevel::Pass);
    assert!(dir.path().join("CLAUDE.md").exists());
}

#[test]
fn test_review_transition_through_scoring() {
    let (_dir, layout) = setup();
    for _ in 0..5 {
        completed(workflow::score(&layout, "R-002:+skip", RuleFilter::default(), today()).unwrap());
    }
    let run = completed(workflow::sync(&layout, &SyncOptions::default(), today()).unwrap());
    let reviewed: Vec<&str> = run.transitions.reviewed.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(reviewed, vec!["R-002"]);

    let table = RuleStore::new(layout.audit_table()).load().unwrap();
    assert_eq!(table.find("R-002").map(|r| r.status.clone()), Some(Status::Review));
}
