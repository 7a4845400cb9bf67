use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;

use crate::content::DetailSyncOutcome;
use crate::health::{CheckLevel, HealthReport};
use crate::metrics::{activity, compliance, danger, percent};
use crate::platform::PlatformSyncOutcome;
use crate::store::{RuleRecord, PLATFORM_ALL};
use crate::workflow::{AuditReport, FilterView, PlatformSyncRun, Promotion, ScopeSummary, ScoreRun, SelectRun, SyncRun};

const RULE: &str = "================================================================";
const THIN_RULE: &str = "----------------------------------------------------------------";
const MAX_DETAIL_LINES: usize = 5;

fn paths(out: &mut dyn Write, label: &str, list: &[PathBuf]) -> Result<()> {
    if list.is_empty() {
        return Ok(());
    }
    writeln!(out, "  {label}:")?;
    for path in list {
        writeln!(out, "    - {}", path.display())?;
    }
    Ok(())
}

/// A command that had nothing to do
pub fn render_skipped(out: &mut dyn Write, reason: &str) -> Result<()> {
    writeln!(out, "{reason}")?;
    Ok(())
}

pub fn render_score(out: &mut dyn Write, run: &ScoreRun) -> Result<()> {
    writeln!(out, "Scoring complete: {} rules updated", run.outcome.updated.len())?;
    for (rule_id, actions) in run.card.entries() {
        if run.outcome.unknown.iter().any(|u| u == rule_id) {
            continue;
        }
        let actions: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
        writeln!(out, "  {rule_id} -> +{}", actions.join(", +"))?;
    }
    if !run.outcome.auto_skipped.is_empty() {
        writeln!(out, "\nAuto auto_skip+1: {} rules", run.outcome.auto_skipped.len())?;
        writeln!(out, "  {}", run.outcome.auto_skipped.join(", "))?;
        if let Some(platform) = &run.filter.platform {
            writeln!(out, "  Platform filter: {platform}")?;
        }
    }
    if !run.outcome.unknown.is_empty() {
        writeln!(out, "\nWarning: unknown rule_id(s): {}", run.outcome.unknown.join(", "))?;
    }
    Ok(())
}

fn render_details(out: &mut dyn Write, details: &DetailSyncOutcome) -> Result<()> {
    if details.targets.is_empty() {
        writeln!(out, "Rule detail sync: no targets")?;
        return Ok(());
    }
    writeln!(
        out,
        "Rule detail sync complete: {} targets, created={} updated={} existing={} skipped={}",
        details.targets.len(),
        details.created.len(),
        details.updated.len(),
        details.existing.len(),
        details.skipped.len()
    )?;
    paths(out, "Created", &details.created)?;
    paths(out, "Updated", &details.updated)?;
    paths(out, "Skipped (read failed)", &details.skipped)
}

fn render_platforms(out: &mut dyn Write, platforms: &PlatformSyncOutcome) -> Result<()> {
    if platforms.targets.is_empty() {
        writeln!(out, "Platform file sync: no targets (skipped)")?;
        return Ok(());
    }
    writeln!(
        out,
        "Platform file sync complete: {} targets, created={} updated={} unchanged={}",
        platforms.targets.len(),
        platforms.created.len(),
        platforms.updated.len(),
        platforms.unchanged.len()
    )?;
    paths(out, "Created", &platforms.created)?;
    paths(out, "Updated", &platforms.updated)
}

pub fn render_sync(out: &mut dyn Write, run: &SyncRun) -> Result<()> {
    writeln!(out, "Sync complete -> {}", run.canonical_path.display())?;
    render_details(out, &run.details)?;
    if let Some(platform) = run.evolve_platform.as_deref().filter(|p| *p != PLATFORM_ALL) {
        writeln!(out, "EVOLVE.md sync target: universal + platform={platform}")?;
    }
    render_platforms(out, &run.platforms)?;
    if !run.transitions.reviewed.is_empty() {
        let items: Vec<String> = run
            .transitions
            .reviewed
            .iter()
            .map(|(id, reason)| format!("{id}({})", reason.as_str()))
            .collect();
        writeln!(out, "Warning: marked for review: {}", items.join(", "))?;
    }
    if !run.transitions.low_value.is_empty() {
        writeln!(
            out,
            "Low-value candidates (hit>=8 with no violations): {}",
            run.transitions.low_value.join(", ")
        )?;
        writeln!(out, "  -> Run `report` and confirm whether to mark as protected or archived")?;
    }
    for warning in &run.warnings {
        writeln!(out, "Warning: {warning}")?;
    }
    Ok(())
}

pub fn render_platform_sync(out: &mut dyn Write, run: &PlatformSyncRun) -> Result<()> {
    render_details(out, &run.details)?;
    render_platforms(out, &run.platforms)?;
    for warning in &run.platforms.warnings {
        writeln!(out, "Warning: {warning}")?;
    }
    Ok(())
}

fn rule_group<F>(out: &mut dyn Write, title: &str, rows: &[RuleRecord], line: F) -> Result<()>
where
    F: Fn(&RuleRecord) -> String,
{
    if rows.is_empty() {
        return Ok(());
    }
    writeln!(out, "{title}")?;
    for r in rows {
        writeln!(out, "  [{}] {}", r.rule_id, line(r))?;
    }
    writeln!(out)?;
    Ok(())
}

pub fn render_report(out: &mut dyn Write, report: &AuditReport) -> Result<()> {
    writeln!(out, "{}", &RULE[..60])?;
    writeln!(out, "  Audit Report")?;
    writeln!(out, "{}", &RULE[..60])?;
    writeln!(
        out,
        "\nTotal: {} (active: {}, protected: {}, review: {}, archived: {})\n",
        report.total, report.active, report.protected, report.review, report.archived
    )?;

    let cr = |r: &RuleRecord| percent(compliance(r).unwrap_or(0.0));
    rule_group(out, "[WARN] Frequent violations (needs emphasis):", &report.frequent_violation, |r| {
        format!("{} - compliance: {}, vio: {}", r.scope, cr(r), r.vio)
    })?;
    rule_group(out, "[HIGH-RISK] Rules where violations often cause errors:", &report.high_risk, |r| {
        format!("{} - danger: {}, err: {}", r.scope, percent(danger(r).unwrap_or(0.0)), r.err)
    })?;
    rule_group(out, "[REWRITE] Important but hard-to-follow rules:", &report.hard_to_follow, |r| {
        format!("{} - compliance: {}, hit:{} vio:{}", r.scope, cr(r), r.hit, r.vio)
    })?;
    if !report.low_value.is_empty() {
        rule_group(
            out,
            "[REVIEW] Low-value candidates (high hit, never violated, origin!=error):",
            &report.low_value,
            |r| format!("{} (origin:{}) - hit:{} vio:0 err:0 - {}", r.scope, r.origin, r.hit, r.title),
        )?;
        writeln!(out, "  -> User decision: keep as protected, or archive as low-value\n")?;
    }
    rule_group(out, "[GOOD] Clear and reliably followed rules:", &report.good_practice, |r| {
        format!("{} - hit: {}", r.scope, r.hit)
    })?;
    rule_group(out, "[PENDING REVIEW] Possibly outdated rules:", &report.pending_review, |r| {
        format!(
            "{} - skip: {}, auto_skip: {}, last: {}",
            r.scope, r.skip, r.auto_skip, r.last_reviewed
        )
    })?;
    rule_group(out, "[TOP 5] Highest activity rules:", &report.top_activity, |r| {
        format!("{} - activity: {} (hit:{} vio:{})", r.scope, activity(r), r.hit, r.vio)
    })?;

    if report.suggestions.is_empty() {
        return Ok(());
    }
    writeln!(out, "[EVOLVE SUGGESTIONS] Candidates for writing into EVOLVE.md Rules:")?;
    for (idx, s) in report.suggestions.iter().enumerate() {
        let reasons: Vec<&str> = s.reasons.iter().map(|r| r.as_str()).collect();
        let selected = if s.evolve_slot > 0 {
            format!(" selected:#{}", s.evolve_slot)
        } else {
            String::new()
        };
        writeln!(
            out,
            "  ({:02}) [{}] [{}] hit:{} vio:{} err:{} score:{:.1}{selected} reason:{}",
            idx + 1,
            s.rule_id,
            s.scope,
            s.hit,
            s.vio,
            s.err,
            s.score,
            reasons.join("/")
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Select entries by number:")?;
    writeln!(out, "  evolve-audit select \"1,3,5\"")?;
    writeln!(out, "Clear all selections:")?;
    writeln!(out, "  evolve-audit select --clear")?;
    Ok(())
}

pub fn render_select(out: &mut dyn Write, run: &SelectRun) -> Result<()> {
    writeln!(out, "Evolve selection updated: {} rules selected", run.selected.len())?;
    for (order, s) in run.selected.iter().enumerate() {
        writeln!(out, "  slot#{} <- [{}] [{}] {}", order + 1, s.rule_id, s.scope, s.title)?;
    }
    writeln!(out, "Next step: run `evolve-audit sync` to generate EVOLVE.md content")?;
    Ok(())
}

pub fn render_clear(out: &mut dyn Write, changed: usize) -> Result<()> {
    writeln!(out, "Cleared evolve selections: {changed} rows reset")?;
    Ok(())
}

pub fn render_scopes(out: &mut dyn Write, summary: &ScopeSummary) -> Result<()> {
    writeln!(
        out,
        "[{} scopes, {} active rules | platform: {}]\n",
        summary.scopes.len(),
        summary.rule_count(),
        summary.platform.as_deref().unwrap_or(PLATFORM_ALL)
    )?;
    writeln!(out, "Available keywords (sorted by rule count):")?;
    for (keyword, count) in &summary.keywords {
        writeln!(out, "  {keyword:<20} ({count} rules)")?;
    }
    writeln!(out, "\nFull scope list:")?;
    for entry in &summary.scopes {
        let shown: Vec<&str> = entry.rule_ids.iter().take(5).map(String::as_str).collect();
        let suffix = if entry.rule_ids.len() > 5 { "..." } else { "" };
        writeln!(out, "  {:<30} -> {}{suffix}", entry.scope, shown.join(", "))?;
    }
    Ok(())
}

pub fn render_filter(out: &mut dyn Write, view: &FilterView) -> Result<()> {
    let keywords = if view.keywords.is_empty() {
        "*".to_string()
    } else {
        view.keywords.join(", ")
    };
    let platform = view.platform.as_deref().unwrap_or(PLATFORM_ALL);
    writeln!(
        out,
        "[{} matched rules | scope: {keywords} | platform: {platform}]",
        view.rules.len()
    )?;
    let width = |f: fn(&RuleRecord) -> usize| view.rules.iter().map(f).max().unwrap_or(0);
    let id_w = width(|r| r.rule_id.len());
    let platform_w = width(|r| r.platform.len());
    let scope_w = width(|r| r.scope.len());
    for r in &view.rules {
        let stats = format!("hit:{} vio:{} err:{}", r.hit, r.vio, r.err);
        let title: String = r.title.chars().take(50).collect();
        writeln!(
            out,
            "  {:<id_w$} | {:<platform_w$} | {:<scope_w$} | {:<11} | {stats:<20} | {title}",
            r.rule_id,
            r.platform,
            r.scope,
            r.origin.as_str(),
        )?;
    }
    writeln!(
        out,
        "\nScoring syntax: score \"R-001:+hit R-002:+vio+err ...\" [--scope \"keywords\"] [--platform \"{}\"]",
        view.platform.as_deref().unwrap_or("name")
    )?;
    writeln!(out, "{} filtered rules left unscored will receive auto_skip+1", view.rules.len())?;
    Ok(())
}

pub fn render_promote(out: &mut dyn Write, candidates: &[Promotion], platform: Option<&str>) -> Result<()> {
    writeln!(out, "{}", &RULE[..60])?;
    writeln!(out, "  User-Level Promotion Suggestions")?;
    writeln!(out, "{}", &RULE[..60])?;
    let suffix = platform.map(|p| format!(" (platform: {p})")).unwrap_or_default();
    writeln!(out, "\nSuggested platform lessons to promote to user-level config{suffix}:\n")?;
    for c in candidates {
        let r = &c.rule;
        writeln!(out, "  [{}] [{}] {}", r.rule_id, r.platform, r.scope)?;
        writeln!(out, "    Reason: {}", c.reason)?;
        writeln!(out, "    Stats: hit={} vio={} err={}", r.hit, r.vio, r.err)?;
        writeln!(out)?;
    }
    writeln!(out, "Please confirm promotion with the user during retrospective.")?;
    Ok(())
}

/// Human-readable health report
pub fn render_health(out: &mut dyn Write, report: &HealthReport) -> Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "  Evolve Health Check Report")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "\n  Overall Score: {:.0}/100  {}\n", report.score, report.grade)?;

    for dim in &report.dimensions {
        writeln!(out, "\n{THIN_RULE}")?;
        writeln!(out, "  [{}] {}", dim.dimension, dim.description)?;
        writeln!(
            out,
            "  {} PASS / {} WARN / {} FAIL",
            dim.count(CheckLevel::Pass),
            dim.count(CheckLevel::Warn),
            dim.count(CheckLevel::Fail)
        )?;
        writeln!(out, "{THIN_RULE}")?;
        for check in &dim.checks {
            writeln!(out, "  [{}] {}: {}", check.level, check.name, check.message)?;
            for detail in check.details.iter().take(MAX_DETAIL_LINES) {
                writeln!(out, "      -> {detail}")?;
            }
            if check.details.len() > MAX_DETAIL_LINES {
                writeln!(out, "      ... and {} more", check.details.len() - MAX_DETAIL_LINES)?;
            }
        }
    }

    let fails = report.findings(CheckLevel::Fail);
    let warns = report.findings(CheckLevel::Warn);
    if !fails.is_empty() || !warns.is_empty() {
        writeln!(out, "\n{RULE}")?;
        writeln!(out, "  Suggested Fixes")?;
        writeln!(out, "{RULE}")?;
        for (title, findings) in [("[Must Fix]", &fails), ("[Needs Attention]", &warns)] {
            if findings.is_empty() {
                continue;
            }
            writeln!(out, "\n  {title}")?;
            for f in findings {
                writeln!(
                    out,
                    "    [{}] [{}] {}: {}",
                    f.check.level, f.dimension, f.check.name, f.check.message
                )?;
            }
        }
    }

    writeln!(out, "\n{RULE}")?;
    writeln!(out, "  Completed: {} checks", report.check_count())?;
    writeln!(out, "{RULE}\n")?;
    Ok(())
}
