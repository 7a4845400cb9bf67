use std::collections::BTreeMap;

use super::{AuditContext, CheckResult, Dimension};
use crate::metrics::percent;
use crate::store::{canonical_platform, Origin, RuleRecord, Status, PLATFORM_ALL};

const RULES_MIN: usize = 5;
const RULES_MAX: usize = 50;
const SCOPE_CONCENTRATION: f64 = 0.5;
const IMPORTED_MAX: f64 = 0.7;
const REVIEW_BACKLOG_MAX: usize = 5;

/// Rule count, distribution balance and source diversity
pub struct Structure;

/// Counts in first-seen order, then stably sorted by count descending.
fn ranked_counts<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for key in keys {
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn ratio(part: usize, total: usize) -> f64 {
    part as f64 / total as f64
}

impl Structure {
    fn rule_count(&self, total: usize) -> CheckResult {
        if total < RULES_MIN {
            CheckResult::warn(
                "Rule Count",
                format!("Only {total} active rules (< {RULES_MIN}); knowledge base is sparse"),
            )
        } else if total > RULES_MAX {
            CheckResult::warn(
                "Rule Count",
                format!("{total} active rules (> {RULES_MAX}); maintenance overhead is high"),
            )
        } else {
            CheckResult::pass(
                "Rule Count",
                format!("{total} active rules; count is in a healthy range"),
            )
        }
    }

    fn scope_distribution(&self, live: &[&RuleRecord]) -> CheckResult {
        let total = live.len();
        let scopes = ranked_counts(live.iter().map(|r| r.top_scope()));
        let (top, top_count) = scopes[0];
        let concentration = ratio(top_count, total);
        if concentration > SCOPE_CONCENTRATION {
            CheckResult::warn(
                "Scope Distribution",
                format!(
                    "'{top}' accounts for {} (> {}); over-concentrated",
                    percent(concentration),
                    percent(SCOPE_CONCENTRATION)
                ),
            )
            .with_details(
                scopes
                    .iter()
                    .map(|(k, v)| format!("{k}: {v} rules ({})", percent(ratio(*v, total))))
                    .collect(),
            )
        } else {
            CheckResult::pass(
                "Scope Distribution",
                format!(
                    "Largest scope '{top}' is {}; distribution is balanced",
                    percent(concentration)
                ),
            )
            .with_details(scopes.iter().map(|(k, v)| format!("{k}: {v} rules")).collect())
        }
    }

    fn origin_distribution(&self, live: &[&RuleRecord]) -> CheckResult {
        let total = live.len();
        let origins = ranked_counts(live.iter().map(|r| r.origin.as_str()));
        let share = |origin: &Origin| {
            let n = live.iter().filter(|r| &r.origin == origin).count();
            ratio(n, total)
        };
        let details: Vec<String> = origins
            .iter()
            .map(|(k, v)| format!("{k}: {v} rules ({})", percent(ratio(*v, total))))
            .collect();

        let imported = share(&Origin::Imported);
        if share(&Origin::Error) == 1.0 {
            CheckResult::warn(
                "Origin Distribution",
                "All rules come from errors; preventive knowledge is missing",
            )
            .with_details(details)
        } else if imported > IMPORTED_MAX {
            CheckResult::warn(
                "Origin Distribution",
                format!(
                    "Imported rules account for {}; practical local learnings are limited",
                    percent(imported)
                ),
            )
            .with_details(details)
        } else {
            CheckResult::pass("Origin Distribution", "Origin diversity looks healthy").with_details(details)
        }
    }

    fn status_distribution(&self, records: &[RuleRecord]) -> CheckResult {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for r in records {
            *counts.entry(r.status.as_str()).or_default() += 1;
        }
        let details: Vec<String> = counts.iter().map(|(k, v)| format!("{k}: {v} rules")).collect();
        let archived = records.iter().filter(|r| r.status == Status::Archived).count();
        let review = records.iter().filter(|r| r.status == Status::Review).count();
        let total = records.len();

        if total > 0 && ratio(archived, total) > 0.5 {
            CheckResult::warn(
                "Status Distribution",
                format!(
                    "archived accounts for {}; more than half are retired",
                    percent(ratio(archived, total))
                ),
            )
            .with_details(details)
        } else if review > REVIEW_BACKLOG_MAX {
            CheckResult::warn(
                "Status Distribution",
                format!("{review} rules are in review; backlog is high"),
            )
            .with_details(details)
        } else {
            CheckResult::pass("Status Distribution", "Status distribution is healthy").with_details(details)
        }
    }

    fn platform_decoupling(&self, live: &[&RuleRecord]) -> CheckResult {
        let lessons: Vec<&RuleRecord> = live.iter().copied().filter(|r| r.is_platform_lesson()).collect();
        if lessons.is_empty() {
            return CheckResult::pass("Platform Decoupling", "No platform lessons (S-xxx) found");
        }

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for r in &lessons {
            *counts.entry(canonical_platform(&r.platform)).or_default() += 1;
        }
        let mut ordered: Vec<(&String, &usize)> = counts.iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let details: Vec<String> = ordered.iter().map(|(k, v)| format!("{k}: {v} rules")).collect();

        match counts.get(PLATFORM_ALL) {
            Some(weak) => CheckResult::warn(
                "Platform Decoupling",
                format!("{weak}/{} platform lessons still use platform=all", lessons.len()),
            )
            .with_details(details),
            None => CheckResult::pass(
                "Platform Decoupling",
                format!(
                    "Platform lessons are decoupled by platform ({} platforms)",
                    counts.len()
                ),
            )
            .with_details(details),
        }
    }
}

impl Dimension for Structure {
    fn id(&self) -> &'static str {
        "structure"
    }

    fn name(&self) -> &'static str {
        "Structure"
    }

    fn description(&self) -> &'static str {
        "Rule count, distribution balance, and source diversity"
    }

    fn evaluate(&self, ctx: &AuditContext) -> Vec<CheckResult> {
        let live = ctx.live();
        let mut checks = vec![self.rule_count(live.len())];
        if live.is_empty() {
            return checks;
        }
        checks.push(self.scope_distribution(&live));
        checks.push(self.origin_distribution(&live));
        checks.push(self.status_distribution(&ctx.records));
        checks.push(self.platform_decoupling(&live));
        checks
    }
}
