use super::{capped, AuditContext, CheckResult, Dimension};
use crate::metrics::percent;
use crate::store::{RuleRecord, Status};

const ZOMBIE_DAYS: i64 = 30;
const RECENT_DAYS: i64 = 7;
const RECENT_COVERAGE_MIN: f64 = 0.3;
const REVIEW_STALE_DAYS: i64 = 30;

/// Audit coverage, stale rules and review backlog
pub struct Freshness;

fn days_since(record: &RuleRecord, ctx: &AuditContext) -> Option<i64> {
    record.reviewed_on().map(|d| (ctx.today - d).num_days())
}

impl Dimension for Freshness {
    fn id(&self) -> &'static str {
        "freshness"
    }

    fn name(&self) -> &'static str {
        "Freshness"
    }

    fn description(&self) -> &'static str {
        "Audit coverage, stale rules, and review backlog"
    }

    fn evaluate(&self, ctx: &AuditContext) -> Vec<CheckResult> {
        let in_force = ctx.in_force();
        if in_force.is_empty() {
            return vec![CheckResult::warn("Active Rules", "No active rules found")];
        }
        let total = in_force.len();
        let mut checks = Vec::new();

        let zombies: Vec<String> = in_force
            .iter()
            .filter_map(|r| match days_since(r, ctx) {
                Some(days) if days > ZOMBIE_DAYS => {
                    Some(format!("{} ({days} days since last review)", r.rule_id))
                }
                Some(_) => None,
                None => Some(format!("{} (invalid or missing review date)", r.rule_id)),
            })
            .collect();
        checks.push(if zombies.is_empty() {
            CheckResult::pass(
                "Zombie Rules",
                format!("All {total} active rules were reviewed within {ZOMBIE_DAYS} days"),
            )
        } else {
            let message = format!(
                "{}/{total} rules exceed {ZOMBIE_DAYS} days without review",
                zombies.len()
            );
            let check = if zombies.len() as f64 / total as f64 > 0.5 {
                CheckResult::fail("Zombie Rules", message)
            } else {
                CheckResult::warn("Zombie Rules", message)
            };
            check.with_details(capped(zombies))
        });

        let recent = in_force
            .iter()
            .filter(|r| days_since(r, ctx).is_some_and(|d| d <= RECENT_DAYS))
            .count();
        let coverage = recent as f64 / total as f64;
        checks.push(if coverage < RECENT_COVERAGE_MIN {
            CheckResult::warn(
                "7-Day Coverage",
                format!(
                    "Only {recent}/{total} rules reviewed in last {RECENT_DAYS} days ({})",
                    percent(coverage)
                ),
            )
        } else {
            CheckResult::pass(
                "7-Day Coverage",
                format!(
                    "{recent}/{total} rules reviewed in last {RECENT_DAYS} days ({})",
                    percent(coverage)
                ),
            )
        });

        let pending: Vec<&RuleRecord> = ctx.records.iter().filter(|r| r.status == Status::Review).collect();
        let stale: Vec<String> = pending
            .iter()
            .filter_map(|r| match days_since(r, ctx) {
                Some(days) if days > REVIEW_STALE_DAYS => {
                    Some(format!("{} (review pending for {days} days)", r.rule_id))
                }
                Some(_) => None,
                None => Some(format!("{} (invalid or missing date)", r.rule_id)),
            })
            .collect();
        checks.push(if !stale.is_empty() {
            CheckResult::warn(
                "Review Backlog",
                format!("{} review items exceed {REVIEW_STALE_DAYS} days", stale.len()),
            )
            .with_details(capped(stale))
        } else if pending.is_empty() {
            CheckResult::pass("Review Backlog", "No items pending review")
        } else {
            CheckResult::pass(
                "Review Backlog",
                format!("No stale review items (current pending: {})", pending.len()),
            )
        });

        checks
    }
}
