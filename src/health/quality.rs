use super::{AuditContext, CheckResult, Dimension};
use crate::metrics::{compliance, danger, is_hard_to_follow, is_high_risk, is_low_value_candidate, percent};
use crate::store::{RuleRecord, Status};

const LOW_VALUE_MIN_HIT: i64 = 8;
const HIGH_RISK_SHARE_MAX: f64 = 0.2;

/// Compliance plus high-risk, hard-to-follow and low-value ratios
pub struct Quality;

impl Quality {
    fn overall_compliance(&self, in_force: &[&RuleRecord]) -> CheckResult {
        let hit: i64 = in_force.iter().map(|r| r.hit).sum();
        let vio: i64 = in_force.iter().map(|r| r.vio).sum();
        if hit + vio <= 0 {
            return CheckResult::warn(
                "Overall Compliance",
                "No audit data; compliance cannot be calculated",
            );
        }
        let rate = hit as f64 / (hit + vio) as f64;
        let message = format!("{} (hit:{hit} vio:{vio})", percent(rate));
        if rate >= 0.8 {
            CheckResult::pass("Overall Compliance", message)
        } else if rate >= 0.6 {
            CheckResult::warn("Overall Compliance", message)
        } else {
            CheckResult::fail("Overall Compliance", message)
        }
    }

    fn high_risk(&self, in_force: &[&RuleRecord]) -> CheckResult {
        let risky: Vec<&RuleRecord> = in_force.iter().copied().filter(|r| is_high_risk(r)).collect();
        if risky.is_empty() {
            return CheckResult::pass("High-Risk Rules", "No high-risk rules");
        }
        let share = risky.len() as f64 / in_force.len() as f64;
        let message = format!("{} high-risk rules ({})", risky.len(), percent(share));
        let details = risky
            .iter()
            .map(|r| format!("{} (danger {})", r.rule_id, percent(danger(r).unwrap_or(0.0))))
            .collect();
        let check = if share > HIGH_RISK_SHARE_MAX {
            CheckResult::fail("High-Risk Rules", message)
        } else {
            CheckResult::warn("High-Risk Rules", message)
        };
        check.with_details(details)
    }

    fn hard_to_follow(&self, in_force: &[&RuleRecord]) -> CheckResult {
        let hard: Vec<String> = in_force
            .iter()
            .filter(|r| is_hard_to_follow(r))
            .map(|r| {
                format!(
                    "{} (compliance {})",
                    r.rule_id,
                    percent(compliance(r).unwrap_or(0.0))
                )
            })
            .collect();
        if hard.is_empty() {
            CheckResult::pass("Hard-to-Follow Rules", "No hard-to-follow rules")
        } else {
            CheckResult::warn(
                "Hard-to-Follow Rules",
                format!(
                    "{} hard-to-follow rules (hit>=3 and vio>=3); consider rewrite",
                    hard.len()
                ),
            )
            .with_details(hard)
        }
    }

    fn low_value(&self, in_force: &[&RuleRecord]) -> CheckResult {
        let low: Vec<String> = in_force
            .iter()
            .filter(|r| is_low_value_candidate(r, LOW_VALUE_MIN_HIT))
            .map(|r| format!("{} ({}, hit:{})", r.rule_id, r.origin, r.hit))
            .collect();
        if low.is_empty() {
            CheckResult::pass("Low-Value Candidates", "No low-value candidates")
        } else {
            CheckResult::warn(
                "Low-Value Candidates",
                format!(
                    "{} low-value candidates (origin!=error, hit>=8, vio=0)",
                    low.len()
                ),
            )
            .with_details(low)
        }
    }
}

impl Dimension for Quality {
    fn id(&self) -> &'static str {
        "quality"
    }

    fn name(&self) -> &'static str {
        "Quality"
    }

    fn description(&self) -> &'static str {
        "Compliance, high-risk/hard-to-follow/low-value ratios"
    }

    fn evaluate(&self, ctx: &AuditContext) -> Vec<CheckResult> {
        let in_force = ctx.in_force();
        if in_force.is_empty() {
            return vec![CheckResult::warn("Active Rules", "No active rules found")];
        }

        let mut checks = vec![
            self.overall_compliance(&in_force),
            self.high_risk(&in_force),
            self.hard_to_follow(&in_force),
            self.low_value(&in_force),
        ];

        let live = ctx.live().len();
        if live > 0 {
            let protected = ctx.records.iter().filter(|r| r.status == Status::Protected).count();
            checks.push(CheckResult::pass(
                "Protected Ratio",
                format!(
                    "{protected}/{live} ({}) confirmed by user",
                    percent(protected as f64 / live as f64)
                ),
            ));
        }
        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::CheckLevel;
    use crate::store::Origin;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn record(id: &str, hit: i64, vio: i64, err: i64) -> RuleRecord {
        RuleRecord {
            hit,
            vio,
            err,
            ..RuleRecord::new(id)
        }
    }

    fn evaluate(records: Vec<RuleRecord>) -> Vec<CheckResult> {
        let ctx = AuditContext::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()).with_table(Vec::new(), records);
        Quality.evaluate(&ctx)
    }

    #[test]
    fn test_compliance_bands() {
        assert_eq!(evaluate(vec![record("R-001", 8, 2, 0)])[0].level, CheckLevel::Pass);
        assert_eq!(evaluate(vec![record("R-001", 7, 3, 0)])[0].level, CheckLevel::Warn);
        let fail = evaluate(vec![record("R-001", 5, 5, 0)]);
        assert_eq!(fail[0].level, CheckLevel::Fail);
        assert_eq!(fail[0].message, "50% (hit:5 vio:5)");
        assert_eq!(evaluate(vec![record("R-001", 0, 0, 0)])[0].level, CheckLevel::Warn);
    }

    #[test]
    fn test_high_risk_share() {
        let mut rows: Vec<RuleRecord> = (1..=5).map(|i| record(&format!("R-00{i}"), 5, 0, 0)).collect();
        rows.push(record("R-009", 0, 4, 2));
        let warn = evaluate(rows.clone());
        assert_eq!(warn[1].level, CheckLevel::Warn);
        assert_eq!(warn[1].details, vec!["R-009 (danger 50%)"]);

        rows.truncate(1);
        rows.push(record("R-009", 0, 4, 2));
        assert_eq!(evaluate(rows)[1].level, CheckLevel::Fail);
    }

    #[test]
    fn test_hard_low_value_and_protected() {
        let mut protected = record("R-002", 9, 0, 0);
        protected.origin = Origin::Preventive;
        protected.status = Status::Protected;
        let checks = evaluate(vec![record("R-001", 3, 3, 0), protected]);
        assert_eq!(checks[2].details, vec!["R-001 (compliance 50%)"]);
        assert_eq!(checks[3].details, vec!["R-002 (preventive, hit:9)"]);
        assert_eq!(checks[4].message, "1/2 (50%) confirmed by user");
        assert_eq!(checks[4].level, CheckLevel::Pass);
    }
}
