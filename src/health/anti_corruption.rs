use super::{capped, AuditContext, CheckResult, Dimension};
use crate::store::RuleRecord;

/// Zero-touch rules, orphaned rules and logical anomalies
pub struct AntiCorruption;

fn untouched(record: &RuleRecord) -> bool {
    record.hit == 0 && record.vio == 0 && record.err == 0 && record.skip == 0 && record.auto_skip == 0
}

impl Dimension for AntiCorruption {
    fn id(&self) -> &'static str {
        "anti_corruption"
    }

    fn name(&self) -> &'static str {
        "Anti-Corruption"
    }

    fn description(&self) -> &'static str {
        "Zero-touch rules, orphan rules, and logical anomalies"
    }

    fn evaluate(&self, ctx: &AuditContext) -> Vec<CheckResult> {
        let in_force = ctx.in_force();
        let mut checks = Vec::new();

        let zero: Vec<String> = in_force
            .iter()
            .filter(|r| untouched(r))
            .map(|r| r.rule_id.clone())
            .collect();
        checks.push(if zero.is_empty() {
            CheckResult::pass("Zero-Touch Rules", "No zero-touch rules; all rules have audit activity")
        } else {
            CheckResult::warn(
                "Zero-Touch Rules",
                format!("{} rules were never touched (hit/vio/err/skip all zero)", zero.len()),
            )
            .with_details(capped(zero))
        });

        checks.push(match ctx.canonical.as_deref() {
            None => CheckResult::warn("Orphan Rules", "EVOLVE.md is missing; orphan check skipped"),
            Some(text) => {
                let orphans: Vec<String> = in_force
                    .iter()
                    .filter(|r| !text.contains(&format!("[{}]", r.rule_id)))
                    .map(|r| r.rule_id.clone())
                    .collect();
                if orphans.is_empty() {
                    CheckResult::pass("Orphan Rules", "No orphan rules")
                } else {
                    CheckResult::warn(
                        "Orphan Rules",
                        format!(
                            "{} active rules are missing in EVOLVE.md (possibly manually removed)",
                            orphans.len()
                        ),
                    )
                    .with_details(capped(orphans))
                }
            }
        });

        let corrupt: Vec<String> = ctx
            .records
            .iter()
            .filter(|r| r.err > r.vio)
            .map(|r| format!("{}(err:{} vio:{})", r.rule_id, r.err, r.vio))
            .collect();
        checks.push(if corrupt.is_empty() {
            CheckResult::pass("Data Corruption", "No logical inconsistency found")
        } else {
            CheckResult::fail(
                "Data Corruption",
                format!("{} rows have err > vio (logical inconsistency)", corrupt.len()),
            )
            .with_details(capped(corrupt))
        });

        let no_scope: Vec<String> = in_force
            .iter()
            .filter(|r| r.scope.trim().is_empty())
            .map(|r| r.rule_id.clone())
            .collect();
        checks.push(if no_scope.is_empty() {
            CheckResult::pass("Empty Scope", "All rules have scope tags")
        } else {
            CheckResult::warn(
                "Empty Scope",
                format!("{} rules are missing scope tags", no_scope.len()),
            )
            .with_details(no_scope)
        });

        let no_title: Vec<String> = in_force
            .iter()
            .filter(|r| r.title.trim().is_empty())
            .map(|r| r.rule_id.clone())
            .collect();
        checks.push(if no_title.is_empty() {
            CheckResult::pass("Empty Title", "All rules have title")
        } else {
            CheckResult::warn("Empty Title", format!("{} rules are missing title", no_title.len()))
                .with_details(no_title)
        });

        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::CheckLevel;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn rule(id: &str, hit: i64) -> RuleRecord {
        RuleRecord {
            scope: "ops".to_string(),
            title: "Keep it tidy".to_string(),
            hit,
            ..RuleRecord::new(id)
        }
    }

    fn context(records: Vec<RuleRecord>, canonical: &str) -> AuditContext {
        AuditContext::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
            .with_table(Vec::new(), records)
            .with_canonical(canonical)
    }

    #[test]
    fn test_clean_rules_pass() {
        let checks = AntiCorruption.evaluate(&context(vec![rule("R-001", 4)], "- [R-001] Keep it tidy"));
        assert_eq!(checks.len(), 5);
        assert!(checks.iter().all(|c| c.level == CheckLevel::Pass), "{checks:#?}");
    }

    #[test]
    fn test_anomalies_are_reported() {
        let mut broken = rule("R-002", 1);
        broken.err = 2;
        broken.scope.clear();
        broken.title = "  ".to_string();
        let checks = AntiCorruption.evaluate(&context(vec![rule("R-001", 0), broken], "- [R-001]"));

        assert_eq!(checks[0].details, vec!["R-001"]);
        assert_eq!(checks[1].details, vec!["R-002"]);
        assert_eq!(checks[2].level, CheckLevel::Fail);
        assert_eq!(checks[2].details, vec!["R-002(err:2 vio:0)"]);
        assert_eq!(checks[3].message, "1 rules are missing scope tags");
        assert_eq!(checks[4].message, "1 rules are missing title");
    }

    #[test]
    fn test_orphan_check_skipped_without_document() {
        let checks = AntiCorruption.evaluate(&context(vec![rule("R-001", 1)], ""));
        assert_eq!(checks[1].level, CheckLevel::Warn);
        assert_eq!(checks[1].message, "EVOLVE.md is missing; orphan check skipped");
    }
}
