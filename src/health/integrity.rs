use std::collections::BTreeMap;

use super::{capped, AuditContext, CheckResult, Dimension};
use crate::store::{Origin, RuleRecord, PLATFORM_ALL, REQUIRED_COLUMNS};

/// Field validity, uniqueness and counter consistency of the record table
pub struct DataIntegrity;

fn counters(record: &RuleRecord) -> [(&'static str, i64); 5] {
    [
        ("hit", record.hit),
        ("vio", record.vio),
        ("err", record.err),
        ("skip", record.skip),
        ("auto_skip", record.auto_skip),
    ]
}

impl Dimension for DataIntegrity {
    fn id(&self) -> &'static str {
        "integrity"
    }

    fn name(&self) -> &'static str {
        "Data Integrity"
    }

    fn description(&self) -> &'static str {
        "CSV field validity, uniqueness, and logical consistency"
    }

    fn evaluate(&self, ctx: &AuditContext) -> Vec<CheckResult> {
        let mut checks = Vec::new();
        if !ctx.table_present {
            checks.push(CheckResult::fail("File Presence", "audit.csv is missing"));
            return checks;
        }
        if let Some(error) = &ctx.table_error {
            checks.push(CheckResult::fail(
                "File Presence",
                format!("audit.csv could not be parsed: {error}"),
            ));
            return checks;
        }
        let rows = &ctx.records;
        checks.push(CheckResult::pass(
            "File Presence",
            format!("audit.csv exists ({} rows)", rows.len()),
        ));

        let mut missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !ctx.headers.iter().any(|h| h == col))
            .collect();
        missing.sort_unstable();
        checks.push(if missing.is_empty() {
            CheckResult::pass("CSV Header Completeness", "CSV header is complete")
        } else {
            CheckResult::warn(
                "CSV Header Completeness",
                format!("Missing fields: {} (run sync to auto-fill)", missing.join(", ")),
            )
        });

        if rows.is_empty() {
            checks.push(CheckResult::warn("Non-Empty Data", "audit.csv is empty; no rules recorded yet"));
            return checks;
        }

        let mut occurrences: BTreeMap<&str, usize> = BTreeMap::new();
        for r in rows {
            *occurrences.entry(r.rule_id.as_str()).or_default() += 1;
        }
        let duplicates: Vec<(&str, usize)> = occurrences.into_iter().filter(|(_, n)| *n > 1).collect();
        checks.push(if duplicates.is_empty() {
            CheckResult::pass(
                "Unique rule_id",
                format!("All {} rule_id values are unique", rows.len()),
            )
        } else {
            let ids: Vec<&str> = duplicates.iter().map(|(id, _)| *id).collect();
            CheckResult::fail(
                "Unique rule_id",
                format!("Duplicate rule_id found: {}", ids.join(", ")),
            )
            .with_details(
                duplicates
                    .iter()
                    .map(|(id, n)| format!("{id} appears {n} times"))
                    .collect(),
            )
        });

        let bad_origins: Vec<String> = rows
            .iter()
            .filter(|r| !r.origin.is_valid())
            .map(|r| format!("{} -> {}", r.rule_id, r.origin))
            .collect();
        checks.push(if bad_origins.is_empty() {
            CheckResult::pass("Valid origin", "All origin values are valid")
        } else {
            CheckResult::fail(
                "Valid origin",
                format!("{} rules have invalid origin values", bad_origins.len()),
            )
            .with_details(capped(bad_origins))
        });

        let bad_status: Vec<String> = rows
            .iter()
            .filter(|r| !r.status.is_valid())
            .map(|r| r.rule_id.clone())
            .collect();
        checks.push(if bad_status.is_empty() {
            CheckResult::pass("Valid status", "All status values are valid")
        } else {
            CheckResult::fail(
                "Valid status",
                format!("{} rules have invalid status values", bad_status.len()),
            )
            .with_details(capped(bad_status))
        });

        let negative: Vec<String> = rows
            .iter()
            .flat_map(|r| {
                counters(r)
                    .into_iter()
                    .filter(|(_, v)| *v < 0)
                    .map(move |(field, v)| format!("{}.{field}={v}", r.rule_id))
            })
            .collect();
        checks.push(if negative.is_empty() {
            CheckResult::pass("Non-Negative Counters", "All counter fields are non-negative")
        } else {
            CheckResult::fail("Non-Negative Counters", "Negative values found").with_details(capped(negative))
        });

        let err_gt_vio: Vec<String> = rows
            .iter()
            .filter(|r| r.err > r.vio)
            .map(|r| format!("{}(err:{} > vio:{})", r.rule_id, r.err, r.vio))
            .collect();
        checks.push(if err_gt_vio.is_empty() {
            CheckResult::pass("err <= vio", "All rows satisfy err <= vio")
        } else {
            CheckResult::fail("err <= vio", "err is a subset of vio and must not exceed vio")
                .with_details(capped(err_gt_vio))
        });

        let no_baseline: Vec<String> = rows
            .iter()
            .filter(|r| r.origin == Origin::Error && r.vio == 0 && r.err == 0 && !r.is_archived())
            .map(|r| r.rule_id.clone())
            .collect();
        checks.push(if no_baseline.is_empty() {
            CheckResult::pass(
                "error Baseline",
                "All origin=error rules have non-zero initial vio/err history",
            )
        } else {
            CheckResult::warn(
                "error Baseline",
                format!(
                    "{} origin=error rules still have vio=0 and err=0 (baseline may be incorrect)",
                    no_baseline.len()
                ),
            )
            .with_details(capped(no_baseline))
        });

        let weak_platform: Vec<String> = rows
            .iter()
            .filter(|r| r.is_platform_lesson() && r.platform == PLATFORM_ALL)
            .map(|r| r.rule_id.clone())
            .collect();
        checks.push(if weak_platform.is_empty() {
            CheckResult::pass(
                "Platform Tag Completeness",
                "All platform lessons have explicit platform tags",
            )
        } else {
            CheckResult::warn(
                "Platform Tag Completeness",
                format!(
                    "{} platform lessons still use platform=all; specify claude/gemini/codex/cursor",
                    weak_platform.len()
                ),
            )
            .with_details(capped(weak_platform))
        });

        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::CheckLevel;
    use crate::store::{Status, TABLE_HEADER};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn ctx_with(records: Vec<RuleRecord>) -> AuditContext {
        let headers = TABLE_HEADER.iter().map(|h| h.to_string()).collect();
        AuditContext::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()).with_table(headers, records)
    }

    fn healthy(id: &str) -> RuleRecord {
        RuleRecord {
            vio: 1,
            ..RuleRecord::new(id)
        }
    }

    fn level_of(checks: &[CheckResult], name: &str) -> CheckLevel {
        checks
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.level)
            .unwrap_or_else(|| panic!("missing check {name}"))
    }

    #[test]
    fn test_missing_table_fails_alone() {
        let ctx = AuditContext::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        let checks = DataIntegrity.evaluate(&ctx);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].level, CheckLevel::Fail);
    }

    #[test]
    fn test_healthy_table_passes() {
        let checks = DataIntegrity.evaluate(&ctx_with(vec![healthy("R-001"), healthy("R-002")]));
        assert_eq!(checks.len(), 9);
        assert!(checks.iter().all(|c| c.level == CheckLevel::Pass), "{checks:#?}");
    }

    #[test]
    fn test_err_above_vio_fails() {
        let mut bad = healthy("R-001");
        bad.err = 3;
        let checks = DataIntegrity.evaluate(&ctx_with(vec![bad]));
        let check = checks.iter().find(|c| c.name == "err <= vio").unwrap();
        assert_eq!(check.level, CheckLevel::Fail);
        assert_eq!(check.details, vec!["R-001(err:3 > vio:1)"]);
    }

    #[test]
    fn test_duplicates_and_enums() {
        let mut odd = healthy("R-001");
        odd.origin = Origin::from("guess");
        odd.status = Status::from("zombie");
        let checks = DataIntegrity.evaluate(&ctx_with(vec![healthy("R-001"), odd]));
        assert_eq!(level_of(&checks, "Unique rule_id"), CheckLevel::Fail);
        assert_eq!(level_of(&checks, "Valid origin"), CheckLevel::Fail);
        assert_eq!(level_of(&checks, "Valid status"), CheckLevel::Fail);
        let dup = checks.iter().find(|c| c.name == "Unique rule_id").unwrap();
        assert_eq!(dup.details, vec!["R-001 appears 2 times"]);
    }

    #[test]
    fn test_baseline_and_platform_warnings() {
        let lesson = RuleRecord {
            platform: PLATFORM_ALL.to_string(),
            ..RuleRecord::new("S-001")
        };
        let mut missing_headers = ctx_with(vec![lesson]);
        missing_headers.headers.retain(|h| h != "title");
        let checks = DataIntegrity.evaluate(&missing_headers);
        assert_eq!(level_of(&checks, "CSV Header Completeness"), CheckLevel::Warn);
        assert_eq!(level_of(&checks, "error Baseline"), CheckLevel::Warn);
        assert_eq!(level_of(&checks, "Platform Tag Completeness"), CheckLevel::Warn);
    }

    #[test]
    fn test_empty_table_warns() {
        let checks = DataIntegrity.evaluate(&ctx_with(Vec::new()));
        assert_eq!(checks.last().map(|c| c.level), Some(CheckLevel::Warn));
        assert_eq!(checks.len(), 3);
    }
}
