use super::context::AuditContext;
use super::engine::DimensionRegistry;
use super::types::{DimensionReport, HealthReport};

/// Builder for constructing health reports
pub struct HealthReportBuilder {
    ctx: AuditContext,
    dimensions: Vec<DimensionReport>,
}

impl HealthReportBuilder {
    /// Create a new builder over a loaded audit context
    pub fn new(ctx: AuditContext) -> Self {
        Self {
            ctx,
            dimensions: Vec::new(),
        }
    }

    pub fn context(&self) -> &AuditContext {
        &self.ctx
    }

    /// Run every dimension of the registry and collect the reports
    pub fn run(&mut self, registry: &DimensionRegistry) -> &mut Self {
        let reports = registry.evaluate_all(&self.ctx);
        self.dimensions.extend(reports);
        self
    }

    /// Build the final report
    pub fn build(self) -> HealthReport {
        HealthReport::new(self.dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{CheckLevel, Grade};
    use crate::store::RuleRecord;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
    }

    #[test]
    fn test_builder_empty_report() {
        let report = HealthReportBuilder::new(AuditContext::new(today())).build();
        assert_eq!(report.dimensions.len(), 0);
        assert_eq!(report.score, 0.0);
        assert_eq!(report.grade, Grade::F);
    }

    #[test]
    fn test_builder_missing_project() {
        let mut builder = HealthReportBuilder::new(AuditContext::new(today()));
        builder.run(&DimensionRegistry::with_default_dimensions());
        let report = builder.build();

        assert_eq!(report.dimensions.len(), 6);
        let fails = report.findings(CheckLevel::Fail);
        assert!(fails.iter().any(|f| f.check.name == "File Presence"));
        assert!(fails.iter().any(|f| f.check.name == "EVOLVE.md Presence"));
    }

    #[test]
    fn test_builder_healthy_rules_score_high() {
        let records: Vec<RuleRecord> = ["frontend", "backend", "ops", "docs", "infra"]
            .iter()
            .enumerate()
            .map(|(i, scope)| RuleRecord {
                scope: scope.to_string(),
                title: format!("Rule {i}"),
                hit: 4,
                vio: 1,
                last_reviewed: "2026-05-19".to_string(),
                ..RuleRecord::new(format!("R-00{}", i + 1))
            })
            .collect();
        let canonical: String = records
            .iter()
            .map(|r| format!("- [{}] {}  {}\n", r.rule_id, r.title, r.stats_tag()))
            .collect();
        let ctx = AuditContext::new(today())
            .with_table(
                crate::store::TABLE_HEADER.iter().map(|h| h.to_string()).collect(),
                records,
            )
            .with_canonical(format!("## TL;DR\n- ok\n\n## Rules\n{canonical}"));

        let mut builder = HealthReportBuilder::new(ctx);
        builder.run(&DimensionRegistry::with_default_dimensions());
        let report = builder.build();

        assert!(report.findings(CheckLevel::Fail).is_empty(), "{:#?}", report.findings(CheckLevel::Fail));
        assert!(report.score >= 90.0, "score {}", report.score);
        assert_eq!(report.grade, Grade::A);
    }
}
