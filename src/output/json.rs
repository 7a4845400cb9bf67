use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::health::{CheckLevel, DimensionReport, Finding, Grade, HealthReport};

/// Serialized shape of a health report
#[derive(Debug, Serialize)]
struct HealthJson<'a> {
    report_id: &'a str,
    generated_at: &'a str,
    score: f64,
    grade: Grade,
    dimensions: &'a [DimensionReport],
    fails: Vec<Finding>,
    warns: Vec<Finding>,
}

impl<'a> From<&'a HealthReport> for HealthJson<'a> {
    fn from(report: &'a HealthReport) -> Self {
        Self {
            report_id: &report.report_id,
            generated_at: &report.generated_at,
            score: (report.score * 10.0).round() / 10.0,
            grade: report.grade,
            dimensions: &report.dimensions,
            fails: report.findings(CheckLevel::Fail),
            warns: report.findings(CheckLevel::Warn),
        }
    }
}

fn to_json(report: &HealthReport) -> Result<String> {
    serde_json::to_string_pretty(&HealthJson::from(report)).context("Failed to serialize health report to JSON")
}

/// Render a health report as pretty-printed JSON
pub fn render_health_json(out: &mut dyn Write, report: &HealthReport) -> Result<()> {
    let json = to_json(report)?;
    writeln!(out, "{json}").context("Failed to write health report")?;
    Ok(())
}

/// Write a health report to a JSON file
pub fn write_health_report(report: &HealthReport, path: &Path) -> Result<()> {
    let json = to_json(report)?;
    std::fs::write(path, &json).with_context(|| format!("Failed to write report to {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::CheckResult;
    use tempfile::NamedTempFile;

    fn test_report() -> HealthReport {
        let mut report = HealthReport::new(vec![DimensionReport {
            dimension: "Data Integrity".to_string(),
            description: "CSV field validity".to_string(),
            checks: vec![
                CheckResult::pass("File Presence", "audit.csv exists (3 rows)"),
                CheckResult::fail("err <= vio", "err must not exceed vio").with_details(vec!["R-001".to_string()]),
                CheckResult::warn("error Baseline", "1 rule without baseline"),
            ],
        }]);
        report.report_id = "test-id".to_string();
        report
    }

    #[test]
    fn test_write_report_creates_file() {
        let report = test_report();
        let temp = NamedTempFile::new().unwrap();

        write_health_report(&report, temp.path()).unwrap();

        let content = std::fs::read_to_string(temp.path()).unwrap();
        assert!(!content.is_empty());
        // Pretty printed JSON has newlines
        assert!(content.contains('\n'));
    }

    #[test]
    fn test_health_json_shape() {
        let mut out = Vec::new();
        render_health_json(&mut out, &test_report()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["report_id"], "test-id");
        assert_eq!(value["score"], 50.0);
        assert_eq!(value["grade"], "D (Poor)");
        assert_eq!(value["dimensions"][0]["summary"], "1P / 1W / 1F");
        assert_eq!(value["fails"][0]["dimension"], "Data Integrity");
        assert_eq!(value["fails"][0]["level"], "FAIL");
        assert_eq!(value["fails"][0]["details"][0], "R-001");
        assert_eq!(value["warns"][0]["name"], "error Baseline");
    }
}
