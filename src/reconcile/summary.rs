use serde::Serialize;

use crate::document::Document;
use crate::metrics::{
    compliance, danger, is_frequent_violation, is_hard_to_follow, is_high_risk, percent,
};
use crate::store::RuleRecord;

/// Predicate that earned a rule a line in `## TL;DR`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    FrequentViolation,
    HighRisk,
    HardToFollow,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 3] = [
        AnnotationKind::FrequentViolation,
        AnnotationKind::HighRisk,
        AnnotationKind::HardToFollow,
    ];

    pub fn applies(&self, record: &RuleRecord) -> bool {
        match self {
            AnnotationKind::FrequentViolation => is_frequent_violation(record),
            AnnotationKind::HighRisk => is_high_risk(record),
            AnnotationKind::HardToFollow => is_hard_to_follow(record),
        }
    }

    pub fn render(&self, record: &RuleRecord) -> String {
        let (id, scope) = (&record.rule_id, &record.scope);
        let cr = percent(compliance(record).unwrap_or(0.0));
        match self {
            AnnotationKind::FrequentViolation => {
                format!("- ⚠️ **Frequent violation** [{id}] [{scope}]: compliance {cr}, needs focused attention")
            }
            AnnotationKind::HighRisk => {
                let dr = percent(danger(record).unwrap_or(0.0));
                format!("- 🚨 **High risk** [{id}] [{scope}]: danger {dr}, violations very likely cause errors")
            }
            AnnotationKind::HardToFollow => {
                format!("- 🔧 **Needs rewrite** [{id}] [{scope}]: compliance {cr}, important but hard to follow")
            }
        }
    }
}

/// Line prepended to the summary section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryAnnotation {
    pub rule_id: String,
    pub kind: AnnotationKind,
    pub line: String,
}

/// Rules among `records` that should be called out in `## TL;DR`, one
/// entry per matching predicate. Only active and protected rules count.
pub fn expected_annotations(records: &[RuleRecord]) -> Vec<SummaryAnnotation> {
    let in_force: Vec<&RuleRecord> = records.iter().filter(|r| r.status.is_in_force()).collect();
    AnnotationKind::ALL
        .into_iter()
        .flat_map(|kind| {
            in_force
                .iter()
                .filter(move |record| kind.applies(record))
                .map(move |record| SummaryAnnotation {
                    rule_id: record.rule_id.clone(),
                    kind,
                    line: kind.render(record),
                })
        })
        .collect()
}

/// Prepend annotation lines for qualifying rules not yet referenced by id
/// in `## TL;DR`. References are checked against the section as it was
/// before this pass, so one rule can gain up to three lines at once.
pub fn annotate_summary(doc: &mut Document, records: &[RuleRecord]) -> Vec<SummaryAnnotation> {
    let Some(summary) = doc.section_mut("TL;DR") else {
        return Vec::new();
    };
    let added: Vec<SummaryAnnotation> = expected_annotations(records)
        .into_iter()
        .filter(|a| !summary.contains(&format!("[{}]", a.rule_id)))
        .collect();

    let text: String = added.iter().map(|a| format!("{}\n", a.line)).collect();
    summary.prepend_text(&text);
    added
}
