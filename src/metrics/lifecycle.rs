use serde::{Deserialize, Serialize};

use super::is_low_value_candidate;
use crate::store::{RuleRecord, Status};

/// Which threshold names the reason when both skip thresholds are crossed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipPrecedence {
    #[default]
    Manual,
    Auto,
}

/// Why a rule was moved to review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewReason {
    Skip,
    AutoSkip,
}

impl ReviewReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewReason::Skip => "skip",
            ReviewReason::AutoSkip => "auto_skip",
        }
    }
}

/// Thresholds driving status transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecyclePolicy {
    pub manual_skip_threshold: i64,
    pub auto_skip_threshold: i64,
    pub low_value_min_hit: i64,
    pub precedence: SkipPrecedence,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            manual_skip_threshold: 5,
            auto_skip_threshold: 8,
            low_value_min_hit: 8,
            precedence: SkipPrecedence::Manual,
        }
    }
}

impl LifecyclePolicy {
    /// Reason to send an active rule to review, if any threshold is crossed.
    pub fn review_reason(&self, record: &RuleRecord) -> Option<ReviewReason> {
        let manual = record.skip >= self.manual_skip_threshold;
        let auto = record.auto_skip >= self.auto_skip_threshold;
        match (manual, auto, self.precedence) {
            (true, true, SkipPrecedence::Auto) => Some(ReviewReason::AutoSkip),
            (true, _, _) => Some(ReviewReason::Skip),
            (false, true, _) => Some(ReviewReason::AutoSkip),
            (false, false, _) => None,
        }
    }
}

/// What a lifecycle pass changed or flagged
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransitionReport {
    pub reviewed: Vec<(String, ReviewReason)>,
    /// Reported for human confirmation; status is left unchanged.
    pub low_value: Vec<String>,
}

impl TransitionReport {
    pub fn is_empty(&self) -> bool {
        self.reviewed.is_empty() && self.low_value.is_empty()
    }
}

/// Apply status transitions to `active` rows. Protected, review and archived
/// rows never move on their own.
pub fn apply_transitions(records: &mut [RuleRecord], policy: &LifecyclePolicy) -> TransitionReport {
    let mut report = TransitionReport::default();
    for record in records.iter_mut().filter(|r| r.status == Status::Active) {
        if let Some(reason) = policy.review_reason(record) {
            record.status = Status::Review;
            report.reviewed.push((record.rule_id.clone(), reason));
        } else if is_low_value_candidate(record, policy.low_value_min_hit) {
            report.low_value.push(record.rule_id.clone());
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Origin;

    fn row(id: &str, skip: i64, auto_skip: i64) -> RuleRecord {
        RuleRecord {
            skip,
            auto_skip,
            ..RuleRecord::new(id)
        }
    }

    #[test]
    fn test_manual_skip_moves_to_review() {
        let mut rows = vec![row("R-001", 5, 0)];
        let report = apply_transitions(&mut rows, &LifecyclePolicy::default());
        assert_eq!(rows[0].status, Status::Review);
        assert_eq!(report.reviewed, vec![("R-001".to_string(), ReviewReason::Skip)]);
    }

    #[test]
    fn test_auto_skip_moves_to_review() {
        let mut rows = vec![row("R-001", 4, 8)];
        let report = apply_transitions(&mut rows, &LifecyclePolicy::default());
        assert_eq!(report.reviewed[0].1, ReviewReason::AutoSkip);
    }

    #[test]
    fn test_precedence_when_both_crossed() {
        let mut rows = vec![row("R-001", 6, 9)];
        let report = apply_transitions(&mut rows, &LifecyclePolicy::default());
        assert_eq!(report.reviewed[0].1, ReviewReason::Skip);

        let mut rows = vec![row("R-001", 6, 9)];
        let policy = LifecyclePolicy {
            precedence: SkipPrecedence::Auto,
            ..LifecyclePolicy::default()
        };
        let report = apply_transitions(&mut rows, &policy);
        assert_eq!(report.reviewed[0].1, ReviewReason::AutoSkip);
    }

    #[test]
    fn test_protected_and_archived_never_move() {
        let mut rows = vec![row("R-001", 9, 9), row("R-002", 9, 9)];
        rows[0].status = Status::Protected;
        rows[1].status = Status::Archived;
        let report = apply_transitions(&mut rows, &LifecyclePolicy::default());
        assert!(report.is_empty());
        assert_eq!(rows[0].status, Status::Protected);
        assert_eq!(rows[1].status, Status::Archived);
    }

    #[test]
    fn test_low_value_reported_not_archived() {
        let mut rows = vec![RuleRecord {
            hit: 9,
            origin: Origin::Imported,
            ..RuleRecord::new("R-007")
        }];
        let report = apply_transitions(&mut rows, &LifecyclePolicy::default());
        assert_eq!(report.low_value, vec!["R-007"]);
        assert_eq!(rows[0].status, Status::Active);
    }
}
