//! Derived metrics over a rule's counters, the status lifecycle, and the
//! ranked curation suggestions built on top of them.

mod lifecycle;
mod suggestions;

pub use lifecycle::{
    apply_transitions, LifecyclePolicy, ReviewReason, SkipPrecedence, TransitionReport,
};
pub use suggestions::{build_suggestions, Suggestion, SuggestionReason};

use crate::store::{Origin, RuleRecord, Status};

/// `hit / (hit + vio)`, undefined when the rule was never exercised.
pub fn compliance(record: &RuleRecord) -> Option<f64> {
    let total = record.hit + record.vio;
    if total == 0 {
        return None;
    }
    Some(record.hit as f64 / total as f64)
}

/// `err / vio`, undefined without violations.
pub fn danger(record: &RuleRecord) -> Option<f64> {
    if record.vio == 0 {
        return None;
    }
    Some(record.err as f64 / record.vio as f64)
}

pub fn activity(record: &RuleRecord) -> i64 {
    record.hit + record.vio
}

/// Ranking score used for curation suggestions.
pub fn recommendation_score(record: &RuleRecord) -> f64 {
    let mut score = record.err as f64 * 8.0 + record.vio as f64 * 3.0;
    if let Some(cr) = compliance(record) {
        score += (1.0 - cr) * 4.0;
    }
    if let Some(dr) = danger(record) {
        score += dr * 3.0;
    }
    if record.status == Status::Review {
        score += 2.0;
    }
    score + (activity(record) as f64).min(10.0) * 0.2
}

/// `vio >= 3` with compliance under 50%.
pub fn is_frequent_violation(record: &RuleRecord) -> bool {
    record.vio >= 3 && compliance(record).is_some_and(|cr| cr < 0.5)
}

/// `err >= 2` with danger of at least 50%.
pub fn is_high_risk(record: &RuleRecord) -> bool {
    record.err >= 2 && danger(record).is_some_and(|dr| dr >= 0.5)
}

/// Followed often and violated often: the wording probably needs a rewrite.
pub fn is_hard_to_follow(record: &RuleRecord) -> bool {
    record.hit >= 3 && record.vio >= 3
}

/// Frequently followed, never violated, and not born from a real error.
/// Only ever reported; archival needs a human decision.
pub fn is_low_value_candidate(record: &RuleRecord, min_hit: i64) -> bool {
    record.hit >= min_hit && record.vio == 0 && record.err == 0 && record.origin != Origin::Error
}

/// Clear and reliably followed.
pub fn is_good_practice(record: &RuleRecord) -> bool {
    record.hit >= 3 && record.vio == 0 && record.hit < 8
}

/// Format a ratio as a whole percentage (`0.2857` -> `29%`).
pub fn percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hit: i64, vio: i64, err: i64) -> RuleRecord {
        RuleRecord {
            hit,
            vio,
            err,
            ..RuleRecord::new("R-001")
        }
    }

    #[test]
    fn test_compliance_undefined_without_activity() {
        assert!(compliance(&record(0, 0, 0)).is_none());
        assert_eq!(compliance(&record(3, 1, 0)), Some(0.75));
    }

    #[test]
    fn test_danger_undefined_without_violations() {
        assert!(danger(&record(5, 0, 0)).is_none());
        assert_eq!(danger(&record(0, 4, 1)), Some(0.25));
    }

    #[test]
    fn test_scenario_frequent_and_high_risk() {
        let r = record(2, 5, 3);
        let cr = compliance(&r).unwrap();
        assert!((cr - 0.2857).abs() < 0.001);
        assert_eq!(danger(&r), Some(0.6));
        assert!(is_frequent_violation(&r));
        assert!(is_high_risk(&r));
        assert!(!is_hard_to_follow(&r));
    }

    #[test]
    fn test_hard_to_follow() {
        assert!(is_hard_to_follow(&record(3, 3, 0)));
        assert!(!is_hard_to_follow(&record(2, 3, 0)));
    }

    #[test]
    fn test_low_value_candidate_excludes_error_origin() {
        let mut r = record(8, 0, 0);
        assert!(!is_low_value_candidate(&r, 8));
        r.origin = Origin::Preventive;
        assert!(is_low_value_candidate(&r, 8));
        r.vio = 1;
        assert!(!is_low_value_candidate(&r, 8));
    }

    #[test]
    fn test_recommendation_score() {
        // err*8 + vio*3 + (1-cr)*4 + dr*3 + min(activity,10)*0.2
        let r = record(2, 5, 3);
        let expected = 24.0 + 15.0 + (1.0 - 2.0 / 7.0) * 4.0 + 0.6 * 3.0 + 7.0 * 0.2;
        assert!((recommendation_score(&r) - expected).abs() < 1e-9);

        let mut review = record(0, 0, 0);
        review.status = Status::Review;
        assert_eq!(recommendation_score(&review), 2.0);

        assert!((recommendation_score(&record(20, 0, 0)) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(2.0 / 7.0), "29%");
        assert_eq!(percent(0.6), "60%");
    }
}
