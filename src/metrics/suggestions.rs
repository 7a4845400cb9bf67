use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use super::{compliance, danger, recommendation_score};
use crate::content::{RuleContentResolver, TraceLinks, TraceMap};
use crate::store::{RuleRecord, Status};

/// Why a rule is worth curating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionReason {
    HighRisk,
    FrequentViolation,
    PendingReview,
    StableGoodPractice,
    GeneralSignal,
}

impl SuggestionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionReason::HighRisk => "high-risk",
            SuggestionReason::FrequentViolation => "frequent-violation",
            SuggestionReason::PendingReview => "pending-review",
            SuggestionReason::StableGoodPractice => "stable-good-practice",
            SuggestionReason::GeneralSignal => "general-signal",
        }
    }
}

impl fmt::Display for SuggestionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranked candidate for the curated rule subset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub rule_id: String,
    pub scope: String,
    pub title: String,
    pub content: String,
    pub hit: i64,
    pub vio: i64,
    pub err: i64,
    pub status: Status,
    pub evolve_slot: i64,
    pub score: f64,
    pub reasons: Vec<SuggestionReason>,
    pub trace: TraceLinks,
}

fn reasons_for(record: &RuleRecord) -> Vec<SuggestionReason> {
    let mut reasons = Vec::new();
    if record.err >= 2 && danger(record).is_some_and(|dr| dr >= 0.5) {
        reasons.push(SuggestionReason::HighRisk);
    }
    if record.vio >= 3 && compliance(record).is_some_and(|cr| cr < 0.5) {
        reasons.push(SuggestionReason::FrequentViolation);
    }
    if record.status == Status::Review {
        reasons.push(SuggestionReason::PendingReview);
    }
    if record.hit >= 3 && record.vio == 0 && record.err == 0 {
        reasons.push(SuggestionReason::StableGoodPractice);
    }
    if reasons.is_empty() {
        reasons.push(SuggestionReason::GeneralSignal);
    }
    reasons
}

/// Rank non-archived rules that have readable content.
///
/// Content comes from the resolver, falling back to the title; rules with
/// neither are left out. Ordered by score, then `err`, `vio`, `hit` and id,
/// all descending.
pub fn build_suggestions(
    records: &[RuleRecord],
    resolver: &RuleContentResolver,
    traces: &TraceMap,
    limit: usize,
) -> Vec<Suggestion> {
    let mut candidates: Vec<Suggestion> = records
        .iter()
        .filter(|r| !r.is_archived())
        .filter_map(|record| {
            let content = resolver
                .content(&record.rule_id)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| record.title.trim());
            if content.is_empty() {
                return None;
            }
            Some(Suggestion {
                rule_id: record.rule_id.clone(),
                scope: record.scope.clone(),
                title: record.title.clone(),
                content: content.to_string(),
                hit: record.hit,
                vio: record.vio,
                err: record.err,
                status: record.status.clone(),
                evolve_slot: record.evolve_slot,
                score: recommendation_score(record),
                reasons: reasons_for(record),
                trace: traces.get(&record.rule_id).cloned().unwrap_or_default(),
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(b.err.cmp(&a.err))
            .then(b.vio.cmp(&a.vio))
            .then(b.hit.cmp(&a.hit))
            .then_with(|| b.rule_id.cmp(&a.rule_id))
    });
    candidates.truncate(limit);
    candidates
}
