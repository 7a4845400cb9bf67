use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

use super::platform::canonical_platform;
use super::record::{RuleRecord, Status};

/// Counter a scoring token can bump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreAction {
    Hit,
    Vio,
    Err,
    Skip,
}

impl ScoreAction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "hit" => Some(ScoreAction::Hit),
            "vio" => Some(ScoreAction::Vio),
            "err" => Some(ScoreAction::Err),
            "skip" => Some(ScoreAction::Skip),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreAction::Hit => "hit",
            ScoreAction::Vio => "vio",
            ScoreAction::Err => "err",
            ScoreAction::Skip => "skip",
        }
    }
}

/// Parsed one-line scoring input, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreCard {
    entries: Vec<(String, Vec<ScoreAction>)>,
}

impl ScoreCard {
    /// Parse `R-001:+hit R-003:+vio+err`.
    ///
    /// Tokens without `:` are ignored, unknown actions are dropped, and an id
    /// left with no valid action is skipped. A repeated id replaces the
    /// earlier entry.
    pub fn parse(input: &str) -> Self {
        let mut card = ScoreCard::default();
        for token in input.split_whitespace() {
            let Some((rule_id, actions)) = token.split_once(':') else {
                continue;
            };
            let actions: Vec<ScoreAction> = actions
                .split('+')
                .skip(1)
                .filter_map(|a| {
                    let word: String = a
                        .chars()
                        .take_while(|c| c.is_alphanumeric() || *c == '_')
                        .collect();
                    ScoreAction::parse(&word)
                })
                .collect();
            if actions.is_empty() {
                continue;
            }
            let rule_id = rule_id.trim().to_string();
            match card.entries.iter_mut().find(|(id, _)| *id == rule_id) {
                Some(entry) => entry.1 = actions,
                None => card.entries.push((rule_id, actions)),
            }
        }
        card
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, rule_id: &str) -> Option<&[ScoreAction]> {
        self.entries
            .iter()
            .find(|(id, _)| id == rule_id)
            .map(|(_, actions)| actions.as_slice())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &[ScoreAction])> {
        self.entries
            .iter()
            .map(|(id, actions)| (id.as_str(), actions.as_slice()))
    }
}

/// Scope-keyword and platform filter over rules
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleFilter {
    pub keywords: Vec<String>,
    pub platform: Option<String>,
}

impl RuleFilter {
    pub fn new(keywords: Vec<String>, platform: Option<&str>) -> Self {
        Self {
            keywords,
            platform: platform.map(canonical_platform),
        }
    }

    /// Split comma separated keyword arguments.
    pub fn parse_keywords<S: AsRef<str>>(args: &[S]) -> Vec<String> {
        args.iter()
            .flat_map(|arg| arg.as_ref().split(','))
            .map(str::trim)
            .filter(|kw| !kw.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Whether the filter constrains anything at all.
    pub fn is_active(&self) -> bool {
        !self.keywords.is_empty() || self.platform.is_some()
    }

    pub fn matches(&self, record: &RuleRecord) -> bool {
        !record.is_archived()
            && matches_platform(record, self.platform.as_deref())
            && (self.keywords.is_empty() || matches_scope(&record.scope, &self.keywords))
    }
}

/// Platform lessons match their own platform only; universal rules always match.
pub fn matches_platform(record: &RuleRecord, platform: Option<&str>) -> bool {
    match platform {
        None => true,
        Some(p) if record.is_platform_lesson() => record.platform == p,
        Some(_) => true,
    }
}

/// Case-insensitive substring match of any keyword against the scope.
pub fn matches_scope(scope: &str, keywords: &[String]) -> bool {
    let scope = scope.to_lowercase();
    keywords.iter().any(|kw| scope.contains(&kw.to_lowercase()))
}

/// Result of a scoring pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreOutcome {
    /// Ids that received explicit scores.
    pub updated: Vec<String>,
    /// Filter matches that were not scored and got `auto_skip + 1`.
    pub auto_skipped: Vec<String>,
    /// Scored ids that are not in the store.
    pub unknown: Vec<String>,
}

/// Apply a score card.
///
/// Scored rules get their counters bumped, `last_reviewed = today`, and
/// `auto_skip` reset. Active rules matched by an active filter but left
/// unscored get `auto_skip + 1`. Unknown ids are reported, never created.
pub fn apply_scores(
    records: &mut [RuleRecord],
    card: &ScoreCard,
    filter: &RuleFilter,
    today: NaiveDate,
) -> ScoreOutcome {
    let today = today.format("%Y-%m-%d").to_string();
    let mut outcome = ScoreOutcome::default();

    for record in records.iter_mut() {
        if let Some(actions) = card.get(&record.rule_id) {
            for action in actions {
                match action {
                    ScoreAction::Hit => record.hit += 1,
                    ScoreAction::Vio => record.vio += 1,
                    ScoreAction::Err => record.err += 1,
                    ScoreAction::Skip => record.skip += 1,
                }
            }
            record.last_reviewed = today.clone();
            record.auto_skip = 0;
            outcome.updated.push(record.rule_id.clone());
        } else if filter.is_active() && filter.matches(record) && record.status == Status::Active {
            record.auto_skip += 1;
            record.last_reviewed = today.clone();
            outcome.auto_skipped.push(record.rule_id.clone());
        }
    }

    let known: HashSet<&str> = records.iter().map(|r| r.rule_id.as_str()).collect();
    outcome.unknown = card
        .entries()
        .filter(|(id, _)| !known.contains(id))
        .map(|(id, _)| id.to_string())
        .collect();

    outcome
}
