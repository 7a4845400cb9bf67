use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::platform::{is_platform_lesson, PLATFORM_ALL};

/// Fixed column order of the record table.
pub const TABLE_HEADER: [&str; 13] = [
    "rule_id",
    "platform",
    "scope",
    "title",
    "origin",
    "hit",
    "vio",
    "err",
    "skip",
    "auto_skip",
    "last_reviewed",
    "status",
    "evolve_slot",
];

/// Columns a table must carry to count as complete. `evolve_slot` is a
/// later addition and its absence is tolerated.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "rule_id",
    "platform",
    "scope",
    "title",
    "origin",
    "hit",
    "vio",
    "err",
    "skip",
    "auto_skip",
    "last_reviewed",
    "status",
];

/// Provenance of a rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Origin {
    #[default]
    Error,
    Preventive,
    Imported,
    /// Unrecognized value, kept verbatim so it round-trips and can be audited.
    Other(String),
}

impl Origin {
    pub fn as_str(&self) -> &str {
        match self {
            Origin::Error => "error",
            Origin::Preventive => "preventive",
            Origin::Imported => "imported",
            Origin::Other(raw) => raw,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Origin::Other(_))
    }
}

impl From<&str> for Origin {
    fn from(raw: &str) -> Self {
        match raw {
            "error" => Origin::Error,
            "preventive" => Origin::Preventive,
            "imported" => Origin::Imported,
            other => Origin::Other(other.to_string()),
        }
    }
}

impl From<String> for Origin {
    fn from(raw: String) -> Self {
        Origin::from(raw.as_str())
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.as_str().to_string()
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    Active,
    Protected,
    Review,
    Archived,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Active => "active",
            Status::Protected => "protected",
            Status::Review => "review",
            Status::Archived => "archived",
            Status::Other(raw) => raw,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Status::Other(_))
    }

    /// Active or protected: the rules that are currently in force.
    pub fn is_in_force(&self) -> bool {
        matches!(self, Status::Active | Status::Protected)
    }
}

impl From<&str> for Status {
    fn from(raw: &str) -> Self {
        match raw {
            "active" => Status::Active,
            "protected" => Status::Protected,
            "review" => Status::Review,
            "archived" => Status::Archived,
            other => Status::Other(other.to_string()),
        }
    }
}

impl From<String> for Status {
    fn from(raw: String) -> Self {
        Status::from(raw.as_str())
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the record table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub rule_id: String,
    pub platform: String,
    pub scope: String,
    pub title: String,
    pub origin: Origin,
    pub hit: i64,
    pub vio: i64,
    pub err: i64,
    pub skip: i64,
    pub auto_skip: i64,
    pub last_reviewed: String,
    pub status: Status,
    pub evolve_slot: i64,
}

impl Default for RuleRecord {
    fn default() -> Self {
        Self {
            rule_id: String::new(),
            platform: PLATFORM_ALL.to_string(),
            scope: String::new(),
            title: String::new(),
            origin: Origin::default(),
            hit: 0,
            vio: 0,
            err: 0,
            skip: 0,
            auto_skip: 0,
            last_reviewed: String::new(),
            status: Status::default(),
            evolve_slot: 0,
        }
    }
}

impl RuleRecord {
    pub fn new(rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            ..Default::default()
        }
    }

    pub fn is_platform_lesson(&self) -> bool {
        is_platform_lesson(&self.rule_id)
    }

    pub fn is_archived(&self) -> bool {
        self.status == Status::Archived
    }

    /// Parsed `last_reviewed`, if it is a valid ISO date.
    pub fn reviewed_on(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.last_reviewed.trim(), "%Y-%m-%d").ok()
    }

    /// Top-level scope segment (`frontend/react` -> `frontend`).
    pub fn top_scope(&self) -> &str {
        self.scope.split('/').next().unwrap_or("").trim()
    }

    /// The `{hit:N vio:N err:N}` stats tag, backticks included.
    pub fn stats_tag(&self) -> String {
        format!("`{{hit:{} vio:{} err:{}}}`", self.hit, self.vio, self.err)
    }

    /// Field values in [`TABLE_HEADER`] order.
    pub fn to_fields(&self) -> [String; 13] {
        [
            self.rule_id.clone(),
            self.platform.clone(),
            self.scope.clone(),
            self.title.clone(),
            self.origin.to_string(),
            self.hit.to_string(),
            self.vio.to_string(),
            self.err.to_string(),
            self.skip.to_string(),
            self.auto_skip.to_string(),
            self.last_reviewed.clone(),
            self.status.to_string(),
            self.evolve_slot.to_string(),
        ]
    }
}
