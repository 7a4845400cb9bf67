use chrono::NaiveDate;
use tracing::warn;

use crate::config::{PlatformTargets, ProjectLayout, AUDIT_TABLE, CANONICAL_DOC};
use crate::content::{RuleContentResolver, TraceLinker};
use crate::document::{Document, RegionKind};
use crate::platform::PlatformSyncEngine;
use crate::store::{RuleRecord, RuleStore};

/// What a platform target file holds for its platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockState {
    MissingFile,
    MissingBlock,
    MissingDigest,
    Present { current: String, expected: String },
}

/// A discovered platform target and the state of its block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformState {
    pub platform: String,
    pub path: String,
    pub state: BlockState,
}

/// Context passed to dimensions for evaluation
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub today: NaiveDate,
    /// Display path of the record table
    pub table_path: String,
    pub table_present: bool,
    /// Parse failure of an existing table
    pub table_error: Option<String>,
    pub headers: Vec<String>,
    pub records: Vec<RuleRecord>,
    /// Display path of the canonical document
    pub canonical_path: String,
    /// Canonical document text; `None` when missing or empty
    pub canonical: Option<String>,
    pub platforms: Vec<PlatformState>,
}

impl AuditContext {
    /// Create an empty context with no table and no canonical document
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            table_path: AUDIT_TABLE.to_string(),
            table_present: false,
            table_error: None,
            headers: Vec::new(),
            records: Vec::new(),
            canonical_path: CANONICAL_DOC.to_string(),
            canonical: None,
            platforms: Vec::new(),
        }
    }

    /// Set the table contents and mark it present
    pub fn with_table(mut self, headers: Vec<String>, records: Vec<RuleRecord>) -> Self {
        self.table_present = true;
        self.headers = headers;
        self.records = records;
        self
    }

    /// Set the canonical document text
    pub fn with_canonical(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.canonical = (!text.is_empty()).then_some(text);
        self
    }

    /// Add a platform target state
    pub fn with_platform(mut self, platform: &str, path: &str, state: BlockState) -> Self {
        self.platforms.push(PlatformState {
            platform: platform.to_string(),
            path: path.to_string(),
            state,
        });
        self
    }

    /// Read the project read-only. Expected platform digests are computed
    /// from the same resolved content and trace links a sync would use.
    pub fn load(layout: &ProjectLayout, today: NaiveDate) -> Self {
        let mut ctx = Self::new(today);
        ctx.table_path = layout.audit_table().display().to_string();
        ctx.canonical_path = layout.canonical_doc().display().to_string();

        let store = RuleStore::new(layout.audit_table());
        if store.exists() {
            ctx.table_present = true;
            match store.load() {
                Ok(table) => {
                    ctx.headers = table.headers;
                    ctx.records = table.records;
                }
                Err(e) => {
                    warn!(error = %e, "record table could not be parsed");
                    ctx.table_error = Some(e.to_string());
                }
            }
        }

        let canonical_file = layout.canonical_doc();
        if canonical_file.exists() {
            match std::fs::read_to_string(&canonical_file) {
                Ok(text) => ctx = ctx.with_canonical(text),
                Err(e) => warn!(path = %canonical_file.display(), error = %e, "canonical document unreadable"),
            }
        }

        let canonical_text = ctx.canonical.clone().unwrap_or_default();
        let doc = Document::parse(&canonical_text);
        let resolver = RuleContentResolver::load(layout, Some(&doc), &ctx.records);
        let traces = TraceLinker::new(layout).resolve(&ctx.records);
        let engine = PlatformSyncEngine::new(layout, &canonical_text, &doc, &ctx.records, &resolver, &traces);
        let config = PlatformTargets::load(layout);

        let platforms: Vec<PlatformState> = engine
            .discover(&config, None)
            .into_iter()
            .map(|target| PlatformState {
                state: block_state(&engine, &target.platform, &target.path),
                path: target.path.display().to_string(),
                platform: target.platform,
            })
            .collect();
        ctx.platforms = platforms;
        ctx
    }

    /// Active and protected rules
    pub fn in_force(&self) -> Vec<&RuleRecord> {
        self.records.iter().filter(|r| r.status.is_in_force()).collect()
    }

    /// Non-archived rules
    pub fn live(&self) -> Vec<&RuleRecord> {
        self.records.iter().filter(|r| !r.is_archived()).collect()
    }

    pub fn canonical_doc(&self) -> Option<Document> {
        self.canonical.as_deref().map(Document::parse)
    }
}

fn block_state(engine: &PlatformSyncEngine<'_>, platform: &str, path: &std::path::Path) -> BlockState {
    if !path.exists() {
        return BlockState::MissingFile;
    }
    let Ok(text) = std::fs::read_to_string(path) else {
        return BlockState::MissingBlock;
    };
    let doc = Document::parse(&text);
    let Some(region) = doc.find_region(RegionKind::AutoSync, Some(platform)) else {
        return BlockState::MissingBlock;
    };
    match region
        .attr("digest")
        .filter(|d| !d.is_empty() && d.chars().all(|c| c.is_ascii_hexdigit()))
    {
        Some(current) => BlockState::Present {
            current: current.to_string(),
            expected: engine.digest(platform),
        },
        None => BlockState::MissingDigest,
    }
}
