use std::path::{Path, PathBuf};

use tracing::debug;

use super::platform::{canonical_platform, infer_legacy_platform, PLATFORM_ALL};
use super::record::{Origin, RuleRecord, Status, TABLE_HEADER};
use crate::error::{Error, Result};

/// Parsed record table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTable {
    /// Header row as found on disk (empty when the table was absent).
    pub headers: Vec<String>,
    pub records: Vec<RuleRecord>,
}

impl RuleTable {
    pub fn find(&self, rule_id: &str) -> Option<&RuleRecord> {
        self.records.iter().find(|r| r.rule_id == rule_id)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// File-backed store for the record table
#[derive(Debug, Clone)]
pub struct RuleStore {
    path: PathBuf,
}

impl RuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read and normalize the table. A missing file reads as empty.
    pub fn load(&self) -> Result<RuleTable> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "record table missing, treating as empty");
            return Ok(RuleTable::default());
        }
        let text = std::fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        parse_table(&text)
    }

    /// Rewrite the whole table in canonical column order.
    pub fn save(&self, records: &[RuleRecord]) -> Result<()> {
        let text = render_table(records)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        std::fs::write(&self.path, text).map_err(|e| Error::io(&self.path, e))?;
        debug!(path = %self.path.display(), rows = records.len(), "record table written");
        Ok(())
    }
}

/// Parse table text into normalized records.
///
/// Missing optional columns take defaults, non-numeric counters become 0,
/// and platform labels are canonicalized.
pub fn parse_table(text: &str) -> Result<RuleTable> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let columns: Vec<Option<usize>> = TABLE_HEADER.iter().map(|name| column(name)).collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let field = |idx: usize| columns[idx].and_then(|c| row.get(c));
        let text_field = |idx: usize| field(idx).unwrap_or("").to_string();
        let number = |idx: usize| parse_counter(field(idx));

        let rule_id = text_field(0);
        let scope = text_field(2);
        let mut platform = canonical_platform(field(1).unwrap_or(""));
        if platform == PLATFORM_ALL {
            platform = infer_legacy_platform(&rule_id, &scope);
        }

        records.push(RuleRecord {
            platform,
            title: text_field(3),
            origin: field(4).map(Origin::from).unwrap_or_default(),
            hit: number(5),
            vio: number(6),
            err: number(7),
            skip: number(8),
            auto_skip: number(9),
            last_reviewed: text_field(10),
            status: Status::from(field(11).unwrap_or("")),
            evolve_slot: number(12),
            rule_id,
            scope,
        });
    }

    Ok(RuleTable { headers, records })
}

/// Render records with the full fixed header.
pub fn render_table(records: &[RuleRecord]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(TABLE_HEADER)?;
    for record in records {
        writer.write_record(record.to_fields())?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::io("<record table>", e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn parse_counter(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(0)
}
