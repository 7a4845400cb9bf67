use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::digest::platform_digest;
use super::discovery::{discover_targets, PlatformTarget};
use super::render::{platform_region, render_platform_block, BlockInputs};
use crate::config::{PlatformTargets, ProjectLayout};
use crate::content::{RuleContentResolver, TraceMap};
use crate::document::{Anchor, Document, RegionKind};
use crate::error::{Error, Result};
use crate::store::RuleRecord;

#[derive(Debug, Clone, Default)]
pub struct PlatformSyncOptions {
    /// Sync a single platform instead of every discovered one.
    pub only: Option<String>,
    /// Skip platform sync entirely.
    pub skip: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformSyncOutcome {
    /// `platform:path` for every target considered.
    pub targets: Vec<String>,
    pub created: Vec<PathBuf>,
    pub updated: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Renders and writes one managed block per platform target document.
///
/// The engine borrows everything it renders from, so the health auditor
/// can build one over the same inputs and recompute the digests a sync
/// would write.
#[derive(Debug, Clone, Copy)]
pub struct PlatformSyncEngine<'a> {
    layout: &'a ProjectLayout,
    canonical_text: &'a str,
    canonical: &'a Document,
    records: &'a [RuleRecord],
    resolver: &'a RuleContentResolver,
    traces: &'a TraceMap,
}

impl<'a> PlatformSyncEngine<'a> {
    pub fn new(
        layout: &'a ProjectLayout,
        canonical_text: &'a str,
        canonical: &'a Document,
        records: &'a [RuleRecord],
        resolver: &'a RuleContentResolver,
        traces: &'a TraceMap,
    ) -> Self {
        Self {
            layout,
            canonical_text,
            canonical,
            records,
            resolver,
            traces,
        }
    }

    pub fn discover(&self, config: &PlatformTargets, only: Option<&str>) -> Vec<PlatformTarget> {
        discover_targets(self.layout, self.records, config, only)
    }

    pub fn digest(&self, platform: &str) -> String {
        platform_digest(
            platform,
            self.canonical_text,
            self.records,
            Some(self.resolver),
            Some(self.traces),
        )
    }

    /// `existing` with the platform's block inserted or replaced. The
    /// block keeps its previous `updated` date while the digest holds.
    pub fn render_target(&self, platform: &str, existing: &str, today: NaiveDate) -> String {
        let digest = self.digest(platform);
        let mut doc = Document::parse(existing);
        let updated = doc
            .find_region(RegionKind::AutoSync, Some(platform))
            .filter(|r| r.attr("digest") == Some(digest.as_str()))
            .and_then(|r| r.attr("updated"))
            .map(str::to_string)
            .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());

        let inputs = BlockInputs {
            canonical: self.canonical,
            records: self.records,
            resolver: self.resolver,
            traces: self.traces,
        };
        let block = render_platform_block(platform, inputs, &digest, &updated);
        doc.upsert_region(platform_region(platform, &digest, &updated, &block), Anchor::DocumentEnd);
        doc.to_string()
    }

    /// Sync every discovered target, writing only files whose text changes.
    pub fn sync(&self, config: &PlatformTargets, options: &PlatformSyncOptions, today: NaiveDate) -> Result<PlatformSyncOutcome> {
        let mut outcome = PlatformSyncOutcome {
            warnings: config.warnings.clone(),
            ..Default::default()
        };
        if options.skip {
            debug!("platform sync disabled");
            return Ok(outcome);
        }

        for target in self.discover(config, options.only.as_deref()) {
            let PlatformTarget { platform, path, .. } = target;
            outcome
                .targets
                .push(format!("{platform}:{}", path.display()));

            let existed = path.exists();
            let existing = if existed {
                match std::fs::read_to_string(&path) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable platform target");
                        outcome
                            .warnings
                            .push(format!("could not read {}: {e}", path.display()));
                        continue;
                    }
                }
            } else {
                String::new()
            };

            let rendered = self.render_target(&platform, &existing, today);
            if existed && rendered == existing {
                outcome.unchanged.push(path);
                continue;
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            std::fs::write(&path, &rendered).map_err(|e| Error::io(&path, e))?;
            info!(platform = %platform, path = %path.display(), "platform block written");
            if existed {
                outcome.updated.push(path);
            } else {
                outcome.created.push(path);
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const CANONICAL: &str = "# Evolve\n\n## TL;DR\n- stay small\n\n## Rules\n- [R-001] Run tests\n\n## Changelog\n- init\n";

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn rows() -> Vec<RuleRecord> {
        vec![
            RuleRecord {
                scope: "ci".to_string(),
                hit: 2,
                ..RuleRecord::new("R-001")
            },
            RuleRecord {
                platform: "codex".to_string(),
                scope: "tools".to_string(),
                ..RuleRecord::new("S-001")
            },
        ]
    }

    #[test]
    fn test_sync_creates_then_skips_unchanged() {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path());
        let doc = Document::parse(CANONICAL);
        let records = rows();
        let resolver = RuleContentResolver::default();
        let traces = TraceMap::new();
        let engine = PlatformSyncEngine::new(&layout, CANONICAL, &doc, &records, &resolver, &traces);

        let first = engine
            .sync(&PlatformTargets::default(), &PlatformSyncOptions::default(), day(1))
            .unwrap();
        assert_eq!(first.created, vec![dir.path().join("AGENTS.md")]);
        let written = std::fs::read_to_string(dir.path().join("AGENTS.md")).unwrap();
        assert!(written.starts_with("<!-- EVOLVE_SKILL:AUTO_SYNC:BEGIN platform=codex digest="));
        assert!(written.contains("updated=2026-03-01 -->\n## Evolve-Skill Auto Sync\n"));
        assert!(written.ends_with("<!-- EVOLVE_SKILL:AUTO_SYNC:END -->\n"));

        // A later day with the same inputs leaves the file alone.
        let second = engine
            .sync(&PlatformTargets::default(), &PlatformSyncOptions::default(), day(9))
            .unwrap();
        assert_eq!(second.unchanged, vec![dir.path().join("AGENTS.md")]);
        assert!(second.created.is_empty() && second.updated.is_empty());
        assert_eq!(std::fs::read_to_string(dir.path().join("AGENTS.md")).unwrap(), written);
    }

    #[test]
    fn test_sync_updates_changed_digest_and_preserves_user_text() {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path());
        std::fs::write(dir.path().join("CLAUDE.md"), "# Claude notes\n\nHand-written.\n").unwrap();
        let doc = Document::parse(CANONICAL);
        let mut records = rows();
        let resolver = RuleContentResolver::default();
        let traces = TraceMap::new();

        let engine = PlatformSyncEngine::new(&layout, CANONICAL, &doc, &records, &resolver, &traces);
        let options = PlatformSyncOptions {
            only: Some("claude".to_string()),
            skip: false,
        };
        let first = engine.sync(&PlatformTargets::default(), &options, day(1)).unwrap();
        assert_eq!(first.updated, vec![dir.path().join("CLAUDE.md")]);
        let before = std::fs::read_to_string(dir.path().join("CLAUDE.md")).unwrap();
        assert!(before.starts_with("# Claude notes\n\nHand-written.\n\n<!-- EVOLVE_SKILL:AUTO_SYNC:BEGIN platform=claude"));

        records[0].hit = 3;
        let engine = PlatformSyncEngine::new(&layout, CANONICAL, &doc, &records, &resolver, &traces);
        let second = engine.sync(&PlatformTargets::default(), &options, day(2)).unwrap();
        assert_eq!(second.updated, vec![dir.path().join("CLAUDE.md")]);
        let after = std::fs::read_to_string(dir.path().join("CLAUDE.md")).unwrap();
        assert!(after.contains("updated=2026-03-02"));
        assert!(after.starts_with("# Claude notes\n\nHand-written.\n\n"));
        assert_eq!(after.matches("EVOLVE_SKILL:AUTO_SYNC:BEGIN").count(), 1);
    }

    #[test]
    fn test_skip_option() {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path());
        let doc = Document::parse(CANONICAL);
        let records = rows();
        let resolver = RuleContentResolver::default();
        let traces = TraceMap::new();
        let engine = PlatformSyncEngine::new(&layout, CANONICAL, &doc, &records, &resolver, &traces);
        let options = PlatformSyncOptions {
            only: None,
            skip: true,
        };
        let outcome = engine.sync(&PlatformTargets::default(), &options, day(1)).unwrap();
        assert!(outcome.targets.is_empty());
        assert!(!dir.path().join("AGENTS.md").exists());
    }
}
