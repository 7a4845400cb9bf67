use std::sync::LazyLock;

use regex::Regex;

use super::{capped, AuditContext, BlockState, CheckResult, Dimension};
use crate::document::Document;
use crate::reconcile::expected_annotations;
use crate::store::RuleRecord;

static STATS_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`\{hit:(\d+) vio:(\d+) err:(\d+)\}`").expect("valid stats tag regex")
});

/// Agreement between the record table, the canonical document and the
/// platform targets
pub struct DocumentConsistency;

/// Counters from the stats tag on a rule's line in `## Rules`, if tagged.
fn inline_counters(doc: &Document, rule_id: &str) -> Option<(i64, i64, i64)> {
    let marker = format!("[{rule_id}]");
    let line = doc.section("Rules")?.lines().find(|l| l.contains(&marker))?;
    let caps = STATS_TAG_RE.captures(line)?;
    let num = |i: usize| caps[i].parse::<i64>().unwrap_or(0);
    Some((num(1), num(2), num(3)))
}

impl DocumentConsistency {
    fn coverage(&self, in_force: &[&RuleRecord], text: &str) -> CheckResult {
        let missing: Vec<String> = in_force
            .iter()
            .filter(|r| !text.contains(&format!("[{}]", r.rule_id)))
            .map(|r| r.rule_id.clone())
            .collect();
        if missing.is_empty() {
            CheckResult::pass(
                "Rule Coverage",
                format!("All {} active rules are present in EVOLVE.md", in_force.len()),
            )
        } else {
            CheckResult::warn(
                "Rule Coverage",
                format!(
                    "{}/{} active rules are missing in EVOLVE.md",
                    missing.len(),
                    in_force.len()
                ),
            )
            .with_details(capped(missing))
        }
    }

    fn inline_tags(&self, in_force: &[&RuleRecord], doc: &Document) -> CheckResult {
        let out_of_sync: Vec<String> = in_force
            .iter()
            .filter_map(|r| {
                let (hit, vio, err) = inline_counters(doc, &r.rule_id)?;
                ((hit, vio, err) != (r.hit, r.vio, r.err)).then(|| {
                    format!(
                        "{}: MD({hit}/{vio}/{err}) != CSV({}/{}/{})",
                        r.rule_id, r.hit, r.vio, r.err
                    )
                })
            })
            .collect();
        if out_of_sync.is_empty() {
            CheckResult::pass("Inline Tag Sync", "Inline tags match CSV data")
        } else {
            CheckResult::warn(
                "Inline Tag Sync",
                format!("{} inline tags differ from CSV (run sync)", out_of_sync.len()),
            )
            .with_details(capped(out_of_sync))
        }
    }

    fn summary(&self, records: &[RuleRecord], doc: &Document) -> CheckResult {
        let expected = expected_annotations(records);
        let summary = doc.section("TL;DR");
        let mut missing: Vec<String> = Vec::new();
        for annotation in &expected {
            let referenced = summary.is_some_and(|s| s.contains(&format!("[{}]", annotation.rule_id)));
            if !referenced && !missing.contains(&annotation.rule_id) {
                missing.push(annotation.rule_id.clone());
            }
        }
        if missing.is_empty() {
            let message = if expected.is_empty() {
                "No TL;DR warnings needed"
            } else {
                "Flagged rules are present in TL;DR"
            };
            CheckResult::pass("TL;DR Sync", message)
        } else {
            CheckResult::warn(
                "TL;DR Sync",
                format!("{} flagged rules are missing from TL;DR (run sync)", missing.len()),
            )
            .with_details(capped(missing))
        }
    }

    fn platforms(&self, ctx: &AuditContext) -> Vec<CheckResult> {
        if ctx.platforms.is_empty() {
            return vec![
                CheckResult::pass("Platform File Coverage", "No platform files require sync"),
                CheckResult::pass("Platform Auto Blocks", "No platform targets; block check skipped"),
                CheckResult::pass("Platform Digest Freshness", "No platform targets; digest check skipped"),
            ];
        }

        let mut missing_files = Vec::new();
        let mut missing_blocks = Vec::new();
        let mut missing_digests = Vec::new();
        let mut stale = Vec::new();
        for target in &ctx.platforms {
            let label = format!("{} -> {}", target.platform, target.path);
            match &target.state {
                BlockState::MissingFile => missing_files.push(label),
                BlockState::MissingBlock => missing_blocks.push(label),
                BlockState::MissingDigest => missing_digests.push(label),
                BlockState::Present { current, expected } if current != expected => {
                    stale.push(format!("{label} (current:{current} expected:{expected})"))
                }
                BlockState::Present { .. } => {}
            }
        }

        let total = ctx.platforms.len();
        let coverage = if missing_files.is_empty() {
            CheckResult::pass(
                "Platform File Coverage",
                format!("All {total} platform targets have files"),
            )
        } else {
            CheckResult::warn(
                "Platform File Coverage",
                format!(
                    "{}/{total} platform targets are missing files (run sync)",
                    missing_files.len()
                ),
            )
            .with_details(capped(missing_files))
        };

        missing_blocks.extend(missing_digests);
        let blocks = if missing_blocks.is_empty() {
            CheckResult::pass("Platform Auto Blocks", "All platform files include valid auto-sync blocks")
        } else {
            CheckResult::warn(
                "Platform Auto Blocks",
                format!(
                    "{} platform files are missing valid auto-sync blocks (run sync)",
                    missing_blocks.len()
                ),
            )
            .with_details(capped(missing_blocks))
        };

        let freshness = if stale.is_empty() {
            CheckResult::pass("Platform Digest Freshness", "Platform file digests match current data")
        } else {
            CheckResult::warn(
                "Platform Digest Freshness",
                format!("{} platform file digests are stale (run sync)", stale.len()),
            )
            .with_details(capped(stale))
        };

        vec![coverage, blocks, freshness]
    }
}

impl Dimension for DocumentConsistency {
    fn id(&self) -> &'static str {
        "consistency"
    }

    fn name(&self) -> &'static str {
        "EVOLVE.md Consistency"
    }

    fn description(&self) -> &'static str {
        "Sync consistency between CSV and EVOLVE.md"
    }

    fn evaluate(&self, ctx: &AuditContext) -> Vec<CheckResult> {
        let (Some(text), Some(doc)) = (ctx.canonical.as_deref(), ctx.canonical_doc()) else {
            return vec![CheckResult::fail(
                "EVOLVE.md Presence",
                format!("{} is missing", ctx.canonical_path),
            )];
        };

        let in_force = ctx.in_force();
        let mut checks = vec![
            CheckResult::pass("EVOLVE.md Presence", "EVOLVE.md exists"),
            self.coverage(&in_force, text),
            self.inline_tags(&in_force, &doc),
            self.summary(&ctx.records, &doc),
        ];
        checks.extend(self.platforms(ctx));
        checks
    }
}
