//! Patches the canonical document from the record table: inline stats
//! tags, `## TL;DR` call-outs, and the curated selection block.

mod inline_tags;
mod selection;
mod summary;

pub use inline_tags::apply_inline_tags;
pub use selection::{apply_selection_block, render_selection_region, selected_rules};
pub use summary::{annotate_summary, expected_annotations, AnnotationKind, SummaryAnnotation};

use crate::store::{matches_platform, RuleRecord, PLATFORM_ALL};

/// Records the canonical document should reflect: everything, or universal
/// rules plus one platform's lessons.
pub fn canonical_scope(records: &[RuleRecord], platform: Option<&str>) -> Vec<RuleRecord> {
    match platform {
        None | Some(PLATFORM_ALL) => records.to_vec(),
        Some(p) => records
            .iter()
            .filter(|r| matches_platform(r, Some(p)))
            .cloned()
            .collect(),
    }
}
