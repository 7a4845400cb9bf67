//! Record table: typed rows, normalization, and the mutations applied by
//! scoring and selection.

mod platform;
mod record;
mod scoring;
mod selection;
mod table;

pub use platform::{
    canonical_platform, default_platform_filename, infer_legacy_platform, is_platform_lesson,
    platform_slug, KnownPlatform, PLATFORM_ALL,
};
pub use record::{Origin, RuleRecord, Status, REQUIRED_COLUMNS, TABLE_HEADER};
pub use scoring::{
    apply_scores, matches_platform, matches_scope, RuleFilter, ScoreAction, ScoreCard,
    ScoreOutcome,
};
pub use selection::{apply_selection, clear_selection, parse_selection_numbers};
pub use table::{parse_table, render_table, RuleStore, RuleTable};
