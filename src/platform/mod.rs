//! Per-platform derived documents.
//!
//! Each discovered platform gets one `AUTO_SYNC` block in its target file,
//! fingerprinted by a digest over the canonical document and the rules
//! visible on that platform. Targets whose rendered text is unchanged are
//! never rewritten.

mod digest;
mod discovery;
mod render;
mod sync;

pub use digest::{platform_digest, platform_relevant, sha256_hex};
pub use discovery::{discover_targets, resolve_target_path, scan_markers, PlatformTarget, TargetSource};
pub use render::{
    format_rule_line, platform_region, rank_high_signal, render_platform_block, trim_multiline,
    BlockInputs, AUTO_SYNC_HEADER,
};
pub use sync::{PlatformSyncEngine, PlatformSyncOptions, PlatformSyncOutcome};
