//! Rule bodies and their cross-links: detail documents, canonical rule
//! lines, and history/runbook traceability.

mod detail;
mod resolver;
mod trace;

pub use detail::{
    relative_link, render_detail_template, render_trace_region, sync_rule_details,
    upsert_trace_region, DetailSyncOutcome,
};
pub use resolver::{
    clean_rule_line, extract_canonical_content, extract_detail_content, strip_stats_tag,
    RuleContentResolver,
};
pub use trace::{format_links_inline, TraceLinker, TraceLinks, TraceMap, TraceResolution};
