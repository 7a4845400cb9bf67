//! Console rendering of command outcomes. Everything writes to a sink
//! handed in by the caller.

mod json;
mod summary;

pub use json::{render_health_json, write_health_report};
pub use summary::{
    render_clear, render_filter, render_health, render_platform_sync, render_promote,
    render_report, render_scopes, render_score, render_select, render_skipped, render_sync,
};
