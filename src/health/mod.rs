//! Read-only health audit of a project: six dimensions of checks over the
//! record table, the canonical document and the platform targets, folded
//! into a weighted score and a letter grade.

mod anti_corruption;
mod builder;
mod consistency;
mod context;
mod engine;
mod freshness;
mod integrity;
mod quality;
mod structure;
mod types;

pub use anti_corruption::AntiCorruption;
pub use builder::HealthReportBuilder;
pub use consistency::DocumentConsistency;
pub use context::{AuditContext, BlockState, PlatformState};
pub use engine::{Dimension, DimensionRegistry};
pub use freshness::Freshness;
pub use integrity::DataIntegrity;
pub use quality::Quality;
pub use structure::Structure;
pub use types::{compute_score, CheckLevel, CheckResult, DimensionReport, Finding, Grade, HealthReport};

use chrono::NaiveDate;
use tracing::debug;

use crate::config::ProjectLayout;

const MAX_DETAILS: usize = 10;

/// Keep the first few detail lines of a check.
pub(crate) fn capped(mut details: Vec<String>) -> Vec<String> {
    details.truncate(MAX_DETAILS);
    details
}

/// Load the project and run every standard dimension over it.
pub fn run_health(layout: &ProjectLayout, today: NaiveDate) -> HealthReport {
    let mut builder = HealthReportBuilder::new(AuditContext::load(layout, today));
    let registry = DimensionRegistry::with_default_dimensions();
    debug!(dimensions = ?registry.dimension_ids(), "running health dimensions");
    builder.run(&registry);
    builder.build()
}
