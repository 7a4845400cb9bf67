//! Section and managed-region model over Markdown documents.
//!
//! Documents are split on level-2 headings; `EVOLVE_SKILL` comment markers
//! delimit regions this tool owns. Everything else is kept byte for byte,
//! which is what makes repeated syncs idempotent.

mod model;
mod region;

pub use model::{heading_title, Anchor, Block, Document, Section};
pub use region::{Region, RegionKind};
