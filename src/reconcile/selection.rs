use crate::content::{format_links_inline, RuleContentResolver, TraceMap};
use crate::document::{Anchor, Document, Region, RegionKind};
use crate::store::RuleRecord;

const SELECTION_HEADING: &str = "### Audit-Selected Rules";
const SELECTION_NOTE: &str = "_Auto-generated from `evolve/audit.csv` `evolve_slot` ordering._";
const SELECTION_PLACEHOLDER: &str =
    "- (no selected rules; run `evolve-audit report` then `evolve-audit select \"1,2\"`)";

/// Non-archived rules with a slot, in `(evolve_slot, rule_id)` order.
pub fn selected_rules(records: &[RuleRecord]) -> Vec<&RuleRecord> {
    let mut selected: Vec<&RuleRecord> = records
        .iter()
        .filter(|r| !r.is_archived() && r.evolve_slot > 0)
        .collect();
    selected.sort_by(|a, b| {
        a.evolve_slot
            .cmp(&b.evolve_slot)
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
    selected
}

fn render_item(index: usize, record: &RuleRecord, resolver: &RuleContentResolver, traces: &TraceMap) -> String {
    let scope = record.scope.as_str();
    let mut content = resolver.display(record);
    let scope_prefix = format!("[{scope}]");
    if !scope.is_empty() {
        if let Some(rest) = content.strip_prefix(&scope_prefix) {
            content = rest.trim().to_string();
        }
    }
    let trace = traces.get(&record.rule_id).cloned().unwrap_or_default();
    format!(
        "{index}. [{}] [{scope}] {content}  {}\n   Trace: History {}; Runbook {}",
        record.rule_id,
        record.stats_tag(),
        format_links_inline(&trace.history),
        format_links_inline(&trace.runbooks),
    )
}

/// The `RULE_SELECTION` region for the current slots.
pub fn render_selection_region(
    records: &[RuleRecord],
    resolver: &RuleContentResolver,
    traces: &TraceMap,
) -> Region {
    let mut lines = vec![SELECTION_HEADING.to_string(), SELECTION_NOTE.to_string()];
    let selected = selected_rules(records);
    if selected.is_empty() {
        lines.push(SELECTION_PLACEHOLDER.to_string());
    }
    for (idx, record) in selected.into_iter().enumerate() {
        lines.push(render_item(idx + 1, record, resolver, traces));
    }
    Region::new(RegionKind::RuleSelection, Vec::new(), &lines.join("\n"))
}

/// Upsert the selection region at the end of `## Rules`. Returns `false`
/// when the document has no such section.
pub fn apply_selection_block(
    doc: &mut Document,
    records: &[RuleRecord],
    resolver: &RuleContentResolver,
    traces: &TraceMap,
) -> bool {
    let region = render_selection_region(records, resolver, traces);
    doc.upsert_region(region, Anchor::SectionEnd("Rules"))
}
