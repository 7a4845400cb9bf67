use crate::content::strip_stats_tag;
use crate::document::Document;
use crate::store::RuleRecord;

/// Refresh the trailing `{hit:N vio:N err:N}` tag on each non-archived
/// rule's line in `## Rules`. Any earlier tag on the line is replaced.
/// Returns the ids whose line was found.
pub fn apply_inline_tags(doc: &mut Document, records: &[RuleRecord]) -> Vec<String> {
    let Some(rules) = doc.section_mut("Rules") else {
        return Vec::new();
    };

    let mut tagged = Vec::new();
    for record in records.iter().filter(|r| !r.is_archived()) {
        let marker = format!("[{}]", record.rule_id);
        let tag = record.stats_tag();
        let found = rules.rewrite_first_line(
            |line| line.contains(&marker),
            |line| format!("{}  {tag}", strip_stats_tag(line).trim_end()),
        );
        if found {
            tagged.push(record.rule_id.clone());
        }
    }
    tagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Status;
    use pretty_assertions::assert_eq;

    fn record(id: &str, hit: i64, vio: i64, err: i64) -> RuleRecord {
        RuleRecord {
            hit,
            vio,
            err,
            ..RuleRecord::new(id)
        }
    }

    #[test]
    fn test_tags_added_and_replaced() {
        let mut doc = Document::parse(
            "## Rules\n\
             - [R-001] [frontend] Keep hooks pure  `{hit:1 vio:0 err:0}`\n\
             - [R-002] [backend] Use transactions\n\
             - [R-010] [ops] unrelated\n\
             ## Changelog\n\
             - [R-001] mentioned here too\n",
        );
        let tagged = apply_inline_tags(&mut doc, &[record("R-001", 4, 1, 0), record("R-002", 0, 2, 1)]);
        assert_eq!(tagged, vec!["R-001", "R-002"]);
        assert_eq!(
            doc.to_string(),
            "## Rules\n\
             - [R-001] [frontend] Keep hooks pure  `{hit:4 vio:1 err:0}`\n\
             - [R-002] [backend] Use transactions  `{hit:0 vio:2 err:1}`\n\
             - [R-010] [ops] unrelated\n\
             ## Changelog\n\
             - [R-001] mentioned here too\n"
        );
    }

    #[test]
    fn test_tagging_is_idempotent() {
        let mut doc = Document::parse("## Rules\n- [R-001] a\n");
        let rows = [record("R-001", 2, 0, 0)];
        apply_inline_tags(&mut doc, &rows);
        let once = doc.to_string();
        apply_inline_tags(&mut doc, &rows);
        assert_eq!(doc.to_string(), once);
        assert_eq!(once, "## Rules\n- [R-001] a  `{hit:2 vio:0 err:0}`\n");
    }

    #[test]
    fn test_archived_and_regions_untouched() {
        let text = "## Rules\n\
            <!-- EVOLVE_SKILL:RULE_SELECTION:BEGIN -->\n\
            1. [R-001] copy\n\
            <!-- EVOLVE_SKILL:RULE_SELECTION:END -->\n\
            - [R-001] source\n\
            - [R-002] archived\n";
        let mut doc = Document::parse(text);
        let mut archived = record("R-002", 1, 1, 1);
        archived.status = Status::Archived;
        apply_inline_tags(&mut doc, &[record("R-001", 1, 0, 0), archived]);
        assert_eq!(
            doc.to_string(),
            text.replace("- [R-001] source", "- [R-001] source  `{hit:1 vio:0 err:0}`")
        );
    }

    #[test]
    fn test_missing_rules_section() {
        let mut doc = Document::parse("# nothing\n");
        assert!(apply_inline_tags(&mut doc, &[record("R-001", 1, 0, 0)]).is_empty());
    }
}
