use std::collections::HashMap;

use super::record::RuleRecord;
use crate::error::{Error, Result};

/// Parse `"1,3 5"` into distinct positive numbers, keeping input order.
pub fn parse_selection_numbers(raw: &str) -> Vec<usize> {
    let mut numbers = Vec::new();
    for token in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        let Ok(n) = token.parse::<usize>() else {
            continue;
        };
        if n > 0 && !numbers.contains(&n) {
            numbers.push(n);
        }
    }
    numbers
}

/// Assign `evolve_slot` 1..n to the suggestions picked by number and clear
/// every other slot. `candidates` is the numbered suggestion list (1-based).
///
/// Returns the selected ids in slot order. Any out-of-range number rejects
/// the whole selection and leaves the records untouched.
pub fn apply_selection(
    records: &mut [RuleRecord],
    candidates: &[String],
    numbers: &[usize],
) -> Result<Vec<String>> {
    let invalid: Vec<String> = numbers
        .iter()
        .filter(|n| **n == 0 || **n > candidates.len())
        .map(|n| n.to_string())
        .collect();
    if !invalid.is_empty() {
        return Err(Error::Selection(format!(
            "numbers {} are outside 1..{}",
            invalid.join(", "),
            candidates.len()
        )));
    }

    let mut slots: HashMap<&str, i64> = HashMap::new();
    let mut selected = Vec::new();
    for (order, n) in numbers.iter().enumerate() {
        let rule_id = candidates[n - 1].as_str();
        slots.insert(rule_id, order as i64 + 1);
        selected.push(rule_id.to_string());
    }

    for record in records.iter_mut() {
        record.evolve_slot = slots.get(record.rule_id.as_str()).copied().unwrap_or(0);
    }
    Ok(selected)
}

/// Reset every slot; returns how many rows had one.
pub fn clear_selection(records: &mut [RuleRecord]) -> usize {
    let mut changed = 0;
    for record in records.iter_mut() {
        if record.evolve_slot != 0 {
            changed += 1;
        }
        record.evolve_slot = 0;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<RuleRecord> {
        vec![
            RuleRecord::new("R-001"),
            RuleRecord {
                evolve_slot: 4,
                ..RuleRecord::new("R-002")
            },
            RuleRecord::new("R-003"),
        ]
    }

    #[test]
    fn test_parse_selection_numbers() {
        assert_eq!(parse_selection_numbers("1,3 5"), vec![1, 3, 5]);
        assert_eq!(parse_selection_numbers("2, 2, x, 0, 1"), vec![2, 1]);
        assert!(parse_selection_numbers("  ").is_empty());
    }

    #[test]
    fn test_apply_selection_orders_slots() {
        let mut records = rows();
        let candidates = vec!["R-003".to_string(), "R-001".to_string()];
        let selected = apply_selection(&mut records, &candidates, &[2, 1]).unwrap();

        assert_eq!(selected, vec!["R-001", "R-003"]);
        assert_eq!(records[0].evolve_slot, 1);
        assert_eq!(records[1].evolve_slot, 0, "previous selection cleared");
        assert_eq!(records[2].evolve_slot, 2);
    }

    #[test]
    fn test_apply_selection_rejects_out_of_range() {
        let mut records = rows();
        let candidates = vec!["R-001".to_string()];
        let err = apply_selection(&mut records, &candidates, &[1, 7]).unwrap_err();
        assert!(err.to_string().contains('7'));
        assert_eq!(records[1].evolve_slot, 4, "records untouched on error");
    }

    #[test]
    fn test_clear_selection() {
        let mut records = rows();
        assert_eq!(clear_selection(&mut records), 1);
        assert!(records.iter().all(|r| r.evolve_slot == 0));
    }
}
