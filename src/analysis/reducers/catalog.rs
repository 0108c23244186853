//! Registry-only checks: nodes sharing the same display text

use crate::analysis::traits::PathReducer;
use crate::analysis::types::{DuplicateGroup, ReducerInput};
use crate::ingest::RuleId;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateTextReducer;

impl DuplicateTextReducer {
    pub fn new() -> Self {
        Self
    }
}

impl PathReducer for DuplicateTextReducer {
    type Output = Vec<DuplicateGroup>;

    fn id(&self) -> &'static str {
        "duplicates_by_text"
    }

    fn reduce(&self, input: &ReducerInput<'_>) -> Vec<DuplicateGroup> {
        let mut groups: BTreeMap<&str, Vec<RuleId>> = BTreeMap::new();
        for node in input.nodes.values() {
            let text = node.text.trim();
            if !text.is_empty() {
                groups.entry(text).or_default().push(node.rule_id);
            }
        }

        let mut out: Vec<DuplicateGroup> = groups
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(text, mut rule_ids)| {
                rule_ids.sort_unstable();
                DuplicateGroup {
                    text: text.to_string(),
                    count: rule_ids.len(),
                    rule_ids,
                }
            })
            .collect();
        // BTreeMap already yields text order; stable sort keeps it within a size
        out.sort_by(|a, b| b.count.cmp(&a.count));
        out
    }
}
