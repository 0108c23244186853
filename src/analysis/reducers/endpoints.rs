//! Where calls start (intents) and where they stop (leaves)

use super::ranked;
use crate::analysis::traits::PathReducer;
use crate::analysis::types::{RankedNode, ReducerInput};
use crate::ingest::RuleId;
use std::collections::HashMap;

/// Canonical root id of the call-center menu
pub const DEFAULT_ROOT_ID: RuleId = 1;

/// First meaningful choice of each call
///
/// When a path opens on the root node and goes further, the second step is
/// the intent; otherwise the first step is.
#[derive(Debug, Clone, Copy)]
pub struct TopIntentsReducer {
    root_id: RuleId,
    limit: usize,
}

impl Default for TopIntentsReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl TopIntentsReducer {
    pub fn new() -> Self {
        Self {
            root_id: DEFAULT_ROOT_ID,
            limit: 10,
        }
    }

    pub fn with_root(mut self, root_id: RuleId) -> Self {
        self.root_id = root_id;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl PathReducer for TopIntentsReducer {
    type Output = Vec<RankedNode>;

    fn id(&self) -> &'static str {
        "top_intents_top10"
    }

    fn reduce(&self, input: &ReducerInput<'_>) -> Vec<RankedNode> {
        let mut counts: HashMap<RuleId, usize> = HashMap::new();
        for path in &input.paths {
            let intent = match path.path.as_slice() {
                [first, second, ..] if first.rule_id == self.root_id => second.rule_id,
                [first, ..] => first.rule_id,
                [] => continue,
            };
            *counts.entry(intent).or_insert(0) += 1;
        }
        to_rows(input, counts, self.limit)
    }
}

/// Last node of each call
#[derive(Debug, Clone, Copy)]
pub struct LeafFrequencyReducer {
    limit: usize,
}

impl Default for LeafFrequencyReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl LeafFrequencyReducer {
    pub fn new() -> Self {
        Self { limit: 20 }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl PathReducer for LeafFrequencyReducer {
    type Output = Vec<RankedNode>;

    fn id(&self) -> &'static str {
        "leaf_frequency_top20"
    }

    fn reduce(&self, input: &ReducerInput<'_>) -> Vec<RankedNode> {
        let mut counts: HashMap<RuleId, usize> = HashMap::new();
        for leaf in input.paths.iter().filter_map(|p| p.last()) {
            *counts.entry(leaf).or_insert(0) += 1;
        }
        to_rows(input, counts, self.limit)
    }
}

fn to_rows(input: &ReducerInput<'_>, counts: HashMap<RuleId, usize>, limit: usize) -> Vec<RankedNode> {
    ranked(counts, limit)
        .into_iter()
        .map(|(rule_id, count)| RankedNode {
            rule_id,
            count,
            text: input.text_of(rule_id),
        })
        .collect()
}
