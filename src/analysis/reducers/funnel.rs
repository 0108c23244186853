//! Reach and drop-off per node

use super::ranked;
use crate::analysis::traits::PathReducer;
use crate::analysis::types::{DeadEnd, FunnelEntry, NodeFunnel, ReducerInput, UnreachableNode};
use crate::ingest::RuleId;
use std::collections::HashMap;

/// Reach, outgoing transitions and drop-off of every node seen in a path
///
/// A node visited twice in one call counts twice, so every outgoing
/// transition is matched by a visit and `reach >= transitions` always holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeFunnelReducer;

impl NodeFunnelReducer {
    pub fn new() -> Self {
        Self
    }
}

pub(crate) fn funnel_entry(input: &ReducerInput<'_>, id: RuleId) -> FunnelEntry {
    let reach = input.reach.get(&id).copied().unwrap_or(0);
    let transitions = input
        .transitions
        .get(&id)
        .map(|next| next.values().sum())
        .unwrap_or(0);
    FunnelEntry {
        reach,
        transitions,
        drop_off: reach.saturating_sub(transitions),
    }
}

impl PathReducer for NodeFunnelReducer {
    type Output = NodeFunnel;

    fn id(&self) -> &'static str {
        "node_funnel"
    }

    fn reduce(&self, input: &ReducerInput<'_>) -> NodeFunnel {
        input
            .reach
            .keys()
            .map(|&id| (id, funnel_entry(input, id)))
            .collect()
    }
}

/// Nodes where calls stop, ranked by how many calls stopped there
#[derive(Debug, Clone, Copy)]
pub struct DeadEndReducer {
    limit: usize,
}

impl Default for DeadEndReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl DeadEndReducer {
    pub fn new() -> Self {
        Self { limit: 20 }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl PathReducer for DeadEndReducer {
    type Output = Vec<DeadEnd>;

    fn id(&self) -> &'static str {
        "dead_ends_top20"
    }

    fn reduce(&self, input: &ReducerInput<'_>) -> Vec<DeadEnd> {
        let terminations: HashMap<RuleId, usize> = input
            .reach
            .keys()
            .map(|&id| (id, funnel_entry(input, id).drop_off))
            .filter(|&(_, drop_off)| drop_off > 0)
            .collect();

        ranked(terminations, self.limit)
            .into_iter()
            .map(|(rule_id, drop_off)| {
                let reach = input.reach.get(&rule_id).copied().unwrap_or(0);
                DeadEnd {
                    rule_id,
                    reach_occurrences: reach,
                    terminations: drop_off,
                    termination_rate: drop_off as f64 / reach as f64,
                    has_children: input.has_children(rule_id),
                    text: input.text_of(rule_id),
                }
            })
            .collect()
    }
}

/// Registered nodes that no call ever visited
#[derive(Debug, Clone, Copy, Default)]
pub struct UnreachableReducer;

impl UnreachableReducer {
    pub fn new() -> Self {
        Self
    }
}

impl PathReducer for UnreachableReducer {
    type Output = Vec<UnreachableNode>;

    fn id(&self) -> &'static str {
        "unreachable_nodes"
    }

    fn reduce(&self, input: &ReducerInput<'_>) -> Vec<UnreachableNode> {
        let mut ids: Vec<RuleId> = input
            .nodes
            .keys()
            .copied()
            .filter(|id| input.reach.get(id).copied().unwrap_or(0) == 0)
            .collect();
        ids.sort_unstable();
        ids.into_iter()
            .map(|rule_id| UnreachableNode {
                rule_id,
                text: input.text_of(rule_id),
            })
            .collect()
    }
}
