//! Reducer input and the rows each view is made of

use crate::ingest::{Adjacency, NodeRegistry, RuleId};
use crate::paths::CallPath;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Untruncated next-step counts: node -> (next node -> occurrences)
pub type Transitions = BTreeMap<RuleId, BTreeMap<RuleId, usize>>;

/// Everything a reducer may look at
///
/// Reach and transition counts are computed once here since several views
/// share them.
#[derive(Debug, Clone)]
pub struct ReducerInput<'a> {
    pub paths: Vec<&'a CallPath>,
    pub nodes: &'a NodeRegistry,
    pub children: &'a Adjacency,
    /// Occurrences of each node across all paths (a repeat visit counts again)
    pub reach: HashMap<RuleId, usize>,
    pub transitions: Transitions,
}

impl<'a> ReducerInput<'a> {
    pub fn new(
        paths: impl IntoIterator<Item = &'a CallPath>,
        nodes: &'a NodeRegistry,
        children: &'a Adjacency,
    ) -> Self {
        let paths: Vec<&CallPath> = paths.into_iter().collect();
        let mut reach: HashMap<RuleId, usize> = HashMap::new();
        let mut transitions = Transitions::new();

        for path in &paths {
            let ids = path.rule_ids();
            for id in &ids {
                *reach.entry(*id).or_insert(0) += 1;
            }
            for pair in ids.windows(2) {
                *transitions
                    .entry(pair[0])
                    .or_default()
                    .entry(pair[1])
                    .or_insert(0) += 1;
            }
        }

        Self {
            paths,
            nodes,
            children,
            reach,
            transitions,
        }
    }

    /// Display text for a node, its id when unknown or blank
    pub fn text_of(&self, id: RuleId) -> String {
        self.nodes
            .get(&id)
            .map(|n| n.label())
            .unwrap_or_else(|| id.to_string())
    }

    /// Whether the declared tree gives this node any child
    pub fn has_children(&self, id: RuleId) -> bool {
        self.children.get(&id).is_some_and(|c| !c.is_empty())
    }

    /// Whether `from -> to` is a declared parent/child edge
    pub fn is_tree_edge(&self, from: RuleId, to: RuleId) -> bool {
        self.children.get(&from).is_some_and(|c| c.contains(&to))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LengthsSummary {
    pub count: usize,
    pub avg: f64,
    pub median: usize,
    pub p90: usize,
    pub p95: usize,
    pub min: usize,
    pub max: usize,
}

/// A node with how often it was seen in some role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedNode {
    pub rule_id: RuleId,
    pub count: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchEntry {
    pub child: RuleId,
    pub count: usize,
    pub text: String,
}

/// Node -> its most frequent next steps
pub type BranchDistribution = BTreeMap<RuleId, Vec<BranchEntry>>;

/// Weekday key (`"1"`..`"7"`, `"null"` when absent) -> calls
pub type WeekdayTrends = BTreeMap<String, usize>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelEntry {
    pub reach: usize,
    pub transitions: usize,
    pub drop_off: usize,
}

/// Keyed only by nodes that appear in at least one path
pub type NodeFunnel = BTreeMap<RuleId, FunnelEntry>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyEntry {
    pub rule_id: RuleId,
    pub entropy_bits: f64,
    pub perplexity: f64,
    pub branching_factor: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCount {
    pub path: Vec<RuleId>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadEnd {
    pub rule_id: RuleId,
    pub reach_occurrences: usize,
    pub terminations: usize,
    pub termination_rate: f64,
    pub has_children: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlCount {
    pub url: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthCount {
    pub depth: usize,
    pub count: usize,
}

/// Observed transition with no matching parent/child edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    pub from: RuleId,
    pub to: RuleId,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub text: String,
    pub rule_ids: Vec<RuleId>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreachableNode {
    pub rule_id: RuleId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub rule_id: RuleId,
    pub top1_coverage: f64,
    pub top2_coverage: f64,
}
