//! Next-step views: branch distribution, entropy, coverage and anomalies
//!
//! All of them read [`ReducerInput::transitions`], the untruncated count of
//! every adjacent pair across all paths.

use super::ranked;
use crate::analysis::traits::PathReducer;
use crate::analysis::types::{
    Anomaly, BranchDistribution, BranchEntry, Coverage, EntropyEntry, ReducerInput,
};
use crate::ingest::RuleId;
use std::collections::{BTreeMap, HashMap};

/// Most frequent next steps of every node
#[derive(Debug, Clone, Copy)]
pub struct BranchDistributionReducer {
    per_node: usize,
}

impl Default for BranchDistributionReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchDistributionReducer {
    pub fn new() -> Self {
        Self { per_node: 10 }
    }

    pub fn with_limit(mut self, per_node: usize) -> Self {
        self.per_node = per_node;
        self
    }
}

impl PathReducer for BranchDistributionReducer {
    type Output = BranchDistribution;

    fn id(&self) -> &'static str {
        "branch_distribution"
    }

    fn reduce(&self, input: &ReducerInput<'_>) -> BranchDistribution {
        input
            .transitions
            .iter()
            .map(|(&node, next)| {
                let entries = ranked(to_hash(next), self.per_node)
                    .into_iter()
                    .map(|(child, count)| BranchEntry {
                        child,
                        count,
                        text: input.text_of(child),
                    })
                    .collect();
                (node, entries)
            })
            .collect()
    }
}

fn to_hash(next: &BTreeMap<RuleId, usize>) -> HashMap<RuleId, usize> {
    next.iter().map(|(&k, &v)| (k, v)).collect()
}

/// Shannon entropy (bits) of a count distribution
pub fn entropy_bits<'a>(counts: impl IntoIterator<Item = &'a usize> + Clone) -> f64 {
    let total: usize = counts.clone().into_iter().sum();
    if total == 0 {
        return 0.0;
    }
    let mut h = 0.0;
    for &c in counts {
        if c > 0 {
            let p = c as f64 / total as f64;
            h -= p * p.log2();
        }
    }
    h
}

/// Unpredictability of the next step at each branching node
#[derive(Debug, Clone, Copy)]
pub struct EntropyReducer {
    limit: usize,
}

impl Default for EntropyReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropyReducer {
    pub fn new() -> Self {
        Self { limit: 20 }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl PathReducer for EntropyReducer {
    type Output = Vec<EntropyEntry>;

    fn id(&self) -> &'static str {
        "entropy_complexity_top20"
    }

    fn reduce(&self, input: &ReducerInput<'_>) -> Vec<EntropyEntry> {
        let mut rows: Vec<(usize, EntropyEntry)> = input
            .transitions
            .iter()
            .filter(|(_, next)| !next.is_empty())
            .map(|(&rule_id, next)| {
                let h = entropy_bits(next.values());
                let total: usize = next.values().sum();
                (
                    total,
                    EntropyEntry {
                        rule_id,
                        entropy_bits: h,
                        perplexity: h.exp2(),
                        branching_factor: next.len(),
                        text: input.text_of(rule_id),
                    },
                )
            })
            .collect();

        rows.sort_by(|(ta, a), (tb, b)| {
            b.entropy_bits
                .total_cmp(&a.entropy_bits)
                .then_with(|| tb.cmp(ta))
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        rows.truncate(self.limit);
        rows.into_iter().map(|(_, row)| row).collect()
    }
}

/// Share of a node's outgoing traffic taken by its top one and two children
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageReducer;

impl CoverageReducer {
    pub fn new() -> Self {
        Self
    }
}

impl PathReducer for CoverageReducer {
    type Output = Vec<Coverage>;

    fn id(&self) -> &'static str {
        "coverage_ratio"
    }

    fn reduce(&self, input: &ReducerInput<'_>) -> Vec<Coverage> {
        input
            .transitions
            .iter()
            .map(|(&rule_id, next)| {
                let mut counts: Vec<usize> = next.values().copied().collect();
                counts.sort_unstable_by(|a, b| b.cmp(a));
                let total: usize = counts.iter().sum();
                if total == 0 {
                    return Coverage {
                        rule_id,
                        top1_coverage: 0.0,
                        top2_coverage: 0.0,
                    };
                }
                let top1 = counts.first().copied().unwrap_or(0);
                let top2 = top1 + counts.get(1).copied().unwrap_or(0);
                Coverage {
                    rule_id,
                    top1_coverage: top1 as f64 / total as f64,
                    top2_coverage: top2 as f64 / total as f64,
                }
            })
            .collect()
    }
}

/// Transitions observed in calls that the declared tree does not contain
#[derive(Debug, Clone, Copy)]
pub struct AnomalyReducer {
    limit: usize,
}

impl Default for AnomalyReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl AnomalyReducer {
    pub fn new() -> Self {
        Self { limit: 20 }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl PathReducer for AnomalyReducer {
    type Output = Vec<Anomaly>;

    fn id(&self) -> &'static str {
        "anomalies_top20"
    }

    fn reduce(&self, input: &ReducerInput<'_>) -> Vec<Anomaly> {
        let mut counts: HashMap<(RuleId, RuleId), usize> = HashMap::new();
        for (&from, next) in &input.transitions {
            for (&to, &count) in next {
                if !input.is_tree_edge(from, to) {
                    counts.insert((from, to), count);
                }
            }
        }
        ranked(counts, self.limit)
            .into_iter()
            .map(|((from, to), count)| Anomaly { from, to, count })
            .collect()
    }
}
