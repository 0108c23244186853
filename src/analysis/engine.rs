//! Analytics engine: runs every built-in reducer over one path collection

use super::reducers::{
    AnomalyReducer, BranchDistributionReducer, CoverageReducer, DeadEndReducer,
    DepthFunnelReducer, DuplicateTextReducer, EntropyReducer, LeafFrequencyReducer,
    LengthsSummaryReducer, NodeFunnelReducer, TopIntentsReducer, TopPathsReducer,
    UnreachableReducer, UrlEngagementReducer, WeekdayTrendsReducer,
};
use super::traits::PathReducer;
use super::types::{
    Anomaly, BranchDistribution, Coverage, DeadEnd, DepthCount, DuplicateGroup, EntropyEntry,
    LengthsSummary, NodeFunnel, PathCount, RankedNode, ReducerInput, UnreachableNode, UrlCount,
    WeekdayTrends,
};
use crate::config::AnalyticsConfig;
use crate::ingest::{Adjacency, NodeRegistry};
use crate::paths::CallPathMap;
use serde::{Deserialize, Serialize};

/// Every statistical view, keyed the way the bundle exposes them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsViews {
    pub lengths_summary: LengthsSummary,
    pub top_intents_top10: Vec<RankedNode>,
    pub leaf_frequency_top20: Vec<RankedNode>,
    pub branch_distribution: BranchDistribution,
    pub weekday_trends: WeekdayTrends,
    pub node_funnel: NodeFunnel,
    pub entropy_complexity_top20: Vec<EntropyEntry>,
    pub top_paths_top20: Vec<PathCount>,
    pub dead_ends_top20: Vec<DeadEnd>,
    pub url_engagement_top20: Vec<UrlCount>,
    pub depth_funnel: Vec<DepthCount>,
    pub anomalies_top20: Vec<Anomaly>,
    pub duplicates_by_text: Vec<DuplicateGroup>,
    pub unreachable_nodes: Vec<UnreachableNode>,
    pub coverage_ratio: Vec<Coverage>,
}

/// Holds the configured reducers
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    lengths: LengthsSummaryReducer,
    intents: TopIntentsReducer,
    leaves: LeafFrequencyReducer,
    branches: BranchDistributionReducer,
    weekdays: WeekdayTrendsReducer,
    funnel: NodeFunnelReducer,
    entropy: EntropyReducer,
    top_paths: TopPathsReducer,
    dead_ends: DeadEndReducer,
    urls: UrlEngagementReducer,
    depth: DepthFunnelReducer,
    anomalies: AnomalyReducer,
    duplicates: DuplicateTextReducer,
    unreachable: UnreachableReducer,
    coverage: CoverageReducer,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new(&AnalyticsConfig::default())
    }
}

impl AnalyticsEngine {
    pub fn new(config: &AnalyticsConfig) -> Self {
        let limits = &config.limits;
        Self {
            lengths: LengthsSummaryReducer::new(),
            intents: TopIntentsReducer::new()
                .with_root(config.root_intent_id)
                .with_limit(limits.top_intents),
            leaves: LeafFrequencyReducer::new().with_limit(limits.leaf_frequency),
            branches: BranchDistributionReducer::new().with_limit(limits.branch_children),
            weekdays: WeekdayTrendsReducer::new(),
            funnel: NodeFunnelReducer::new(),
            entropy: EntropyReducer::new().with_limit(limits.entropy),
            top_paths: TopPathsReducer::new().with_limit(limits.top_paths),
            dead_ends: DeadEndReducer::new().with_limit(limits.dead_ends),
            urls: UrlEngagementReducer::new().with_limit(limits.url_engagement),
            depth: DepthFunnelReducer::new(),
            anomalies: AnomalyReducer::new().with_limit(limits.anomalies),
            duplicates: DuplicateTextReducer::new(),
            unreachable: UnreachableReducer::new(),
            coverage: CoverageReducer::new(),
        }
    }

    /// Compute all views
    ///
    /// Pure: the same paths and tree always give the same views, and an empty
    /// path map gives empty or zeroed views.
    pub fn analyze(
        &self,
        paths: &CallPathMap,
        nodes: &NodeRegistry,
        children: &Adjacency,
    ) -> AnalyticsViews {
        let input = ReducerInput::new(paths.values(), nodes, children);
        tracing::debug!(
            paths = input.paths.len(),
            nodes = nodes.len(),
            branching_nodes = input.transitions.len(),
            "running reducers"
        );

        AnalyticsViews {
            lengths_summary: self.lengths.reduce(&input),
            top_intents_top10: self.intents.reduce(&input),
            leaf_frequency_top20: self.leaves.reduce(&input),
            branch_distribution: self.branches.reduce(&input),
            weekday_trends: self.weekdays.reduce(&input),
            node_funnel: self.funnel.reduce(&input),
            entropy_complexity_top20: self.entropy.reduce(&input),
            top_paths_top20: self.top_paths.reduce(&input),
            dead_ends_top20: self.dead_ends.reduce(&input),
            url_engagement_top20: self.urls.reduce(&input),
            depth_funnel: self.depth.reduce(&input),
            anomalies_top20: self.anomalies.reduce(&input),
            duplicates_by_text: self.duplicates.reduce(&input),
            unreachable_nodes: self.unreachable.reduce(&input),
            coverage_ratio: self.coverage.reduce(&input),
        }
    }

    /// Bundle keys of the views, in output order
    pub fn view_ids(&self) -> [&'static str; 15] {
        [
            self.lengths.id(),
            self.intents.id(),
            self.leaves.id(),
            self.branches.id(),
            self.weekdays.id(),
            self.funnel.id(),
            self.entropy.id(),
            self.top_paths.id(),
            self.dead_ends.id(),
            self.urls.id(),
            self.depth.id(),
            self.anomalies.id(),
            self.duplicates.id(),
            self.unreachable.id(),
            self.coverage.id(),
        ]
    }
}
