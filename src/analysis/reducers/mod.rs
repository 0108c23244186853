//! Built-in reducers, one per view of the analytics bundle

mod branching;
mod catalog;
mod endpoints;
mod funnel;
mod lengths;
mod traffic;

pub use branching::{
    entropy_bits, AnomalyReducer, BranchDistributionReducer, CoverageReducer, EntropyReducer,
};
pub use catalog::DuplicateTextReducer;
pub use endpoints::{LeafFrequencyReducer, TopIntentsReducer, DEFAULT_ROOT_ID};
pub use funnel::{DeadEndReducer, NodeFunnelReducer, UnreachableReducer};
pub use lengths::{DepthFunnelReducer, LengthsSummaryReducer};
pub use traffic::{TopPathsReducer, UrlEngagementReducer, WeekdayTrendsReducer, NO_WEEKDAY_KEY};

use std::collections::HashMap;
use std::hash::Hash;

/// Sort counts descending, ties by key ascending, keep the first `limit`
pub(crate) fn ranked<K: Ord + Hash>(counts: HashMap<K, usize>, limit: usize) -> Vec<(K, usize)> {
    let mut rows: Vec<(K, usize)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows.truncate(limit);
    rows
}
