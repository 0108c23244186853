//! Path length views: summary statistics and the depth funnel

use crate::analysis::traits::PathReducer;
use crate::analysis::types::{DepthCount, LengthsSummary, ReducerInput};

/// Count, mean, nearest-rank percentiles and extremes of path length
///
/// Only non-empty paths are counted.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthsSummaryReducer;

impl LengthsSummaryReducer {
    pub fn new() -> Self {
        Self
    }
}

/// Nearest rank over ascending `sorted`: index `ceil(p * n) - 1`, clamped
fn percentile(sorted: &[usize], p: f64) -> usize {
    let n = sorted.len();
    if n == 0 {
        return 0;
    }
    let rank = (p * n as f64).ceil() as i64 - 1;
    sorted[rank.clamp(0, n as i64 - 1) as usize]
}

impl PathReducer for LengthsSummaryReducer {
    type Output = LengthsSummary;

    fn id(&self) -> &'static str {
        "lengths_summary"
    }

    fn reduce(&self, input: &ReducerInput<'_>) -> LengthsSummary {
        let mut lengths: Vec<usize> = input
            .paths
            .iter()
            .map(|p| p.len())
            .filter(|&len| len > 0)
            .collect();
        if lengths.is_empty() {
            return LengthsSummary::default();
        }
        lengths.sort_unstable();

        let n = lengths.len();
        let total: usize = lengths.iter().sum();
        LengthsSummary {
            count: n,
            avg: total as f64 / n as f64,
            median: percentile(&lengths, 0.5),
            p90: percentile(&lengths, 0.9),
            p95: percentile(&lengths, 0.95),
            min: lengths[0],
            max: lengths[n - 1],
        }
    }
}

/// For every depth d, how many calls got at least d steps deep
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthFunnelReducer;

impl DepthFunnelReducer {
    pub fn new() -> Self {
        Self
    }
}

impl PathReducer for DepthFunnelReducer {
    type Output = Vec<DepthCount>;

    fn id(&self) -> &'static str {
        "depth_funnel"
    }

    fn reduce(&self, input: &ReducerInput<'_>) -> Vec<DepthCount> {
        let max = input.paths.iter().map(|p| p.len()).max().unwrap_or(0);
        // exact[l] = paths of length exactly l
        let mut exact = vec![0usize; max + 1];
        for path in &input.paths {
            exact[path.len()] += 1;
        }

        let mut out = Vec::with_capacity(max);
        let mut at_least = 0;
        for depth in (1..=max).rev() {
            at_least += exact[depth];
            out.push(DepthCount {
                depth,
                count: at_least,
            });
        }
        out.reverse();
        out
    }
}
