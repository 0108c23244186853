//! Whole-call traffic: popular paths, URL hits and calls per weekday

use super::ranked;
use crate::analysis::traits::PathReducer;
use crate::analysis::types::{PathCount, ReducerInput, UrlCount, WeekdayTrends};
use crate::ingest::RuleId;
use std::collections::HashMap;

/// Bucket key for calls without a usable date
pub const NO_WEEKDAY_KEY: &str = "null";

/// Most frequent exact id sequences; empty paths are not counted
#[derive(Debug, Clone, Copy)]
pub struct TopPathsReducer {
    limit: usize,
}

impl Default for TopPathsReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl TopPathsReducer {
    pub fn new() -> Self {
        Self { limit: 20 }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl PathReducer for TopPathsReducer {
    type Output = Vec<PathCount>;

    fn id(&self) -> &'static str {
        "top_paths_top20"
    }

    fn reduce(&self, input: &ReducerInput<'_>) -> Vec<PathCount> {
        let mut counts: HashMap<Vec<RuleId>, usize> = HashMap::new();
        for path in input.paths.iter().filter(|p| !p.is_empty()) {
            *counts.entry(path.rule_ids()).or_insert(0) += 1;
        }
        ranked(counts, self.limit)
            .into_iter()
            .map(|(path, count)| PathCount { path, count })
            .collect()
    }
}

/// Visits to steps that carry a URL, grouped by URL
#[derive(Debug, Clone, Copy)]
pub struct UrlEngagementReducer {
    limit: usize,
}

impl Default for UrlEngagementReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlEngagementReducer {
    pub fn new() -> Self {
        Self { limit: 20 }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl PathReducer for UrlEngagementReducer {
    type Output = Vec<UrlCount>;

    fn id(&self) -> &'static str {
        "url_engagement_top20"
    }

    fn reduce(&self, input: &ReducerInput<'_>) -> Vec<UrlCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for step in input.paths.iter().flat_map(|p| p.path.iter()) {
            if let Some(url) = step.url.as_deref() {
                *counts.entry(url).or_insert(0) += 1;
            }
        }
        ranked(counts, self.limit)
            .into_iter()
            .map(|(url, count)| UrlCount {
                url: url.to_string(),
                count,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WeekdayTrendsReducer;

impl WeekdayTrendsReducer {
    pub fn new() -> Self {
        Self
    }
}

impl PathReducer for WeekdayTrendsReducer {
    type Output = WeekdayTrends;

    fn id(&self) -> &'static str {
        "weekday_trends"
    }

    fn reduce(&self, input: &ReducerInput<'_>) -> WeekdayTrends {
        let mut trends = WeekdayTrends::new();
        for path in &input.paths {
            let key = match path.weekday {
                Some(day) => day.to_string(),
                None => NO_WEEKDAY_KEY.to_string(),
            };
            *trends.entry(key).or_insert(0) += 1;
        }
        trends
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::reducers::test_support::{path, path_on, tree};

    #[test]
    fn test_top_paths() {
        let (nodes, children) = tree(&[]);
        let paths = vec![
            path(&[1, 2]),
            path(&[1, 3]),
            path(&[1, 2]),
            path(&[1]),
            path(&[]),
        ];
        let input = ReducerInput::new(&paths, &nodes, &children);
        let rows = TopPathsReducer::new().reduce(&input);

        assert_eq!(
            rows,
            vec![
                PathCount { path: vec![1, 2], count: 2 },
                PathCount { path: vec![1], count: 1 },
                PathCount { path: vec![1, 3], count: 1 },
            ]
        );
    }

    #[test]
    fn test_url_engagement_counts_steps() {
        let (nodes, children) = tree(&[]);
        let mut with_urls = path(&[1, 2, 3]);
        with_urls.path[0].url = Some("https://a".into());
        with_urls.path[2].url = Some("https://b".into());
        let mut again = path(&[1]);
        again.path[0].url = Some("https://a".into());
        let paths = vec![with_urls, again, path(&[4])];

        let input = ReducerInput::new(&paths, &nodes, &children);
        let rows = UrlEngagementReducer::new().reduce(&input);
        assert_eq!(
            rows,
            vec![
                UrlCount { url: "https://a".into(), count: 2 },
                UrlCount { url: "https://b".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_weekday_trends_buckets() {
        let (nodes, children) = tree(&[]);
        let paths = vec![
            path_on(&[1], Some(7)),
            path_on(&[1, 2], Some(7)),
            path_on(&[1], Some(1)),
            path_on(&[1], None),
        ];
        let input = ReducerInput::new(&paths, &nodes, &children);
        let trends = WeekdayTrendsReducer.reduce(&input);

        assert_eq!(trends["7"], 2);
        assert_eq!(trends["1"], 1);
        assert_eq!(trends[NO_WEEKDAY_KEY], 1);
        assert_eq!(trends.len(), 3);
    }
}
