//! Path reconstructor: unordered call events to ordered navigation paths

use crate::ingest::{CallRecord, NodeRegistry, RuleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix of every key in the call-path map
pub const PATH_KEY_PREFIX: &str = "call::";

/// One visited node within a call path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub rule_id: RuleId,
    pub text: String,
    pub url: Option<String>,
}

/// Ordered, adjacent-deduplicated navigation of one call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallPath {
    /// Key of this path in the call-path map (`call::<file>::<call id>`)
    pub source_call: String,
    /// File-qualified call id (`<file>::<call id>`)
    pub call_id: String,
    pub call_date: Option<String>,
    pub weekday: Option<u8>,
    pub path: Vec<PathStep>,
}

impl CallPath {
    pub fn rule_ids(&self) -> Vec<RuleId> {
        self.path.iter().map(|s| s.rule_id).collect()
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn first(&self) -> Option<RuleId> {
        self.path.first().map(|s| s.rule_id)
    }

    pub fn last(&self) -> Option<RuleId> {
        self.path.last().map(|s| s.rule_id)
    }
}

/// Path key -> call path, ordered by key
pub type CallPathMap = BTreeMap<String, CallPath>;

/// Build one path per call
///
/// Events are stably sorted by sequence number; a visit identical to the
/// immediately preceding one is collapsed, while non-adjacent repeats stay.
/// Events for rule ids with no registered node are dropped.
pub fn reconstruct_paths(
    nodes: &NodeRegistry,
    calls: &BTreeMap<String, CallRecord>,
) -> CallPathMap {
    let mut out = CallPathMap::new();

    for (call_id, record) in calls {
        let mut events = record.events.clone();
        events.sort_by_key(|e| e.seq);

        let mut path: Vec<PathStep> = Vec::with_capacity(events.len());
        let mut last: Option<RuleId> = None;
        for event in events {
            if last == Some(event.rule_id) {
                continue;
            }
            match nodes.get(&event.rule_id) {
                Some(node) => {
                    path.push(PathStep {
                        rule_id: node.rule_id,
                        text: node.text.clone(),
                        url: node.url.clone(),
                    });
                    last = Some(event.rule_id);
                }
                None => tracing::debug!(
                    call = %call_id,
                    rule_id = event.rule_id,
                    "dropping event for unregistered node"
                ),
            }
        }

        let key = format!("{}{}", PATH_KEY_PREFIX, call_id);
        out.insert(
            key.clone(),
            CallPath {
                source_call: key,
                call_id: call_id.clone(),
                call_date: record.meta.call_date.clone(),
                weekday: record.meta.weekday,
                path,
            },
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{CallEvent, CallMeta, NodeData};

    fn nodes(ids: &[RuleId]) -> NodeRegistry {
        ids.iter()
            .map(|&id| (id, NodeData::new(id, 0, format!("n{}", id))))
            .collect()
    }

    fn record(events: &[(u64, RuleId)]) -> CallRecord {
        CallRecord {
            events: events
                .iter()
                .map(|&(seq, rule_id)| CallEvent { seq, rule_id })
                .collect(),
            meta: CallMeta {
                call_date: Some("2024-01-07".into()),
                weekday: Some(7),
            },
        }
    }

    fn single(events: &[(u64, RuleId)], registered: &[RuleId]) -> CallPath {
        let mut calls = BTreeMap::new();
        calls.insert("f.csv::1".to_string(), record(events));
        let mut map = reconstruct_paths(&nodes(registered), &calls);
        map.remove("call::f.csv::1").unwrap()
    }

    #[test]
    fn test_events_sorted_by_sequence() {
        let path = single(&[(3, 30), (1, 10), (2, 20)], &[10, 20, 30]);
        assert_eq!(path.rule_ids(), vec![10, 20, 30]);
        assert_eq!(path.call_id, "f.csv::1");
        assert_eq!(path.source_call, "call::f.csv::1");
        assert_eq!(path.weekday, Some(7));
        assert_eq!(path.path[0].text, "n10");
    }

    #[test]
    fn test_adjacent_duplicates_collapse() {
        let path = single(&[(1, 10), (2, 20), (3, 20), (4, 20)], &[10, 20]);
        assert_eq!(path.rule_ids(), vec![10, 20]);
    }

    #[test]
    fn test_non_adjacent_repeats_kept() {
        let path = single(&[(1, 10), (2, 20), (3, 10)], &[10, 20]);
        assert_eq!(path.rule_ids(), vec![10, 20, 10]);
        assert_eq!(path.first(), Some(10));
        assert_eq!(path.last(), Some(10));
    }

    #[test]
    fn test_unregistered_nodes_dropped() {
        let path = single(&[(1, 10), (2, 99), (3, 20)], &[10, 20]);
        assert_eq!(path.rule_ids(), vec![10, 20]);
    }

    #[test]
    fn test_dedup_spans_dropped_events() {
        // 10, <unknown>, 10 collapses since the unknown visit never lands
        let path = single(&[(1, 10), (2, 99), (3, 10)], &[10]);
        assert_eq!(path.rule_ids(), vec![10]);
    }
}
