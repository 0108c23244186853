//! Core types shared by the parser and the merger

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Identifier of a rule (button) in the decision tree
pub type RuleId = u64;

/// Parent id that marks a root node
pub const ROOT_PARENT: RuleId = 0;

/// One distinct rule/button, registered once per id (first-seen wins)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    pub rule_id: RuleId,
    pub parent_id: RuleId,
    /// Display label; empty when the source had no text
    pub text: String,
    pub url: Option<String>,
}

impl NodeData {
    pub fn new(rule_id: RuleId, parent_id: RuleId, text: impl Into<String>) -> Self {
        Self {
            rule_id,
            parent_id,
            text: text.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Whether this node hangs directly off the (implicit) root
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_PARENT
    }

    /// Text to show for this node, falling back to its id
    pub fn label(&self) -> String {
        if self.text.is_empty() {
            self.rule_id.to_string()
        } else {
            self.text.clone()
        }
    }
}

/// Node registry keyed by rule id
pub type NodeRegistry = HashMap<RuleId, NodeData>;

/// Parent id -> ids of its immediate children
pub type Adjacency = HashMap<RuleId, BTreeSet<RuleId>>;

/// One observed visit of a rule within a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEvent {
    /// Row-arrival sequence number, only meaningful relative to other events
    pub seq: u64,
    pub rule_id: RuleId,
}

/// Per-call metadata captured on the first accepted row of a call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallMeta {
    /// Raw date string, kept only when it parsed
    pub call_date: Option<String>,
    /// ISO weekday, 1 = Monday .. 7 = Sunday
    pub weekday: Option<u8>,
}

/// Everything recorded for one call: its events plus metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRecord {
    pub events: Vec<CallEvent>,
    pub meta: CallMeta,
}

/// A rule id whose rows disagree on the parent id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentConflict {
    pub rule_id: RuleId,
    pub registered_parent: RuleId,
    pub seen_parent: RuleId,
}

/// Output of parsing one CSV document
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub nodes: NodeRegistry,
    pub children: Adjacency,
    /// Local call id -> events and metadata
    pub calls: BTreeMap<String, CallRecord>,
    /// Non-blank data rows scanned, accepted or not
    pub rows_scanned: u64,
    /// Rows dropped for a missing, non-numeric or zero rule id
    pub rows_skipped: u64,
    pub parent_conflicts: Vec<ParentConflict>,
}

impl ParsedFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events across every call in the file
    pub fn event_count(&self) -> usize {
        self.calls.values().map(|c| c.events.len()).sum()
    }

    /// Whether the file contributed no node at all
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
