//! The analytics bundle: everything one batch produces, as one JSON object

use crate::analysis::AnalyticsViews;
use crate::ingest::FileDiagnostic;
use crate::paths::CallPathMap;
use crate::tree::TreeNode;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Serialize-only: the flattened views carry integer-keyed maps, which serde
/// cannot read back through `flatten`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsBundle {
    pub button_tree: Vec<TreeNode>,
    pub call_paths: CallPathMap,

    /// Views sit at the top level next to the tree and paths
    #[serde(flatten)]
    pub views: AnalyticsViews,

    /// Files in the batch, skipped ones included
    pub files_processed: usize,
    pub total_nodes: usize,
    /// Calls with at least one accepted event
    pub total_calls: usize,

    /// File names in upload order, as used to qualify call ids
    pub file_names: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub skipped_files: Vec<FileDiagnostic>,
}

impl AnalyticsBundle {
    /// Compact JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Number of nodes in the display tree (nodes reachable from a root)
    pub fn tree_size(&self) -> usize {
        self.button_tree.iter().map(TreeNode::size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_bundle() -> AnalyticsBundle {
        AnalyticsBundle {
            button_tree: Vec::new(),
            call_paths: CallPathMap::new(),
            views: AnalyticsViews::default(),
            files_processed: 1,
            total_nodes: 0,
            total_calls: 0,
            file_names: vec!["a.csv".into()],
            generated_at: Utc::now(),
            skipped_files: Vec::new(),
        }
    }

    #[test]
    fn test_views_are_flattened() {
        let json: serde_json::Value =
            serde_json::from_str(&empty_bundle().to_json().unwrap()).unwrap();
        let object = json.as_object().unwrap();

        for key in [
            "button_tree",
            "call_paths",
            "lengths_summary",
            "top_intents_top10",
            "coverage_ratio",
            "files_processed",
            "total_nodes",
            "total_calls",
            "generated_at",
        ] {
            assert!(object.contains_key(key), "missing {}", key);
        }
        assert!(!object.contains_key("views"));
        assert_eq!(json["lengths_summary"]["count"], 0);
    }

    #[test]
    fn test_pretty_and_compact_agree() {
        let bundle = empty_bundle();
        let compact: serde_json::Value = serde_json::from_str(&bundle.to_json().unwrap()).unwrap();
        let pretty: serde_json::Value =
            serde_json::from_str(&bundle.to_json_pretty().unwrap()).unwrap();
        assert_eq!(compact, pretty);
        assert_eq!(compact["file_names"][0], "a.csv");
    }
}
