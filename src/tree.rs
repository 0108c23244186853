//! Tree builder: node registry + adjacency to the nested button tree
//!
//! Siblings are ordered by Unicode collation of their text (CLDR root order,
//! which keeps Hebrew and Latin labels in dictionary order), then by id.

use crate::ingest::{Adjacency, NodeData, NodeRegistry, RuleId};
use feruca::Collator;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Default nesting limit before the tree is declared malformed
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// One node of the display tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub rule_id: RuleId,
    pub parent_id: RuleId,
    pub text: String,
    pub url: Option<String>,
    /// Absent for leaves, never an empty list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    fn leaf(node: &NodeData) -> Self {
        Self {
            rule_id: node.rule_id,
            parent_id: node.parent_id,
            text: node.text.clone(),
            url: node.url.clone(),
            children: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Number of nodes in this subtree, itself included
    pub fn size(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(TreeNode::size)
            .sum::<usize>()
    }

    /// Longest root-to-leaf chain, counting this node as depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(TreeNode::depth)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("malformed tree: node {rule_id} is nested deeper than {limit} levels")]
    Malformed { rule_id: RuleId, limit: usize },
}

/// Builds the display tree
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    max_depth: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Expand every root (parent id 0) into a nested tree
    ///
    /// A child is placed under a parent only when its registered parent id
    /// matches, so every node appears at most once. Adjacency entries that
    /// point at unknown nodes or disagree with the registered parent are
    /// skipped and logged.
    pub fn build(
        &self,
        nodes: &NodeRegistry,
        children: &Adjacency,
    ) -> Result<Vec<TreeNode>, TreeError> {
        let mut expander = Expander {
            nodes,
            children,
            collator: Collator::default(),
            max_depth: self.max_depth,
        };

        let mut roots: Vec<&NodeData> = nodes.values().filter(|n| n.is_root()).collect();
        expander.sort(&mut roots);

        roots
            .into_iter()
            .map(|root| expander.expand(root, 1))
            .collect()
    }
}

struct Expander<'a> {
    nodes: &'a NodeRegistry,
    children: &'a Adjacency,
    collator: Collator,
    max_depth: usize,
}

impl<'a> Expander<'a> {
    fn sort(&mut self, siblings: &mut [&NodeData]) {
        let collator = &mut self.collator;
        siblings.sort_by(|a, b| compare_siblings(collator, a, b));
    }

    fn expand(&mut self, node: &NodeData, depth: usize) -> Result<TreeNode, TreeError> {
        if depth > self.max_depth {
            return Err(TreeError::Malformed {
                rule_id: node.rule_id,
                limit: self.max_depth,
            });
        }

        let mut kids: Vec<&'a NodeData> = Vec::new();
        for child_id in self.children.get(&node.rule_id).into_iter().flatten() {
            match self.nodes.get(child_id) {
                Some(child) if child.parent_id == node.rule_id => kids.push(child),
                Some(child) => tracing::debug!(
                    parent = node.rule_id,
                    child = child_id,
                    registered_parent = child.parent_id,
                    "child placed under its registered parent instead"
                ),
                None => tracing::debug!(
                    parent = node.rule_id,
                    child = child_id,
                    "adjacency refers to an unregistered node"
                ),
            }
        }

        let mut tree_node = TreeNode::leaf(node);
        if kids.is_empty() {
            return Ok(tree_node);
        }

        self.sort(&mut kids);
        let expanded = kids
            .into_iter()
            .map(|kid| self.expand(kid, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;
        tree_node.children = Some(expanded);
        Ok(tree_node)
    }
}

fn compare_siblings(collator: &mut Collator, a: &NodeData, b: &NodeData) -> Ordering {
    collator
        .collate(a.text.as_str(), b.text.as_str())
        .then_with(|| a.rule_id.cmp(&b.rule_id))
}
