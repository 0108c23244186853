//! Multi-file merger
//!
//! Folds per-file parse outputs into one node registry, one adjacency and one
//! call map. Node definitions follow first-write-wins in upload order, child
//! sets are unioned, and every call id is qualified by its file.

use super::parser::ParseError;
use super::types::{Adjacency, CallRecord, NodeRegistry, ParsedFile};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// What to do when one file of a batch fails to parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorPolicy {
    /// Drop the file, record a diagnostic, keep merging (default)
    #[default]
    Skip,
    /// Fail the whole batch on the first bad file
    Abort,
}

/// A file that contributed nothing to the batch, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiagnostic {
    pub file: String,
    pub reason: String,
}

/// Raised by the merger under [`FileErrorPolicy::Abort`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse '{file}': {source}")]
pub struct MergeError {
    pub file: String,
    #[source]
    pub source: ParseError,
}

/// Parse outcome for one named file, in upload order
#[derive(Debug, Clone)]
pub struct FileParse {
    pub name: String,
    pub result: Result<ParsedFile, ParseError>,
}

impl FileParse {
    pub fn new(name: impl Into<String>, result: Result<ParsedFile, ParseError>) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }
}

/// Global structures produced by merging a batch
#[derive(Debug, Clone, Default)]
pub struct MergedBatch {
    pub nodes: NodeRegistry,
    pub children: Adjacency,
    /// `<file>::<call id>` -> events and metadata
    pub calls: BTreeMap<String, CallRecord>,
    /// Qualified file names in upload order, including skipped ones
    pub file_names: Vec<String>,
    pub skipped: Vec<FileDiagnostic>,
    /// Rows across the batch whose parent id disagreed with the registered one
    pub parent_conflicts: usize,
    pub rows_scanned: u64,
}

impl MergedBatch {
    pub fn files_processed(&self) -> usize {
        self.file_names.len()
    }
}

/// Merges parsed files
#[derive(Debug, Clone, Default)]
pub struct BatchMerger {
    policy: FileErrorPolicy,
}

impl BatchMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file-level error policy
    pub fn with_policy(mut self, policy: FileErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FileErrorPolicy {
        self.policy
    }

    /// Merge files in the order given
    ///
    /// Each file is expected to number its rows from 1; events are rebased onto
    /// one running counter so that ordering stays monotonic across the batch.
    pub fn merge(&self, files: Vec<FileParse>) -> Result<MergedBatch, MergeError> {
        let mut batch = MergedBatch::default();
        let mut taken: HashSet<String> = HashSet::new();

        for file in files {
            let qualified = qualify_name(&file.name, &taken);
            taken.insert(qualified.clone());
            batch.file_names.push(qualified.clone());

            let parsed = match file.result {
                Ok(parsed) => parsed,
                Err(source) => match self.policy {
                    FileErrorPolicy::Abort => {
                        return Err(MergeError {
                            file: qualified,
                            source,
                        })
                    }
                    FileErrorPolicy::Skip => {
                        tracing::warn!(file = %qualified, error = %source, "skipping unparsable file");
                        batch.skipped.push(FileDiagnostic {
                            file: qualified,
                            reason: source.to_string(),
                        });
                        continue;
                    }
                },
            };

            tracing::debug!(
                file = %qualified,
                nodes = parsed.nodes.len(),
                calls = parsed.calls.len(),
                rows = parsed.rows_scanned,
                skipped_rows = parsed.rows_skipped,
                "merging file"
            );
            self.merge_file(&mut batch, &qualified, parsed);
        }

        if batch.parent_conflicts > 0 {
            tracing::warn!(
                rows = batch.parent_conflicts,
                "rule ids seen with inconsistent parent ids (kept first seen)"
            );
        }

        Ok(batch)
    }

    fn merge_file(&self, batch: &mut MergedBatch, file: &str, parsed: ParsedFile) {
        let offset = batch.rows_scanned;
        batch.rows_scanned += parsed.rows_scanned;
        batch.parent_conflicts += parsed.parent_conflicts.len();

        for (id, node) in parsed.nodes {
            match batch.nodes.get(&id) {
                Some(existing) => {
                    if existing.parent_id != node.parent_id {
                        batch.parent_conflicts += 1;
                    }
                }
                None => {
                    batch.nodes.insert(id, node);
                }
            }
        }

        for (parent, children) in parsed.children {
            batch.children.entry(parent).or_default().extend(children);
        }

        for (call_id, mut record) in parsed.calls {
            for event in &mut record.events {
                event.seq += offset;
            }
            batch.calls.insert(format!("{}::{}", file, call_id), record);
        }
    }
}

/// The upload name, or `<name>#<n>` with the smallest n >= 2 not yet taken
fn qualify_name(name: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }
    (2..)
        .map(|n| format!("{}#{}", name, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}
