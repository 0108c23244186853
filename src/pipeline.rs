//! Batch pipeline: sources -> parse -> merge -> tree and paths -> views
//!
//! One run owns all of its state. Files may be parsed concurrently, but
//! their outcomes are merged in upload order so results never depend on
//! scheduling.

use crate::analysis::AnalyticsEngine;
use crate::bundle::AnalyticsBundle;
use crate::config::AnalyticsConfig;
use crate::ingest::{BatchMerger, FileParse, MergeError, ParseError, RecordParser};
use crate::paths::reconstruct_paths;
use crate::source::{CsvSource, SourceError, SourceFile};
use crate::tree::{TreeBuilder, TreeError};
use chrono::Utc;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;
use thiserror::Error;

/// Batch-level failure; row and (under the skip policy) file problems never
/// surface here
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("no files in batch")]
    NoFiles,

    #[error("failed to parse '{file}': {source}")]
    FileFailed {
        file: String,
        #[source]
        source: ParseError,
    },

    #[error("no usable data in {files} file(s)")]
    NoUsableData { files: usize },

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("parse task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl BatchError {
    /// Stable machine-readable tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoFiles => "no_files",
            Self::FileFailed { .. } => "file_failed",
            Self::NoUsableData { .. } => "no_usable_data",
            Self::Tree(_) => "malformed_tree",
            Self::Source(_) => "source",
            Self::Task(_) => "task",
        }
    }
}

impl From<MergeError> for BatchError {
    fn from(e: MergeError) -> Self {
        Self::FileFailed {
            file: e.file,
            source: e.source,
        }
    }
}

/// Serialized as `{"kind": ..., "message": ...}`
impl Serialize for BatchError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BatchError", 2)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    Reading,
    Parsing,
    Analyzing,
    Complete,
}

/// Snapshot delivered to the progress callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingProgress {
    pub stage: ProcessingStage,
    pub files_processed: usize,
    pub total_files: usize,
    pub current_file: Option<String>,
    /// 0 to 100
    pub percentage: f64,
}

type ProgressFn = dyn Fn(&ProcessingProgress) + Send + Sync;

/// Runs one batch end to end
#[derive(Clone, Default)]
pub struct Pipeline {
    config: AnalyticsConfig,
    progress: Option<Arc<ProgressFn>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Pipeline {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Receive a progress snapshot at each stage
    pub fn with_progress(
        mut self,
        callback: impl Fn(&ProcessingProgress) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Analyze documents already in memory, parsing them on this thread
    pub fn run(&self, files: &[SourceFile]) -> Result<AnalyticsBundle, BatchError> {
        if files.is_empty() {
            return Err(BatchError::NoFiles);
        }
        let total = files.len();
        let mut parses = Vec::with_capacity(total);
        for (i, file) in files.iter().enumerate() {
            self.report(ProcessingStage::Parsing, i, total, Some(&file.name), parsing_pct(i, total));
            // Sequence numbers restart per file; the merger rebases them
            let result = RecordParser::new().parse(&file.content);
            parses.push(FileParse::new(&file.name, result));
        }
        self.finish(parses)
    }

    /// Load from `source`, then parse each file on a blocking task when
    /// `concurrent_parse` is set
    pub async fn run_async(&self, source: &dyn CsvSource) -> Result<AnalyticsBundle, BatchError> {
        self.report(ProcessingStage::Reading, 0, 0, None, 0.0);
        let files = source.load().await?;
        if files.is_empty() {
            return Err(BatchError::NoFiles);
        }
        let total = files.len();
        tracing::info!(source = %source.describe(), files = total, "loaded batch");
        self.report(ProcessingStage::Reading, total, total, None, 30.0);

        if !self.config.concurrent_parse {
            return self.run(&files);
        }

        let handles: Vec<_> = files
            .into_iter()
            .map(|file| {
                let name = file.name;
                let content = file.content;
                let handle =
                    tokio::task::spawn_blocking(move || RecordParser::new().parse(&content));
                (name, handle)
            })
            .collect();

        let mut parses = Vec::with_capacity(total);
        for (i, (name, handle)) in handles.into_iter().enumerate() {
            let result = handle.await?;
            self.report(ProcessingStage::Parsing, i + 1, total, Some(&name), parsing_pct(i + 1, total));
            parses.push(FileParse::new(name, result));
        }
        self.finish(parses)
    }

    fn finish(&self, parses: Vec<FileParse>) -> Result<AnalyticsBundle, BatchError> {
        let total = parses.len();
        let batch = BatchMerger::new()
            .with_policy(self.config.file_error_policy)
            .merge(parses)?;

        if batch.nodes.is_empty() {
            return Err(BatchError::NoUsableData { files: total });
        }
        tracing::info!(
            files = batch.files_processed(),
            skipped = batch.skipped.len(),
            nodes = batch.nodes.len(),
            calls = batch.calls.len(),
            rows = batch.rows_scanned,
            "merged batch"
        );
        self.report(ProcessingStage::Analyzing, total, total, None, 70.0);
        let button_tree = TreeBuilder::new()
            .with_max_depth(self.config.max_tree_depth)
            .build(&batch.nodes, &batch.children)?;
        let call_paths = reconstruct_paths(&batch.nodes, &batch.calls);

        self.report(ProcessingStage::Analyzing, total, total, None, 85.0);
        let views = AnalyticsEngine::new(&self.config).analyze(
            &call_paths,
            &batch.nodes,
            &batch.children,
        );

        let bundle = AnalyticsBundle {
            button_tree,
            total_calls: call_paths.len(),
            call_paths,
            views,
            files_processed: batch.files_processed(),
            total_nodes: batch.nodes.len(),
            file_names: batch.file_names,
            generated_at: Utc::now(),
            skipped_files: batch.skipped,
        };
        tracing::info!(
            roots = bundle.button_tree.len(),
            calls = bundle.total_calls,
            "analysis complete"
        );
        self.report(ProcessingStage::Complete, total, total, None, 100.0);
        Ok(bundle)
    }

    fn report(
        &self,
        stage: ProcessingStage,
        files_processed: usize,
        total_files: usize,
        current_file: Option<&str>,
        percentage: f64,
    ) {
        if let Some(callback) = &self.progress {
            callback(&ProcessingProgress {
                stage,
                files_processed,
                total_files,
                current_file: current_file.map(str::to_string),
                percentage,
            });
        }
    }
}

fn parsing_pct(done: usize, total: usize) -> f64 {
    30.0 + 40.0 * done as f64 / total.max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::FileErrorPolicy;
    use crate::source::InMemorySource;
    use std::sync::Mutex;

    const HEADER: &str = "call_id,call_date,rule_id,rule_parent_id,rule_text,popUpURL";

    fn csv(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    fn sample() -> SourceFile {
        SourceFile::new(
            "calls.csv",
            csv(&[
                "1,2024-01-07,10,0,Main,",
                "1,2024-01-07,20,10,Billing,https://pay",
                "1,2024-01-07,20,10,Billing,https://pay",
                "2,garbage,10,0,Main,",
            ]),
        )
    }

    #[test]
    fn test_run_builds_bundle() {
        let bundle = Pipeline::default().run(&[sample()]).unwrap();

        assert_eq!(bundle.files_processed, 1);
        assert_eq!(bundle.total_nodes, 2);
        assert_eq!(bundle.total_calls, 2);
        assert_eq!(bundle.button_tree.len(), 1);
        assert_eq!(bundle.button_tree[0].rule_id, 10);

        let first = &bundle.call_paths["call::calls.csv::1"];
        assert_eq!(first.rule_ids(), vec![10, 20]);
        assert_eq!(first.weekday, Some(7));
        assert_eq!(bundle.views.weekday_trends["7"], 1);
        assert_eq!(bundle.views.weekday_trends["null"], 1);
        assert_eq!(bundle.views.url_engagement_top20[0].url, "https://pay");
    }

    #[test]
    fn test_no_files() {
        let err = Pipeline::default().run(&[]).unwrap_err();
        assert!(matches!(err, BatchError::NoFiles));
        assert_eq!(err.kind(), "no_files");
    }

    #[test]
    fn test_no_usable_data() {
        let file = SourceFile::new("empty.csv", csv(&["1,2024-01-01,abc,0,Bad,"]));
        let err = Pipeline::default().run(&[file]).unwrap_err();
        assert!(matches!(err, BatchError::NoUsableData { files: 1 }));
    }

    #[test]
    fn test_skip_policy_records_bad_file() {
        let bad = SourceFile::new("bad.csv", "");
        let bundle = Pipeline::default().run(&[bad, sample()]).unwrap();
        assert_eq!(bundle.files_processed, 2);
        assert_eq!(bundle.skipped_files.len(), 1);
        assert_eq!(bundle.skipped_files[0].file, "bad.csv");
        assert_eq!(bundle.file_names, vec!["bad.csv", "calls.csv"]);
    }

    #[test]
    fn test_abort_policy_fails_batch() {
        let config = AnalyticsConfig {
            file_error_policy: FileErrorPolicy::Abort,
            ..AnalyticsConfig::default()
        };
        let bad = SourceFile::new("bad.csv", "a,b\n1,2");
        let err = Pipeline::new(config).run(&[sample(), bad]).unwrap_err();
        match &err {
            BatchError::FileFailed { file, source } => {
                assert_eq!(file, "bad.csv");
                assert_eq!(*source, ParseError::MissingColumn("rule_id"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(err.kind(), "file_failed");
    }

    #[test]
    fn test_error_serializes_kind_and_message() {
        let json = serde_json::to_value(BatchError::NoUsableData { files: 3 }).unwrap();
        assert_eq!(json["kind"], "no_usable_data");
        assert_eq!(json["message"], "no usable data in 3 file(s)");
    }

    #[test]
    fn test_progress_stages() {
        let seen: Arc<Mutex<Vec<ProcessingProgress>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let pipeline =
            Pipeline::default().with_progress(move |p| sink.lock().unwrap().push(p.clone()));
        pipeline.run(&[sample()]).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first().unwrap().stage, ProcessingStage::Parsing);
        assert_eq!(seen.first().unwrap().current_file.as_deref(), Some("calls.csv"));
        let last = seen.last().unwrap();
        assert_eq!(last.stage, ProcessingStage::Complete);
        assert_eq!(last.percentage, 100.0);
        assert!(seen.windows(2).all(|w| w[0].percentage <= w[1].percentage));
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let files = vec![
            sample(),
            SourceFile::new("more.csv", csv(&["1,2024-01-08,10,0,Other,", "1,2024-01-08,30,10,Sales,"])),
        ];
        let sync = Pipeline::default().run(&files).unwrap();
        let source = InMemorySource::new(files);
        let concurrent = Pipeline::default().run_async(&source).await.unwrap();

        assert_eq!(concurrent.button_tree, sync.button_tree);
        assert_eq!(concurrent.call_paths, sync.call_paths);
        assert_eq!(concurrent.views, sync.views);
        // First definition of node 10 wins
        assert_eq!(concurrent.button_tree[0].text, "Main");
    }

    #[tokio::test]
    async fn test_async_serial_when_not_concurrent() {
        let config = AnalyticsConfig {
            concurrent_parse: false,
            ..AnalyticsConfig::default()
        };
        let source = InMemorySource::new(vec![sample()]);
        let bundle = Pipeline::new(config).run_async(&source).await.unwrap();
        assert_eq!(bundle.total_calls, 2);
    }

    #[tokio::test]
    async fn test_async_no_files() {
        let err = Pipeline::default()
            .run_async(&InMemorySource::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::NoFiles));
    }
}
