//! Writing bundles to disk

use crate::bundle::AnalyticsBundle;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {what}: {source}")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The headline numbers, small enough to read at a glance
#[derive(Debug, Serialize)]
struct Summary<'a> {
    files_processed: usize,
    total_nodes: usize,
    total_calls: usize,
    lengths_summary: &'a crate::analysis::LengthsSummary,
    weekday_trends: &'a crate::analysis::WeekdayTrends,
    top_intents_top10: &'a [crate::analysis::RankedNode],
    dead_ends_top20: &'a [crate::analysis::DeadEnd],
    entropy_complexity_top20: &'a [crate::analysis::EntropyEntry],
}

fn to_json<T: Serialize + ?Sized>(value: &T, what: &str, pretty: bool) -> Result<String, ExportError> {
    let result = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    result.map_err(|source| ExportError::Json {
        what: what.to_string(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the whole bundle as one JSON document
pub fn write_bundle(bundle: &AnalyticsBundle, path: &Path, pretty: bool) -> Result<(), ExportError> {
    write_file(path, &to_json(bundle, "bundle", pretty)?)
}

/// Write every top-level bundle field to `<dir>/<field>.json`, plus a
/// `summary.json`. Returns the files written, summary last.
pub fn write_views(bundle: &AnalyticsBundle, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let value = serde_json::to_value(bundle).map_err(|source| ExportError::Json {
        what: "bundle".to_string(),
        source,
    })?;
    let mut written = Vec::new();

    if let serde_json::Value::Object(fields) = value {
        for (key, field) in &fields {
            let path = dir.join(format!("{}.json", key));
            write_file(&path, &to_json(field, key, true)?)?;
            written.push(path);
        }
    }

    let views = &bundle.views;
    let summary = Summary {
        files_processed: bundle.files_processed,
        total_nodes: bundle.total_nodes,
        total_calls: bundle.total_calls,
        lengths_summary: &views.lengths_summary,
        weekday_trends: &views.weekday_trends,
        top_intents_top10: &views.top_intents_top10,
        dead_ends_top20: &views.dead_ends_top20,
        entropy_complexity_top20: &views.entropy_complexity_top20,
    };
    let path = dir.join("summary.json");
    write_file(&path, &to_json(&summary, "summary", true)?)?;
    written.push(path);

    tracing::info!(dir = %dir.display(), files = written.len(), "wrote views");
    Ok(written)
}
