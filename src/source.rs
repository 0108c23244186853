//! CSV sources: where a batch's documents come from
//!
//! The pipeline only sees named CSV texts. A [`CsvSource`] yields them in
//! upload order; the order matters because node definitions are first-seen
//! wins across files.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no such file or directory: {0}")]
    NotFound(PathBuf),
}

/// One uploaded CSV document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Used only to qualify call ids
    pub name: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Supplies the documents of one batch
#[async_trait]
pub trait CsvSource: Send + Sync {
    /// Human-readable description for logs
    fn describe(&self) -> String;

    /// All documents, in upload order
    async fn load(&self) -> Result<Vec<SourceFile>, SourceError>;
}

/// Documents already held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    files: Vec<SourceFile>,
}

impl InMemorySource {
    pub fn new(files: Vec<SourceFile>) -> Self {
        Self { files }
    }

    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.push(SourceFile::new(name, content));
        self
    }
}

#[async_trait]
impl CsvSource for InMemorySource {
    fn describe(&self) -> String {
        format!("{} in-memory file(s)", self.files.len())
    }

    async fn load(&self) -> Result<Vec<SourceFile>, SourceError> {
        Ok(self.files.clone())
    }
}

/// Files and directories on disk
///
/// Paths are taken in the order given. A directory contributes its `*.csv`
/// entries (not recursive), sorted by file name.
#[derive(Debug, Clone, Default)]
pub struct PathSource {
    paths: Vec<PathBuf>,
}

impl PathSource {
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Expand directories into their CSV files
    pub async fn resolve(&self) -> Result<Vec<PathBuf>, SourceError> {
        let mut files = Vec::new();
        for path in &self.paths {
            let meta = tokio::fs::metadata(path)
                .await
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => SourceError::NotFound(path.clone()),
                    _ => io_error(path, e),
                })?;
            if meta.is_dir() {
                files.extend(csv_files_in(path).await?);
            } else {
                files.push(path.clone());
            }
        }
        Ok(files)
    }
}

async fn csv_files_in(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| io_error(dir, e))?;
    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(dir, e))? {
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            found.push(path);
        }
    }
    found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    tracing::debug!(dir = %dir.display(), files = found.len(), "scanned directory");
    Ok(found)
}

fn io_error(path: &Path, source: std::io::Error) -> SourceError {
    SourceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[async_trait]
impl CsvSource for PathSource {
    fn describe(&self) -> String {
        let shown: Vec<String> = self.paths.iter().map(|p| p.display().to_string()).collect();
        shown.join(", ")
    }

    async fn load(&self) -> Result<Vec<SourceFile>, SourceError> {
        let mut out = Vec::new();
        for path in self.resolve().await? {
            let bytes = tokio::fs::read(&path).await.map_err(|e| io_error(&path, e))?;
            // Exports from some dialers are not valid UTF-8; keep what decodes
            let content = String::from_utf8_lossy(&bytes).into_owned();
            out.push(SourceFile::new(display_name(&path), content));
        }
        Ok(out)
    }
}
