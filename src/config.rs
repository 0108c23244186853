//! Analytics configuration
//!
//! Read from an explicit YAML file, else `<config dir>/callpath/config.yaml`,
//! else defaults. Every field is optional in the file.

use crate::analysis::reducers::DEFAULT_ROOT_ID;
use crate::ingest::{FileErrorPolicy, RuleId};
use crate::tree::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Node treated as the menu root when picking a call's intent
    pub root_intent_id: RuleId,

    pub limits: ViewLimits,

    /// Deepest tree the builder will expand before rejecting the batch
    pub max_tree_depth: usize,

    pub file_error_policy: FileErrorPolicy,

    /// Parse files on blocking tasks in `Pipeline::run_async`
    pub concurrent_parse: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            root_intent_id: DEFAULT_ROOT_ID,
            limits: ViewLimits::default(),
            max_tree_depth: DEFAULT_MAX_DEPTH,
            file_error_policy: FileErrorPolicy::default(),
            concurrent_parse: true,
        }
    }
}

/// How many rows each ranked view keeps
///
/// Bundle field names keep their `top10`/`top20` suffixes whatever these are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewLimits {
    pub top_intents: usize,
    pub leaf_frequency: usize,
    /// Children kept per node in the branch distribution
    pub branch_children: usize,
    pub entropy: usize,
    pub top_paths: usize,
    pub dead_ends: usize,
    pub url_engagement: usize,
    pub anomalies: usize,
}

impl Default for ViewLimits {
    fn default() -> Self {
        Self {
            top_intents: 10,
            leaf_frequency: 20,
            branch_children: 10,
            entropy: 20,
            top_paths: 20,
            dead_ends: 20,
            url_engagement: 20,
            anomalies: 20,
        }
    }
}

impl AnalyticsConfig {
    /// Load from `path` when given, else from the user config dir, else defaults
    ///
    /// An explicit path must exist; the user config file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&contents)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// `<config dir>/callpath/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("callpath").join("config.yaml"))
    }
}
