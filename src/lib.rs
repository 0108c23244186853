//! Callpath: decision-tree and navigation analytics for call-center logs
//!
//! Takes one or more CSV exports of an IVR / chat-bot menu (one row per
//! button press) and derives the button tree, one navigation path per call,
//! and a set of descriptive statistics over those paths.
//!
//! # Core Concepts
//!
//! - **Nodes**: rules/buttons, registered once per id (first seen wins)
//! - **Calls**: one caller interaction, namespaced by its source file
//! - **Call paths**: a call's visits in sequence order, with adjacent repeats
//!   collapsed
//! - **Views**: pure reductions of the paths and tree (funnels, entropy,
//!   anomalies, ...)
//!
//! # Example
//!
//! ```
//! use callpath::{Pipeline, SourceFile};
//!
//! let csv = "call_id,call_date,rule_id,rule_parent_id,rule_text\n\
//!            1,2024-01-07,10,0,Main menu\n\
//!            1,2024-01-07,20,10,Billing\n";
//! let bundle = Pipeline::default()
//!     .run(&[SourceFile::new("calls.csv", csv)])
//!     .unwrap();
//!
//! assert_eq!(bundle.total_calls, 1);
//! assert_eq!(bundle.call_paths["call::calls.csv::1"].rule_ids(), vec![10, 20]);
//! ```

pub mod analysis;
pub mod bundle;
pub mod config;
pub mod export;
pub mod ingest;
pub mod paths;
pub mod pipeline;
pub mod source;
pub mod tree;

pub use analysis::{AnalyticsEngine, AnalyticsViews, PathReducer};
pub use bundle::AnalyticsBundle;
pub use config::{AnalyticsConfig, ConfigError, ViewLimits};
pub use export::{write_bundle, write_views, ExportError};
pub use ingest::{FileDiagnostic, FileErrorPolicy, NodeData, RuleId};
pub use paths::{CallPath, CallPathMap, PathStep};
pub use pipeline::{BatchError, Pipeline, ProcessingProgress, ProcessingStage};
pub use source::{CsvSource, InMemorySource, PathSource, SourceError, SourceFile};
pub use tree::{TreeBuilder, TreeError, TreeNode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
