//! Descriptive statistics over reconstructed call paths
//!
//! # Architecture
//!
//! - **PathReducer trait**: one pure view computed from a [`ReducerInput`]
//! - **ReducerInput**: the paths plus the tree, with reach and transition
//!   counts computed once and shared by every reducer
//! - **AnalyticsEngine**: runs the built-in reducers with configured limits
//!   and collects their outputs into [`AnalyticsViews`]
//!
//! # Built-in Reducers
//!
//! - **Length views**: lengths summary, depth funnel
//! - **Endpoint views**: top intents, leaf frequency
//! - **Branching views**: branch distribution, entropy, coverage, anomalies
//! - **Funnel views**: node funnel, dead ends, unreachable nodes
//! - **Traffic views**: top paths, URL engagement, weekday trends
//! - **Catalog views**: duplicate texts
//!
//! # Example
//!
//! ```ignore
//! use callpath::analysis::AnalyticsEngine;
//! use callpath::config::AnalyticsConfig;
//!
//! let engine = AnalyticsEngine::new(&AnalyticsConfig::default());
//! let views = engine.analyze(&paths, &batch.nodes, &batch.children);
//! println!("{} calls", views.lengths_summary.count);
//! ```

mod engine;
pub mod reducers;
mod traits;
mod types;

pub use engine::{AnalyticsEngine, AnalyticsViews};
pub use traits::PathReducer;
pub use types::{
    Anomaly, BranchDistribution, BranchEntry, Coverage, DeadEnd, DepthCount, DuplicateGroup,
    EntropyEntry, FunnelEntry, LengthsSummary, NodeFunnel, PathCount, RankedNode, ReducerInput,
    Transitions, UnreachableNode, UrlCount, WeekdayTrends,
};
