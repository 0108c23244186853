//! Reducer trait: one statistical view over the call paths

use super::types::ReducerInput;
use serde::Serialize;

/// A pure reduction of the path collection (and tree) into one view
///
/// Reducers never fail: an empty path collection yields an empty or
/// zero-valued output.
///
/// # Example
///
/// ```ignore
/// struct PathCount;
///
/// impl PathReducer for PathCount {
///     type Output = usize;
///     fn id(&self) -> &'static str { "path_count" }
///     fn reduce(&self, input: &ReducerInput<'_>) -> usize { input.paths.len() }
/// }
/// ```
pub trait PathReducer {
    type Output: Serialize;

    /// Stable identifier, also the view's key in the bundle
    fn id(&self) -> &'static str;

    fn reduce(&self, input: &ReducerInput<'_>) -> Self::Output;
}
