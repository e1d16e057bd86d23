use crate::{CompletionSet, NodeId, NodeRecord, RecommendationSettings, Result};

/// Supplies the catalog and the user's completion flags.
///
/// Both reads must be consistent for the duration of one computation; callers take
/// one snapshot of each and never re-read mid-computation.
pub trait CatalogSource {
    fn list_nodes(&self) -> Result<Vec<NodeRecord>>;
    fn list_completed_ids(&self) -> Result<CompletionSet>;
}

/// Owner of the externally mutable progress state.
///
/// Statuses are never patched after a mutation; callers re-run the engine instead.
pub trait ProgressStore {
    fn mark_completed(&self, id: &str, completed: bool) -> Result<()>;
    fn set_current_node(&self, id: Option<NodeId>) -> Result<()>;
    fn set_current_spiral_order(&self, order: Option<i64>) -> Result<()>;
    fn settings(&self) -> Result<RecommendationSettings>;
}
