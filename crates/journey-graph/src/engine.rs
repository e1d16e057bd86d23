use crate::recommend::recommend;
use crate::status::{compute_statuses, StatusSummary};
use crate::validator::{GraphValidator, SpacingThresholds, ValidatedCatalog, ValidationReport};
use crate::Catalog;
use journey_core::{
    CatalogSource, CompletionSet, NodeId, RecommendationSettings, Result, StatusMap,
};
use serde::Serialize;
use tracing::debug;

/// Result of one status computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JourneyView {
    pub statuses: StatusMap,
    pub next: Option<NodeId>,
    pub summary: StatusSummary,
}

/// Holds a validated catalog and derives views from completion snapshots.
///
/// The engine never stores progress. Every call to [`JourneyEngine::evaluate`] is a
/// fresh computation over the snapshot it is given.
#[derive(Debug, Clone)]
pub struct JourneyEngine {
    catalog: Catalog,
    report: ValidationReport,
}

impl JourneyEngine {
    pub fn new(validated: ValidatedCatalog) -> Self {
        let (catalog, report) = validated.into_parts();
        Self { catalog, report }
    }

    /// Reads, indexes and validates the catalog exposed by `source`.
    pub fn load<S: CatalogSource + ?Sized>(source: &S, thresholds: SpacingThresholds) -> Result<Self> {
        let records = source.list_nodes()?;
        let validated = GraphValidator::new(thresholds).validate_records(records)?;
        Ok(Self::new(validated))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn evaluate(
        &self,
        completed: &CompletionSet,
        settings: &RecommendationSettings,
    ) -> Result<JourneyView> {
        let mut statuses = compute_statuses(&self.catalog, completed)?;
        let next = recommend(&self.catalog, &mut statuses, settings);
        let summary = StatusSummary::from_map(&statuses);

        debug!(
            completed = summary.completed,
            available = summary.available,
            locked = summary.locked,
            next = next.as_deref().unwrap_or("-"),
            "journey evaluated"
        );

        Ok(JourneyView {
            statuses,
            next,
            summary,
        })
    }

    /// Takes a single completion snapshot from `source`, then evaluates against it.
    pub fn evaluate_source<S: CatalogSource + ?Sized>(
        &self,
        source: &S,
        settings: &RecommendationSettings,
    ) -> Result<JourneyView> {
        let snapshot = source.list_completed_ids()?;
        self.evaluate(&snapshot, settings)
    }
}
