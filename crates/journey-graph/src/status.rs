use crate::Catalog;
use journey_core::{
    CompletionSet, ComputedStatus, JourneyError, NodeStatus, Result, StatusMap,
};
use serde::Serialize;
use tracing::debug;

/// First pass of status derivation: completed, locked (with unmet dependencies) or
/// available. Promotion to `next` is applied separately by the recommender.
///
/// A dependency that is not in the catalog is never treated as satisfied; it fails
/// with [`JourneyError::LogicalInconsistency`].
pub fn compute_statuses(catalog: &Catalog, completed: &CompletionSet) -> Result<StatusMap> {
    let mut statuses = StatusMap::new();

    for node in catalog.nodes() {
        if completed.contains(&node.id) {
            statuses.insert(node.id.clone(), ComputedStatus::completed());
            continue;
        }

        let mut unmet = Vec::new();
        for dependency in &node.dependencies {
            if !catalog.contains(dependency) {
                return Err(JourneyError::LogicalInconsistency {
                    node: node.id.clone(),
                    missing: dependency.clone(),
                });
            }
            if !completed.contains(dependency) {
                unmet.push(dependency.clone());
            }
        }

        let status = if unmet.is_empty() {
            ComputedStatus::available()
        } else {
            ComputedStatus::locked(unmet)
        };
        statuses.insert(node.id.clone(), status);
    }

    let unknown = completed.iter().filter(|id| !catalog.contains(id)).count();
    if unknown > 0 {
        debug!(unknown, "completion set references ids outside the catalog");
    }

    Ok(statuses)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub completed: usize,
    pub available: usize,
    pub next: usize,
    pub locked: usize,
    pub percent_complete: f64,
}

impl StatusSummary {
    pub fn from_map(statuses: &StatusMap) -> Self {
        let mut summary = Self {
            total: statuses.len(),
            ..Self::default()
        };
        for status in statuses.values() {
            match status.status {
                NodeStatus::Completed => summary.completed += 1,
                NodeStatus::Available => summary.available += 1,
                NodeStatus::Next => summary.next += 1,
                NodeStatus::Locked => summary.locked += 1,
            }
        }
        if summary.total > 0 {
            summary.percent_complete = summary.completed as f64 * 100.0 / summary.total as f64;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use journey_core::{NodeRecord, NodeType};

    fn spiral(id: &str, order: i64) -> NodeRecord {
        NodeRecord::new(id, NodeType::Spiral).with_spiral_position(0.0, order as f64 * 100.0, order)
    }

    fn chain() -> Catalog {
        Catalog::new(vec![
            spiral("a", 1),
            spiral("b", 2).with_dependencies(["a"]),
            spiral("c", 3).with_dependencies(["a", "b"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_first_pass_statuses() {
        let statuses = compute_statuses(&chain(), &CompletionSet::new()).unwrap();
        assert_eq!(statuses["a"], ComputedStatus::available());
        assert_eq!(statuses["b"], ComputedStatus::locked(vec!["a".into()]));
        assert_eq!(
            statuses["c"],
            ComputedStatus::locked(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_completion_unlocks_dependents() {
        let completed: CompletionSet = ["a"].into_iter().collect();
        let statuses = compute_statuses(&chain(), &completed).unwrap();
        assert_eq!(statuses["a"].status, NodeStatus::Completed);
        assert_eq!(statuses["b"].status, NodeStatus::Available);
        assert_eq!(statuses["c"].unmet_dependencies, vec!["b".to_string()]);
    }

    #[test]
    fn test_completed_node_with_unmet_dependencies_stays_completed() {
        let completed: CompletionSet = ["c"].into_iter().collect();
        let statuses = compute_statuses(&chain(), &completed).unwrap();
        assert_eq!(statuses["c"], ComputedStatus::completed());
    }

    #[test]
    fn test_missing_dependency_fails_loudly() {
        // Catalog::new does not check references, so this reaches the engine unvalidated.
        let catalog = Catalog::new(vec![spiral("a", 1).with_dependencies(["ghost"])]).unwrap();
        let err = compute_statuses(&catalog, &CompletionSet::new()).unwrap_err();
        match err {
            JourneyError::LogicalInconsistency { node, missing } => {
                assert_eq!(node, "a");
                assert_eq!(missing, "ghost");
            }
            other => panic!("unexpected error: {other}"),
        }

        // Even when the missing id is marked complete.
        let completed: CompletionSet = ["ghost"].into_iter().collect();
        assert!(compute_statuses(&catalog, &completed).is_err());
    }

    #[test]
    fn test_idempotent() {
        let completed: CompletionSet = ["a", "unknown"].into_iter().collect();
        let first = compute_statuses(&chain(), &completed).unwrap();
        let second = compute_statuses(&chain(), &completed).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_summary_counts() {
        let completed: CompletionSet = ["a"].into_iter().collect();
        let statuses = compute_statuses(&chain(), &completed).unwrap();
        let summary = StatusSummary::from_map(&statuses);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.available, 1);
        assert_eq!(summary.locked, 1);
        assert!((summary.percent_complete - 100.0 / 3.0).abs() < 1e-9);

        assert_eq!(StatusSummary::from_map(&StatusMap::new()).percent_complete, 0.0);
    }
}
