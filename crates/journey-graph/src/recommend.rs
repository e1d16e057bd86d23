use crate::Catalog;
use journey_core::{NodeId, NodeRecord, NodeStatus, NodeType, RecommendationSettings, StatusMap};
use std::cmp::Reverse;
use tracing::{debug, warn};

/// Picks the single recommended node among the `available` ones.
///
/// Rules, first applicable wins:
/// 1. spiral continuation (when preferred): available spiral nodes by ascending
///    `order`, resuming at or after `current_spiral_order`, else the lowest order;
/// 2. tag overlap with the current node, spiral type first on ties, then catalog order;
///    without a known current node, the first available node in catalog order.
pub fn select_next(
    catalog: &Catalog,
    statuses: &StatusMap,
    settings: &RecommendationSettings,
) -> Option<NodeId> {
    let available: Vec<(usize, &NodeRecord)> = catalog
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, node)| {
            statuses
                .get(&node.id)
                .is_some_and(|s| s.status == NodeStatus::Available)
        })
        .collect();

    if available.is_empty() {
        return None;
    }

    if settings.prefer_spiral_continuation {
        if let Some(id) = spiral_continuation(&available, settings.current_spiral_order) {
            debug!(next = %id, "recommended by spiral continuation");
            return Some(id);
        }
    }

    let current = settings
        .current_node_id
        .as_deref()
        .and_then(|id| catalog.get(id));

    let Some(current) = current else {
        let (_, first) = available[0];
        debug!(next = %first.id, "recommended first available node");
        return Some(first.id.clone());
    };

    let best = available
        .iter()
        .min_by_key(|(position, node)| {
            (
                Reverse(node.tag_overlap(current)),
                node.node_type != NodeType::Spiral,
                *position,
            )
        })
        .map(|(_, node)| node.id.clone());

    if let Some(ref id) = best {
        debug!(next = %id, current = %current.id, "recommended by tag overlap");
    }
    best
}

fn spiral_continuation(
    available: &[(usize, &NodeRecord)],
    current_order: Option<i64>,
) -> Option<NodeId> {
    let mut candidates: Vec<(i64, &NodeRecord)> = available
        .iter()
        .filter(|(_, node)| node.node_type == NodeType::Spiral)
        .filter_map(|(_, node)| node.spiral_position().map(|p| (p.order, *node)))
        .collect();
    // Stable: equal orders keep catalog order.
    candidates.sort_by_key(|(order, _)| *order);

    let resumed = current_order.and_then(|current| {
        candidates
            .iter()
            .find(|(order, _)| *order >= current)
    });

    resumed
        .or_else(|| candidates.first())
        .map(|(_, node)| node.id.clone())
}

/// Promotes `next` to [`NodeStatus::Next`] if it is currently available.
///
/// Returns the promoted id. Anything else leaves the map untouched, so at most one
/// node is ever `next`.
pub fn apply_recommendation(statuses: &mut StatusMap, next: Option<&str>) -> Option<NodeId> {
    let id = next?;
    match statuses.get_mut(id) {
        Some(status) if status.status == NodeStatus::Available => {
            status.status = NodeStatus::Next;
            Some(id.to_string())
        }
        Some(status) => {
            warn!(node = id, status = %status.status, "recommended node is not available; skipping promotion");
            None
        }
        None => {
            warn!(node = id, "recommended node has no computed status; skipping promotion");
            None
        }
    }
}

/// Select and promote in one step.
pub fn recommend(
    catalog: &Catalog,
    statuses: &mut StatusMap,
    settings: &RecommendationSettings,
) -> Option<NodeId> {
    let next = select_next(catalog, statuses, settings);
    apply_recommendation(statuses, next.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute_statuses;
    use journey_core::{CompletionSet, ComputedStatus};

    fn spiral(id: &str, order: i64) -> NodeRecord {
        NodeRecord::new(id, NodeType::Spiral).with_spiral_position(0.0, order as f64 * 100.0, order)
    }

    fn tree(id: &str, x: f64) -> NodeRecord {
        NodeRecord::new(id, NodeType::Tree).with_tree_position(x, 0.0, "main", 0, None)
    }

    fn statuses(catalog: &Catalog, completed: &[&str]) -> StatusMap {
        let completed: CompletionSet = completed.iter().copied().collect();
        compute_statuses(catalog, &completed).unwrap()
    }

    #[test]
    fn test_empty_available_set() {
        let catalog = Catalog::new(vec![spiral("a", 1)]).unwrap();
        let mut map = statuses(&catalog, &["a"]);
        let settings = RecommendationSettings::default();
        assert_eq!(select_next(&catalog, &map, &settings), None);
        assert_eq!(recommend(&catalog, &mut map, &settings), None);
        assert!(map.values().all(|s| s.status != NodeStatus::Next));
    }

    #[test]
    fn test_resumes_at_current_order() {
        let catalog = Catalog::new(vec![spiral("s1", 1), spiral("s3", 3), spiral("s5", 5)]).unwrap();
        let map = statuses(&catalog, &[]);

        let settings = RecommendationSettings::default().with_current_spiral_order(2);
        assert_eq!(select_next(&catalog, &map, &settings).as_deref(), Some("s3"));

        let settings = RecommendationSettings::default().with_current_spiral_order(5);
        assert_eq!(select_next(&catalog, &map, &settings).as_deref(), Some("s5"));
    }

    #[test]
    fn test_wraps_to_lowest_when_all_behind() {
        let catalog = Catalog::new(vec![spiral("s4", 4), spiral("s2", 2)]).unwrap();
        let map = statuses(&catalog, &[]);

        let settings = RecommendationSettings::default().with_current_spiral_order(9);
        assert_eq!(select_next(&catalog, &map, &settings).as_deref(), Some("s2"));

        let settings = RecommendationSettings::default();
        assert_eq!(select_next(&catalog, &map, &settings).as_deref(), Some("s2"));
    }

    #[test]
    fn test_equal_orders_keep_catalog_order() {
        let catalog = Catalog::new(vec![
            spiral("late", 7),
            NodeRecord::new("twin-b", NodeType::Spiral).with_spiral_position(1.0, 500.0, 3),
            NodeRecord::new("twin-a", NodeType::Spiral).with_spiral_position(2.0, 900.0, 3),
        ])
        .unwrap();
        let map = statuses(&catalog, &[]);
        let next = select_next(&catalog, &map, &RecommendationSettings::default());
        assert_eq!(next.as_deref(), Some("twin-b"));
    }

    #[test]
    fn test_hybrid_nodes_are_not_spiral_candidates() {
        let hybrid = NodeRecord::new("hybrid", NodeType::Hybrid).with_spiral_position(0.0, 10.0, 1);
        let catalog = Catalog::new(vec![hybrid, tree("t", 0.0)]).unwrap();
        let map = statuses(&catalog, &[]);
        // No spiral candidates and no current node: first available in catalog order.
        let next = select_next(&catalog, &map, &RecommendationSettings::default());
        assert_eq!(next.as_deref(), Some("hybrid"));
    }

    #[test]
    fn test_tag_overlap_fallback() {
        let catalog = Catalog::new(vec![
            tree("current", 0.0).with_tags(["a", "b"]),
            tree("none", 100.0).with_tags(["z"]),
            tree("both", 200.0).with_tags(["a", "b", "c"]),
        ])
        .unwrap();
        let map = statuses(&catalog, &["current"]);
        let settings = RecommendationSettings::default()
            .with_spiral_continuation(false)
            .with_current_node("current");
        assert_eq!(select_next(&catalog, &map, &settings).as_deref(), Some("both"));
    }

    #[test]
    fn test_overlap_ties_prefer_spiral_then_catalog_order() {
        // The spiral bias is a content-authoring convention rather than a correctness
        // rule; this pins the current behaviour so a change is deliberate.
        let catalog = Catalog::new(vec![
            tree("current", 0.0).with_tags(["a"]),
            tree("tree-match", 100.0).with_tags(["a"]),
            spiral("spiral-match", 1).with_tags(["a"]),
            tree("tree-match-2", 300.0).with_tags(["a"]),
        ])
        .unwrap();
        let map = statuses(&catalog, &["current"]);
        let settings = RecommendationSettings::default()
            .with_spiral_continuation(false)
            .with_current_node("current");
        assert_eq!(
            select_next(&catalog, &map, &settings).as_deref(),
            Some("spiral-match")
        );

        let catalog = Catalog::new(vec![
            tree("current", 0.0).with_tags(["a"]),
            tree("first", 100.0).with_tags(["a"]),
            tree("second", 200.0).with_tags(["a"]),
        ])
        .unwrap();
        let map = statuses(&catalog, &["current"]);
        assert_eq!(select_next(&catalog, &map, &settings).as_deref(), Some("first"));
    }

    #[test]
    fn test_unknown_current_node_falls_back_to_catalog_order() {
        let catalog = Catalog::new(vec![tree("x", 0.0), tree("y", 100.0).with_tags(["a"])]).unwrap();
        let map = statuses(&catalog, &[]);
        let settings = RecommendationSettings::default()
            .with_spiral_continuation(false)
            .with_current_node("deleted-node");
        assert_eq!(select_next(&catalog, &map, &settings).as_deref(), Some("x"));
    }

    #[test]
    fn test_promotion_requires_available() {
        let catalog = Catalog::new(vec![spiral("a", 1), spiral("b", 2).with_dependencies(["a"])]).unwrap();
        let mut map = statuses(&catalog, &[]);

        assert_eq!(apply_recommendation(&mut map, Some("b")), None);
        assert_eq!(map["b"].status, NodeStatus::Locked);
        assert_eq!(apply_recommendation(&mut map, Some("missing")), None);
        assert_eq!(apply_recommendation(&mut map, None), None);

        assert_eq!(apply_recommendation(&mut map, Some("a")).as_deref(), Some("a"));
        assert_eq!(map["a"].status, NodeStatus::Next);
        // Already promoted, so not available any more.
        assert_eq!(apply_recommendation(&mut map, Some("a")), None);

        let completed = ComputedStatus::completed();
        map.insert("a".into(), completed);
        assert_eq!(apply_recommendation(&mut map, Some("a")), None);
    }
}
