use journey_core::{JourneyError, NodeRecord, Result, StructuralError, Validate};
use std::collections::HashMap;
use tracing::debug;

/// Schema-checked, uniquely indexed node list in insertion order.
///
/// Building a `Catalog` does not check references or acyclicity; that is the
/// validator's job.
#[derive(Debug, Clone)]
pub struct Catalog {
    nodes: Vec<NodeRecord>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(nodes: Vec<NodeRecord>) -> Result<Self> {
        let mut index = HashMap::with_capacity(nodes.len());

        for (position, node) in nodes.iter().enumerate() {
            node.validate()?;
            if index.insert(node.id.clone(), position).is_some() {
                return Err(JourneyError::Structural(StructuralError::DuplicateId {
                    id: node.id.clone(),
                }));
            }
        }

        debug!(nodes = nodes.len(), "catalog indexed");
        Ok(Self { nodes, index })
    }

    pub fn get(&self, id: &str) -> Option<&NodeRecord> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Position of `id` in catalog order.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.dependencies.len()).sum()
    }

    pub fn into_nodes(self) -> Vec<NodeRecord> {
        self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use journey_core::NodeType;

    fn spiral(id: &str, order: i64) -> NodeRecord {
        NodeRecord::new(id, NodeType::Spiral).with_spiral_position(order as f64, 20.0, order)
    }

    #[test]
    fn test_lookup_preserves_insertion_order() {
        let catalog = Catalog::new(vec![spiral("b", 1), spiral("a", 2), spiral("c", 3)]).unwrap();
        let ids: Vec<_> = catalog.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(catalog.index_of("a"), Some(1));
        assert_eq!(catalog.get("c").unwrap().id, "c");
        assert!(catalog.get("zzz").is_none());
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_duplicate_id_is_structural() {
        let err = Catalog::new(vec![spiral("a", 1), spiral("b", 2), spiral("a", 3)]).unwrap_err();
        match err {
            JourneyError::Structural(StructuralError::DuplicateId { id }) => assert_eq!(id, "a"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_schema_errors_surface() {
        let err = Catalog::new(vec![NodeRecord::new("t", NodeType::Tree)]).unwrap_err();
        assert!(matches!(err, JourneyError::Schema(_)));
    }
}
