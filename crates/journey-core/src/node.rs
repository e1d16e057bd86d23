use crate::{NodeId, NodePosition, NodeType, SpiralPosition, TreePosition};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One milestone in the catalog. Immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<NodeId>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub position: NodePosition,
}

impl NodeRecord {
    pub fn new(id: impl Into<NodeId>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            title: None,
            description: None,
            dependencies: Vec::new(),
            tags: BTreeSet::new(),
            position: NodePosition::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_spiral_position(mut self, angle: f64, radius: f64, order: i64) -> Self {
        self.position.spiral_position = Some(SpiralPosition {
            angle,
            radius,
            order,
        });
        self
    }

    pub fn with_tree_position(
        mut self,
        x: f64,
        y: f64,
        branch: impl Into<String>,
        level: u32,
        parent_id: Option<&str>,
    ) -> Self {
        self.position.tree_position = Some(TreePosition {
            x,
            y,
            branch: branch.into(),
            level,
            parent_id: parent_id.map(str::to_string),
        });
        self
    }

    pub fn spiral_position(&self) -> Option<&SpiralPosition> {
        self.position.spiral_position.as_ref()
    }

    pub fn tree_position(&self) -> Option<&TreePosition> {
        self.position.tree_position.as_ref()
    }

    pub fn tree_parent(&self) -> Option<&str> {
        self.tree_position()
            .and_then(|tree| tree.parent_id.as_deref())
    }

    /// Number of tags this node shares with `other`.
    pub fn tag_overlap(&self, other: &NodeRecord) -> usize {
        self.tags.intersection(&other.tags).count()
    }
}
