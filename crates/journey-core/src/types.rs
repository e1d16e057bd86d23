use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

pub type NodeId = String;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Spiral,
    Tree,
    Hybrid,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Spiral => "spiral",
            NodeType::Tree => "tree",
            NodeType::Hybrid => "hybrid",
        }
    }

    /// Whether a node of this type may act as a tree-layout parent.
    pub fn can_parent_tree(self) -> bool {
        matches!(self, NodeType::Tree | NodeType::Hybrid)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spiral" => Ok(NodeType::Spiral),
            "tree" => Ok(NodeType::Tree),
            "hybrid" => Ok(NodeType::Hybrid),
            other => Err(format!(
                "unknown node type '{}': expected spiral, tree or hybrid",
                other
            )),
        }
    }
}

/// Polar placement on the spiral layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpiralPosition {
    /// Angle in radians.
    #[serde(alias = "theta")]
    pub angle: f64,
    #[serde(alias = "r")]
    pub radius: f64,
    /// Sequence position along the spiral track.
    pub order: i64,
}

/// Cartesian placement on the tree layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TreePosition {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default, alias = "parent_id", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodePosition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spiral_position: Option<SpiralPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_position: Option<TreePosition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Locked,
    Available,
    Next,
    Completed,
}

impl NodeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::Locked => "locked",
            NodeStatus::Available => "available",
            NodeStatus::Next => "next",
            NodeStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived per-node state. Recomputed on every query, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedStatus {
    pub status: NodeStatus,
    pub unmet_dependencies: Vec<NodeId>,
}

impl ComputedStatus {
    pub fn completed() -> Self {
        Self {
            status: NodeStatus::Completed,
            unmet_dependencies: Vec::new(),
        }
    }

    pub fn available() -> Self {
        Self {
            status: NodeStatus::Available,
            unmet_dependencies: Vec::new(),
        }
    }

    pub fn locked(unmet_dependencies: Vec<NodeId>) -> Self {
        Self {
            status: NodeStatus::Locked,
            unmet_dependencies,
        }
    }
}

pub type StatusMap = BTreeMap<NodeId, ComputedStatus>;

/// The set of node ids the user has marked complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "CompletionRepr")]
pub struct CompletionSet {
    ids: BTreeSet<NodeId>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CompletionRepr {
    Ids(Vec<NodeId>),
    Flags(BTreeMap<NodeId, bool>),
}

impl From<CompletionRepr> for CompletionSet {
    fn from(repr: CompletionRepr) -> Self {
        match repr {
            CompletionRepr::Ids(ids) => ids.into_iter().collect(),
            CompletionRepr::Flags(flags) => Self::from_flags(flags),
        }
    }
}

impl Serialize for CompletionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.ids.serialize(serializer)
    }
}

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from an `id -> completed` map; only `true` entries count.
    pub fn from_flags<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, bool)>,
    {
        flags
            .into_iter()
            .filter_map(|(id, done)| done.then_some(id))
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Adds or removes `id`. Returns whether membership changed.
    pub fn mark(&mut self, id: impl Into<NodeId>, completed: bool) -> bool {
        let id = id.into();
        if completed {
            self.ids.insert(id)
        } else {
            self.ids.remove(&id)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: Into<NodeId>> FromIterator<S> for CompletionSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Caller-owned state that steers the recommendation tie-break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSettings {
    #[serde(default)]
    pub current_node_id: Option<NodeId>,
    #[serde(default)]
    pub current_spiral_order: Option<i64>,
    #[serde(default = "default_prefer_spiral_continuation")]
    pub prefer_spiral_continuation: bool,
}

fn default_prefer_spiral_continuation() -> bool {
    true
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            current_node_id: None,
            current_spiral_order: None,
            prefer_spiral_continuation: default_prefer_spiral_continuation(),
        }
    }
}

impl RecommendationSettings {
    pub fn with_current_node(mut self, id: impl Into<NodeId>) -> Self {
        self.current_node_id = Some(id.into());
        self
    }

    pub fn with_current_spiral_order(mut self, order: i64) -> Self {
        self.current_spiral_order = Some(order);
        self
    }

    pub fn with_spiral_continuation(mut self, prefer: bool) -> Self {
        self.prefer_spiral_continuation = prefer;
        self
    }
}

/// Persisted user progress: completion flags plus recommendation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(default)]
    pub completed: CompletionSet,
    #[serde(default)]
    pub settings: RecommendationSettings,
}

/// On-disk catalog shape: either a bare list of nodes or `{ "nodes": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CatalogDocument {
    Nodes(Vec<crate::NodeRecord>),
    Document { nodes: Vec<crate::NodeRecord> },
}

impl CatalogDocument {
    pub fn into_nodes(self) -> Vec<crate::NodeRecord> {
        match self {
            CatalogDocument::Nodes(nodes) => nodes,
            CatalogDocument::Document { nodes } => nodes,
        }
    }
}
