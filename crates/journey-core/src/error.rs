use crate::{ConfigError, NodeId, NodeType, ValidationError};
use thiserror::Error;

/// Fatal catalog defects. A catalog that produces one of these must not reach the
/// status engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("Duplicate node id: '{id}'")]
    DuplicateId { id: NodeId },

    #[error("Node '{node}' depends on unknown node '{missing}'")]
    DanglingDependency { node: NodeId, missing: NodeId },

    #[error("Dependency cycle detected: {}", .path.join(" -> "))]
    DependencyCycle { path: Vec<NodeId> },

    #[error("Node '{node}' has unknown tree parent '{parent}'")]
    DanglingTreeParent { node: NodeId, parent: NodeId },

    #[error("Node '{node}' has tree parent '{parent}' of type {parent_type}; expected tree or hybrid")]
    IllegalTreeParentType {
        node: NodeId,
        parent: NodeId,
        parent_type: NodeType,
    },

    #[error("Tree parent cycle detected: {}", .path.join(" -> "))]
    TreeParentCycle { path: Vec<NodeId> },
}

impl StructuralError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateId { .. } => "DUPLICATE_ID",
            Self::DanglingDependency { .. } => "DANGLING_DEPENDENCY",
            Self::DependencyCycle { .. } => "DEPENDENCY_CYCLE",
            Self::DanglingTreeParent { .. } => "DANGLING_TREE_PARENT",
            Self::IllegalTreeParentType { .. } => "ILLEGAL_TREE_PARENT_TYPE",
            Self::TreeParentCycle { .. } => "TREE_PARENT_CYCLE",
        }
    }
}

#[derive(Error, Debug)]
pub enum JourneyError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error("Schema error: {0}")]
    Schema(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logical inconsistency: node '{node}' depends on '{missing}', which is not in the catalog")]
    LogicalInconsistency { node: NodeId, missing: NodeId },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported catalog format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, JourneyError>;
