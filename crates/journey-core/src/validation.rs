use crate::{NodeRecord, NodeType, SpiralPosition, TreePosition};
use thiserror::Error;

pub const MAX_ID_LEN: usize = 256;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid format for field '{field}': {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("Invalid length for field '{field}': expected {min}-{max} characters, got {actual}")]
    InvalidLength {
        field: String,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Invalid characters in field '{field}': {reason}")]
    InvalidCharacters { field: String, reason: String },

    #[error("Value out of range for field '{field}': {value}")]
    ValueOutOfRange { field: String, value: String },

    #[error("Required field '{field}' is missing")]
    RequiredField { field: String },
}

/// Load-boundary schema check. Run once per record when a catalog is built.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub struct IdentifierValidator;

impl IdentifierValidator {
    pub fn validate_node_id(id: &str, field: &str) -> Result<(), ValidationError> {
        if id.trim().is_empty() {
            return Err(ValidationError::RequiredField {
                field: field.to_string(),
            });
        }

        if id.len() > MAX_ID_LEN {
            return Err(ValidationError::InvalidLength {
                field: field.to_string(),
                min: 1,
                max: MAX_ID_LEN,
                actual: id.len(),
            });
        }

        if id.chars().any(|c| c.is_control()) {
            return Err(ValidationError::InvalidCharacters {
                field: field.to_string(),
                reason: "Control characters not allowed".to_string(),
            });
        }

        if id.trim() != id {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "Leading or trailing whitespace not allowed".to_string(),
            });
        }

        Ok(())
    }
}

pub struct CoordinateValidator;

impl CoordinateValidator {
    pub fn validate_finite(value: f64, field: &str) -> Result<(), ValidationError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(ValidationError::ValueOutOfRange {
                field: field.to_string(),
                value: value.to_string(),
            })
        }
    }
}

impl Validate for SpiralPosition {
    fn validate(&self) -> Result<(), ValidationError> {
        CoordinateValidator::validate_finite(self.angle, "spiralPosition.angle")?;
        CoordinateValidator::validate_finite(self.radius, "spiralPosition.radius")?;
        if self.radius < 0.0 {
            return Err(ValidationError::ValueOutOfRange {
                field: "spiralPosition.radius".to_string(),
                value: self.radius.to_string(),
            });
        }
        Ok(())
    }
}

impl Validate for TreePosition {
    fn validate(&self) -> Result<(), ValidationError> {
        CoordinateValidator::validate_finite(self.x, "treePosition.x")?;
        CoordinateValidator::validate_finite(self.y, "treePosition.y")?;
        if let Some(parent) = &self.parent_id {
            IdentifierValidator::validate_node_id(parent, "treePosition.parentId")?;
        }
        Ok(())
    }
}

impl Validate for NodeRecord {
    fn validate(&self) -> Result<(), ValidationError> {
        IdentifierValidator::validate_node_id(&self.id, "id")?;

        // Nested errors carry the owning node id so authors can find the entry.
        let scoped = |err: ValidationError| scope_error(&self.id, err);

        for dependency in &self.dependencies {
            IdentifierValidator::validate_node_id(dependency, "dependencies").map_err(scoped)?;
        }

        for tag in &self.tags {
            if tag.trim().is_empty() {
                return Err(scoped(ValidationError::RequiredField {
                    field: "tags".to_string(),
                }));
            }
            if tag.chars().any(|c| c.is_control()) {
                return Err(scoped(ValidationError::InvalidCharacters {
                    field: "tags".to_string(),
                    reason: "Control characters not allowed".to_string(),
                }));
            }
        }

        let spiral = self.position.spiral_position.as_ref();
        let tree = self.position.tree_position.as_ref();

        match self.node_type {
            NodeType::Spiral if spiral.is_none() => {
                return Err(scoped(ValidationError::RequiredField {
                    field: "position.spiralPosition".to_string(),
                }));
            }
            NodeType::Tree if tree.is_none() => {
                return Err(scoped(ValidationError::RequiredField {
                    field: "position.treePosition".to_string(),
                }));
            }
            NodeType::Hybrid if spiral.is_none() && tree.is_none() => {
                return Err(scoped(ValidationError::RequiredField {
                    field: "position".to_string(),
                }));
            }
            _ => {}
        }

        if let Some(spiral) = spiral {
            spiral.validate().map_err(scoped)?;
        }
        if let Some(tree) = tree {
            tree.validate().map_err(scoped)?;
        }

        Ok(())
    }
}

fn scope_error(node_id: &str, err: ValidationError) -> ValidationError {
    let prefix = |field: String| format!("nodes[{}].{}", node_id, field);
    match err {
        ValidationError::InvalidFormat { field, reason } => ValidationError::InvalidFormat {
            field: prefix(field),
            reason,
        },
        ValidationError::InvalidLength {
            field,
            min,
            max,
            actual,
        } => ValidationError::InvalidLength {
            field: prefix(field),
            min,
            max,
            actual,
        },
        ValidationError::InvalidCharacters { field, reason } => {
            ValidationError::InvalidCharacters {
                field: prefix(field),
                reason,
            }
        }
        ValidationError::ValueOutOfRange { field, value } => ValidationError::ValueOutOfRange {
            field: prefix(field),
            value,
        },
        ValidationError::RequiredField { field } => ValidationError::RequiredField {
            field: prefix(field),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spiral(id: &str) -> NodeRecord {
        NodeRecord::new(id, NodeType::Spiral).with_spiral_position(0.5, 20.0, 1)
    }

    #[test]
    fn test_node_id_validation() {
        // Valid ids
        assert!(IdentifierValidator::validate_node_id("intro", "id").is_ok());
        assert!(IdentifierValidator::validate_node_id("stage-2.first step", "id").is_ok());

        // Invalid ids
        assert!(matches!(
            IdentifierValidator::validate_node_id("", "id"),
            Err(ValidationError::RequiredField { .. })
        ));
        assert!(matches!(
            IdentifierValidator::validate_node_id("   ", "id"),
            Err(ValidationError::RequiredField { .. })
        ));
        assert!(matches!(
            IdentifierValidator::validate_node_id("bad\u{0007}id", "id"),
            Err(ValidationError::InvalidCharacters { .. })
        ));
        assert!(matches!(
            IdentifierValidator::validate_node_id(" padded", "id"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        let long_id = "a".repeat(MAX_ID_LEN + 1);
        assert!(matches!(
            IdentifierValidator::validate_node_id(&long_id, "id"),
            Err(ValidationError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_type_requires_matching_position() {
        assert!(spiral("s1").validate().is_ok());

        let err = NodeRecord::new("s1", NodeType::Spiral).validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::RequiredField {
                field: "nodes[s1].position.spiralPosition".to_string()
            }
        );

        let err = NodeRecord::new("t1", NodeType::Tree).validate().unwrap_err();
        assert!(err.to_string().contains("treePosition"));

        assert!(NodeRecord::new("h1", NodeType::Hybrid).validate().is_err());
        assert!(NodeRecord::new("h1", NodeType::Hybrid)
            .with_tree_position(0.0, 0.0, "main", 0, None)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_coordinates_must_be_finite() {
        let node = NodeRecord::new("s1", NodeType::Spiral).with_spiral_position(f64::NAN, 1.0, 1);
        assert!(matches!(
            node.validate(),
            Err(ValidationError::ValueOutOfRange { .. })
        ));

        let node = NodeRecord::new("s1", NodeType::Spiral).with_spiral_position(0.0, -3.0, 1);
        assert!(node.validate().is_err());

        let node = NodeRecord::new("t1", NodeType::Tree).with_tree_position(
            f64::INFINITY,
            0.0,
            "main",
            0,
            None,
        );
        assert!(node.validate().is_err());
    }

    #[test]
    fn test_references_and_tags_are_checked() {
        let node = spiral("s1").with_dependencies(["ok", ""]);
        let err = node.validate().unwrap_err();
        assert!(err.to_string().contains("nodes[s1].dependencies"));

        let node = spiral("s1").with_tags(["fine", " "]);
        assert!(node.validate().is_err());

        let node = NodeRecord::new("t1", NodeType::Tree).with_tree_position(
            0.0,
            0.0,
            "main",
            1,
            Some("bad\nparent"),
        );
        assert!(matches!(
            node.validate(),
            Err(ValidationError::InvalidCharacters { .. })
        ));
    }
}
