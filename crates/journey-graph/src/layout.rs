use crate::Catalog;
use journey_core::{LayoutConfig, NodeId, NodeRecord};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Polar to cartesian: `x = r cos θ`, `y = r sin θ`.
pub fn spiral_to_cartesian(theta: f64, radius: f64) -> Point {
    Point::new(radius * theta.cos(), radius * theta.sin())
}

/// Tree coordinates are already cartesian; only the display scale applies.
pub fn tree_to_cartesian(x: f64, y: f64, scale: f64) -> Point {
    Point::new(x * scale, y * scale)
}

pub fn euclidean_distance(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedNode {
    pub id: NodeId,
    pub spiral: Option<Point>,
    pub tree: Option<Point>,
}

/// One vertex of the spiral guide curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathPoint {
    pub id: NodeId,
    pub order: i64,
    pub point: Point,
}

/// Parent-to-child segment on the tree layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeLink {
    pub parent: NodeId,
    pub child: NodeId,
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutProjector {
    tree_scale: f64,
}

impl Default for LayoutProjector {
    fn default() -> Self {
        Self { tree_scale: 1.0 }
    }
}

impl LayoutProjector {
    pub fn new(tree_scale: f64) -> Self {
        Self { tree_scale }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new(config.tree_scale)
    }

    pub fn tree_scale(&self) -> f64 {
        self.tree_scale
    }

    pub fn spiral_point(&self, node: &NodeRecord) -> Option<Point> {
        node.spiral_position()
            .map(|p| spiral_to_cartesian(p.angle, p.radius))
    }

    pub fn tree_point(&self, node: &NodeRecord) -> Option<Point> {
        node.tree_position()
            .map(|p| tree_to_cartesian(p.x, p.y, self.tree_scale))
    }

    pub fn project(&self, node: &NodeRecord) -> ProjectedNode {
        ProjectedNode {
            id: node.id.clone(),
            spiral: self.spiral_point(node),
            tree: self.tree_point(node),
        }
    }

    pub fn project_all(&self, catalog: &Catalog) -> Vec<ProjectedNode> {
        catalog.nodes().iter().map(|n| self.project(n)).collect()
    }

    /// Spiral-positioned nodes by ascending `order`; equal orders keep catalog order.
    pub fn spiral_path(&self, catalog: &Catalog) -> Vec<PathPoint> {
        let mut path: Vec<PathPoint> = catalog
            .nodes()
            .iter()
            .filter_map(|node| {
                node.spiral_position().map(|p| PathPoint {
                    id: node.id.clone(),
                    order: p.order,
                    point: spiral_to_cartesian(p.angle, p.radius),
                })
            })
            .collect();
        path.sort_by_key(|p| p.order);
        path
    }

    /// Links whose parent is missing or has no tree position are skipped.
    pub fn tree_links(&self, catalog: &Catalog) -> Vec<TreeLink> {
        catalog
            .nodes()
            .iter()
            .filter_map(|child| {
                let parent_id = child.tree_parent()?;
                let parent = catalog.get(parent_id)?;
                Some(TreeLink {
                    parent: parent.id.clone(),
                    child: child.id.clone(),
                    from: self.tree_point(parent)?,
                    to: self.tree_point(child)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use journey_core::NodeType;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_spiral_to_cartesian() {
        let p = spiral_to_cartesian(0.0, 10.0);
        assert_relative_eq!(p.x, 10.0);
        assert_relative_eq!(p.y, 0.0);

        let p = spiral_to_cartesian(FRAC_PI_2, 10.0);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 10.0);

        let p = spiral_to_cartesian(PI, 4.0);
        assert_relative_eq!(p.x, -4.0);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_distance_and_tree_scale() {
        assert_relative_eq!(
            euclidean_distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)),
            5.0
        );
        let p = tree_to_cartesian(2.0, -3.0, 10.0);
        assert_eq!(p, Point::new(20.0, -30.0));
        assert_eq!(tree_to_cartesian(2.0, -3.0, 1.0), Point::new(2.0, -3.0));
    }

    #[test]
    fn test_spiral_path_orders_by_sequence() {
        let catalog = Catalog::new(vec![
            NodeRecord::new("third", NodeType::Spiral).with_spiral_position(PI, 30.0, 3),
            NodeRecord::new("first", NodeType::Spiral).with_spiral_position(0.0, 10.0, 1),
            NodeRecord::new("tree", NodeType::Tree).with_tree_position(0.0, 0.0, "main", 0, None),
            NodeRecord::new("second", NodeType::Hybrid).with_spiral_position(FRAC_PI_2, 20.0, 2),
        ])
        .unwrap();

        let path = LayoutProjector::default().spiral_path(&catalog);
        let ids: Vec<_> = path.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
        assert_relative_eq!(path[2].point.x, -30.0);
    }

    #[test]
    fn test_tree_links_use_scaled_points() {
        let catalog = Catalog::new(vec![
            NodeRecord::new("root", NodeType::Tree).with_tree_position(0.0, 0.0, "main", 0, None),
            NodeRecord::new("leaf", NodeType::Tree).with_tree_position(
                1.0,
                2.0,
                "main",
                1,
                Some("root"),
            ),
        ])
        .unwrap();

        let projector = LayoutProjector::new(5.0);
        let links = projector.tree_links(&catalog);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].parent, "root");
        assert_eq!(links[0].to, Point::new(5.0, 10.0));

        let projected = projector.project_all(&catalog);
        assert!(projected[0].spiral.is_none());
        assert_eq!(projected[1].tree, Some(Point::new(5.0, 10.0)));
    }
}
