use crate::layout::{euclidean_distance, LayoutProjector, Point};
use crate::Catalog;
use journey_core::{NodeId, NodeRecord, Result, StructuralError, ValidationConfig};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpacingThresholds {
    pub min_tree_distance: f64,
    pub min_spiral_distance: f64,
}

impl Default for SpacingThresholds {
    fn default() -> Self {
        Self::from(&ValidationConfig::default())
    }
}

impl From<&ValidationConfig> for SpacingThresholds {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            min_tree_distance: config.min_tree_distance,
            min_spiral_distance: config.min_spiral_distance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    Tree,
    Spiral,
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutKind::Tree => write!(f, "tree"),
            LayoutKind::Spiral => write!(f, "spiral"),
        }
    }
}

/// Two nodes placed closer than the layout's minimum distance. Advisory only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpacingWarning {
    pub layout: LayoutKind,
    pub first: NodeId,
    pub second: NodeId,
    pub distance: f64,
    pub min_distance: f64,
}

impl fmt::Display for SpacingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} layout: nodes '{}' and '{}' are {:.2} apart (minimum {:.2})",
            self.layout, self.first, self.second, self.distance, self.min_distance
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub node_count: usize,
    pub edge_count: usize,
    pub warnings: Vec<SpacingWarning>,
}

/// A catalog that passed structural validation. The engine only accepts this type.
#[derive(Debug, Clone)]
pub struct ValidatedCatalog {
    catalog: Catalog,
    report: ValidationReport,
}

impl ValidatedCatalog {
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn into_parts(self) -> (Catalog, ValidationReport) {
        (self.catalog, self.report)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

#[derive(Debug, Clone, Default)]
pub struct GraphValidator {
    thresholds: SpacingThresholds,
}

impl GraphValidator {
    pub fn new(thresholds: SpacingThresholds) -> Self {
        Self { thresholds }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(SpacingThresholds::from(config))
    }

    pub fn thresholds(&self) -> SpacingThresholds {
        self.thresholds
    }

    /// Index, schema-check and validate raw records in one step.
    pub fn validate_records(&self, records: Vec<NodeRecord>) -> Result<ValidatedCatalog> {
        let catalog = Catalog::new(records)?;
        Ok(self.validate_catalog(catalog)?)
    }

    pub fn validate_catalog(
        &self,
        catalog: Catalog,
    ) -> std::result::Result<ValidatedCatalog, StructuralError> {
        let report = self.validate(&catalog)?;
        Ok(ValidatedCatalog { catalog, report })
    }

    /// Structural checks stop at the first failure; spacing problems are collected.
    pub fn validate(
        &self,
        catalog: &Catalog,
    ) -> std::result::Result<ValidationReport, StructuralError> {
        check_dependencies_exist(catalog)?;

        let dependency_edges = adjacency(catalog, |node| {
            node.dependencies.iter().map(String::as_str)
        });
        if let Some(path) = find_cycle(catalog, &dependency_edges) {
            return Err(StructuralError::DependencyCycle { path });
        }

        check_tree_parents(catalog)?;

        let parent_edges = adjacency(catalog, |node| node.tree_parent());
        if let Some(path) = find_cycle(catalog, &parent_edges) {
            return Err(StructuralError::TreeParentCycle { path });
        }

        let warnings = self.spacing_warnings(catalog);
        for warning in &warnings {
            warn!("{}", warning);
        }

        let report = ValidationReport {
            node_count: catalog.len(),
            edge_count: catalog.edge_count(),
            warnings,
        };
        info!(
            nodes = report.node_count,
            edges = report.edge_count,
            warnings = report.warnings.len(),
            "catalog validated"
        );
        Ok(report)
    }

    /// Pairwise O(n²) spacing check per layout group, pairs in catalog order.
    pub fn spacing_warnings(&self, catalog: &Catalog) -> Vec<SpacingWarning> {
        // Spacing is an authoring concern, so tree points stay unscaled.
        let projector = LayoutProjector::default();

        let tree_points: Vec<(&str, Point)> = catalog
            .nodes()
            .iter()
            .filter_map(|n| projector.tree_point(n).map(|p| (n.id.as_str(), p)))
            .collect();
        let spiral_points: Vec<(&str, Point)> = catalog
            .nodes()
            .iter()
            .filter_map(|n| projector.spiral_point(n).map(|p| (n.id.as_str(), p)))
            .collect();

        let mut warnings = close_pairs(
            LayoutKind::Tree,
            &tree_points,
            self.thresholds.min_tree_distance,
        );
        warnings.extend(close_pairs(
            LayoutKind::Spiral,
            &spiral_points,
            self.thresholds.min_spiral_distance,
        ));
        warnings
    }
}

fn check_dependencies_exist(catalog: &Catalog) -> std::result::Result<(), StructuralError> {
    for node in catalog.nodes() {
        if let Some(missing) = node.dependencies.iter().find(|d| !catalog.contains(d)) {
            return Err(StructuralError::DanglingDependency {
                node: node.id.clone(),
                missing: missing.clone(),
            });
        }
    }
    Ok(())
}

fn check_tree_parents(catalog: &Catalog) -> std::result::Result<(), StructuralError> {
    for node in catalog.nodes() {
        if let Some(parent) = node.tree_parent() {
            if !catalog.contains(parent) {
                return Err(StructuralError::DanglingTreeParent {
                    node: node.id.clone(),
                    parent: parent.to_string(),
                });
            }
        }
    }

    for node in catalog.nodes() {
        let Some(parent_id) = node.tree_parent() else {
            continue;
        };
        if let Some(parent) = catalog.get(parent_id) {
            if !parent.node_type.can_parent_tree() {
                return Err(StructuralError::IllegalTreeParentType {
                    node: node.id.clone(),
                    parent: parent.id.clone(),
                    parent_type: parent.node_type,
                });
            }
        }
    }
    Ok(())
}

/// Outgoing edges per catalog index. Unknown targets are dropped; they have already
/// been rejected by the reference checks.
fn adjacency<'a, F, I>(catalog: &'a Catalog, edges: F) -> Vec<Vec<usize>>
where
    F: Fn(&'a NodeRecord) -> I,
    I: IntoIterator<Item = &'a str>,
{
    catalog
        .nodes()
        .iter()
        .map(|node| {
            edges(node)
                .into_iter()
                .filter_map(|target| catalog.index_of(target))
                .collect()
        })
        .collect()
}

/// Iterative three-colour DFS. Roots are visited in catalog order and edges in
/// declared order, so the reported cycle is reproducible. The returned path starts
/// and ends at the first node found gray, each element pointing at the next.
fn find_cycle(catalog: &Catalog, edges: &[Vec<usize>]) -> Option<Vec<NodeId>> {
    let nodes = catalog.nodes();
    let mut color = vec![Color::White; nodes.len()];
    // (node index, next edge cursor)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..nodes.len() {
        if color[root] != Color::White {
            continue;
        }
        color[root] = Color::Gray;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (current, cursor) = *frame;
            let Some(&next) = edges[current].get(cursor) else {
                color[current] = Color::Black;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match color[next] {
                Color::White => {
                    color[next] = Color::Gray;
                    stack.push((next, 0));
                }
                Color::Gray => {
                    let mut path: Vec<NodeId> = stack
                        .iter()
                        .skip_while(|&&(index, _)| index != next)
                        .map(|&(index, _)| nodes[index].id.clone())
                        .collect();
                    path.push(nodes[next].id.clone());
                    debug!(cycle = ?path, "cycle found");
                    return Some(path);
                }
                Color::Black => {}
            }
        }
    }

    None
}

fn close_pairs(layout: LayoutKind, points: &[(&str, Point)], min_distance: f64) -> Vec<SpacingWarning> {
    let mut warnings = Vec::new();
    for (i, &(first, a)) in points.iter().enumerate() {
        for &(second, b) in &points[i + 1..] {
            let distance = euclidean_distance(a, b);
            if distance < min_distance {
                warnings.push(SpacingWarning {
                    layout,
                    first: first.to_string(),
                    second: second.to_string(),
                    distance,
                    min_distance,
                });
            }
        }
    }
    warnings
}
