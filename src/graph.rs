use std::collections::HashSet;

use crate::classifier::{LayoutAlgorithm, LayoutDecision, LayoutDirection, Spacing};
use crate::config::SolverLimits;
use crate::error::LayoutError;
use crate::scene::{Connector, Shape};

/// A sized node handed to the solver. Position is an output of the solve, not
/// an input to it.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// Algorithm tuning forwarded to the solver alongside the node/edge lists.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    pub algorithm: LayoutAlgorithm,
    pub direction: Option<LayoutDirection>,
    pub spacing: Spacing,
    /// Layered family: reorder nodes within ranks to reduce edge crossings.
    pub minimize_crossings: bool,
    /// Layered family: bias node placement toward straight, symmetric edges
    /// so branch children of a decision node end up visually balanced.
    pub favor_straight_edges: bool,
    /// Hint that members of the same shape group should stay adjacent.
    pub preserve_groups: bool,
}

/// Algorithm-agnostic nodes+edges+options representation passed to the
/// layout solver. Built fresh per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphModel {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub options: SolverOptions,
}

/// Convert the selected shapes and candidate connectors into a graph model.
///
/// Shapes that are bound labels of another selected shape are excluded: they
/// follow their container during reconciliation instead of being positioned
/// independently. Edges are deduplicated per (source, target) pair. Pure
/// transform apart from the node-count ceiling check.
pub fn build_graph_model(
    shapes: &[&Shape],
    connectors: &[&Connector],
    decision: &LayoutDecision,
    limits: &SolverLimits,
) -> Result<GraphModel, LayoutError> {
    let label_ids: HashSet<&str> = shapes
        .iter()
        .filter_map(|s| s.bound_label_id.as_deref())
        .collect();

    let mut nodes = Vec::new();
    for shape in shapes {
        if label_ids.contains(shape.id.as_str()) {
            continue;
        }
        nodes.push(GraphNode {
            id: shape.id.clone(),
            width: shape.width,
            height: shape.height,
        });
    }

    if nodes.len() > limits.max_nodes {
        return Err(LayoutError::SelectionTooLarge {
            count: nodes.len(),
            limit: limits.max_nodes,
        });
    }

    let node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut edges = Vec::new();
    for connector in connectors {
        let (Some(source), Some(target)) = (&connector.source_id, &connector.target_id) else {
            continue;
        };
        if !node_ids.contains(source.as_str()) || !node_ids.contains(target.as_str()) {
            continue;
        }
        if !seen.insert((source.as_str(), target.as_str())) {
            continue;
        }
        edges.push(GraphEdge {
            id: connector.id.clone(),
            source: source.clone(),
            target: target.clone(),
        });
    }

    let ranked = decision.algorithm.is_directional();
    Ok(GraphModel {
        nodes,
        edges,
        options: SolverOptions {
            algorithm: decision.algorithm,
            direction: if ranked { decision.direction } else { None },
            spacing: decision.spacing,
            minimize_crossings: ranked,
            favor_straight_edges: ranked,
            preserve_groups: decision.preserve_groups,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::LayoutPreset;
    use crate::scene::{ConnectorKind, ShapeKind, StrokeStyle};

    fn shape(id: &str) -> Shape {
        Shape {
            id: id.to_string(),
            kind: ShapeKind::Box,
            x: 0.0,
            y: 0.0,
            width: 120.0,
            height: 60.0,
            text: None,
            group_ids: Vec::new(),
            bound_label_id: None,
        }
    }

    fn arrow(id: &str, source: &str, target: &str) -> Connector {
        Connector {
            id: id.to_string(),
            kind: ConnectorKind::Arrow,
            x: 0.0,
            y: 0.0,
            points: vec![(0.0, 0.0), (50.0, 50.0)],
            source_id: Some(source.to_string()),
            target_id: Some(target.to_string()),
            stroke: StrokeStyle::Solid,
            start_arrowhead: None,
            end_arrowhead: None,
            version: 0,
        }
    }

    #[test]
    fn bound_labels_are_not_nodes() {
        let mut container = shape("c");
        container.bound_label_id = Some("label".to_string());
        let mut label = shape("label");
        label.kind = ShapeKind::Text;
        let other = shape("o");
        let shapes = [&container, &label, &other];
        let model = build_graph_model(
            &shapes,
            &[],
            &LayoutPreset::Grid.decision(),
            &SolverLimits::default(),
        )
        .unwrap();
        let ids: Vec<&str> = model.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "o"]);
    }

    #[test]
    fn duplicate_and_dangling_edges_are_dropped() {
        let a = shape("a");
        let b = shape("b");
        let e1 = arrow("e1", "a", "b");
        let e2 = arrow("e2", "a", "b");
        let e3 = arrow("e3", "a", "ghost");
        let model = build_graph_model(
            &[&a, &b],
            &[&e1, &e2, &e3],
            &LayoutPreset::Sequential.decision(),
            &SolverLimits::default(),
        )
        .unwrap();
        assert_eq!(model.edges.len(), 1);
        assert_eq!(model.edges[0].id, "e1");
    }

    #[test]
    fn directional_options_follow_the_algorithm() {
        let a = shape("a");
        let layered = build_graph_model(
            &[&a],
            &[],
            &LayoutPreset::Sequential.decision(),
            &SolverLimits::default(),
        )
        .unwrap();
        assert!(layered.options.minimize_crossings);
        assert!(layered.options.favor_straight_edges);
        assert!(layered.options.direction.is_some());

        let packed = build_graph_model(
            &[&a],
            &[],
            &LayoutPreset::Compact.decision(),
            &SolverLimits::default(),
        )
        .unwrap();
        assert!(!packed.options.minimize_crossings);
        assert_eq!(packed.options.direction, None);
    }

    #[test]
    fn node_ceiling_fails_fast() {
        let shapes: Vec<Shape> = (0..5).map(|i| shape(&format!("s{i}"))).collect();
        let refs: Vec<&Shape> = shapes.iter().collect();
        let limits = SolverLimits { max_nodes: 4 };
        let err = build_graph_model(&refs, &[], &LayoutPreset::Grid.decision(), &limits)
            .unwrap_err();
        match err {
            LayoutError::SelectionTooLarge { count, limit } => {
                assert_eq!(count, 5);
                assert_eq!(limit, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
