use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};

use crate::classifier::{LayoutAlgorithm, LayoutDirection};
use crate::error::LayoutError;
use crate::graph::GraphModel;

/// Solver output: node id → new top-left position. Shapes absent from the
/// outcome are passed through reconciliation untouched.
pub type LayoutOutcome = BTreeMap<String, (f32, f32)>;

/// External-collaborator boundary for position computation. Anything that
/// accepts sized nodes, edges and a named algorithm with options, and returns
/// a top-left position per node id, satisfies the contract.
pub trait LayoutSolver {
    fn solve(&self, model: &GraphModel) -> Result<LayoutOutcome, LayoutError>;
}

/// Default solver. The ranked families (layered, mrtree) are delegated to the
/// external dagre engine; box, grid and stress are deterministic placements
/// computed here. No partial output: a missing node position is an error.
#[derive(Debug, Default)]
pub struct GraphSolver;

impl LayoutSolver for GraphSolver {
    fn solve(&self, model: &GraphModel) -> Result<LayoutOutcome, LayoutError> {
        if model.nodes.is_empty() {
            return Ok(LayoutOutcome::new());
        }
        match model.options.algorithm {
            LayoutAlgorithm::Layered | LayoutAlgorithm::Mrtree => solve_ranked(model),
            LayoutAlgorithm::Box => Ok(solve_packed(model)),
            LayoutAlgorithm::Grid => Ok(solve_grid(model)),
            LayoutAlgorithm::Stress => Ok(solve_stress(model)),
        }
    }
}

fn rankdir(direction: Option<LayoutDirection>) -> &'static str {
    match direction.unwrap_or(LayoutDirection::Down) {
        LayoutDirection::Down => "tb",
        LayoutDirection::Up => "bt",
        LayoutDirection::Right => "lr",
        LayoutDirection::Left => "rl",
    }
}

/// Hierarchical placement via the dagre engine. Node order is forwarded so
/// rank ordering (and therefore the whole layout) is deterministic; the
/// engine's crossing minimization and symmetric node placement cover the
/// layered tuning options.
fn solve_ranked(model: &GraphModel) -> Result<LayoutOutcome, LayoutError> {
    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    graph_config.rankdir = Some(rankdir(model.options.direction).to_string());
    graph_config.nodesep = Some(model.options.spacing.x);
    graph_config.ranksep = Some(model.options.spacing.y);
    graph_config.marginx = Some(8.0);
    graph_config.marginy = Some(8.0);
    dagre_graph.set_graph(graph_config);

    for (order, node) in model.nodes.iter().enumerate() {
        let mut dagre_node = DagreNode::default();
        dagre_node.width = node.width;
        dagre_node.height = node.height;
        dagre_node.order = Some(order);
        dagre_graph.set_node(node.id.clone(), Some(dagre_node));
    }

    for edge in &model.edges {
        let edge_label = DagreEdge::default();
        let _ = dagre_graph.set_edge(&edge.source, &edge.target, Some(edge_label), None);
    }

    // The engine is a black box; a panic inside it is a solver failure, not
    // ours to propagate as a crash.
    let run = catch_unwind(AssertUnwindSafe(|| {
        dagre_layout::run_layout(&mut dagre_graph);
        let mut outcome = LayoutOutcome::new();
        for node in &model.nodes {
            let Some(dagre_node) = dagre_graph.node(&node.id) else {
                return Err(LayoutError::Solver(format!(
                    "no position returned for node {}",
                    node.id
                )));
            };
            outcome.insert(
                node.id.clone(),
                (
                    dagre_node.x - node.width / 2.0,
                    dagre_node.y - node.height / 2.0,
                ),
            );
        }
        Ok(outcome)
    }));

    match run {
        Ok(result) => result,
        Err(_) => Err(LayoutError::Solver(
            "layout engine panicked during ranked layout".to_string(),
        )),
    }
}

/// Shelf packing toward a roughly square silhouette with uniform gaps. Used
/// for architecture-style selections where connections are sparse enough that
/// edge routing does not matter.
fn solve_packed(model: &GraphModel) -> LayoutOutcome {
    let spacing = model.options.spacing;
    let total_area: f32 = model
        .nodes
        .iter()
        .map(|n| (n.width + spacing.x) * (n.height + spacing.y))
        .sum();
    let target_width = total_area.sqrt().max(
        model
            .nodes
            .iter()
            .map(|n| n.width)
            .fold(0.0f32, f32::max),
    );

    // Tall shelves first keeps rows even; ties broken by id so the packing
    // is stable across invocations.
    let mut order: Vec<usize> = (0..model.nodes.len()).collect();
    order.sort_by(|&a, &b| {
        let na = &model.nodes[a];
        let nb = &model.nodes[b];
        nb.height
            .partial_cmp(&na.height)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| na.id.cmp(&nb.id))
    });

    let mut outcome = LayoutOutcome::new();
    let mut cursor_x = 0.0f32;
    let mut cursor_y = 0.0f32;
    let mut shelf_height = 0.0f32;
    for idx in order {
        let node = &model.nodes[idx];
        if cursor_x > 0.0 && cursor_x + node.width > target_width {
            cursor_x = 0.0;
            cursor_y += shelf_height + spacing.y;
            shelf_height = 0.0;
        }
        outcome.insert(node.id.clone(), (cursor_x, cursor_y));
        cursor_x += node.width + spacing.x;
        shelf_height = shelf_height.max(node.height);
    }
    outcome
}

/// Uniform grid in selection order: ceil(sqrt(n)) columns, cells sized by the
/// largest node plus spacing.
fn solve_grid(model: &GraphModel) -> LayoutOutcome {
    let count = model.nodes.len();
    let columns = (count as f32).sqrt().ceil().max(1.0) as usize;
    let cell_width = model
        .nodes
        .iter()
        .map(|n| n.width)
        .fold(0.0f32, f32::max)
        + model.options.spacing.x;
    let cell_height = model
        .nodes
        .iter()
        .map(|n| n.height)
        .fold(0.0f32, f32::max)
        + model.options.spacing.y;

    let mut outcome = LayoutOutcome::new();
    for (idx, node) in model.nodes.iter().enumerate() {
        let col = idx % columns;
        let row = idx / columns;
        outcome.insert(
            node.id.clone(),
            (col as f32 * cell_width, row as f32 * cell_height),
        );
    }
    outcome
}

// Stress simulation parameters. Fixed iteration count and a deterministic
// circular seed keep repeated solves identical for the same model.
const STRESS_ITERATIONS: usize = 120;
const STRESS_SPRING: f32 = 0.08;
const STRESS_REPULSION: f32 = 1200.0;
const STRESS_DAMPING: f32 = 0.85;

/// Force simulation for dense networks: springs along edges pull connected
/// nodes toward an ideal distance, pairwise repulsion keeps the rest apart.
fn solve_stress(model: &GraphModel) -> LayoutOutcome {
    let n = model.nodes.len();
    let spacing = model.options.spacing;
    let avg_dim = model
        .nodes
        .iter()
        .map(|node| (node.width + node.height) * 0.5)
        .sum::<f32>()
        / n as f32;

    // Seed node centers on a circle in selection order.
    let radius = ((avg_dim + spacing.x) * n as f32 / std::f32::consts::TAU).max(spacing.x);
    let mut positions: Vec<(f32, f32)> = (0..n)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / n as f32;
            (radius * angle.cos(), radius * angle.sin())
        })
        .collect();
    let mut velocities = vec![(0.0f32, 0.0f32); n];

    let index_of: BTreeMap<&str, usize> = model
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.id.as_str(), idx))
        .collect();

    for _ in 0..STRESS_ITERATIONS {
        let mut forces = vec![(0.0f32, 0.0f32); n];

        for i in 0..n {
            for j in (i + 1)..n {
                let dx = positions[j].0 - positions[i].0;
                let dy = positions[j].1 - positions[i].1;
                let dist_sq = (dx * dx + dy * dy).max(1.0);
                let dist = dist_sq.sqrt();
                let push = STRESS_REPULSION / dist_sq;
                let fx = dx / dist * push;
                let fy = dy / dist * push;
                forces[i].0 -= fx;
                forces[i].1 -= fy;
                forces[j].0 += fx;
                forces[j].1 += fy;
            }
        }

        for edge in &model.edges {
            let (Some(&i), Some(&j)) = (
                index_of.get(edge.source.as_str()),
                index_of.get(edge.target.as_str()),
            ) else {
                continue;
            };
            let ideal = spacing.x
                + (model.nodes[i].width + model.nodes[j].width) * 0.25
                + (model.nodes[i].height + model.nodes[j].height) * 0.25;
            let dx = positions[j].0 - positions[i].0;
            let dy = positions[j].1 - positions[i].1;
            let dist = (dx * dx + dy * dy).sqrt().max(1.0);
            let pull = STRESS_SPRING * (dist - ideal);
            let fx = dx / dist * pull;
            let fy = dy / dist * pull;
            forces[i].0 += fx;
            forces[i].1 += fy;
            forces[j].0 -= fx;
            forces[j].1 -= fy;
        }

        for i in 0..n {
            velocities[i].0 = (velocities[i].0 + forces[i].0) * STRESS_DAMPING;
            velocities[i].1 = (velocities[i].1 + forces[i].1) * STRESS_DAMPING;
            positions[i].0 += velocities[i].0;
            positions[i].1 += velocities[i].1;
        }
    }

    let mut outcome = LayoutOutcome::new();
    for (idx, node) in model.nodes.iter().enumerate() {
        outcome.insert(
            node.id.clone(),
            (
                positions[idx].0 - node.width / 2.0,
                positions[idx].1 - node.height / 2.0,
            ),
        );
    }
    outcome
}
