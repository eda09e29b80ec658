pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod error;
pub mod graph;
pub mod orchestrator;
pub mod reconcile;
pub mod scene;
pub mod solver;

pub use analyzer::{StructuralSignals, analyze};
pub use classifier::{
    LayoutAlgorithm, LayoutDecision, LayoutDirection, LayoutPreset, Spacing, classify,
};
pub use config::{Config, HeuristicsConfig, SolverLimits, load_config};
pub use error::LayoutError;
pub use graph::{GraphModel, build_graph_model};
pub use orchestrator::{EditorAccess, LayoutOrchestrator, LayoutSuggestion};
pub use reconcile::reconcile;
pub use scene::{Arrowhead, Connector, ConnectorKind, Element, SelectionView, Shape, ShapeKind};
pub use solver::{GraphSolver, LayoutOutcome, LayoutSolver};
