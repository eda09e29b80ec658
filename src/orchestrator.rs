use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::analyzer::{self, StructuralSignals};
use crate::classifier::{self, LayoutDecision, LayoutPreset};
use crate::config::Config;
use crate::error::LayoutError;
use crate::graph::build_graph_model;
use crate::reconcile::reconcile;
use crate::scene::{Element, SelectionView, Shape};
use crate::solver::{GraphSolver, LayoutOutcome, LayoutSolver};

/// Editor-access seam. Injected at call time instead of read from shared
/// global state so multiple documents can run layouts independently.
pub trait EditorAccess {
    /// Snapshot of the current scene.
    fn elements(&self) -> Vec<Element>;
    /// Ids of the currently selected elements.
    fn selected_ids(&self) -> HashSet<String>;
    /// Atomically replace the scene with a fully-updated element collection;
    /// one undoable step on the host side.
    fn replace_elements(&mut self, elements: Vec<Element>);
    /// Cosmetic "frame these elements in the viewport" request. Fire and
    /// forget; failures must not affect the committed scene.
    fn frame_elements(&mut self, _ids: &[String]) {}
}

/// What the confirmation UI needs to present a proposed layout alongside the
/// manual catalogue.
#[derive(Debug, Clone)]
pub struct LayoutSuggestion {
    pub element_count: usize,
    pub signals: StructuralSignals,
    pub proposed: LayoutDecision,
    pub presets: &'static [LayoutPreset],
}

/// Public entry point sequencing analysis, classification, graph building,
/// solving and reconciliation. One operation may be in flight at a time; the
/// correctness of a commit depends on the selection snapshot staying fresh.
pub struct LayoutOrchestrator<S: LayoutSolver = GraphSolver> {
    solver: S,
    config: Config,
    in_flight: AtomicBool,
}

impl LayoutOrchestrator<GraphSolver> {
    pub fn new(config: Config) -> Self {
        Self::with_solver(GraphSolver, config)
    }
}

impl Default for LayoutOrchestrator<GraphSolver> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<S: LayoutSolver> LayoutOrchestrator<S> {
    pub fn with_solver(solver: S, config: Config) -> Self {
        Self {
            solver,
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Analyze the current selection and propose a layout decision without
    /// touching the scene. The caller either presents the suggestion for
    /// confirmation or feeds it straight into [`apply_layout`]. Discarding
    /// the suggestion has zero side effects.
    ///
    /// [`apply_layout`]: Self::apply_layout
    pub fn auto_layout(&self, editor: &dyn EditorAccess) -> Result<LayoutSuggestion, LayoutError> {
        let selected = editor.selected_ids();
        if selected.is_empty() {
            return Err(LayoutError::EmptySelection);
        }
        let elements = editor.elements();
        let selection = SelectionView::from_scene(&elements, &selected);
        if selection.is_empty() {
            return Err(LayoutError::EmptySelection);
        }

        let signals = analyzer::analyze(&selection, &self.config.heuristics);
        let proposed = classifier::classify(&signals);
        if proposed.is_low_confidence(self.config.heuristics.low_confidence) {
            warn!(
                confidence = proposed.confidence,
                reason = proposed.reason.as_str(),
                "layout classification is low-confidence"
            );
        }

        Ok(LayoutSuggestion {
            element_count: selection.len(),
            signals,
            proposed,
            presets: &LayoutPreset::ALL,
        })
    }

    /// Direct calling mode: classify and immediately apply in one step.
    pub fn auto_layout_direct(
        &self,
        editor: &mut dyn EditorAccess,
    ) -> Result<LayoutDecision, LayoutError> {
        let suggestion = self.auto_layout(editor)?;
        self.apply_layout(editor, &suggestion.proposed)?;
        Ok(suggestion.proposed)
    }

    /// Apply an explicitly chosen decision to the current selection: build the
    /// graph model, solve, and reconcile the scene in one atomic commit. Used
    /// both for confirmed automatic suggestions and fully manual choices.
    ///
    /// All failures leave the scene at its pre-operation state.
    pub fn apply_layout(
        &self,
        editor: &mut dyn EditorAccess,
        decision: &LayoutDecision,
    ) -> Result<(), LayoutError> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let selected = editor.selected_ids();
        if selected.is_empty() {
            return Err(LayoutError::EmptySelection);
        }
        let snapshot = editor.elements();
        let selection = SelectionView::from_scene(&snapshot, &selected);
        if selection.shapes.is_empty() {
            return Err(LayoutError::EmptySelection);
        }

        let originals: HashMap<String, Shape> = selection
            .shapes
            .iter()
            .map(|s| (s.id.clone(), (*s).clone()))
            .collect();

        let model = build_graph_model(
            &selection.shapes,
            &selection.connectors,
            decision,
            &self.config.limits,
        )?;
        let mut outcome = self.solver.solve(&model)?;
        anchor_outcome(&mut outcome, &originals);

        // Commit against a fresh read: shapes edited away since the snapshot
        // are silently dropped from the update instead of aborting the batch.
        let current = editor.elements();
        let live_ids: HashSet<&str> = current.iter().map(|e| e.id()).collect();
        outcome.retain(|id, _| live_ids.contains(id.as_str()));

        let moved_ids: Vec<String> = outcome.keys().cloned().collect();
        let updated = reconcile(&current, &outcome, &originals);
        editor.replace_elements(updated);
        editor.frame_elements(&moved_ids);
        Ok(())
    }

    /// Apply one of the fixed catalogue entries.
    pub fn apply_preset(
        &self,
        editor: &mut dyn EditorAccess,
        preset: LayoutPreset,
    ) -> Result<(), LayoutError> {
        self.apply_layout(editor, &preset.decision())
    }
}

/// Translate solver coordinates so the laid-out region's bounding box starts
/// at the original selection's top-left corner, keeping the result where the
/// user drew it instead of jumping to the solver's origin.
fn anchor_outcome(outcome: &mut LayoutOutcome, originals: &HashMap<String, Shape>) {
    if outcome.is_empty() {
        return;
    }
    let mut orig_min = (f32::INFINITY, f32::INFINITY);
    for id in outcome.keys() {
        if let Some(shape) = originals.get(id) {
            orig_min.0 = orig_min.0.min(shape.x);
            orig_min.1 = orig_min.1.min(shape.y);
        }
    }
    if !orig_min.0.is_finite() || !orig_min.1.is_finite() {
        return;
    }
    let mut new_min = (f32::INFINITY, f32::INFINITY);
    for &(x, y) in outcome.values() {
        new_min.0 = new_min.0.min(x);
        new_min.1 = new_min.1.min(y);
    }
    let dx = orig_min.0 - new_min.0;
    let dy = orig_min.1 - new_min.1;
    for position in outcome.values_mut() {
        position.0 += dx;
        position.1 += dy;
    }
}

struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, LayoutError> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LayoutError::Busy);
        }
        Ok(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
